use thiserror::Error;

/// Failure of an AI-backed operation.
///
/// Every public operation in this crate returns one of these instead of
/// panicking. The `Display` text is safe to show to a user; upstream details
/// that should not leak (provider bodies, stack traces) are only logged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AiError {
    #[error("Generation service is not configured: {0}")]
    ConfigurationMissing(String),

    #[error("Could not reach the generation service: {0}")]
    Unreachable(String),

    /// `details` carries whatever extra context the provider sent.
    #[error("Generation service rejected the request ({status}): {message}")]
    UpstreamRejected {
        status: u16,
        message: String,
        details: Option<String>,
    },

    /// `details` is a preview of the unstructured body, if any.
    #[error("Generation service failed with status {status}")]
    UpstreamError { status: u16, details: Option<String> },

    #[error("Model output could not be read: {0}")]
    MalformedModelOutput(String),

    #[error("No input provided")]
    EmptyInput,

    #[error("Generation service returned an unexpected response: {0}")]
    InvalidUpstreamShape(String),

    #[error("Unsupported image: {0}")]
    MalformedImage(String),

    #[error("Invalid generation request: {0}")]
    InvalidRequest(String),
}

impl AiError {
    /// Only transport failures are worth retrying; everything else will fail
    /// the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AiError::Unreachable(_))
    }

    /// Message safe to show an end user. Upstream details are left out.
    pub fn user_message(&self) -> String {
        match self {
            AiError::ConfigurationMissing(_) => {
                "The AI service is not configured. Please contact the administrator.".to_string()
            }
            AiError::Unreachable(_) => {
                "Could not reach the AI service. Check your connection and try again.".to_string()
            }
            AiError::UpstreamRejected { .. } | AiError::UpstreamError { .. } => {
                "The AI service could not handle the request. Please try again later.".to_string()
            }
            AiError::MalformedModelOutput(_) | AiError::InvalidUpstreamShape(_) => {
                "The AI service returned a response we could not understand. Please try again."
                    .to_string()
            }
            AiError::EmptyInput => "Nothing to work with: the input was empty.".to_string(),
            AiError::MalformedImage(reason) => format!("That image can't be used: {}", reason),
            AiError::InvalidRequest(reason) => format!("Invalid request: {}", reason),
        }
    }

    /// Provider context worth relaying to a caller of the generation endpoint.
    pub fn details(&self) -> Option<&str> {
        match self {
            AiError::UpstreamRejected { details, .. } | AiError::UpstreamError { details, .. } => {
                details.as_deref()
            }
            _ => None,
        }
    }

    /// Short machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            AiError::ConfigurationMissing(_) => "configuration_missing",
            AiError::Unreachable(_) => "unreachable",
            AiError::UpstreamRejected { .. } => "upstream_rejected",
            AiError::UpstreamError { .. } => "upstream_error",
            AiError::MalformedModelOutput(_) => "malformed_model_output",
            AiError::EmptyInput => "empty_input",
            AiError::InvalidUpstreamShape(_) => "invalid_upstream_shape",
            AiError::MalformedImage(_) => "malformed_image",
            AiError::InvalidRequest(_) => "invalid_request",
        }
    }
}

/// Why a batch of model-extracted items was rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("not valid JSON: {0}")]
    InvalidJson(String),

    #[error("expected a JSON array of items")]
    NotAnArray,

    #[error("item {index} is invalid: {reason}")]
    InvalidItem { index: usize, reason: String },
}

impl From<ParseError> for AiError {
    fn from(err: ParseError) -> Self {
        AiError::MalformedModelOutput(err.to_string())
    }
}
