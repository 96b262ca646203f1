//! JSON bodies exchanged with the generation service endpoint.
//!
//! Shared by the client ([`HttpGateway`](super::HttpGateway)) and the server
//! that implements the endpoint, so both sides agree on field names.

use serde::{Deserialize, Serialize};

use super::types::{GenerationRequest, OutputFormat, Usage};
use crate::error::AiError;
use crate::image::parse_encoded_image;

/// Request body for `POST /api/generate`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GenerateRequestBody {
    #[serde(default)]
    pub prompt: String,
    /// Data URIs or bare base64 strings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl From<&GenerationRequest> for GenerateRequestBody {
    fn from(request: &GenerationRequest) -> Self {
        Self {
            prompt: request.prompt().to_string(),
            images: request.images().iter().map(|i| i.to_data_uri()).collect(),
            system: request.system_instructions().map(str::to_string),
            temperature: Some(request.temperature()),
            max_tokens: Some(request.max_output_tokens()),
            format: Some(request.output_format()),
            model: Some(request.model_id().to_string()),
        }
    }
}

impl GenerateRequestBody {
    /// Validate the body and turn it into a request, filling unset fields
    /// from the builder defaults and `default_model`.
    pub fn into_request(self, default_model: &str) -> Result<GenerationRequest, AiError> {
        let mut builder = GenerationRequest::builder(self.prompt)
            .model_id(self.model.unwrap_or_else(|| default_model.to_string()));

        for image in &self.images {
            builder = builder.image(parse_encoded_image(image)?);
        }
        if let Some(system) = self.system {
            builder = builder.system_instructions(system);
        }
        if let Some(temperature) = self.temperature {
            builder = builder.temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            builder = builder.max_output_tokens(max_tokens);
        }
        if let Some(format) = self.format {
            builder = builder.output_format(format);
        }

        builder.build()
    }
}

/// Success body: status 200.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GenerateResponseBody {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// Failure body for any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GenerateErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Machine-readable error code (see `AiError::code`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl GenerateErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            code: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_code(mut self, code: &str) -> Self {
        self.code = Some(code.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_into_request_uses_defaults() {
        let body: GenerateRequestBody =
            serde_json::from_str(r#"{"prompt": "hi", "format": "json"}"#).unwrap();
        let request = body.into_request("some/model").unwrap();

        assert_eq!(request.prompt(), "hi");
        assert_eq!(request.model_id(), "some/model");
        assert_eq!(request.output_format(), OutputFormat::StrictJson);
    }

    #[test]
    fn test_body_without_prompt_is_rejected() {
        let body: GenerateRequestBody = serde_json::from_str(r#"{"max_tokens": 10}"#).unwrap();
        assert!(matches!(
            body.into_request("m"),
            Err(AiError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_request_to_body_omits_empty_images() {
        let request = GenerationRequest::builder("hi")
            .system_instructions("be brief")
            .build()
            .unwrap();
        let json = serde_json::to_value(GenerateRequestBody::from(&request)).unwrap();

        assert!(json.get("images").is_none());
        assert_eq!(json["system"], "be brief");
        assert_eq!(json["format"], "text");
    }
}
