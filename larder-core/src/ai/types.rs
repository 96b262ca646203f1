//! Generation request and response types.

use serde::{Deserialize, Serialize};

use super::config::DEFAULT_MODEL;
use crate::error::AiError;

/// Default sampling temperature when a caller does not set one.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Default cap on generated tokens.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2048;

/// What shape the generator is asked to produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum OutputFormat {
    #[default]
    #[serde(rename = "text")]
    PlainText,
    #[serde(rename = "json")]
    StrictJson,
}

/// An encoded image ready for transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageData {
    /// e.g. "image/jpeg"
    pub mime_type: String,
    /// Base64 (standard alphabet, padded).
    pub data: String,
}

impl ImageData {
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Token usage information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A single call to the generator. Built through [`GenerationRequest::builder`]
/// and immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    prompt: String,
    images: Vec<ImageData>,
    system_instructions: Option<String>,
    temperature: f32,
    max_output_tokens: u32,
    output_format: OutputFormat,
    model_id: String,
}

impl GenerationRequest {
    pub fn builder(prompt: impl Into<String>) -> GenerationRequestBuilder {
        GenerationRequestBuilder {
            prompt: prompt.into(),
            images: Vec::new(),
            system_instructions: None,
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            output_format: OutputFormat::PlainText,
            model_id: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn images(&self) -> &[ImageData] {
        &self.images
    }

    pub fn system_instructions(&self) -> Option<&str> {
        self.system_instructions.as_deref()
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_output_tokens(&self) -> u32 {
        self.max_output_tokens
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[derive(Debug, Clone)]
pub struct GenerationRequestBuilder {
    prompt: String,
    images: Vec<ImageData>,
    system_instructions: Option<String>,
    temperature: f32,
    max_output_tokens: u32,
    output_format: OutputFormat,
    model_id: String,
}

impl GenerationRequestBuilder {
    pub fn image(mut self, image: ImageData) -> Self {
        self.images.push(image);
        self
    }

    pub fn images(mut self, images: impl IntoIterator<Item = ImageData>) -> Self {
        self.images.extend(images);
        self
    }

    pub fn system_instructions(mut self, system: impl Into<String>) -> Self {
        self.system_instructions = Some(system.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    pub fn output_format(mut self, output_format: OutputFormat) -> Self {
        self.output_format = output_format;
        self
    }

    pub fn model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    /// Validate and freeze the request.
    pub fn build(self) -> Result<GenerationRequest, AiError> {
        if self.prompt.trim().is_empty() {
            return Err(AiError::InvalidRequest("prompt is empty".to_string()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AiError::InvalidRequest(format!(
                "temperature {} is outside [0, 2]",
                self.temperature
            )));
        }
        if self.max_output_tokens == 0 {
            return Err(AiError::InvalidRequest(
                "max_output_tokens must be positive".to_string(),
            ));
        }
        if self.model_id.trim().is_empty() {
            return Err(AiError::InvalidRequest("model id is empty".to_string()));
        }

        Ok(GenerationRequest {
            prompt: self.prompt,
            images: self.images,
            system_instructions: self.system_instructions,
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
            output_format: self.output_format,
            model_id: self.model_id,
        })
    }
}

/// Raw generator output. `text` has not been validated against any schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub text: String,
    #[serde(default)]
    pub usage: Option<Usage>,
}
