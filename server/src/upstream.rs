//! Model provider behind the generation service.
//!
//! Speaks the OpenAI-compatible chat completions API (OpenRouter by default).

use async_trait::async_trait;
use larder_core::ai::{
    ExtractionGateway, GenerationRequest, GenerationResult, OutputFormat, Usage, DEFAULT_MODEL,
    DEFAULT_TIMEOUT_SECS,
};
use larder_core::AiError;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

const API_KEY_VAR: &str = "OPENROUTER_API_KEY";

/// Provider settings.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// `None` leaves the service running but every generation fails with
    /// `ConfigurationMissing`.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl UpstreamConfig {
    /// Read `OPENROUTER_API_KEY`, `LARDER_UPSTREAM_BASE_URL`, `LARDER_AI_MODEL`
    /// and `LARDER_AI_TIMEOUT_SECS`.
    pub fn from_env() -> anyhow::Result<Self> {
        let non_blank = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());

        let timeout_secs = match non_blank("LARDER_AI_TIMEOUT_SECS") {
            Some(value) => value.trim().parse().map_err(|_| {
                anyhow::anyhow!("Invalid value for LARDER_AI_TIMEOUT_SECS: {}", value)
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_key: non_blank(API_KEY_VAR),
            base_url: non_blank("LARDER_UPSTREAM_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: non_blank("LARDER_AI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: MessageContent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorResponse {
    error: ProviderError,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    message: String,
    /// OpenRouter puts the underlying provider's reply under `metadata.raw`.
    #[serde(default)]
    metadata: Option<serde_json::Value>,
}

impl ProviderError {
    fn details(&self) -> Option<String> {
        let metadata = self.metadata.as_ref().filter(|m| !m.is_null())?;
        match metadata.get("raw") {
            Some(serde_json::Value::String(raw)) => Some(raw.clone()),
            _ => Some(metadata.to_string()),
        }
    }
}

fn build_body(request: &GenerationRequest) -> ChatCompletionRequest<'_> {
    let mut messages = Vec::with_capacity(2);

    if let Some(system) = request.system_instructions() {
        messages.push(ChatMessage {
            role: "system",
            content: MessageContent::Text(system),
        });
    }

    let content = if request.images().is_empty() {
        MessageContent::Text(request.prompt())
    } else {
        let mut parts = vec![ContentPart::Text {
            text: request.prompt(),
        }];
        parts.extend(request.images().iter().map(|image| ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: image.to_data_uri(),
            },
        }));
        MessageContent::Parts(parts)
    };
    messages.push(ChatMessage {
        role: "user",
        content,
    });

    ChatCompletionRequest {
        model: request.model_id(),
        messages,
        temperature: request.temperature(),
        max_tokens: request.max_output_tokens(),
        response_format: match request.output_format() {
            OutputFormat::StrictJson => Some(ResponseFormat {
                format_type: "json_object",
            }),
            OutputFormat::PlainText => None,
        },
    }
}

/// Map a non-2xx provider response.
fn provider_failure(status: u16, body: &str) -> AiError {
    match serde_json::from_str::<ProviderErrorResponse>(body) {
        Ok(parsed) => AiError::UpstreamRejected {
            status,
            details: parsed.error.details(),
            message: parsed.error.message,
        },
        Err(_) => {
            let preview: String = body.chars().take(200).collect();
            tracing::warn!(status, body = %preview, "Provider returned unstructured error");
            AiError::UpstreamError {
                status,
                details: Some(preview).filter(|p| !p.trim().is_empty()),
            }
        }
    }
}

/// Chat completions client used as the in-process generator.
pub struct UpstreamGateway {
    client: reqwest::Client,
    config: UpstreamConfig,
}

impl UpstreamGateway {
    pub fn new(config: UpstreamConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }
}

#[async_trait]
impl ExtractionGateway for UpstreamGateway {
    async fn invoke(&self, request: &GenerationRequest) -> Result<GenerationResult, AiError> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            AiError::ConfigurationMissing(format!("{} is not configured", API_KEY_VAR))
        })?;

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));

        tracing::debug!(
            model = request.model_id(),
            images = request.images().len(),
            "Calling model provider"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&build_body(request))
            .send()
            .await
            .map_err(|e| AiError::Unreachable(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AiError::Unreachable(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(provider_failure(status, &body));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| AiError::InvalidUpstreamShape(format!("provider response: {}", e)))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AiError::InvalidUpstreamShape("provider returned no choices".to_string()))?;

        Ok(GenerationResult {
            text,
            usage: parsed.usage,
        })
    }
}
