//! Extraction gateway: the one place that talks to the generator.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::config::GatewayConfig;
use super::types::{GenerationRequest, GenerationResult};
use super::wire::{GenerateErrorBody, GenerateRequestBody, GenerateResponseBody};
use crate::error::AiError;

/// Trait for generator transports.
///
/// Implementations do not interpret `text`; structural validation belongs to
/// the caller.
#[async_trait]
pub trait ExtractionGateway: Send + Sync {
    async fn invoke(&self, request: &GenerationRequest) -> Result<GenerationResult, AiError>;
}

/// Gateway that posts to a generation service endpoint over HTTP.
pub struct HttpGateway {
    client: reqwest::Client,
    config: GatewayConfig,
    last_request: Arc<Mutex<Option<Instant>>>,
}

impl HttpGateway {
    /// Create a new gateway from environment configuration.
    pub fn from_env() -> Result<Self, AiError> {
        let config = GatewayConfig::from_env()?;
        Self::new(config)
    }

    /// Create a new gateway with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, AiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AiError::ConfigurationMissing(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            last_request: Arc::new(Mutex::new(None)),
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Apply rate limiting between requests.
    async fn rate_limit(&self) {
        if self.config.rate_limit_ms == 0 {
            return;
        }

        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            let min_interval = Duration::from_millis(self.config.rate_limit_ms);

            if elapsed < min_interval {
                tokio::time::sleep(min_interval - elapsed).await;
            }
        }

        *last = Some(Instant::now());
    }
}

#[async_trait]
impl ExtractionGateway for HttpGateway {
    async fn invoke(&self, request: &GenerationRequest) -> Result<GenerationResult, AiError> {
        self.rate_limit().await;

        let body = GenerateRequestBody::from(request);

        tracing::debug!(
            endpoint = %self.config.endpoint,
            model = request.model_id(),
            images = request.images().len(),
            "Calling generation service"
        );

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(transport_error)?;

        if !(200..300).contains(&status) {
            return Err(classify_failure(status, &text));
        }

        let parsed: GenerateResponseBody = serde_json::from_str(&text).map_err(|e| {
            AiError::InvalidUpstreamShape(format!("generation response is not {{text, usage?}}: {}", e))
        })?;

        Ok(GenerationResult {
            text: parsed.text,
            usage: parsed.usage,
        })
    }
}

fn transport_error(err: reqwest::Error) -> AiError {
    if err.is_timeout() {
        AiError::Unreachable("request timed out".to_string())
    } else {
        AiError::Unreachable(err.to_string())
    }
}

/// Map a non-2xx response from the generation service to an error.
pub(crate) fn classify_failure(status: u16, body: &str) -> AiError {
    match serde_json::from_str::<GenerateErrorBody>(body) {
        Ok(error_body) => {
            let unconfigured = error_body.code.as_deref() == Some("configuration_missing")
                || (status == 500 && error_body.error.to_lowercase().contains("not configured"));

            if unconfigured {
                AiError::ConfigurationMissing(error_body.error)
            } else {
                AiError::UpstreamRejected {
                    status,
                    message: error_body.error,
                    details: error_body.details,
                }
            }
        }
        Err(_) => {
            let preview: String = body.chars().take(200).collect();
            tracing::warn!(status, body = %preview, "Generation service returned unstructured error");
            AiError::UpstreamError {
                status,
                details: Some(preview).filter(|p| !p.trim().is_empty()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_configuration_missing() {
        let err = classify_failure(500, r#"{"error": "OPENROUTER_API_KEY is not configured"}"#);
        assert!(matches!(err, AiError::ConfigurationMissing(_)));

        let err = classify_failure(
            503,
            r#"{"error": "no key", "code": "configuration_missing"}"#,
        );
        assert!(matches!(err, AiError::ConfigurationMissing(_)));
    }

    #[test]
    fn test_classify_rejected_keeps_message() {
        let err = classify_failure(
            429,
            r#"{"error": "quota exceeded", "details": "tier limit"}"#,
        );
        assert_eq!(
            err,
            AiError::UpstreamRejected {
                status: 429,
                message: "quota exceeded".to_string(),
                details: Some("tier limit".to_string())
            }
        );
    }

    #[test]
    fn test_classify_unstructured() {
        let err = classify_failure(502, "<html>Bad Gateway</html>");
        assert_eq!(
            err,
            AiError::UpstreamError {
                status: 502,
                details: Some("<html>Bad Gateway</html>".to_string())
            }
        );
        assert_eq!(
            classify_failure(503, ""),
            AiError::UpstreamError {
                status: 503,
                details: None
            }
        );
    }
}
