//! Gateway configuration from environment variables.

use std::env;
use std::time::Duration;
use thiserror::Error;

use crate::error::AiError;

/// Default model to use.
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

/// Default rate limit between requests in milliseconds.
pub const DEFAULT_RATE_LIMIT_MS: u64 = 500;

/// Default transport timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },
}

impl From<ConfigError> for AiError {
    fn from(err: ConfigError) -> Self {
        AiError::ConfigurationMissing(err.to_string())
    }
}

/// Read an optional numeric variable, rejecting values that do not parse.
fn numeric_var(name: &str, value: Option<String>, default: u64) -> Result<u64, ConfigError> {
    match value {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            value,
        }),
        None => Ok(default),
    }
}

/// Configuration for talking to the generation service.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Full URL of the generation endpoint, e.g. "http://localhost:3000/api/generate".
    pub endpoint: String,
    /// Model requested when the caller does not pick one.
    pub model: String,
    /// Transport timeout. Expiry surfaces as `AiError::Unreachable`.
    pub timeout: Duration,
    /// Milliseconds to wait between requests. 0 disables.
    pub rate_limit_ms: u64,
}

impl GatewayConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            rate_limit_ms: DEFAULT_RATE_LIMIT_MS,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `LARDER_GENERATE_URL`: generation endpoint URL
    ///
    /// Optional:
    /// - `LARDER_AI_MODEL`: Model name (default: "openai/gpt-4o-mini")
    /// - `LARDER_AI_TIMEOUT_SECS`: Transport timeout (default: 60)
    /// - `LARDER_AI_RATE_LIMIT_MS`: Rate limit in ms (default: 500)
    pub fn from_env() -> Result<Self, ConfigError> {
        let endpoint = env::var("LARDER_GENERATE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("LARDER_GENERATE_URL".to_string()))?;

        let model = env::var("LARDER_AI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let timeout_secs = numeric_var(
            "LARDER_AI_TIMEOUT_SECS",
            env::var("LARDER_AI_TIMEOUT_SECS").ok(),
            DEFAULT_TIMEOUT_SECS,
        )?;
        let rate_limit_ms = numeric_var(
            "LARDER_AI_RATE_LIMIT_MS",
            env::var("LARDER_AI_RATE_LIMIT_MS").ok(),
            DEFAULT_RATE_LIMIT_MS,
        )?;

        Ok(Self {
            endpoint,
            model,
            timeout: Duration::from_secs(timeout_secs),
            rate_limit_ms,
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_rate_limit_ms(mut self, ms: u64) -> Self {
        self.rate_limit_ms = ms;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_vars_share_parsing() {
        assert_eq!(numeric_var("LARDER_AI_RATE_LIMIT_MS", None, 500).unwrap(), 500);
        assert_eq!(
            numeric_var("LARDER_AI_RATE_LIMIT_MS", Some(" 0 ".to_string()), 500).unwrap(),
            0
        );

        for name in ["LARDER_AI_RATE_LIMIT_MS", "LARDER_AI_TIMEOUT_SECS"] {
            let err = numeric_var(name, Some("fast".to_string()), 1).unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("Invalid value for {}: fast", name)
            );
        }
    }
}
