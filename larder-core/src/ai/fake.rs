//! Fake gateway for testing.
//!
//! Returns deterministic responses based on prompt matching, so tests run
//! without network access or API costs.

use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};

use super::gateway::ExtractionGateway;
use super::types::{GenerationRequest, GenerationResult, Usage};
use crate::error::AiError;

/// A fake generator.
///
/// Responses are matched by checking whether the prompt or system instructions
/// contain a registered substring (case-insensitive, first registered wins).
/// Every request is recorded for later inspection.
#[derive(Debug, Default)]
pub struct FakeGateway {
    responses: Vec<(String, String)>,
    default_response: Option<String>,
    failure: Option<AiError>,
    usage: Option<Usage>,
    calls: Mutex<Vec<GenerationRequest>>,
}

impl FakeGateway {
    /// Create a gateway with no registered responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a gateway that returns `response` for prompts containing `prompt_contains`.
    pub fn with_response(prompt_contains: &str, response: &str) -> Self {
        let mut gateway = Self::new();
        gateway.add_response(prompt_contains, response);
        gateway
    }

    /// Create a gateway that answers every request with `response`.
    pub fn always(response: &str) -> Self {
        Self::new().with_default_response(response)
    }

    /// Create a gateway whose every call fails with `error`.
    pub fn failing(error: AiError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    pub fn add_response(&mut self, prompt_contains: &str, response: &str) {
        self.responses
            .push((prompt_contains.to_lowercase(), response.to_string()));
    }

    /// Set the response used when no pattern matches.
    pub fn with_default_response(mut self, response: &str) -> Self {
        self.default_response = Some(response.to_string());
        self
    }

    /// Attach usage metadata to every successful result.
    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Requests received so far, in order.
    pub fn calls(&self) -> Vec<GenerationRequest> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl ExtractionGateway for FakeGateway {
    async fn invoke(&self, request: &GenerationRequest) -> Result<GenerationResult, AiError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        let haystack = format!(
            "{}\n{}",
            request.system_instructions().unwrap_or_default(),
            request.prompt()
        )
        .to_lowercase();

        let text = self
            .responses
            .iter()
            .find(|(pattern, _)| haystack.contains(pattern.as_str()))
            .map(|(_, response)| response.clone())
            .or_else(|| self.default_response.clone())
            .ok_or_else(|| {
                AiError::Unreachable(format!(
                    "FakeGateway: no response configured for prompt (first 100 chars): {}",
                    request.prompt().chars().take(100).collect::<String>()
                ))
            })?;

        Ok(GenerationResult {
            text,
            usage: self.usage.clone(),
        })
    }
}
