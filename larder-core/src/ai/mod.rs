//! Generator integration.
//!
//! This module provides:
//! - `ExtractionGateway` trait abstracting the external text/vision generator
//! - `HttpGateway`, which talks to a generation service endpoint
//! - `FakeGateway` for tests
//! - Configuration via environment variables
//! - Prompt templates for receipt scanning and recipe suggestion
//!
//! # Configuration
//!
//! - `LARDER_GENERATE_URL` (required): generation endpoint URL
//! - `LARDER_AI_MODEL` (optional): Model name, e.g., "openai/gpt-4o-mini"
//! - `LARDER_AI_TIMEOUT_SECS` (optional): Transport timeout
//! - `LARDER_AI_RATE_LIMIT_MS` (optional): Delay between requests in ms
//!
//! # Example
//!
//! ```ignore
//! use larder_core::ai::{ExtractionGateway, GenerationRequest, HttpGateway};
//!
//! let gateway = HttpGateway::from_env()?;
//! let request = GenerationRequest::builder("Hello!").build()?;
//! let result = gateway.invoke(&request).await?;
//! println!("Response: {}", result.text);
//! ```

mod config;
mod fake;
mod gateway;
pub mod prompts;
mod types;
pub mod wire;

pub use config::{ConfigError, GatewayConfig, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
pub use fake::FakeGateway;
pub use gateway::{ExtractionGateway, HttpGateway};
pub use types::{
    GenerationRequest, GenerationRequestBuilder, GenerationResult, ImageData, OutputFormat, Usage,
};
