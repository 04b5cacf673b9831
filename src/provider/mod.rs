//! # Code-generation provider interface
//!
//! A trait-based abstraction over the external completion service that
//! turns prompts into parser source text.
//!
//! ## Design
//! - [`CodeGenerator`] defines the one call the loop needs: system prompt
//!   plus user prompt in, source text out.
//! - [`GeminiGenerator`] is the production backend (Google Gemini over
//!   HTTPS); tests substitute scripted implementations.
//! - The service is treated as opaque and possibly non-deterministic:
//!   identical prompts may yield different completions, and no memoisation
//!   is assumed. Transport failures are *not* retried here — the correction
//!   loop's attempt budget is the only retry mechanism, so a failed call
//!   simply consumes an attempt.

pub mod gemini;

pub use gemini::GeminiGenerator;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from the completion service boundary.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Connection/transport failure before an HTTP status was obtained.
    #[error("network error: {0}")]
    Network(String),

    /// The API answered with a non-success status.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The API key was rejected or absent.
    #[error("authentication failed: check GEMINI_API_KEY")]
    AuthenticationFailed,

    /// The response body did not have the expected shape.
    #[error("malformed API response: {0}")]
    Parse(String),

    /// The service answered, but with no usable completion text.
    #[error("empty completion: the model returned no source text")]
    EmptyCompletion,
}

/// A service that generates parser source text from a prompt pair.
///
/// Implementations must be cheap to share (`Arc<dyn CodeGenerator>`); one
/// instance serves all attempts of a run.
#[async_trait]
pub trait CodeGenerator: Send + Sync {
    /// Short identifier for logging ("gemini", "scripted", …).
    fn name(&self) -> &str;

    /// Produce source text for the given system/user prompt pair.
    async fn generate(&self, system: &str, user: &str) -> Result<String, ProviderError>;
}
