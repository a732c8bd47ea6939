//! The capability every generation backend provides.

use async_trait::async_trait;

use crate::error::LlmError;
use crate::types::BackendRequest;

/// A text-generation service: one instruction pair in, trimmed text out.
///
/// Implementations make exactly one attempt per call. Retry policy, if any,
/// belongs to the caller.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate text for the given instruction pair.
    ///
    /// # Errors
    /// Returns an [`LlmError`] on transport failure, a non-success status or
    /// a response body without the expected content field.
    async fn generate(&self, request: &BackendRequest) -> Result<String, LlmError>;

    /// Short backend identifier for logs ("openai", "ollama", ...).
    fn name(&self) -> &'static str;

    /// Model identifier the backend sends requests for.
    fn model(&self) -> &str;

    /// Check that the endpoint answers. Never called on the generation path.
    ///
    /// # Errors
    /// Returns [`LlmError::ConfigError`] when the endpoint cannot be reached.
    async fn health_check(&self) -> Result<(), LlmError> {
        Ok(())
    }
}
