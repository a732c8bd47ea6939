//! LLM error types.

use thiserror::Error;

/// Errors that can occur during backend construction or generation.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP request failed before a response was received.
    #[error("LLM request failed: {0}")]
    RequestFailed(String),

    /// The backend answered with a non-success status.
    #[error("LLM backend returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// LLM response was not valid JSON or lacked the content field.
    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    /// Request timed out.
    #[error("LLM request timed out after {0}s")]
    Timeout(u64),

    /// LLM provider is unreachable.
    #[error("LLM provider unavailable: {0}")]
    Unavailable(String),

    /// Configuration error: unknown provider, missing credential, bad client setup.
    #[error("LLM configuration error: {0}")]
    ConfigError(String),
}

impl LlmError {
    /// Whether this error was raised while configuring a backend rather than
    /// while talking to it.
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(self, LlmError::ConfigError(_))
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(0)
        } else if err.is_connect() {
            LlmError::Unavailable(err.to_string())
        } else if err.is_decode() {
            LlmError::ParseError(err.to_string())
        } else {
            LlmError::RequestFailed(err.to_string())
        }
    }
}
