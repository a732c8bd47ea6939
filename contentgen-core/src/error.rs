//! Error types for the generation pipeline.

use contentgen_llm::LlmError;
use thiserror::Error;

use crate::template::TemplateError;

/// Top-level error type for all pipeline operations.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// Missing or invalid backend configuration, or an unreadable template store.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The format has no stored template.
    #[error("Format '{format_name}' not found. Available formats: {}", known.join(", "))]
    NotFound {
        /// Requested format.
        format_name: String,
        /// Format names known at the time of the lookup.
        known: Vec<String>,
    },

    /// The user instruction template could not be rendered.
    #[error("Template error in format '{format_name}': {source}")]
    Template {
        /// Format whose template failed.
        format_name: String,
        /// What went wrong during substitution.
        #[source]
        source: TemplateError,
    },

    /// The backend call failed.
    #[error("Backend error: {0}")]
    Backend(#[source] LlmError),

    /// The caller asked for something the pipeline cannot run.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<LlmError> for GenerationError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::ConfigError(reason) => GenerationError::Configuration(reason),
            other => GenerationError::Backend(other),
        }
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, GenerationError>;
