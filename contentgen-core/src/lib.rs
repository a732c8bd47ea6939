//! # contentgen core
//!
//! Turns one input text into several publication formats (short social
//! post, email, official letter, newsletter, plus any custom format) by
//! rendering a stored prompt template and sending it to a pluggable
//! generation backend.
//!
//! - [`TemplateStore`]: YAML-backed `{system, user}` templates with CRUD
//! - [`FormatRegistry`]: per-format temperature, output cap and
//!   post-processing
//! - [`Pipeline`]: one format, end to end
//! - [`BatchRunner`]: many formats at once, failures captured per format

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod batch;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod store;
pub mod strategy;
pub mod template;

pub use batch::{BatchResult, BatchRunner, FailureKind, FormatFailure, GenerationResult};
pub use config::{AppConfig, LogFormat, ServerConfig};
pub use error::{GenerationError, Result};
pub use pipeline::{GenerationRequest, Pipeline};
pub use store::{PromptTemplate, TemplateSet, TemplateStore};
pub use strategy::{FormatRegistry, FormatStrategy, StrategyKind};
pub use template::TemplateError;
