//! Multi-format batch runner with per-format failure capture.
//!
//! Every requested format gets its own pipeline run. A failure is recorded
//! against that format and never stops the others. Formats run
//! concurrently; the result keeps the caller's order. A name requested
//! twice is generated twice and keeps its first position, with the later
//! result replacing the earlier one.

use std::collections::BTreeMap;

use contentgen_llm::GenerationBackend;
use futures::future::join_all;
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use tracing::{error, info};

use crate::error::{GenerationError, Result};
use crate::pipeline::{GenerationRequest, Pipeline};
use crate::store::TemplateStore;
use crate::strategy::FormatRegistry;

/// Error category of a failed format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Backend or template store misconfigured.
    Configuration,
    /// No template for the format.
    NotFound,
    /// Placeholder substitution failed.
    Template,
    /// The backend call failed.
    Backend,
    /// The request itself was invalid.
    InvalidRequest,
}

/// Description of why a format produced no content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatFailure {
    /// Error category.
    pub kind: FailureKind,
    /// Display form of the underlying error.
    pub message: String,
}

impl From<&GenerationError> for FormatFailure {
    fn from(err: &GenerationError) -> Self {
        let kind = match err {
            GenerationError::Configuration(_) => FailureKind::Configuration,
            GenerationError::NotFound { .. } => FailureKind::NotFound,
            GenerationError::Template { .. } => FailureKind::Template,
            GenerationError::Backend(_) => FailureKind::Backend,
            GenerationError::InvalidRequest(_) => FailureKind::InvalidRequest,
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

/// Outcome for one format: content or a failure, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    /// Format this result belongs to.
    pub format_name: String,
    /// Generated content or the reason there is none.
    pub outcome: std::result::Result<String, FormatFailure>,
}

impl GenerationResult {
    /// Generated content, if the format succeeded.
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        self.outcome.as_ref().ok().map(String::as_str)
    }

    /// Failure, if the format failed.
    #[must_use]
    pub fn error(&self) -> Option<&FormatFailure> {
        self.outcome.as_ref().err()
    }
}

/// Aggregated result of one batch.
///
/// Serializes as
/// `{input_text, formats, results: {name: content | null}, errors: {name: message} | null}`
/// with map keys in request order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResult {
    /// The input text every format was generated from.
    pub input_text: String,
    /// Formats as requested, duplicates included.
    pub formats: Vec<String>,
    results: Vec<GenerationResult>,
}

impl BatchResult {
    fn new(input_text: &str, formats: &[String]) -> Self {
        Self {
            input_text: input_text.to_string(),
            formats: formats.to_vec(),
            results: Vec::with_capacity(formats.len()),
        }
    }

    fn record(&mut self, result: GenerationResult) {
        match self
            .results
            .iter_mut()
            .find(|r| r.format_name == result.format_name)
        {
            Some(existing) => *existing = result,
            None => self.results.push(result),
        }
    }

    /// One entry per distinct requested format, in request order.
    #[must_use]
    pub fn results(&self) -> &[GenerationResult] {
        &self.results
    }

    /// Content for `format_name`, if it succeeded.
    #[must_use]
    pub fn content(&self, format_name: &str) -> Option<&str> {
        self.find(format_name).and_then(GenerationResult::content)
    }

    /// Failure for `format_name`, if it failed.
    #[must_use]
    pub fn error(&self, format_name: &str) -> Option<&FormatFailure> {
        self.find(format_name).and_then(GenerationResult::error)
    }

    /// Failed formats with their failures, in request order.
    pub fn errors(&self) -> impl Iterator<Item = (&str, &FormatFailure)> {
        self.results
            .iter()
            .filter_map(|r| r.error().map(|e| (r.format_name.as_str(), e)))
    }

    /// Names of the failed formats, in request order.
    #[must_use]
    pub fn failed_formats(&self) -> Vec<&str> {
        self.errors().map(|(name, _)| name).collect()
    }

    /// Whether at least one format failed.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.results.iter().any(|r| r.outcome.is_err())
    }

    /// Whether every format failed.
    #[must_use]
    pub fn all_failed(&self) -> bool {
        self.results.iter().all(|r| r.outcome.is_err())
    }

    fn find(&self, format_name: &str) -> Option<&GenerationResult> {
        self.results.iter().find(|r| r.format_name == format_name)
    }
}

struct ResultsView<'a>(&'a [GenerationResult]);

impl Serialize for ResultsView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for result in self.0 {
            map.serialize_entry(&result.format_name, &result.content())?;
        }
        map.end()
    }
}

struct ErrorsView<'a>(&'a BatchResult);

impl Serialize for ErrorsView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (name, failure) in self.0.errors() {
            map.serialize_entry(name, &failure.message)?;
        }
        map.end()
    }
}

impl Serialize for BatchResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("BatchResult", 4)?;
        state.serialize_field("input_text", &self.input_text)?;
        state.serialize_field("formats", &self.formats)?;
        state.serialize_field("results", &ResultsView(&self.results))?;
        if self.has_errors() {
            state.serialize_field("errors", &ErrorsView(self))?;
        } else {
            state.serialize_field("errors", &None::<()>)?;
        }
        state.end()
    }
}

/// Names worth requesting: stored templates in document order, then
/// built-ins that have no stored template.
///
/// # Errors
/// Returns a template store load error.
pub fn known_formats(store: &TemplateStore, registry: &FormatRegistry) -> Result<Vec<String>> {
    let mut known = store.list()?;
    for name in registry.builtin_names() {
        if !known.contains(&name) {
            known.push(name);
        }
    }
    Ok(known)
}

/// Runs the pipeline once per requested format.
pub struct BatchRunner<B: ?Sized> {
    pipeline: Pipeline<B>,
}

impl<B: ?Sized> Clone for BatchRunner<B> {
    fn clone(&self) -> Self {
        Self {
            pipeline: self.pipeline.clone(),
        }
    }
}

impl<B: GenerationBackend + ?Sized> BatchRunner<B> {
    /// Wrap a pipeline.
    #[must_use]
    pub fn new(pipeline: Pipeline<B>) -> Self {
        Self { pipeline }
    }

    /// The underlying single-format pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline<B> {
        &self.pipeline
    }

    /// See [`known_formats`].
    ///
    /// # Errors
    /// Returns a template store load error.
    pub fn known_formats(&self) -> Result<Vec<String>> {
        known_formats(self.pipeline.store(), self.pipeline.registry())
    }

    /// Generate every format in `formats` from `input_text`.
    ///
    /// # Errors
    /// Fails only when `formats` is empty or the template store cannot be
    /// loaded. Everything else, including a name with no stored template,
    /// is recorded against that format in the [`BatchResult`].
    pub async fn generate_batch(&self, input_text: &str, formats: &[String]) -> Result<BatchResult> {
        self.generate_batch_with(input_text, formats, &BTreeMap::new()).await
    }

    /// Like [`generate_batch`](Self::generate_batch), passing the same extra
    /// substitutions to every format.
    ///
    /// # Errors
    /// See [`generate_batch`](Self::generate_batch).
    pub async fn generate_batch_with(
        &self,
        input_text: &str,
        formats: &[String],
        extra_substitutions: &BTreeMap<String, String>,
    ) -> Result<BatchResult> {
        if formats.is_empty() {
            return Err(GenerationError::InvalidRequest("no formats requested".into()));
        }
        self.pipeline.store().load()?;

        info!(formats = ?formats, "starting batch generation");

        let runs = formats.iter().map(|format_name| {
            let request = GenerationRequest {
                format_name: format_name.clone(),
                input_text: input_text.to_string(),
                extra_substitutions: extra_substitutions.clone(),
            };
            async move {
                let outcome = self.pipeline.generate(&request).await;
                (request.format_name, outcome)
            }
        });

        let mut batch = BatchResult::new(input_text, formats);
        for (format_name, outcome) in join_all(runs).await {
            let outcome = outcome.map_err(|e| {
                error!(format = %format_name, "format failed: {}", e);
                FormatFailure::from(&e)
            });
            batch.record(GenerationResult { format_name, outcome });
        }

        info!(
            succeeded = batch.results().len() - batch.failed_formats().len(),
            failed = batch.failed_formats().len(),
            "batch finished"
        );
        Ok(batch)
    }
}
