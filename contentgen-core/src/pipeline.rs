//! Single-format generation: template → substitution → backend → post-processing.

use std::collections::BTreeMap;
use std::sync::Arc;

use contentgen_llm::{BackendRequest, GenerationBackend};
use tracing::{debug, error, info};

use crate::error::{GenerationError, Result};
use crate::store::TemplateStore;
use crate::strategy::FormatRegistry;
use crate::template::{self, INPUT_TEXT_KEY};

/// One format to generate for one input text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Format to render.
    pub format_name: String,
    /// Text substituted for `{input_text}`.
    pub input_text: String,
    /// Values for any further placeholders in the user template.
    pub extra_substitutions: BTreeMap<String, String>,
}

impl GenerationRequest {
    /// Request with no extra substitutions.
    #[must_use]
    pub fn new(format_name: impl Into<String>, input_text: impl Into<String>) -> Self {
        Self {
            format_name: format_name.into(),
            input_text: input_text.into(),
            extra_substitutions: BTreeMap::new(),
        }
    }

    /// Supply a value for an extra placeholder.
    #[must_use]
    pub fn with_substitution(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_substitutions.insert(key.into(), value.into());
        self
    }
}

/// Runs one generation call per request against a shared backend.
pub struct Pipeline<B: ?Sized> {
    backend: Arc<B>,
    store: Arc<TemplateStore>,
    registry: Arc<FormatRegistry>,
}

impl<B: ?Sized> Clone for Pipeline<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            store: Arc::clone(&self.store),
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<B: GenerationBackend + ?Sized> Pipeline<B> {
    /// Create a pipeline over shared components.
    #[must_use]
    pub fn new(backend: Arc<B>, store: Arc<TemplateStore>, registry: Arc<FormatRegistry>) -> Self {
        Self {
            backend,
            store,
            registry,
        }
    }

    /// The template store this pipeline reads from.
    #[must_use]
    pub fn store(&self) -> &Arc<TemplateStore> {
        &self.store
    }

    /// The format registry this pipeline resolves strategies from.
    #[must_use]
    pub fn registry(&self) -> &Arc<FormatRegistry> {
        &self.registry
    }

    /// The backend generation calls go to.
    #[must_use]
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Generate finished content for one format.
    ///
    /// # Errors
    /// - [`GenerationError::NotFound`] if the format has no template;
    /// - [`GenerationError::Template`] if a placeholder cannot be filled;
    /// - [`GenerationError::InvalidRequest`] if an extra substitution tries to
    ///   replace `input_text`;
    /// - [`GenerationError::Backend`] if the backend call fails.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let format = request.format_name.as_str();
        let strategy = self.registry.strategy_for(format);
        let prompt = self.store.get(format)?;

        if request.extra_substitutions.contains_key(INPUT_TEXT_KEY) {
            return Err(GenerationError::InvalidRequest(format!(
                "extra substitution '{INPUT_TEXT_KEY}' collides with the input text"
            )));
        }

        let mut vars: Vec<(&str, &str)> = Vec::with_capacity(request.extra_substitutions.len() + 1);
        vars.push((INPUT_TEXT_KEY, request.input_text.as_str()));
        vars.extend(
            request
                .extra_substitutions
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        );

        let unused = template::unused_keys(&prompt.user, &vars[1..]);
        if !unused.is_empty() {
            debug!(format, ?unused, "ignoring unused substitutions");
        }

        let user = template::render(&prompt.user, &vars).map_err(|source| GenerationError::Template {
            format_name: format.to_string(),
            source,
        })?;

        info!(
            format,
            backend = self.backend.name(),
            model = self.backend.model(),
            "generating content"
        );

        let backend_request = BackendRequest::new(prompt.system, user)
            .with_temperature(strategy.temperature)
            .with_max_tokens(strategy.max_output_tokens);

        let raw = self.backend.generate(&backend_request).await.map_err(|e| {
            error!(format, "backend call failed: {}", e);
            GenerationError::from(e)
        })?;

        let content = strategy.post_process(format, &raw);
        info!(format, chars = content.chars().count(), "content generated");
        Ok(content)
    }
}
