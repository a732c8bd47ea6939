//! Shared state handed to every command, API handler and webhook delivery.

use std::sync::Arc;

use contentgen_core::batch::known_formats;
use contentgen_core::{AppConfig, BatchRunner, FormatRegistry, GenerationError, Pipeline, TemplateStore};
use contentgen_llm::GenerationBackend;
use parking_lot::Mutex;
use tracing::info;

use crate::output::OutputSink;

/// Resolved configuration plus the components built from it.
///
/// The backend is resolved lazily so that commands which never generate
/// (template management, `init`) work without credentials.
pub struct AppContext {
    config: AppConfig,
    store: Arc<TemplateStore>,
    registry: Arc<FormatRegistry>,
    sink: OutputSink,
    backend: Mutex<Option<Arc<dyn GenerationBackend>>>,
}

impl AppContext {
    /// Build the context; nothing is read from disk or the network yet.
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        let store = Arc::new(TemplateStore::new(config.templates.path.clone()));
        let sink = OutputSink::new(config.output.dir.clone());
        Self {
            config,
            store,
            registry: Arc::new(FormatRegistry::builtin()),
            sink,
            backend: Mutex::new(None),
        }
    }

    /// Context with a pre-built backend instead of one resolved from config.
    #[must_use]
    pub fn with_backend(config: AppConfig, backend: Arc<dyn GenerationBackend>) -> Self {
        let ctx = Self::new(config);
        *ctx.backend.lock() = Some(backend);
        ctx
    }

    /// Loaded configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Template store.
    #[must_use]
    pub fn store(&self) -> &Arc<TemplateStore> {
        &self.store
    }

    /// Built-in format strategies.
    #[must_use]
    pub fn registry(&self) -> &Arc<FormatRegistry> {
        &self.registry
    }

    /// Output sink.
    #[must_use]
    pub fn sink(&self) -> &OutputSink {
        &self.sink
    }

    /// Built-in names plus stored custom names.
    ///
    /// # Errors
    /// Returns a template store load error.
    pub fn known_formats(&self) -> Result<Vec<String>, GenerationError> {
        known_formats(&self.store, &self.registry)
    }

    /// The configured backend, resolved on first use.
    ///
    /// # Errors
    /// Returns [`GenerationError::Configuration`] for an unknown provider or
    /// a missing credential.
    pub fn backend(&self) -> Result<Arc<dyn GenerationBackend>, GenerationError> {
        let mut slot = self.backend.lock();
        if let Some(backend) = slot.as_ref() {
            return Ok(Arc::clone(backend));
        }
        let backend: Arc<dyn GenerationBackend> = Arc::new(contentgen_llm::resolve(&self.config.llm)?);
        info!(backend = backend.name(), model = backend.model(), "backend ready");
        *slot = Some(Arc::clone(&backend));
        Ok(backend)
    }

    /// Batch runner over the configured backend.
    ///
    /// # Errors
    /// See [`backend`](Self::backend).
    pub fn runner(&self) -> Result<BatchRunner<dyn GenerationBackend>, GenerationError> {
        let pipeline = Pipeline::new(self.backend()?, Arc::clone(&self.store), Arc::clone(&self.registry));
        Ok(BatchRunner::new(pipeline))
    }
}
