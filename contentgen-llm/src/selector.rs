//! Backend selection from configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::info;

use crate::backend::GenerationBackend;
use crate::client::{ChatCompletionBackend, OllamaBackend};
use crate::error::LlmError;
use crate::types::{BackendRequest, ProviderConfig};

/// Supported provider kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Hosted OpenAI chat completion.
    OpenAi,
    /// OpenRouter unified gateway.
    OpenRouter,
    /// Local Ollama server.
    Ollama,
}

impl ProviderKind {
    /// All kinds in display order.
    #[must_use]
    pub fn all() -> &'static [ProviderKind] {
        &[ProviderKind::OpenAi, ProviderKind::OpenRouter, ProviderKind::Ollama]
    }

    /// Configuration string for this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::OpenRouter => "openrouter",
            ProviderKind::Ollama => "ollama",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "openrouter" => Ok(ProviderKind::OpenRouter),
            "ollama" => Ok(ProviderKind::Ollama),
            other => {
                let available: Vec<&str> = ProviderKind::all().iter().map(|k| k.as_str()).collect();
                Err(LlmError::ConfigError(format!(
                    "unsupported provider '{other}' (available: {})",
                    available.join(", ")
                )))
            }
        }
    }
}

/// A constructed backend, one variant per provider kind.
#[derive(Debug, Clone)]
pub enum Backend {
    /// Hosted OpenAI chat completion.
    OpenAi(ChatCompletionBackend),
    /// OpenRouter gateway, same wire format as OpenAI.
    OpenRouter(ChatCompletionBackend),
    /// Local Ollama server.
    Ollama(OllamaBackend),
}

impl Backend {
    /// Which kind this backend was built for.
    #[must_use]
    pub fn kind(&self) -> ProviderKind {
        match self {
            Backend::OpenAi(_) => ProviderKind::OpenAi,
            Backend::OpenRouter(_) => ProviderKind::OpenRouter,
            Backend::Ollama(_) => ProviderKind::Ollama,
        }
    }

    fn inner(&self) -> &dyn GenerationBackend {
        match self {
            Backend::OpenAi(b) | Backend::OpenRouter(b) => b,
            Backend::Ollama(b) => b,
        }
    }
}

#[async_trait]
impl GenerationBackend for Backend {
    async fn generate(&self, request: &BackendRequest) -> Result<String, LlmError> {
        self.inner().generate(request).await
    }

    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn model(&self) -> &str {
        self.inner().model()
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        self.inner().health_check().await
    }
}

/// Build the backend named by `config.provider`.
///
/// Credentials are checked before anything else; no network resource is
/// touched here.
///
/// # Errors
/// Returns [`LlmError::ConfigError`] for an unknown provider, a missing
/// credential or an HTTP client that cannot be built.
pub fn resolve(config: &ProviderConfig) -> Result<Backend, LlmError> {
    let kind: ProviderKind = config.provider.parse()?;
    let timeout_secs = config.request_timeout_secs;

    let backend = match kind {
        ProviderKind::OpenAi => {
            let api_key = require_credential(config.openai.api_key.as_deref(), "openai", "OPENAI_API_KEY")?;
            Backend::OpenAi(ChatCompletionBackend::new(
                "openai",
                &config.openai.base_url,
                api_key,
                &config.openai.model,
                http_client(timeout_secs)?,
                timeout_secs,
            ))
        }
        ProviderKind::OpenRouter => {
            let api_key =
                require_credential(config.openrouter.api_key.as_deref(), "openrouter", "OPENROUTER_API_KEY")?;
            Backend::OpenRouter(ChatCompletionBackend::new(
                "openrouter",
                &config.openrouter.base_url,
                api_key,
                &config.openrouter.model,
                http_client(timeout_secs)?,
                timeout_secs,
            ))
        }
        ProviderKind::Ollama => Backend::Ollama(OllamaBackend::new(
            &config.ollama.base_url,
            &config.ollama.model,
            http_client(timeout_secs)?,
            timeout_secs,
        )),
    };

    info!(provider = %kind, model = backend.model(), "LLM backend initialised");
    Ok(backend)
}

fn require_credential<'a>(value: Option<&'a str>, provider: &str, env_name: &str) -> Result<&'a str, LlmError> {
    match value.map(str::trim) {
        Some(key) if !key.is_empty() => Ok(key),
        _ => Err(LlmError::ConfigError(format!(
            "missing credential: {provider} api_key is not set (export {env_name})"
        ))),
    }
}

fn http_client(timeout_secs: u64) -> Result<Client, LlmError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| LlmError::ConfigError(format!("failed to build HTTP client: {e}")))
}
