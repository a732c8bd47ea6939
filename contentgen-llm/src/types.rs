//! Core types for backend requests and provider configuration.

use serde::{Deserialize, Serialize};

/// A single generation call: one instruction pair plus sampling settings.
#[derive(Debug, Clone, Serialize)]
pub struct BackendRequest {
    /// System instruction.
    pub system: String,
    /// User instruction, already rendered.
    pub user: String,
    /// Sampling temperature. Passed through without range checks.
    pub temperature: f32,
    /// Output cap; `None` leaves the backend default in place.
    pub max_tokens: Option<u32>,
}

impl BackendRequest {
    /// Create a request with the default temperature and no output cap.
    #[must_use]
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature: 0.7,
            max_tokens: None,
        }
    }

    /// Set the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the output token cap.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Backend connection settings, resolved once at process start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider kind: "openai", "openrouter" or "ollama".
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Transport timeout for a single call, in seconds.
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// Hosted chat-completion settings.
    #[serde(default)]
    pub openai: OpenAiConfig,
    /// Unified gateway settings.
    #[serde(default)]
    pub openrouter: OpenRouterConfig,
    /// Local inference settings.
    #[serde(default)]
    pub ollama: OllamaConfig,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            request_timeout_secs: default_timeout(),
            openai: OpenAiConfig::default(),
            openrouter: OpenRouterConfig::default(),
            ollama: OllamaConfig::default(),
        }
    }
}

/// Settings for the OpenAI chat-completion API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Bearer token. Required when this provider is selected.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Base URL including the version segment.
    #[serde(default = "default_openai_url")]
    pub base_url: String,
    /// Model identifier.
    #[serde(default = "default_openai_model")]
    pub model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openai_url(),
            model: default_openai_model(),
        }
    }
}

/// Settings for the OpenRouter gateway (OpenAI-compatible wire format).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRouterConfig {
    /// Bearer token. Required when this provider is selected.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Base URL including the version segment.
    #[serde(default = "default_openrouter_url")]
    pub base_url: String,
    /// Model identifier.
    #[serde(default = "default_openrouter_model")]
    pub model: String,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openrouter_url(),
            model: default_openrouter_model(),
        }
    }
}

/// Settings for a local Ollama server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Server URL.
    #[serde(default = "default_ollama_url")]
    pub base_url: String,
    /// Model tag.
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_url(),
            model: default_ollama_model(),
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_openai_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o".to_string()
}

fn default_openrouter_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_openrouter_model() -> String {
    "x-ai/grok-4.1-fast:free".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2".to_string()
}
