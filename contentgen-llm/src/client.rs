//! HTTP backends: OpenAI-compatible chat completion and Ollama.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::backend::GenerationBackend;
use crate::error::LlmError;
use crate::types::BackendRequest;

/// Chat-completion backend. Serves both the hosted OpenAI API and the
/// OpenRouter gateway; they differ only in endpoint, credential and model.
#[derive(Debug, Clone)]
pub struct ChatCompletionBackend {
    label: &'static str,
    base_url: String,
    api_key: String,
    model: String,
    http: Client,
    timeout_secs: u64,
}

impl ChatCompletionBackend {
    /// Create a backend over an already-configured HTTP client.
    #[must_use]
    pub fn new(
        label: &'static str,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        http: Client,
        timeout_secs: u64,
    ) -> Self {
        Self {
            label,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            http,
            timeout_secs,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// JSON body for `/chat/completions`.
    #[must_use]
    pub fn request_body(&self, request: &BackendRequest) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.user },
            ],
            "temperature": request.temperature,
        });
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        body
    }
}

#[async_trait]
impl GenerationBackend for ChatCompletionBackend {
    async fn generate(&self, request: &BackendRequest) -> Result<String, LlmError> {
        let url = self.url("/chat/completions");
        let body = self.request_body(request);
        debug!(backend = self.label, model = %self.model, %url, "sending chat completion");

        let start = Instant::now();
        let result = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await;

        let resp = result.map_err(|e| transport_error(self.label, e, self.timeout_secs))?;
        let json = success_json(self.label, resp, self.timeout_secs).await?;
        let text = extract_chat_content(&json)?;
        debug!(
            backend = self.label,
            latency_ms = start.elapsed().as_millis() as u64,
            tokens = json["usage"]["completion_tokens"].as_u64().unwrap_or(0),
            "chat completion finished"
        );
        Ok(text)
    }

    fn name(&self) -> &'static str {
        self.label
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        let url = self.url("/models");
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| LlmError::ConfigError(format!("{} endpoint unreachable at {url}: {e}", self.label)))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(LlmError::ConfigError(format!(
                "{} endpoint {url} answered HTTP {}",
                self.label,
                resp.status().as_u16()
            )))
        }
    }
}

/// Local inference through Ollama's `/api/generate`.
///
/// Ollama takes a single prompt, so the instruction pair is joined with a
/// blank line.
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    base_url: String,
    model: String,
    http: Client,
    timeout_secs: u64,
}

impl OllamaBackend {
    /// Create a backend over an already-configured HTTP client.
    #[must_use]
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, http: Client, timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            http,
            timeout_secs,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// JSON body for `/api/generate`.
    #[must_use]
    pub fn request_body(&self, request: &BackendRequest) -> Value {
        let mut options = json!({ "temperature": request.temperature });
        if let Some(max_tokens) = request.max_tokens {
            options["num_predict"] = json!(max_tokens);
        }
        json!({
            "model": self.model,
            "prompt": format!("{}\n\n{}", request.system, request.user),
            "stream": false,
            "options": options,
        })
    }
}

#[async_trait]
impl GenerationBackend for OllamaBackend {
    async fn generate(&self, request: &BackendRequest) -> Result<String, LlmError> {
        let url = self.url("/api/generate");
        let body = self.request_body(request);
        debug!(backend = "ollama", model = %self.model, %url, "sending generate request");

        let start = Instant::now();
        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("ollama", e, self.timeout_secs))?;
        let json = success_json("ollama", resp, self.timeout_secs).await?;
        let text = extract_ollama_content(&json)?;
        debug!(
            backend = "ollama",
            latency_ms = start.elapsed().as_millis() as u64,
            tokens = json["eval_count"].as_u64().unwrap_or(0),
            "generate finished"
        );
        Ok(text)
    }

    fn name(&self) -> &'static str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        let url = self.url("/api/tags");
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| LlmError::ConfigError(format!("ollama unreachable at {url}: {e}")))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(LlmError::ConfigError(format!(
                "ollama at {url} answered HTTP {}",
                resp.status().as_u16()
            )))
        }
    }
}

/// Pull `choices[0].message.content` out of a chat-completion response.
///
/// # Errors
/// Returns [`LlmError::ParseError`] when the field is missing or not a string.
pub fn extract_chat_content(json: &Value) -> Result<String, LlmError> {
    json["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.trim().to_string())
        .ok_or_else(|| LlmError::ParseError("missing choices[0].message.content".into()))
}

/// Pull `response` out of an Ollama generate response.
///
/// # Errors
/// Returns [`LlmError::ParseError`] when the field is missing or not a string.
pub fn extract_ollama_content(json: &Value) -> Result<String, LlmError> {
    json["response"]
        .as_str()
        .map(|s| s.trim().to_string())
        .ok_or_else(|| LlmError::ParseError("missing response field".into()))
}

async fn success_json(label: &str, resp: Response, timeout_secs: u64) -> Result<Value, LlmError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        warn!(backend = label, status = status.as_u16(), "backend returned error status");
        return Err(LlmError::Status {
            status: status.as_u16(),
            body,
        });
    }
    // The client timeout also covers the body, so read it as transport.
    let bytes = resp
        .bytes()
        .await
        .map_err(|e| transport_error(label, e, timeout_secs))?;
    serde_json::from_slice(&bytes).map_err(|e| LlmError::ParseError(e.to_string()))
}

fn transport_error(label: &str, err: reqwest::Error, timeout_secs: u64) -> LlmError {
    if err.is_timeout() {
        warn!(backend = label, "request timed out after {}s", timeout_secs);
        LlmError::Timeout(timeout_secs)
    } else {
        warn!(backend = label, "request failed: {}", err);
        LlmError::from(err)
    }
}
