//! # contentgen-llm: LLM Backend Layer
//!
//! Provides one text-generation interface across three services:
//!   - **OpenAI** chat completion (hosted)
//!   - **OpenRouter** (unified gateway, OpenAI wire format)
//!   - **Ollama** (local inference)
//!
//! Every call in contentgen goes through [`GenerationBackend::generate`]:
//! one attempt, trimmed text back, or an [`LlmError`].
//!
//! ```text
//! ProviderConfig ──resolve()──▶ Backend ──generate()──▶ String
//!                                 │
//!                                 ├── OpenAi(ChatCompletionBackend)
//!                                 ├── OpenRouter(ChatCompletionBackend)
//!                                 └── Ollama(OllamaBackend)
//! ```

pub mod backend;
pub mod client;
pub mod error;
pub mod selector;
pub mod types;

pub use backend::GenerationBackend;
pub use client::{ChatCompletionBackend, OllamaBackend};
pub use error::LlmError;
pub use selector::{Backend, ProviderKind, resolve};
pub use types::{BackendRequest, OllamaConfig, OpenAiConfig, OpenRouterConfig, ProviderConfig};
