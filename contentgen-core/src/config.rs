//! Application configuration.
//!
//! Maps to `contentgen.toml`. Values are layered, lowest priority first:
//! conventional environment variables (`AI_PROVIDER`, `OPENAI_API_KEY`, ...),
//! the TOML file, then `CONTENTGEN_<SECTION>__<KEY>` environment variables.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use contentgen_llm::ProviderConfig;
use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, Result};

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "contentgen.toml";

/// Prefix of structured environment overrides.
pub const ENV_PREFIX: &str = "CONTENTGEN";

/// Conventional variables mapped onto config keys when those keys are unset.
const FALLBACK_VARS: [(&str, &str); 5] = [
    ("AI_PROVIDER", "llm.provider"),
    ("OPENAI_API_KEY", "llm.openai.api_key"),
    ("OPENROUTER_API_KEY", "llm.openrouter.api_key"),
    ("LOG_LEVEL", "general.log_level"),
    ("OUTPUT_DIR", "output.dir"),
];

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Logging settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Backend selection and credentials.
    #[serde(default)]
    pub llm: ProviderConfig,
    /// Template store location.
    #[serde(default)]
    pub templates: TemplatesConfig,
    /// Where generated content is saved.
    #[serde(default)]
    pub output: OutputConfig,
    /// HTTP listener for `contentgen serve`.
    #[serde(default)]
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `GenerationError::Configuration` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| GenerationError::Configuration(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GenerationError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Load the layered configuration from the process environment.
    ///
    /// With `path` set the file must exist; otherwise [`DEFAULT_CONFIG_FILE`]
    /// is used when present.
    ///
    /// # Errors
    /// Returns `GenerationError::Configuration` on a missing explicit file or
    /// a value of the wrong type.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, std::env::vars().collect())
    }

    /// Like [`load`](Self::load) with an explicit environment.
    ///
    /// # Errors
    /// See [`load`](Self::load).
    pub fn load_with_env(path: Option<&Path>, env: config::Map<String, String>) -> Result<Self> {
        let mut builder = Config::builder();

        for (var, key) in FALLBACK_VARS {
            if let Some(value) = env.get(var).filter(|v| !v.trim().is_empty()) {
                builder = builder.set_default(key, value.as_str()).map_err(config_error)?;
            }
        }

        let file = match path {
            Some(path) => File::from(path).format(FileFormat::Toml).required(true),
            None => File::from(Path::new(DEFAULT_CONFIG_FILE))
                .format(FileFormat::Toml)
                .required(false),
        };

        let settings = builder
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(env)),
            )
            .build()
            .map_err(config_error)?;

        settings.try_deserialize().map_err(config_error)
    }
}

fn config_error(err: config::ConfigError) -> GenerationError {
    GenerationError::Configuration(err.to_string())
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level or `EnvFilter` directive; `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::Text,
        }
    }
}

/// Template store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatesConfig {
    /// YAML document holding the prompt templates.
    #[serde(default = "default_templates_path")]
    pub path: PathBuf,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            path: default_templates_path(),
        }
    }
}

/// Output sink settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory generated files are written to.
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory push-event paths are resolved against.
    #[serde(default = "default_webhook_root")]
    pub webhook_root: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            webhook_root: default_webhook_root(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_templates_path() -> PathBuf {
    PathBuf::from("prompts.yaml")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./outputs")
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_webhook_root() -> PathBuf {
    PathBuf::from(".")
}
