//! Persistence sink for generated bundles.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use clap::ValueEnum;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info};

/// Errors raised while saving a bundle.
#[derive(Debug, Error)]
pub enum OutputError {
    /// The output directory or file could not be written.
    #[error("cannot write {path}: {source}")]
    Io {
        /// Path being written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The document could not be serialized.
    #[error("cannot serialize output: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// On-disk rendering of a saved bundle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON.
    #[default]
    Json,
    /// Flattened text with one `=== KEY ===` section per top-level field.
    Txt,
}

impl OutputFormat {
    /// File extension for this rendering.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Txt => "txt",
        }
    }
}

/// Writes documents into one output directory.
#[derive(Debug, Clone)]
pub struct OutputSink {
    dir: PathBuf,
}

impl OutputSink {
    /// Sink over `dir`; the directory is created on first save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Output directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save `data` as `<dir>/<filename>.<ext>` and return the path.
    ///
    /// Without a filename the file is named `output_YYYYmmdd_HHMMSS`.
    ///
    /// # Errors
    /// Returns [`OutputError`] if the document cannot be rendered or written.
    pub fn save<T: Serialize>(
        &self,
        data: &T,
        filename: Option<&str>,
        format: OutputFormat,
    ) -> Result<PathBuf, OutputError> {
        fs::create_dir_all(&self.dir).map_err(|source| OutputError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let stem = filename.map_or_else(timestamped_name, str::to_string);
        let path = self.dir.join(format!("{stem}.{}", format.extension()));

        let rendered = match format {
            OutputFormat::Json => serde_json::to_string_pretty(data)?,
            OutputFormat::Txt => render_text(&serde_json::to_value(data)?),
        };

        fs::write(&path, rendered).map_err(|source| {
            error!(path = %path.display(), "failed to save output: {}", source);
            OutputError::Io {
                path: path.clone(),
                source,
            }
        })?;

        info!(path = %path.display(), "output saved");
        Ok(path)
    }
}

/// `output_YYYYmmdd_HHMMSS` in local time.
#[must_use]
pub fn timestamped_name() -> String {
    format!("output_{}", Local::now().format("%Y%m%d_%H%M%S"))
}

fn render_text(document: &Value) -> String {
    let mut out = String::new();
    let Value::Object(fields) = document else {
        let _ = writeln!(out, "{}", scalar(document));
        return out;
    };

    for (key, value) in fields {
        let _ = write!(out, "=== {} ===\n\n", key.to_uppercase());
        match value {
            Value::Object(entries) => {
                for (name, entry) in entries {
                    let _ = write!(out, "{name}: {}\n\n", scalar(entry));
                }
            }
            other => {
                let _ = write!(out, "{}\n\n", scalar(other));
            }
        }
        out.push('\n');
    }
    out
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(scalar).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}
