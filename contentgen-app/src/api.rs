//! HTTP API handlers. [`server`](crate::server) binds them to routes.
//!
//! | route                          | handler          |
//! |--------------------------------|------------------|
//! | `POST /generate`               | [`generate`]      |
//! | `GET /formats`                 | [`list_formats`]  |
//! | `GET /api/formats`             | [`all_formats`]   |
//! | `GET /api/formats/{name}`      | [`get_format`]    |
//! | `POST /api/formats`            | [`upsert_format`] |
//! | `DELETE /api/formats/{name}`   | [`delete_format`] |
//! | `GET /health`                  | [`health`]        |
//!
//! Every failure is an [`ApiError`] carrying the status code to answer with.

use chrono::Local;
use contentgen_core::template;
use contentgen_core::{BatchResult, GenerationError};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::context::AppContext;
use crate::output::OutputFormat;

/// A failed API call: status code plus a client-facing detail message.
#[derive(Debug, Error)]
#[error("{status}: {detail}")]
pub struct ApiError {
    /// Status code to answer with.
    pub status: StatusCode,
    /// Human-readable reason.
    pub detail: String,
}

impl ApiError {
    /// Error with an explicit status.
    #[must_use]
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    /// JSON body `{ "detail": ... }`.
    #[must_use]
    pub fn body(&self) -> Value {
        serde_json::json!({ "detail": self.detail })
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        let status = match &err {
            GenerationError::NotFound { .. } => StatusCode::NOT_FOUND,
            GenerationError::Template { .. } => StatusCode::BAD_REQUEST,
            GenerationError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            GenerationError::Configuration(_) | GenerationError::Backend(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Body of `POST /generate`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    /// Text to generate from.
    pub input_text: String,
    /// Formats to generate; all built-ins when omitted.
    #[serde(default)]
    pub formats: Option<Vec<String>>,
}

/// Response of `POST /generate`.
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    /// Batch outcome: `input_text`, `formats`, `results`, `errors`.
    #[serde(flatten)]
    pub batch: BatchResult,
    /// Local time the batch finished, RFC 3339.
    pub timestamp: String,
    /// Saved bundle, if saving succeeded.
    pub output_file: Option<String>,
}

#[derive(Serialize)]
struct SavedBundle<'a> {
    #[serde(flatten)]
    batch: &'a BatchResult,
    timestamp: &'a str,
}

/// Generate every requested format and save the bundle.
///
/// Answers 200 with per-format errors unless every format failed.
///
/// # Errors
/// 422 for an empty format list, 500 when the backend or template store is
/// misconfigured or every format failed. An unknown format is reported
/// under `errors` like any other per-format failure.
pub async fn generate(ctx: &AppContext, request: GenerateRequest) -> Result<GenerateResponse, ApiError> {
    let formats = request
        .formats
        .unwrap_or_else(|| ctx.registry().builtin_names());
    info!(formats = ?formats, "generate request");

    let runner = ctx.runner()?;
    let batch = runner.generate_batch(&request.input_text, &formats).await?;

    if batch.all_failed() {
        error!(formats = ?formats, "no format could be generated");
        return Err(ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "no format could be generated",
        ));
    }

    let timestamp = Local::now().to_rfc3339();
    let bundle = SavedBundle {
        batch: &batch,
        timestamp: &timestamp,
    };
    let output_file = match ctx.sink().save(&bundle, None, OutputFormat::Json) {
        Ok(path) => Some(path.display().to_string()),
        Err(e) => {
            warn!("could not save output: {}", e);
            None
        }
    };

    Ok(GenerateResponse {
        batch,
        timestamp,
        output_file,
    })
}

// ---------------------------------------------------------------------------
// Format catalogue
// ---------------------------------------------------------------------------

/// Response of `GET /formats`.
#[derive(Debug, Serialize)]
pub struct FormatsOverview {
    /// Every stored format, document order.
    pub available_formats: Vec<String>,
    /// Built-in formats, canonical order.
    pub builtin_formats: Vec<String>,
    /// Stored formats that are not built-in.
    pub custom_formats: Vec<String>,
    /// Format name to short description.
    pub descriptions: Map<String, Value>,
}

/// Partition stored formats into built-in and custom ones.
///
/// # Errors
/// 500 if the template store cannot be loaded.
pub fn list_formats(ctx: &AppContext) -> Result<FormatsOverview, ApiError> {
    let available = ctx.store().list()?;
    let registry = ctx.registry();
    let custom: Vec<String> = available
        .iter()
        .filter(|name| !registry.is_builtin(name))
        .cloned()
        .collect();

    let mut descriptions = Map::new();
    for (name, strategy) in registry.iter() {
        descriptions.insert(name.to_string(), Value::from(strategy.description));
    }
    for name in &custom {
        descriptions.insert(name.clone(), Value::from(registry.describe(name)));
    }

    Ok(FormatsOverview {
        available_formats: available,
        builtin_formats: registry.builtin_names(),
        custom_formats: custom,
        descriptions,
    })
}

/// One stored template as exposed by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatEntry {
    /// System instruction.
    pub system: String,
    /// User instruction template.
    pub user: String,
    /// Whether the format is built-in.
    pub is_builtin: bool,
}

/// Response of `GET /api/formats/{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatDetail {
    /// Format name.
    pub format_name: String,
    /// Template and flag.
    #[serde(flatten)]
    pub entry: FormatEntry,
}

/// Every stored template keyed by name, document order.
///
/// # Errors
/// 500 if the template store cannot be loaded.
pub fn all_formats(ctx: &AppContext) -> Result<Vec<(String, FormatEntry)>, ApiError> {
    let set = ctx.store().load()?;
    Ok(set
        .iter()
        .map(|(name, template)| {
            (
                name.to_string(),
                FormatEntry {
                    system: template.system.clone(),
                    user: template.user.clone(),
                    is_builtin: ctx.registry().is_builtin(name),
                },
            )
        })
        .collect())
}

/// JSON object form of [`all_formats`].
#[must_use]
pub fn all_formats_body(entries: &[(String, FormatEntry)]) -> Value {
    let mut map = Map::new();
    for (name, entry) in entries {
        map.insert(
            name.clone(),
            serde_json::json!({
                "system": entry.system,
                "user": entry.user,
                "is_builtin": entry.is_builtin,
            }),
        );
    }
    Value::Object(map)
}

/// Template for one format.
///
/// # Errors
/// 404 if the format has no template.
pub fn get_format(ctx: &AppContext, format_name: &str) -> Result<FormatDetail, ApiError> {
    let template = ctx.store().get(format_name)?;
    Ok(FormatDetail {
        format_name: format_name.to_string(),
        entry: FormatEntry {
            system: template.system,
            user: template.user,
            is_builtin: ctx.registry().is_builtin(format_name),
        },
    })
}

/// Body of `POST /api/formats`.
#[derive(Debug, Clone, Deserialize)]
pub struct FormatRequest {
    /// Format to create or replace.
    pub format_name: String,
    /// System instruction.
    pub system_prompt: String,
    /// User instruction template; may reference `{input_text}`.
    pub user_prompt: String,
}

/// Confirmation returned by the mutating endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageResponse {
    /// Human-readable confirmation.
    pub message: String,
    /// Affected format.
    pub format_name: String,
}

/// Create or replace a template.
///
/// # Errors
/// 422 for a blank name, 400 for a user template with malformed
/// placeholders, 500 if the store cannot be written.
pub fn upsert_format(ctx: &AppContext, request: FormatRequest) -> Result<MessageResponse, ApiError> {
    let name = request.format_name.trim();
    if name.is_empty() {
        return Err(ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "format_name must not be empty",
        ));
    }
    if let Err(source) = template::placeholders(&request.user_prompt) {
        return Err(GenerationError::Template {
            format_name: name.to_string(),
            source,
        }
        .into());
    }

    ctx.store()
        .put(name, &request.system_prompt, &request.user_prompt)?;
    Ok(MessageResponse {
        message: format!("Format '{name}' saved"),
        format_name: name.to_string(),
    })
}

/// Delete a custom template. Built-in formats cannot be deleted.
///
/// # Errors
/// 400 for a built-in format, 404 if the format is absent, 500 if the store
/// cannot be written.
pub fn delete_format(ctx: &AppContext, format_name: &str) -> Result<MessageResponse, ApiError> {
    if ctx.registry().is_builtin(format_name) {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            format!("Built-in format '{format_name}' cannot be deleted"),
        ));
    }
    ctx.store().delete(format_name)?;
    Ok(MessageResponse {
        message: format!("Format '{format_name}' deleted"),
        format_name: format_name.to_string(),
    })
}

/// Response of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Health {
    /// Always `ok`.
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
}

/// Liveness probe.
#[must_use]
pub fn health() -> Health {
    Health {
        status: "ok",
        service: "contentgen",
    }
}
