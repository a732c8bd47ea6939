//! HTTP server: binds the [`api`](crate::api) handlers and the push webhook
//! to axum routes.
//!
//! | route                        | handler                      |
//! |------------------------------|------------------------------|
//! | `POST /generate`             | [`api::generate`]            |
//! | `GET /formats`               | [`api::list_formats`]        |
//! | `GET /api/formats`           | [`api::all_formats`]         |
//! | `GET /api/formats/{name}`    | [`api::get_format`]          |
//! | `POST /api/formats`          | [`api::upsert_format`]       |
//! | `DELETE /api/formats/{name}` | [`api::delete_format`]       |
//! | `GET /health`                | [`api::health`]              |
//! | `POST /webhook/github`       | [`webhook::handle_push`]     |
//! | `GET /webhook/health`        | webhook liveness             |

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::api::{self, ApiError, FormatRequest, GenerateRequest};
use crate::context::AppContext;
use crate::webhook::{self, PushEvent, WebhookError};

/// State shared by every route.
pub struct ServerState {
    /// Configuration and components.
    pub ctx: AppContext,
    /// Directory push-event paths are resolved against.
    pub webhook_root: PathBuf,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body())).into_response()
    }
}

impl From<WebhookError> for ApiError {
    fn from(err: WebhookError) -> Self {
        match err {
            WebhookError::InvalidPayload(e) => {
                ApiError::new(StatusCode::BAD_REQUEST, format!("invalid JSON payload: {e}"))
            }
            WebhookError::Generation(e) => {
                error!("webhook delivery failed: {}", e);
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        }
    }
}

/// Router over `state`.
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/generate", post(generate))
        .route("/formats", get(list_formats))
        .route("/api/formats", get(all_formats).post(upsert_format))
        .route("/api/formats/{name}", get(get_format).delete(delete_format))
        .route("/health", get(health))
        .route("/webhook/github", post(github_webhook))
        .route("/webhook/health", get(webhook_health))
        .with_state(state)
}

/// Serve on `listener` until Ctrl-C.
///
/// # Errors
/// Returns an I/O error if the listener fails.
pub async fn serve(listener: TcpListener, state: Arc<ServerState>) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "HTTP server listening");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

async fn generate(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<api::GenerateResponse>, ApiError> {
    api::generate(&state.ctx, request).await.map(Json)
}

async fn list_formats(State(state): State<Arc<ServerState>>) -> Result<Json<api::FormatsOverview>, ApiError> {
    api::list_formats(&state.ctx).map(Json)
}

async fn all_formats(State(state): State<Arc<ServerState>>) -> Result<Json<Value>, ApiError> {
    let entries = api::all_formats(&state.ctx)?;
    Ok(Json(api::all_formats_body(&entries)))
}

async fn get_format(
    State(state): State<Arc<ServerState>>,
    Path(name): Path<String>,
) -> Result<Json<api::FormatDetail>, ApiError> {
    api::get_format(&state.ctx, &name).map(Json)
}

async fn upsert_format(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<FormatRequest>,
) -> Result<Json<api::MessageResponse>, ApiError> {
    api::upsert_format(&state.ctx, request).map(Json)
}

async fn delete_format(
    State(state): State<Arc<ServerState>>,
    Path(name): Path<String>,
) -> Result<Json<api::MessageResponse>, ApiError> {
    api::delete_format(&state.ctx, &name).map(Json)
}

async fn health() -> Json<api::Health> {
    Json(api::health())
}

async fn github_webhook(
    State(state): State<Arc<ServerState>>,
    body: String,
) -> Result<Json<webhook::WebhookSummary>, ApiError> {
    let event = PushEvent::from_json(&body)?;
    let summary = webhook::handle_push(&state.ctx, &state.webhook_root, &event).await?;
    Ok(Json(summary))
}

async fn webhook_health() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "contentgen-webhook" }))
}
