//! `contentgen serve`: run the HTTP API and the push webhook.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use crate::context::AppContext;
use crate::server::{self, ServerState};

/// Bind the configured address, with command-line overrides, and serve
/// until Ctrl-C.
///
/// # Errors
/// Returns an error if the address cannot be bound.
pub async fn run(
    ctx: AppContext,
    host: Option<String>,
    port: Option<u16>,
    root: Option<PathBuf>,
) -> anyhow::Result<ExitCode> {
    let settings = &ctx.config().server;
    let host = host.unwrap_or_else(|| settings.host.clone());
    let port = port.unwrap_or(settings.port);
    let webhook_root = root.unwrap_or_else(|| settings.webhook_root.clone());

    let listener = TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("cannot bind {host}:{port}"))?;
    server::serve(listener, Arc::new(ServerState { ctx, webhook_root })).await?;
    Ok(ExitCode::SUCCESS)
}
