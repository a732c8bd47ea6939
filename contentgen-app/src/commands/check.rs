//! `contentgen check`: verify templates and backend connectivity.

use std::process::ExitCode;

use contentgen_llm::GenerationBackend;

use crate::context::AppContext;

/// Load the templates, then probe the configured backend.
///
/// # Errors
/// Returns an error for an unreadable template store or a misconfigured
/// backend. An unreachable backend is reported and exits non-zero.
pub async fn run(ctx: &AppContext) -> anyhow::Result<ExitCode> {
    let formats = ctx.store().list()?;
    println!(
        "templates: {} format(s) in {}",
        formats.len(),
        ctx.store().path().display()
    );

    let backend = ctx.backend()?;
    match backend.health_check().await {
        Ok(()) => {
            println!("backend:   {} ({}) reachable", backend.name(), backend.model());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("backend:   {} ({}) unreachable: {e}", backend.name(), backend.model());
            Ok(ExitCode::FAILURE)
        }
    }
}
