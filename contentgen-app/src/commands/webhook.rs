//! `contentgen webhook`: process a saved push payload.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;

use crate::context::AppContext;
use crate::webhook::{FileStatus, PushEvent, handle_push};

/// Handle the payload in `payload` with documents under `root`.
///
/// Prints the summary as JSON; exits non-zero when any document failed.
///
/// # Errors
/// Returns an error for an unreadable or malformed payload, or an unusable
/// backend.
pub async fn run(ctx: &AppContext, payload: &Path, root: &Path) -> anyhow::Result<ExitCode> {
    let raw = std::fs::read_to_string(payload)
        .with_context(|| format!("cannot read payload {}", payload.display()))?;
    let event = PushEvent::from_json(&raw)?;
    let summary = handle_push(ctx, root, &event).await?;

    println!("{}", serde_json::to_string_pretty(&summary)?);

    if summary.results.iter().any(|r| r.status == FileStatus::Failed) {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
