//! Push-event webhook: regenerate every built-in format for each Markdown
//! document touched by a push.

use std::path::{Component, Path, PathBuf};

use contentgen_core::GenerationError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::context::AppContext;
use crate::output::OutputFormat;

/// Extension of the documents a push triggers generation for.
pub const DOCUMENT_EXTENSION: &str = "md";

/// Errors that abort a whole delivery.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The payload is not a JSON push event.
    #[error("invalid webhook payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    /// The backend or template store is unusable.
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// Push event as sent by the repository host.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PushEvent {
    /// Pushed ref, e.g. `refs/heads/main`.
    #[serde(rename = "ref", default)]
    pub git_ref: Option<String>,
    /// Commits in push order.
    #[serde(default)]
    pub commits: Vec<Commit>,
    /// Repository metadata, unused beyond logging.
    #[serde(default)]
    pub repository: Option<Value>,
}

/// One pushed commit.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Commit {
    /// Commit hash.
    #[serde(default)]
    pub id: Option<String>,
    /// Paths added by the commit.
    #[serde(default)]
    pub added: Vec<String>,
    /// Paths modified by the commit.
    #[serde(default)]
    pub modified: Vec<String>,
}

/// A document selected from a push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedDocument {
    /// Repository-relative path.
    pub path: String,
    /// Commit that touched it first.
    pub commit: Option<String>,
}

impl PushEvent {
    /// Parse a JSON payload.
    ///
    /// # Errors
    /// Returns [`WebhookError::InvalidPayload`] for malformed JSON.
    pub fn from_json(payload: &str) -> Result<Self, WebhookError> {
        Ok(serde_json::from_str(payload)?)
    }

    /// Added and modified Markdown paths in push order, each listed once.
    #[must_use]
    pub fn changed_documents(&self) -> Vec<ChangedDocument> {
        let mut documents: Vec<ChangedDocument> = Vec::new();
        for commit in &self.commits {
            for path in commit.added.iter().chain(&commit.modified) {
                if !is_document(path) || documents.iter().any(|d| d.path == *path) {
                    continue;
                }
                documents.push(ChangedDocument {
                    path: path.clone(),
                    commit: commit.id.clone(),
                });
            }
        }
        documents
    }
}

fn is_document(path: &str) -> bool {
    Path::new(path)
        .extension()
        .is_some_and(|ext| ext == DOCUMENT_EXTENSION)
}

/// Resolve `relative` under `root`, refusing absolute paths and `..`.
fn resolve_under(root: &Path, relative: &str) -> Option<PathBuf> {
    let rel = Path::new(relative);
    rel.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        .then(|| root.join(rel))
}

/// What happened to one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// Generated and saved.
    Processed,
    /// Missing, unreadable, empty or outside the root.
    Skipped,
    /// Generation ran but every format failed, or saving failed.
    Failed,
}

/// Per-document entry of a [`WebhookSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    /// Repository-relative path.
    pub file: String,
    /// Outcome.
    pub status: FileStatus,
    /// Saved bundle, for processed documents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
    /// Reason, for skipped or failed documents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Result of one delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookSummary {
    /// Human-readable outcome.
    pub message: String,
    /// Number of documents generated and saved.
    pub processed_files: usize,
    /// One entry per selected document.
    pub results: Vec<FileReport>,
}

#[derive(Serialize)]
struct DocumentBundle<'a> {
    source_file: &'a str,
    source_content: &'a str,
    commit: Option<&'a str>,
    #[serde(flatten)]
    batch: &'a contentgen_core::BatchResult,
}

/// Handle one push delivery, reading documents relative to `root`.
///
/// Every selected document runs the batch over all built-in formats and is
/// saved as `webhook_<stem>.json`.
///
/// # Errors
/// Only a misconfigured backend or an unloadable template store abort the
/// delivery; per-document problems are reported in the summary.
pub async fn handle_push(
    ctx: &AppContext,
    root: &Path,
    event: &PushEvent,
) -> Result<WebhookSummary, WebhookError> {
    info!(
        git_ref = event.git_ref.as_deref().unwrap_or("unknown"),
        commits = event.commits.len(),
        "push event received"
    );

    if event.commits.is_empty() {
        return Ok(WebhookSummary {
            message: "No commits to process".to_string(),
            processed_files: 0,
            results: Vec::new(),
        });
    }

    let documents = event.changed_documents();
    if documents.is_empty() {
        return Ok(WebhookSummary {
            message: "No Markdown documents changed".to_string(),
            processed_files: 0,
            results: Vec::new(),
        });
    }

    let runner = ctx.runner()?;
    let formats = ctx.registry().builtin_names();
    let mut results = Vec::with_capacity(documents.len());

    for document in &documents {
        let Some(content) = read_document(root, &document.path) else {
            results.push(FileReport {
                file: document.path.clone(),
                status: FileStatus::Skipped,
                output_file: None,
                detail: Some("document is missing, empty or outside the root".to_string()),
            });
            continue;
        };

        info!(file = %document.path, "processing document");
        let batch = match runner.generate_batch(&content, &formats).await {
            Ok(batch) => batch,
            Err(e @ GenerationError::Configuration(_)) => return Err(e.into()),
            Err(e) => {
                error!(file = %document.path, "generation failed: {}", e);
                results.push(failed(&document.path, e.to_string()));
                continue;
            }
        };

        if batch.all_failed() {
            results.push(failed(&document.path, "no format could be generated".to_string()));
            continue;
        }

        let bundle = DocumentBundle {
            source_file: &document.path,
            source_content: &content,
            commit: document.commit.as_deref(),
            batch: &batch,
        };
        let filename = format!("webhook_{}", stem(&document.path));
        match ctx.sink().save(&bundle, Some(&filename), OutputFormat::Json) {
            Ok(path) => results.push(FileReport {
                file: document.path.clone(),
                status: FileStatus::Processed,
                output_file: Some(path.display().to_string()),
                detail: batch.has_errors().then(|| {
                    format!("failed formats: {}", batch.failed_formats().join(", "))
                }),
            }),
            Err(e) => results.push(failed(&document.path, e.to_string())),
        }
    }

    let processed_files = results
        .iter()
        .filter(|r| r.status == FileStatus::Processed)
        .count();
    info!(processed_files, selected = documents.len(), "push event handled");

    Ok(WebhookSummary {
        message: "Webhook processed".to_string(),
        processed_files,
        results,
    })
}

fn failed(path: &str, detail: String) -> FileReport {
    FileReport {
        file: path.to_string(),
        status: FileStatus::Failed,
        output_file: None,
        detail: Some(detail),
    }
}

fn read_document(root: &Path, relative: &str) -> Option<String> {
    let Some(path) = resolve_under(root, relative) else {
        warn!(file = relative, "refusing path outside the document root");
        return None;
    };
    match std::fs::read_to_string(&path) {
        Ok(content) if !content.trim().is_empty() => Some(content),
        Ok(_) => {
            warn!(file = relative, "document is empty");
            None
        }
        Err(e) => {
            warn!(file = relative, "cannot read document: {}", e);
            None
        }
    }
}

fn stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map_or_else(|| "document".to_string(), |s| s.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "ref": "refs/heads/main",
        "commits": [
            {"id": "a1", "added": ["docs/launch.md", "img/logo.png"], "modified": ["README.md"]},
            {"id": "b2", "added": [], "modified": ["docs/launch.md", "notes.txt", "blog/post.md"]}
        ],
        "repository": {"full_name": "acme/site"}
    }"#;

    #[test]
    fn selects_markdown_once_in_push_order() {
        let event = PushEvent::from_json(PAYLOAD).expect("valid payload");
        assert_eq!(event.git_ref.as_deref(), Some("refs/heads/main"));
        let docs = event.changed_documents();
        let paths: Vec<&str> = docs.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, vec!["docs/launch.md", "README.md", "blog/post.md"]);
        assert_eq!(docs[0].commit.as_deref(), Some("a1"));
        assert_eq!(docs[2].commit.as_deref(), Some("b2"));
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let event = PushEvent::from_json("{}").expect("empty object is a push");
        assert!(event.commits.is_empty());
        assert!(event.changed_documents().is_empty());
    }

    #[test]
    fn malformed_payload_is_rejected() {
        let err = PushEvent::from_json("{not json").expect_err("invalid");
        assert!(matches!(err, WebhookError::InvalidPayload(_)));
    }

    #[test]
    fn paths_escaping_root_are_refused() {
        let root = Path::new("/srv/repo");
        assert_eq!(resolve_under(root, "docs/a.md"), Some(root.join("docs/a.md")));
        assert_eq!(resolve_under(root, "../etc/passwd.md"), None);
        assert_eq!(resolve_under(root, "/etc/passwd.md"), None);
    }

    #[test]
    fn stem_drops_directories_and_extension() {
        assert_eq!(stem("docs/launch.md"), "launch");
    }
}
