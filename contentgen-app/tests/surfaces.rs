//! Integration tests for the API handlers, the webhook and the CLI commands
//! against a stub backend and a temporary template store.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;

use contentgen_app::api::{self, FormatRequest, GenerateRequest};
use contentgen_app::cli::FormatsCmd;
use contentgen_app::commands::{formats, generate};
use contentgen_app::webhook::{FileStatus, PushEvent, handle_push};
use contentgen_app::AppContext;
use contentgen_core::{AppConfig, GenerationError, TemplateStore};
use contentgen_llm::{BackendRequest, GenerationBackend, LlmError};

/// Fails every email request, answers everything else.
struct StubBackend {
    fail_all: bool,
}

#[async_trait]
impl GenerationBackend for StubBackend {
    async fn generate(&self, request: &BackendRequest) -> Result<String, LlmError> {
        if self.fail_all || request.user.contains("SUBJECT:") {
            return Err(LlmError::Unavailable("stub refuses".into()));
        }
        Ok("Fresh news. Read on!".into())
    }

    fn name(&self) -> &'static str {
        "stub"
    }

    fn model(&self) -> &str {
        "stub-1"
    }
}

fn config(dir: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.templates.path = dir.join("prompts.yaml");
    config.output.dir = dir.join("outputs");
    TemplateStore::write_defaults(&config.templates.path).expect("defaults written");
    config
}

fn context(dir: &Path, fail_all: bool) -> AppContext {
    AppContext::with_backend(config(dir), Arc::new(StubBackend { fail_all }))
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_string()).collect()
}

// ---------------------------------------------------------------------------
// POST /generate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn generate_reports_partial_failure_and_saves_bundle() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ctx = context(dir.path(), false);

    let response = api::generate(
        &ctx,
        GenerateRequest {
            input_text: "Launch of product X".into(),
            formats: Some(names(&["telegram", "email"])),
        },
    )
    .await
    .expect("partial failure is still a success");

    let json = serde_json::to_value(&response).expect("serializes");
    assert_eq!(json["results"]["telegram"], "Fresh news. Read on!");
    assert!(json["results"]["email"].is_null());
    assert!(json["errors"]["email"].is_string());
    assert!(json["timestamp"].is_string());

    let saved = response.output_file.expect("bundle saved");
    let bundle: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(saved).expect("read bundle")).expect("json");
    assert_eq!(bundle["input_text"], "Launch of product X");
    assert_eq!(bundle["formats"], serde_json::json!(["telegram", "email"]));
}

#[tokio::test]
async fn generate_defaults_to_builtin_formats() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ctx = context(dir.path(), false);

    let response = api::generate(
        &ctx,
        GenerateRequest {
            input_text: "x".into(),
            formats: None,
        },
    )
    .await
    .expect("generates");
    assert_eq!(
        response.batch.formats,
        names(&["telegram", "email", "official_letter", "newsletter"])
    );
}

#[tokio::test]
async fn generate_answers_500_when_every_format_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ctx = context(dir.path(), true);

    let err = api::generate(
        &ctx,
        GenerateRequest {
            input_text: "x".into(),
            formats: Some(names(&["telegram", "newsletter"])),
        },
    )
    .await
    .expect_err("all failed");
    assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!dir.path().join("outputs").exists());
}

#[tokio::test]
async fn generate_reports_unknown_formats_per_format() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ctx = context(dir.path(), false);

    let response = api::generate(
        &ctx,
        GenerateRequest {
            input_text: "x".into(),
            formats: Some(names(&["telegram", "tweet"])),
        },
    )
    .await
    .expect("one known format is enough");
    let json = serde_json::to_value(&response).expect("serializes");
    assert_eq!(json["results"]["telegram"], "Fresh news. Read on!");
    assert!(json["results"]["tweet"].is_null());
    assert!(json["errors"]["tweet"].as_str().is_some_and(|m| m.contains("not found")));

    let err = api::generate(
        &ctx,
        GenerateRequest {
            input_text: "x".into(),
            formats: Some(names(&["tweet"])),
        },
    )
    .await
    .expect_err("nothing generated");
    assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);

    let err = api::generate(
        &ctx,
        GenerateRequest {
            input_text: "x".into(),
            formats: Some(Vec::new()),
        },
    )
    .await
    .expect_err("empty list");
    assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn missing_credential_is_a_server_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = config(dir.path());
    config.llm.provider = "openai".into();
    config.llm.openai.api_key = None;
    let ctx = AppContext::new(config);

    let err = ctx.runner().err().expect("credential missing");
    assert!(matches!(err, GenerationError::Configuration(_)));

    let api_err = api::generate(
        &ctx,
        GenerateRequest {
            input_text: "x".into(),
            formats: None,
        },
    )
    .await
    .expect_err("misconfigured");
    assert_eq!(api_err.status, StatusCode::INTERNAL_SERVER_ERROR);

    // Template management needs no backend.
    assert!(api::list_formats(&ctx).is_ok());
}

// ---------------------------------------------------------------------------
// Format management
// ---------------------------------------------------------------------------

#[test]
fn custom_format_lifecycle() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ctx = context(dir.path(), false);

    let saved = api::upsert_format(
        &ctx,
        FormatRequest {
            format_name: "changelog".into(),
            system_prompt: "You write release notes.".into(),
            user_prompt: "Summarize {input_text}".into(),
        },
    )
    .expect("saved");
    assert_eq!(saved.format_name, "changelog");

    let overview = api::list_formats(&ctx).expect("listed");
    assert_eq!(overview.available_formats.len(), 13);
    assert_eq!(overview.custom_formats.len(), 9);
    assert_eq!(overview.custom_formats.first().map(String::as_str), Some("blog"));
    assert_eq!(overview.custom_formats.last().map(String::as_str), Some("changelog"));
    assert_eq!(overview.descriptions["changelog"], "Custom format");
    assert_eq!(
        overview.descriptions["press_release"],
        "Professional press release (~300-400 words)"
    );

    let detail = api::get_format(&ctx, "changelog").expect("found");
    assert!(!detail.entry.is_builtin);
    assert_eq!(detail.entry.user, "Summarize {input_text}");

    let body = api::all_formats_body(&api::all_formats(&ctx).expect("all"));
    let keys: Vec<&String> = body.as_object().expect("object").keys().collect();
    assert_eq!(keys.last().map(|k| k.as_str()), Some("changelog"));
    assert_eq!(body["telegram"]["is_builtin"], true);
    assert_eq!(body["faq"]["is_builtin"], false);

    api::delete_format(&ctx, "changelog").expect("deleted");
    let err = api::get_format(&ctx, "changelog").expect_err("gone");
    assert_eq!(err.status, StatusCode::NOT_FOUND);
}

#[test]
fn builtin_formats_cannot_be_deleted() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ctx = context(dir.path(), false);
    let before = std::fs::read_to_string(dir.path().join("prompts.yaml")).expect("read");

    let err = api::delete_format(&ctx, "telegram").expect_err("built-in");
    assert_eq!(err.status, StatusCode::BAD_REQUEST);

    let after = std::fs::read_to_string(dir.path().join("prompts.yaml")).expect("read");
    assert_eq!(before, after);

    let err = api::delete_format(&ctx, "never_existed").expect_err("absent");
    assert_eq!(err.status, StatusCode::NOT_FOUND);
}

#[test]
fn upsert_validates_name_and_template() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ctx = context(dir.path(), false);

    let err = api::upsert_format(
        &ctx,
        FormatRequest {
            format_name: "  ".into(),
            system_prompt: "s".into(),
            user_prompt: "u".into(),
        },
    )
    .expect_err("blank name");
    assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);

    let err = api::upsert_format(
        &ctx,
        FormatRequest {
            format_name: "broken".into(),
            system_prompt: "s".into(),
            user_prompt: "Text: {input_text".into(),
        },
    )
    .expect_err("unbalanced brace");
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
    assert!(api::get_format(&ctx, "broken").is_err());
}

#[test]
fn health_is_ok() {
    let health = api::health();
    assert_eq!(health.status, "ok");
}

// ---------------------------------------------------------------------------
// Webhook
// ---------------------------------------------------------------------------

#[tokio::test]
async fn webhook_processes_changed_markdown_documents() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ctx = context(dir.path(), false);
    let repo = dir.path().join("repo");
    std::fs::create_dir_all(repo.join("docs")).expect("mkdir");
    std::fs::write(repo.join("docs/launch.md"), "# Launch\n\nProduct X ships today.").expect("write");
    std::fs::write(repo.join("notes.txt"), "not markdown").expect("write");

    let event = PushEvent::from_json(
        r#"{
            "ref": "refs/heads/main",
            "commits": [
                {"id": "c1", "added": ["docs/launch.md", "notes.txt"], "modified": ["docs/gone.md"]}
            ]
        }"#,
    )
    .expect("payload");

    let summary = handle_push(&ctx, &repo, &event).await.expect("handled");
    assert_eq!(summary.processed_files, 1);
    assert_eq!(summary.results.len(), 2);
    assert_eq!(summary.results[0].file, "docs/launch.md");
    assert_eq!(summary.results[0].status, FileStatus::Processed);
    assert_eq!(summary.results[1].status, FileStatus::Skipped);

    let bundle_path = dir.path().join("outputs/webhook_launch.json");
    let bundle: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(bundle_path).expect("bundle")).expect("json");
    assert_eq!(bundle["source_file"], "docs/launch.md");
    assert_eq!(bundle["commit"], "c1");
    assert_eq!(bundle["results"]["telegram"], "Fresh news. Read on!");
    assert!(bundle["results"]["email"].is_null());
}

#[tokio::test]
async fn webhook_without_commits_does_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ctx = context(dir.path(), false);

    let summary = handle_push(&ctx, dir.path(), &PushEvent::default())
        .await
        .expect("handled");
    assert_eq!(summary.processed_files, 0);
    assert_eq!(summary.message, "No commits to process");
}

// ---------------------------------------------------------------------------
// CLI commands
// ---------------------------------------------------------------------------

#[tokio::test]
async fn generate_command_prints_json_and_saves() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ctx = context(dir.path(), false);
    let mut out = Vec::new();

    let options = generate::Options {
        formats: names(&["telegram", "email"]),
        ..generate::Options::default()
    };
    let batch = generate::execute(&ctx, "Launch", &options, &mut out)
        .await
        .expect("runs");
    assert_eq!(batch.failed_formats(), vec!["email"]);

    let printed: serde_json::Value = serde_json::from_slice(&out).expect("json on stdout");
    assert_eq!(printed["results"]["telegram"], "Fresh news. Read on!");

    let saved: Vec<_> = std::fs::read_dir(dir.path().join("outputs"))
        .expect("outputs dir")
        .collect();
    assert_eq!(saved.len(), 1);
}

#[tokio::test]
async fn generate_command_pretty_output_with_named_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ctx = context(dir.path(), false);
    let mut out = Vec::new();

    let options = generate::Options {
        formats: names(&["newsletter"]),
        output: Some("reports/result.json".into()),
        pretty: true,
        ..generate::Options::default()
    };
    generate::execute(&ctx, "Launch", &options, &mut out)
        .await
        .expect("runs");

    let printed = String::from_utf8(out).expect("utf8");
    assert!(printed.contains("FORMAT: NEWSLETTER"));
    assert!(printed.contains("Fresh news. Read on!"));
    assert!(dir.path().join("outputs/result.json").exists());
}

#[tokio::test]
async fn generate_command_rejects_unknown_formats_up_front() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ctx = context(dir.path(), false);
    let mut out = Vec::new();

    let options = generate::Options {
        formats: names(&["telegram", "tweet", "fax"]),
        ..generate::Options::default()
    };
    let err = generate::execute(&ctx, "x", &options, &mut out)
        .await
        .expect_err("unknown formats");
    let message = err.to_string();
    assert!(message.contains("tweet, fax"));
    assert!(message.contains("telegram, email"));
    assert!(out.is_empty());
}

#[test]
fn formats_command_lists_and_shows() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ctx = context(dir.path(), false);

    let mut out = Vec::new();
    formats::execute(&ctx, FormatsCmd::List, &mut out).expect("listed");
    let listing = String::from_utf8(out).expect("utf8");
    assert_eq!(listing.lines().count(), 12);
    assert!(listing.contains("podcast_description"));
    assert!(listing.lines().next().is_some_and(|l| l.starts_with("telegram")));

    let mut out = Vec::new();
    formats::execute(
        &ctx,
        FormatsCmd::Show {
            name: "email".into(),
        },
        &mut out,
    )
    .expect("shown");
    assert!(String::from_utf8(out).expect("utf8").contains("SUBJECT:"));

    let err = formats::execute(
        &ctx,
        FormatsCmd::Delete {
            name: "email".into(),
        },
        &mut Vec::new(),
    )
    .expect_err("built-in");
    assert!(err.to_string().contains("cannot be deleted"));
}
