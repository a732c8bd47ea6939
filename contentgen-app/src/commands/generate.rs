//! `contentgen generate`: run the batch and save the results.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::bail;
use contentgen_core::BatchResult;
use tracing::warn;

use crate::context::AppContext;
use crate::output::OutputFormat;

const RULE_WIDTH: usize = 60;

/// Options of one `generate` invocation.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Requested formats; empty means every built-in format.
    pub formats: Vec<String>,
    /// Name to save the results under; its stem is used inside the output directory.
    pub output: Option<PathBuf>,
    /// Print each format instead of the JSON document.
    pub pretty: bool,
    /// Extra template substitutions.
    pub vars: BTreeMap<String, String>,
    /// File rendering of the saved results.
    pub save_as: OutputFormat,
}

/// Run the command; exits non-zero when any format failed.
///
/// # Errors
/// Returns an error for unknown formats or an unusable backend.
pub async fn run(ctx: &AppContext, input: &str, options: Options) -> anyhow::Result<ExitCode> {
    let mut stdout = std::io::stdout();
    let batch = execute(ctx, input, &options, &mut stdout).await?;

    if !batch.has_errors() {
        return Ok(ExitCode::SUCCESS);
    }
    for (name, failure) in batch.errors() {
        eprintln!("✗ {name}: {}", failure.message);
    }
    eprintln!("warning: {} format(s) could not be generated", batch.failed_formats().len());
    Ok(ExitCode::FAILURE)
}

/// Validate formats, run the batch, save the results and write the
/// requested view to `out`.
///
/// # Errors
/// Returns an error listing unsupported formats before anything is
/// generated, or a backend configuration error.
pub async fn execute<W: Write>(
    ctx: &AppContext,
    input: &str,
    options: &Options,
    out: &mut W,
) -> anyhow::Result<BatchResult> {
    let formats = if options.formats.is_empty() {
        ctx.registry().builtin_names()
    } else {
        options.formats.clone()
    };

    let known = ctx.known_formats()?;
    let unsupported: Vec<&str> = formats
        .iter()
        .filter(|f| !known.contains(f))
        .map(String::as_str)
        .collect();
    if !unsupported.is_empty() {
        bail!(
            "unsupported formats: {}. Available formats: {}",
            unsupported.join(", "),
            known.join(", ")
        );
    }

    eprintln!("Generating {} format(s)...", formats.len());
    let runner = ctx.runner()?;
    let batch = runner
        .generate_batch_with(input, &formats, &options.vars)
        .await?;

    if options.pretty {
        let rule = "=".repeat(RULE_WIDTH);
        for result in batch.results() {
            if let Some(content) = result.content() {
                writeln!(
                    out,
                    "\n{rule}\nFORMAT: {}\n{rule}\n{content}\n{rule}",
                    result.format_name.to_uppercase()
                )?;
            }
        }
    }

    let filename = options
        .output
        .as_deref()
        .and_then(Path::file_stem)
        .map(|s| s.to_string_lossy().into_owned());
    match ctx.sink().save(&batch, filename.as_deref(), options.save_as) {
        Ok(path) => eprintln!("Results saved to: {}", path.display()),
        Err(e) => {
            warn!("could not save results: {}", e);
            eprintln!("warning: could not save results: {e}");
        }
    }

    if !options.pretty && options.output.is_none() {
        serde_json::to_writer_pretty(&mut *out, &batch)?;
        writeln!(out)?;
    }

    Ok(batch)
}
