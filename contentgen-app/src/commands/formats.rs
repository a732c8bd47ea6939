//! `contentgen formats`: template management.

use std::io::Write;
use std::process::ExitCode;

use crate::api::{self, ApiError, FormatRequest};
use crate::cli::FormatsCmd;
use crate::context::AppContext;

/// Run a `formats` subcommand against stdout.
///
/// # Errors
/// Returns the store error, or a refusal to delete a built-in format.
pub fn run(ctx: &AppContext, action: FormatsCmd) -> anyhow::Result<ExitCode> {
    let mut stdout = std::io::stdout();
    execute(ctx, action, &mut stdout)?;
    Ok(ExitCode::SUCCESS)
}

/// Run a `formats` subcommand, writing to `out`.
///
/// # Errors
/// See [`run`].
pub fn execute<W: Write>(ctx: &AppContext, action: FormatsCmd, out: &mut W) -> anyhow::Result<()> {
    match action {
        FormatsCmd::List => {
            let overview = api::list_formats(ctx).map_err(detail)?;
            for name in &overview.builtin_formats {
                let note = if overview.available_formats.contains(name) {
                    ""
                } else {
                    " (no template)"
                };
                writeln!(out, "{name:<20} built-in  {}{note}", describe(&overview.descriptions, name))?;
            }
            for name in &overview.custom_formats {
                writeln!(out, "{name:<20} custom    {}", describe(&overview.descriptions, name))?;
            }
        }
        FormatsCmd::Show { name } => {
            let format = api::get_format(ctx, &name).map_err(detail)?;
            let kind = if format.entry.is_builtin { "built-in" } else { "custom" };
            writeln!(out, "{} ({kind})", format.format_name)?;
            writeln!(out, "\n[system]\n{}", format.entry.system)?;
            writeln!(out, "\n[user]\n{}", format.entry.user)?;
        }
        FormatsCmd::Put { name, system, user } => {
            let response = api::upsert_format(
                ctx,
                FormatRequest {
                    format_name: name,
                    system_prompt: system,
                    user_prompt: user,
                },
            )
            .map_err(detail)?;
            writeln!(out, "{}", response.message)?;
        }
        FormatsCmd::Delete { name } => {
            let response = api::delete_format(ctx, &name).map_err(detail)?;
            writeln!(out, "{}", response.message)?;
        }
    }
    Ok(())
}

fn describe<'a>(descriptions: &'a serde_json::Map<String, serde_json::Value>, name: &str) -> &'a str {
    descriptions
        .get(name)
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
}

fn detail(err: ApiError) -> anyhow::Error {
    anyhow::anyhow!(err.detail)
}
