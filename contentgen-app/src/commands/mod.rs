//! Command handlers behind the CLI.

use std::process::ExitCode;

use crate::cli::Cmd;
use crate::context::AppContext;

pub mod check;
pub mod formats;
pub mod generate;
pub mod init;
pub mod serve;
pub mod webhook;

/// Dispatches the parsed command to the appropriate handler.
///
/// # Errors
/// Returns the handler's error; the binary prints it and exits non-zero.
pub async fn dispatch(command: Cmd, ctx: AppContext) -> anyhow::Result<ExitCode> {
    match command {
        Cmd::Generate {
            input,
            formats,
            output,
            pretty,
            vars,
            save_as,
        } => {
            let options = generate::Options {
                formats,
                output,
                pretty,
                vars: vars.into_iter().collect(),
                save_as,
            };
            generate::run(&ctx, &input, options).await
        }
        Cmd::Formats { action } => formats::run(&ctx, action),
        Cmd::Webhook { payload, root } => webhook::run(&ctx, &payload, &root).await,
        Cmd::Serve { host, port, root } => serve::run(ctx, host, port, root).await,
        Cmd::Init => init::run(&ctx),
        Cmd::Check => check::run(&ctx).await,
    }
}
