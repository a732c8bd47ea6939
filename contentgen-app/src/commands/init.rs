//! `contentgen init`: seed the template store.

use std::process::ExitCode;

use contentgen_core::TemplateStore;

use crate::context::AppContext;

/// Write the bundled templates unless the file already exists.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn run(ctx: &AppContext) -> anyhow::Result<ExitCode> {
    let path = &ctx.config().templates.path;
    if TemplateStore::write_defaults(path)? {
        println!("Default templates written to {}", path.display());
    } else {
        println!("{} already exists, left unchanged", path.display());
    }
    Ok(ExitCode::SUCCESS)
}
