//! Tracing subscriber setup for the binary.

use contentgen_core::config::{GeneralConfig, LogFormat};
use tracing_subscriber::EnvFilter;

/// Filter from `RUST_LOG`, falling back to the configured level.
///
/// # Errors
/// Returns an error if the configured level is not a valid directive.
pub fn env_filter(general: &GeneralConfig) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(&general.log_level)?),
    }
}

/// Install the global subscriber. Logs go to stderr.
///
/// # Errors
/// Returns an error for an invalid level or when a subscriber is already set.
pub fn init(general: &GeneralConfig) -> anyhow::Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(general)?)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = match general.log_format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))
}
