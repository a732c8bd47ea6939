//! Defines the command-line interface structure using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Debug, Parser)]
#[command(
    name = "contentgen",
    version,
    about = "Generate social posts, emails, letters and newsletters from one text"
)]
pub struct Cli {
    /// Configuration file (TOML); `contentgen.toml` is used when present
    #[arg(long, short = 'c', global = true, env = "CONTENTGEN_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Cmd,
}

#[derive(Debug, Subcommand)]
pub enum Cmd {
    /// Generate content in one or more formats
    Generate {
        /// Input text to generate from
        #[arg(short = 'i', long = "input")]
        input: String,
        /// Format to generate; repeat for several (default: all built-in)
        #[arg(short = 'f', long = "format")]
        formats: Vec<String>,
        /// Save results under this name instead of a timestamped one
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
        /// Print each generated format instead of the JSON document
        #[arg(short = 'p', long)]
        pretty: bool,
        /// Extra template substitution in key=value form
        #[arg(long = "var", value_parser = parse_var)]
        vars: Vec<(String, String)>,
        /// File rendering of the saved results
        #[arg(long = "save-as", value_enum, default_value_t = OutputFormat::Json)]
        save_as: OutputFormat,
    },
    /// Manage prompt templates
    Formats {
        #[command(subcommand)]
        action: FormatsCmd,
    },
    /// Process a push-event payload from a file
    Webhook {
        /// JSON payload file
        #[arg(long)]
        payload: PathBuf,
        /// Directory the pushed paths are relative to
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
    /// Serve the HTTP API and the push webhook
    Serve {
        /// Interface to bind (default: from config)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (default: from config)
        #[arg(long)]
        port: Option<u16>,
        /// Directory pushed paths are relative to (default: from config)
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// Write the bundled default templates to the configured path
    Init,
    /// Check that the configured backend is reachable
    Check,
}

#[derive(Debug, Subcommand)]
pub enum FormatsCmd {
    /// List built-in and custom formats
    List,
    /// Show the templates of one format
    Show { name: String },
    /// Create or replace a format
    Put {
        name: String,
        #[arg(long, help = "System instruction")]
        system: String,
        #[arg(long, help = "User instruction template, may contain {input_text}")]
        user: String,
    },
    /// Delete a custom format
    Delete { name: String },
}

/// Parse `key=value`.
fn parse_var(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_accepts_repeated_formats() {
        let cli = Cli::try_parse_from([
            "contentgen", "generate", "-i", "Launch", "-f", "telegram", "-f", "email", "-p",
        ])
        .expect("valid arguments");
        match cli.command {
            Cmd::Generate {
                input,
                formats,
                pretty,
                output,
                save_as,
                ..
            } => {
                assert_eq!(input, "Launch");
                assert_eq!(formats, vec!["telegram", "email"]);
                assert!(pretty);
                assert!(output.is_none());
                assert_eq!(save_as, OutputFormat::Json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn generate_requires_input() {
        assert!(Cli::try_parse_from(["contentgen", "generate"]).is_err());
    }

    #[test]
    fn vars_are_split_on_first_equals() {
        assert_eq!(parse_var("a=b=c"), Ok(("a".to_string(), "b=c".to_string())));
        assert!(parse_var("novalue").is_err());
        assert!(parse_var("=x").is_err());
    }

    #[test]
    fn serve_overrides_are_optional() {
        let cli = Cli::try_parse_from(["contentgen", "serve", "--port", "9000"]).expect("valid arguments");
        match cli.command {
            Cmd::Serve { host, port, root } => {
                assert!(host.is_none());
                assert_eq!(port, Some(9000));
                assert!(root.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn formats_put_takes_both_templates() {
        let cli = Cli::try_parse_from([
            "contentgen", "formats", "put", "promo", "--system", "S", "--user", "U {input_text}",
        ])
        .expect("valid arguments");
        assert!(matches!(
            cli.command,
            Cmd::Formats {
                action: FormatsCmd::Put { .. }
            }
        ));
    }
}
