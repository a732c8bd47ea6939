//! # contentgen app
//!
//! Outer surfaces of contentgen, all thin callers of
//! [`contentgen_core::BatchRunner`]:
//!
//! - `cli` + `commands`: the `contentgen` binary
//! - `api`: HTTP handlers with status-coded errors
//! - `server`: axum routes over `api` and `webhook`
//! - `webhook`: push events that regenerate changed Markdown documents
//! - `output`: JSON / text bundles in the output directory

#![deny(clippy::unwrap_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod cli;
pub mod commands;
pub mod context;
pub mod logging;
pub mod output;
pub mod server;
pub mod webhook;

pub use context::AppContext;
pub use output::{OutputFormat, OutputSink};
