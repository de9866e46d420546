//! Waymark CLI Library
//!
//! Command-line interface for validating and replaying Waymark chain scripts
//! against a scripted application model.

#![warn(missing_docs)]

mod commands;
mod error;
pub mod handlers;
mod output;

pub use commands::{CheckArgs, Cli, ColorArg, Commands, LogFormatArg, ReplayArgs};
pub use error::{CliError, CliResult};
pub use output::ProgressReporter;
