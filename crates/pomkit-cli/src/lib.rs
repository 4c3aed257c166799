//! pomkit CLI library
//!
//! Argument parsing, progress output, and the glue that resolves a
//! [`pomkit::SuiteConfig`] and hands the registered suites to the runner.

#![warn(missing_docs)]

mod commands;
mod config;
mod error;
mod output;
mod runner;

pub use commands::{Cli, ColorArg, Commands, ConfigArgs, ListArgs, TestArgs};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{listing_line, outcome_line, summary_line, ProgressReporter};
pub use runner::{apply_overrides, list_lines, render_config, select_cases, TestRunner};
