//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// pomkit: page-object browser suites and schema-checked API suites
#[derive(Parser, Debug)]
#[command(name = "pomkit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (only failures and the summary)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the registered suites
    Test(TestArgs),

    /// List registered tests without running them
    List(ListArgs),

    /// Show the configuration resolved from the environment
    Config(ConfigArgs),
}

/// Arguments for the test command
#[derive(Parser, Debug, Default)]
pub struct TestArgs {
    /// Only run this suite (login, todo, api)
    #[arg(short, long)]
    pub suite: Option<String>,

    /// Only run tests whose "suite › name" contains this text
    #[arg(short, long)]
    pub grep: Option<String>,

    /// Number of tests run concurrently
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Extra attempts for a failing test
    #[arg(short, long)]
    pub retries: Option<u32>,

    /// Skip remaining tests after the first failure
    #[arg(long)]
    pub fail_fast: bool,

    /// Directory for report.json and screenshots
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Whole-test timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Arguments for the list command
#[derive(Parser, Debug, Default)]
pub struct ListArgs {
    /// Only list this suite
    #[arg(short, long)]
    pub suite: Option<String>,

    /// Only list tests whose "suite › name" contains this text
    #[arg(short, long)]
    pub grep: Option<String>,
}

/// Arguments for the config command
#[derive(Parser, Debug, Default)]
pub struct ConfigArgs {
    /// Print on one line
    #[arg(long)]
    pub compact: bool,
}

/// Color argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Auto-detect
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
