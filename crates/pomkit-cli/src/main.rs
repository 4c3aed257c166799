//! pomkit: run the page-object and API suites

use clap::Parser;
use pomkit::SuiteConfig;
use pomkit_cli::{
    apply_overrides, list_lines, render_config, Cli, CliConfig, CliError, CliResult, Commands,
    TestArgs, TestRunner, Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn run() -> CliResult<bool> {
    let cli = Cli::parse();
    let config = build_config(&cli);

    match cli.command {
        Commands::Test(ref args) => run_tests(config, args),
        Commands::List(ref args) => {
            for line in list_lines(args)? {
                println!("{line}");
            }
            Ok(true)
        }
        Commands::Config(ref args) => {
            let suite_config = SuiteConfig::from_env()?;
            println!("{}", render_config(&suite_config, args.compact)?);
            Ok(true)
        }
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.verbose, cli.quiet))
        .with_color(cli.color.into())
        .with_log_json(cli.log_json)
}

fn run_tests(config: CliConfig, args: &TestArgs) -> CliResult<bool> {
    let suite_config = apply_overrides(SuiteConfig::from_env()?, args)?;
    pomkit::logging::init(
        config
            .verbosity
            .log_filter(suite_config.default_log_level()),
        config.log_json,
    )?;
    tracing::debug!(config = ?suite_config, "resolved suite configuration");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::config(format!("failed to start runtime: {e}")))?;

    let mut runner = TestRunner::new(config);
    let report = runtime.block_on(runner.run(suite_config, args))?;
    Ok(report.all_passed())
}
