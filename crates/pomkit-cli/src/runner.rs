//! Glue between the CLI arguments and the pomkit runner

use crate::commands::{ListArgs, TestArgs};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::{listing_line, ProgressReporter};
use pomkit::runner::{self, Runner};
use pomkit::specs::{self, SUITES};
use pomkit::{SuiteConfig, SuiteReport, TestCase};
use std::time::Duration;

/// Apply `test` flags on top of the environment configuration.
///
/// # Errors
///
/// Rejects zero workers and a zero timeout.
pub fn apply_overrides(mut config: SuiteConfig, args: &TestArgs) -> CliResult<SuiteConfig> {
    if let Some(workers) = args.workers {
        if workers == 0 {
            return Err(CliError::invalid_argument("--workers must be at least 1"));
        }
        config = config.with_workers(workers);
    }
    if let Some(retries) = args.retries {
        config = config.with_retries(retries);
    }
    if args.fail_fast {
        config = config.with_fail_fast(true);
    }
    if let Some(ref dir) = args.output {
        config = config.with_output_dir(dir.clone());
    }
    if args.headed {
        config = config.with_headless(false);
    }
    if let Some(secs) = args.timeout {
        if secs == 0 {
            return Err(CliError::invalid_argument("--timeout must be at least 1 second"));
        }
        config = config.with_test_timeout(Duration::from_secs(secs));
    }
    Ok(config)
}

/// Registered cases filtered by suite and name.
///
/// # Errors
///
/// Rejects an unknown suite name.
pub fn select_cases(suite: Option<&str>, grep: Option<&str>) -> CliResult<Vec<TestCase>> {
    if let Some(name) = suite {
        if !SUITES.contains(&name) {
            return Err(CliError::invalid_argument(format!(
                "unknown suite '{name}' (expected one of: {})",
                SUITES.join(", ")
            )));
        }
    }
    Ok(runner::select(specs::all(), suite, grep))
}

/// Runs the selected suites with progress output
#[derive(Debug)]
pub struct TestRunner {
    config: CliConfig,
    reporter: ProgressReporter,
}

impl TestRunner {
    /// Create a new test runner
    #[must_use]
    pub fn new(config: CliConfig) -> Self {
        let reporter = ProgressReporter::new(
            config.color.should_color(),
            config.verbosity.is_quiet(),
        );
        Self { config, reporter }
    }

    /// CLI settings
    #[must_use]
    pub const fn config(&self) -> &CliConfig {
        &self.config
    }

    /// Run the cases selected by `args` under `suite_config`.
    ///
    /// # Errors
    ///
    /// Invalid selections and report write failures. Failing tests are
    /// reported in the returned [`SuiteReport`].
    pub async fn run(&mut self, suite_config: SuiteConfig, args: &TestArgs) -> CliResult<SuiteReport> {
        let cases = select_cases(args.suite.as_deref(), args.grep.as_deref())?;
        if cases.is_empty() {
            return Err(CliError::invalid_argument("no tests match the given filters"));
        }

        if !cfg!(feature = "browser") && cases.iter().any(|c| c.fixtures.browser) {
            self.reporter
                .warning("built without the browser feature; browser tests will fail");
        }
        if self.config.verbosity.is_verbose() {
            self.reporter.info(&format!(
                "{} tests, {} workers, {} retries, output {}",
                cases.len(),
                suite_config.workers,
                suite_config.retries,
                suite_config.output_dir.display()
            ));
        }

        self.reporter.start_progress(cases.len() as u64);
        let runner = Runner::new(suite_config);
        let reporter = &self.reporter;
        let report = runner.run_with(cases, |outcome| reporter.record(outcome)).await;
        self.reporter.finish();

        let report = report?;
        self.reporter.summary(&report);
        Ok(report)
    }
}

/// Lines printed by `pomkit list`.
///
/// # Errors
///
/// Rejects an unknown suite name.
pub fn list_lines(args: &ListArgs) -> CliResult<Vec<String>> {
    Ok(select_cases(args.suite.as_deref(), args.grep.as_deref())?
        .iter()
        .map(listing_line)
        .collect())
}

/// Suite configuration rendered as JSON.
///
/// # Errors
///
/// Serialization failures.
pub fn render_config(config: &SuiteConfig, compact: bool) -> CliResult<String> {
    let json = if compact {
        serde_json::to_string(config)?
    } else {
        serde_json::to_string_pretty(config)?
    };
    Ok(json)
}
