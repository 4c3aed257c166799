//! Progress reporting and result formatting

use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use pomkit::runner::Summary;
use pomkit::{SuiteReport, TestCase, TestOutcome, TestStatus};

/// Progress reporter for a test run
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter writing to stderr
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    /// Start a progress bar over `total` tests
    pub fn start_progress(&mut self, total: u64) {
        if self.quiet || !self.term.is_term() {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message("running");
        self.progress_bar = Some(pb);
    }

    /// Record a finished test
    pub fn record(&self, outcome: &TestOutcome) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(1);
        }
        if self.quiet && outcome.status.is_ok() {
            return;
        }
        self.line(&outcome_line(outcome, self.use_color));
        if let (Some(error), TestStatus::Failed) = (&outcome.error, outcome.status) {
            self.line(&format!("    {error}"));
        }
        for shot in &outcome.screenshots {
            self.line(&format!("    screenshot: {}", shot.display()));
        }
    }

    /// Finish progress bar
    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_and_clear();
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("⚠").yellow().bold().to_string()
        } else {
            "WARN".to_string()
        };
        self.line(&format!("{prefix} {message}"));
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("ℹ").blue().bold().to_string()
        } else {
            "INFO".to_string()
        };
        self.line(&format!("{prefix} {message}"));
    }

    /// Print the run summary; shown in quiet mode too
    pub fn summary(&self, report: &SuiteReport) {
        self.line("");
        self.line(&summary_line(&report.summary, report.duration_ms, self.use_color));
    }

    fn line(&self, text: &str) {
        match self.progress_bar {
            Some(ref pb) => pb.println(text),
            None => {
                let _ = self.term.write_line(text);
            }
        }
    }
}

/// One result line: status marker, full name, attempts and duration
#[must_use]
pub fn outcome_line(outcome: &TestOutcome, use_color: bool) -> String {
    let (marker, paint) = match outcome.status {
        TestStatus::Passed => ("✓", Style::new().green().bold()),
        TestStatus::Flaky => ("~", Style::new().yellow().bold()),
        TestStatus::Failed => ("✗", Style::new().red().bold()),
        TestStatus::Skipped => ("-", Style::new().dim()),
    };
    let marker = if use_color {
        paint.apply_to(marker).to_string()
    } else {
        outcome.status.to_string().to_uppercase()
    };

    let mut line = format!("{marker} {}", outcome.full_name());
    if outcome.status != TestStatus::Skipped {
        line.push_str(&format!(" ({}ms", outcome.duration_ms));
        if outcome.attempts > 1 {
            line.push_str(&format!(", {} attempts", outcome.attempts));
        }
        line.push(')');
    }
    line
}

/// Totals line for the end of a run
#[must_use]
pub fn summary_line(summary: &Summary, duration_ms: u64, use_color: bool) -> String {
    let failed = summary.failed > 0 || summary.skipped > 0;
    let secs = duration_ms as f64 / 1000.0;
    let counts = format!(
        "{} passed, {} flaky, {} failed, {} skipped",
        summary.passed, summary.flaky, summary.failed, summary.skipped
    );

    let status = if failed { "FAILED" } else { "PASSED" };
    let status = if use_color {
        let paint = if failed {
            Style::new().red().bold()
        } else {
            Style::new().green().bold()
        };
        paint.apply_to(status).to_string()
    } else {
        status.to_string()
    };

    format!("{status} {} tests in {secs:.2}s ({counts})", summary.total)
}

/// Listing line for a registered test
#[must_use]
pub fn listing_line(case: &TestCase) -> String {
    let fixtures = case.fixtures.names();
    if fixtures.is_empty() {
        case.full_name()
    } else {
        format!("{} [{}]", case.full_name(), fixtures.join(", "))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn outcome(status: TestStatus, attempts: u32) -> TestOutcome {
        TestOutcome {
            suite: "api".to_string(),
            name: "creates a post".to_string(),
            status,
            attempts,
            duration_ms: 42,
            error: None,
            error_kind: None,
            screenshots: Vec::new(),
        }
    }

    mod line_tests {
        use super::*;

        #[test]
        fn test_passed_line_without_color() {
            assert_eq!(
                outcome_line(&outcome(TestStatus::Passed, 1), false),
                "PASSED api › creates a post (42ms)"
            );
        }

        #[test]
        fn test_flaky_line_shows_attempts() {
            let line = outcome_line(&outcome(TestStatus::Flaky, 2), false);
            assert!(line.starts_with("FLAKY"));
            assert!(line.ends_with("(42ms, 2 attempts)"));
        }

        #[test]
        fn test_skipped_line_has_no_timing() {
            assert_eq!(
                outcome_line(&outcome(TestStatus::Skipped, 0), false),
                "SKIPPED api › creates a post"
            );
        }

        #[test]
        fn test_summary_line() {
            let summary = Summary {
                total: 4,
                passed: 2,
                failed: 1,
                flaky: 1,
                skipped: 0,
            };
            assert_eq!(
                summary_line(&summary, 1500, false),
                "FAILED 4 tests in 1.50s (2 passed, 1 flaky, 1 failed, 0 skipped)"
            );
        }

        #[test]
        fn test_skips_fail_the_summary() {
            let summary = Summary {
                total: 1,
                skipped: 1,
                ..Summary::default()
            };
            assert!(summary_line(&summary, 0, false).starts_with("FAILED"));
        }

        #[test]
        fn test_listing_line_names_fixtures() {
            let case = pomkit::specs::all()
                .into_iter()
                .find(|c| c.suite == "api" && c.fixtures.test_post)
                .unwrap();
            assert!(listing_line(&case).ends_with("[api, test_post]"));
        }
    }

    mod progress_reporter_tests {
        use super::*;

        #[test]
        fn test_new_reporter() {
            let reporter = ProgressReporter::new(false, true);
            assert!(!reporter.use_color);
            assert!(reporter.quiet);
        }

        #[test]
        fn test_record_without_bar() {
            let mut reporter = ProgressReporter::new(false, false);
            reporter.start_progress(1);
            let mut failed = outcome(TestStatus::Failed, 1);
            failed.error = Some("expected 201, got 500".to_string());
            failed.screenshots = vec![PathBuf::from("test-results/artifacts/x.png")];
            reporter.record(&failed);
            reporter.finish();
        }
    }
}
