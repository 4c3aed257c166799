//! Test runner.
//!
//! Runs registered [`TestCase`]s with a bounded number of workers. Each
//! attempt gets a fresh [`TestContext`]; a failed attempt is retried up to
//! the configured count, and a case that passes only on retry is reported
//! as [`TestStatus::Flaky`]. With fail-fast on, cases not yet started after
//! the first failure are reported as skipped.
//!
//! ```text
//!   cases ──► buffer_unordered(workers) ──► run_case ──► attempts
//!                                              │
//!                          setup ─► body (timeout, catch_unwind) ─► capture ─► teardown
//!                                              │
//!                                         TestOutcome ──► SuiteReport ──► report.json
//! ```

use crate::config::SuiteConfig;
use crate::context::{FixtureSet, TestContext};
use crate::driver::PageDriver;
use crate::result::{ErrorKind, PomError, PomResult};
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// File name of the suite report inside the output directory
pub const REPORT_FILE: &str = "report.json";

/// Body of a test case.
pub type TestFn =
    Arc<dyn for<'a> Fn(&'a TestContext) -> BoxFuture<'a, PomResult<()>> + Send + Sync>;

/// Builds a driver for each browser test, instead of launching Chromium.
pub type DriverFactory = Arc<dyn Fn() -> Arc<dyn PageDriver> + Send + Sync>;

/// A registered test.
#[derive(Clone)]
pub struct TestCase {
    /// Suite the test belongs to
    pub suite: String,
    /// Test name
    pub name: String,
    /// Resources the test needs
    pub fixtures: FixtureSet,
    body: TestFn,
}

impl std::fmt::Debug for TestCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestCase")
            .field("suite", &self.suite)
            .field("name", &self.name)
            .field("fixtures", &self.fixtures)
            .finish_non_exhaustive()
    }
}

impl TestCase {
    /// Register a test.
    pub fn new<F>(
        suite: impl Into<String>,
        name: impl Into<String>,
        fixtures: FixtureSet,
        body: F,
    ) -> Self
    where
        F: for<'a> Fn(&'a TestContext) -> BoxFuture<'a, PomResult<()>> + Send + Sync + 'static,
    {
        Self {
            suite: suite.into(),
            name: name.into(),
            fixtures,
            body: Arc::new(body),
        }
    }

    /// `suite › name`
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} › {}", self.suite, self.name)
    }

    /// Case-insensitive substring match on the full name
    #[must_use]
    pub fn matches(&self, pattern: &str) -> bool {
        self.full_name()
            .to_lowercase()
            .contains(&pattern.to_lowercase())
    }
}

/// Keep cases in `suite` (exact) whose full name matches `grep`.
#[must_use]
pub fn select(cases: Vec<TestCase>, suite: Option<&str>, grep: Option<&str>) -> Vec<TestCase> {
    cases
        .into_iter()
        .filter(|c| suite.map_or(true, |s| c.suite == s))
        .filter(|c| grep.map_or(true, |g| c.matches(g)))
        .collect()
}

/// Final status of a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    /// Passed on the first attempt
    Passed,
    /// Failed on every attempt
    Failed,
    /// Passed after at least one failed attempt
    Flaky,
    /// Not run
    Skipped,
}

impl TestStatus {
    /// Whether the case counts as passing
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Passed | Self::Flaky)
    }
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Flaky => "flaky",
            Self::Skipped => "skipped",
        };
        f.write_str(label)
    }
}

/// Result of one case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestOutcome {
    /// Suite
    pub suite: String,
    /// Name
    pub name: String,
    /// Final status
    pub status: TestStatus,
    /// Attempts made
    pub attempts: u32,
    /// Wall time over all attempts
    pub duration_ms: u64,
    /// Last failure message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Class of the last failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// Screenshots captured, one per attempt at most
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub screenshots: Vec<PathBuf>,
}

impl TestOutcome {
    fn skipped(case: &TestCase) -> Self {
        Self {
            suite: case.suite.clone(),
            name: case.name.clone(),
            status: TestStatus::Skipped,
            attempts: 0,
            duration_ms: 0,
            error: None,
            error_kind: None,
            screenshots: Vec::new(),
        }
    }

    /// `suite › name`
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} › {}", self.suite, self.name)
    }
}

/// Status counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// All cases
    pub total: usize,
    /// Passed first time
    pub passed: usize,
    /// Failed
    pub failed: usize,
    /// Passed on retry
    pub flaky: usize,
    /// Not run
    pub skipped: usize,
}

impl Summary {
    fn from_outcomes(outcomes: &[TestOutcome]) -> Self {
        let mut summary = Self {
            total: outcomes.len(),
            ..Self::default()
        };
        for outcome in outcomes {
            match outcome.status {
                TestStatus::Passed => summary.passed += 1,
                TestStatus::Failed => summary.failed += 1,
                TestStatus::Flaky => summary.flaky += 1,
                TestStatus::Skipped => summary.skipped += 1,
            }
        }
        summary
    }
}

/// Results of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Unique id of the run
    pub run_id: Uuid,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Wall time of the run
    pub duration_ms: u64,
    /// Workers used
    pub workers: usize,
    /// Retries allowed per case
    pub retries: u32,
    /// Counts
    pub summary: Summary,
    /// Per-case results in registration order
    pub outcomes: Vec<TestOutcome>,
}

impl SuiteReport {
    /// No failures and nothing skipped
    #[must_use]
    pub const fn all_passed(&self) -> bool {
        self.summary.failed == 0 && self.summary.skipped == 0
    }

    /// Failed cases
    pub fn failures(&self) -> impl Iterator<Item = &TestOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status == TestStatus::Failed)
    }

    /// Write `report.json` into `dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// I/O or serialization failures.
    pub async fn write(&self, dir: &Path) -> PomResult<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(REPORT_FILE);
        tokio::fs::write(&path, serde_json::to_vec_pretty(self)?).await?;
        Ok(path)
    }

    /// Read a report written by [`Self::write`].
    ///
    /// # Errors
    ///
    /// I/O or parse failures.
    pub async fn read(path: &Path) -> PomResult<Self> {
        let bytes = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

struct Failure {
    message: String,
    kind: Option<ErrorKind>,
}

impl From<PomError> for Failure {
    fn from(e: PomError) -> Self {
        Self {
            kind: Some(e.kind()),
            message: e.to_string(),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .map_or_else(|| "test panicked".to_string(), |m| format!("panicked: {m}"))
}

fn slug(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

/// Run `fut` under `limit`, turning expiry into a `Timeout` for `action`.
async fn bounded<T, F>(action: &str, limit: Duration, fut: F) -> PomResult<T>
where
    F: std::future::Future<Output = PomResult<T>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .unwrap_or_else(|_| {
            Err(PomError::Timeout {
                action: action.to_string(),
                ms: limit.as_millis() as u64,
            })
        })
}

/// Runs test cases under a suite configuration.
#[derive(Clone)]
pub struct Runner {
    config: SuiteConfig,
    driver_factory: Option<DriverFactory>,
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("config", &self.config)
            .field("driver_factory", &self.driver_factory.is_some())
            .finish()
    }
}

impl Runner {
    /// Runner for `config`
    #[must_use]
    pub const fn new(config: SuiteConfig) -> Self {
        Self {
            config,
            driver_factory: None,
        }
    }

    /// Build browser pages on drivers from `factory` instead of Chromium
    #[must_use]
    pub fn with_driver_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn PageDriver> + Send + Sync + 'static,
    {
        self.driver_factory = Some(Arc::new(factory));
        self
    }

    /// Suite configuration
    #[must_use]
    pub const fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Run `cases` and write the report.
    ///
    /// # Errors
    ///
    /// Only a failure to write the report; test failures are part of the
    /// report.
    pub async fn run(&self, cases: Vec<TestCase>) -> PomResult<SuiteReport> {
        self.run_with(cases, |_| {}).await
    }

    /// Run `cases`, calling `on_result` as each finishes, and write the
    /// report.
    ///
    /// # Errors
    ///
    /// Only a failure to write the report.
    pub async fn run_with<P>(&self, cases: Vec<TestCase>, mut on_result: P) -> PomResult<SuiteReport>
    where
        P: FnMut(&TestOutcome),
    {
        let started_at = Utc::now();
        let clock = Instant::now();
        let stop = AtomicBool::new(false);
        let workers = self.config.workers.max(1);

        tracing::info!(
            cases = cases.len(),
            workers,
            retries = self.config.retries,
            "starting run"
        );

        let mut indexed: Vec<(usize, TestOutcome)> = Vec::with_capacity(cases.len());
        {
            let stop = &stop;
            let mut stream = futures::stream::iter(cases.iter().enumerate())
                .map(|(index, case)| async move { (index, self.run_case(case, stop).await) })
                .buffer_unordered(workers);
            while let Some((index, outcome)) = stream.next().await {
                on_result(&outcome);
                indexed.push((index, outcome));
            }
        }
        indexed.sort_by_key(|(index, _)| *index);
        let outcomes: Vec<TestOutcome> = indexed.into_iter().map(|(_, o)| o).collect();

        let report = SuiteReport {
            run_id: Uuid::new_v4(),
            started_at,
            duration_ms: clock.elapsed().as_millis() as u64,
            workers,
            retries: self.config.retries,
            summary: Summary::from_outcomes(&outcomes),
            outcomes,
        };
        let path = report.write(&self.config.output_dir).await?;
        tracing::info!(
            passed = report.summary.passed,
            failed = report.summary.failed,
            flaky = report.summary.flaky,
            skipped = report.summary.skipped,
            report = %path.display(),
            "run finished"
        );
        Ok(report)
    }

    async fn run_case(&self, case: &TestCase, stop: &AtomicBool) -> TestOutcome {
        if stop.load(Ordering::SeqCst) {
            tracing::debug!(test = %case.full_name(), "skipped");
            return TestOutcome::skipped(case);
        }

        let clock = Instant::now();
        let max_attempts = self.config.retries.saturating_add(1);
        let mut screenshots = Vec::new();
        let mut last_failure: Option<Failure> = None;
        let mut status = TestStatus::Failed;
        let mut attempts = 0;

        while attempts < max_attempts {
            attempts += 1;
            let (result, screenshot) = self.attempt(case, attempts).await;
            screenshots.extend(screenshot);
            match result {
                Ok(()) => {
                    status = if attempts == 1 {
                        TestStatus::Passed
                    } else {
                        TestStatus::Flaky
                    };
                    break;
                }
                Err(failure) => {
                    tracing::warn!(
                        test = %case.full_name(),
                        attempt = attempts,
                        error = %failure.message,
                        "attempt failed"
                    );
                    last_failure = Some(failure);
                }
            }
        }

        if status == TestStatus::Failed && self.config.fail_fast {
            stop.store(true, Ordering::SeqCst);
        }

        let (error, error_kind) = match (status, last_failure) {
            (TestStatus::Failed, Some(f)) => (Some(f.message), f.kind),
            _ => (None, None),
        };
        tracing::info!(test = %case.full_name(), %status, attempts, "finished");
        TestOutcome {
            suite: case.suite.clone(),
            name: case.name.clone(),
            status,
            attempts,
            duration_ms: clock.elapsed().as_millis() as u64,
            error,
            error_kind,
            screenshots,
        }
    }

    async fn attempt(&self, case: &TestCase, attempt: u32) -> (Result<(), Failure>, Option<PathBuf>) {
        let driver = if case.fixtures.browser {
            self.driver_factory.as_ref().map(|factory| factory())
        } else {
            None
        };

        let limit = self.config.test_timeout;
        let setup = TestContext::setup(self.config.clone(), case.fixtures, driver);
        let ctx = match bounded("setup", limit, setup).await {
            Ok(ctx) => ctx,
            Err(e) => return (Err(e.into()), None),
        };

        let body = AssertUnwindSafe((case.body)(&ctx)).catch_unwind();
        let mut result = match tokio::time::timeout(limit, body).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(e))) => Err(Failure::from(e)),
            Ok(Err(panic)) => Err(Failure {
                message: panic_message(panic.as_ref()),
                kind: Some(ErrorKind::Assertion),
            }),
            Err(_) => Err(Failure::from(PomError::Timeout {
                action: "test".to_string(),
                ms: limit.as_millis() as u64,
            })),
        };

        let screenshot = if self.config.trace.should_capture(result.is_err()) {
            tokio::time::timeout(limit, self.capture(&ctx, case, attempt))
                .await
                .unwrap_or_else(|_| {
                    tracing::warn!(test = %case.full_name(), "screenshot capture timed out");
                    None
                })
        } else {
            None
        };

        if let Err(e) = bounded("teardown", limit, ctx.teardown()).await {
            tracing::warn!(test = %case.full_name(), error = %e, "teardown failed");
            if result.is_ok() {
                result = Err(e.into());
            }
        }
        (result, screenshot)
    }

    async fn capture(&self, ctx: &TestContext, case: &TestCase, attempt: u32) -> Option<PathBuf> {
        let page = ctx.page().ok()?;
        let dir = self.config.output_dir.join("artifacts");
        let path = dir.join(format!(
            "{}-{}-attempt{attempt}.png",
            slug(&case.suite),
            slug(&case.name)
        ));
        let written = async {
            let png = page.screenshot().await?;
            tokio::fs::create_dir_all(&dir).await?;
            tokio::fs::write(&path, png).await?;
            Ok::<_, PomError>(())
        }
        .await;
        match written {
            Ok(()) => Some(path),
            Err(e) => {
                tracing::warn!(test = %case.full_name(), error = %e, "screenshot capture failed");
                None
            }
        }
    }
}
