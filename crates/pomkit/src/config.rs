//! Suite configuration resolved from the environment.
//!
//! A `.env` file is loaded with `dotenvy` when present. Resolution goes
//! through a lookup closure so tests can supply variables without touching
//! the process environment.

use crate::result::{PomError, PomResult};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Default browser base URL
pub const DEFAULT_BASE_URL: &str = "https://the-internet.herokuapp.com";
/// Default REST API base URL
pub const DEFAULT_API_BASE_URL: &str = "https://jsonplaceholder.typicode.com";
/// Default TodoMVC URL
pub const DEFAULT_TODO_URL: &str = "https://demo.playwright.dev/todomvc/";
/// Default whole-test timeout (45 seconds)
pub const DEFAULT_TEST_TIMEOUT_MS: u64 = 45_000;
/// Default per-action timeout (10 seconds)
pub const DEFAULT_ACTION_TIMEOUT_MS: u64 = 10_000;
/// Default navigation timeout (30 seconds)
pub const DEFAULT_NAVIGATION_TIMEOUT_MS: u64 = 30_000;
/// Default polling interval for auto-waiting (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;
/// CI viewport
pub const CI_VIEWPORT: (u32, u32) = (1920, 1080);

/// When artifacts are captured for a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TraceMode {
    /// Never capture
    Off,
    /// Capture for every test
    On,
    /// Capture only when the test ends unsuccessfully
    RetainOnFailure,
}

impl TraceMode {
    /// Whether artifacts are wanted for a test with this outcome.
    #[must_use]
    pub const fn should_capture(self, failed: bool) -> bool {
        match self {
            Self::Off => false,
            Self::On => true,
            Self::RetainOnFailure => failed,
        }
    }
}

impl std::str::FromStr for TraceMode {
    type Err = PomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "on" => Ok(Self::On),
            "retain-on-failure" => Ok(Self::RetainOnFailure),
            other => Err(PomError::config(format!("unknown trace mode '{other}'"))),
        }
    }
}

/// Timeouts shared by page handles and locators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Timeouts {
    /// Upper bound for a single element action or auto-wait
    #[serde(with = "millis")]
    pub action: Duration,
    /// Upper bound for a navigation
    #[serde(with = "millis")]
    pub navigation: Duration,
    /// Auto-wait polling interval
    #[serde(with = "millis")]
    pub poll_interval: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            action: Duration::from_millis(DEFAULT_ACTION_TIMEOUT_MS),
            navigation: Duration::from_millis(DEFAULT_NAVIGATION_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl Timeouts {
    /// Set the action timeout
    #[must_use]
    pub const fn with_action(mut self, timeout: Duration) -> Self {
        self.action = timeout;
        self
    }

    /// Set the navigation timeout
    #[must_use]
    pub const fn with_navigation(mut self, timeout: Duration) -> Self {
        self.navigation = timeout;
        self
    }

    /// Set the polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

mod millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }
}

/// A username/password pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Username
    pub username: String,
    /// Password
    pub password: String,
}

impl Credentials {
    /// Create a credential pair
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Everything a suite run needs to know about its environment.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteConfig {
    /// Base URL relative browser paths resolve against
    pub base_url: String,
    /// Base URL of the REST API
    pub api_base_url: String,
    /// Fully-qualified TodoMVC URL
    pub todo_url: String,
    /// Running under CI
    pub ci: bool,
    /// Parallel test workers
    pub workers: usize,
    /// Retries per failed test
    pub retries: u32,
    /// Stop scheduling after the first failure
    pub fail_fast: bool,
    /// Fixed viewport, or `None` for a maximized window
    pub viewport: Option<(u32, u32)>,
    /// Run the browser headless
    pub headless: bool,
    /// Chromium sandbox
    pub sandbox: bool,
    /// Browser executable override
    pub chromium_path: Option<String>,
    /// Artifact capture policy
    pub trace: TraceMode,
    /// Whole-test upper bound
    #[serde(with = "millis")]
    pub test_timeout: Duration,
    /// Action/navigation timeouts
    pub timeouts: Timeouts,
    /// Report and artifact directory
    pub output_dir: PathBuf,
    /// Default valid user
    #[serde(skip)]
    pub credentials: Credentials,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self::for_mode(false)
    }
}

impl SuiteConfig {
    fn for_mode(ci: bool) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            todo_url: DEFAULT_TODO_URL.to_string(),
            ci,
            workers: if ci { 3 } else { 1 },
            retries: u32::from(ci),
            fail_fast: false,
            viewport: ci.then_some(CI_VIEWPORT),
            headless: true,
            sandbox: !ci,
            chromium_path: None,
            trace: TraceMode::RetainOnFailure,
            test_timeout: Duration::from_millis(DEFAULT_TEST_TIMEOUT_MS),
            timeouts: Timeouts::default(),
            output_dir: PathBuf::from("test-results"),
            credentials: Credentials::new("tomsmith", "SuperSecretPassword!"),
        }
    }

    /// Resolve from the process environment, loading `.env` first.
    ///
    /// # Errors
    ///
    /// Returns a config error if a variable holds an unparseable value.
    pub fn from_env() -> PomResult<Self> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(PomError::config(format!(".env: {e}"))),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve using an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns a config error if a variable holds an unparseable value.
    pub fn from_lookup<F>(lookup: F) -> PomResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let ci = get("CI").is_some_and(|v| is_truthy(&v));
        let mut config = Self::for_mode(ci);

        if let Some(url) = get("BASE_URL") {
            config.base_url = url;
        }
        if let Some(url) = get("API_BASE_URL") {
            config.api_base_url = url;
        }
        if let Some(url) = get("TODO_URL") {
            config.todo_url = url;
        }
        if let Some(headless) = get("HEADLESS") {
            config.headless = parse_bool("HEADLESS", &headless)?;
        }
        if let Some(path) = get("CHROMIUM_PATH") {
            config.chromium_path = Some(path);
        }
        if let Some(trace) = get("POMKIT_TRACE") {
            config.trace = trace.parse()?;
        }
        if let Some(dir) = get("POMKIT_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        if let Some(username) = get("VALID_USERNAME") {
            config.credentials.username = username;
        }
        if let Some(password) = get("VALID_PASSWORD") {
            config.credentials.password = password;
        }

        reqwest::Url::parse(&config.base_url)
            .map_err(|e| PomError::config(format!("BASE_URL '{}': {e}", config.base_url)))?;
        reqwest::Url::parse(&config.api_base_url).map_err(|e| {
            PomError::config(format!("API_BASE_URL '{}': {e}", config.api_base_url))
        })?;

        Ok(config)
    }

    /// Log filter used when `RUST_LOG` is not set.
    #[must_use]
    pub const fn default_log_level(&self) -> &'static str {
        if self.ci {
            "info"
        } else {
            "debug"
        }
    }

    /// Set worker count (at least one)
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set retry count
    #[must_use]
    pub const fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Stop after the first failure
    #[must_use]
    pub const fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Set the whole-test timeout
    #[must_use]
    pub const fn with_test_timeout(mut self, timeout: Duration) -> Self {
        self.test_timeout = timeout;
        self
    }

    /// Set action/navigation timeouts
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Set the browser base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the API base URL
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Set the output directory
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set the trace mode
    #[must_use]
    pub const fn with_trace(mut self, trace: TraceMode) -> Self {
        self.trace = trace;
        self
    }
}

fn is_truthy(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

fn parse_bool(key: &str, value: &str) -> PomResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(PomError::config(format!(
            "{key} must be a boolean, got '{other}'"
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resolve(vars: &[(&str, &str)]) -> PomResult<SuiteConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        SuiteConfig::from_lookup(|key| map.get(key).cloned())
    }

    mod mode_tests {
        use super::*;

        #[test]
        fn test_local_defaults() {
            let config = resolve(&[]).unwrap();
            assert!(!config.ci);
            assert_eq!(config.workers, 1);
            assert_eq!(config.retries, 0);
            assert_eq!(config.viewport, None);
            assert_eq!(config.base_url, DEFAULT_BASE_URL);
            assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
            assert_eq!(config.test_timeout, Duration::from_secs(45));
            assert_eq!(config.timeouts.action, Duration::from_secs(10));
            assert_eq!(config.timeouts.navigation, Duration::from_secs(30));
            assert_eq!(config.default_log_level(), "debug");
        }

        #[test]
        fn test_ci_switches_workers_retries_viewport() {
            let config = resolve(&[("CI", "true")]).unwrap();
            assert!(config.ci);
            assert_eq!(config.workers, 3);
            assert_eq!(config.retries, 1);
            assert_eq!(config.viewport, Some((1920, 1080)));
            assert!(!config.sandbox);
            assert_eq!(config.default_log_level(), "info");
        }

        #[test]
        fn test_ci_false_values() {
            for value in ["0", "false", "FALSE", "no", ""] {
                assert!(!resolve(&[("CI", value)]).unwrap().ci, "CI={value}");
            }
        }
    }

    mod override_tests {
        use super::*;

        #[test]
        fn test_base_url_override() {
            let config = resolve(&[("BASE_URL", "http://localhost:3000")]).unwrap();
            assert_eq!(config.base_url, "http://localhost:3000");
        }

        #[test]
        fn test_invalid_base_url() {
            let err = resolve(&[("BASE_URL", "not a url")]).unwrap_err();
            assert_eq!(err.kind(), crate::result::ErrorKind::Config);
        }

        #[test]
        fn test_credentials_override() {
            let config =
                resolve(&[("VALID_USERNAME", "alice"), ("VALID_PASSWORD", "s3cret")]).unwrap();
            assert_eq!(config.credentials, Credentials::new("alice", "s3cret"));
        }

        #[test]
        fn test_headless_parsing() {
            assert!(!resolve(&[("HEADLESS", "false")]).unwrap().headless);
            assert!(resolve(&[("HEADLESS", "maybe")]).is_err());
        }

        #[test]
        fn test_trace_mode() {
            let config = resolve(&[("POMKIT_TRACE", "on")]).unwrap();
            assert_eq!(config.trace, TraceMode::On);
            assert!(resolve(&[("POMKIT_TRACE", "sometimes")]).is_err());
        }
    }

    mod builder_tests {
        use super::*;

        #[test]
        fn test_workers_never_zero() {
            assert_eq!(SuiteConfig::default().with_workers(0).workers, 1);
        }

        #[test]
        fn test_trace_capture_policy() {
            assert!(TraceMode::RetainOnFailure.should_capture(true));
            assert!(!TraceMode::RetainOnFailure.should_capture(false));
            assert!(TraceMode::On.should_capture(false));
            assert!(!TraceMode::Off.should_capture(true));
        }

        #[test]
        fn test_serializes_timeouts_as_millis() {
            let json = serde_json::to_value(SuiteConfig::default()).unwrap();
            assert_eq!(json["test_timeout"], 45_000);
            assert_eq!(json["timeouts"]["action"], 10_000);
            assert!(json.get("credentials").is_none());
        }
    }
}
