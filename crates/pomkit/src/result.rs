//! Result and error types for pomkit.
//!
//! Every failure a test can hit maps onto one of four kinds (see
//! [`ErrorKind`]): a payload that does not match its shape, an assertion that
//! did not hold, a transport failure in the browser or HTTP layer, or a
//! fixture that could not be prepared.

use crate::schema::ShapeViolation;
use thiserror::Error;

/// Result type for pomkit operations
pub type PomResult<T> = Result<T, PomError>;

/// Coarse classification of a [`PomError`], used by the runner and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Payload did not match its declared shape
    Validation,
    /// Expected UI or API state did not hold
    Assertion,
    /// Network or browser automation failure
    Transport,
    /// Fixture preparation or release failed
    Setup,
    /// Invalid configuration
    Config,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Validation => "validation",
            Self::Assertion => "assertion",
            Self::Transport => "transport",
            Self::Setup => "setup",
            Self::Config => "config",
        };
        f.write_str(name)
    }
}

/// Errors that can occur in pomkit
#[derive(Debug, Error)]
pub enum PomError {
    /// Payload failed shape validation
    #[error("{schema} failed shape validation: {}", join_violations(.violations))]
    Validation {
        /// Name of the shape that was checked
        schema: String,
        /// Every mismatch found, in document order
        violations: Vec<ShapeViolation>,
    },

    /// Assertion failed
    #[error("Assertion failed: {message} (expected {expected}, actual {actual})")]
    AssertionFailed {
        /// What was being asserted
        message: String,
        /// Expected value, rendered for humans
        expected: String,
        /// Actual value, rendered for humans
        actual: String,
    },

    /// Browser executable not found
    #[error("Browser not found. Install Chromium or set CHROMIUM_PATH")]
    BrowserNotFound,

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunchError {
        /// Error message
        message: String,
    },

    /// Page error
    #[error("Page error: {message}")]
    PageError {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Operation timed out
    #[error("{action} timed out after {ms}ms")]
    Timeout {
        /// What was being waited for
        action: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// No actionable element matched before the deadline
    #[error("Element {selector} not {reason} within {ms}ms")]
    ElementNotFound {
        /// Locator description
        selector: String,
        /// Last observed reason (`found`, `visible`, `enabled`)
        reason: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// A strict locator resolved to several elements
    #[error("Locator {selector} resolved to {count} elements")]
    StrictModeViolation {
        /// Locator description
        selector: String,
        /// Number of matches
        count: usize,
    },

    /// Script evaluation inside the page failed
    #[error("Script evaluation failed: {message}")]
    ScriptError {
        /// Error message
        message: String,
    },

    /// Screenshot error
    #[error("Screenshot failed: {message}")]
    ScreenshotError {
        /// Error message
        message: String,
    },

    /// HTTP request could not be completed
    #[error("{method} {url} failed: {message}")]
    Http {
        /// HTTP method
        method: String,
        /// Request URL
        url: String,
        /// Error message
        message: String,
    },

    /// HTTP request completed with a non-success status
    #[error("{method} {url} returned {status}: {body}")]
    HttpStatus {
        /// HTTP method
        method: String,
        /// Request URL
        url: String,
        /// Response status code
        status: u16,
        /// Response body (possibly truncated)
        body: String,
    },

    /// Fixture error (setup/teardown failed)
    #[error("Fixture '{fixture}' failed: {message}")]
    FixtureError {
        /// Fixture name
        fixture: String,
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Invalid configuration: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client error
    #[error("HTTP client error: {0}")]
    Request(#[from] reqwest::Error),
}

fn join_violations(violations: &[ShapeViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl PomError {
    /// Classify the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } | Self::Json(_) => ErrorKind::Validation,
            Self::AssertionFailed { .. } => ErrorKind::Assertion,
            Self::FixtureError { .. } => ErrorKind::Setup,
            Self::Config { .. } => ErrorKind::Config,
            Self::BrowserNotFound
            | Self::BrowserLaunchError { .. }
            | Self::PageError { .. }
            | Self::NavigationError { .. }
            | Self::Timeout { .. }
            | Self::ElementNotFound { .. }
            | Self::StrictModeViolation { .. }
            | Self::ScriptError { .. }
            | Self::ScreenshotError { .. }
            | Self::Http { .. }
            | Self::HttpStatus { .. }
            | Self::Io(_)
            | Self::Request(_) => ErrorKind::Transport,
        }
    }

    /// HTTP status carried by the error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this is a `404 Not Found` response.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.status(), Some(404))
    }

    /// Build an assertion failure.
    pub fn assertion(
        message: impl Into<String>,
        expected: impl std::fmt::Display,
        actual: impl std::fmt::Display,
    ) -> Self {
        Self::AssertionFailed {
            message: message.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Wrap an error raised while preparing or releasing a fixture.
    pub fn fixture(fixture: impl Into<String>, source: impl std::fmt::Display) -> Self {
        Self::FixtureError {
            fixture: fixture.into(),
            message: source.to_string(),
        }
    }

    /// Build a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
