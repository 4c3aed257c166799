//! Assertions.
//!
//! Locator assertions poll until they hold or the locator's timeout expires,
//! then fail with the last observed value. Value assertions check once.

use crate::locator::Locator;
use crate::page::Page;
use crate::result::{PomError, PomResult};
use regex::Regex;
use std::fmt::{Debug, Display};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Start an auto-retrying assertion on a locator.
#[must_use]
pub fn expect(locator: &Locator) -> LocatorExpect {
    LocatorExpect {
        locator: locator.clone(),
        timeout: locator.timeout(),
    }
}

/// Auto-retrying assertions on a [`Locator`].
#[derive(Debug, Clone)]
pub struct LocatorExpect {
    locator: Locator,
    timeout: Duration,
}

impl LocatorExpect {
    /// Override how long to keep retrying
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Poll `observe` until `check` accepts its output.
    async fn poll<T, F, Fut>(
        &self,
        what: &str,
        expected: impl Display,
        observe: F,
        check: impl Fn(&T) -> bool,
    ) -> PomResult<()>
    where
        T: Debug,
        F: Fn() -> Fut,
        Fut: Future<Output = PomResult<T>>,
    {
        let deadline = Instant::now() + self.timeout;
        let poll = self.locator.page().timeouts().poll_interval;
        loop {
            let actual = observe().await?;
            if check(&actual) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(PomError::assertion(
                    format!("{} {what}", self.locator),
                    expected,
                    format!("{actual:?}"),
                ));
            }
            tokio::time::sleep(poll).await;
        }
    }

    /// Element is visible
    ///
    /// # Errors
    ///
    /// Assertion failure after the timeout.
    pub async fn to_be_visible(&self) -> PomResult<()> {
        self.poll("visible", true, || self.locator.is_visible(), |v| *v)
            .await
    }

    /// Element is absent or hidden
    ///
    /// # Errors
    ///
    /// Assertion failure after the timeout.
    pub async fn to_be_hidden(&self) -> PomResult<()> {
        self.poll("visible", false, || self.locator.is_visible(), |v| !*v)
            .await
    }

    /// Exactly `n` elements match
    ///
    /// # Errors
    ///
    /// Assertion failure after the timeout.
    pub async fn to_have_count(&self, n: usize) -> PomResult<()> {
        self.poll("count", n, || self.locator.count(), |c| *c == n)
            .await
    }

    /// Text contains `text`
    ///
    /// # Errors
    ///
    /// Assertion failure after the timeout.
    pub async fn to_contain_text(&self, text: &str) -> PomResult<()> {
        self.poll(
            "text",
            format!("text containing {text:?}"),
            || self.locator.text_content(),
            |t| t.as_deref().is_some_and(|t| t.contains(text)),
        )
        .await
    }

    /// Whitespace-normalized text equals `text`
    ///
    /// # Errors
    ///
    /// Assertion failure after the timeout.
    pub async fn to_have_text(&self, text: &str) -> PomResult<()> {
        let wanted = normalize(text);
        self.poll(
            "text",
            format!("{text:?}"),
            || self.locator.text_content(),
            |t| t.as_deref().is_some_and(|t| normalize(t) == wanted),
        )
        .await
    }

    /// Class attribute matches `pattern`
    ///
    /// # Errors
    ///
    /// Config error for an invalid pattern, assertion failure after the
    /// timeout.
    pub async fn to_have_class(&self, pattern: &str) -> PomResult<()> {
        let re = compile(pattern)?;
        self.poll(
            "class",
            format!("/{pattern}/"),
            || self.locator.class_name(),
            |c| c.as_deref().is_some_and(|c| re.is_match(c)),
        )
        .await
    }

    /// Element is enabled
    ///
    /// # Errors
    ///
    /// Assertion failure after the timeout.
    pub async fn to_be_enabled(&self) -> PomResult<()> {
        self.poll("enabled", true, || self.locator.is_enabled(), |v| *v)
            .await
    }
}

fn normalize(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn compile(pattern: &str) -> PomResult<Regex> {
    Regex::new(pattern).map_err(|e| PomError::config(format!("pattern /{pattern}/: {e}")))
}

/// Page URL matches `pattern`, retrying until the navigation timeout.
///
/// # Errors
///
/// Assertion failure if the URL never matches.
pub async fn expect_url_matches(page: &Page, pattern: &str) -> PomResult<()> {
    let re = compile(pattern)?;
    let timeouts = page.timeouts();
    let deadline = Instant::now() + timeouts.navigation;
    loop {
        let url = page.url().await?;
        if re.is_match(&url) {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(PomError::assertion("page url", format!("/{pattern}/"), url));
        }
        tokio::time::sleep(timeouts.poll_interval).await;
    }
}

/// Values are equal.
///
/// # Errors
///
/// Assertion failure with both values.
pub fn expect_eq<T: PartialEq + Debug>(what: &str, expected: T, actual: T) -> PomResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(PomError::assertion(
            what,
            format!("{expected:?}"),
            format!("{actual:?}"),
        ))
    }
}

/// Condition holds.
///
/// # Errors
///
/// Assertion failure.
pub fn expect_true(what: &str, condition: bool) -> PomResult<()> {
    if condition {
        Ok(())
    } else {
        Err(PomError::assertion(what, true, false))
    }
}

/// `haystack` contains `needle`.
///
/// # Errors
///
/// Assertion failure with the haystack.
pub fn expect_contains(what: &str, haystack: &str, needle: &str) -> PomResult<()> {
    if haystack.contains(needle) {
        Ok(())
    } else {
        Err(PomError::assertion(
            what,
            format!("text containing {needle:?}"),
            format!("{haystack:?}"),
        ))
    }
}
