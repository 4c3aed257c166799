//! Shared page handle.
//!
//! Page objects do not inherit navigation from a base type. Each one holds a
//! cheap clone of [`Page`], which owns the driver, the base URL relative
//! paths resolve against, and the timeouts locators inherit.

use crate::config::Timeouts;
use crate::dom::Selector;
use crate::driver::PageDriver;
use crate::locator::Locator;
use crate::result::{PomError, PomResult};
use reqwest::Url;
use std::sync::Arc;

/// Resolve a navigation target against a base URL.
///
/// Fully-qualified targets are returned unchanged; anything else is joined
/// with URL resolution rules (`/login` replaces the base path).
///
/// # Errors
///
/// Returns a config error if the base URL or the joined result is invalid.
pub fn resolve_url(base: &str, target: &str) -> PomResult<String> {
    if let Ok(absolute) = Url::parse(target) {
        return Ok(absolute.to_string());
    }
    let base = Url::parse(base).map_err(|e| PomError::config(format!("base URL '{base}': {e}")))?;
    base.join(target)
        .map(|u| u.to_string())
        .map_err(|e| PomError::config(format!("cannot resolve '{target}': {e}")))
}

/// Handle to one browser page, shared by every page object of a test.
#[derive(Clone)]
pub struct Page {
    driver: Arc<dyn PageDriver>,
    base_url: String,
    timeouts: Timeouts,
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("base_url", &self.base_url)
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}

impl Page {
    /// Wrap a driver.
    pub fn new(driver: Arc<dyn PageDriver>, base_url: impl Into<String>) -> Self {
        Self {
            driver,
            base_url: base_url.into(),
            timeouts: Timeouts::default(),
        }
    }

    /// Set timeouts for navigation and every locator created afterwards
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Underlying driver
    #[must_use]
    pub fn driver(&self) -> &Arc<dyn PageDriver> {
        &self.driver
    }

    /// Base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Timeouts
    #[must_use]
    pub const fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    /// Navigate to `target`, relative to the base URL or fully-qualified.
    ///
    /// # Errors
    ///
    /// Returns a timeout if the load does not finish within the navigation
    /// timeout, or the driver's navigation error.
    pub async fn goto(&self, target: &str) -> PomResult<()> {
        let url = resolve_url(&self.base_url, target)?;
        tracing::info!(url = %url, "navigate");
        let limit = self.timeouts.navigation;
        match tokio::time::timeout(limit, self.driver.navigate(&url)).await {
            Ok(result) => result,
            Err(_) => Err(PomError::Timeout {
                action: format!("navigation to {url}"),
                ms: limit.as_millis() as u64,
            }),
        }
    }

    /// Current URL
    ///
    /// # Errors
    ///
    /// Returns the driver's error.
    pub async fn url(&self) -> PomResult<String> {
        self.driver.current_url().await
    }

    /// Current title
    ///
    /// # Errors
    ///
    /// Returns the driver's error.
    pub async fn title(&self) -> PomResult<String> {
        self.driver.title().await
    }

    /// PNG screenshot
    ///
    /// # Errors
    ///
    /// Returns the driver's error.
    pub async fn screenshot(&self) -> PomResult<Vec<u8>> {
        self.driver.screenshot().await
    }

    /// Close the page
    ///
    /// # Errors
    ///
    /// Returns the driver's error.
    pub async fn close(&self) -> PomResult<()> {
        self.driver.close().await
    }

    /// Locator for a CSS selector
    #[must_use]
    pub fn locator(&self, css: &str) -> Locator {
        Locator::new(self.clone(), Selector::css(css))
    }

    /// Locator for any selector
    #[must_use]
    pub fn select(&self, selector: Selector) -> Locator {
        Locator::new(self.clone(), selector)
    }

    /// Inputs by placeholder text
    #[must_use]
    pub fn get_by_placeholder(&self, text: &str) -> Locator {
        self.select(Selector::placeholder(text))
    }

    /// Elements by ARIA role and accessible name
    #[must_use]
    pub fn get_by_role(&self, role: &str, name: &str) -> Locator {
        self.select(Selector::role(role, name))
    }

    /// Innermost elements containing text
    #[must_use]
    pub fn get_by_text(&self, text: &str) -> Locator {
        self.select(Selector::text(text))
    }

    /// Elements by `data-testid`
    #[must_use]
    pub fn get_by_test_id(&self, id: &str) -> Locator {
        self.select(Selector::test_id(id))
    }
}
