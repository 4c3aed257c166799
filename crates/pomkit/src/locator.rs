//! Locator abstraction for element selection and interaction.
//!
//! # Design Philosophy
//!
//! - **Lazy**: building a locator touches nothing; every call re-resolves
//!   the selector chain against the live page
//! - **Auto-Waiting**: actions retry until the element is attached, visible
//!   and enabled, or the action timeout expires
//! - **Strict Selection**: actions and single-element queries fail if more
//!   than one element matches
//! - **Queries never wait**: `is_visible`, `text_content` and `count` report
//!   the current state, treating a missing element as absent

use crate::dom::{describe_chain, BoundingBox, DomOp, ElementCommand, Outcome, Selector, Step};
use crate::page::Page;
use crate::result::{PomError, PomResult};
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;

/// Element states [`Locator::wait_for`] can wait for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitState {
    /// At least one element matches
    Attached,
    /// Nothing matches
    Detached,
    /// First match is visible
    Visible,
    /// No visible match
    Hidden,
}

/// A deferred reference to elements on a page.
#[derive(Debug, Clone)]
pub struct Locator {
    page: Page,
    chain: Vec<Step>,
    timeout: Duration,
}

impl Locator {
    /// Create a locator rooted at the document.
    #[must_use]
    pub fn new(page: Page, selector: Selector) -> Self {
        let timeout = page.timeouts().action;
        Self {
            page,
            chain: vec![Step {
                selector,
                nth: None,
            }],
            timeout,
        }
    }

    /// Page this locator is bound to
    #[must_use]
    pub const fn page(&self) -> &Page {
        &self.page
    }

    /// Selector chain
    #[must_use]
    pub fn chain(&self) -> &[Step] {
        &self.chain
    }

    /// Auto-wait timeout
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Override the auto-wait timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Descendants matching a CSS selector
    #[must_use]
    pub fn locator(&self, css: &str) -> Self {
        self.child(Selector::css(css))
    }

    /// Descendants matching any selector
    #[must_use]
    pub fn child(&self, selector: Selector) -> Self {
        let mut next = self.clone();
        next.chain.push(Step {
            selector,
            nth: None,
        });
        next
    }

    /// The n-th match (zero-based)
    #[must_use]
    pub fn nth(&self, index: usize) -> Self {
        self.with_index(i64::try_from(index).unwrap_or(i64::MAX))
    }

    /// The first match
    #[must_use]
    pub fn first(&self) -> Self {
        self.with_index(0)
    }

    /// The last match
    #[must_use]
    pub fn last(&self) -> Self {
        self.with_index(-1)
    }

    fn with_index(&self, index: i64) -> Self {
        let mut next = self.clone();
        if let Some(step) = next.chain.last_mut() {
            step.nth = Some(index);
        }
        next
    }

    fn command(&self, op: DomOp) -> ElementCommand {
        ElementCommand {
            chain: self.chain.clone(),
            op,
            strict: true,
        }
    }

    async fn run_once(&self, op: DomOp) -> PomResult<Outcome> {
        self.page.driver().perform(&self.command(op)).await
    }

    /// Run an action, retrying while the element is missing, hidden or
    /// disabled.
    async fn act(&self, op: DomOp) -> PomResult<Value> {
        let deadline = Instant::now() + self.timeout;
        let poll = self.page.timeouts().poll_interval;
        let name = op.name();
        tracing::debug!(target_chain = %self, action = name, "element action");
        loop {
            match self.run_once(op.clone()).await? {
                Outcome::Ok { value } => return Ok(value),
                Outcome::Ambiguous { count } => {
                    return Err(PomError::StrictModeViolation {
                        selector: self.to_string(),
                        count,
                    })
                }
                pending => {
                    if Instant::now() >= deadline {
                        tracing::warn!(target_chain = %self, action = name, reason = pending.reason(), "gave up waiting");
                        return Err(PomError::ElementNotFound {
                            selector: self.to_string(),
                            reason: pending.reason().to_string(),
                            ms: self.timeout.as_millis() as u64,
                        });
                    }
                }
            }
            tokio::time::sleep(poll).await;
        }
    }

    /// Run a query once; `None` when nothing matches.
    async fn query(&self, op: DomOp) -> PomResult<Option<Value>> {
        match self.run_once(op).await? {
            Outcome::Ok { value } => Ok(Some(value)),
            Outcome::Ambiguous { count } => Err(PomError::StrictModeViolation {
                selector: self.to_string(),
                count,
            }),
            Outcome::NotFound | Outcome::NotVisible | Outcome::Disabled => Ok(None),
        }
    }

    /// Click the element
    ///
    /// # Errors
    ///
    /// Fails if no actionable element appears within the timeout.
    pub async fn click(&self) -> PomResult<()> {
        self.act(DomOp::Click).await.map(drop)
    }

    /// Replace the element's value
    ///
    /// # Errors
    ///
    /// Fails if no actionable element appears within the timeout.
    pub async fn fill(&self, value: &str) -> PomResult<()> {
        self.act(DomOp::Fill {
            value: value.to_string(),
        })
        .await
        .map(drop)
    }

    /// Press a key while the element has focus
    ///
    /// # Errors
    ///
    /// Fails if no actionable element appears within the timeout.
    pub async fn press(&self, key: &str) -> PomResult<()> {
        self.act(DomOp::Press {
            key: key.to_string(),
        })
        .await
        .map(drop)
    }

    /// Ensure a checkbox is checked
    ///
    /// # Errors
    ///
    /// Fails if no actionable element appears or the state did not change.
    pub async fn check(&self) -> PomResult<()> {
        self.set_checked(true).await
    }

    /// Ensure a checkbox is unchecked
    ///
    /// # Errors
    ///
    /// Fails if no actionable element appears or the state did not change.
    pub async fn uncheck(&self) -> PomResult<()> {
        self.set_checked(false).await
    }

    async fn set_checked(&self, checked: bool) -> PomResult<()> {
        let value = self.act(DomOp::SetChecked { checked }).await?;
        match value {
            Value::Bool(state) if state != checked => Err(PomError::PageError {
                message: format!("{self} did not become checked={checked}"),
            }),
            _ => Ok(()),
        }
    }

    /// Hover the pointer over the element
    ///
    /// # Errors
    ///
    /// Fails if no actionable element appears within the timeout.
    pub async fn hover(&self) -> PomResult<()> {
        self.act(DomOp::Hover).await.map(drop)
    }

    /// Scroll into view and return the bounding box
    ///
    /// # Errors
    ///
    /// Fails if no actionable element appears within the timeout.
    pub async fn bounding_box(&self) -> PomResult<BoundingBox> {
        BoundingBox::from_value(self.act(DomOp::BoundingBox).await?)
    }

    /// Whether the element exists and is visible. Never waits.
    ///
    /// # Errors
    ///
    /// Fails on strict-mode violations or driver errors.
    pub async fn is_visible(&self) -> PomResult<bool> {
        Ok(self
            .query(DomOp::IsVisible)
            .await?
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }

    /// Negation of [`Self::is_visible`]
    ///
    /// # Errors
    ///
    /// Fails on strict-mode violations or driver errors.
    pub async fn is_hidden(&self) -> PomResult<bool> {
        Ok(!self.is_visible().await?)
    }

    /// Whether the element exists and is enabled. Never waits.
    ///
    /// # Errors
    ///
    /// Fails on strict-mode violations or driver errors.
    pub async fn is_enabled(&self) -> PomResult<bool> {
        Ok(self
            .query(DomOp::IsEnabled)
            .await?
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }

    /// `textContent` of the element, `None` if absent. Never waits.
    ///
    /// # Errors
    ///
    /// Fails on strict-mode violations or driver errors.
    pub async fn text_content(&self) -> PomResult<Option<String>> {
        Ok(self
            .query(DomOp::TextContent)
            .await?
            .and_then(|v| v.as_str().map(str::to_string)))
    }

    /// `textContent` of every match
    ///
    /// # Errors
    ///
    /// Fails on driver errors.
    pub async fn all_text_contents(&self) -> PomResult<Vec<String>> {
        match self.query(DomOp::AllTextContents).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Vec::new()),
        }
    }

    /// Number of matches. Never waits.
    ///
    /// # Errors
    ///
    /// Fails on driver errors.
    pub async fn count(&self) -> PomResult<usize> {
        Ok(self
            .query(DomOp::Count)
            .await?
            .and_then(|v| v.as_u64())
            .map_or(0, |n| n as usize))
    }

    /// Attribute value, `None` if absent
    ///
    /// # Errors
    ///
    /// Fails on strict-mode violations or driver errors.
    pub async fn get_attribute(&self, name: &str) -> PomResult<Option<String>> {
        Ok(self
            .query(DomOp::Attribute {
                name: name.to_string(),
            })
            .await?
            .and_then(|v| v.as_str().map(str::to_string)))
    }

    /// Class attribute, `None` if the element is absent
    ///
    /// # Errors
    ///
    /// Fails on strict-mode violations or driver errors.
    pub async fn class_name(&self) -> PomResult<Option<String>> {
        Ok(self
            .query(DomOp::ClassName)
            .await?
            .and_then(|v| v.as_str().map(str::to_string)))
    }

    /// Wait until the element reaches `state`.
    ///
    /// # Errors
    ///
    /// Returns a timeout if the state is not reached in time.
    pub async fn wait_for(&self, state: WaitState) -> PomResult<()> {
        let deadline = Instant::now() + self.timeout;
        let poll = self.page.timeouts().poll_interval;
        loop {
            let reached = match state {
                WaitState::Attached => self.count().await? > 0,
                WaitState::Detached => self.count().await? == 0,
                WaitState::Visible => self.is_visible().await?,
                WaitState::Hidden => self.is_hidden().await?,
            };
            if reached {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(PomError::Timeout {
                    action: format!("waiting for {self} to be {state:?}"),
                    ms: self.timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(poll).await;
        }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&describe_chain(&self.chain))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::Timeouts;
    use crate::driver::MockDriver;
    use std::sync::Arc;

    fn page_with(driver: &Arc<MockDriver>) -> Page {
        Page::new(driver.clone(), "https://example.com").with_timeouts(
            Timeouts::default()
                .with_action(Duration::from_millis(100))
                .with_poll_interval(Duration::from_millis(5)),
        )
    }

    mod chain_tests {
        use super::*;

        #[test]
        fn test_chain_building_is_lazy() {
            let driver = Arc::new(MockDriver::new());
            let page = page_with(&driver);
            let toggle = page.locator(".todo-list li").nth(1).locator(".toggle");
            assert_eq!(toggle.to_string(), "css=.todo-list li >> nth=1 >> css=.toggle");
            assert!(driver.history().is_empty());
        }

        #[test]
        fn test_first_and_last() {
            let driver = Arc::new(MockDriver::new());
            let items = page_with(&driver).locator("li");
            assert_eq!(items.first().chain()[0].nth, Some(0));
            assert_eq!(items.last().chain()[0].nth, Some(-1));
            assert_eq!(items.chain()[0].nth, None);
        }

        #[test]
        fn test_inherits_action_timeout() {
            let driver = Arc::new(MockDriver::new());
            let loc = page_with(&driver).locator("#x");
            assert_eq!(loc.timeout(), Duration::from_millis(100));
            assert_eq!(
                loc.with_timeout(Duration::from_secs(1)).timeout(),
                Duration::from_secs(1)
            );
        }
    }

    mod action_tests {
        use super::*;

        #[tokio::test]
        async fn test_action_waits_until_visible() {
            let driver = Arc::new(MockDriver::new());
            driver
                .respond("click", "css=#go", Outcome::NotFound)
                .respond("click", "css=#go", Outcome::NotVisible)
                .respond("click", "css=#go", Outcome::done());
            page_with(&driver).locator("#go").click().await.unwrap();
            assert_eq!(driver.history().len(), 3);
        }

        #[tokio::test]
        async fn test_action_gives_up_after_timeout() {
            let driver = Arc::new(MockDriver::new());
            driver.respond("click", "css=#go", Outcome::NotVisible);
            let err = page_with(&driver).locator("#go").click().await.unwrap_err();
            match err {
                PomError::ElementNotFound { reason, ms, .. } => {
                    assert_eq!(reason, "visible");
                    assert_eq!(ms, 100);
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[tokio::test]
        async fn test_strict_violation_is_immediate() {
            let driver = Arc::new(MockDriver::new());
            driver.respond("click", "css=li", Outcome::Ambiguous { count: 3 });
            let err = page_with(&driver).locator("li").click().await.unwrap_err();
            assert!(matches!(err, PomError::StrictModeViolation { count: 3, .. }));
            assert_eq!(driver.history().len(), 1);
        }

        #[tokio::test]
        async fn test_fill_sends_value() {
            let driver = Arc::new(MockDriver::new());
            page_with(&driver)
                .locator("#username")
                .fill("tomsmith")
                .await
                .unwrap();
            assert_eq!(
                driver.commands()[0].op,
                DomOp::Fill {
                    value: "tomsmith".to_string()
                }
            );
        }

        #[tokio::test]
        async fn test_check_reports_unchanged_state() {
            let driver = Arc::new(MockDriver::new());
            driver.respond("setChecked", "css=.toggle", Outcome::value(false));
            let err = page_with(&driver).locator(".toggle").check().await;
            assert!(err.is_err());
        }
    }

    mod query_tests {
        use super::*;

        #[tokio::test]
        async fn test_missing_element_is_not_visible() {
            let driver = Arc::new(MockDriver::new());
            let loc = page_with(&driver).locator("#flash");
            assert!(!loc.is_visible().await.unwrap());
            assert!(loc.is_hidden().await.unwrap());
            assert_eq!(driver.history().len(), 2);
        }

        #[tokio::test]
        async fn test_text_content_absent_is_none() {
            let driver = Arc::new(MockDriver::new());
            let text = page_with(&driver)
                .locator("#flash")
                .text_content()
                .await
                .unwrap();
            assert_eq!(text, None);
        }

        #[tokio::test]
        async fn test_count_and_texts() {
            let driver = Arc::new(MockDriver::new());
            driver
                .respond("count", "css=li", Outcome::value(2))
                .respond(
                    "allTextContents",
                    "css=li",
                    Outcome::value(serde_json::json!(["a", "b"])),
                );
            let items = page_with(&driver).locator("li");
            assert_eq!(items.count().await.unwrap(), 2);
            assert_eq!(items.all_text_contents().await.unwrap(), vec!["a", "b"]);
        }

        #[tokio::test]
        async fn test_wait_for_visible() {
            let driver = Arc::new(MockDriver::new());
            driver
                .respond("isVisible", "css=.main", Outcome::value(false))
                .respond("isVisible", "css=.main", Outcome::value(true));
            page_with(&driver)
                .locator(".main")
                .wait_for(WaitState::Visible)
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn test_wait_for_times_out() {
            let driver = Arc::new(MockDriver::new());
            let err = page_with(&driver)
                .locator(".main")
                .wait_for(WaitState::Visible)
                .await
                .unwrap_err();
            assert!(matches!(err, PomError::Timeout { .. }));
        }
    }
}
