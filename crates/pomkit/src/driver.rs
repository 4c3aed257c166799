//! PageDriver - the seam between page objects and a browser.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  PageDriver (async trait)                                    │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────┐        ┌─────────────────────┐      │
//! │  │  ChromiumDriver     │        │  MockDriver         │      │
//! │  │  (feature browser)  │        │  (unit tests)       │      │
//! │  │  CDP via            │        │  scripted outcomes  │      │
//! │  │  chromiumoxide      │        │  + call history     │      │
//! │  └─────────────────────┘        └─────────────────────┘      │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use crate::dom::{ElementCommand, Outcome};
use crate::result::{PomError, PomResult};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Browser primitives page objects are built on.
///
/// One driver instance backs exactly one browser page.
#[async_trait]
pub trait PageDriver: Send + Sync + std::fmt::Debug {
    /// Navigate to an absolute URL and wait for the load to finish
    async fn navigate(&self, url: &str) -> PomResult<()>;

    /// Current document URL
    async fn current_url(&self) -> PomResult<String>;

    /// Current document title
    async fn title(&self) -> PomResult<String>;

    /// Resolve the command's selector chain and run its operation
    async fn perform(&self, command: &ElementCommand) -> PomResult<Outcome>;

    /// PNG screenshot of the viewport
    async fn screenshot(&self) -> PomResult<Vec<u8>>;

    /// Close the page
    async fn close(&self) -> PomResult<()>;
}

#[derive(Debug, Default)]
struct MockState {
    url: String,
    title: String,
    responses: HashMap<(String, String), VecDeque<Outcome>>,
    navigations: HashMap<(String, String), String>,
    call_history: Vec<String>,
    commands: Vec<ElementCommand>,
    failures: HashMap<String, String>,
    closed: bool,
}

/// Mock driver for unit testing.
///
/// Outcomes are scripted per `(operation, target)` where `target` is the
/// locator description (`css=#username`). Several outcomes for one key are
/// served in order and the last one repeats. Unscripted commands resolve to
/// [`Outcome::NotFound`], except actions, which succeed.
#[derive(Debug, Default)]
pub struct MockDriver {
    state: Mutex<MockState>,
}

impl MockDriver {
    /// Create new mock driver
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Script the outcome of `op` on `target`.
    pub fn respond(&self, op: &str, target: &str, outcome: Outcome) -> &Self {
        self.state()
            .responses
            .entry((op.to_string(), target.to_string()))
            .or_default()
            .push_back(outcome);
        self
    }

    /// Make `op` on `target` move the page to `url` (e.g. a submit button).
    pub fn navigate_on(&self, op: &str, target: &str, url: &str) -> &Self {
        let _ = self
            .state()
            .navigations
            .insert((op.to_string(), target.to_string()), url.to_string());
        self
    }

    /// Make every call of `method` fail with a page error.
    pub fn fail_on(&self, method: &str, message: &str) -> &Self {
        let _ = self
            .state()
            .failures
            .insert(method.to_string(), message.to_string());
        self
    }

    /// Set the document title
    pub fn set_title(&self, title: &str) {
        self.state().title = title.to_string();
    }

    /// Set the current URL without recording a navigation
    pub fn set_url(&self, url: &str) {
        self.state().url = url.to_string();
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.state().call_history.clone()
    }

    /// Every element command received, in order
    #[must_use]
    pub fn commands(&self) -> Vec<ElementCommand> {
        self.state().commands.clone()
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.state()
            .call_history
            .iter()
            .any(|c| c.starts_with(method))
    }

    /// Whether `close` has been called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    fn record(&self, entry: String) -> PomResult<()> {
        let mut state = self.state();
        let method = entry.split(':').next().unwrap_or_default().to_string();
        state.call_history.push(entry);
        match state.failures.get(&method) {
            Some(message) => Err(PomError::PageError {
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PageDriver for MockDriver {
    async fn navigate(&self, url: &str) -> PomResult<()> {
        self.record(format!("navigate:{url}"))?;
        self.state().url = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> PomResult<String> {
        Ok(self.state().url.clone())
    }

    async fn title(&self) -> PomResult<String> {
        Ok(self.state().title.clone())
    }

    async fn perform(&self, command: &ElementCommand) -> PomResult<Outcome> {
        let op = command.op.name();
        let target = command.target();
        self.record(format!("{op}:{target}"))?;

        let mut state = self.state();
        state.commands.push(command.clone());
        let key = (op.to_string(), target);

        let outcome = match state.responses.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        let outcome = outcome.unwrap_or_else(|| {
            if command.op.is_action() {
                Outcome::done()
            } else {
                Outcome::NotFound
            }
        });

        if matches!(outcome, Outcome::Ok { .. }) {
            if let Some(url) = state.navigations.get(&key).cloned() {
                state.url = url;
            }
        }
        Ok(outcome)
    }

    async fn screenshot(&self) -> PomResult<Vec<u8>> {
        self.record("screenshot".to_string())?;
        // PNG signature only
        Ok(vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A])
    }

    async fn close(&self) -> PomResult<()> {
        self.record("close".to_string())?;
        self.state().closed = true;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::dom::{DomOp, Selector, Step};

    fn command(css: &str, op: DomOp) -> ElementCommand {
        ElementCommand {
            chain: vec![Step {
                selector: Selector::css(css),
                nth: None,
            }],
            op,
            strict: true,
        }
    }

    mod mock_driver_tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_driver_navigate() {
            let driver = MockDriver::new();
            driver.navigate("https://example.com/login").await.unwrap();
            assert_eq!(
                driver.current_url().await.unwrap(),
                "https://example.com/login"
            );
            assert!(driver.was_called("navigate"));
        }

        #[tokio::test]
        async fn test_unscripted_defaults() {
            let driver = MockDriver::new();
            let click = driver.perform(&command("#go", DomOp::Click)).await.unwrap();
            assert_eq!(click, Outcome::done());
            let visible = driver
                .perform(&command("#go", DomOp::IsVisible))
                .await
                .unwrap();
            assert_eq!(visible, Outcome::NotFound);
        }

        #[tokio::test]
        async fn test_scripted_sequence_last_repeats() {
            let driver = MockDriver::new();
            driver
                .respond("count", "css=li", Outcome::value(0))
                .respond("count", "css=li", Outcome::value(2));
            let cmd = command("li", DomOp::Count);
            assert_eq!(driver.perform(&cmd).await.unwrap(), Outcome::value(0));
            assert_eq!(driver.perform(&cmd).await.unwrap(), Outcome::value(2));
            assert_eq!(driver.perform(&cmd).await.unwrap(), Outcome::value(2));
        }

        #[tokio::test]
        async fn test_navigate_on_click() {
            let driver = MockDriver::new();
            driver.navigate_on("click", "css=button", "https://example.com/secure");
            driver
                .perform(&command("button", DomOp::Click))
                .await
                .unwrap();
            assert_eq!(
                driver.current_url().await.unwrap(),
                "https://example.com/secure"
            );
        }

        #[tokio::test]
        async fn test_history_and_commands() {
            let driver = MockDriver::new();
            driver
                .perform(&command(
                    "#username",
                    DomOp::Fill {
                        value: "tomsmith".to_string(),
                    },
                ))
                .await
                .unwrap();
            driver.close().await.unwrap();

            assert_eq!(driver.history(), vec!["fill:css=#username", "close"]);
            assert_eq!(driver.commands().len(), 1);
            assert!(driver.is_closed());
        }

        #[tokio::test]
        async fn test_fail_on() {
            let driver = MockDriver::new();
            driver.fail_on("navigate", "net::ERR_CONNECTION_REFUSED");
            let err = driver.navigate("https://example.com").await.unwrap_err();
            assert!(err.to_string().contains("ERR_CONNECTION_REFUSED"));
        }
    }
}
