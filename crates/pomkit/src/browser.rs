//! Browser control over the Chrome `DevTools` Protocol.
//!
//! With the `browser` feature this launches Chromium through chromiumoxide
//! and exposes each tab as a [`PageDriver`](crate::PageDriver). Without it only
//! [`BrowserConfig`] is available and page objects run against an injected
//! driver.

use crate::config::SuiteConfig;
use std::time::Duration;

/// Browser configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Fixed viewport; `None` starts the window maximized
    pub viewport: Option<(u32, u32)>,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
    /// Upper bound for the launch handshake
    pub launch_timeout: Duration,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport: Some((1280, 720)),
            chromium_path: None,
            sandbox: true,
            launch_timeout: Duration::from_secs(30),
        }
    }
}

impl BrowserConfig {
    /// Derive from suite configuration
    #[must_use]
    pub fn from_suite(config: &SuiteConfig) -> Self {
        Self {
            headless: config.headless,
            viewport: config.viewport,
            chromium_path: config.chromium_path.clone(),
            sandbox: config.sandbox,
            launch_timeout: config.timeouts.navigation,
        }
    }

    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport = Some((width, height));
        self
    }

    /// Start maximized instead of using a fixed viewport
    #[must_use]
    pub const fn maximized(mut self) -> Self {
        self.viewport = None;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

#[cfg(feature = "browser")]
pub use cdp::{Browser, ChromiumDriver};

#[cfg(feature = "browser")]
#[allow(clippy::significant_drop_tightening, clippy::missing_errors_doc)]
mod cdp {
    use super::BrowserConfig;
    use crate::config::Timeouts;
    use crate::dom::{BoundingBox, DomOp, ElementCommand, Outcome};
    use crate::driver::PageDriver;
    use crate::result::{PomError, PomResult};
    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::input::{
        DispatchKeyEventParams, DispatchKeyEventType,
    };
    use chromiumoxide::cdp::browser_protocol::page::{
        CaptureScreenshotFormat, CaptureScreenshotParams,
    };
    use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
    use chromiumoxide::handler::viewport::Viewport;
    use chromiumoxide::layout::Point;
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use serde::de::DeserializeOwned;
    use std::future::Future;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;
    use tokio::time::Instant;

    /// Time a click gets to start a navigation before the page counts as settled
    const SETTLE_GRACE: Duration = Duration::from_millis(250);

    const MARK_DOCUMENT: &str = "window.__pomkitMarker = true";
    const DOCUMENT_STATE: &str =
        "window.__pomkitMarker === true ? 'same' : document.readyState";

    /// Browser instance with real CDP connection
    #[derive(Debug)]
    pub struct Browser {
        config: BrowserConfig,
        inner: Arc<Mutex<CdpBrowser>>,
        handle: tokio::task::JoinHandle<()>,
    }

    impl Browser {
        /// Launch a new browser instance
        ///
        /// # Errors
        ///
        /// Returns error if browser cannot be launched
        pub async fn launch(config: BrowserConfig) -> PomResult<Self> {
            let mut builder = CdpConfig::builder();

            if !config.headless {
                builder = builder.with_head();
            }

            if !config.sandbox {
                builder = builder.no_sandbox();
            }

            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }

            builder = match config.viewport {
                Some((width, height)) => builder.window_size(width, height).viewport(Viewport {
                    width,
                    height,
                    ..Viewport::default()
                }),
                None => builder.arg("--start-maximized").viewport(None),
            };

            let cdp_config = builder
                .build()
                .map_err(|message| PomError::BrowserLaunchError { message })?;

            let launched = tokio::time::timeout(config.launch_timeout, CdpBrowser::launch(cdp_config))
                .await
                .map_err(|_| PomError::Timeout {
                    action: "browser launch".to_string(),
                    ms: config.launch_timeout.as_millis() as u64,
                })?;
            let (browser, mut handler) = launched.map_err(|e| {
                let message = e.to_string();
                if message.contains("Could not auto detect") {
                    PomError::BrowserNotFound
                } else {
                    PomError::BrowserLaunchError { message }
                }
            })?;

            let handle = tokio::spawn(async move {
                while let Some(h) = handler.next().await {
                    if h.is_err() {
                        break;
                    }
                }
            });

            tracing::info!(headless = config.headless, viewport = ?config.viewport, "browser launched");
            Ok(Self {
                config,
                inner: Arc::new(Mutex::new(browser)),
                handle,
            })
        }

        /// Open a blank tab
        ///
        /// # Errors
        ///
        /// Returns error if page cannot be created
        pub async fn new_page(&self, timeouts: Timeouts) -> PomResult<ChromiumDriver> {
            let browser = self.inner.lock().await;
            let page = browser
                .new_page("about:blank")
                .await
                .map_err(|e| PomError::PageError {
                    message: e.to_string(),
                })?;
            Ok(ChromiumDriver { page, timeouts })
        }

        /// Get the browser configuration
        #[must_use]
        pub const fn config(&self) -> &BrowserConfig {
            &self.config
        }

        /// Close the browser and stop the event loop
        pub async fn close(&self) -> PomResult<()> {
            let mut browser = self.inner.lock().await;
            let closed = browser.close().await;
            let _ = browser.wait().await;
            self.handle.abort();
            closed.map_err(|e| PomError::BrowserLaunchError {
                message: e.to_string(),
            })?;
            tracing::info!("browser closed");
            Ok(())
        }
    }

    /// One Chromium tab.
    ///
    /// Clicks and hovers are real mouse input at the element's center; key
    /// presses are CDP key events. Everything else runs the in-page command
    /// interpreter.
    #[derive(Debug, Clone)]
    pub struct ChromiumDriver {
        page: CdpPage,
        timeouts: Timeouts,
    }

    impl ChromiumDriver {
        async fn bounded<T, E, F>(&self, what: &str, limit: Duration, fut: F) -> PomResult<T>
        where
            E: std::fmt::Display,
            F: Future<Output = Result<T, E>>,
        {
            match tokio::time::timeout(limit, fut).await {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(e)) => Err(PomError::PageError {
                    message: format!("{what}: {e}"),
                }),
                Err(_) => Err(PomError::Timeout {
                    action: what.to_string(),
                    ms: limit.as_millis() as u64,
                }),
            }
        }

        async fn eval<T: DeserializeOwned>(&self, script: &str) -> PomResult<T> {
            let params = EvaluateParams::builder()
                .expression(script)
                .return_by_value(true)
                .await_promise(true)
                .build()
                .map_err(|message| PomError::ScriptError { message })?;
            let result = self
                .bounded(
                    "evaluate",
                    self.timeouts.action,
                    self.page.evaluate_expression(params),
                )
                .await?;
            result.into_value().map_err(|e| PomError::ScriptError {
                message: e.to_string(),
            })
        }

        async fn run(&self, command: &ElementCommand) -> PomResult<Outcome> {
            self.eval(&command.to_script()?).await
        }

        /// Resolve the element as a [`DomOp::BoundingBox`] command would.
        async fn locate(&self, command: &ElementCommand) -> PomResult<Result<BoundingBox, Outcome>> {
            let probe = ElementCommand {
                op: DomOp::BoundingBox,
                ..command.clone()
            };
            match self.run(&probe).await? {
                Outcome::Ok { value } => Ok(Ok(BoundingBox::from_value(value)?)),
                other => Ok(Err(other)),
            }
        }

        /// Wait for a navigation triggered by the last input, if any.
        async fn settle(&self) -> PomResult<()> {
            let started = Instant::now();
            let deadline = started + self.timeouts.navigation;
            loop {
                // evaluation fails while the old document is being torn down
                let state = self.eval::<String>(DOCUMENT_STATE).await.ok();
                match state.as_deref() {
                    Some("same") if started.elapsed() >= SETTLE_GRACE => return Ok(()),
                    Some("complete") => return Ok(()),
                    _ => {}
                }
                if Instant::now() >= deadline {
                    return Err(PomError::Timeout {
                        action: "page load after input".to_string(),
                        ms: self.timeouts.navigation.as_millis() as u64,
                    });
                }
                tokio::time::sleep(self.timeouts.poll_interval).await;
            }
        }

        async fn mouse(&self, command: &ElementCommand, click: bool) -> PomResult<Outcome> {
            let bbox = match self.locate(command).await? {
                Ok(bbox) => bbox,
                Err(pending) => return Ok(pending),
            };
            let (x, y) = bbox.center();
            let point = Point::new(x, y);
            if click {
                self.eval::<bool>(MARK_DOCUMENT).await?;
                self.bounded("click", self.timeouts.action, self.page.click(point))
                    .await?;
                self.settle().await?;
            } else {
                self.bounded("hover", self.timeouts.action, self.page.move_mouse(point))
                    .await?;
            }
            Ok(Outcome::done())
        }

        async fn press(&self, command: &ElementCommand, key: &str) -> PomResult<Outcome> {
            let focus = ElementCommand {
                op: DomOp::Focus,
                ..command.clone()
            };
            let outcome = self.run(&focus).await?;
            if !matches!(outcome, Outcome::Ok { .. }) {
                return Ok(outcome);
            }

            let (name, code, vk, text) = key_definition(key);
            self.eval::<bool>(MARK_DOCUMENT).await?;
            for kind in [DispatchKeyEventType::KeyDown, DispatchKeyEventType::KeyUp] {
                let mut builder = DispatchKeyEventParams::builder()
                    .r#type(kind.clone())
                    .key(name.clone())
                    .code(code.clone())
                    .windows_virtual_key_code(vk)
                    .native_virtual_key_code(vk);
                if kind == DispatchKeyEventType::KeyDown {
                    if let Some(ref text) = text {
                        builder = builder.text(text.clone());
                    }
                }
                let params = builder
                    .build()
                    .map_err(|message| PomError::PageError { message })?;
                self.bounded("key event", self.timeouts.action, self.page.execute(params))
                    .await?;
            }
            self.settle().await?;
            Ok(Outcome::done())
        }
    }

    /// `(key, code, virtual key code, text)` for a key name.
    fn key_definition(key: &str) -> (String, String, i64, Option<String>) {
        let named = |code: &str, vk: i64, text: Option<&str>| {
            (key.to_string(), code.to_string(), vk, text.map(str::to_string))
        };
        match key {
            "Enter" => named("Enter", 13, Some("\r")),
            "Tab" => named("Tab", 9, None),
            "Escape" => named("Escape", 27, None),
            "Backspace" => named("Backspace", 8, None),
            "Delete" => named("Delete", 46, None),
            "ArrowUp" => named("ArrowUp", 38, None),
            "ArrowDown" => named("ArrowDown", 40, None),
            _ => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii_alphanumeric() => {
                        let upper = c.to_ascii_uppercase();
                        let code = if c.is_ascii_digit() {
                            format!("Digit{c}")
                        } else {
                            format!("Key{upper}")
                        };
                        (key.to_string(), code, i64::from(upper as u8), Some(key.to_string()))
                    }
                    _ => (key.to_string(), key.to_string(), 0, Some(key.to_string())),
                }
            }
        }
    }

    #[async_trait]
    impl PageDriver for ChromiumDriver {
        async fn navigate(&self, url: &str) -> PomResult<()> {
            match tokio::time::timeout(self.timeouts.navigation, self.page.goto(url)).await {
                Ok(Ok(_)) => Ok(()),
                Ok(Err(e)) => Err(PomError::NavigationError {
                    url: url.to_string(),
                    message: e.to_string(),
                }),
                Err(_) => Err(PomError::Timeout {
                    action: format!("navigation to {url}"),
                    ms: self.timeouts.navigation.as_millis() as u64,
                }),
            }
        }

        async fn current_url(&self) -> PomResult<String> {
            let url = self
                .bounded("url", self.timeouts.action, self.page.url())
                .await?;
            Ok(url.unwrap_or_default())
        }

        async fn title(&self) -> PomResult<String> {
            let title = self
                .bounded("title", self.timeouts.action, self.page.get_title())
                .await?;
            Ok(title.unwrap_or_default())
        }

        async fn perform(&self, command: &ElementCommand) -> PomResult<Outcome> {
            match &command.op {
                DomOp::Click => self.mouse(command, true).await,
                DomOp::Hover => self.mouse(command, false).await,
                DomOp::Press { key } => self.press(command, key).await,
                _ => self.run(command).await,
            }
        }

        async fn screenshot(&self) -> PomResult<Vec<u8>> {
            let params = CaptureScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .build();

            let screenshot =
                tokio::time::timeout(self.timeouts.action, self.page.execute(params))
                    .await
                    .map_err(|_| PomError::ScreenshotError {
                        message: "timed out".to_string(),
                    })?
                    .map_err(|e| PomError::ScreenshotError {
                        message: e.to_string(),
                    })?;

            use base64::Engine;
            base64::engine::general_purpose::STANDARD
                .decode(&screenshot.data)
                .map_err(|e| PomError::ScreenshotError {
                    message: e.to_string(),
                })
        }

        async fn close(&self) -> PomResult<()> {
            self.page
                .clone()
                .close()
                .await
                .map_err(|e| PomError::PageError {
                    message: e.to_string(),
                })
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_enter_key_definition() {
            let (key, code, vk, text) = key_definition("Enter");
            assert_eq!(key, "Enter");
            assert_eq!(code, "Enter");
            assert_eq!(vk, 13);
            assert_eq!(text.as_deref(), Some("\r"));
        }

        #[test]
        fn test_letter_key_definition() {
            let (key, code, vk, text) = key_definition("a");
            assert_eq!(key, "a");
            assert_eq!(code, "KeyA");
            assert_eq!(vk, 65);
            assert_eq!(text.as_deref(), Some("a"));
        }
    }
}
