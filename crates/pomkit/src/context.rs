//! Per-test context.
//!
//! A [`FixtureSet`] declares what a test needs. [`TestContext::setup`]
//! acquires it through a [`FixtureManager`], and the accessors hand out page
//! objects and API managers built on the acquired resources.

use crate::api::{ApiClient, PostManager};
use crate::config::SuiteConfig;
use crate::data::{TestUrls, TestUsers};
use crate::driver::PageDriver;
use crate::fixture::{ApiFixture, BrowserFixture, FixtureManager, PostFixture};
use crate::models::Post;
use crate::page::Page;
use crate::pages::{HomePage, LoginPage, TodoPage};
use crate::result::{PomError, PomResult};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Resources a test requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FixtureSet {
    /// A browser page
    pub browser: bool,
    /// An API client and post manager
    pub api: bool,
    /// A post created before the test and deleted after it
    pub test_post: bool,
}

impl FixtureSet {
    /// Nothing
    pub const NONE: Self = Self {
        browser: false,
        api: false,
        test_post: false,
    };

    /// Browser only
    #[must_use]
    pub const fn browser() -> Self {
        Self {
            browser: true,
            ..Self::NONE
        }
    }

    /// API only
    #[must_use]
    pub const fn api() -> Self {
        Self {
            api: true,
            ..Self::NONE
        }
    }

    /// Add a test post (implies the API)
    #[must_use]
    pub const fn with_test_post(mut self) -> Self {
        self.api = true;
        self.test_post = true;
        self
    }

    /// Fixture names, for listings
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.browser {
            names.push("browser");
        }
        if self.api {
            names.push("api");
        }
        if self.test_post {
            names.push("test_post");
        }
        names
    }
}

/// Resources acquired for one test.
#[derive(Debug)]
pub struct TestContext {
    config: SuiteConfig,
    fixtures: FixtureManager,
}

fn missing(fixture: &str) -> PomError {
    PomError::fixture(fixture, "not requested by this test")
}

impl TestContext {
    /// Acquire `set`. A browser is launched unless `driver` is given.
    ///
    /// # Errors
    ///
    /// Returns the first fixture setup failure; anything already acquired
    /// has been released by then.
    pub async fn setup(
        config: SuiteConfig,
        set: FixtureSet,
        driver: Option<Arc<dyn PageDriver>>,
    ) -> PomResult<Self> {
        let mut fixtures = FixtureManager::new();

        if set.browser {
            let mut browser = BrowserFixture::new(config.clone());
            if let Some(driver) = driver {
                browser = browser.with_driver(driver);
            }
            fixtures.register(browser);
        }
        if set.api || set.test_post {
            let api = ApiFixture::new(&config)?;
            if set.test_post {
                fixtures.register(PostFixture::new(api.posts().clone()));
            }
            fixtures.register(api);
        }

        fixtures.setup_all().await?;
        Ok(Self { config, fixtures })
    }

    /// Acquire `set`, run `body`, and release everything.
    ///
    /// Release happens on success, error, and panic; a panic is resumed
    /// afterwards. A release failure is reported only when `body` succeeded.
    ///
    /// # Errors
    ///
    /// Setup failures, the body's error, or a release failure.
    pub async fn run<T, F>(
        config: SuiteConfig,
        set: FixtureSet,
        driver: Option<Arc<dyn PageDriver>>,
        body: F,
    ) -> PomResult<T>
    where
        F: for<'a> FnOnce(&'a TestContext) -> BoxFuture<'a, PomResult<T>>,
    {
        let ctx = Self::setup(config, set, driver).await?;
        let outcome = AssertUnwindSafe(body(&ctx)).catch_unwind().await;
        let released = ctx.teardown().await;

        match outcome {
            Ok(Ok(value)) => released.map(|()| value),
            Ok(Err(e)) => {
                if let Err(r) = released {
                    tracing::warn!(error = %r, "release after failed test");
                }
                Err(e)
            }
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    /// Release every fixture in reverse order.
    ///
    /// # Errors
    ///
    /// Returns the first teardown failure.
    pub async fn teardown(mut self) -> PomResult<()> {
        self.fixtures.teardown_all().await
    }

    /// Suite configuration
    #[must_use]
    pub const fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Credential sets for this run
    #[must_use]
    pub fn users(&self) -> TestUsers {
        TestUsers::from_config(&self.config)
    }

    /// Login-flow URLs for this run
    ///
    /// # Errors
    ///
    /// Returns a config error for an invalid base URL.
    pub fn urls(&self) -> PomResult<TestUrls> {
        TestUrls::for_base(&self.config.base_url)
    }

    /// The browser page
    ///
    /// # Errors
    ///
    /// Fails if the test did not request a browser.
    pub fn page(&self) -> PomResult<&Page> {
        self.fixtures
            .get::<BrowserFixture>()
            .and_then(BrowserFixture::page)
            .ok_or_else(|| missing("browser"))
    }

    /// Whether a browser page is available
    #[must_use]
    pub fn has_page(&self) -> bool {
        self.page().is_ok()
    }

    /// Login page object
    ///
    /// # Errors
    ///
    /// Fails if the test did not request a browser.
    pub fn login_page(&self) -> PomResult<LoginPage> {
        Ok(LoginPage::new(self.page()?))
    }

    /// Secure-area page object
    ///
    /// # Errors
    ///
    /// Fails if the test did not request a browser.
    pub fn home_page(&self) -> PomResult<HomePage> {
        Ok(HomePage::new(self.page()?))
    }

    /// TodoMVC page object at the configured URL
    ///
    /// # Errors
    ///
    /// Fails if the test did not request a browser.
    pub fn todo_page(&self) -> PomResult<TodoPage> {
        Ok(TodoPage::new(self.page()?, self.config.todo_url.clone()))
    }

    /// HTTP client
    ///
    /// # Errors
    ///
    /// Fails if the test did not request the API.
    pub fn api_client(&self) -> PomResult<&ApiClient> {
        self.fixtures
            .get::<ApiFixture>()
            .map(ApiFixture::client)
            .ok_or_else(|| missing("api"))
    }

    /// Post manager
    ///
    /// # Errors
    ///
    /// Fails if the test did not request the API.
    pub fn post_manager(&self) -> PomResult<&PostManager> {
        self.fixtures
            .get::<ApiFixture>()
            .map(ApiFixture::posts)
            .ok_or_else(|| missing("api"))
    }

    /// The post created for this test
    ///
    /// # Errors
    ///
    /// Fails if the test did not request a test post.
    pub fn test_post(&self) -> PomResult<&Post> {
        self.fixtures
            .get::<PostFixture>()
            .and_then(PostFixture::post)
            .ok_or_else(|| missing("test_post"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::driver::MockDriver;
    use crate::result::ErrorKind;

    fn explode() -> PomResult<()> {
        panic!("body panicked")
    }

    fn mock() -> (Arc<MockDriver>, Option<Arc<dyn PageDriver>>) {
        let driver = Arc::new(MockDriver::new());
        let injected: Arc<dyn PageDriver> = driver.clone();
        (driver, Some(injected))
    }

    mod fixture_set_tests {
        use super::*;

        #[test]
        fn test_test_post_implies_api() {
            let set = FixtureSet::browser().with_test_post();
            assert!(set.browser && set.api && set.test_post);
            assert_eq!(set.names(), vec!["browser", "api", "test_post"]);
            assert!(FixtureSet::NONE.names().is_empty());
        }
    }

    mod context_tests {
        use super::*;

        #[tokio::test]
        async fn test_browser_context_exposes_pages() {
            let (driver, injected) = mock();
            let ctx = TestContext::setup(SuiteConfig::default(), FixtureSet::browser(), injected)
                .await
                .unwrap();

            assert!(ctx.has_page());
            ctx.login_page().unwrap();
            ctx.todo_page().unwrap();
            let err = ctx.post_manager().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Setup);

            ctx.teardown().await.unwrap();
            assert!(driver.is_closed());
        }

        #[tokio::test]
        async fn test_api_context_has_no_page() {
            let ctx = TestContext::setup(SuiteConfig::default(), FixtureSet::api(), None)
                .await
                .unwrap();
            assert!(!ctx.has_page());
            assert_eq!(
                ctx.api_client().unwrap().base_url(),
                "https://jsonplaceholder.typicode.com"
            );
            assert!(ctx.test_post().is_err());
            ctx.teardown().await.unwrap();
        }

        #[tokio::test]
        async fn test_run_releases_after_error() {
            let (driver, injected) = mock();
            let err = TestContext::run(
                SuiteConfig::default(),
                FixtureSet::browser(),
                injected,
                |_ctx| async { Err::<(), _>(PomError::assertion("boom", "a", "b")) }.boxed(),
            )
            .await
            .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Assertion);
            assert!(driver.is_closed());
        }

        #[tokio::test]
        async fn test_run_releases_after_panic() {
            let (driver, injected) = mock();
            let run = TestContext::run(
                SuiteConfig::default(),
                FixtureSet::browser(),
                injected,
                |_ctx| async { explode() }.boxed(),
            );
            let caught = AssertUnwindSafe(run).catch_unwind().await;
            assert!(caught.is_err());
            assert!(driver.is_closed());
        }

        #[tokio::test]
        async fn test_run_returns_body_value() {
            let (_driver, injected) = mock();
            let url = TestContext::run(
                SuiteConfig::default(),
                FixtureSet::browser(),
                injected,
                |ctx| async move { Ok::<_, PomError>(ctx.urls()?.login) }.boxed(),
            )
            .await
            .unwrap();
            assert_eq!(url, "https://the-internet.herokuapp.com/login");
        }
    }
}
