//! Fixture Management
//!
//! Async setup and teardown of the resources a test depends on.
//!
//! Fixtures are set up highest priority first and torn down in reverse. If a
//! setup fails, every fixture already set up is torn down before the error
//! is returned, so a failed acquisition never leaks what came before it.
//!
//! ```ignore
//! let mut manager = FixtureManager::new();
//! manager.register(ApiFixture::new(&config)?);
//! manager.register(PostFixture::new(PostManager::new(client)));
//! manager.setup_all().await?;
//! let post = manager.get::<PostFixture>().and_then(PostFixture::post);
//! manager.teardown_all().await?;
//! ```

use crate::api::{ApiClient, PostManager};
use crate::config::SuiteConfig;
use crate::driver::PageDriver;
use crate::models::{CreatePost, Post};
use crate::page::Page;
use crate::result::{PomError, PomResult};
use async_trait::async_trait;
use futures::FutureExt;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

#[cfg(feature = "browser")]
use crate::browser::{Browser, BrowserConfig};

/// Title of the per-test post
pub const TEST_POST_TITLE: &str = "Test Post";
/// Body of the per-test post
pub const TEST_POST_BODY: &str = "This post is created for each test and cleaned up after";

/// Input used for the per-test post.
#[must_use]
pub fn test_post_input() -> CreatePost {
    CreatePost::new(1, TEST_POST_TITLE, TEST_POST_BODY)
}

/// Downcasting support for boxed fixtures.
pub trait AsAny {
    /// `self` as [`Any`]
    fn as_any(&self) -> &dyn Any;
    /// `self` as mutable [`Any`]
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A resource with setup and teardown.
#[async_trait]
pub trait Fixture: AsAny + Send + Sync {
    /// Acquire the resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource cannot be acquired.
    async fn setup(&mut self) -> PomResult<()>;

    /// Release the resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the release fails.
    async fn teardown(&mut self) -> PomResult<()>;

    /// Name for logs and errors
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Higher is set up first and torn down last
    fn priority(&self) -> i32 {
        0
    }
}

/// Lifecycle state of a registered fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureState {
    /// Registered, not set up
    Registered,
    /// Set up successfully
    SetUp,
    /// Torn down
    TornDown,
    /// Setup or teardown failed
    Failed,
}

struct FixtureEntry {
    fixture: Box<dyn Fixture>,
    state: FixtureState,
    priority: i32,
}

/// Registry of fixtures with ordered setup and teardown.
#[derive(Default)]
pub struct FixtureManager {
    fixtures: HashMap<TypeId, FixtureEntry>,
    setup_order: Vec<TypeId>,
}

impl std::fmt::Debug for FixtureManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixtureManager")
            .field("fixture_count", &self.fixtures.len())
            .field("set_up", &self.setup_order.len())
            .finish()
    }
}

impl FixtureManager {
    /// Create an empty manager
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fixture, replacing one of the same type.
    pub fn register<F: Fixture + 'static>(&mut self, fixture: F) {
        let priority = fixture.priority();
        let _ = self.fixtures.insert(
            TypeId::of::<F>(),
            FixtureEntry {
                fixture: Box::new(fixture),
                state: FixtureState::Registered,
                priority,
            },
        );
    }

    /// Whether a fixture of type `F` is registered
    #[must_use]
    pub fn is_registered<F: Fixture + 'static>(&self) -> bool {
        self.fixtures.contains_key(&TypeId::of::<F>())
    }

    /// Number of registered fixtures
    #[must_use]
    pub fn count(&self) -> usize {
        self.fixtures.len()
    }

    /// State of fixture `F`
    #[must_use]
    pub fn state<F: Fixture + 'static>(&self) -> Option<FixtureState> {
        self.fixtures.get(&TypeId::of::<F>()).map(|e| e.state)
    }

    /// Typed access to a registered fixture
    #[must_use]
    pub fn get<F: Fixture + 'static>(&self) -> Option<&F> {
        self.fixtures
            .get(&TypeId::of::<F>())
            .and_then(|entry| (*entry.fixture).as_any().downcast_ref::<F>())
    }

    /// Typed mutable access to a registered fixture
    #[must_use]
    pub fn get_mut<F: Fixture + 'static>(&mut self) -> Option<&mut F> {
        self.fixtures
            .get_mut(&TypeId::of::<F>())
            .and_then(|entry| (*entry.fixture).as_any_mut().downcast_mut::<F>())
    }

    /// Set up every registered fixture, highest priority first.
    ///
    /// # Errors
    ///
    /// Returns the first setup failure, after tearing down every fixture
    /// that was already set up.
    pub async fn setup_all(&mut self) -> PomResult<()> {
        let mut ordered: Vec<(TypeId, i32)> = self
            .fixtures
            .iter()
            .map(|(id, e)| (*id, e.priority))
            .collect();
        ordered.sort_by(|a, b| b.1.cmp(&a.1));

        let mut failure: Option<PomError> = None;
        for (type_id, _) in ordered {
            let Some(entry) = self.fixtures.get_mut(&type_id) else {
                continue;
            };
            if entry.state == FixtureState::SetUp {
                continue;
            }
            let name = entry.fixture.name().to_string();
            tracing::debug!(fixture = %name, "setup");
            if let Err(e) = entry.fixture.setup().await {
                entry.state = FixtureState::Failed;
                tracing::warn!(fixture = %name, error = %e, "fixture setup failed");
                failure = Some(PomError::fixture(name, e));
                break;
            }
            entry.state = FixtureState::SetUp;
            self.setup_order.push(type_id);
        }

        if let Some(err) = failure {
            if let Err(rollback) = self.teardown_all().await {
                tracing::warn!(error = %rollback, "rollback after failed setup");
            }
            return Err(err);
        }
        Ok(())
    }

    /// Tear down in reverse setup order.
    ///
    /// Every fixture is attempted even when an earlier teardown fails.
    ///
    /// # Errors
    ///
    /// Returns the first teardown failure.
    pub async fn teardown_all(&mut self) -> PomResult<()> {
        let mut first_error: Option<PomError> = None;

        while let Some(type_id) = self.setup_order.pop() {
            let Some(entry) = self.fixtures.get_mut(&type_id) else {
                continue;
            };
            if entry.state != FixtureState::SetUp {
                continue;
            }
            let name = entry.fixture.name().to_string();
            tracing::debug!(fixture = %name, "teardown");
            match entry.fixture.teardown().await {
                Ok(()) => entry.state = FixtureState::TornDown,
                Err(e) => {
                    entry.state = FixtureState::Failed;
                    tracing::warn!(fixture = %name, error = %e, "fixture teardown failed");
                    if first_error.is_none() {
                        first_error = Some(PomError::fixture(name, e));
                    }
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Names of registered fixtures
    #[must_use]
    pub fn list(&self) -> Vec<&str> {
        self.fixtures.values().map(|e| e.fixture.name()).collect()
    }
}

/// Browser page, either launched or built on an injected driver.
#[derive(Debug)]
pub struct BrowserFixture {
    config: SuiteConfig,
    injected: Option<Arc<dyn PageDriver>>,
    page: Option<Page>,
    #[cfg(feature = "browser")]
    browser: Option<Browser>,
}

impl BrowserFixture {
    /// Launch Chromium on setup
    #[must_use]
    pub fn new(config: SuiteConfig) -> Self {
        Self {
            config,
            injected: None,
            page: None,
            #[cfg(feature = "browser")]
            browser: None,
        }
    }

    /// Use `driver` instead of launching a browser
    #[must_use]
    pub fn with_driver(mut self, driver: Arc<dyn PageDriver>) -> Self {
        self.injected = Some(driver);
        self
    }

    /// The page, once set up
    #[must_use]
    pub const fn page(&self) -> Option<&Page> {
        self.page.as_ref()
    }

    #[cfg(feature = "browser")]
    async fn launch(&mut self) -> PomResult<Arc<dyn PageDriver>> {
        let browser = Browser::launch(BrowserConfig::from_suite(&self.config)).await?;
        match browser.new_page(self.config.timeouts).await {
            Ok(driver) => {
                self.browser = Some(browser);
                Ok(Arc::new(driver))
            }
            Err(e) => {
                let _ = browser.close().await;
                Err(e)
            }
        }
    }

    #[cfg(not(feature = "browser"))]
    #[allow(clippy::unused_async)]
    async fn launch(&mut self) -> PomResult<Arc<dyn PageDriver>> {
        Err(PomError::config(
            "built without the `browser` feature; inject a page driver",
        ))
    }
}

#[async_trait]
impl Fixture for BrowserFixture {
    async fn setup(&mut self) -> PomResult<()> {
        let driver = match self.injected.clone() {
            Some(driver) => driver,
            None => self.launch().await?,
        };
        self.page = Some(
            Page::new(driver, self.config.base_url.clone()).with_timeouts(self.config.timeouts),
        );
        Ok(())
    }

    async fn teardown(&mut self) -> PomResult<()> {
        let mut result = Ok(());
        if let Some(page) = self.page.take() {
            result = page.close().await;
        }
        #[cfg(feature = "browser")]
        if let Some(browser) = self.browser.take() {
            let closed = browser.close().await;
            if result.is_ok() {
                result = closed;
            }
        }
        result
    }

    fn name(&self) -> &str {
        "browser"
    }

    fn priority(&self) -> i32 {
        50
    }
}

/// HTTP client and post manager for the configured API.
#[derive(Debug, Clone)]
pub struct ApiFixture {
    client: ApiClient,
    posts: PostManager,
}

impl ApiFixture {
    /// Fixture for `config.api_base_url`. No single request outlives the
    /// whole-test timeout.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn new(config: &SuiteConfig) -> PomResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.test_timeout)
            .build()?;
        let client = ApiClient::with_client(config.api_base_url.clone(), http);
        Ok(Self {
            posts: PostManager::new(client.clone()),
            client,
        })
    }

    /// The client
    #[must_use]
    pub const fn client(&self) -> &ApiClient {
        &self.client
    }

    /// The post manager
    #[must_use]
    pub const fn posts(&self) -> &PostManager {
        &self.posts
    }
}

#[async_trait]
impl Fixture for ApiFixture {
    async fn setup(&mut self) -> PomResult<()> {
        tracing::debug!(base_url = self.client.base_url(), "api client ready");
        Ok(())
    }

    async fn teardown(&mut self) -> PomResult<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "api"
    }

    fn priority(&self) -> i32 {
        100
    }
}

/// A post created for one test and deleted afterwards.
#[derive(Debug, Clone)]
pub struct PostFixture {
    posts: PostManager,
    post: Option<Post>,
}

impl PostFixture {
    /// Fixture creating its post through `posts`
    #[must_use]
    pub const fn new(posts: PostManager) -> Self {
        Self { posts, post: None }
    }

    /// The post, once created
    #[must_use]
    pub const fn post(&self) -> Option<&Post> {
        self.post.as_ref()
    }
}

#[async_trait]
impl Fixture for PostFixture {
    async fn setup(&mut self) -> PomResult<()> {
        self.post = Some(self.posts.create(&test_post_input()).await?);
        Ok(())
    }

    async fn teardown(&mut self) -> PomResult<()> {
        match self.post.take() {
            Some(post) => self.posts.delete(post.id).await,
            None => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "test_post"
    }
}

/// Run `body` with a freshly created test post, deleting it afterwards.
///
/// The post is deleted whether `body` succeeds, fails, or panics; a panic
/// is resumed once the delete has been attempted. A failed delete after a
/// failed body is logged and the body's error wins.
///
/// # Errors
///
/// Creation failures, the body's error, or the delete failure.
pub async fn with_test_post<T, F, Fut>(posts: &PostManager, body: F) -> PomResult<T>
where
    F: FnOnce(Post) -> Fut,
    Fut: Future<Output = PomResult<T>>,
{
    let post = posts.create(&test_post_input()).await?;
    let id = post.id;

    let outcome = AssertUnwindSafe(body(post)).catch_unwind().await;
    let cleanup = posts.delete(id).await;

    match outcome {
        Ok(Ok(value)) => cleanup.map(|()| value),
        Ok(Err(e)) => {
            if let Err(c) = cleanup {
                tracing::warn!(id, error = %c, "test post cleanup failed");
            }
            Err(e)
        }
        Err(panic) => {
            if let Err(c) = cleanup {
                tracing::warn!(id, error = %c, "test post cleanup failed");
            }
            std::panic::resume_unwind(panic)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::driver::MockDriver;
    use crate::result::ErrorKind;
    use std::sync::Mutex;

    type Log = Arc<Mutex<Vec<String>>>;

    /// Records its lifecycle into a shared log. Each priority is its own type.
    struct Step<const P: i32> {
        log: Log,
        fail_setup: bool,
        fail_teardown: bool,
    }

    impl<const P: i32> Step<P> {
        fn new(log: &Log) -> Self {
            Self {
                log: Arc::clone(log),
                fail_setup: false,
                fail_teardown: false,
            }
        }

        fn failing_setup(mut self) -> Self {
            self.fail_setup = true;
            self
        }

        fn failing_teardown(mut self) -> Self {
            self.fail_teardown = true;
            self
        }

        fn record(&self, event: &str) {
            self.log.lock().unwrap().push(format!("{event}:{P}"));
        }
    }

    #[async_trait]
    impl<const P: i32> Fixture for Step<P> {
        async fn setup(&mut self) -> PomResult<()> {
            self.record("setup");
            if self.fail_setup {
                return Err(PomError::config("refused"));
            }
            Ok(())
        }

        async fn teardown(&mut self) -> PomResult<()> {
            self.record("teardown");
            if self.fail_teardown {
                return Err(PomError::config("stuck"));
            }
            Ok(())
        }

        fn priority(&self) -> i32 {
            P
        }
    }

    fn events(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    mod manager_tests {
        use super::*;

        #[tokio::test]
        async fn test_priority_order_and_reverse_teardown() {
            let log = Log::default();
            let mut manager = FixtureManager::new();
            manager.register(Step::<1>::new(&log));
            manager.register(Step::<3>::new(&log));
            manager.register(Step::<2>::new(&log));

            manager.setup_all().await.unwrap();
            assert_eq!(manager.state::<Step<2>>(), Some(FixtureState::SetUp));
            manager.teardown_all().await.unwrap();

            assert_eq!(
                events(&log),
                vec![
                    "setup:3",
                    "setup:2",
                    "setup:1",
                    "teardown:1",
                    "teardown:2",
                    "teardown:3"
                ]
            );
            assert_eq!(manager.state::<Step<1>>(), Some(FixtureState::TornDown));
        }

        #[tokio::test]
        async fn test_failed_setup_rolls_back() {
            let log = Log::default();
            let mut manager = FixtureManager::new();
            manager.register(Step::<3>::new(&log));
            manager.register(Step::<2>::new(&log).failing_setup());
            manager.register(Step::<1>::new(&log));

            let err = manager.setup_all().await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Setup);
            assert_eq!(events(&log), vec!["setup:3", "setup:2", "teardown:3"]);
            assert_eq!(manager.state::<Step<2>>(), Some(FixtureState::Failed));
            assert_eq!(manager.state::<Step<1>>(), Some(FixtureState::Registered));
        }

        #[tokio::test]
        async fn test_teardown_continues_after_failure() {
            let log = Log::default();
            let mut manager = FixtureManager::new();
            manager.register(Step::<2>::new(&log));
            manager.register(Step::<1>::new(&log).failing_teardown());

            manager.setup_all().await.unwrap();
            let err = manager.teardown_all().await.unwrap_err();
            assert!(err.to_string().contains("stuck"));
            assert_eq!(
                events(&log),
                vec!["setup:2", "setup:1", "teardown:1", "teardown:2"]
            );
        }

        #[tokio::test]
        async fn test_teardown_is_idempotent() {
            let log = Log::default();
            let mut manager = FixtureManager::new();
            manager.register(Step::<1>::new(&log));
            manager.setup_all().await.unwrap();
            manager.teardown_all().await.unwrap();
            manager.teardown_all().await.unwrap();
            assert_eq!(events(&log), vec!["setup:1", "teardown:1"]);
        }

        #[test]
        fn test_typed_lookup() {
            let log = Log::default();
            let mut manager = FixtureManager::new();
            manager.register(Step::<7>::new(&log));
            assert!(manager.is_registered::<Step<7>>());
            assert!(!manager.is_registered::<Step<8>>());
            assert_eq!(manager.get::<Step<7>>().unwrap().priority(), 7);
            assert!(manager.get_mut::<Step<7>>().is_some());
            assert_eq!(manager.count(), 1);
            assert_eq!(manager.list().len(), 1);
        }
    }

    mod browser_fixture_tests {
        use super::*;

        #[tokio::test]
        async fn test_injected_driver_builds_page() {
            let driver = Arc::new(MockDriver::new());
            let config = SuiteConfig::default().with_base_url("http://app.test");
            let mut fixture = BrowserFixture::new(config).with_driver(driver.clone());

            fixture.setup().await.unwrap();
            let page = fixture.page().unwrap();
            assert_eq!(page.base_url(), "http://app.test");

            fixture.teardown().await.unwrap();
            assert!(fixture.page().is_none());
            assert!(driver.is_closed());
        }

        #[cfg(not(feature = "browser"))]
        #[tokio::test]
        async fn test_launch_without_feature_is_config_error() {
            let mut fixture = BrowserFixture::new(SuiteConfig::default());
            let err = fixture.setup().await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Config);
        }
    }

    #[test]
    fn test_post_input_content() {
        let input = test_post_input();
        assert_eq!(input.user_id, 1);
        assert_eq!(input.title, "Test Post");
        assert_eq!(input.body, TEST_POST_BODY);
    }
}
