//! Pomkit: Page-Object E2E and REST API Test Scaffold
//!
//! Browser tests drive page objects over the Chrome DevTools Protocol; API
//! tests go through typed resource managers whose every response is checked
//! against a declared shape before it becomes a value.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        POMKIT Architecture                          │
//! ├───────────────────────────────────────────────────────────────────┤
//! │  specs ──► Runner ──► TestContext ──► FixtureManager               │
//! │                            │                                       │
//! │              ┌─────────────┴──────────────┐                        │
//! │              ▼                            ▼                        │
//! │   Page objects (Login,          ResourceManager<Post>              │
//! │   Home, Todo)                          │                           │
//! │              │                         ▼                           │
//! │              ▼                    ApiClient ──► reqwest            │
//! │   Locator ──► ElementCommand           │                           │
//! │              │                         ▼                           │
//! │              ▼                    Schema check ──► serde           │
//! │   PageDriver (Chromium | Mock)                                     │
//! └───────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

mod context;
#[allow(clippy::missing_errors_doc, clippy::doc_markdown)]
mod driver;
mod expect;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod locator;
mod page;
mod page_object;
mod result;

/// REST client and typed resource managers
pub mod api;

/// Chromium launch options and the CDP-backed driver
#[allow(clippy::missing_errors_doc, clippy::doc_markdown)]
pub mod browser;

/// Suite configuration resolved from the environment
pub mod config;

/// Test data for the demo login site
pub mod data;

/// Selectors, element commands, and the in-page command interpreter
pub mod dom;

/// Fixture setup and teardown
pub mod fixture;

/// Random data, date formatting, sleeping, and retries
pub mod helpers;

/// Tracing subscriber setup
pub mod logging;

/// Resource types and their shapes
pub mod models;

/// Page objects for the demo sites
pub mod pages;

/// Parallel runner with retries and reports
pub mod runner;

/// Runtime shape validation for JSON payloads
pub mod schema;

/// Example suites
pub mod specs;

pub use api::{ApiClient, ApiResponse, PostManager, RequestOptions, ResourceManager};
#[cfg(feature = "browser")]
pub use browser::{Browser, ChromiumDriver};
pub use browser::BrowserConfig;
pub use config::{Credentials, SuiteConfig, Timeouts, TraceMode};
pub use context::{FixtureSet, TestContext};
pub use dom::{BoundingBox, Outcome, Selector, TextMatch};
pub use driver::{MockDriver, PageDriver};
pub use expect::{
    expect, expect_contains, expect_eq, expect_true, expect_url_matches, LocatorExpect,
};
pub use fixture::{
    with_test_post, ApiFixture, BrowserFixture, Fixture, FixtureManager, FixtureState, PostFixture,
};
pub use locator::{Locator, WaitState};
pub use models::{CreatePost, Post, Resource, UpdatePost};
pub use page::{resolve_url, Page};
pub use page_object::{PageObject, UrlMatcher};
pub use pages::{HomePage, LoginPage, TodoFilter, TodoPage};
pub use result::{ErrorKind, PomError, PomResult};
pub use runner::{Runner, SuiteReport, TestCase, TestOutcome, TestStatus};
pub use schema::{Field, FieldType, Schema, ShapeViolation};

/// Prelude for writing tests
pub mod prelude {
    pub use super::{
        expect, expect_contains, expect_eq, expect_true, expect_url_matches, FixtureSet, Locator,
        Page, PageObject, PomError, PomResult, SuiteConfig, TestCase, TestContext,
    };
    pub use futures::FutureExt;
}
