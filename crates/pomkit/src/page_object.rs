//! Page Object Model support.
//!
//! A page object owns named [`Locator`](crate::Locator)s for one screen and
//! exposes intention-revealing actions and queries. It holds no state of its
//! own: everything is re-read from the live page.

use crate::page::Page;
use crate::result::PomResult;
use async_trait::async_trait;
use std::collections::HashMap;

/// Trait for page objects representing one screen.
///
/// # Example
///
/// ```ignore
/// struct CheckoutPage {
///     page: Page,
///     pay_button: Locator,
/// }
///
/// impl PageObject for CheckoutPage {
///     fn page(&self) -> &Page {
///         &self.page
///     }
///
///     fn path(&self) -> &str {
///         "/checkout"
///     }
/// }
/// ```
#[async_trait]
pub trait PageObject: Send + Sync {
    /// Shared page handle
    fn page(&self) -> &Page;

    /// Where this screen lives: a path relative to the base URL or a
    /// fully-qualified URL
    fn path(&self) -> &str;

    /// URL pattern identifying this screen (defaults to [`Self::path`])
    fn url_pattern(&self) -> &str {
        self.path()
    }

    /// Get the page name for logging/debugging
    fn page_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Drive the browser to this screen
    ///
    /// # Errors
    ///
    /// Returns navigation errors from the page handle.
    async fn navigate(&self) -> PomResult<()> {
        tracing::debug!(page = self.page_name(), "open page");
        self.page().goto(self.path()).await
    }

    /// Whether the browser is currently on this screen
    ///
    /// # Errors
    ///
    /// Returns driver errors.
    async fn is_current(&self) -> PomResult<bool> {
        let url = self.page().url().await?;
        Ok(UrlMatcher::new(self.url_pattern()).matches(&url))
    }
}

/// URL pattern matcher for page objects
#[derive(Debug, Clone)]
pub struct UrlMatcher {
    pattern: String,
    host: Option<String>,
    segments: Vec<UrlSegment>,
}

#[derive(Debug, Clone)]
enum UrlSegment {
    Literal(String),
    Wildcard,
    Parameter(String),
}

/// Split a URL or path into (`scheme://host`, path segments).
///
/// Query strings and fragments are ignored.
fn split_url(url: &str) -> (Option<String>, Vec<&str>) {
    let url = url.split(['?', '#']).next().unwrap_or_default();
    let (host, path) = match url.split_once("://") {
        Some((scheme, rest)) => {
            let (host, path) = rest.split_once('/').unwrap_or((rest, ""));
            (Some(format!("{scheme}://{host}")), path)
        }
        None => (None, url),
    };
    (host, path.split('/').filter(|s| !s.is_empty()).collect())
}

impl UrlMatcher {
    /// Create a new URL matcher from a pattern
    ///
    /// Patterns support:
    /// - Literal segments: `/login`
    /// - Wildcards: `/users/*`
    /// - Named parameters: `/users/:id`
    /// - Fully-qualified URLs, which also pin the host
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        let (host, raw) = split_url(pattern);
        let segments = raw
            .into_iter()
            .map(|s| {
                if s == "*" {
                    UrlSegment::Wildcard
                } else if let Some(name) = s.strip_prefix(':') {
                    UrlSegment::Parameter(name.to_string())
                } else {
                    UrlSegment::Literal(s.to_string())
                }
            })
            .collect();

        Self {
            pattern: pattern.to_string(),
            host,
            segments,
        }
    }

    /// Check if a URL matches the pattern
    ///
    /// Relative patterns ignore the URL's host.
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        let (host, url_segments) = split_url(url);

        if self.host.is_some() && self.host != host {
            return false;
        }

        // wildcards and parameters each consume exactly one segment
        if url_segments.len() != self.segments.len() {
            return false;
        }

        self.segments
            .iter()
            .zip(&url_segments)
            .all(|(segment, actual)| match segment {
                UrlSegment::Literal(lit) => lit == actual,
                UrlSegment::Wildcard | UrlSegment::Parameter(_) => true,
            })
    }

    /// Extract parameters from a URL
    #[must_use]
    pub fn extract_params(&self, url: &str) -> HashMap<String, String> {
        let (_, url_segments) = split_url(url);
        self.segments
            .iter()
            .zip(url_segments)
            .filter_map(|(segment, value)| match segment {
                UrlSegment::Parameter(name) => Some((name.clone(), value.to_string())),
                _ => None,
            })
            .collect()
    }

    /// Get the original pattern
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}
