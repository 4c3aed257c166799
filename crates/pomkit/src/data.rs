//! Test data for the demo login site.

use crate::config::{Credentials, SuiteConfig};
use crate::page::resolve_url;
use crate::result::PomResult;

/// Message shown after a successful login
pub const LOGIN_SUCCESS: &str = "You logged into a secure area!";
/// Message shown for an unknown username
pub const LOGIN_FAILED: &str = "Your username is invalid!";
/// Message shown after logout
pub const LOGOUT_SUCCESS: &str = "You logged out of the secure area!";

/// Flash messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestMessages;

impl TestMessages {
    /// After login
    pub const LOGIN_SUCCESS: &'static str = LOGIN_SUCCESS;
    /// After a bad username
    pub const LOGIN_FAILED: &'static str = LOGIN_FAILED;
    /// After logout
    pub const LOGOUT_SUCCESS: &'static str = LOGOUT_SUCCESS;
}

/// Known credential pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestUsers {
    /// Accepted by the site (overridable through the environment)
    pub valid: Credentials,
    /// Rejected by the site
    pub invalid: Credentials,
    /// Both fields empty
    pub empty: Credentials,
}

impl TestUsers {
    /// Users for a suite run
    #[must_use]
    pub fn from_config(config: &SuiteConfig) -> Self {
        Self {
            valid: config.credentials.clone(),
            invalid: Credentials::new("invaliduser", "wrongpassword"),
            empty: Credentials::new("", ""),
        }
    }
}

impl Default for TestUsers {
    fn default() -> Self {
        Self::from_config(&SuiteConfig::default())
    }
}

/// Absolute URLs of the login flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestUrls {
    /// Site root
    pub base: String,
    /// Login form
    pub login: String,
    /// Secure area
    pub secure: String,
    /// Logout endpoint
    pub logout: String,
}

impl TestUrls {
    /// URLs under `base`
    ///
    /// # Errors
    ///
    /// Returns a config error if `base` is not a URL.
    pub fn for_base(base: &str) -> PomResult<Self> {
        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
            login: resolve_url(base, "/login")?,
            secure: resolve_url(base, "/secure")?,
            logout: resolve_url(base, "/logout")?,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_users() {
        let users = TestUsers::default();
        assert_eq!(users.valid.username, "tomsmith");
        assert_eq!(users.valid.password, "SuperSecretPassword!");
        assert_eq!(users.invalid.username, "invaliduser");
        assert!(users.empty.username.is_empty());
    }

    #[test]
    fn test_urls_for_default_base() {
        let urls = TestUrls::for_base("https://the-internet.herokuapp.com").unwrap();
        assert_eq!(urls.login, "https://the-internet.herokuapp.com/login");
        assert_eq!(urls.secure, "https://the-internet.herokuapp.com/secure");
        assert_eq!(urls.logout, "https://the-internet.herokuapp.com/logout");
    }

    #[test]
    fn test_failed_login_mentions_invalid() {
        assert!(TestMessages::LOGIN_FAILED.contains("invalid"));
    }
}
