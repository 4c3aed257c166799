//! Login screen of the-internet.herokuapp.com (`/login`).

use crate::locator::Locator;
use crate::page::Page;
use crate::page_object::PageObject;
use crate::result::PomResult;

/// Login form.
///
/// `LoggedOut --login(valid)--> LoggedIn`, `LoggedOut --login(invalid)-->
/// LoggedOut` with the error banner shown. Nothing is cached; every query
/// reads the live DOM.
#[derive(Debug, Clone)]
pub struct LoginPage {
    page: Page,
    username_input: Locator,
    password_input: Locator,
    login_button: Locator,
    error_message: Locator,
    success_message: Locator,
}

impl LoginPage {
    /// Bind the login locators to `page`
    #[must_use]
    pub fn new(page: &Page) -> Self {
        Self {
            page: page.clone(),
            username_input: page.locator("#username"),
            password_input: page.locator("#password"),
            login_button: page.locator(r#"button[type="submit"]"#),
            error_message: page.locator("#flash"),
            success_message: page.locator("#flash.success"),
        }
    }

    /// Fill both fields and submit
    ///
    /// # Errors
    ///
    /// Fails if a field or the button never becomes actionable.
    pub async fn login(&self, username: &str, password: &str) -> PomResult<()> {
        tracing::info!(username, "login");
        self.username_input.fill(username).await?;
        self.password_input.fill(password).await?;
        self.login_button.click().await
    }

    /// Whether the flash banner is shown
    ///
    /// # Errors
    ///
    /// Driver errors only.
    pub async fn is_error_message_visible(&self) -> PomResult<bool> {
        self.error_message.is_visible().await
    }

    /// Flash banner text, empty if there is none
    ///
    /// # Errors
    ///
    /// Driver errors only.
    pub async fn get_error_message(&self) -> PomResult<String> {
        Ok(self.error_message.text_content().await?.unwrap_or_default())
    }

    /// Whether the submit button is enabled
    ///
    /// # Errors
    ///
    /// Driver errors only.
    pub async fn is_login_button_enabled(&self) -> PomResult<bool> {
        self.login_button.is_enabled().await
    }

    /// Whether the green banner (e.g. after logout) is shown
    ///
    /// # Errors
    ///
    /// Driver errors only.
    pub async fn is_success_message_visible(&self) -> PomResult<bool> {
        self.success_message.is_visible().await
    }

    /// Username field
    #[must_use]
    pub const fn username_input(&self) -> &Locator {
        &self.username_input
    }

    /// Password field
    #[must_use]
    pub const fn password_input(&self) -> &Locator {
        &self.password_input
    }

    /// Flash banner
    #[must_use]
    pub const fn error_message(&self) -> &Locator {
        &self.error_message
    }
}

impl PageObject for LoginPage {
    fn page(&self) -> &Page {
        &self.page
    }

    fn path(&self) -> &str {
        "/login"
    }

    fn page_name(&self) -> &str {
        "LoginPage"
    }
}
