//! Secure area of the-internet.herokuapp.com (`/secure`).

use crate::locator::Locator;
use crate::page::Page;
use crate::page_object::PageObject;
use crate::result::PomResult;

/// Screen shown after a successful login.
#[derive(Debug, Clone)]
pub struct HomePage {
    page: Page,
    page_title: Locator,
    logout_button: Locator,
    success_message: Locator,
    secure_area_text: Locator,
}

impl HomePage {
    /// Bind the secure-area locators to `page`
    #[must_use]
    pub fn new(page: &Page) -> Self {
        Self {
            page: page.clone(),
            page_title: page.locator(".example h2"),
            logout_button: page.locator(r#"a[href="/logout"]"#),
            success_message: page.locator("#flash.success"),
            secure_area_text: page.locator(".example h4"),
        }
    }

    /// Heading text, empty if absent
    ///
    /// # Errors
    ///
    /// Driver errors only.
    pub async fn get_page_title(&self) -> PomResult<String> {
        Ok(self.page_title.text_content().await?.unwrap_or_default())
    }

    /// Welcome text, empty if absent
    ///
    /// # Errors
    ///
    /// Driver errors only.
    pub async fn get_secure_area_text(&self) -> PomResult<String> {
        Ok(self
            .secure_area_text
            .text_content()
            .await?
            .unwrap_or_default())
    }

    /// Click the logout button
    ///
    /// # Errors
    ///
    /// Fails if the button never becomes actionable.
    pub async fn logout(&self) -> PomResult<()> {
        tracing::info!("logout");
        self.logout_button.click().await
    }

    /// Logged in means the logout button is visible
    ///
    /// # Errors
    ///
    /// Driver errors only.
    pub async fn is_logged_in(&self) -> PomResult<bool> {
        self.logout_button.is_visible().await
    }

    /// Whether the green banner is shown
    ///
    /// # Errors
    ///
    /// Driver errors only.
    pub async fn is_success_message_visible(&self) -> PomResult<bool> {
        self.success_message.is_visible().await
    }

    /// Logout button
    #[must_use]
    pub const fn logout_button(&self) -> &Locator {
        &self.logout_button
    }

    /// Success banner
    #[must_use]
    pub const fn success_message(&self) -> &Locator {
        &self.success_message
    }
}

impl PageObject for HomePage {
    fn page(&self) -> &Page {
        &self.page
    }

    fn path(&self) -> &str {
        "/secure"
    }

    fn page_name(&self) -> &str {
        "HomePage"
    }
}
