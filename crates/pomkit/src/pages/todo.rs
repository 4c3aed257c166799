//! TodoMVC demo application.

use crate::dom::{Selector, TextMatch};
use crate::locator::Locator;
use crate::page::Page;
use crate::page_object::PageObject;
use crate::result::PomResult;

/// Footer filter links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodoFilter {
    /// Every item
    All,
    /// Items not yet completed
    Active,
    /// Completed items
    Completed,
}

impl TodoFilter {
    /// Link text
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Active => "Active",
            Self::Completed => "Completed",
        }
    }
}

/// TodoMVC list, addressed by a fully-qualified URL.
#[derive(Debug, Clone)]
pub struct TodoPage {
    page: Page,
    url: String,
    new_todo: Locator,
    items: Locator,
    todo_count: Locator,
    main: Locator,
}

impl TodoPage {
    /// Placeholder of the new-item input
    pub const PLACEHOLDER: &'static str = "What needs to be done?";

    /// Bind the TodoMVC locators to `page`
    #[must_use]
    pub fn new(page: &Page, url: impl Into<String>) -> Self {
        Self {
            page: page.clone(),
            url: url.into(),
            new_todo: page.get_by_placeholder(Self::PLACEHOLDER),
            items: page.locator(".todo-list li"),
            todo_count: page.locator(".todo-count"),
            main: page.locator(".main"),
        }
    }

    /// Type a title and press Enter
    ///
    /// # Errors
    ///
    /// Fails if the input never becomes actionable.
    pub async fn add_todo(&self, title: &str) -> PomResult<()> {
        tracing::debug!(title, "add todo");
        self.new_todo.fill(title).await?;
        self.new_todo.press("Enter").await
    }

    /// Every list item
    #[must_use]
    pub const fn items(&self) -> &Locator {
        &self.items
    }

    /// The item at `index`
    #[must_use]
    pub fn item(&self, index: usize) -> Locator {
        self.items.nth(index)
    }

    /// New-item input
    #[must_use]
    pub const fn new_todo_input(&self) -> &Locator {
        &self.new_todo
    }

    /// "N items left" counter
    #[must_use]
    pub const fn todo_count(&self) -> &Locator {
        &self.todo_count
    }

    /// Main section, hidden while the list is empty
    #[must_use]
    pub const fn main_section(&self) -> &Locator {
        &self.main
    }

    /// Mark the item at `index` completed
    ///
    /// # Errors
    ///
    /// Fails if the checkbox never becomes actionable.
    pub async fn complete(&self, index: usize) -> PomResult<()> {
        self.item(index).locator(".toggle").check().await
    }

    /// Mark the item at `index` active again
    ///
    /// # Errors
    ///
    /// Fails if the checkbox never becomes actionable.
    pub async fn reopen(&self, index: usize) -> PomResult<()> {
        self.item(index).locator(".toggle").uncheck().await
    }

    /// Flip the item's completed state
    ///
    /// # Errors
    ///
    /// Fails if the checkbox never becomes actionable.
    pub async fn toggle(&self, index: usize) -> PomResult<()> {
        self.item(index).locator(".toggle").click().await
    }

    /// Hover the item to reveal its destroy button, then click it
    ///
    /// # Errors
    ///
    /// Fails if the item or its button never becomes actionable.
    pub async fn delete(&self, index: usize) -> PomResult<()> {
        let item = self.item(index);
        item.hover().await?;
        item.locator(".destroy").click().await
    }

    /// Click a footer filter link
    ///
    /// # Errors
    ///
    /// Fails if the link never becomes actionable.
    pub async fn filter(&self, filter: TodoFilter) -> PomResult<()> {
        self.page
            .select(Selector::Role {
                role: "link".to_string(),
                name: Some(TextMatch::exact(filter.label())),
            })
            .click()
            .await
    }

    /// Text of every visible list item
    ///
    /// # Errors
    ///
    /// Driver errors only.
    pub async fn titles(&self) -> PomResult<Vec<String>> {
        Ok(self
            .items
            .all_text_contents()
            .await?
            .into_iter()
            .map(|t| t.trim().to_string())
            .collect())
    }

    /// Counter text, empty if the footer is hidden
    ///
    /// # Errors
    ///
    /// Driver errors only.
    pub async fn remaining_text(&self) -> PomResult<String> {
        Ok(self.todo_count.text_content().await?.unwrap_or_default())
    }

    /// Whether the main section is shown
    ///
    /// # Errors
    ///
    /// Driver errors only.
    pub async fn is_main_visible(&self) -> PomResult<bool> {
        self.main.is_visible().await
    }
}

impl PageObject for TodoPage {
    fn page(&self) -> &Page {
        &self.page
    }

    fn path(&self) -> &str {
        &self.url
    }

    fn page_name(&self) -> &str {
        "TodoPage"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::dom::{DomOp, Outcome};
    use crate::pages::test_support::mock_page;

    const URL: &str = "https://demo.playwright.dev/todomvc/";

    #[tokio::test]
    async fn test_navigate_to_literal_url() {
        let (driver, page) = mock_page();
        TodoPage::new(&page, URL).navigate().await.unwrap();
        assert!(driver.was_called("navigate:https://demo.playwright.dev/todomvc/"));
    }

    #[tokio::test]
    async fn test_add_todo_fills_and_presses_enter() {
        let (driver, page) = mock_page();
        TodoPage::new(&page, URL)
            .add_todo("Buy groceries")
            .await
            .unwrap();
        let commands = driver.commands();
        assert_eq!(commands.len(), 2);
        assert_eq!(
            commands[0].target(),
            r#"placeholder="What needs to be done?"i"#
        );
        assert_eq!(
            commands[1].op,
            DomOp::Press {
                key: "Enter".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_complete_targets_nested_toggle() {
        let (driver, page) = mock_page();
        TodoPage::new(&page, URL).complete(1).await.unwrap();
        assert_eq!(
            driver.history(),
            vec!["setChecked:css=.todo-list li >> nth=1 >> css=.toggle"]
        );
    }

    #[tokio::test]
    async fn test_delete_hovers_first() {
        let (driver, page) = mock_page();
        TodoPage::new(&page, URL).delete(0).await.unwrap();
        assert_eq!(
            driver.history(),
            vec![
                "hover:css=.todo-list li >> nth=0",
                "click:css=.todo-list li >> nth=0 >> css=.destroy",
            ]
        );
    }

    #[tokio::test]
    async fn test_filter_uses_exact_link_name() {
        let (driver, page) = mock_page();
        TodoPage::new(&page, URL)
            .filter(TodoFilter::Active)
            .await
            .unwrap();
        assert!(driver.was_called(r#"click:role=link[name="Active"s]"#));
    }

    #[tokio::test]
    async fn test_titles_and_counter() {
        let (driver, page) = mock_page();
        driver
            .respond(
                "allTextContents",
                "css=.todo-list li",
                Outcome::value(serde_json::json!(["Buy groceries ", "Write test cases"])),
            )
            .respond("textContent", "css=.todo-count", Outcome::value("2 items left"));
        let todo = TodoPage::new(&page, URL);
        assert_eq!(
            todo.titles().await.unwrap(),
            vec!["Buy groceries", "Write test cases"]
        );
        assert_eq!(todo.remaining_text().await.unwrap(), "2 items left");
        assert!(!todo.is_main_visible().await.unwrap());
    }
}
