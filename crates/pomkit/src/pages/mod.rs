//! Page objects for the demo sites.

mod home;
mod login;
mod todo;

pub use home::HomePage;
pub use login::LoginPage;
pub use todo::{TodoFilter, TodoPage};

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::Timeouts;
    use crate::driver::MockDriver;
    use crate::page::Page;
    use std::sync::Arc;
    use std::time::Duration;

    pub const BASE: &str = "https://the-internet.herokuapp.com";

    pub fn mock_page() -> (Arc<MockDriver>, Page) {
        let driver = Arc::new(MockDriver::new());
        let page = Page::new(driver.clone(), BASE).with_timeouts(
            Timeouts::default()
                .with_action(Duration::from_millis(50))
                .with_poll_interval(Duration::from_millis(5)),
        );
        (driver, page)
    }
}
