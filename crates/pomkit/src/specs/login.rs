//! Login flow on the-internet.herokuapp.com.

use crate::context::{FixtureSet, TestContext};
use crate::data::TestMessages;
use crate::expect::{expect, expect_contains, expect_true, expect_url_matches};
use crate::page_object::PageObject;
use crate::result::PomResult;
use crate::runner::TestCase;
use futures::FutureExt;

/// Suite name
pub const SUITE: &str = "login";

/// Cases of this suite
#[must_use]
pub fn cases() -> Vec<TestCase> {
    let browser = FixtureSet::browser();
    vec![
        TestCase::new(SUITE, "navigates to the login page", browser, |ctx| {
            opens_login(ctx).boxed()
        }),
        TestCase::new(SUITE, "rejects an unknown user", browser, |ctx| {
            rejects_invalid_user(ctx).boxed()
        }),
        TestCase::new(SUITE, "logs in with valid credentials", browser, |ctx| {
            logs_in(ctx).boxed()
        }),
        TestCase::new(SUITE, "logs out of the secure area", browser, |ctx| {
            logs_out(ctx).boxed()
        }),
    ]
}

async fn opens_login(ctx: &TestContext) -> PomResult<()> {
    let login = ctx.login_page()?;
    login.navigate().await?;
    expect_url_matches(ctx.page()?, "login").await?;
    expect_true("login button enabled", login.is_login_button_enabled().await?)
}

async fn rejects_invalid_user(ctx: &TestContext) -> PomResult<()> {
    let user = ctx.users().invalid;
    let login = ctx.login_page()?;
    login.navigate().await?;
    login.login(&user.username, &user.password).await?;

    expect(login.error_message()).to_be_visible().await?;
    expect_true("error visible", login.is_error_message_visible().await?)?;
    expect_contains("error message", &login.get_error_message().await?, "invalid")
}

async fn logs_in(ctx: &TestContext) -> PomResult<()> {
    let user = ctx.users().valid;
    let login = ctx.login_page()?;
    login.navigate().await?;
    login.login(&user.username, &user.password).await?;

    let home = ctx.home_page()?;
    expect(home.logout_button()).to_be_visible().await?;
    expect(home.success_message())
        .to_contain_text(TestMessages::LOGIN_SUCCESS)
        .await?;
    expect_true("on secure area", home.is_current().await?)
}

async fn logs_out(ctx: &TestContext) -> PomResult<()> {
    let user = ctx.users().valid;
    let login = ctx.login_page()?;
    login.navigate().await?;
    login.login(&user.username, &user.password).await?;

    let home = ctx.home_page()?;
    expect(home.logout_button()).to_be_visible().await?;
    home.logout().await?;

    expect(login.error_message())
        .to_contain_text(TestMessages::LOGOUT_SUCCESS)
        .await?;
    expect_true("logged out", !home.is_logged_in().await?)?;
    expect_true("back on the login page", login.is_current().await?)?;
    expect_true(
        "logout banner visible",
        login.is_success_message_visible().await?,
    )
}
