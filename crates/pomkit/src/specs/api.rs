//! JSONPlaceholder post resource through the typed manager.

use crate::context::{FixtureSet, TestContext};
use crate::expect::{expect_eq, expect_true};
use crate::fixture::{TEST_POST_BODY, TEST_POST_TITLE};
use crate::models::{CreatePost, UpdatePost};
use crate::result::PomResult;
use crate::runner::TestCase;
use futures::FutureExt;

/// Suite name
pub const SUITE: &str = "api";

/// Cases of this suite
#[must_use]
pub fn cases() -> Vec<TestCase> {
    let api = FixtureSet::api();
    vec![
        TestCase::new(SUITE, "creates a post", api, |ctx| creates_post(ctx).boxed()),
        TestCase::new(SUITE, "lists all posts", api, |ctx| lists_posts(ctx).boxed()),
        TestCase::new(SUITE, "lists posts by user", api, |ctx| {
            lists_by_user(ctx).boxed()
        }),
        TestCase::new(SUITE, "gets a post by id", api, |ctx| gets_by_id(ctx).boxed()),
        TestCase::new(SUITE, "replaces a post", api, |ctx| updates_post(ctx).boxed()),
        TestCase::new(SUITE, "patches a post title", api, |ctx| {
            patches_post(ctx).boxed()
        }),
        TestCase::new(SUITE, "deletes a post", api, |ctx| deletes_post(ctx).boxed()),
        TestCase::new(
            SUITE,
            "provides a per-test post",
            api.with_test_post(),
            |ctx| uses_test_post(ctx).boxed(),
        ),
    ]
}

async fn creates_post(ctx: &TestContext) -> PomResult<()> {
    let input = CreatePost::new(
        1,
        "Test Post from pomkit",
        "This is a test post created by automated tests",
    );
    let created = ctx.post_manager()?.create(&input).await?;
    expect_true("id assigned", created.id > 0)?;
    expect_eq("user id", input.user_id, created.user_id)?;
    expect_eq("title", input.title.as_str(), created.title.as_str())?;
    expect_eq("body", input.body.as_str(), created.body.as_str())
}

async fn lists_posts(ctx: &TestContext) -> PomResult<()> {
    let posts = ctx.post_manager()?.list().await?;
    expect_true("posts returned", !posts.is_empty())
}

async fn lists_by_user(ctx: &TestContext) -> PomResult<()> {
    let posts = ctx.post_manager()?.list_by_user_id(1).await?;
    expect_true("posts returned", !posts.is_empty())?;
    expect_true("all by user 1", posts.iter().all(|p| p.user_id == 1))
}

async fn gets_by_id(ctx: &TestContext) -> PomResult<()> {
    let post = ctx.post_manager()?.get_by_id(1).await?;
    expect_eq("id", 1, post.id)
}

async fn updates_post(ctx: &TestContext) -> PomResult<()> {
    let input = CreatePost::new(1, "Replaced title", "Replaced body");
    let updated = ctx.post_manager()?.update(1, &input).await?;
    expect_eq("id", 1, updated.id)?;
    expect_true("fields replaced", updated.matches(&input))
}

async fn patches_post(ctx: &TestContext) -> PomResult<()> {
    let patched = ctx
        .post_manager()?
        .partial_update(1, &UpdatePost::title("Patched title"))
        .await?;
    expect_eq("title", "Patched title", patched.title.as_str())
}

async fn deletes_post(ctx: &TestContext) -> PomResult<()> {
    ctx.post_manager()?.delete(1).await
}

async fn uses_test_post(ctx: &TestContext) -> PomResult<()> {
    let post = ctx.test_post()?;
    expect_eq("title", TEST_POST_TITLE, post.title.as_str())?;
    expect_eq("body", TEST_POST_BODY, post.body.as_str())
}
