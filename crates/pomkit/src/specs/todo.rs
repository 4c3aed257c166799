//! TodoMVC demo: create, complete, delete, and filter items.

use crate::context::{FixtureSet, TestContext};
use crate::expect::{expect, expect_eq};
use crate::page_object::PageObject;
use crate::pages::{TodoFilter, TodoPage};
use crate::result::PomResult;
use crate::runner::TestCase;
use futures::FutureExt;

/// Suite name
pub const SUITE: &str = "todo";

/// Cases of this suite
#[must_use]
pub fn cases() -> Vec<TestCase> {
    let browser = FixtureSet::browser();
    vec![
        TestCase::new(SUITE, "starts with an empty list", browser, |ctx| {
            starts_empty(ctx).boxed()
        }),
        TestCase::new(SUITE, "adds new items", browser, |ctx| adds_items(ctx).boxed()),
        TestCase::new(SUITE, "marks an item completed", browser, |ctx| {
            completes_item(ctx).boxed()
        }),
        TestCase::new(SUITE, "deletes an item", browser, |ctx| {
            deletes_item(ctx).boxed()
        }),
        TestCase::new(SUITE, "filters items by status", browser, |ctx| {
            filters_items(ctx).boxed()
        }),
    ]
}

async fn open(ctx: &TestContext) -> PomResult<TodoPage> {
    let todo = ctx.todo_page()?;
    todo.navigate().await?;
    Ok(todo)
}

async fn starts_empty(ctx: &TestContext) -> PomResult<()> {
    let todo = open(ctx).await?;
    expect(todo.main_section()).to_be_hidden().await?;
    expect(todo.new_todo_input()).to_be_visible().await
}

async fn adds_items(ctx: &TestContext) -> PomResult<()> {
    let todo = open(ctx).await?;
    todo.add_todo("Buy groceries").await?;
    todo.add_todo("Write test cases").await?;

    expect(todo.items()).to_have_count(2).await?;
    expect(&todo.items().first())
        .to_contain_text("Buy groceries")
        .await?;
    expect(&todo.items().last())
        .to_contain_text("Write test cases")
        .await?;
    expect(todo.todo_count()).to_contain_text("2 items left").await
}

async fn completes_item(ctx: &TestContext) -> PomResult<()> {
    let todo = open(ctx).await?;
    todo.add_todo("Complete the page-object suite").await?;
    todo.complete(0).await?;

    expect(&todo.item(0)).to_have_class("completed").await?;
    expect(todo.todo_count()).to_contain_text("0 items left").await
}

async fn deletes_item(ctx: &TestContext) -> PomResult<()> {
    let todo = open(ctx).await?;
    todo.add_todo("Todo to be deleted").await?;
    todo.delete(0).await?;

    expect(todo.items()).to_have_count(0).await?;
    expect(todo.main_section()).to_be_hidden().await
}

async fn filters_items(ctx: &TestContext) -> PomResult<()> {
    let todo = open(ctx).await?;
    todo.add_todo("Active todo").await?;
    todo.add_todo("Completed todo").await?;
    todo.complete(1).await?;

    todo.filter(TodoFilter::Active).await?;
    expect(todo.items()).to_have_count(1).await?;
    expect(todo.items()).to_contain_text("Active todo").await?;

    todo.filter(TodoFilter::Completed).await?;
    expect(todo.items()).to_have_count(1).await?;
    expect(todo.items()).to_contain_text("Completed todo").await?;

    todo.filter(TodoFilter::All).await?;
    expect(todo.items()).to_have_count(2).await?;
    expect_eq(
        "titles",
        vec!["Active todo".to_string(), "Completed todo".to_string()],
        todo.titles().await?,
    )
}
