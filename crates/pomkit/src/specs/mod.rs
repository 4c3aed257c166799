//! Example suites against the public demo sites.
//!
//! Each suite registers its cases as [`TestCase`]s so the runner and the
//! `pomkit` binary can list, filter, and run them.

pub mod api;
pub mod login;
pub mod todo;

use crate::runner::TestCase;

/// Suite names, in registration order
pub const SUITES: [&str; 3] = [login::SUITE, todo::SUITE, api::SUITE];

/// Every registered case
#[must_use]
pub fn all() -> Vec<TestCase> {
    let mut cases = login::cases();
    cases.extend(todo::cases());
    cases.extend(api::cases());
    cases
}
