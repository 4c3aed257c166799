//! Small utilities for test bodies.

use chrono::Datelike;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Random lowercase alphanumeric string of `len` characters.
#[must_use]
pub fn random_string(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

/// `test_<8 random chars>@example.com`
#[must_use]
pub fn random_email() -> String {
    format!("test_{}@example.com", random_string(8))
}

/// Uniform integer in `min..=max`. Bounds may be given in either order.
#[must_use]
pub fn random_number(min: i64, max: i64) -> i64 {
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    rand::thread_rng().gen_range(lo..=hi)
}

/// Render a date with `YYYY`, `MM` and `DD` placeholders.
#[must_use]
pub fn format_date<D: Datelike>(date: &D, format: &str) -> String {
    format
        .replacen("YYYY", &format!("{:04}", date.year()), 1)
        .replacen("MM", &format!("{:02}", date.month()), 1)
        .replacen("DD", &format!("{:02}", date.day()), 1)
}

/// Today's date as `YYYY-MM-DD`
#[must_use]
pub fn today() -> String {
    format_date(&chrono::Local::now().date_naive(), "YYYY-MM-DD")
}

/// Async sleep
pub async fn sleep(duration: Duration) {
    tokio::time::sleep(duration).await;
}

/// Run `f` up to `attempts` times, sleeping `delay * attempt` between tries.
///
/// Returns the last error if every attempt fails.
///
/// # Errors
///
/// The error of the final attempt.
pub async fn retry<T, E, F, Fut>(mut f: F, attempts: u32, delay: Duration) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= attempts => return Err(e),
            Err(e) => {
                tracing::warn!(attempt, attempts, error = %e, "retrying");
                sleep(delay * attempt).await;
                attempt += 1;
            }
        }
    }
}
