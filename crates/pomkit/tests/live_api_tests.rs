//! API suite against the public JSONPlaceholder service.
//!
//! Ignored by default; run with `cargo test -- --ignored` when online.

#![allow(clippy::unwrap_used)]

use pomkit::runner::TestStatus;
use pomkit::{logging, ApiClient, PostManager, Runner, SuiteConfig};

#[tokio::test]
#[ignore = "requires network access"]
async fn test_api_suite_live() {
    logging::init_for_tests();
    let dir = tempfile::tempdir().unwrap();
    let config = SuiteConfig::from_env().unwrap().with_output_dir(dir.path());
    let report = Runner::new(config)
        .run(pomkit::specs::api::cases())
        .await
        .unwrap();

    for outcome in &report.outcomes {
        assert_ne!(
            outcome.status,
            TestStatus::Failed,
            "{}: {:?}",
            outcome.full_name(),
            outcome.error
        );
    }
}

#[tokio::test]
#[ignore = "requires network access"]
async fn test_missing_post_live() {
    let config = SuiteConfig::from_env().unwrap();
    let err = PostManager::new(ApiClient::new(config.api_base_url))
        .get_by_id(99_999)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
