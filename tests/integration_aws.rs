//! AWS backend integration tests using LocalStack.
//!
//! These tests require LocalStack to be running on localhost:4566.
//!
//! Run with:
//!   docker run -d -p 4566:4566 localstack/localstack
//!   cargo test --test integration_aws --features aws -- --ignored
//!
//! Or run in CI where LocalStack is configured as a service.

#![cfg(feature = "aws")]

use credwatch::backends::aws::AWSClientFactory;
use credwatch::metrics::NoopMetrics;
use credwatch::{
    AccountDescriptor, AccountValidator, CancellationToken, ClientCache, ClientValidator,
    CredentialMonitor, HealthChecker, MonitorConfig,
};
use std::sync::Arc;
use std::time::Duration;

// LocalStack's default account.
const LOCALSTACK_ACCOUNT: &str = "000000000000";

fn setup_env() {
    std::env::set_var("AWS_ACCESS_KEY_ID", "test");
    std::env::set_var("AWS_SECRET_ACCESS_KEY", "test");
    std::env::set_var("AWS_REGION", "us-east-1");
}

fn localstack_cache() -> Arc<ClientCache<AWSClientFactory>> {
    setup_env();

    let endpoint = std::env::var("LOCALSTACK_ENDPOINT")
        .unwrap_or_else(|_| "http://localhost:4566".to_string());

    Arc::new(ClientCache::new(
        AWSClientFactory::new().with_endpoint_url(endpoint),
    ))
}

fn ambient_account() -> AccountDescriptor {
    AccountDescriptor::new(LOCALSTACK_ACCOUNT, "localstack")
}

fn assumed_account() -> AccountDescriptor {
    AccountDescriptor::new(LOCALSTACK_ACCOUNT, "localstack-assumed")
        .with_role_arn(format!("arn:aws:iam::{}:role/credwatch-test", LOCALSTACK_ACCOUNT))
        .with_external_id("integration")
}

#[tokio::test]
#[ignore] // Run only when LocalStack is available
async fn test_aws_validate_ambient_identity() {
    let validator = ClientValidator::new(localstack_cache());

    validator
        .validate_account_access(&ambient_account(), &CancellationToken::new())
        .await
        .expect("ambient identity should validate");
}

#[tokio::test]
#[ignore]
async fn test_aws_validate_assumed_role() {
    let validator = ClientValidator::new(localstack_cache());

    validator
        .validate_account_access(&assumed_account(), &CancellationToken::new())
        .await
        .expect("assumed role should validate");
}

#[tokio::test]
#[ignore]
async fn test_aws_client_cached() {
    let cache = localstack_cache();
    let account = assumed_account();

    let first = cache.get_client(&account).await.expect("first client");
    let second = cache.get_client(&account).await.expect("second client");

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.len().await, 1);

    let identity = second
        .sts()
        .get_caller_identity()
        .send()
        .await
        .expect("GetCallerIdentity");
    assert_eq!(identity.account(), Some(LOCALSTACK_ACCOUNT));
}

#[tokio::test]
#[ignore]
async fn test_aws_monitor_pass() {
    let cache = localstack_cache();
    let config = MonitorConfig::new(vec![ambient_account()])
        .with_check_interval(Duration::from_secs(60));

    let monitor = Arc::new(CredentialMonitor::new(
        config,
        Arc::new(ClientValidator::new(cache)),
        Arc::new(NoopMetrics),
    ));
    monitor.check_all_accounts().await;

    let health = HealthChecker::new(Arc::clone(&monitor));
    health.check().await.expect("LocalStack accounts should be healthy");

    let report = health.report().await;
    assert!(report.ready);
    assert_eq!(report.summary.healthy, 1);
}
