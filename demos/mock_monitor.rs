//! Credential monitor example.
//!
//! Runs the monitor against the mock backend, breaks one account, then all of
//! them, and prints what a readiness probe would see.
//!
//! Run with: cargo run --example mock_monitor

use credwatch::backends::mock::MockClientFactory;
use credwatch::metrics::NoopMetrics;
use credwatch::{
    AccountDescriptor, ClientCache, ClientValidator, CredentialMonitor, HealthChecker,
    MonitorConfig,
};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> credwatch::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "credwatch=debug".into()),
        )
        .init();

    println!("=== Credential Monitor Example ===\n");

    let accounts = vec![
        AccountDescriptor::new("111111111111", "production")
            .with_role_arn("arn:aws:iam::111111111111:role/CostReader"),
        AccountDescriptor::new("222222222222", "staging")
            .with_role_arn("arn:aws:iam::222222222222:role/CostReader"),
        AccountDescriptor::new("333333333333", "sandbox"),
    ];

    let factory = MockClientFactory::new();
    let cache = Arc::new(ClientCache::new(factory.clone()));
    let validator = Arc::new(ClientValidator::new(Arc::clone(&cache)));
    let config = MonitorConfig::new(accounts).with_check_interval(Duration::from_millis(200));

    let monitor = Arc::new(CredentialMonitor::new(config, validator, Arc::new(NoopMetrics)));
    let health = HealthChecker::new(Arc::clone(&monitor));

    // Example 1: cold start never fails readiness
    println!("1. Before the first pass:");
    println!("   ready = {}", health.check().await.is_ok());

    monitor.start();
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Example 2: all accounts healthy
    println!("\n2. After the first pass:");
    print_report(&health).await;

    // Example 3: one account failing degrades but stays ready
    println!("\n3. Staging credentials expire:");
    factory.fail_probe(
        "222222222222",
        "ExpiredToken: the security token included in the request is expired",
    );
    tokio::time::sleep(Duration::from_millis(250)).await;
    print_report(&health).await;

    // Example 4: total outage
    println!("\n4. Every account failing:");
    factory.fail_probe("111111111111", "InvalidClientTokenId");
    factory.fail_probe("333333333333", "InvalidClientTokenId");
    tokio::time::sleep(Duration::from_millis(250)).await;
    match health.check().await {
        Ok(()) => println!("   ready"),
        Err(e) => println!("   not ready: {}", e),
    }

    println!("\n   clients built: {} (cached: {})", factory.created(), cache.len().await);

    // Example 5: status endpoint payload
    println!("\n5. Status endpoint JSON:");
    println!("{}", health.report().await.to_json_pretty()?);

    monitor.shutdown().await;
    Ok(())
}

async fn print_report(health: &HealthChecker) {
    let report = health.report().await;
    println!(
        "   ready = {}, healthy = {}/{}",
        report.ready, report.summary.healthy, report.summary.configured
    );
    for status in report.accounts {
        match status.last_error {
            None => println!("   ✓ {} ({})", status.account_name, status.account_id),
            Some(error) => println!("   ✗ {} ({}): {}", status.account_name, status.account_id, error),
        }
    }
}
