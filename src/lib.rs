//! Credwatch - cached multi-account cloud access with credential health monitoring.
//!
//! Credwatch gives a control-plane process scoped access to many independent
//! cloud accounts and keeps proving that access still works, without putting
//! API calls on the readiness-probe path.
//!
//! # Features
//!
//! - **Client Cache**: one client per `(account, region)`, built at most once
//!   even under concurrent first access
//! - **Role Assumption**: cross-account access through short-lived,
//!   auto-refreshing credentials
//! - **Credential Monitor**: background re-validation of every account on a
//!   fixed interval, with per-check timeouts
//! - **Graceful Degradation**: readiness fails only when every checked
//!   account fails
//! - **Zero-Cost Probes**: [`HealthChecker`] reads cached results only
//! - **Feature Flags**: optional backend compilation to minimize dependencies
//!
//! # Quick Start
//!
//! ```
//! use credwatch::backends::mock::MockClientFactory;
//! use credwatch::metrics::NoopMetrics;
//! use credwatch::{
//!     AccountDescriptor, ClientCache, ClientValidator, CredentialMonitor, HealthChecker,
//!     MonitorConfig,
//! };
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> credwatch::Result<()> {
//!     let config = MonitorConfig::new(vec![
//!         AccountDescriptor::new("111111111111", "production")
//!             .with_role_arn("arn:aws:iam::111111111111:role/CostReader"),
//!         AccountDescriptor::new("222222222222", "staging")
//!             .with_role_arn("arn:aws:iam::222222222222:role/CostReader"),
//!     ])
//!     .with_check_interval(Duration::from_secs(600));
//!
//!     // Swap in `backends::aws::AWSClientFactory` for real accounts.
//!     let cache = Arc::new(ClientCache::new(MockClientFactory::new()));
//!     let validator = Arc::new(ClientValidator::new(Arc::clone(&cache)));
//!     let monitor = Arc::new(CredentialMonitor::new(config, validator, Arc::new(NoopMetrics)));
//!     monitor.start();
//!
//!     let health = HealthChecker::new(Arc::clone(&monitor));
//!     health.check().await?;
//!
//!     monitor.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! # Supported Backends
//!
//! | Backend | Feature Flag | Notes |
//! |---------|-------------|-------|
//! | Mock | `mock` (default) | In-memory testing backend |
//! | AWS | `aws` | Default chain or STS `AssumeRole`, probes with `GetCallerIdentity` |
//!
//! # Feature Flags
//!
//! ```toml
//! [dependencies]
//! credwatch = { version = "0.1", features = ["aws"] }
//! ```

pub mod account;
pub mod backend;
pub mod backends;
pub mod cache;
pub mod config;
pub mod error;
pub mod health;
pub mod metrics;
pub mod monitor;
pub mod validation;
pub mod validator;

pub use account::{AccountDescriptor, ClientKey, DEFAULT_REGION};
pub use backend::{ClientFactory, ProbeClient};
pub use cache::ClientCache;
pub use config::MonitorConfig;
pub use error::{CredwatchError, Result};
pub use health::{HealthChecker, HealthReport};
pub use monitor::{AccountStatus, CredentialMonitor, MonitorSnapshot, MonitorSummary};
pub use tokio_util::sync::CancellationToken;
pub use validator::{AccountValidator, ClientValidator};
