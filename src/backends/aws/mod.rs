//! AWS backend.
//!
//! Resolves per-account credentials with the official AWS SDK and proves
//! access with STS `GetCallerIdentity`.
//!
//! # Requirements
//!
//! - An ambient AWS identity, configured via:
//!   - Environment variables (`AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`)
//!   - Shared credentials file (`~/.aws/credentials`)
//!   - IAM instance or task role (for EC2/ECS/EKS)
//! - For cross-account access, a role in each target account whose trust
//!   policy allows the ambient identity to call `sts:AssumeRole`
//!
//! # Features
//!
//! - Native SDK integration (no CLI)
//! - Cross-account role assumption with optional external id
//! - Assumed credentials refreshed before expiry by the SDK identity cache
//! - Session names derived from the account id for CloudTrail traceability
//!
//! # Example
//!
//! ```no_run
//! use credwatch::backends::aws::AWSClientFactory;
//! use credwatch::{
//!     AccountDescriptor, AccountValidator, CancellationToken, ClientCache, ClientValidator,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> credwatch::Result<()> {
//!     let cache = Arc::new(ClientCache::new(AWSClientFactory::new()));
//!     let validator = ClientValidator::new(Arc::clone(&cache));
//!
//!     let account = AccountDescriptor::new("123456789012", "production")
//!         .with_role_arn("arn:aws:iam::123456789012:role/CostReader")
//!         .with_external_id("d7c1f0e2");
//!
//!     let cancel = CancellationToken::new();
//!     validator.validate_account_access(&account, &cancel).await?;
//!
//!     // Same cached credentials for real work.
//!     let client = cache.get_client(&account).await?;
//!     let _config = client.sdk_config();
//!     Ok(())
//! }
//! ```

mod backend;
mod credentials;

pub use backend::{AWSClient, AWSClientFactory};
pub use credentials::{session_name_for, SESSION_NAME_PREFIX};
