//! Cloud backend traits.
//!
//! This module defines the seam between the credential core and a concrete
//! cloud SDK. A [`ClientFactory`] turns an account descriptor into an API
//! client bound to that account's credentials; the client implements
//! [`ProbeClient`] so the validator can prove the credentials work with one
//! cheap call.

use crate::{AccountDescriptor, Result};
use async_trait::async_trait;

/// Builds API clients bound to one account's credentials.
///
/// Implementations resolve credentials (ambient identity or role assumption)
/// and construct a client. Construction is expected to be costly, so callers
/// go through [`ClientCache`](crate::ClientCache) rather than calling this
/// directly.
///
/// All implementations must be `Send + Sync` to support concurrent access
/// across async tasks.
///
/// # Implementations
///
/// - **AWS**: default credential chain or STS `AssumeRole` (feature `aws`)
/// - **Testing**: mock factory with error and latency injection (feature `mock`)
#[async_trait]
pub trait ClientFactory: Send + Sync + 'static {
    /// Client handle produced by this factory.
    type Client: Send + Sync + 'static;

    /// Returns the backend name (e.g., "aws", "mock").
    fn name(&self) -> &str;

    /// Resolves credentials for `account` and builds a client for `region`.
    ///
    /// # Errors
    ///
    /// - [`CredwatchError::CredentialResolution`](crate::CredwatchError::CredentialResolution):
    ///   the credential chain or role assumption could not be set up
    /// - [`CredwatchError::Configuration`](crate::CredwatchError::Configuration):
    ///   the descriptor is malformed
    async fn create_client(&self, account: &AccountDescriptor, region: &str)
        -> Result<Self::Client>;
}

/// A client that can prove its credentials with one minimal API call.
///
/// The call must be read-only, side-effect free and free of charge.
#[async_trait]
pub trait ProbeClient: Send + Sync {
    /// Issues the proving call and discards its result.
    ///
    /// # Errors
    ///
    /// Returns [`CredwatchError::Connectivity`](crate::CredwatchError::Connectivity)
    /// if the call fails.
    async fn probe(&self, account: &AccountDescriptor) -> Result<()>;
}
