//! Account access validation.

use crate::backend::{ClientFactory, ProbeClient};
use crate::{AccountDescriptor, ClientCache, CredwatchError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Proves that one account is reachable with its configured credentials.
///
/// Implementations must not retry; retry cadence belongs to the
/// [`CredentialMonitor`](crate::CredentialMonitor). They should return
/// [`CredwatchError::Cancelled`] promptly once `cancel` fires.
#[async_trait]
pub trait AccountValidator: Send + Sync {
    /// Validates end-to-end access to `account`.
    ///
    /// # Errors
    ///
    /// Returns the underlying failure wrapped in
    /// [`CredwatchError::AccountCheck`] with the account id.
    async fn validate_account_access(
        &self,
        account: &AccountDescriptor,
        cancel: &CancellationToken,
    ) -> Result<()>;
}

/// Validator that goes through the client cache and probes the cached client.
///
/// Fetching the client proves credential resolution (and any role
/// assumption); the probe proves the exact authenticated path other
/// components will use. The cache is shared, so validation warms it for
/// production callers and vice versa.
pub struct ClientValidator<F: ClientFactory> {
    cache: Arc<ClientCache<F>>,
}

impl<F: ClientFactory> ClientValidator<F> {
    /// Creates a validator over a shared client cache.
    pub fn new(cache: Arc<ClientCache<F>>) -> Self {
        Self { cache }
    }

    /// Returns the shared client cache.
    pub fn cache(&self) -> &Arc<ClientCache<F>> {
        &self.cache
    }
}

#[async_trait]
impl<F> AccountValidator for ClientValidator<F>
where
    F: ClientFactory,
    F::Client: ProbeClient,
{
    async fn validate_account_access(
        &self,
        account: &AccountDescriptor,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let access = async {
            let client = self.cache.get_client(account).await?;
            client.probe(account).await
        };

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(CredwatchError::Cancelled),
            result = access => result,
        };

        result.map_err(|e| CredwatchError::account_check(&account.account_id, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::mock::MockClientFactory;
    use std::time::Duration;

    fn validator() -> ClientValidator<MockClientFactory> {
        ClientValidator::new(Arc::new(ClientCache::new(MockClientFactory::new())))
    }

    #[tokio::test]
    async fn test_validate_success_caches_client() {
        let validator = validator();
        let account = AccountDescriptor::new("111111111111", "prod");

        validator
            .validate_account_access(&account, &CancellationToken::new())
            .await
            .unwrap();
        validator
            .validate_account_access(&account, &CancellationToken::new())
            .await
            .unwrap();

        let factory = validator.cache().factory();
        assert_eq!(factory.created(), 1);
        assert_eq!(factory.probes("111111111111"), 2);
    }

    #[tokio::test]
    async fn test_resolution_failure_wrapped_with_account() {
        let validator = validator();
        validator
            .cache()
            .factory()
            .fail_create("222222222222", "AccessDenied");
        let account = AccountDescriptor::new("222222222222", "staging");

        let err = validator
            .validate_account_access(&account, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.is_credential_error());
        assert_eq!(
            err.to_string(),
            "account 222222222222: credential resolution failed: AccessDenied"
        );
        assert_eq!(validator.cache().factory().probes("222222222222"), 0);
    }

    #[tokio::test]
    async fn test_probe_failure_wrapped_with_account() {
        let validator = validator();
        validator
            .cache()
            .factory()
            .fail_probe("333333333333", "ExpiredToken");
        let account = AccountDescriptor::new("333333333333", "dev");

        let err = validator
            .validate_account_access(&account, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(!err.is_credential_error());
        assert!(matches!(
            err,
            CredwatchError::AccountCheck { ref account_id, .. } if account_id == "333333333333"
        ));
        assert!(err.to_string().contains("ExpiredToken"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_hung_access_check() {
        let validator = validator();
        validator
            .cache()
            .factory()
            .set_probe_delay("444444444444", Duration::from_secs(3600));
        let account = AccountDescriptor::new("444444444444", "sandbox");
        let cancel = CancellationToken::new();

        let canceller = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(1)).await;
                cancel.cancel();
            })
        };

        let started = tokio::time::Instant::now();
        let err = validator
            .validate_account_access(&account, &cancel)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(validator.cache().factory().probes("444444444444"), 1);
        canceller.await.unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_token_skips_access() {
        let validator = validator();
        let account = AccountDescriptor::new("555555555555", "scratch");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = validator
            .validate_account_access(&account, &cancel)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(validator.cache().factory().created(), 0);
    }
}
