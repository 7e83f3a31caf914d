//! Client handle cache keyed by account and region.

use crate::backend::ClientFactory;
use crate::{AccountDescriptor, ClientKey, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{OnceCell, RwLock};

type Slot<C> = Arc<OnceCell<Arc<C>>>;

/// Caches API clients per `(account, region)`.
///
/// Each key owns a slot that is initialized at most once. Concurrent first
/// callers for the same key wait on the same construction instead of each
/// resolving credentials, so a role is assumed once per logical acquisition.
/// A failed construction leaves the slot empty and the next caller retries.
///
/// # Example
///
/// ```
/// use credwatch::backends::mock::MockClientFactory;
/// use credwatch::{AccountDescriptor, ClientCache};
/// use std::sync::Arc;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> credwatch::Result<()> {
///     let cache = ClientCache::new(MockClientFactory::new());
///     let account = AccountDescriptor::new("123456789012", "prod");
///
///     let first = cache.get_client(&account).await?;
///     let second = cache.get_client(&account).await?;
///
///     assert!(Arc::ptr_eq(&first, &second));
///     assert_eq!(cache.factory().created(), 1);
///     Ok(())
/// }
/// ```
pub struct ClientCache<F: ClientFactory> {
    factory: F,
    slots: RwLock<HashMap<ClientKey, Slot<F::Client>>>,
}

impl<F: ClientFactory> ClientCache<F> {
    /// Creates an empty cache backed by `factory`.
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the factory used to build clients.
    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Returns the client for `account` in its default region.
    ///
    /// # Errors
    ///
    /// Returns the factory's error verbatim if the client cannot be built.
    pub async fn get_client(&self, account: &AccountDescriptor) -> Result<Arc<F::Client>> {
        self.get_client_in_region(account, &account.region).await
    }

    /// Returns the client for `account` in `region`, building it on first use.
    ///
    /// # Errors
    ///
    /// Returns the factory's error verbatim if the client cannot be built.
    pub async fn get_client_in_region(
        &self,
        account: &AccountDescriptor,
        region: &str,
    ) -> Result<Arc<F::Client>> {
        let key = ClientKey::new(&account.account_id, region);

        if let Some(client) = self.cached_by_key(&key).await {
            return Ok(client);
        }

        let slot = {
            let mut slots = self.slots.write().await;
            Arc::clone(slots.entry(key.clone()).or_default())
        };

        let client = slot
            .get_or_try_init(|| async {
                tracing::debug!(
                    backend = self.factory.name(),
                    account_id = %account.account_id,
                    region,
                    assumes_role = account.assumes_role(),
                    "building client"
                );
                self.factory
                    .create_client(account, region)
                    .await
                    .map(Arc::new)
            })
            .await
            .inspect_err(|e| {
                tracing::warn!(
                    backend = self.factory.name(),
                    account_id = %account.account_id,
                    region,
                    error = %e,
                    "client construction failed"
                );
            })?;

        Ok(Arc::clone(client))
    }

    /// Returns the cached client for an account and region without building one.
    pub async fn cached(&self, account_id: &str, region: &str) -> Option<Arc<F::Client>> {
        self.cached_by_key(&ClientKey::new(account_id, region)).await
    }

    async fn cached_by_key(&self, key: &ClientKey) -> Option<Arc<F::Client>> {
        let slots = self.slots.read().await;
        slots.get(key).and_then(|slot| slot.get()).map(Arc::clone)
    }

    /// Drops the cached client for an account and region.
    ///
    /// The next access builds a fresh client (and re-resolves credentials).
    /// Returns true if a client was cached.
    pub async fn invalidate(&self, account_id: &str, region: &str) -> bool {
        let mut slots = self.slots.write().await;
        slots
            .remove(&ClientKey::new(account_id, region))
            .is_some_and(|slot| slot.initialized())
    }

    /// Drops every cached client.
    pub async fn clear(&self) {
        self.slots.write().await.clear();
    }

    /// Number of built clients currently cached.
    pub async fn len(&self) -> usize {
        let slots = self.slots.read().await;
        slots.values().filter(|slot| slot.initialized()).count()
    }

    /// Returns true if no built client is cached.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::mock::MockClientFactory;
    use crate::CredwatchError;
    use std::time::Duration;

    fn account(id: &str) -> AccountDescriptor {
        AccountDescriptor::new(id, format!("account-{}", id))
    }

    #[tokio::test]
    async fn test_second_call_hits_cache() {
        let cache = ClientCache::new(MockClientFactory::new());
        let prod = account("111111111111");

        let first = cache.get_client(&prod).await.unwrap();
        let second = cache.get_client(&prod).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.factory().created(), 1);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_regions_are_separate_entries() {
        let cache = ClientCache::new(MockClientFactory::new());
        let prod = account("111111111111");

        let home = cache.get_client(&prod).await.unwrap();
        let other = cache.get_client_in_region(&prod, "eu-west-1").await.unwrap();

        assert!(!Arc::ptr_eq(&home, &other));
        assert_eq!(other.region(), "eu-west-1");
        assert_eq!(cache.factory().created(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_access_builds_once() {
        let factory = MockClientFactory::new().with_create_delay(Duration::from_millis(50));
        let cache = Arc::new(ClientCache::new(factory));
        let prod = account("111111111111").with_role_arn("arn:aws:iam::111111111111:role/Reader");

        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = Arc::clone(&cache);
            let prod = prod.clone();
            handles.push(tokio::spawn(async move {
                cache.get_client(&prod).await.unwrap()
            }));
        }

        let mut clients = Vec::new();
        for handle in handles {
            clients.push(handle.await.unwrap());
        }

        assert_eq!(cache.factory().created(), 1);
        assert!(clients.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[tokio::test]
    async fn test_failure_creates_no_entry() {
        let factory = MockClientFactory::new();
        factory.fail_create("111111111111", "AccessDenied: not authorized to perform sts:AssumeRole");
        let cache = ClientCache::new(factory);
        let prod = account("111111111111");

        let err = cache.get_client(&prod).await.unwrap_err();
        assert!(matches!(err, CredwatchError::CredentialResolution(_)));
        assert!(err.to_string().contains("AccessDenied"));
        assert!(cache.is_empty().await);
        assert!(cache.cached("111111111111", &prod.region).await.is_none());

        cache.factory().clear_create_failure("111111111111");
        let client = cache.get_client(&prod).await.unwrap();
        assert_eq!(client.account_id(), "111111111111");
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_invalidate_rebuilds() {
        let cache = ClientCache::new(MockClientFactory::new());
        let prod = account("111111111111");

        let first = cache.get_client(&prod).await.unwrap();
        assert!(cache.invalidate("111111111111", &prod.region).await);
        assert!(!cache.invalidate("111111111111", &prod.region).await);

        let second = cache.get_client(&prod).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(cache.factory().created(), 2);
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = ClientCache::new(MockClientFactory::new());
        cache.get_client(&account("111111111111")).await.unwrap();
        cache.get_client(&account("222222222222")).await.unwrap();
        assert_eq!(cache.len().await, 2);

        cache.clear().await;
        assert!(cache.is_empty().await);
    }
}
