//! Mock backend for testing.
//!
//! This backend builds in-memory clients with error and latency injection
//! for testing code that uses credwatch without a cloud account.

use crate::backend::{ClientFactory, ProbeClient};
use crate::{AccountDescriptor, CredwatchError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

#[derive(Debug, Default)]
struct MockState {
    next_id: AtomicU64,
    created: AtomicUsize,
    create_failures: RwLock<HashMap<String, String>>,
    probe_failures: RwLock<HashMap<String, String>>,
    probe_delays: RwLock<HashMap<String, Duration>>,
    probes: RwLock<HashMap<String, usize>>,
}

impl MockState {
    fn lookup<T: Clone>(map: &RwLock<HashMap<String, T>>, account_id: &str) -> Option<T> {
        map.read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(account_id)
            .cloned()
    }

    fn set<T>(map: &RwLock<HashMap<String, T>>, account_id: &str, value: Option<T>) {
        let mut map = map.write().unwrap_or_else(PoisonError::into_inner);
        match value {
            Some(value) => {
                map.insert(account_id.to_string(), value);
            }
            None => {
                map.remove(account_id);
            }
        }
    }
}

/// Mock client factory for testing.
///
/// Clients share the factory's state, so failures injected after a client
/// was cached still affect its probes.
///
/// # Example
///
/// ```
/// use credwatch::backends::mock::MockClientFactory;
/// use credwatch::{
///     AccountDescriptor, AccountValidator, CancellationToken, ClientCache, ClientValidator,
/// };
/// use std::sync::Arc;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let factory = MockClientFactory::new();
///     factory.fail_probe("222222222222", "credential expired");
///
///     let validator = ClientValidator::new(Arc::new(ClientCache::new(factory)));
///     let cancel = CancellationToken::new();
///
///     let ok = AccountDescriptor::new("111111111111", "prod");
///     let bad = AccountDescriptor::new("222222222222", "staging");
///
///     assert!(validator.validate_account_access(&ok, &cancel).await.is_ok());
///     assert!(validator.validate_account_access(&bad, &cancel).await.is_err());
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockClientFactory {
    state: Arc<MockState>,
    create_delay: Option<Duration>,
}

impl MockClientFactory {
    /// Creates a factory whose clients always succeed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every client construction (widens race windows in tests).
    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = Some(delay);
        self
    }

    /// Makes client construction fail for an account.
    pub fn fail_create(&self, account_id: &str, message: impl Into<String>) {
        MockState::set(&self.state.create_failures, account_id, Some(message.into()));
    }

    /// Removes an injected construction failure.
    pub fn clear_create_failure(&self, account_id: &str) {
        MockState::set::<String>(&self.state.create_failures, account_id, None);
    }

    /// Makes probes fail for an account.
    pub fn fail_probe(&self, account_id: &str, message: impl Into<String>) {
        MockState::set(&self.state.probe_failures, account_id, Some(message.into()));
    }

    /// Removes an injected probe failure.
    pub fn clear_probe_failure(&self, account_id: &str) {
        MockState::set::<String>(&self.state.probe_failures, account_id, None);
    }

    /// Delays every probe for an account.
    pub fn set_probe_delay(&self, account_id: &str, delay: Duration) {
        MockState::set(&self.state.probe_delays, account_id, Some(delay));
    }

    /// Number of clients built so far.
    pub fn created(&self) -> usize {
        self.state.created.load(Ordering::SeqCst)
    }

    /// Number of probes started for an account.
    pub fn probes(&self, account_id: &str) -> usize {
        MockState::lookup(&self.state.probes, account_id).unwrap_or(0)
    }

    /// Number of probes started across all accounts.
    pub fn total_probes(&self) -> usize {
        self.state
            .probes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .sum()
    }
}

#[async_trait]
impl ClientFactory for MockClientFactory {
    type Client = MockClient;

    fn name(&self) -> &str {
        "mock"
    }

    async fn create_client(&self, account: &AccountDescriptor, region: &str) -> Result<MockClient> {
        if let Some(delay) = self.create_delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = MockState::lookup(&self.state.create_failures, &account.account_id) {
            return Err(CredwatchError::CredentialResolution(message));
        }

        self.state.created.fetch_add(1, Ordering::SeqCst);

        Ok(MockClient {
            id: self.state.next_id.fetch_add(1, Ordering::SeqCst),
            account_id: account.account_id.clone(),
            region: region.to_string(),
            state: Arc::clone(&self.state),
        })
    }
}

/// In-memory client produced by [`MockClientFactory`].
#[derive(Debug)]
pub struct MockClient {
    id: u64,
    account_id: String,
    region: String,
    state: Arc<MockState>,
}

impl MockClient {
    /// Unique id of this client instance.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Account the client is bound to.
    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// Region the client is bound to.
    pub fn region(&self) -> &str {
        &self.region
    }
}

#[async_trait]
impl ProbeClient for MockClient {
    async fn probe(&self, _account: &AccountDescriptor) -> Result<()> {
        {
            let mut probes = self
                .state
                .probes
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            *probes.entry(self.account_id.clone()).or_insert(0) += 1;
        }

        if let Some(delay) = MockState::lookup(&self.state.probe_delays, &self.account_id) {
            tokio::time::sleep(delay).await;
        }

        match MockState::lookup(&self.state.probe_failures, &self.account_id) {
            Some(message) => Err(CredwatchError::Connectivity(message)),
            None => Ok(()),
        }
    }
}
