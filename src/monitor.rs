//! Background credential health monitoring.
//!
//! The [`CredentialMonitor`] owns one scheduled task that re-validates every
//! configured account on a fixed interval and caches the per-account outcome.
//! Readers ([`HealthChecker`](crate::HealthChecker), status endpoints) only
//! ever look at the cache, so probing readiness never costs an API call.
//!
//! # Aggregation
//!
//! ```text
//! no accounts configured            -> healthy
//! nothing checked yet               -> healthy (cold start)
//! >= 1 checked account healthy      -> healthy (degraded accounts are logged)
//! every checked account unhealthy   -> error listing each failing account
//! ```

use crate::metrics::{CheckOutcome, MetricsSink};
use crate::{AccountDescriptor, AccountValidator, CredwatchError, MonitorConfig, Result};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Last recorded check result for one account.
///
/// Records are replaced wholesale on every check; callers always receive
/// owned copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountStatus {
    /// Account identifier
    pub account_id: String,

    /// Account display name
    pub account_name: String,

    /// When the last check finished
    pub last_checked: DateTime<Utc>,

    /// Error text of the last check, if it failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,

    /// Whether the last check succeeded
    pub healthy: bool,

    /// How long the last check took, in milliseconds
    pub last_duration_ms: u64,
}

/// Counts over the configured accounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorSummary {
    /// Accounts in the configuration
    pub configured: usize,
    /// Accounts with at least one recorded check
    pub checked: usize,
    /// Checked accounts whose last check succeeded
    pub healthy: usize,
    /// Checked accounts whose last check failed
    pub unhealthy: usize,
}

impl MonitorSummary {
    /// Some checked accounts fail while at least one is healthy.
    pub fn is_degraded(&self) -> bool {
        self.healthy > 0 && self.unhealthy > 0
    }
}

struct MonitorInner {
    accounts: Vec<AccountDescriptor>,
    validator: Arc<dyn AccountValidator>,
    metrics: Arc<dyn MetricsSink>,
    interval: Duration,
    check_timeout: Duration,
    concurrency: usize,
    statuses: RwLock<HashMap<String, AccountStatus>>,
    cancel: CancellationToken,
    // Serializes passes so a manual pass never interleaves with a scheduled one.
    pass_lock: tokio::sync::Mutex<()>,
}

/// Periodically validates every configured account and caches the results.
///
/// # Example
///
/// ```
/// use credwatch::backends::mock::MockClientFactory;
/// use credwatch::metrics::NoopMetrics;
/// use credwatch::{
///     AccountDescriptor, ClientCache, ClientValidator, CredentialMonitor, MonitorConfig,
/// };
/// use std::sync::Arc;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let config = MonitorConfig::new(vec![AccountDescriptor::new("111111111111", "prod")]);
///     let validator = ClientValidator::new(Arc::new(ClientCache::new(MockClientFactory::new())));
///     let monitor = CredentialMonitor::new(config, Arc::new(validator), Arc::new(NoopMetrics));
///
///     monitor.check_all_accounts().await;
///
///     assert!(monitor.status().await.is_ok());
///     assert!(monitor.account_status("111111111111").await.unwrap().healthy);
/// }
/// ```
pub struct CredentialMonitor {
    inner: Arc<MonitorInner>,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// Consistent view of the monitor taken under one read of its state.
#[derive(Debug)]
pub struct MonitorSnapshot {
    /// Aggregate health under the graceful-degradation policy
    pub status: Result<()>,
    /// Counts over the configured accounts
    pub summary: MonitorSummary,
    /// Recorded statuses, in configuration order
    pub accounts: Vec<AccountStatus>,
}

impl CredentialMonitor {
    /// Creates a monitor. Nothing runs until [`start`](Self::start) is called.
    ///
    /// Accounts sharing an id with an earlier account are dropped with a
    /// warning, since statuses are keyed by account id.
    pub fn new(
        config: MonitorConfig,
        validator: Arc<dyn AccountValidator>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        let interval = config.effective_interval();
        let check_timeout = config.effective_check_timeout();
        let concurrency = config.effective_concurrency();

        let mut seen = HashSet::new();
        let accounts = config
            .accounts
            .into_iter()
            .filter(|account| {
                let first = seen.insert(account.account_id.clone());
                if !first {
                    tracing::warn!(
                        account_id = %account.account_id,
                        account_name = %account.name,
                        "duplicate account id in monitor configuration, ignoring"
                    );
                }
                first
            })
            .collect();

        Self {
            inner: Arc::new(MonitorInner {
                accounts,
                validator,
                metrics,
                interval,
                check_timeout,
                concurrency,
                statuses: RwLock::new(HashMap::new()),
                cancel: CancellationToken::new(),
                pass_lock: tokio::sync::Mutex::new(()),
            }),
            task: Mutex::new(None),
        }
    }

    /// Configured accounts, in configuration order.
    pub fn accounts(&self) -> &[AccountDescriptor] {
        &self.inner.accounts
    }

    /// Interval between passes.
    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    /// Timeout applied to each account check.
    pub fn check_timeout(&self) -> Duration {
        self.inner.check_timeout
    }

    /// Launches the background loop.
    ///
    /// The first pass runs immediately, then one pass per interval until
    /// [`stop`](Self::stop). Calling `start` again, or after `stop`, does
    /// nothing. Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);

        if task.is_some() {
            tracing::warn!("credential monitor already started");
            return;
        }

        if self.inner.cancel.is_cancelled() {
            tracing::warn!("credential monitor was stopped and cannot be restarted");
            return;
        }

        let inner = Arc::clone(&self.inner);
        *task = Some(tokio::spawn(inner.run()));
    }

    /// Signals the background loop to exit.
    ///
    /// The signal reaches in-flight validator calls; interrupted checks are
    /// not recorded. No new pass starts afterwards.
    pub fn stop(&self) {
        self.inner.cancel.cancel();
    }

    /// Stops the loop and waits for it to exit.
    pub async fn shutdown(&self) {
        self.stop();

        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "credential monitor task failed");
            }
        }
    }

    /// Returns true while the background loop is running.
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Runs one pass over every configured account.
    ///
    /// Individual failures are recorded, never propagated. Does nothing once
    /// the monitor is stopped.
    pub async fn check_all_accounts(&self) {
        self.inner.check_all_accounts().await;
    }

    /// Aggregate health under the graceful-degradation policy.
    ///
    /// # Errors
    ///
    /// Returns [`CredwatchError::AccountsUnhealthy`] only when at least one
    /// account has been checked and every checked account is failing.
    pub async fn status(&self) -> Result<()> {
        self.inner.status().await
    }

    /// Returns a copy of the last recorded status for an account, or `None`
    /// if it has never been checked.
    pub async fn account_status(&self, account_id: &str) -> Option<AccountStatus> {
        self.inner.statuses.read().await.get(account_id).cloned()
    }

    /// Returns copies of all recorded statuses, in configuration order.
    pub async fn account_statuses(&self) -> Vec<AccountStatus> {
        let statuses = self.inner.statuses.read().await;
        self.inner
            .accounts
            .iter()
            .filter_map(|account| statuses.get(&account.account_id).cloned())
            .collect()
    }

    /// Counts over the configured accounts.
    pub async fn summary(&self) -> MonitorSummary {
        self.inner.summary().await
    }

    /// Status, summary and per-account records read under a single lock,
    /// so a concurrent pass cannot make them disagree.
    pub async fn snapshot(&self) -> MonitorSnapshot {
        self.inner.snapshot().await
    }
}

impl Drop for CredentialMonitor {
    fn drop(&mut self) {
        self.inner.cancel.cancel();
    }
}

impl MonitorInner {
    async fn run(self: Arc<Self>) {
        tracing::info!(
            accounts = self.accounts.len(),
            interval_secs = self.interval.as_secs(),
            check_timeout_secs = self.check_timeout.as_secs(),
            "credential monitor started"
        );

        // First tick completes immediately.
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                _ = ticker.tick() => self.check_all_accounts().await,
            }
        }

        tracing::info!("credential monitor stopped");
    }

    async fn check_all_accounts(&self) {
        let _pass = self.pass_lock.lock().await;

        if self.cancel.is_cancelled() {
            tracing::debug!("credential monitor stopped, skipping credential check");
            return;
        }

        if self.accounts.is_empty() {
            tracing::debug!("no accounts configured, skipping credential check");
            return;
        }

        let started = Instant::now();

        let checks: Vec<_> = self
            .accounts
            .iter()
            .map(|account| self.check_account(account))
            .collect();

        stream::iter(checks)
            .buffer_unordered(self.concurrency)
            .collect::<Vec<()>>()
            .await;

        let (summary, failing) = self.tally(&*self.statuses.read().await);
        if summary.is_degraded() {
            tracing::warn!(
                healthy = summary.healthy,
                unhealthy = summary.unhealthy,
                failing = %failing.join("; "),
                "running in degraded mode, some accounts are failing credential validation"
            );
        }

        tracing::debug!(
            checked = summary.checked,
            healthy = summary.healthy,
            unhealthy = summary.unhealthy,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "credential check pass complete"
        );
    }

    async fn check_account(&self, account: &AccountDescriptor) {
        let started = Instant::now();

        let result = match tokio::time::timeout(
            self.check_timeout,
            self.validator.validate_account_access(account, &self.cancel),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(CredwatchError::account_check(
                &account.account_id,
                CredwatchError::CheckTimedOut {
                    timeout: self.check_timeout,
                },
            )),
        };

        let duration = started.elapsed();
        let checked_at = Utc::now();

        if let Err(ref e) = result {
            if e.is_cancelled() || self.cancel.is_cancelled() {
                tracing::debug!(
                    account_id = %account.account_id,
                    error = %e,
                    "account check interrupted by shutdown, not recorded"
                );
                return;
            }
        }

        let (outcome, last_error) = match result {
            Ok(()) => {
                tracing::debug!(
                    account_id = %account.account_id,
                    account_name = %account.name,
                    duration_ms = duration.as_millis() as u64,
                    "account credentials valid"
                );
                (CheckOutcome::Success, None)
            }
            Err(e) => {
                tracing::error!(
                    account_id = %account.account_id,
                    account_name = %account.name,
                    error = %e,
                    "account credential check failed"
                );
                (CheckOutcome::Failure, Some(e.to_string()))
            }
        };
        let healthy = outcome == CheckOutcome::Success;

        self.metrics.record_check(account, outcome, duration);
        self.metrics.set_last_checked(account, checked_at);
        self.metrics.set_healthy(account, healthy);

        let status = AccountStatus {
            account_id: account.account_id.clone(),
            account_name: account.name.clone(),
            last_checked: checked_at,
            last_error,
            healthy,
            last_duration_ms: duration.as_millis() as u64,
        };

        self.statuses
            .write()
            .await
            .insert(account.account_id.clone(), status);
    }

    async fn status(&self) -> Result<()> {
        let (summary, failing) = self.tally(&*self.statuses.read().await);
        self.evaluate(&summary, failing)
    }

    async fn summary(&self) -> MonitorSummary {
        self.tally(&*self.statuses.read().await).0
    }

    async fn snapshot(&self) -> MonitorSnapshot {
        let statuses = self.statuses.read().await;
        let (summary, failing) = self.tally(&statuses);
        let accounts = self
            .accounts
            .iter()
            .filter_map(|account| statuses.get(&account.account_id).cloned())
            .collect();
        drop(statuses);

        MonitorSnapshot {
            status: self.evaluate(&summary, failing),
            summary,
            accounts,
        }
    }

    fn evaluate(&self, summary: &MonitorSummary, failing: Vec<String>) -> Result<()> {
        if summary.configured == 0 || summary.checked == 0 || summary.unhealthy == 0 {
            return Ok(());
        }

        if summary.healthy > 0 {
            tracing::debug!(
                healthy = summary.healthy,
                unhealthy = summary.unhealthy,
                "credential status degraded but ready"
            );
            return Ok(());
        }

        Err(CredwatchError::AccountsUnhealthy {
            failed: failing.len(),
            total: self.accounts.len(),
            details: failing.join("; "),
        })
    }

    /// Counts checked accounts and describes each failing one as
    /// "name (id): cause". Unchecked accounts are skipped.
    fn tally(&self, statuses: &HashMap<String, AccountStatus>) -> (MonitorSummary, Vec<String>) {
        let mut summary = MonitorSummary {
            configured: self.accounts.len(),
            ..Default::default()
        };
        let mut failing = Vec::new();

        for account in &self.accounts {
            let Some(status) = statuses.get(&account.account_id) else {
                continue;
            };
            summary.checked += 1;
            if status.healthy {
                summary.healthy += 1;
            } else {
                summary.unhealthy += 1;
                failing.push(format!(
                    "{} ({}): {}",
                    account.name,
                    account.account_id,
                    status.last_error.as_deref().unwrap_or("unknown error")
                ));
            }
        }

        (summary, failing)
    }
}
