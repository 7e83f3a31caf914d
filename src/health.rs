//! Readiness probe over the monitor's cached status.

use crate::monitor::{AccountStatus, MonitorSummary};
use crate::{CredentialMonitor, CredwatchError, Result};
use anyhow::Context;
use serde::Serialize;
use std::sync::Arc;

/// Readiness check backed by a [`CredentialMonitor`].
///
/// Reads only the monitor's cached results: no network calls, no cache
/// writes. Probes can therefore be polled every few seconds regardless of
/// the monitor's check interval. Mount it as a readiness (not liveness)
/// probe: a total credential outage should stop traffic, not restart the
/// process.
#[derive(Clone)]
pub struct HealthChecker {
    monitor: Arc<CredentialMonitor>,
}

/// Serializable snapshot for status endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Probe name
    pub name: &'static str,
    /// Whether the readiness check passes
    pub ready: bool,
    /// Failure message when not ready
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Counts over the configured accounts
    pub summary: MonitorSummary,
    /// Last recorded status per checked account
    pub accounts: Vec<AccountStatus>,
}

impl HealthChecker {
    /// Probe name used when registering with a health framework.
    pub const NAME: &'static str = "cloud-credentials";

    /// Creates a checker over a shared monitor.
    pub fn new(monitor: Arc<CredentialMonitor>) -> Self {
        Self { monitor }
    }

    /// Returns the probe name.
    pub fn name(&self) -> &'static str {
        Self::NAME
    }

    /// Runs the readiness check.
    ///
    /// # Errors
    ///
    /// Returns [`CredwatchError::AccountsUnhealthy`](crate::CredwatchError::AccountsUnhealthy)
    /// listing every failing account when all checked accounts fail.
    pub async fn check(&self) -> Result<()> {
        self.monitor.status().await
    }

    /// Builds a full report for a JSON status endpoint.
    ///
    /// Every field comes from one snapshot of the monitor, so `ready` always
    /// agrees with `summary` and `accounts`.
    pub async fn report(&self) -> HealthReport {
        let snapshot = self.monitor.snapshot().await;

        HealthReport {
            name: Self::NAME,
            ready: snapshot.status.is_ok(),
            message: snapshot.status.err().map(|e| e.to_string()),
            summary: snapshot.summary,
            accounts: snapshot.accounts,
        }
    }
}

impl HealthReport {
    /// Renders the report as a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`CredwatchError::Other`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .context("failed to serialize health report")
            .map_err(CredwatchError::from)
    }

    /// Renders the report as indented JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CredwatchError::Other`] if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .context("failed to serialize health report")
            .map_err(CredwatchError::from)
    }
}
