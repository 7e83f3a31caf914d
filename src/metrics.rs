//! Metrics emitted by the credential monitor.
//!
//! The monitor never reaches into a process-wide registry on its own: a
//! [`MetricsSink`] is injected at construction. [`MetricsFacade`] forwards to
//! the `metrics` crate facade, so whichever recorder/exporter the embedding
//! process installed receives the series below:
//!
//! - `credwatch_checks_total{account_id,account_name,outcome}` - Counter of checks
//! - `credwatch_check_duration_seconds{account_id,account_name}` - Histogram of check durations
//! - `credwatch_last_checked_timestamp_seconds{account_id,account_name}` - Gauge, unix seconds
//! - `credwatch_account_healthy{account_id,account_name}` - Gauge, 1 healthy / 0 unhealthy

use crate::AccountDescriptor;
use chrono::{DateTime, Utc};
use ::metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::fmt;
use std::time::Duration;

/// Outcome of one account check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckOutcome {
    /// The validator returned no error
    Success,
    /// The validator returned an error or timed out
    Failure,
}

impl CheckOutcome {
    /// Label value for this outcome.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives per-check observations from the monitor.
///
/// Backend-agnostic; implementations must be cheap and must not block.
pub trait MetricsSink: Send + Sync {
    /// Counts one check and observes its duration.
    fn record_check(&self, account: &AccountDescriptor, outcome: CheckOutcome, duration: Duration);

    /// Records when the account was last checked.
    fn set_last_checked(&self, account: &AccountDescriptor, at: DateTime<Utc>);

    /// Records whether the account is currently healthy.
    fn set_healthy(&self, account: &AccountDescriptor, healthy: bool);
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn record_check(&self, _: &AccountDescriptor, _: CheckOutcome, _: Duration) {}

    fn set_last_checked(&self, _: &AccountDescriptor, _: DateTime<Utc>) {}

    fn set_healthy(&self, _: &AccountDescriptor, _: bool) {}
}

/// Sink that emits through the `metrics` crate facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsFacade;

impl MetricsFacade {
    /// Registers metric descriptions with the installed recorder.
    ///
    /// Call once after the embedding process installs its recorder.
    pub fn describe_metrics() {
        describe_counter!(
            "credwatch_checks_total",
            "Total number of account credential checks by outcome"
        );
        describe_histogram!(
            "credwatch_check_duration_seconds",
            "Account credential check duration in seconds"
        );
        describe_gauge!(
            "credwatch_last_checked_timestamp_seconds",
            "Unix time of the last credential check per account"
        );
        describe_gauge!(
            "credwatch_account_healthy",
            "Whether the last credential check succeeded (1) or failed (0)"
        );
    }
}

impl MetricsSink for MetricsFacade {
    fn record_check(&self, account: &AccountDescriptor, outcome: CheckOutcome, duration: Duration) {
        counter!(
            "credwatch_checks_total",
            "account_id" => account.account_id.clone(),
            "account_name" => account.name.clone(),
            "outcome" => outcome.as_str()
        )
        .increment(1);
        histogram!(
            "credwatch_check_duration_seconds",
            "account_id" => account.account_id.clone(),
            "account_name" => account.name.clone()
        )
        .record(duration.as_secs_f64());
    }

    fn set_last_checked(&self, account: &AccountDescriptor, at: DateTime<Utc>) {
        gauge!(
            "credwatch_last_checked_timestamp_seconds",
            "account_id" => account.account_id.clone(),
            "account_name" => account.name.clone()
        )
        .set(at.timestamp_millis() as f64 / 1000.0);
    }

    fn set_healthy(&self, account: &AccountDescriptor, healthy: bool) {
        gauge!(
            "credwatch_account_healthy",
            "account_id" => account.account_id.clone(),
            "account_name" => account.name.clone()
        )
        .set(if healthy { 1.0 } else { 0.0 });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_labels() {
        assert_eq!(CheckOutcome::Success.to_string(), "success");
        assert_eq!(CheckOutcome::Failure.as_str(), "failure");
    }

    #[test]
    fn test_facade_without_recorder_is_noop() {
        let account = AccountDescriptor::new("111111111111", "prod");
        let sink = MetricsFacade;

        MetricsFacade::describe_metrics();
        sink.record_check(&account, CheckOutcome::Success, Duration::from_millis(120));
        sink.set_last_checked(&account, Utc::now());
        sink.set_healthy(&account, true);
    }
}
