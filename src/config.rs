//! Configuration for the credential monitor.

use crate::AccountDescriptor;
use std::time::Duration;

/// Check interval used when none (or zero) is configured.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(600);

/// Upper bound for a derived per-check timeout.
pub const MAX_DERIVED_CHECK_TIMEOUT: Duration = Duration::from_secs(60);

/// Number of accounts checked concurrently within a pass by default.
pub const DEFAULT_MAX_CONCURRENT_CHECKS: usize = 4;

/// Configuration for a [`CredentialMonitor`](crate::CredentialMonitor).
///
/// Use the builder pattern for ergonomic configuration:
///
/// ```
/// use credwatch::{AccountDescriptor, MonitorConfig};
/// use std::time::Duration;
///
/// let config = MonitorConfig::new(vec![
///     AccountDescriptor::new("111111111111", "production"),
///     AccountDescriptor::new("222222222222", "staging"),
/// ])
/// .with_check_interval(Duration::from_secs(300))
/// .with_max_concurrent_checks(2);
///
/// assert_eq!(config.effective_interval(), Duration::from_secs(300));
/// assert_eq!(config.effective_check_timeout(), Duration::from_secs(60));
/// ```
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Accounts to monitor, in configuration order
    pub accounts: Vec<AccountDescriptor>,

    /// Time between passes (zero means [`DEFAULT_CHECK_INTERVAL`])
    pub check_interval: Duration,

    /// Per-account check timeout (derived from the interval when unset)
    pub check_timeout: Option<Duration>,

    /// Accounts validated concurrently within one pass
    pub max_concurrent_checks: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            accounts: Vec::new(),
            check_interval: DEFAULT_CHECK_INTERVAL,
            check_timeout: None,
            max_concurrent_checks: DEFAULT_MAX_CONCURRENT_CHECKS,
        }
    }
}

impl MonitorConfig {
    /// Creates a configuration for the given accounts with default timing.
    pub fn new(accounts: Vec<AccountDescriptor>) -> Self {
        Self {
            accounts,
            ..Default::default()
        }
    }

    /// Sets the interval between passes.
    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    /// Sets an explicit per-check timeout.
    ///
    /// Ignored if it is not shorter than the effective interval.
    pub fn with_check_timeout(mut self, timeout: Duration) -> Self {
        self.check_timeout = Some(timeout);
        self
    }

    /// Sets how many accounts are validated concurrently within a pass.
    pub fn with_max_concurrent_checks(mut self, max: usize) -> Self {
        self.max_concurrent_checks = max;
        self
    }

    /// Interval actually used by the scheduler.
    pub fn effective_interval(&self) -> Duration {
        if self.check_interval.is_zero() {
            DEFAULT_CHECK_INTERVAL
        } else {
            self.check_interval
        }
    }

    /// Per-check timeout actually used by the scheduler.
    ///
    /// Always shorter than the interval so one hanging account cannot hold
    /// a pass past the next tick.
    pub fn effective_check_timeout(&self) -> Duration {
        let interval = self.effective_interval();
        match self.check_timeout {
            Some(timeout) if !timeout.is_zero() && timeout < interval => timeout,
            _ => (interval / 2).min(MAX_DERIVED_CHECK_TIMEOUT),
        }
    }

    /// Concurrency actually used within a pass (at least one).
    pub fn effective_concurrency(&self) -> usize {
        self.max_concurrent_checks.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MonitorConfig::default();
        assert!(config.accounts.is_empty());
        assert_eq!(config.effective_interval(), Duration::from_secs(600));
        assert_eq!(config.effective_check_timeout(), MAX_DERIVED_CHECK_TIMEOUT);
        assert_eq!(config.effective_concurrency(), DEFAULT_MAX_CONCURRENT_CHECKS);
    }

    #[test]
    fn test_zero_interval_uses_default() {
        let config = MonitorConfig::default().with_check_interval(Duration::ZERO);
        assert_eq!(config.effective_interval(), DEFAULT_CHECK_INTERVAL);
    }

    #[test]
    fn test_short_interval_derives_half() {
        let config = MonitorConfig::default().with_check_interval(Duration::from_secs(10));
        assert_eq!(config.effective_check_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_explicit_timeout() {
        let config = MonitorConfig::default()
            .with_check_interval(Duration::from_secs(600))
            .with_check_timeout(Duration::from_secs(90));
        assert_eq!(config.effective_check_timeout(), Duration::from_secs(90));

        let too_long = MonitorConfig::default()
            .with_check_interval(Duration::from_secs(10))
            .with_check_timeout(Duration::from_secs(30));
        assert_eq!(too_long.effective_check_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_zero_concurrency_clamped() {
        let config = MonitorConfig::default().with_max_concurrent_checks(0);
        assert_eq!(config.effective_concurrency(), 1);
    }
}
