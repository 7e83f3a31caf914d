//! Error types for credential resolution and account health checks.

use std::time::Duration;
use thiserror::Error;

/// Result type alias using [`CredwatchError`].
pub type Result<T> = std::result::Result<T, CredwatchError>;

/// Errors that can occur while resolving credentials or checking accounts.
///
/// All errors implement `std::error::Error` and can be chained with `source()`.
#[derive(Debug, Error)]
pub enum CredwatchError {
    /// Default credential chain or role assumption failed.
    #[error("credential resolution failed: {0}")]
    CredentialResolution(String),

    /// The proving API call failed.
    #[error("connectivity check failed: {0}")]
    Connectivity(String),

    /// Account descriptor is malformed.
    #[error("invalid account configuration: {0}")]
    Configuration(String),

    /// The check did not finish within the per-check timeout.
    #[error("access check timed out after {timeout:?}")]
    CheckTimedOut {
        /// Timeout that elapsed
        timeout: Duration,
    },

    /// The check was interrupted because the monitor is shutting down.
    #[error("access check cancelled")]
    Cancelled,

    /// Account check failed with context.
    #[error("account {account_id}: {source}")]
    AccountCheck {
        /// Account identifier
        account_id: String,
        /// Underlying error
        #[source]
        source: Box<CredwatchError>,
    },

    /// Every checked account is failing.
    #[error("all checked accounts are failing credential validation ({failed}/{total} accounts failed): {details}")]
    AccountsUnhealthy {
        /// Number of failing accounts
        failed: usize,
        /// Number of configured accounts
        total: usize,
        /// Per-account failure listing
        details: String,
    },

    /// Other error (catch-all).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CredwatchError {
    /// Wraps an error with the account it happened on.
    ///
    /// # Example
    ///
    /// ```
    /// use credwatch::CredwatchError;
    ///
    /// let err = CredwatchError::Connectivity("ExpiredToken".to_string());
    /// let wrapped = CredwatchError::account_check("123456789012", err);
    ///
    /// assert_eq!(
    ///     wrapped.to_string(),
    ///     "account 123456789012: connectivity check failed: ExpiredToken"
    /// );
    /// ```
    pub fn account_check(account_id: impl Into<String>, err: CredwatchError) -> Self {
        Self::AccountCheck {
            account_id: account_id.into(),
            source: Box::new(err),
        }
    }

    /// Returns true if the root cause is a credential resolution failure.
    pub fn is_credential_error(&self) -> bool {
        match self {
            Self::CredentialResolution(_) => true,
            Self::AccountCheck { source, .. } => source.is_credential_error(),
            _ => false,
        }
    }

    /// Returns true if the root cause is a cancelled check.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::AccountCheck { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_error_display() {
        let err = CredwatchError::CredentialResolution("no providers in chain".to_string());
        assert_eq!(
            err.to_string(),
            "credential resolution failed: no providers in chain"
        );
    }

    #[test]
    fn test_account_check_error() {
        let inner = CredwatchError::CheckTimedOut {
            timeout: Duration::from_secs(30),
        };
        let err = CredwatchError::account_check("111111111111", inner);

        let error_string = err.to_string();
        assert!(error_string.contains("111111111111"));
        assert!(error_string.contains("timed out"));
    }

    #[test]
    fn test_error_source_chain() {
        let inner = CredwatchError::Connectivity("dns".to_string());
        let outer = CredwatchError::account_check("222222222222", inner);

        assert!(outer.source().is_some());
    }

    #[test]
    fn test_is_credential_error() {
        let wrapped = CredwatchError::account_check(
            "333333333333",
            CredwatchError::CredentialResolution("AccessDenied".to_string()),
        );
        assert!(wrapped.is_credential_error());
        assert!(!CredwatchError::Connectivity("x".to_string()).is_credential_error());
    }

    #[test]
    fn test_is_cancelled() {
        let wrapped = CredwatchError::account_check("444444444444", CredwatchError::Cancelled);
        assert!(wrapped.is_cancelled());
        assert!(!wrapped.is_credential_error());
        assert_eq!(wrapped.to_string(), "account 444444444444: access check cancelled");
    }

    #[test]
    fn test_other_is_transparent() {
        let err: CredwatchError = anyhow::anyhow!("unexpected STS response").into();
        assert!(matches!(err, CredwatchError::Other(_)));
        assert_eq!(err.to_string(), "unexpected STS response");
    }
}
