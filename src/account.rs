//! Account descriptors and client cache keys.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Region used when a descriptor does not name one.
pub const DEFAULT_REGION: &str = "us-east-1";

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

/// A cloud account the process is allowed to access.
///
/// Descriptors are created once when configuration is loaded and never
/// mutated afterwards. When `role_arn` is set, access goes through a
/// short-lived role assumption into the target account; otherwise the
/// process's ambient identity is used directly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountDescriptor {
    /// Account identifier (e.g. a 12-digit AWS account id)
    pub account_id: String,

    /// Human-readable name used in logs, metrics and health messages
    pub name: String,

    /// Role to assume in the target account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_arn: Option<String>,

    /// External id required by the role's trust policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,

    /// Session name recorded in the target account's audit trail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_name: Option<String>,

    /// Default region for clients of this account
    #[serde(default = "default_region")]
    pub region: String,
}

impl AccountDescriptor {
    /// Creates a descriptor that uses the ambient identity in the default region.
    ///
    /// # Example
    ///
    /// ```
    /// use credwatch::AccountDescriptor;
    ///
    /// let account = AccountDescriptor::new("123456789012", "production")
    ///     .with_role_arn("arn:aws:iam::123456789012:role/CostReader")
    ///     .with_region("eu-west-1");
    ///
    /// assert!(account.assumes_role());
    /// assert_eq!(account.region, "eu-west-1");
    /// ```
    pub fn new(account_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            name: name.into(),
            role_arn: None,
            external_id: None,
            session_name: None,
            region: default_region(),
        }
    }

    /// Sets the role to assume in the target account.
    pub fn with_role_arn(mut self, role_arn: impl Into<String>) -> Self {
        self.role_arn = Some(role_arn.into());
        self
    }

    /// Sets the external id passed on role assumption.
    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    /// Sets an explicit role session name.
    pub fn with_session_name(mut self, session_name: impl Into<String>) -> Self {
        self.session_name = Some(session_name.into());
        self
    }

    /// Sets the default region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Returns true if access requires assuming a role.
    pub fn assumes_role(&self) -> bool {
        self.role_arn.is_some()
    }

    /// Cache key for this account in its default region.
    pub fn client_key(&self) -> ClientKey {
        ClientKey::new(&self.account_id, &self.region)
    }
}

impl fmt::Display for AccountDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.account_id)
    }
}

/// Client cache key.
///
/// A struct rather than a joined string, so ids or regions containing a
/// separator character can never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientKey {
    /// Account identifier
    pub account_id: String,
    /// Region the client is bound to
    pub region: String,
}

impl ClientKey {
    /// Creates a key for an account and region.
    pub fn new(account_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            region: region.into(),
        }
    }
}

impl fmt::Display for ClientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.account_id, self.region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_descriptor_builder() {
        let account = AccountDescriptor::new("111111111111", "prod")
            .with_role_arn("arn:aws:iam::111111111111:role/Reader")
            .with_external_id("ext-1")
            .with_session_name("billing")
            .with_region("us-west-2");

        assert_eq!(account.account_id, "111111111111");
        assert_eq!(account.external_id.as_deref(), Some("ext-1"));
        assert_eq!(account.session_name.as_deref(), Some("billing"));
        assert_eq!(account.client_key(), ClientKey::new("111111111111", "us-west-2"));
        assert_eq!(account.to_string(), "prod (111111111111)");
    }

    #[test]
    fn test_descriptor_deserialize_defaults() {
        let account: AccountDescriptor =
            serde_json::from_str(r#"{"account_id": "222222222222", "name": "staging"}"#).unwrap();

        assert_eq!(account.region, DEFAULT_REGION);
        assert!(!account.assumes_role());
        assert!(account.external_id.is_none());
    }

    #[test]
    fn test_client_key_no_separator_collision() {
        // "a:b" + "c" and "a" + "b:c" would collide as joined strings.
        let first = ClientKey::new("a:b", "c");
        let second = ClientKey::new("a", "b:c");

        let keys: HashSet<_> = [first, second].into_iter().collect();
        assert_eq!(keys.len(), 2);
    }
}
