//! AWS client factory and STS-backed client.

use crate::backend::{ClientFactory, ProbeClient};
use crate::backends::aws::credentials::resolve_credentials;
use crate::validation::validate_account;
use crate::{AccountDescriptor, CredwatchError, Result, DEFAULT_REGION};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_sts::error::DisplayErrorContext;
use tokio::sync::OnceCell;

/// Builds per-account AWS clients.
///
/// The ambient identity (environment, shared config, instance role) is
/// loaded once and used both for accounts without a role and as the source
/// identity for role assumption.
pub struct AWSClientFactory {
    base_region: String,
    endpoint: Option<String>,
    base_config: OnceCell<SdkConfig>,
}

impl AWSClientFactory {
    /// Creates a factory whose ambient identity resolves in `us-east-1`.
    pub fn new() -> Self {
        Self {
            base_region: DEFAULT_REGION.to_string(),
            endpoint: None,
            base_config: OnceCell::new(),
        }
    }

    /// Sets the region used to load the ambient identity and reach STS.
    pub fn with_base_region(mut self, region: impl Into<String>) -> Self {
        self.base_region = region.into();
        self
    }

    /// Sends every request to a custom endpoint (for LocalStack testing).
    pub fn with_endpoint_url(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    fn loader(&self, region: &str) -> aws_config::ConfigLoader {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()));

        if let Some(ref endpoint) = self.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        loader
    }

    async fn base_config(&self) -> &SdkConfig {
        self.base_config
            .get_or_init(|| self.loader(&self.base_region).load())
            .await
    }
}

impl Default for AWSClientFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClientFactory for AWSClientFactory {
    type Client = AWSClient;

    fn name(&self) -> &str {
        "aws"
    }

    async fn create_client(&self, account: &AccountDescriptor, region: &str) -> Result<AWSClient> {
        validate_account(account)?;

        let base = self.base_config().await;
        let credentials = resolve_credentials(base, account, region).await?;

        let config = self
            .loader(region)
            .credentials_provider(credentials)
            .load()
            .await;

        Ok(AWSClient {
            region: region.to_string(),
            sts: aws_sdk_sts::Client::new(&config),
            config,
        })
    }
}

/// Client handle for one AWS account and region.
///
/// Holds the account's [`SdkConfig`] so other components can build service
/// clients (EC2, pricing, ...) on the same cached, auto-refreshing
/// credentials.
#[derive(Debug, Clone)]
pub struct AWSClient {
    region: String,
    config: SdkConfig,
    sts: aws_sdk_sts::Client,
}

impl AWSClient {
    /// Region the client is bound to.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// SDK configuration carrying the account's credentials.
    pub fn sdk_config(&self) -> &SdkConfig {
        &self.config
    }

    /// STS client bound to the account's credentials.
    pub fn sts(&self) -> &aws_sdk_sts::Client {
        &self.sts
    }
}

#[async_trait]
impl ProbeClient for AWSClient {
    /// Calls STS `GetCallerIdentity`, which needs no IAM permission and
    /// costs nothing.
    async fn probe(&self, account: &AccountDescriptor) -> Result<()> {
        let identity = self
            .sts
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| {
                CredwatchError::Connectivity(format!(
                    "STS GetCallerIdentity failed: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        match identity.account() {
            Some(caller) if caller != account.account_id => {
                tracing::warn!(
                    account_id = %account.account_id,
                    caller_account = caller,
                    arn = identity.arn().unwrap_or_default(),
                    "credentials resolve to a different account than configured"
                );
            }
            _ => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_descriptor_rejected_before_sdk() {
        let factory = AWSClientFactory::new();
        let account = AccountDescriptor::new("111111111111", "prod").with_role_arn("Reader");

        let err = factory.create_client(&account, "us-east-1").await.unwrap_err();
        assert!(matches!(err, CredwatchError::Configuration(_)));
    }

    #[test]
    fn test_factory_builder() {
        let factory = AWSClientFactory::new()
            .with_base_region("eu-west-1")
            .with_endpoint_url("http://localhost:4566");

        assert_eq!(factory.name(), "aws");
        assert_eq!(factory.base_region, "eu-west-1");
        assert_eq!(factory.endpoint.as_deref(), Some("http://localhost:4566"));
    }
}
