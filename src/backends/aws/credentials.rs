//! Credential resolution for AWS accounts.

use crate::validation::{is_session_name_char, MAX_SESSION_NAME_LENGTH};
use crate::{AccountDescriptor, CredwatchError, Result};
use aws_config::default_provider::credentials::DefaultCredentialsChain;
use aws_config::sts::AssumeRoleProvider;
use aws_config::{Region, SdkConfig};
use aws_credential_types::provider::{future, ProvideCredentials, SharedCredentialsProvider};
use aws_credential_types::Credentials;
use aws_sdk_sts::error::DisplayErrorContext;
use std::sync::{Mutex, PoisonError};

/// Prefix of derived role session names.
pub const SESSION_NAME_PREFIX: &str = "credwatch";

/// Session name recorded in the target account's CloudTrail.
///
/// Uses the descriptor's explicit name when set, otherwise
/// `credwatch-<account_id>`. Characters STS rejects are replaced with `-`
/// and the result is truncated to 64 characters.
///
/// # Example
///
/// ```
/// use credwatch::backends::aws::session_name_for;
/// use credwatch::AccountDescriptor;
///
/// let account = AccountDescriptor::new("123456789012", "prod");
/// assert_eq!(session_name_for(&account), "credwatch-123456789012");
/// ```
pub fn session_name_for(account: &AccountDescriptor) -> String {
    let raw = match account.session_name {
        Some(ref name) => name.clone(),
        None => format!("{}-{}", SESSION_NAME_PREFIX, account.account_id),
    };

    let mut name: String = raw
        .chars()
        .map(|c| if is_session_name_char(c) { c } else { '-' })
        .collect();
    name.truncate(MAX_SESSION_NAME_LENGTH);
    name
}

/// Credentials provider that hands out an already-resolved set once.
///
/// Resolution happens eagerly when a client is built so failures surface as
/// [`CredwatchError::CredentialResolution`] before any client is cached. The
/// SDK's identity cache then receives those credentials on its first request
/// instead of resolving (and assuming the role) a second time; later
/// refreshes go to the wrapped provider.
#[derive(Debug)]
pub(crate) struct PrimedCredentials<P> {
    primed: Mutex<Option<Credentials>>,
    inner: P,
}

impl<P: ProvideCredentials> PrimedCredentials<P> {
    /// Resolves credentials from `inner` and keeps them for the first request.
    pub(crate) async fn resolve(inner: P) -> Result<Self> {
        let credentials = inner
            .provide_credentials()
            .await
            .map_err(|e| CredwatchError::CredentialResolution(DisplayErrorContext(&e).to_string()))?;

        Ok(Self {
            primed: Mutex::new(Some(credentials)),
            inner,
        })
    }
}

impl<P: ProvideCredentials> ProvideCredentials for PrimedCredentials<P> {
    fn provide_credentials<'a>(&'a self) -> future::ProvideCredentials<'a>
    where
        Self: 'a,
    {
        let primed = self
            .primed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match primed {
            Some(credentials) => future::ProvideCredentials::ready(Ok(credentials)),
            None => self.inner.provide_credentials(),
        }
    }
}

/// Builds the credentials provider for an account.
///
/// Without a role the ambient default chain is used. With a role, the
/// ambient identity from `base` assumes it; the SDK refreshes the assumed
/// credentials before they expire.
///
/// # Errors
///
/// Returns [`CredwatchError::CredentialResolution`] if the chain yields no
/// credentials or the role cannot be assumed.
pub(crate) async fn resolve_credentials(
    base: &SdkConfig,
    account: &AccountDescriptor,
    region: &str,
) -> Result<SharedCredentialsProvider> {
    let region = Region::new(region.to_string());

    match account.role_arn {
        None => {
            let chain = DefaultCredentialsChain::builder()
                .region(region)
                .build()
                .await;
            Ok(SharedCredentialsProvider::new(
                PrimedCredentials::resolve(chain).await?,
            ))
        }
        Some(ref role_arn) => {
            let session_name = session_name_for(account);
            tracing::info!(
                account_id = %account.account_id,
                role_arn = %role_arn,
                session_name = %session_name,
                "assuming role"
            );

            let mut builder = AssumeRoleProvider::builder(role_arn.clone())
                .session_name(session_name)
                .region(region)
                .configure(base);
            if let Some(ref external_id) = account.external_id {
                builder = builder.external_id(external_id.clone());
            }

            let provider = builder.build().await;
            Ok(SharedCredentialsProvider::new(
                PrimedCredentials::resolve(provider).await?,
            ))
        }
    }
}
