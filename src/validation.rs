//! Account descriptor validation.
//!
//! Descriptors are expected to be checked when configuration is loaded; these
//! helpers let backends reject malformed input before doing any credential
//! work.

use crate::{AccountDescriptor, CredwatchError, Result};

/// Maximum allowed length for account ids, names and regions.
const MAX_FIELD_LENGTH: usize = 255;

/// Maximum length of an STS role session name.
pub const MAX_SESSION_NAME_LENGTH: usize = 64;

/// Minimum length of an STS role session name.
const MIN_SESSION_NAME_LENGTH: usize = 2;

fn validate_field(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(CredwatchError::Configuration(format!(
            "{} cannot be empty",
            field
        )));
    }

    if value.len() > MAX_FIELD_LENGTH {
        return Err(CredwatchError::Configuration(format!(
            "{} exceeds maximum length of {} characters",
            field, MAX_FIELD_LENGTH
        )));
    }

    if value.chars().any(char::is_control) {
        return Err(CredwatchError::Configuration(format!(
            "{} contains control characters",
            field
        )));
    }

    Ok(())
}

/// Returns true if `c` is allowed in an STS role session name.
pub fn is_session_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "+=,.@_-".contains(c)
}

/// Validates an account descriptor.
///
/// Checks:
/// - `account_id`, `name` and `region` are non-empty, bounded and free of
///   control characters
/// - `role_arn`, when set, is an IAM role ARN
/// - `session_name`, when set, satisfies STS naming rules
///
/// # Errors
///
/// Returns [`CredwatchError::Configuration`] if validation fails.
///
/// # Example
///
/// ```
/// use credwatch::AccountDescriptor;
/// use credwatch::validation::validate_account;
///
/// let ok = AccountDescriptor::new("123456789012", "prod")
///     .with_role_arn("arn:aws:iam::123456789012:role/Reader");
/// assert!(validate_account(&ok).is_ok());
///
/// let bad = AccountDescriptor::new("123456789012", "prod").with_role_arn("Reader");
/// assert!(validate_account(&bad).is_err());
/// ```
pub fn validate_account(account: &AccountDescriptor) -> Result<()> {
    validate_field("account_id", &account.account_id)?;
    validate_field("name", &account.name)?;
    validate_field("region", &account.region)?;

    if let Some(ref role_arn) = account.role_arn {
        validate_role_arn(role_arn)?;
    }

    if let Some(ref session_name) = account.session_name {
        validate_session_name(session_name)?;
    }

    Ok(())
}

/// Validates that a string looks like an IAM role ARN
/// (`arn:<partition>:iam::<account>:role/<name>`).
pub fn validate_role_arn(role_arn: &str) -> Result<()> {
    let parts: Vec<&str> = role_arn.splitn(6, ':').collect();

    let valid = parts.len() == 6
        && parts[0] == "arn"
        && !parts[1].is_empty()
        && parts[2] == "iam"
        && !parts[4].is_empty()
        && parts[5].len() > "role/".len()
        && parts[5].starts_with("role/");

    if !valid {
        return Err(CredwatchError::Configuration(format!(
            "role_arn is not an IAM role ARN: {}",
            role_arn
        )));
    }

    Ok(())
}

/// Validates an STS role session name.
pub fn validate_session_name(session_name: &str) -> Result<()> {
    let len = session_name.len();
    if !(MIN_SESSION_NAME_LENGTH..=MAX_SESSION_NAME_LENGTH).contains(&len) {
        return Err(CredwatchError::Configuration(format!(
            "session_name must be {}-{} characters",
            MIN_SESSION_NAME_LENGTH, MAX_SESSION_NAME_LENGTH
        )));
    }

    if !session_name.chars().all(is_session_name_char) {
        return Err(CredwatchError::Configuration(
            "session_name may only contain alphanumerics and +=,.@_-".to_string(),
        ));
    }

    Ok(())
}
