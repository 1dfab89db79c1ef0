//! Input validation for composition.
//!
//! Validates application names, account ids and OIDC issuer URLs before they are
//! embedded in resource names and policies.

use crate::core::constants::ISSUER_SCHEME;
use crate::error::{ComposeError, ConfigError, Result};

/// Longest suffix appended to an application name (`-db-credentials`).
const LONGEST_NAME_SUFFIX: usize = "-db-credentials".len();

/// Kubernetes object names derived from an application name must stay DNS-1123 labels.
const MAX_LABEL_LEN: usize = 63;

/// Validate an application name.
///
/// Application names become Kubernetes object names, so they must be DNS-1123 labels:
/// - Only a-z, 0-9, and hyphen
/// - Must start and end with an alphanumeric character
/// - Short enough that `<name>-db-credentials` is at most 63 characters
///
/// # Errors
///
/// Returns `ComposeError::InvalidApplicationSpec` if the name is invalid.
pub fn validate_application_name(name: &str) -> Result<()> {
    let invalid = |reason: String| -> crate::error::Error {
        ComposeError::InvalidApplicationSpec {
            application: name.to_string(),
            reason,
        }
        .into()
    };

    if name.is_empty() {
        return Err(invalid("name is empty".to_string()));
    }

    let max = MAX_LABEL_LEN - LONGEST_NAME_SUFFIX;
    if name.len() > max {
        return Err(invalid(format!(
            "name is {} characters, at most {} allowed",
            name.len(),
            max
        )));
    }

    for (i, ch) in name.chars().enumerate() {
        if !ch.is_ascii_lowercase() && !ch.is_ascii_digit() && ch != '-' {
            return Err(invalid(format!(
                "invalid character '{}' at position {}. Only a-z, 0-9, and hyphen are allowed",
                ch,
                i + 1
            )));
        }
    }

    if name.starts_with('-') || name.ends_with('-') {
        return Err(invalid(
            "must start and end with a letter or digit".to_string(),
        ));
    }

    Ok(())
}

/// Validate an image reference.
///
/// # Errors
///
/// Returns `ComposeError::InvalidApplicationSpec` if the image is blank.
pub fn validate_image(application: &str, image: &str) -> Result<()> {
    if image.trim().is_empty() {
        return Err(ComposeError::InvalidApplicationSpec {
            application: application.to_string(),
            reason: "image is empty".to_string(),
        }
        .into());
    }
    Ok(())
}

/// Validate an image tag.
///
/// # Errors
///
/// Returns `ComposeError::InvalidApplicationSpec` if the tag is blank or contains
/// whitespace.
pub fn validate_tag(application: &str, tag: &str) -> Result<()> {
    if tag.is_empty() || tag.chars().any(char::is_whitespace) {
        return Err(ComposeError::InvalidApplicationSpec {
            application: application.to_string(),
            reason: format!("invalid image tag '{}'", tag),
        }
        .into());
    }
    Ok(())
}

/// Strip the `https://` scheme from an OIDC issuer URL.
///
/// The remainder is the issuer identifier IAM expects in provider ARNs and condition
/// keys, e.g. `oidc.eks.us-east-1.amazonaws.com/id/ABC`.
///
/// # Errors
///
/// Returns `ComposeError::MalformedIssuerUrl` if the scheme is missing or nothing
/// follows it.
pub fn strip_issuer_scheme(url: &str) -> Result<&str> {
    match url.strip_prefix(ISSUER_SCHEME) {
        Some(issuer) if !issuer.is_empty() && !issuer.starts_with('/') => {
            Ok(issuer.trim_end_matches('/'))
        }
        _ => Err(ComposeError::MalformedIssuerUrl {
            url: url.to_string(),
        }
        .into()),
    }
}

/// Validate an AWS account id (12 digits).
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` if the id is malformed.
pub fn validate_account_id(account_id: &str) -> Result<()> {
    if account_id.len() != 12 || !account_id.chars().all(|c| c.is_ascii_digit()) {
        return Err(ConfigError::InvalidValue {
            field: "account-id",
            reason: format!("'{}' is not a 12-digit AWS account id", account_id),
        }
        .into());
    }
    Ok(())
}
