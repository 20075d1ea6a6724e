//! Config validation
//!
//! Rules:
//! - At least one broadcaster
//! - Every connection string is non-empty and looks like `scheme://...`
//! - The scheme uses only URI scheme characters
//! - timeout_secs > 0 (if set)
//!
//! Parameter interpretation is left to each backend constructor.

use contracts::{ContractError, DispatchConfig};

/// Validate a DispatchConfig
///
/// Returns the first error found, or Ok(()).
pub fn validate(config: &DispatchConfig) -> Result<(), ContractError> {
    validate_broadcasters(config)?;
    validate_timeout(config)?;
    Ok(())
}

/// Validate the connection string list
fn validate_broadcasters(config: &DispatchConfig) -> Result<(), ContractError> {
    if config.broadcasters.is_empty() {
        return Err(ContractError::config_validation(
            "broadcasters",
            "at least one broadcaster is required",
        ));
    }

    for (idx, uri) in config.broadcasters.iter().enumerate() {
        let field = format!("broadcasters[{idx}]");

        if uri.trim().is_empty() {
            return Err(ContractError::config_validation(
                field,
                "connection string cannot be empty",
            ));
        }

        let scheme = scheme_of(uri).ok_or_else(|| {
            ContractError::config_validation(
                field.clone(),
                format!("'{uri}' is not of the form scheme://..."),
            )
        })?;

        if !is_valid_scheme(scheme) {
            return Err(ContractError::config_validation(
                field,
                format!("invalid scheme '{scheme}'"),
            ));
        }
    }
    Ok(())
}

/// Validate the timeout
fn validate_timeout(config: &DispatchConfig) -> Result<(), ContractError> {
    if config.timeout_secs == Some(0) {
        return Err(ContractError::config_validation(
            "timeout_secs",
            "timeout_secs must be > 0, omit it to disable the timeout",
        ));
    }
    Ok(())
}

fn scheme_of(uri: &str) -> Option<&str> {
    uri.split_once("://")
        .map(|(scheme, _)| scheme)
        .filter(|scheme| !scheme.is_empty())
}

// RFC 3986: ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )
fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
