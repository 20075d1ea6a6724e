//! Layered error definitions
//!
//! Categorized by source: config / delivery / cancellation

use std::fmt;
use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    /// Backend rejected a connection-string parameter
    #[error("invalid '{param}' parameter for '{scheme}' broadcaster: {message}")]
    InvalidParameter {
        scheme: String,
        param: String,
        message: String,
    },

    // ===== Delivery Errors =====
    /// A single backend failed to deliver
    #[error("broadcaster '{broadcaster}' failed to broadcast message: {message}")]
    Delivery {
        broadcaster: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// One or more backends of a fan-out failed
    #[error("one or more errors occurred, {0}")]
    Aggregate(DeliveryErrors),

    /// Dispatch abandoned because the caller cancelled
    #[error("broadcast cancelled")]
    Cancelled,

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create invalid parameter error
    pub fn invalid_parameter(
        scheme: impl Into<String>,
        param: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            scheme: scheme.into(),
            param: param.into(),
            message: message.into(),
        }
    }

    /// Create delivery error
    pub fn delivery(broadcaster: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Delivery {
            broadcaster: broadcaster.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Wrap a backend error with the name of the broadcaster that produced it
    pub fn delivery_from(broadcaster: impl Into<String>, source: ContractError) -> Self {
        Self::Delivery {
            broadcaster: broadcaster.into(),
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Whether this error reports a cancelled dispatch
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Ordered collection of delivery failures reported together
#[derive(Debug, Default)]
pub struct DeliveryErrors {
    errors: Vec<ContractError>,
}

impl DeliveryErrors {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an error, keeping arrival order
    pub fn push(&mut self, error: ContractError) {
        self.errors.push(error);
    }

    /// Number of collected errors
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether no error was collected
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Collected errors in arrival order
    pub fn errors(&self) -> &[ContractError] {
        &self.errors
    }

    /// Convert into `Err(ContractError::Aggregate)` when non-empty
    pub fn into_result(self) -> Result<(), ContractError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ContractError::Aggregate(self))
        }
    }
}

impl fmt::Display for DeliveryErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.len() {
            1 => write!(f, "1 error occurred:")?,
            n => write!(f, "{n} errors occurred:")?,
        }
        for error in &self.errors {
            write!(f, "\n\t* {error}")?;
        }
        Ok(())
    }
}

impl FromIterator<ContractError> for DeliveryErrors {
    fn from_iter<I: IntoIterator<Item = ContractError>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_keeps_every_message() {
        let mut errors = DeliveryErrors::new();
        errors.push(ContractError::delivery("log", "disk full"));
        errors.push(ContractError::delivery("fail", "boom"));

        let err = errors.into_result().unwrap_err();
        let text = err.to_string();
        assert!(text.starts_with("one or more errors occurred, 2 errors occurred:"));
        assert!(text.contains("disk full"));
        assert!(text.contains("boom"));
    }

    #[test]
    fn test_empty_aggregate_is_ok() {
        assert!(DeliveryErrors::new().into_result().is_ok());
    }

    #[test]
    fn test_delivery_from_keeps_source() {
        let inner = ContractError::Other("boom".into());
        let err = ContractError::delivery_from("fail", inner);
        assert_eq!(
            err.to_string(),
            "broadcaster 'fail' failed to broadcast message: boom"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_cancelled_is_distinct() {
        assert!(ContractError::Cancelled.is_cancelled());
        assert!(!ContractError::delivery("x", "y").is_cancelled());
    }
}
