//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
///
/// Everything here surfaces before any message is delivered.
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Scheme registered twice
    #[error("broadcaster scheme '{scheme}' is already registered")]
    DuplicateScheme { scheme: String },

    /// No constructor registered for the scheme
    ///
    /// `uri` is filled in once the lookup was made for a connection string.
    #[error("unknown broadcaster scheme '{scheme}'{}", in_uri(.uri))]
    UnknownScheme { scheme: String, uri: Option<String> },

    /// Connection string is not a valid URI
    #[error("invalid connection string '{uri}': {message}")]
    InvalidUri { uri: String, message: String },

    /// Backend constructor rejected the connection string
    #[error("failed to create broadcaster for '{uri}': {source}")]
    Construction {
        uri: String,
        #[source]
        source: contracts::ContractError,
    },

    /// Error from contract layer
    #[error(transparent)]
    Contract(#[from] contracts::ContractError),
}

fn in_uri(uri: &Option<String>) -> String {
    uri.as_deref()
        .map(|uri| format!(" in '{uri}'"))
        .unwrap_or_default()
}

impl DispatcherError {
    /// Create an invalid URI error
    pub fn invalid_uri(uri: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidUri {
            uri: uri.into(),
            message: message.into(),
        }
    }

    /// Create a construction error
    pub fn construction(uri: impl Into<String>, source: contracts::ContractError) -> Self {
        Self::Construction {
            uri: uri.into(),
            source,
        }
    }

    /// Attach the connection string an unknown scheme came from
    pub fn for_uri(self, uri: &str) -> Self {
        match self {
            Self::UnknownScheme { scheme, .. } => Self::UnknownScheme {
                scheme,
                uri: Some(uri.to_string()),
            },
            other => other,
        }
    }

    /// Whether this is a configuration problem (as opposed to cancellation)
    pub fn is_configuration(&self) -> bool {
        !matches!(self, Self::Contract(e) if e.is_cancelled())
    }
}
