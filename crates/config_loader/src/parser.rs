//! Config parsing
//!
//! TOML first, JSON as a fallback. Both carry the same fields:
//!
//! ```toml
//! parallel = true
//! timeout_secs = 30
//! broadcasters = ["log://", "file:///var/spool/broadcast?format=jpeg"]
//! ```

use std::path::Path;

use contracts::{ContractError, DispatchConfig};

/// Config file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.toml`
    Toml,
    /// `.json`
    Json,
}

impl ConfigFormat {
    /// Extension -> format, case-insensitive
    pub fn from_extension(ext: &str) -> Option<Self> {
        if ext.eq_ignore_ascii_case("toml") {
            Some(Self::Toml)
        } else if ext.eq_ignore_ascii_case("json") {
            Some(Self::Json)
        } else {
            None
        }
    }

    /// Infer the format from a file path
    pub fn from_path(path: &Path) -> Result<Self, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        Self::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!(
                "unsupported config format '.{ext}' for {} (expected .toml or .json)",
                path.display()
            ))
        })
    }

    /// Parse into a DispatchConfig (no validation)
    pub fn parse(self, content: &str) -> Result<DispatchConfig, ContractError> {
        let parsed: Result<DispatchConfig, ParseFailure> = match self {
            Self::Toml => toml::from_str(content).map_err(|e| boxed(self, e)),
            Self::Json => serde_json::from_str(content).map_err(|e| boxed(self, e)),
        };
        parsed.map_err(|(message, source)| ContractError::ConfigParse {
            message,
            source: Some(source),
        })
    }
}

type ParseFailure = (String, Box<dyn std::error::Error + Send + Sync>);

fn boxed<E>(format: ConfigFormat, err: E) -> ParseFailure
where
    E: std::error::Error + Send + Sync + 'static,
{
    (format!("{format:?} parse error: {err}"), Box::new(err))
}
