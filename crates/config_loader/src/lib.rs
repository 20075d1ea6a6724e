//! # Config Loader
//!
//! Reads a [`DispatchConfig`] from TOML or JSON and checks it before anything
//! is constructed from it.
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//!
//! let config = ConfigLoader::load_from_path("broadcast.toml".as_ref())?;
//! for uri in &config.broadcasters {
//!     println!("{uri}");
//! }
//! # Ok::<(), contracts::ContractError>(())
//! ```

mod parser;
mod validator;

pub use contracts::DispatchConfig;
pub use parser::ConfigFormat;

use std::path::Path;

use contracts::ContractError;

/// Entry points for loading, checking and writing dispatch configuration
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate a config file, picking the format from its extension
    ///
    /// # Errors
    /// [`ContractError::ConfigParse`] for unreadable or malformed files,
    /// [`ContractError::ConfigValidation`] when the content is well-formed but
    /// unusable.
    pub fn load_from_path(path: &Path) -> Result<DispatchConfig, ContractError> {
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| ContractError::ConfigParse {
            message: format!("cannot read {}: {e}", path.display()),
            source: Some(Box::new(e)),
        })?;
        Self::load_from_str(&content, format)
    }

    /// Load and validate config text in a known format
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<DispatchConfig, ContractError> {
        let config = format.parse(content)?;
        validator::validate(&config)?;
        Ok(config)
    }

    /// Validate a config assembled elsewhere (e.g. from CLI flags)
    pub fn validate(config: &DispatchConfig) -> Result<(), ContractError> {
        validator::validate(config)
    }

    /// Serialize to pretty TOML
    pub fn to_toml(config: &DispatchConfig) -> Result<String, ContractError> {
        toml::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("cannot write TOML: {e}")))
    }

    /// Serialize to pretty JSON
    pub fn to_json(config: &DispatchConfig) -> Result<String, ContractError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("cannot write JSON: {e}")))
    }
}
