//! DispatchConfig - which broadcasters to run and how
//!
//! Loaded by `config_loader` from TOML or JSON.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Dispatch configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Run all broadcasters concurrently (false = one at a time)
    #[serde(default = "default_parallel")]
    pub parallel: bool,

    /// Cancel the dispatch after this many seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Connection strings, one per broadcaster (`scheme://authority?query`)
    #[serde(default)]
    pub broadcasters: Vec<String>,
}

fn default_parallel() -> bool {
    true
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            parallel: default_parallel(),
            timeout_secs: None,
            broadcasters: Vec::new(),
        }
    }
}

impl DispatchConfig {
    /// Config for the given connection strings with default settings
    pub fn from_uris<I, S>(uris: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            broadcasters: uris.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Dispatch timeout, if any
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}
