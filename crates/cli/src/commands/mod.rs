//! Command implementations.

mod schemes;
mod send;
mod validate;

pub use schemes::run_schemes;
pub use send::run_send;
pub use validate::run_validate;

use anyhow::{Context, Result};
use dispatcher::BroadcasterFactory;

/// Factory over every built-in backend
fn default_factory() -> Result<BroadcasterFactory> {
    BroadcasterFactory::with_defaults().context("Failed to register built-in broadcasters")
}
