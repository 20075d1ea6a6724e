//! Built-in broadcaster backends
//!
//! Contains NullBroadcaster, LogBroadcaster and FileBroadcaster. Each module
//! exposes a `register` function; [`register_defaults`] is the single place
//! where they are assembled.

mod file;
mod log;
mod null;

pub use self::file::{FileBroadcaster, FileBroadcasterConfig, OutputFormat};
pub use self::log::LogBroadcaster;
pub use self::null::NullBroadcaster;

use crate::error::DispatcherError;
use crate::registry::BroadcasterRegistry;

/// Register every built-in backend
pub fn register_defaults(registry: &BroadcasterRegistry) -> Result<(), DispatcherError> {
    null::register(registry)?;
    log::register(registry)?;
    file::register(registry)?;
    Ok(())
}
