//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace:
//! the outbound `Message`, the `Uid` result token, the `Broadcaster`
//! backend trait and the error taxonomy.
//! Business crates depend on this crate, never the other way around.
//!
//! ## Cancellation Model
//! - The caller's context is a `tokio_util` `CancellationToken`
//! - Backends observe it at their own checkpoints; nothing is preempted

mod broadcaster;
mod config;
mod error;
mod message;
mod uid;

pub use broadcaster::Broadcaster;
pub use config::DispatchConfig;
pub use error::*;
pub use message::Message;
pub use uid::Uid;

pub use tokio_util::sync::CancellationToken;
