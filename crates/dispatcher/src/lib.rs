//! # Dispatcher
//!
//! Message dispatch.
//!
//! Responsibilities:
//! - Register broadcaster constructors by scheme
//! - Build broadcasters from connection strings
//! - Fan out to many broadcasters; the first failure cancels the rest

pub mod backends;
pub mod dispatcher;
pub mod error;
pub mod factory;
pub mod metrics;
pub mod registry;
mod worker;

pub use contracts::{Broadcaster, CancellationToken, Message, Uid};
pub use dispatcher::MultiBroadcaster;
pub use error::DispatcherError;
pub use factory::BroadcasterFactory;
pub use crate::metrics::{DeliveryStatus, DispatchMetrics, MetricsSnapshot};
pub use registry::{BroadcasterRegistry, Constructor, ConstructorFuture};
