//! Broadcaster trait - delivery backend interface
//!
//! Defines the abstract interface every delivery backend implements.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{ContractError, Message, Uid};

/// Message delivery backend
///
/// Implementations must:
/// - observe `ctx` for any blocking work they do
/// - tolerate concurrent calls on distinct instances (no shared global state)
/// - return an identifier on success and an error on failure
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Backend name (used for logging and error context)
    fn name(&self) -> &str;

    /// Deliver one message
    ///
    /// # Errors
    /// Returns a delivery error with backend context, or
    /// [`ContractError::Cancelled`] when `ctx` was cancelled first.
    async fn broadcast_message(
        &self,
        ctx: &CancellationToken,
        msg: &Message,
    ) -> Result<Uid, ContractError>;
}
