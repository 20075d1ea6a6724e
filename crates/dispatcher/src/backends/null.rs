//! NullBroadcaster - discards every message

use async_trait::async_trait;
use contracts::{Broadcaster, CancellationToken, ContractError, Message, Uid};

use crate::error::DispatcherError;
use crate::registry::BroadcasterRegistry;

const SCHEME: &str = "null";

/// Broadcaster that delivers nowhere and always succeeds with `Uid::Null`
#[derive(Debug, Default)]
pub struct NullBroadcaster;

impl NullBroadcaster {
    /// Create a new NullBroadcaster
    pub fn new() -> Self {
        Self
    }
}

/// Constructor for `null://`
pub async fn new_null_broadcaster(
    _ctx: CancellationToken,
    _uri: String,
) -> Result<Box<dyn Broadcaster>, ContractError> {
    Ok(Box::new(NullBroadcaster::new()))
}

/// Register the `null` scheme
pub fn register(registry: &BroadcasterRegistry) -> Result<(), DispatcherError> {
    registry.register(SCHEME, new_null_broadcaster)
}

#[async_trait]
impl Broadcaster for NullBroadcaster {
    fn name(&self) -> &str {
        SCHEME
    }

    async fn broadcast_message(
        &self,
        _ctx: &CancellationToken,
        _msg: &Message,
    ) -> Result<Uid, ContractError> {
        Ok(Uid::Null)
    }
}
