//! LogBroadcaster - logs message title and body via tracing

use async_trait::async_trait;
use chrono::Utc;
use contracts::{Broadcaster, CancellationToken, ContractError, Message, Uid};
use tracing::{info, instrument};

use crate::error::DispatcherError;
use crate::registry::BroadcasterRegistry;

const SCHEME: &str = "log";

/// Broadcaster that writes messages to the tracing subscriber at INFO level
///
/// Images are not rendered, only counted. The identifier is the Unix
/// timestamp (seconds) at which the message was logged.
#[derive(Debug, Default)]
pub struct LogBroadcaster;

impl LogBroadcaster {
    /// Create a new LogBroadcaster
    pub fn new() -> Self {
        Self
    }
}

/// Constructor for `log://`
pub async fn new_log_broadcaster(
    _ctx: CancellationToken,
    _uri: String,
) -> Result<Box<dyn Broadcaster>, ContractError> {
    Ok(Box::new(LogBroadcaster::new()))
}

/// Register the `log` scheme
pub fn register(registry: &BroadcasterRegistry) -> Result<(), DispatcherError> {
    registry.register(SCHEME, new_log_broadcaster)
}

#[async_trait]
impl Broadcaster for LogBroadcaster {
    fn name(&self) -> &str {
        SCHEME
    }

    #[instrument(name = "log_broadcaster_broadcast", skip(self, _ctx, msg))]
    async fn broadcast_message(
        &self,
        _ctx: &CancellationToken,
        msg: &Message,
    ) -> Result<Uid, ContractError> {
        info!(images = msg.images.len(), "{} {}", msg.title, msg.body);
        Ok(Uid::Int64(Utc::now().timestamp()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_broadcaster_returns_timestamp() {
        let broadcaster = LogBroadcaster::new();
        let before = Utc::now().timestamp();

        let id = broadcaster
            .broadcast_message(&CancellationToken::new(), &Message::new("t", "b"))
            .await
            .unwrap();

        match id {
            Uid::Int64(ts) => assert!(ts >= before),
            other => panic!("unexpected id: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_log_broadcaster_non_decreasing() {
        let broadcaster = LogBroadcaster::new();
        let ctx = CancellationToken::new();
        let mut last = i64::MIN;

        for _ in 0..5 {
            let id = broadcaster
                .broadcast_message(&ctx, &Message::new("t", "b"))
                .await
                .unwrap();
            let Uid::Int64(ts) = id else {
                panic!("expected integer id");
            };
            assert!(ts >= last);
            last = ts;
        }
    }

    #[tokio::test]
    async fn test_log_broadcaster_name() {
        assert_eq!(LogBroadcaster::new().name(), "log");
    }
}
