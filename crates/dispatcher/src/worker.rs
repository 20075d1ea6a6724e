//! Fan-out worker - one task per broadcaster

use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, instrument};

use contracts::{Broadcaster, CancellationToken, ContractError, Message, Uid};

use crate::metrics::{DeliveryStatus, DispatchMetrics};

/// Terminal report of a worker task
///
/// Returned from the task itself, so reporting can never block on a
/// coordinator that already left.
#[derive(Debug)]
pub(crate) enum WorkerOutcome {
    /// Backend returned an identifier
    Delivered(Uid),
    /// Backend returned an error (already wrapped with the backend name)
    Failed(ContractError),
    /// Context was cancelled before the backend was invoked
    Skipped,
}

/// Everything a worker task owns
pub(crate) struct Worker {
    pub(crate) index: usize,
    pub(crate) broadcaster: Arc<dyn Broadcaster>,
    pub(crate) gate: Arc<Semaphore>,
    pub(crate) ctx: CancellationToken,
    pub(crate) msg: Message,
    pub(crate) metrics: Arc<DispatchMetrics>,
}

impl Worker {
    /// Wait for a gate slot, then invoke the backend once
    ///
    /// A failure cancels the shared context so siblings still waiting for a
    /// slot exit without running.
    #[instrument(
        name = "broadcast_worker",
        skip(self),
        fields(broadcaster = %self.broadcaster.name(), index = self.index)
    )]
    pub(crate) async fn run(self) -> WorkerOutcome {
        let _permit = tokio::select! {
            biased;
            _ = self.ctx.cancelled() => return self.skip(),
            permit = Arc::clone(&self.gate).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => return self.skip(),
            },
        };

        if self.ctx.is_cancelled() {
            return self.skip();
        }

        match self.broadcaster.broadcast_message(&self.ctx, &self.msg).await {
            Ok(id) => {
                self.metrics.record(self.broadcaster.name(), DeliveryStatus::Delivered);
                debug!(id = %id, "Broadcast delivered");
                WorkerOutcome::Delivered(id)
            }
            Err(e) => {
                self.metrics.record(self.broadcaster.name(), DeliveryStatus::Failed);
                error!(error = %e, "Broadcast failed");
                self.ctx.cancel();
                WorkerOutcome::Failed(ContractError::delivery_from(self.broadcaster.name(), e))
            }
        }
    }

    fn skip(&self) -> WorkerOutcome {
        self.metrics.record(self.broadcaster.name(), DeliveryStatus::Skipped);
        debug!("Context cancelled, broadcaster not invoked");
        WorkerOutcome::Skipped
    }
}
