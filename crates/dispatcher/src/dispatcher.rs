//! MultiBroadcaster - fan-out of one message to many broadcasters

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinError, JoinSet};
use tracing::{debug, info, instrument, warn};

use contracts::{Broadcaster, CancellationToken, ContractError, DeliveryErrors, Message, Uid};

use crate::metrics::{DeliveryStatus, DispatchMetrics, MetricsSnapshot};
use crate::worker::{Worker, WorkerOutcome};

/// Broadcaster that delivers to every child broadcaster
///
/// Children run concurrently by default, or one at a time when built with
/// `with_parallel(false)`. Either way they go through the same gate.
pub struct MultiBroadcaster {
    broadcasters: Vec<Arc<dyn Broadcaster>>,
    parallel: bool,
    metrics: Arc<DispatchMetrics>,
}

impl MultiBroadcaster {
    /// Create a parallel dispatcher over `broadcasters`
    pub fn new(broadcasters: Vec<Arc<dyn Broadcaster>>) -> Self {
        Self {
            broadcasters,
            parallel: true,
            metrics: Arc::new(DispatchMetrics::new()),
        }
    }

    /// Enable or disable concurrent dispatch
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Number of child broadcasters
    pub fn len(&self) -> usize {
        self.broadcasters.len()
    }

    /// Whether there are no child broadcasters
    pub fn is_empty(&self) -> bool {
        self.broadcasters.is_empty()
    }

    /// Whether children run concurrently
    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// Names of the child broadcasters, in configuration order
    pub fn names(&self) -> Vec<&str> {
        self.broadcasters.iter().map(|b| b.name()).collect()
    }

    /// Delivery counters accumulated across calls
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    fn gate_capacity(&self) -> usize {
        if self.parallel {
            self.broadcasters.len().max(1)
        } else {
            1
        }
    }

    /// Deliver `msg` through every child and aggregate the outcome
    ///
    /// - Success: `Uid::Multi` of the child identifiers, in completion order
    /// - Any failure: `ContractError::Aggregate` with every failure reported
    ///   by then; the identifiers of children that did succeed are discarded.
    ///   Children still running after the first failure are abandoned, not
    ///   awaited
    /// - Caller cancellation: `ContractError::Cancelled`, returned without
    ///   waiting for in-flight children
    #[instrument(
        name = "multi_broadcaster_dispatch",
        skip(self, ctx, msg),
        fields(broadcasters = self.broadcasters.len(), parallel = self.parallel)
    )]
    pub async fn dispatch(
        &self,
        ctx: &CancellationToken,
        msg: &Message,
    ) -> Result<Uid, ContractError> {
        if self.broadcasters.is_empty() {
            debug!("No broadcasters configured, nothing to deliver");
            return Ok(Uid::multi(Vec::new()));
        }

        // Shared by all workers; cancelled by the caller, by any failure, or on return
        let shared = ctx.child_token();
        let _cancel_on_return = shared.clone().drop_guard();

        let gate = Arc::new(Semaphore::new(self.gate_capacity()));
        let mut workers = JoinSet::new();
        let mut names = HashMap::with_capacity(self.broadcasters.len());

        for (index, broadcaster) in self.broadcasters.iter().enumerate() {
            let worker = Worker {
                index,
                broadcaster: Arc::clone(broadcaster),
                gate: Arc::clone(&gate),
                ctx: shared.clone(),
                msg: msg.clone(),
                metrics: Arc::clone(&self.metrics),
            };
            let handle = workers.spawn(worker.run());
            names.insert(handle.id(), broadcaster.name().to_string());
        }

        let mut outcomes = Outcomes::with_capacity(self.broadcasters.len());

        loop {
            tokio::select! {
                biased;
                _ = ctx.cancelled() => {
                    warn!(pending = workers.len(), "Broadcast cancelled by caller, abandoning workers");
                    workers.detach_all();
                    return Err(ContractError::Cancelled);
                }
                joined = workers.join_next() => match joined {
                    None => break,
                    Some(joined) => self.collect(joined, &names, &shared, &mut outcomes),
                },
            }

            // A failure has cancelled the shared context: keep what already
            // finished and stop waiting for the rest
            if !outcomes.errors.is_empty() {
                while let Some(joined) = workers.try_join_next() {
                    self.collect(joined, &names, &shared, &mut outcomes);
                }
                if !workers.is_empty() {
                    warn!(
                        pending = workers.len(),
                        "Broadcast failed, abandoning in-flight workers"
                    );
                    workers.detach_all();
                }
                break;
            }
        }

        let Outcomes { ids, errors } = outcomes;
        if !errors.is_empty() {
            warn!(
                failed = errors.len(),
                delivered = ids.len(),
                "Broadcast failed, discarding identifiers of successful deliveries"
            );
        }
        errors.into_result()?;

        info!(delivered = ids.len(), "Broadcast completed");
        Ok(Uid::multi(ids))
    }

    /// Fold one finished worker into `outcomes`
    fn collect(
        &self,
        joined: Result<WorkerOutcome, JoinError>,
        names: &HashMap<task::Id, String>,
        shared: &CancellationToken,
        outcomes: &mut Outcomes,
    ) {
        match joined {
            Ok(WorkerOutcome::Delivered(id)) => outcomes.ids.push(id),
            Ok(WorkerOutcome::Failed(e)) => outcomes.errors.push(e),
            Ok(WorkerOutcome::Skipped) => {}
            Err(join_err) => {
                // The task died before reporting: treat as a delivery failure
                shared.cancel();
                let name = names
                    .get(&join_err.id())
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string());
                let status = if join_err.is_panic() {
                    DeliveryStatus::Panicked
                } else {
                    DeliveryStatus::Failed
                };
                self.metrics.record(&name, status);
                outcomes.errors.push(ContractError::delivery(
                    name,
                    format!("worker task failed: {join_err}"),
                ));
            }
        }
    }
}

/// Identifiers and errors collected from finished workers
struct Outcomes {
    ids: Vec<Uid>,
    errors: DeliveryErrors,
}

impl Outcomes {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: Vec::with_capacity(capacity),
            errors: DeliveryErrors::new(),
        }
    }
}

#[async_trait]
impl Broadcaster for MultiBroadcaster {
    fn name(&self) -> &str {
        "multi"
    }

    async fn broadcast_message(
        &self,
        ctx: &CancellationToken,
        msg: &Message,
    ) -> Result<Uid, ContractError> {
        self.dispatch(ctx, msg).await
    }
}
