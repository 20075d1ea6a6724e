//! Dispatch metrics for observability
//!
//! Every worker outcome lands in two places: the per-dispatcher atomics read
//! through [`DispatchMetrics::snapshot`], and the process-wide `metrics`
//! recorder (Prometheus when the exporter is installed, a no-op otherwise).

use std::sync::atomic::{AtomicU64, Ordering};

use metrics::counter;

/// Counter of worker outcomes, labelled by `broadcaster` and `status`
pub const DELIVERIES_TOTAL: &str = "broadcast_deliveries_total";

/// Terminal state of one worker, as recorded in metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    Delivered,
    Failed,
    Skipped,
    Panicked,
}

impl DeliveryStatus {
    /// Value of the `status` label
    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Failed => "failed",
            DeliveryStatus::Skipped => "skipped",
            DeliveryStatus::Panicked => "panicked",
        }
    }
}

/// Record one worker outcome with the global recorder
pub fn record_delivery(broadcaster: &str, status: DeliveryStatus) {
    counter!(
        DELIVERIES_TOTAL,
        "broadcaster" => broadcaster.to_string(),
        "status" => status.as_str()
    )
    .increment(1);
}

/// Delivery counters for one fan-out dispatcher
///
/// Updated by worker tasks, read through [`DispatchMetrics::snapshot`].
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Backends that returned an identifier
    delivered_count: AtomicU64,
    /// Backends that returned an error (panics included)
    failure_count: AtomicU64,
    /// Workers that exited on a cancelled context without calling their backend
    skipped_count: AtomicU64,
    /// Workers whose task panicked
    panicked_count: AtomicU64,
}

impl DispatchMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Get delivered count
    pub fn delivered_count(&self) -> u64 {
        self.delivered_count.load(Ordering::Relaxed)
    }

    /// Increment delivered count
    pub fn inc_delivered_count(&self) {
        self.delivered_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get failure count
    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    /// Increment failure count
    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get skipped count
    pub fn skipped_count(&self) -> u64 {
        self.skipped_count.load(Ordering::Relaxed)
    }

    /// Increment skipped count
    pub fn inc_skipped_count(&self) {
        self.skipped_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get panicked count
    pub fn panicked_count(&self) -> u64 {
        self.panicked_count.load(Ordering::Relaxed)
    }

    /// Increment panicked count
    pub fn inc_panicked_count(&self) {
        self.panicked_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one worker outcome here and in the global recorder
    ///
    /// A panic counts as a failure too.
    pub fn record(&self, broadcaster: &str, status: DeliveryStatus) {
        match status {
            DeliveryStatus::Delivered => self.inc_delivered_count(),
            DeliveryStatus::Failed => self.inc_failure_count(),
            DeliveryStatus::Skipped => self.inc_skipped_count(),
            DeliveryStatus::Panicked => {
                self.inc_failure_count();
                self.inc_panicked_count();
            }
        }
        record_delivery(broadcaster, status);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            delivered_count: self.delivered_count(),
            failure_count: self.failure_count(),
            skipped_count: self.skipped_count(),
            panicked_count: self.panicked_count(),
        }
    }
}

/// Snapshot of dispatch metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub delivered_count: u64,
    pub failure_count: u64,
    pub skipped_count: u64,
    pub panicked_count: u64,
}

impl MetricsSnapshot {
    /// Workers that reached a terminal state
    pub fn total(&self) -> u64 {
        self.delivered_count + self.failure_count + self.skipped_count
    }
}
