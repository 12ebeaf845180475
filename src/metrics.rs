//! Backend-agnostic metrics collection via a pluggable sink.
//!
//! Consumers implement [`MetricsSink`] and install it once with [`set_sink`];
//! the pass runner then reports every task and every pass to it. Until a sink
//! is installed, events are dropped.
//!
//! ```ignore
//! use posix_acl_core::metrics::{MetricsSink, PassStats, TaskStats};
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use std::sync::Arc;
//!
//! struct Counter {
//!     applied: AtomicU64,
//! }
//!
//! impl MetricsSink for Counter {
//!     fn on_task(&self, stats: &TaskStats) {
//!         if stats.outcome == "applied" {
//!             self.applied.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn on_pass(&self, _stats: &PassStats) {}
//! }
//!
//! posix_acl_core::metrics::set_sink(Arc::new(Counter { applied: AtomicU64::new(0) }));
//! ```

use serde::Serialize;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::warn;

/// One reconciled path, passed to [`MetricsSink::on_task`].
#[derive(Debug, Clone, Serialize)]
pub struct TaskStats {
    /// The path the task targeted
    pub path: String,
    /// Outcome kind: `in_sync`, `applied`, `planned`, `skipped`, `failed` or `blocked`
    pub outcome: &'static str,
    /// Wall-clock time for the whole task
    pub duration: Duration,
}

/// Per-phase timing of one task, in milliseconds.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskPhases {
    /// Reading the live ACL
    pub read_ms: f64,
    /// Comparing desired and current state
    pub evaluate_ms: f64,
    /// Running the write collaborator
    pub apply_ms: f64,
    /// Whole task
    pub total_ms: f64,
}

impl TaskPhases {
    /// Time not attributed to any measured phase.
    pub fn overhead_ms(&self) -> f64 {
        self.total_ms - (self.read_ms + self.evaluate_ms + self.apply_ms)
    }
}

/// Summary of one reconciliation pass, passed to [`MetricsSink::on_pass`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct PassStats {
    pub tasks: usize,
    pub in_sync: usize,
    pub changed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub blocked: usize,
    pub duration: Duration,
}

/// Consumer of reconciliation metrics.
///
/// Called synchronously from the pass runner, so implementations should be
/// cheap and must be thread-safe.
pub trait MetricsSink: Send + Sync {
    /// Called once per task, whatever its outcome.
    fn on_task(&self, stats: &TaskStats);

    /// Called once at the end of every pass.
    fn on_pass(&self, stats: &PassStats);

    /// Called with phase-level timings for tasks that got as far as reading.
    fn on_task_phases(&self, _stats: &TaskStats, _phases: &TaskPhases) {}
}

static SINK: OnceLock<Arc<dyn MetricsSink>> = OnceLock::new();

/// Install the global metrics sink.
///
/// Call this once at startup. Later calls are ignored with a warning.
pub fn set_sink(sink: Arc<dyn MetricsSink>) {
    if SINK.set(sink).is_err() {
        warn!(
            "Metrics sink was already initialized. Ignoring subsequent set_sink call. Set the sink before the first pass."
        );
    }
}

pub(crate) fn record_task(stats: &TaskStats, phases: Option<&TaskPhases>) {
    let Some(sink) = SINK.get() else {
        return;
    };
    sink.on_task(stats);
    if let Some(phases) = phases {
        sink.on_task_phases(stats, phases);
    }
}

pub(crate) fn record_pass(stats: &PassStats) {
    if let Some(sink) = SINK.get() {
        sink.on_pass(stats);
    }
}
