//! Vendor-agnostic metrics collection via a pluggable sink.
//!
//! A [`MetricsSink`] is handed to the engine at construction time through
//! [`DecisionEngineBuilder::metrics_sink`](crate::DecisionEngineBuilder::metrics_sink).
//! Engines built without one use a no-op sink.
//!
//! ```ignore
//! use warden_core::metrics::{AdminRefreshStats, EvaluationStats, MetricsSink};
//! use std::sync::atomic::{AtomicU64, Ordering};
//!
//! struct CounterSink {
//!     evaluations: AtomicU64,
//!     refreshes: AtomicU64,
//! }
//!
//! impl MetricsSink for CounterSink {
//!     fn on_evaluation(&self, _stats: &EvaluationStats) {
//!         self.evaluations.fetch_add(1, Ordering::Relaxed);
//!     }
//!
//!     fn on_admin_refresh(&self, _stats: &AdminRefreshStats) {
//!         self.refreshes.fetch_add(1, Ordering::Relaxed);
//!     }
//! }
//! ```

use std::time::Duration;

use serde::Serialize;

use crate::types::DecisionPath;

/// Snapshot of a single evaluation, passed to [`MetricsSink::on_evaluation`].
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationStats {
    /// Total wall-clock time of the evaluation
    pub duration: Duration,
    /// Whether the decision was Allow
    pub allowed: bool,
    /// Branch that produced the decision
    pub path: DecisionPath,
    /// Delegated domain, if the permission was delegated
    pub domain: Option<String>,
    /// Requested permission name
    pub permission: String,
    /// Canonical requester reference
    pub requester: String,
}

/// Per-phase breakdown of an evaluation, in milliseconds.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationPhases {
    /// Time spent obtaining the admin set, including any recomputation waited on
    pub admin_lookup_ms: f64,
    /// Time spent inside the delegated sub-policy
    pub delegate_ms: f64,
    pub total_ms: f64,
}

impl EvaluationPhases {
    pub fn overhead_ms(&self) -> f64 {
        self.total_ms - (self.admin_lookup_ms + self.delegate_ms)
    }
}

/// Emitted every time the admin set is recomputed.
#[derive(Debug, Clone, Serialize)]
pub struct AdminRefreshStats {
    pub duration: Duration,
    /// Number of administrator identities in the new set
    pub admins: usize,
    /// Number of group entries that could not be expanded
    pub unresolved: usize,
    /// Whether the computation failed outright
    pub failed: bool,
}

/// Consumer of engine metrics.
///
/// Calls happen on the evaluation path; implementations must not block.
pub trait MetricsSink: Send + Sync {
    fn on_evaluation(&self, stats: &EvaluationStats);

    fn on_admin_refresh(&self, stats: &AdminRefreshStats);

    /// Phase-level timings. Optional.
    fn on_evaluation_phases(&self, _stats: &EvaluationStats, _phases: &EvaluationPhases) {}
}

/// No-op sink; metrics are silently dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpSink;

impl MetricsSink for NoOpSink {
    fn on_evaluation(&self, _stats: &EvaluationStats) {}
    fn on_admin_refresh(&self, _stats: &AdminRefreshStats) {}
}
