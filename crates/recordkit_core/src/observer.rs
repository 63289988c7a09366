//! Observation hooks for model state transitions.
//!
//! Models never log on their own; they report to a [`ModelObserver`].
//! The default [`TracingObserver`] forwards to `tracing`, so output is
//! controlled entirely by whichever subscriber the host installs.

use std::fmt;
use std::sync::Arc;

/// Receives notifications about model state transitions.
///
/// All methods have empty default bodies so implementors only override
/// what they need.
pub trait ModelObserver: Send + Sync {
    /// A clean model captured its previous snapshot and became dirty.
    fn became_dirty(&self, _kind: &str, _attribute: &str) {}

    /// Relation ids were staged for deletion.
    fn deletion_staged(&self, _kind: &str, _relation: &str, _ids: &[String]) {}

    /// A singular relation link was cleared.
    fn reference_cleared(&self, _kind: &str, _relation: &str) {}

    /// A mutation was rejected and the model left untouched.
    fn mutation_rejected(&self, _kind: &str, _reason: &dyn fmt::Display) {}
}

/// Observer that emits `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ModelObserver for TracingObserver {
    fn became_dirty(&self, kind: &str, attribute: &str) {
        tracing::trace!(kind, attribute, "model became dirty");
    }

    fn deletion_staged(&self, kind: &str, relation: &str, ids: &[String]) {
        tracing::debug!(kind, relation, count = ids.len(), "staged relation deletion");
    }

    fn reference_cleared(&self, kind: &str, relation: &str) {
        tracing::debug!(kind, relation, "cleared singular relation");
    }

    fn mutation_rejected(&self, kind: &str, reason: &dyn fmt::Display) {
        tracing::debug!(kind, %reason, "mutation rejected");
    }
}

/// Observer that discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ModelObserver for NoopObserver {}

/// Shared observer handle.
pub type SharedObserver = Arc<dyn ModelObserver>;

pub(crate) fn default_observer() -> SharedObserver {
    Arc::new(TracingObserver)
}
