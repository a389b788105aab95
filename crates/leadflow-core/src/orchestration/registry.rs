//! Active-run registry.
//!
//! An explicit object with a defined insert-on-start / remove-on-terminal
//! lifecycle, owned by the engine (and shareable with its caller) instead
//! of module-level global state. Reads are point-in-time snapshots: the
//! engine publishes a fresh copy of the run result after every step.

use dashmap::DashMap;

use leadflow_types::orchestration::OrchestrationResult;

/// Concurrent map of in-flight runs keyed by request ID.
#[derive(Debug, Default)]
pub struct RunRegistry {
    runs: DashMap<String, OrchestrationResult>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or refresh the snapshot for a run.
    pub(crate) fn publish(&self, result: OrchestrationResult) {
        self.runs.insert(result.request_id.clone(), result);
    }

    /// Drop a run that reached a terminal status.
    pub(crate) fn remove(&self, request_id: &str) {
        self.runs.remove(request_id);
    }

    /// Snapshot of one in-flight run, if it is still active.
    pub fn active(&self, request_id: &str) -> Option<OrchestrationResult> {
        self.runs.get(request_id).map(|entry| entry.value().clone())
    }

    /// Snapshots of every in-flight run.
    pub fn all_active(&self) -> Vec<OrchestrationResult> {
        self.runs.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}
