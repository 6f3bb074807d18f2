//! Per-source ingestion state: phase progress plus completion callbacks.

use crate::phase::{IngestionPhase, PhaseProgress};
use dashmap::DashMap;
use std::sync::Mutex;

/// A callback invoked exactly once when a source finishes or fails
/// ingestion. Boxed so callers can close over per-request state (e.g. an
/// HTTP response channel) without this crate knowing about it.
pub type Callback = Box<dyn FnOnce() + Send>;

/// One data source's progress across all the phases it has entered.
pub struct IngestionState {
    data_source_id: String,
    current_phase: Mutex<Option<IngestionPhase>>,
    phases: DashMap<IngestionPhase, PhaseProgress>,
    success_callback: Mutex<Option<Callback>>,
    failure_callback: Mutex<Option<Callback>>,
}

impl IngestionState {
    #[must_use]
    pub fn new(
        data_source_id: impl Into<String>,
        success_callback: Option<Callback>,
        failure_callback: Option<Callback>,
    ) -> Self {
        Self {
            data_source_id: data_source_id.into(),
            current_phase: Mutex::new(None),
            phases: DashMap::new(),
            success_callback: Mutex::new(success_callback),
            failure_callback: Mutex::new(failure_callback),
        }
    }

    #[must_use]
    pub fn data_source_id(&self) -> &str {
        &self.data_source_id
    }

    #[must_use]
    pub fn current_phase(&self) -> Option<IngestionPhase> {
        *self.current_phase.lock().expect("current phase lock poisoned")
    }

    /// Returns a reference-counted handle to the phase's progress counter,
    /// creating it on first use. Setting `is_current_phase` also updates
    /// which phase `current_phase()`/`get_phase_percentage(None)` reports.
    pub fn get_or_create_phase(&self, phase: IngestionPhase, is_current_phase: bool) {
        self.phases.entry(phase).or_insert_with(PhaseProgress::new);
        if is_current_phase {
            *self.current_phase.lock().expect("current phase lock poisoned") = Some(phase);
        }
    }

    #[must_use]
    pub fn phase_percentage(&self, phase: IngestionPhase) -> Option<f64> {
        self.phases.get(&phase).and_then(|p| p.percentage())
    }

    pub fn with_phase(&self, phase: IngestionPhase, f: impl FnOnce(&PhaseProgress)) {
        self.get_or_create_phase(phase, false);
        if let Some(progress) = self.phases.get(&phase) {
            f(&progress);
        }
    }

    /// Snapshot of every phase this source has entered, in the order
    /// `(phase, is_current_phase, percentage)`.
    #[must_use]
    pub fn phase_snapshots(&self) -> Vec<(IngestionPhase, bool, Option<f64>)> {
        let current = self.current_phase();
        self.phases
            .iter()
            .map(|entry| {
                let phase = *entry.key();
                (phase, Some(phase) == current, entry.value().percentage())
            })
            .collect()
    }

    pub fn take_success_callback(&self) -> Option<Callback> {
        self.success_callback.lock().expect("callback lock poisoned").take()
    }

    pub fn take_failure_callback(&self) -> Option<Callback> {
        self.failure_callback.lock().expect("callback lock poisoned").take()
    }
}
