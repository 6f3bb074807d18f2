//! Registry of in-flight [`IngestionState`]s, keyed by data source id.

use crate::phase::IngestionPhase;
use crate::state::{Callback, IngestionState};
use dashmap::DashMap;
use std::sync::Arc;

/// Tracks ingestion progress for every data source currently being
/// ingested. One instance is shared (via `Arc`) across the coordinator,
/// download/transcription/embedder/storage workers, and the HTTP status
/// route.
#[derive(Default)]
pub struct ProgressManager {
    states: DashMap<String, Arc<IngestionState>>,
}

impl ProgressManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_state(
        &self,
        data_source_id: impl Into<String>,
        success_callback: Option<Callback>,
        failure_callback: Option<Callback>,
    ) -> Arc<IngestionState> {
        let data_source_id = data_source_id.into();
        let state = Arc::new(IngestionState::new(
            data_source_id.clone(),
            success_callback,
            failure_callback,
        ));
        self.states.insert(data_source_id, state.clone());
        state
    }

    pub fn add_phase(
        &self,
        data_source_id: &str,
        phase: IngestionPhase,
        is_current_phase: bool,
        total: Option<u64>,
    ) -> Arc<IngestionState> {
        let state = self
            .states
            .entry(data_source_id.to_string())
            .or_insert_with(|| {
                tracing::debug!(source = %data_source_id, "adding source to progress manager");
                Arc::new(IngestionState::new(data_source_id, None, None))
            })
            .clone();

        state.get_or_create_phase(phase, is_current_phase);
        if let Some(total) = total {
            tracing::debug!(source = %data_source_id, phase = phase.as_str(), total, "setting phase total");
            state.with_phase(phase, |p| p.set_total(total));
        }
        state
    }

    #[must_use]
    pub fn get_state(&self, data_source_id: &str) -> Option<Arc<IngestionState>> {
        let state = self.states.get(data_source_id).map(|e| e.clone());
        if state.is_none() {
            tracing::warn!(source = %data_source_id, "ingestion state not found");
        }
        state
    }

    pub fn set_phase_total(&self, data_source_id: &str, phase: IngestionPhase, total: u64) {
        let Some(state) = self.get_state(data_source_id) else {
            return;
        };
        state.with_phase(phase, |p| p.set_total(total));
    }

    pub fn increment_phase_progress(&self, data_source_id: &str, phase: IngestionPhase, amount: u64) {
        let Some(state) = self.get_state(data_source_id) else {
            return;
        };
        state.with_phase(phase, |p| p.increment(amount));
    }

    pub fn set_phase_progress(&self, data_source_id: &str, phase: IngestionPhase, current: u64) {
        let Some(state) = self.get_state(data_source_id) else {
            return;
        };
        state.with_phase(phase, |p| p.set_progress(current));
    }

    #[must_use]
    pub fn get_phase_percentage(
        &self,
        data_source_id: &str,
        phase: Option<IngestionPhase>,
    ) -> Option<f64> {
        let state = self.get_state(data_source_id)?;
        let target = phase.or_else(|| state.current_phase())?;
        state.phase_percentage(target)
    }

    pub fn remove_source_state(&self, data_source_id: &str) -> Option<Arc<IngestionState>> {
        let removed = self.states.remove(data_source_id).map(|(_, v)| v);
        if removed.is_none() {
            tracing::warn!(source = %data_source_id, "ingestion state not found");
        }
        removed
    }

    /// Marks a source complete, firing its success callback exactly once.
    ///
    /// Removal from the registry and callback dispatch happen on the same
    /// atomic `DashMap::remove`, so two threads racing to complete the
    /// same source can never both run the callback (Testable Property 9).
    pub fn mark_as_completed(&self, data_source_id: &str) {
        let Some((_, state)) = self.states.remove(data_source_id) else {
            tracing::warn!(source = %data_source_id, "ingestion state not found");
            return;
        };
        if let Some(cb) = state.take_success_callback() {
            cb();
        }
    }

    /// Marks a source failed, firing its failure callback exactly once.
    /// See [`Self::mark_as_completed`] for the atomicity argument.
    pub fn mark_as_failed(&self, data_source_id: &str) {
        let Some((_, state)) = self.states.remove(data_source_id) else {
            tracing::warn!(source = %data_source_id, "ingestion state not found");
            return;
        };
        if let Some(cb) = state.take_failure_callback() {
            cb();
        }
    }
}
