//! Ingestion phases and per-phase progress counters.

use std::sync::Mutex;

/// The phases a data source passes through while being ingested (§4.9).
///
/// `Downloading`/`Transcription` only apply to audio/video sources; text
/// and HTML sources go straight from `Initialization` to `Embedding`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IngestionPhase {
    Initialization,
    Downloading,
    Transcription,
    Embedding,
    Storing,
}

impl IngestionPhase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initialization => "initialization",
            Self::Downloading => "downloading",
            Self::Transcription => "transcription",
            Self::Embedding => "embedding",
            Self::Storing => "storing",
        }
    }
}

/// Current/total counter for one phase, guarded by its own lock so a
/// writer on one phase never blocks a reader on another.
#[derive(Debug, Default)]
pub struct PhaseProgress {
    inner: Mutex<PhaseCounts>,
}

#[derive(Debug, Default, Clone, Copy)]
struct PhaseCounts {
    current: u64,
    total: Option<u64>,
}

impl PhaseProgress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` until a total has been set, or if the total is zero.
    #[must_use]
    pub fn percentage(&self) -> Option<f64> {
        let counts = *self.inner.lock().expect("phase progress lock poisoned");
        match counts.total {
            None | Some(0) => None,
            Some(total) => Some((counts.current as f64 / total as f64) * 100.0),
        }
    }

    pub fn set_progress(&self, current: u64) {
        self.inner.lock().expect("phase progress lock poisoned").current = current;
    }

    pub fn increment(&self, amount: u64) {
        self.inner.lock().expect("phase progress lock poisoned").current += amount;
    }

    pub fn set_total(&self, total: u64) {
        self.inner.lock().expect("phase progress lock poisoned").total = Some(total);
    }

    #[must_use]
    pub fn current(&self) -> u64 {
        self.inner.lock().expect("phase progress lock poisoned").current
    }

    #[must_use]
    pub fn total(&self) -> Option<u64> {
        self.inner.lock().expect("phase progress lock poisoned").total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_is_none_without_total() {
        let p = PhaseProgress::new();
        p.increment(3);
        assert_eq!(p.percentage(), None);
    }

    #[test]
    fn percentage_computes_once_total_is_set() {
        let p = PhaseProgress::new();
        p.set_total(4);
        p.increment(1);
        assert_eq!(p.percentage(), Some(25.0));
        p.set_progress(4);
        assert_eq!(p.percentage(), Some(100.0));
    }

    #[test]
    fn zero_total_is_treated_as_unknown() {
        let p = PhaseProgress::new();
        p.set_total(0);
        assert_eq!(p.percentage(), None);
    }
}
