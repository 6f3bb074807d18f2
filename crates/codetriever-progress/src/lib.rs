//! Ingestion progress tracking (§4.9's `IngestionState`/`ProgressManager`).
//!
//! Every data source being ingested gets an [`IngestionState`] tracking
//! which phase it's in and how far along that phase is; a [`ProgressManager`]
//! is the process-wide registry workers and the HTTP status route share.

pub mod manager;
pub mod phase;
pub mod state;

pub use manager::ProgressManager;
pub use phase::{IngestionPhase, PhaseProgress};
pub use state::{Callback, IngestionState};
