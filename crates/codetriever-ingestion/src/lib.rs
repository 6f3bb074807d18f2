//! Ingestion orchestration crate for Codetriever (§4.8, §4.9).
//!
//! [`IngestionCoordinator`] turns a new file or URL into a `Source` row,
//! an `IngestionState`, and a task on the right queue. [`StorageWorker`]
//! is the terminal consumer: it persists embedded chunks through a
//! `DataSourceMap` and advances `STORING` progress to completion.

pub mod coordinator;
pub mod error;
pub mod storage_worker;

pub use coordinator::IngestionCoordinator;
pub use error::{IngestionError, IngestionResult};
pub use storage_worker::StorageWorker;
