pub mod indexer;
pub mod service;
pub mod watcher;

pub use indexer::{CodeChunk, IndexResult, Indexer};
pub use service::{ApiIndexerService, IndexerService};
pub use watcher::FileWatcher;

#[cfg(test)]
pub use service::test_utils::MockIndexerService;
