//! Search engine crate for Codetriever (§4.10).
//!
//! [`SearchEngine`] is the only public entry point: it submits a query
//! through the same embedder pipeline ingestion uses, waits for the
//! resulting vectors, runs k-NN search per query line, merges overlapping
//! context windows per source, and reads extended snippets through a
//! per-call file cache.

pub mod cache;
pub mod engine;
pub mod error;
pub mod query;
pub mod window;

pub use engine::{SearchEngine, SearchResultItem};
pub use error::{SearchError, SearchResult};
