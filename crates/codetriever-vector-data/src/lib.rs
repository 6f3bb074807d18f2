//! Embedded vector index crate (§4.4).
//!
//! `DataSourceMap` maps data source paths to their embedded chunks and
//! exposes nearest-neighbor search plus per-source lifecycle and stats
//! operations. [`sqlite::SqliteDataSourceMap`] is the only implementation:
//! a single on-disk SQLite database holding a `sources` table and an
//! `embeddings` table, with search and aggregation computed in-process.

pub mod error;
pub mod model;
pub mod sqlite;
pub mod traits;

pub use error::{VectorDataError, VectorDataResult};
pub use model::{Callback, CollectionState, DataSourceStats, RelevantCollection, SearchHit, StoredEmbedding};
pub use sqlite::SqliteDataSourceMap;
pub use traits::DataSourceMap;
