//! The `DataSourceMap` trait (§4.4): the vector index's full surface,
//! independent of the SQLite-backed implementation in [`crate::sqlite`].

use crate::error::VectorDataResult;
use crate::model::{Callback, CollectionState, DataSourceStats, RelevantCollection, SearchHit, StoredEmbedding};
use async_trait::async_trait;
use std::sync::Arc;

/// Maps data source paths to their embedded chunks and exposes nearest-neighbor
/// search over all of them (§4.4).
///
/// All failures are reported, never swallowed — every fallible method returns
/// a `Result`; none of them log-and-continue internally.
#[async_trait]
pub trait DataSourceMap: Send + Sync {
    async fn exists(&self, source: &str) -> VectorDataResult<bool>;

    async fn create(
        &self,
        source: &str,
        source_type: &str,
        source_name: Option<&str>,
        state: CollectionState,
    ) -> VectorDataResult<()>;

    /// Deletes the source and its embeddings. Returns `false` if it didn't exist.
    async fn delete(&self, source: &str) -> VectorDataResult<bool>;

    /// Deletes every source (and their embeddings) sharing `source_name`.
    /// Returns `false` if none matched.
    async fn delete_by_name(&self, source_name: &str) -> VectorDataResult<bool>;

    async fn set_state(&self, source: &str, state: CollectionState) -> VectorDataResult<()>;

    /// Looks up a single stored chunk by id within `source`'s collection.
    async fn get_text_input_by_id(
        &self,
        id: &str,
        source: &str,
    ) -> VectorDataResult<Option<StoredEmbedding>>;

    async fn list_sources(&self) -> VectorDataResult<Vec<String>>;

    async fn get_sources_stats(&self) -> VectorDataResult<Vec<DataSourceStats>>;

    /// Stats for one source; a missing source yields a zeroed `NotFound` record
    /// rather than an error.
    async fn get_source_stats(&self, source: &str) -> VectorDataResult<DataSourceStats>;

    async fn get_source_stats_by_name(&self, source_name: &str) -> VectorDataResult<Vec<DataSourceStats>>;

    /// Appends embedded chunks to `collection`'s rows, returning the ids assigned.
    async fn insert_embeddings(
        &self,
        collection: &str,
        items: Vec<StoredEmbedding>,
    ) -> VectorDataResult<Vec<String>>;

    /// k nearest neighbors of `query`, excluding any row whose collection is
    /// `"user-query"`, optionally restricted to `sources`. Ascending distance.
    async fn search(
        &self,
        query: &[f32],
        sources: Option<&[String]>,
        k: usize,
    ) -> VectorDataResult<Vec<SearchHit>>;

    /// Collections whose nearest member to `query` is within `distance_threshold`,
    /// drawn from a coarse top-4096 nearest, up to `limit`.
    async fn get_relevant_sources(
        &self,
        query: &[f32],
        limit: usize,
        distance_threshold: f32,
        sources: Option<&[String]>,
    ) -> VectorDataResult<Vec<RelevantCollection>>;

    /// Deletes every embedding for `source`, or for every source when `source`
    /// is `None`.
    async fn delete_embeddings(&self, source: Option<&str>) -> VectorDataResult<()>;

    /// A closure that marks `source` failed when invoked. Synchronous so it can
    /// be stored as an `IngestionState` callback and fired from kernel threads
    /// that are not themselves inside the async runtime.
    fn fail_ingestion_process_callback(self: Arc<Self>, source: String) -> Callback;

    /// A closure that marks `source` completed when invoked.
    fn success_ingestion_process_callback(self: Arc<Self>, source: String) -> Callback;
}
