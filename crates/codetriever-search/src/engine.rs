//! The Search Engine (§4.10): embeds a query through the same pipeline that
//! ingests text, waits for its vectors, runs k-NN per query line, merges
//! overlapping context windows per source, and reads extended snippets
//! through a per-call file cache.

use std::sync::Arc;

use codetriever_common::ActiveSources;
use codetriever_config::constants::{deep_search_result_limit, max_sources_in_deep_search, relevant_sources_distance_threshold, search_context_extension_characters, search_result_limit};
use codetriever_parsing::TextInput;
use codetriever_queue::BoundedQueue;
use codetriever_vector_data::{DataSourceMap, RelevantCollection};

use crate::cache::{FileCache, slice_chars};
use crate::error::{SearchError, SearchResult};
use crate::query::{submit_query, wait_for_vectors};
use crate::window::{CandidateWindow, backing_file, candidate_from_hit, merge_windows};

/// One merged, file-backed snippet in a search response.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResultItem {
    pub text: String,
    pub source: String,
    pub distance: f32,
}

pub struct SearchEngine {
    data_source_map: Arc<dyn DataSourceMap>,
    embedder_read_queue: Arc<BoundedQueue<TextInput>>,
    active_sources: Arc<ActiveSources>,
}

impl SearchEngine {
    #[must_use]
    pub fn new(data_source_map: Arc<dyn DataSourceMap>, embedder_read_queue: Arc<BoundedQueue<TextInput>>, active_sources: Arc<ActiveSources>) -> Self {
        Self { data_source_map, embedder_read_queue, active_sources }
    }

    /// §4.10.3: ordinary search, restricted to `sources` when given,
    /// otherwise to the process's `ActiveSources` scope (unrestricted if
    /// that is also unset).
    pub async fn search_file(&self, query: &str, offset: usize, sources: Option<Vec<String>>) -> SearchResult<Vec<SearchResultItem>> {
        let limit = search_result_limit();
        let scope = self.effective_sources(sources);
        let vectors = self.embed_query(query).await?;

        let mut all = Vec::new();
        for (_, vector) in vectors {
            let hits = self.data_source_map.search(&vector, scope.as_deref(), limit + offset).await?;
            all.extend(self.merge_hits_into_results(hits, search_context_extension_characters()).await?);
        }

        all.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        let start = offset.min(all.len());
        let end = (offset + limit).min(all.len());
        Ok(all[start..end].to_vec())
    }

    /// §4.10.5: like `search_file`, restricted to an explicit source list
    /// capped at `MAX_SOURCES_IN_DEEP_SEARCH`.
    pub async fn deep_search(&self, query: &str, sources: Vec<String>) -> SearchResult<Vec<SearchResultItem>> {
        let max = max_sources_in_deep_search();
        if sources.len() > max {
            return Err(SearchError::TooManySources { found: sources.len(), max });
        }

        let k = deep_search_result_limit();
        let vectors = self.embed_query(query).await?;

        let mut all = Vec::new();
        for (_, vector) in vectors {
            let hits = self.data_source_map.search(&vector, Some(&sources), k).await?;
            all.extend(self.merge_hits_into_results(hits, search_context_extension_characters()).await?);
        }

        all.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Ok(all)
    }

    /// §4.10.4: most-relevant-sources, merging per-query-line collections
    /// with a count-weighted average of `avg_distance`.
    pub async fn most_relevant_files(&self, query: &str, sources: Option<Vec<String>>) -> SearchResult<Vec<RelevantCollection>> {
        let limit = search_result_limit();
        let threshold = relevant_sources_distance_threshold() as f32;
        let scope = self.effective_sources(sources);
        let vectors = self.embed_query(query).await?;

        let mut merged: std::collections::HashMap<String, RelevantCollection> = std::collections::HashMap::new();
        for (_, vector) in vectors {
            let collections = self.data_source_map.get_relevant_sources(&vector, limit, threshold, scope.as_deref()).await?;
            for collection in collections {
                merged
                    .entry(collection.collection.clone())
                    .and_modify(|existing| {
                        let total = existing.count + collection.count;
                        existing.avg_distance = (existing.avg_distance * existing.count as f32 + collection.avg_distance * collection.count as f32) / total as f32;
                        existing.min_distance = existing.min_distance.min(collection.min_distance);
                        existing.count = total;
                    })
                    .or_insert(collection);
            }
        }

        Ok(merged.into_values().collect())
    }

    async fn embed_query(&self, query: &str) -> SearchResult<Vec<(String, Vec<f32>)>> {
        let query_ids = submit_query(query, &self.embedder_read_queue)?;
        wait_for_vectors(self.data_source_map.as_ref(), &query_ids).await
    }

    fn effective_sources(&self, explicit: Option<Vec<String>>) -> Option<Vec<String>> {
        explicit.or_else(|| self.active_sources.snapshot())
    }

    async fn merge_hits_into_results(&self, hits: Vec<codetriever_vector_data::SearchHit>, context_chars: usize) -> SearchResult<Vec<SearchResultItem>> {
        let mut by_source: std::collections::HashMap<String, Vec<CandidateWindow>> = std::collections::HashMap::new();
        for hit in &hits {
            if let Some(candidate) = candidate_from_hit(hit, context_chars) {
                by_source.entry(candidate.source.clone()).or_default().push(candidate);
            }
        }

        let cache = FileCache::new();
        let mut results = Vec::new();
        for (_, windows) in by_source {
            for window in merge_windows(windows) {
                let path = backing_file(&window);
                let content = match cache.read(path).await {
                    Ok(content) => content,
                    Err(err) => {
                        tracing::warn!(%err, path, "search: failed to read backing file for window, skipping");
                        continue;
                    }
                };
                if let Some(text) = slice_chars(&content, window.start, window.end) {
                    results.push(SearchResultItem { text, source: window.source.clone(), distance: window.distance });
                }
            }
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codetriever_vector_data::{Callback, CollectionState, DataSourceStats, SearchHit, StoredEmbedding, VectorDataResult};
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeDataSourceMap {
        /// Shared with the engine's embedder read queue; `get_text_input_by_id`
        /// drains it on first poll to stand in for an embedder worker that
        /// would otherwise vectorize and persist each `TextInput` out-of-band.
        queue: Option<Arc<BoundedQueue<TextInput>>>,
        vectors: Mutex<std::collections::HashMap<String, Vec<f32>>>,
        hits: Mutex<Vec<SearchHit>>,
        relevant: Mutex<Vec<RelevantCollection>>,
    }

    #[async_trait::async_trait]
    impl DataSourceMap for FakeDataSourceMap {
        async fn exists(&self, _source: &str) -> VectorDataResult<bool> {
            Ok(true)
        }
        async fn create(&self, _source: &str, _source_type: &str, _source_name: Option<&str>, _state: CollectionState) -> VectorDataResult<()> {
            Ok(())
        }
        async fn delete(&self, _source: &str) -> VectorDataResult<bool> {
            Ok(false)
        }
        async fn delete_by_name(&self, _source_name: &str) -> VectorDataResult<bool> {
            Ok(false)
        }
        async fn set_state(&self, _source: &str, _state: CollectionState) -> VectorDataResult<()> {
            Ok(())
        }
        async fn get_text_input_by_id(&self, id: &str, _source: &str) -> VectorDataResult<Option<StoredEmbedding>> {
            if let Some(queue) = &self.queue {
                let mut vectors = self.vectors.lock().unwrap();
                for input in queue.get_many(usize::MAX) {
                    vectors.insert(input.metadata.id, vec![0.1, 0.2]);
                }
            }
            let vectors = self.vectors.lock().unwrap();
            Ok(vectors.get(id).map(|v| StoredEmbedding { id: id.to_string(), collection: "user-query".to_string(), text: String::new(), vector: v.clone(), metadata: serde_json::Map::new() }))
        }
        async fn list_sources(&self) -> VectorDataResult<Vec<String>> {
            Ok(vec![])
        }
        async fn get_sources_stats(&self) -> VectorDataResult<Vec<DataSourceStats>> {
            Ok(vec![])
        }
        async fn get_source_stats(&self, source: &str) -> VectorDataResult<DataSourceStats> {
            Ok(DataSourceStats::not_found(source))
        }
        async fn get_source_stats_by_name(&self, _source_name: &str) -> VectorDataResult<Vec<DataSourceStats>> {
            Ok(vec![])
        }
        async fn insert_embeddings(&self, _collection: &str, items: Vec<StoredEmbedding>) -> VectorDataResult<Vec<String>> {
            Ok(items.into_iter().map(|i| i.id).collect())
        }
        async fn search(&self, _query: &[f32], _sources: Option<&[String]>, _k: usize) -> VectorDataResult<Vec<SearchHit>> {
            Ok(self.hits.lock().unwrap().clone())
        }
        async fn get_relevant_sources(&self, _query: &[f32], _limit: usize, _distance_threshold: f32, _sources: Option<&[String]>) -> VectorDataResult<Vec<RelevantCollection>> {
            Ok(self.relevant.lock().unwrap().clone())
        }
        async fn delete_embeddings(&self, _source: Option<&str>) -> VectorDataResult<()> {
            Ok(())
        }
        fn fail_ingestion_process_callback(self: Arc<Self>, _source: String) -> Callback {
            Box::new(|| {})
        }
        fn success_ingestion_process_callback(self: Arc<Self>, _source: String) -> Callback {
            Box::new(|| {})
        }
    }

    fn stored_embedding(source: &str, start: u64, end: u64, text: &str) -> StoredEmbedding {
        let mut metadata = serde_json::Map::new();
        metadata.insert("source".to_string(), json!(source));
        metadata.insert("source_type".to_string(), json!("LOCAL_TEXT_FILE"));
        metadata.insert("start_index".to_string(), json!(start));
        metadata.insert("end_index".to_string(), json!(end));
        StoredEmbedding { id: uuid::Uuid::new_v4().to_string(), collection: source.to_string(), text: text.to_string(), vector: vec![0.1, 0.2], metadata }
    }

    #[tokio::test]
    async fn deep_search_rejects_too_many_sources() {
        let map: Arc<dyn DataSourceMap> = Arc::new(FakeDataSourceMap::default());
        let engine = SearchEngine::new(map, Arc::new(BoundedQueue::new(100)), Arc::new(ActiveSources::new()));
        let sources: Vec<String> = (0..(max_sources_in_deep_search() + 1)).map(|i| format!("s{i}")).collect();
        let err = engine.deep_search("hello", sources).await.unwrap_err();
        assert!(matches!(err, SearchError::TooManySources { .. }));
    }

    #[tokio::test]
    async fn search_file_reads_merged_window_from_backing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "hello wonderful world").unwrap();
        let path_str = path.to_string_lossy().to_string();

        let queue = Arc::new(BoundedQueue::new(100));
        let fake = FakeDataSourceMap { queue: Some(queue.clone()), ..Default::default() };
        *fake.hits.lock().unwrap() = vec![SearchHit { chunk: stored_embedding(&path_str, 6, 15, "wonderful"), distance: 0.2 }];
        let map: Arc<dyn DataSourceMap> = Arc::new(fake);

        let engine = SearchEngine::new(map, queue, Arc::new(ActiveSources::new()));
        let results = engine.search_file("hello", 0, None).await.unwrap();

        // SEARCH_CONTEXT_EXTENSION_CHARACTERS defaults far larger than this
        // fixture, so the extended window covers the whole file.
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].text, "hello wonderful world");
        assert_eq!(results[0].source, path_str);
    }

    #[tokio::test]
    async fn most_relevant_files_merges_duplicate_collections_with_weighted_average() {
        let queue = Arc::new(BoundedQueue::new(100));
        let fake = FakeDataSourceMap { queue: Some(queue.clone()), ..Default::default() };
        *fake.relevant.lock().unwrap() = vec![RelevantCollection { collection: "a.txt".to_string(), min_distance: 0.1, avg_distance: 0.2, count: 2 }];
        let map: Arc<dyn DataSourceMap> = Arc::new(fake);

        let engine = SearchEngine::new(map, queue, Arc::new(ActiveSources::new()));
        let results = engine.most_relevant_files("line one\nline two", None).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].count, 4);
        assert!((results[0].avg_distance - 0.2).abs() < f32::EPSILON);
    }
}
