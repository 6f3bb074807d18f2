//! The Embedder Worker (§4.7): a self-terminating consumer that vectorizes
//! batches of [`TextInput`] pulled off `embedderReadQ` and hands them to
//! `embedderWriteQ` for the Storage Worker.

use crate::EmbeddingService;
use codetriever_parsing::TextInput;
use codetriever_progress::{IngestionPhase, ProgressManager};
use codetriever_queue::{BoundedQueue, SelfTerminatingWorker};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Wraps a [`SelfTerminatingWorker`] around the batch-read/vectorize/batch-write
/// loop described in §4.7. `user_query_source` names the pseudo-source whose
/// batches are vectorized but never reported to the progress manager.
pub struct EmbedderWorker {
    inner: SelfTerminatingWorker,
}

impl EmbedderWorker {
    /// Must be called from inside a Tokio runtime: it captures the current
    /// [`tokio::runtime::Handle`] so the worker's plain `std::thread` body
    /// can later call the async `EmbeddingService` via `block_on`.
    #[must_use]
    pub fn new(
        embedding_service: Arc<dyn EmbeddingService>,
        read_queue: Arc<BoundedQueue<TextInput>>,
        write_queue: Arc<BoundedQueue<TextInput>>,
        progress: Arc<ProgressManager>,
        batch_size: usize,
        read_sleep: Duration,
        idle_timeout: Duration,
        user_query_source: String,
    ) -> Self {
        // Captured here, on the caller's thread, since it must already be inside
        // the async runtime (mirrors the bridge in codetriever-vector-data's
        // SqliteDataSourceMap::connect). `ensure_running`'s spawned std::thread
        // is not itself inside that runtime, so Handle::current() would panic there.
        let handle = tokio::runtime::Handle::current();

        let inner = SelfTerminatingWorker::new("embedder-worker", idle_timeout, move |activity| {
            let batch = read_queue.get_many(batch_size);
            if batch.is_empty() {
                std::thread::sleep(read_sleep);
                return;
            }
            activity.mark_active();

            let vectorized = handle.block_on(vectorize_batch(embedding_service.as_ref(), batch));

            match vectorized {
                Ok(batch) => {
                    record_progress(&progress, &batch, &user_query_source);
                    if let Err(err) = write_queue.put_many(batch) {
                        tracing::error!(%err, "embedder worker: failed to enqueue vectorized batch");
                    }
                }
                Err(err) => {
                    tracing::error!(%err, "embedder worker: vectorize failed, dropping batch");
                }
            }
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

async fn vectorize_batch(
    service: &dyn EmbeddingService,
    mut batch: Vec<TextInput>,
) -> crate::EmbeddingResult<Vec<TextInput>> {
    let texts: Vec<&str> = batch.iter().map(|item| item.text.as_str()).collect();
    let vectors = service.generate_embeddings(texts).await?;
    for (item, vector) in batch.iter_mut().zip(vectors) {
        item.vector = Some(vector);
    }
    Ok(batch)
}

/// `EMBEDDING += group_size` per `source_id`, skipping the user-query
/// pseudo-source entirely (it has no `IngestionState`).
fn record_progress(progress: &ProgressManager, batch: &[TextInput], user_query_source: &str) {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for item in batch {
        if item.source_id == user_query_source {
            continue;
        }
        *counts.entry(item.source_id.as_str()).or_insert(0) += 1;
    }
    for (source_id, count) in counts {
        progress.increment_phase_progress(source_id, IngestionPhase::Embedding, count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EmbeddingProvider, EmbeddingResult};
    use async_trait::async_trait;
    use codetriever_parsing::{TextChunk, TextInputMetadata};

    struct StubProvider;

    #[async_trait]
    impl EmbeddingProvider for StubProvider {
        async fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 2.0, 3.0]).collect())
        }
        fn embedding_dimension(&self) -> usize {
            3
        }
        fn max_tokens(&self) -> usize {
            8192
        }
        fn model_name(&self) -> &str {
            "stub"
        }
        async fn is_ready(&self) -> bool {
            true
        }
        async fn ensure_ready(&self) -> EmbeddingResult<()> {
            Ok(())
        }
        async fn get_tokenizer(&self) -> Option<std::sync::Arc<tokenizers::Tokenizer>> {
            None
        }
    }

    fn text_input(id: &str, source_id: &str) -> TextInput {
        TextInput {
            text: format!("text-{id}"),
            metadata: TextInputMetadata {
                id: id.to_string(),
                source: source_id.to_string(),
                source_type: "LOCAL_TEXT_FILE".to_string(),
                start_index: 0,
                end_index: 4,
                extra: HashMap::new(),
            },
            vector: None,
            source_id: source_id.to_string(),
        }
    }

    #[tokio::test]
    async fn vectorize_batch_sets_vector_on_every_item() {
        let service = crate::DefaultEmbeddingService::with_provider(Arc::new(StubProvider), 10);
        let batch = vec![text_input("1", "src-a"), text_input("2", "src-a")];
        let vectorized = vectorize_batch(&service, batch).await.unwrap();
        assert_eq!(vectorized.len(), 2);
        for item in &vectorized {
            assert_eq!(item.vector.as_deref(), Some([1.0, 2.0, 3.0].as_slice()));
        }
    }

    #[test]
    fn record_progress_groups_by_source_and_skips_user_query() {
        let progress = ProgressManager::new();
        progress.add_phase("src-a", IngestionPhase::Embedding, true, Some(10));
        let batch = vec![
            text_input("1", "src-a"),
            text_input("2", "src-a"),
            text_input("3", "user-query"),
        ];
        record_progress(&progress, &batch, "user-query");
        assert_eq!(
            progress.get_phase_percentage("src-a", Some(IngestionPhase::Embedding)),
            Some(20.0)
        );
        assert!(progress.get_state("user-query").is_none());
    }

    #[tokio::test]
    async fn ensure_running_drains_queue_and_forwards_to_write_queue() {
        let service: Arc<dyn EmbeddingService> =
            Arc::new(crate::DefaultEmbeddingService::with_provider(Arc::new(StubProvider), 10));
        let read_queue = Arc::new(BoundedQueue::new(10));
        let write_queue = Arc::new(BoundedQueue::new(10));
        let progress = Arc::new(ProgressManager::new());
        progress.add_phase("src-a", IngestionPhase::Embedding, true, Some(1));

        read_queue.put_nowait(text_input("1", "src-a")).unwrap();

        let worker = EmbedderWorker::new(
            service,
            read_queue,
            write_queue.clone(),
            progress.clone(),
            10,
            Duration::from_millis(5),
            Duration::from_millis(200),
            "user-query".to_string(),
        );
        worker.ensure_running();

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while write_queue.is_empty() && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(write_queue.len(), 1);
        assert_eq!(
            progress.get_phase_percentage("src-a", Some(IngestionPhase::Embedding)),
            Some(100.0)
        );
        worker.stop(Duration::from_millis(200));
    }
}
