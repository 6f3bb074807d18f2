//! The Transcription Worker (§4.6): a self-terminating consumer that turns
//! downloaded audio into a transcript, writes it to disk, and forwards
//! chunked [`TextInput`]s to the embedder queue.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use codetriever_parsing::{TextChunk, TextInput, split_text_chunk};
use codetriever_progress::{IngestionPhase, ProgressManager};
use codetriever_queue::{BoundedQueue, SelfTerminatingWorker};

use super::TranscriptionProvider;
use crate::error::MediaResult;
use crate::task::TranscriptionTask;

type ProviderFactory = dyn Fn() -> Box<dyn TranscriptionProvider> + Send + Sync;

/// Wraps a [`SelfTerminatingWorker`] around the transcribe/write/chunk loop
/// described in §4.6. The provider is created lazily from `provider_factory`
/// on first use and freed on every empty poll, since the worker body has no
/// visibility into the supervisor's own idle clock (Open Question
/// resolution, see `DESIGN.md`).
pub struct TranscriptionWorker {
    inner: SelfTerminatingWorker,
}

impl TranscriptionWorker {
    #[must_use]
    pub fn new(
        provider_factory: Arc<ProviderFactory>,
        read_queue: Arc<BoundedQueue<TranscriptionTask>>,
        embedder_read_queue: Arc<BoundedQueue<TextInput>>,
        progress: Arc<ProgressManager>,
        chunk_character_limit: usize,
        remove_audio_folder_on_success: bool,
        read_sleep: Duration,
        idle_timeout: Duration,
    ) -> Self {
        let provider_slot: Arc<Mutex<Option<Box<dyn TranscriptionProvider>>>> = Arc::new(Mutex::new(None));

        let inner = SelfTerminatingWorker::new("transcription-worker", idle_timeout, move |activity| {
            let mut batch = read_queue.get_many(1);
            let Some(task) = batch.pop() else {
                release_provider(&provider_slot);
                std::thread::sleep(read_sleep);
                return;
            };
            activity.mark_active();

            let mut slot = provider_slot.lock().expect("provider slot poisoned");
            if slot.is_none() {
                *slot = Some((provider_factory)());
            }
            let provider = slot.as_deref_mut().expect("just populated above");

            match process_task(provider, &task, &progress, chunk_character_limit, remove_audio_folder_on_success) {
                Ok(inputs) => {
                    let total = inputs.len() as u64;
                    progress.set_phase_total(&task.source, IngestionPhase::Embedding, total);
                    progress.set_phase_total(&task.source, IngestionPhase::Storing, total);
                    if let Err(err) = embedder_read_queue.put_many(inputs) {
                        tracing::error!(%err, source = %task.source, "transcription worker: failed to enqueue chunks for embedding");
                    }
                }
                Err(err) => {
                    tracing::error!(%err, source = %task.source, "transcription worker: failed, marking source failed");
                    progress.mark_as_failed(&task.source);
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

fn release_provider(slot: &Mutex<Option<Box<dyn TranscriptionProvider>>>) {
    let mut slot = slot.lock().expect("provider slot poisoned");
    if let Some(mut provider) = slot.take() {
        provider.free();
    }
}

fn process_task(
    provider: &mut dyn TranscriptionProvider,
    task: &TranscriptionTask,
    progress: &ProgressManager,
    chunk_character_limit: usize,
    remove_audio_folder_on_success: bool,
) -> MediaResult<Vec<TextInput>> {
    progress.add_phase(&task.source, IngestionPhase::Transcription, true, None);

    let audio_path = task.audio_path.clone();
    let source = task.source.clone();
    let progress_for_cb = progress;
    let mut chunk_cb = |current: usize, total: usize| {
        progress_for_cb.set_phase_total(&source, IngestionPhase::Transcription, total as u64);
        progress_for_cb.set_phase_progress(&source, IngestionPhase::Transcription, current as u64);
    };

    let transcript = provider.transcribe(std::path::Path::new(&audio_path), &mut chunk_cb)?;

    let transcript_path = format!("{}/{}.txt", task.folder.trim_end_matches('/'), task.id);
    std::fs::write(&transcript_path, &transcript)?;

    if remove_audio_folder_on_success {
        let _ = std::fs::remove_dir_all(&task.folder);
    }

    Ok(chunk_transcript(task, &transcript, &transcript_path, chunk_character_limit))
}

fn chunk_transcript(
    task: &TranscriptionTask,
    transcript: &str,
    transcript_path: &str,
    chunk_character_limit: usize,
) -> Vec<TextInput> {
    let whole = TextChunk {
        start_index: 0,
        end_index: transcript.chars().count(),
        text: transcript.to_string(),
    };

    split_text_chunk(chunk_character_limit, whole)
        .into_iter()
        .map(|chunk| {
            let mut input = TextInput::new(
                uuid::Uuid::new_v4().to_string(),
                chunk.text.clone(),
                task.source.clone(),
                task.source_type.to_string(),
                &chunk,
            );
            input
                .metadata
                .extra
                .insert("transcription_path".to_string(), transcript_path.to_string());
            input
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MediaError, MediaResult as Result};
    use crate::task::TranscriptionTaskMetadata;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubProvider {
        text: String,
        freed: Arc<AtomicUsize>,
    }

    impl TranscriptionProvider for StubProvider {
        fn transcribe(
            &mut self,
            _audio_path: &std::path::Path,
            chunk_cb: &mut dyn FnMut(usize, usize),
        ) -> Result<String> {
            chunk_cb(0, 1);
            Ok(self.text.clone())
        }
        fn name(&self) -> &str {
            "stub"
        }
        fn free(&mut self) {
            self.freed.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct FailingProvider;
    impl TranscriptionProvider for FailingProvider {
        fn transcribe(&mut self, _: &std::path::Path, _: &mut dyn FnMut(usize, usize)) -> Result<String> {
            Err(MediaError::TranscriptionFailed("boom".to_string()))
        }
        fn name(&self) -> &str {
            "failing"
        }
        fn free(&mut self) {}
    }

    fn task(folder: &std::path::Path) -> TranscriptionTask {
        TranscriptionTask {
            id: "task1".to_string(),
            audio_path: folder.join("task1.mp3").to_string_lossy().to_string(),
            folder: folder.to_string_lossy().to_string(),
            source: "https://www.youtube.com/watch?v=abc".to_string(),
            source_type: "YOUTUBE_TRANSCRIPTION",
            metadata: TranscriptionTaskMetadata::default(),
        }
    }

    #[test]
    fn process_task_writes_transcript_and_chunks_it() {
        let dir = tempfile::tempdir().unwrap();
        let progress = ProgressManager::new();
        let t = task(dir.path());
        let mut provider = StubProvider {
            text: "hello world from the transcript".to_string(),
            freed: Arc::new(AtomicUsize::new(0)),
        };

        let inputs = process_task(&mut provider, &t, &progress, 1000, false).unwrap();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].source_id, t.source);
        assert!(inputs[0].metadata.extra.contains_key("transcription_path"));

        let written = std::fs::read_to_string(format!("{}/{}.txt", t.folder, t.id)).unwrap();
        assert_eq!(written, "hello world from the transcript");
        assert_eq!(
            progress.get_phase_percentage(&t.source, Some(IngestionPhase::Transcription)),
            Some(100.0)
        );
    }

    #[test]
    fn process_task_removes_audio_folder_when_requested() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("sub");
        std::fs::create_dir_all(&folder).unwrap();
        let progress = ProgressManager::new();
        let t = task(&folder);
        let mut provider = StubProvider {
            text: "bye".to_string(),
            freed: Arc::new(AtomicUsize::new(0)),
        };
        process_task(&mut provider, &t, &progress, 1000, true).unwrap();
        assert!(!folder.exists());
    }

    #[test]
    fn process_task_propagates_provider_failure() {
        let dir = tempfile::tempdir().unwrap();
        let progress = ProgressManager::new();
        let t = task(dir.path());
        let mut provider = FailingProvider;
        assert!(process_task(&mut provider, &t, &progress, 1000, false).is_err());
    }

    #[test]
    fn ensure_running_drains_task_and_forwards_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let read_queue = Arc::new(BoundedQueue::new(10));
        let embedder_read_queue = Arc::new(BoundedQueue::new(10));
        let progress = Arc::new(ProgressManager::new());
        let t = task(dir.path());
        read_queue.put_nowait(t.clone()).unwrap();

        let factory: Arc<ProviderFactory> = Arc::new(|| {
            Box::new(StubProvider {
                text: "short transcript text".to_string(),
                freed: Arc::new(AtomicUsize::new(0)),
            })
        });

        let worker = TranscriptionWorker::new(
            factory,
            read_queue,
            embedder_read_queue.clone(),
            progress.clone(),
            1000,
            false,
            Duration::from_millis(5),
            Duration::from_millis(300),
        );
        worker.ensure_running();

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while embedder_read_queue.is_empty() && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(embedder_read_queue.len(), 1);
        worker.stop(Duration::from_millis(200));
    }
}
