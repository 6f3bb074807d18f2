//! The Ingestion Coordinator (§4.9): accepts a new file or URL, creates its
//! `Source` row and `IngestionState`, and routes it to the right queue.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use codetriever_media::TranscriptionTask;
use codetriever_parsing::{SourceType, TextInput, is_audio_extension, reader_for_path};
use codetriever_progress::{IngestionPhase, ProgressManager};
use codetriever_queue::BoundedQueue;
use codetriever_vector_data::{CollectionState, DataSourceMap};

use crate::error::{IngestionError, IngestionResult};

pub struct IngestionCoordinator {
    data_source_map: Arc<dyn DataSourceMap>,
    progress: Arc<ProgressManager>,
    embedder_read_queue: Arc<BoundedQueue<TextInput>>,
    download_queue: Arc<BoundedQueue<String>>,
    transcription_queue: Arc<BoundedQueue<TranscriptionTask>>,
    chunk_character_limit: usize,
    max_file_paths: usize,
}

impl IngestionCoordinator {
    #[must_use]
    pub fn new(
        data_source_map: Arc<dyn DataSourceMap>,
        progress: Arc<ProgressManager>,
        embedder_read_queue: Arc<BoundedQueue<TextInput>>,
        download_queue: Arc<BoundedQueue<String>>,
        transcription_queue: Arc<BoundedQueue<TranscriptionTask>>,
        chunk_character_limit: usize,
        max_file_paths: usize,
    ) -> Self {
        Self {
            data_source_map,
            progress,
            embedder_read_queue,
            download_queue,
            transcription_queue,
            chunk_character_limit,
            max_file_paths,
        }
    }

    /// §4.9 `enqueue_file`: expands directories, then ingests every file
    /// individually (text through the chunker/embedder queue, audio
    /// through the transcription queue directly — no download step for an
    /// already-local file).
    pub async fn enqueue_file(&self, paths: Vec<String>, source_name: Option<String>) -> IngestionResult<()> {
        let expanded = expand_paths(&paths, self.max_file_paths)?;

        for path in expanded {
            self.enqueue_one_file(&path, source_name.as_deref()).await?;
        }
        Ok(())
    }

    /// §4.9 `enqueue_url`: same source-creation shape as `enqueue_file`,
    /// but routes through the download queue and only adds the
    /// `DOWNLOADING` phase up front — `TRANSCRIPTION`/`EMBEDDING`/`STORING`
    /// are added later, by the Download and Transcription Workers, once
    /// their totals are knowable.
    pub async fn enqueue_url(&self, url: String, source_name: Option<String>) -> IngestionResult<()> {
        if self.data_source_map.exists(&url).await? {
            self.data_source_map.delete(&url).await?;
        }

        self.data_source_map
            .create(&url, SourceType::YoutubeTranscription.as_str(), source_name.as_deref(), CollectionState::Processing)
            .await?;
        self.register_progress(&url);
        self.progress.add_phase(&url, IngestionPhase::Downloading, true, None);

        self.download_queue
            .put_many(vec![url])
            .map_err(|e| IngestionError::Queue(e.to_string()))
    }

    async fn enqueue_one_file(&self, path: &Path, source_name: Option<&str>) -> IngestionResult<()> {
        let path_str = path.to_string_lossy().to_string();

        if self.data_source_map.exists(&path_str).await? {
            self.data_source_map.delete(&path_str).await?;
        }

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();

        if is_audio_extension(extension) {
            self.enqueue_local_audio(path, &path_str, source_name).await
        } else {
            self.enqueue_local_text(path, &path_str, source_name).await
        }
    }

    async fn enqueue_local_audio(&self, path: &Path, path_str: &str, source_name: Option<&str>) -> IngestionResult<()> {
        self.data_source_map
            .create(path_str, SourceType::LocalAudioFile.as_str(), source_name, CollectionState::Processing)
            .await?;
        self.register_progress(path_str);
        self.progress.add_phase(path_str, IngestionPhase::Transcription, true, None);

        let folder = path
            .parent()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();

        let task = TranscriptionTask {
            id: uuid::Uuid::new_v4().simple().to_string()[..12].to_string(),
            audio_path: path_str.to_string(),
            folder,
            source: path_str.to_string(),
            source_type: SourceType::LocalAudioFile.as_str(),
            metadata: Default::default(),
        };

        self.transcription_queue
            .put_many(vec![task])
            .map_err(|e| IngestionError::Queue(e.to_string()))
    }

    async fn enqueue_local_text(&self, path: &Path, path_str: &str, source_name: Option<&str>) -> IngestionResult<()> {
        let reader = reader_for_path(path, self.chunk_character_limit)?;
        let source_type = reader.source_type();

        self.data_source_map
            .create(path_str, source_type.as_str(), source_name, CollectionState::Processing)
            .await?;
        self.register_progress(path_str);

        let chunks = reader.read_iter()?;
        if chunks.is_empty() {
            self.progress.mark_as_completed(path_str);
            return Ok(());
        }

        let total = chunks.len() as u64;
        self.progress.add_phase(path_str, IngestionPhase::Embedding, true, Some(total));
        self.progress.add_phase(path_str, IngestionPhase::Storing, false, Some(total));

        let inputs: Vec<TextInput> = chunks
            .into_iter()
            .map(|chunk| {
                TextInput::new(
                    uuid::Uuid::new_v4().to_string(),
                    chunk.text.clone(),
                    path_str.to_string(),
                    source_type.as_str().to_string(),
                    &chunk,
                )
            })
            .collect();

        self.embedder_read_queue
            .put_many(inputs)
            .map_err(|e| IngestionError::Queue(e.to_string()))
    }

    /// §4.9 step 3: `IngestionState` with callbacks wired to the vector
    /// index, plus the always-present `INITIALIZATION` phase (total 1,
    /// immediately completed).
    fn register_progress(&self, source: &str) {
        let success_cb = self.data_source_map.clone().success_ingestion_process_callback(source.to_string());
        let failure_cb = self.data_source_map.clone().fail_ingestion_process_callback(source.to_string());
        self.progress.create_state(source, Some(success_cb), Some(failure_cb));
        self.progress.add_phase(source, IngestionPhase::Initialization, true, Some(1));
        self.progress.set_phase_progress(source, IngestionPhase::Initialization, 1);
    }
}

/// Expands directories recursively into individual file paths, enforcing
/// the configured cap (§4.9 step 1).
fn expand_paths(paths: &[String], max_file_paths: usize) -> IngestionResult<Vec<PathBuf>> {
    let mut expanded = Vec::new();

    for raw in paths {
        let path = PathBuf::from(raw);
        if !path.exists() {
            return Err(IngestionError::PathNotFound(raw.clone()));
        }

        if path.is_dir() {
            for entry in walkdir::WalkDir::new(&path).into_iter().filter_map(Result::ok) {
                if entry.file_type().is_file() {
                    expanded.push(entry.path().to_path_buf());
                }
            }
        } else {
            expanded.push(path);
        }
    }

    if expanded.len() > max_file_paths {
        return Err(IngestionError::TooManyPaths {
            found: expanded.len(),
            max: max_file_paths,
        });
    }

    Ok(expanded)
}
