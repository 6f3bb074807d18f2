//! The Download Worker (§4.5): a self-terminating consumer that turns
//! accepted YouTube URLs into [`TranscriptionTask`]s for the transcription
//! queue, tracking `DOWNLOADING` phase bytes as it goes.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use codetriever_progress::{IngestionPhase, ProgressManager};
use codetriever_queue::{BoundedQueue, SelfTerminatingWorker};

use super::{Downloader, validate_youtube_url};
use crate::task::TranscriptionTask;

/// Wraps a [`SelfTerminatingWorker`] around the per-URL validate/download/
/// enqueue loop described in §4.5. URLs that fail validation or download
/// are reported to the progress manager as failed and otherwise dropped.
pub struct DownloadWorker {
    inner: SelfTerminatingWorker,
}

impl DownloadWorker {
    #[must_use]
    pub fn new(
        downloader: Arc<dyn Downloader>,
        read_queue: Arc<BoundedQueue<String>>,
        write_queue: Arc<BoundedQueue<TranscriptionTask>>,
        progress: Arc<ProgressManager>,
        temp_dir_root: PathBuf,
        read_sleep: Duration,
        idle_timeout: Duration,
    ) -> Self {
        let inner = SelfTerminatingWorker::new("download-worker", idle_timeout, move |activity| {
            let mut batch = read_queue.get_many(1);
            let Some(url) = batch.pop() else {
                std::thread::sleep(read_sleep);
                return;
            };
            activity.mark_active();

            match process_url(downloader.as_ref(), &url, &temp_dir_root, &progress) {
                Ok(task) => {
                    if let Err(err) = write_queue.put_many(vec![task]) {
                        tracing::error!(%err, url, "download worker: failed to enqueue transcription task");
                    }
                }
                Err(err) => {
                    tracing::error!(%err, url, "download worker: download failed, marking source failed");
                    progress.mark_as_failed(&url);
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

fn process_url(
    downloader: &dyn Downloader,
    url: &str,
    temp_dir_root: &std::path::Path,
    progress: &ProgressManager,
) -> crate::error::MediaResult<TranscriptionTask> {
    validate_youtube_url(url)?;

    let id = task_id();
    let dest_dir = temp_dir_root.join(&id);
    let progress_for_hook = progress;
    let mut on_progress = |downloaded: u64, total: u64| {
        progress_for_hook.set_phase_total(url, IngestionPhase::Downloading, total);
        progress_for_hook.set_phase_progress(url, IngestionPhase::Downloading, downloaded);
    };

    downloader.download(url, &dest_dir, &id, &mut on_progress)
}

/// Short id shared by the per-task temp folder and the eventual transcript
/// filename, mirroring the original's truncated-uuid per-task folder name.
fn task_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..12].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MediaError, MediaResult};
    use crate::task::TranscriptionTaskMetadata;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct StubDownloader {
        calls: AtomicUsize,
        fail: bool,
    }

    impl Downloader for StubDownloader {
        fn download(
            &self,
            url: &str,
            dest_dir: &std::path::Path,
            id: &str,
            on_progress: &mut dyn FnMut(u64, u64),
        ) -> MediaResult<TranscriptionTask> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(MediaError::DownloadFailed("stub failure".to_string()));
            }
            on_progress(50, 100);
            on_progress(100, 100);
            Ok(TranscriptionTask {
                id: id.to_string(),
                audio_path: dest_dir.join(format!("{id}.mp3")).to_string_lossy().to_string(),
                folder: dest_dir.to_string_lossy().to_string(),
                source: url.to_string(),
                source_type: "YOUTUBE_TRANSCRIPTION",
                metadata: TranscriptionTaskMetadata::default(),
            })
        }
    }

    #[test]
    fn successful_download_enqueues_task_and_reports_progress() {
        let downloader: Arc<dyn Downloader> = Arc::new(StubDownloader {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let read_queue = Arc::new(BoundedQueue::new(10));
        let write_queue = Arc::new(BoundedQueue::new(10));
        let progress = Arc::new(ProgressManager::new());
        let url = "https://www.youtube.com/watch?v=abc123";
        progress.add_phase(url, IngestionPhase::Downloading, true, None);

        read_queue.put_nowait(url.to_string()).unwrap();

        let worker = DownloadWorker::new(
            downloader,
            read_queue,
            write_queue.clone(),
            progress.clone(),
            std::env::temp_dir(),
            Duration::from_millis(5),
            Duration::from_millis(300),
        );
        worker.ensure_running();

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while write_queue.is_empty() && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(write_queue.len(), 1);
        assert_eq!(
            progress.get_phase_percentage(url, Some(IngestionPhase::Downloading)),
            Some(100.0)
        );
        worker.stop(Duration::from_millis(200));
    }

    #[test]
    fn rejected_url_marks_source_failed_without_calling_downloader() {
        let calls = Arc::new(Mutex::new(0));
        struct CountingDownloader(Arc<Mutex<i32>>);
        impl Downloader for CountingDownloader {
            fn download(
                &self,
                _url: &str,
                _dest_dir: &std::path::Path,
                _id: &str,
                _on_progress: &mut dyn FnMut(u64, u64),
            ) -> MediaResult<TranscriptionTask> {
                *self.0.lock().unwrap() += 1;
                Err(MediaError::DownloadFailed("should not be called".to_string()))
            }
        }

        let downloader: Arc<dyn Downloader> = Arc::new(CountingDownloader(calls.clone()));
        let read_queue = Arc::new(BoundedQueue::new(10));
        let write_queue = Arc::new(BoundedQueue::new(10));
        let progress = Arc::new(ProgressManager::new());
        let url = "https://example.com/not-youtube";

        let failure_fired = Arc::new(AtomicUsize::new(0));
        let failure_clone = failure_fired.clone();
        progress.create_state(
            url,
            None,
            Some(Box::new(move || {
                failure_clone.fetch_add(1, Ordering::SeqCst);
            })),
        );

        read_queue.put_nowait(url.to_string()).unwrap();

        let worker = DownloadWorker::new(
            downloader,
            read_queue,
            write_queue,
            progress.clone(),
            std::env::temp_dir(),
            Duration::from_millis(5),
            Duration::from_millis(300),
        );
        worker.ensure_running();

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while progress.get_state(url).is_some() && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(failure_fired.load(Ordering::SeqCst), 1);
        assert_eq!(*calls.lock().unwrap(), 0);
        worker.stop(Duration::from_millis(200));
    }
}
