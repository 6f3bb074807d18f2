//! Download and transcription pipeline for audio/video sources (§4.5, §4.6):
//! a [`downloader::Downloader`] turns an accepted URL into a local audio
//! file, and a [`transcription::TranscriptionProvider`] turns that file into
//! text for the embedding pipeline.

pub mod downloader;
pub mod error;
pub mod task;
pub mod transcription;

pub use downloader::{DownloadWorker, Downloader, YtDlpDownloader, validate_youtube_url};
pub use error::{MediaError, MediaResult};
pub use task::{TranscriptionTask, TranscriptionTaskMetadata};
pub use transcription::{TranscriptionProvider, TranscriptionWorker, WhisperProvider};
