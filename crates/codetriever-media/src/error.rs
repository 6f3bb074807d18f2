//! Error types for the download and transcription pipeline (§4.5, §4.6).

use codetriever_common::kind::{ErrorKind, HasErrorKind};
use thiserror::Error;

/// Failure modes for the [`crate::downloader::Downloader`] and
/// [`crate::transcription::TranscriptionProvider`] collaborators.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The URL is not `http(s)` or its host is not a recognized YouTube host.
    #[error("rejected url: {0}")]
    UnsupportedUrl(String),

    /// The download subprocess failed or produced no recognizable output file.
    #[error("download failed: {0}")]
    DownloadFailed(String),

    /// The transcription provider failed to produce text.
    #[error("transcription failed: {0}")]
    TranscriptionFailed(String),

    /// Filesystem I/O failure (temp dir creation, transcript write, audio cleanup).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl HasErrorKind for MediaError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedUrl(_) => ErrorKind::BadRequest,
            Self::DownloadFailed(_) | Self::TranscriptionFailed(_) => ErrorKind::Dependency,
            Self::Io(_) => ErrorKind::Internal,
        }
    }
}

pub type MediaResult<T> = Result<T, MediaError>;
