//! The Download Worker's collaborator interface (§4.5).

pub mod worker;
pub mod ytdlp;

pub use worker::DownloadWorker;
pub use ytdlp::YtDlpDownloader;

use std::path::Path;

use crate::error::{MediaError, MediaResult};
use crate::task::TranscriptionTask;

/// A pluggable YouTube-audio downloader. `id` names the per-task temp
/// subdirectory and the eventual output filename stem; `on_progress` is
/// called with `(downloaded_bytes, total_bytes)` as the download proceeds.
pub trait Downloader: Send + Sync {
    /// # Errors
    /// Returns [`MediaError::DownloadFailed`] if the download or audio
    /// extraction fails, or nothing recognizable was produced.
    fn download(
        &self,
        url: &str,
        dest_dir: &Path,
        id: &str,
        on_progress: &mut dyn FnMut(u64, u64),
    ) -> MediaResult<TranscriptionTask>;
}

/// Rejects non-HTTP(S) URLs and URLs whose host does not contain
/// "youtube" (or equal `youtu.be`), per §4.5.
///
/// # Errors
/// Returns [`MediaError::UnsupportedUrl`] for anything else, including
/// URLs that fail to parse at all.
pub fn validate_youtube_url(url: &str) -> MediaResult<()> {
    let parsed =
        reqwest::Url::parse(url).map_err(|e| MediaError::UnsupportedUrl(format!("{url}: {e}")))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(MediaError::UnsupportedUrl(url.to_string()));
    }

    let host = parsed.host_str().unwrap_or_default();
    if host.contains("youtube") || host == "youtu.be" {
        Ok(())
    } else {
        Err(MediaError::UnsupportedUrl(url.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_standard_youtube_hosts() {
        assert!(validate_youtube_url("https://www.youtube.com/watch?v=abc").is_ok());
        assert!(validate_youtube_url("https://youtu.be/abc").is_ok());
        assert!(validate_youtube_url("http://m.youtube.com/watch?v=abc").is_ok());
    }

    #[test]
    fn rejects_non_http_schemes() {
        assert!(validate_youtube_url("ftp://youtube.com/video").is_err());
    }

    #[test]
    fn rejects_non_youtube_hosts() {
        assert!(validate_youtube_url("https://example.com/video.mp4").is_err());
    }

    #[test]
    fn rejects_unparseable_urls() {
        assert!(validate_youtube_url("not a url").is_err());
    }
}
