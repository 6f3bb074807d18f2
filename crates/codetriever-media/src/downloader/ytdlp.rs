//! Concrete [`Downloader`] that shells out to the `yt-dlp` binary.
//!
//! The actual YouTube-extraction and audio-transcoding logic is an external
//! collaborator this repository wires up rather than reimplements (§1):
//! `yt-dlp` (with its bundled `ffmpeg` postprocessor) plays the same role
//! here that the `yt_dlp` Python library played in the original — one
//! invocation picks the best audio track, transcodes it to mp3 at the
//! configured bitrate, and reports both progress and final metadata.

use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Command, Stdio};

use once_cell::sync::Lazy;
use regex::Regex;

use super::Downloader;
use crate::error::{MediaError, MediaResult};
use crate::task::{TranscriptionTask, TranscriptionTaskMetadata};

/// Drives `yt-dlp <url> --extract-audio --audio-format mp3 ...` in a child
/// process and parses its `--newline` progress output plus a trailing
/// `--print-json` metadata line.
pub struct YtDlpDownloader {
    binary: String,
}

impl YtDlpDownloader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            binary: "yt-dlp".to_string(),
        }
    }

    /// Override the binary name/path, e.g. for tests that stub it out.
    #[must_use]
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for YtDlpDownloader {
    fn default() -> Self {
        Self::new()
    }
}

impl Downloader for YtDlpDownloader {
    fn download(
        &self,
        url: &str,
        dest_dir: &Path,
        id: &str,
        on_progress: &mut dyn FnMut(u64, u64),
    ) -> MediaResult<TranscriptionTask> {
        std::fs::create_dir_all(dest_dir)?;

        let bitrate = codetriever_config::constants::target_audio_bitrate_kbps();
        let output_template = dest_dir.join(format!("{id}.%(ext)s"));

        let mut child = Command::new(&self.binary)
            .arg("--format")
            .arg("bestaudio/best")
            .arg("--extract-audio")
            .arg("--audio-format")
            .arg("mp3")
            .arg("--audio-quality")
            .arg(bitrate.to_string())
            .arg("--output")
            .arg(output_template.to_string_lossy().to_string())
            .arg("--newline")
            .arg("--print-json")
            .arg("--no-simulate")
            .arg(url)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| MediaError::DownloadFailed(format!("failed to spawn {}: {e}", self.binary)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MediaError::DownloadFailed("yt-dlp produced no stdout pipe".to_string()))?;

        let mut metadata_line: Option<String> = None;
        for line in BufReader::new(stdout).lines() {
            let line = line.map_err(|e| MediaError::DownloadFailed(e.to_string()))?;
            if let Some((downloaded, total)) = parse_progress_line(&line) {
                on_progress(downloaded, total);
            } else if line.trim_start().starts_with('{') {
                metadata_line = Some(line);
            }
        }

        let status = child.wait().map_err(|e| MediaError::DownloadFailed(e.to_string()))?;
        if !status.success() {
            return Err(MediaError::DownloadFailed(format!(
                "{} exited with {status}",
                self.binary
            )));
        }

        let info: serde_json::Value = metadata_line
            .as_deref()
            .and_then(|line| serde_json::from_str(line).ok())
            .ok_or_else(|| MediaError::DownloadFailed("yt-dlp produced no metadata json".to_string()))?;

        let audio_path = locate_output_file(dest_dir, id)?;

        Ok(TranscriptionTask {
            id: id.to_string(),
            audio_path,
            folder: dest_dir.to_string_lossy().to_string(),
            source: url.to_string(),
            source_type: codetriever_parsing::SourceType::YoutubeTranscription.as_str(),
            metadata: TranscriptionTaskMetadata {
                title: info
                    .get("title")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                video_id: info
                    .get("id")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                duration: info.get("duration").and_then(serde_json::Value::as_f64),
                uploader: info
                    .get("uploader")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
            },
        })
    }
}

/// Parses a `--newline` progress line, e.g.
/// `[download]  42.0% of    3.45MiB at  300.00KiB/s ETA 00:05`, into
/// `(downloaded_bytes, total_bytes)` by applying the percentage to the
/// parsed total size.
fn parse_progress_line(line: &str) -> Option<(u64, u64)> {
    static RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"\[download\]\s+(\d+(?:\.\d+)?)% of\s+~?\s*(\d+(?:\.\d+)?)(KiB|MiB|GiB)")
            .expect("static progress regex is valid")
    });
    let caps = RE.captures(line)?;
    let percent: f64 = caps.get(1)?.as_str().parse().ok()?;
    let size: f64 = caps.get(2)?.as_str().parse().ok()?;
    let unit = caps.get(3)?.as_str();
    let multiplier = match unit {
        "KiB" => 1024.0,
        "MiB" => 1024.0 * 1024.0,
        "GiB" => 1024.0 * 1024.0 * 1024.0,
        _ => return None,
    };
    let total = (size * multiplier) as u64;
    let downloaded = ((percent / 100.0) * total as f64) as u64;
    Some((downloaded, total))
}

/// yt-dlp names the final mp3 `<id>.mp3` per our output template; scan the
/// directory for it rather than trusting a guessed extension, since a
/// postprocessing failure can leave the pre-conversion file behind instead.
fn locate_output_file(dest_dir: &Path, id: &str) -> MediaResult<String> {
    for entry in std::fs::read_dir(dest_dir)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().starts_with(id) {
            return Ok(entry.path().to_string_lossy().to_string());
        }
    }
    Err(MediaError::DownloadFailed(format!(
        "no output file found for task {id} in {}",
        dest_dir.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_standard_progress_line() {
        let line = "[download]  42.0% of    3.45MiB at  300.00KiB/s ETA 00:05";
        let (downloaded, total) = parse_progress_line(line).unwrap();
        assert!(total > 0);
        assert!(downloaded <= total);
    }

    #[test]
    fn non_progress_lines_return_none() {
        assert!(parse_progress_line("[youtube] Extracting URL").is_none());
    }

    #[test]
    fn locate_output_file_finds_matching_prefix() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("abc123.mp3"), b"data").unwrap();
        let found = locate_output_file(dir.path(), "abc123").unwrap();
        assert!(found.ends_with("abc123.mp3"));
    }

    #[test]
    fn locate_output_file_errors_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(locate_output_file(dir.path(), "missing").is_err());
    }
}
