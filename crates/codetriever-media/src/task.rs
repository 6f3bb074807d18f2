//! The unit of work handed from the Download Worker to the Transcription
//! Worker (§4.5, §4.6).

/// Audio-specific metadata the downloader extracts alongside the file
/// itself; carried through to the transcript's eventual `TextInput.extra`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TranscriptionTaskMetadata {
    pub title: String,
    pub video_id: String,
    pub duration: Option<f64>,
    pub uploader: String,
}

/// A downloaded audio file awaiting transcription.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptionTask {
    /// Short id shared by the per-task temp folder and the eventual
    /// `<folder>/<id>.txt` transcript file.
    pub id: String,
    pub audio_path: String,
    pub folder: String,
    /// The original URL; becomes the source path in the vector index.
    pub source: String,
    pub source_type: &'static str,
    pub metadata: TranscriptionTaskMetadata,
}
