//! Audio-to-text collaborators for the Transcription Worker (§4.6).

pub mod traits;
pub mod whisper;
pub mod worker;

pub use traits::TranscriptionProvider;
pub use whisper::WhisperProvider;
pub use worker::TranscriptionWorker;
