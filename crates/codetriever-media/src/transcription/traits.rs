//! The transcription provider interface (§6): `transcribe` returns text and
//! periodically reports `(chunk_index, total_chunks)` through `chunk_cb`;
//! `name()` identifies the provider for logging; `free()` releases whatever
//! model weights the provider holds.

use std::path::Path;

use crate::error::MediaResult;

/// A pluggable audio-to-text engine. Implementations own their model state
/// and are expected to lazily load it on first `transcribe` call.
pub trait TranscriptionProvider: Send {
    /// # Errors
    /// Returns [`crate::error::MediaError::TranscriptionFailed`] if the
    /// underlying model fails to load or to produce text.
    fn transcribe(
        &mut self,
        audio_path: &Path,
        chunk_cb: &mut dyn FnMut(usize, usize),
    ) -> MediaResult<String>;

    /// Name of this provider, for logging (e.g. `"whisper-base"`).
    fn name(&self) -> &str;

    /// Release any loaded model resources; a later `transcribe` call
    /// reloads them lazily.
    fn free(&mut self);
}
