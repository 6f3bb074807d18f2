//! Whisper-backed [`TranscriptionProvider`], grounded in `whisper-rs`
//! (bindings over `whisper.cpp`) the same way the original's `WhisperProvider`
//! wrapped OpenAI's `whisper` package.
//!
//! Model inference internals are an external collaborator this repository
//! wires up rather than reimplements (§1); audio decoding likewise shells
//! out to `ffmpeg`, mirroring how `whisper`'s own Python `audio.py` decodes
//! arbitrary input formats before handing raw PCM to the model.

use std::path::Path;
use std::process::{Command, Stdio};

use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use super::TranscriptionProvider;
use crate::error::{MediaError, MediaResult};

/// Lazily loads a whisper.cpp model on first `transcribe` call; `free()`
/// drops it so the Transcription Worker can release memory while idle.
pub struct WhisperProvider {
    model_path: String,
    context: Option<WhisperContext>,
}

impl WhisperProvider {
    #[must_use]
    pub fn new(model_path: impl Into<String>) -> Self {
        Self {
            model_path: model_path.into(),
            context: None,
        }
    }

    fn ensure_loaded(&mut self) -> MediaResult<&WhisperContext> {
        if self.context.is_none() {
            let ctx = WhisperContext::new_with_params(&self.model_path, WhisperContextParameters::default())
                .map_err(|e| MediaError::TranscriptionFailed(format!("failed to load whisper model: {e}")))?;
            self.context = Some(ctx);
        }
        Ok(self.context.as_ref().expect("just initialized above"))
    }
}

impl TranscriptionProvider for WhisperProvider {
    fn transcribe(
        &mut self,
        audio_path: &Path,
        chunk_cb: &mut dyn FnMut(usize, usize),
    ) -> MediaResult<String> {
        let samples = decode_to_pcm_f32_16k_mono(audio_path)?;

        let ctx = self.ensure_loaded()?;
        let mut state = ctx
            .create_state()
            .map_err(|e| MediaError::TranscriptionFailed(format!("failed to create whisper state: {e}")))?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_print_progress(false);
        params.set_print_special(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        state
            .full(params, &samples)
            .map_err(|e| MediaError::TranscriptionFailed(format!("whisper inference failed: {e}")))?;

        let num_segments = state
            .full_n_segments()
            .map_err(|e| MediaError::TranscriptionFailed(e.to_string()))?;

        let mut text = String::new();
        for i in 0..num_segments {
            chunk_cb(i as usize, num_segments as usize);
            let segment = state
                .full_get_segment_text(i)
                .map_err(|e| MediaError::TranscriptionFailed(e.to_string()))?;
            text.push_str(&segment);
        }

        Ok(text.trim().to_string())
    }

    fn name(&self) -> &str {
        "OpenAI Whisper"
    }

    fn free(&mut self) {
        self.context = None;
    }
}

/// Decodes `audio_path` to 16kHz mono 32-bit float PCM via a one-shot
/// `ffmpeg` invocation, the same normalization step whisper's own decoder
/// performs before inference.
fn decode_to_pcm_f32_16k_mono(audio_path: &Path) -> MediaResult<Vec<f32>> {
    let output = Command::new("ffmpeg")
        .arg("-i")
        .arg(audio_path)
        .arg("-f")
        .arg("f32le")
        .arg("-ac")
        .arg("1")
        .arg("-ar")
        .arg("16000")
        .arg("-hide_banner")
        .arg("-loglevel")
        .arg("error")
        .arg("-")
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .map_err(|e| MediaError::TranscriptionFailed(format!("failed to spawn ffmpeg: {e}")))?;

    if !output.status.success() {
        return Err(MediaError::TranscriptionFailed(format!(
            "ffmpeg exited with {}",
            output.status
        )));
    }

    Ok(output
        .stdout
        .chunks_exact(4)
        .map(|bytes| f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_clears_loaded_context() {
        let mut provider = WhisperProvider::new("nonexistent-model.bin");
        assert!(provider.context.is_none());
        provider.free();
        assert!(provider.context.is_none());
    }

    #[test]
    fn name_identifies_the_provider() {
        let provider = WhisperProvider::new("base.en.bin");
        assert_eq!(provider.name(), "OpenAI Whisper");
    }
}
