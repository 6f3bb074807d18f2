//! Position-tracked text chunks and the word-boundary splitter shared by
//! every reader (§4.3).

use std::collections::HashMap;

/// A chunk of text together with its position in the source's canonical
/// text (see [`crate::reader::Reader`] for what "canonical" means per
/// reader type).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub start_index: usize,
    pub end_index: usize,
    pub text: String,
}

/// A chunk in flight through the ingestion pipeline (§3's `TextInput`).
///
/// Produced by the Ingestion Coordinator from a Reader's chunks, vectorized
/// in place by the Embedder Worker, then appended to the vector index by
/// the Storage Worker. `vector` is set exactly once, by the embedder.
#[derive(Debug, Clone, PartialEq)]
pub struct TextInput {
    pub text: String,
    pub metadata: TextInputMetadata,
    pub vector: Option<Vec<f32>>,
    /// Logical data-source identifier used for progress accounting; may
    /// differ from `metadata.source` for the `"user-query"` pseudo-source.
    pub source_id: String,
}

/// Fixed fields every `TextInput` carries plus a free-form extension map
/// for per-source-type extras (e.g. a transcript's `transcription_path`).
#[derive(Debug, Clone, PartialEq)]
pub struct TextInputMetadata {
    pub id: String,
    pub source: String,
    pub source_type: String,
    pub start_index: usize,
    pub end_index: usize,
    pub extra: HashMap<String, String>,
}

impl TextInput {
    #[must_use]
    pub fn new(id: String, text: String, source: String, source_type: String, chunk: &TextChunk) -> Self {
        let source_id = source.clone();
        Self {
            text,
            metadata: TextInputMetadata {
                id,
                source,
                source_type,
                start_index: chunk.start_index,
                end_index: chunk.end_index,
                extra: HashMap::new(),
            },
            vector: None,
            source_id,
        }
    }
}

/// Split `text` (already known to live at `[start_index, end_index)` in
/// some canonical text) into pieces no longer than `chunk_size_max`,
/// preferring the last whitespace inside the window as a break point so
/// words are never split. Whitespace-only results are discarded.
pub fn split_text_chunk(chunk_size_max: usize, chunk: TextChunk) -> Vec<TextChunk> {
    let text = chunk.text.as_str();
    if text.chars().count() <= chunk_size_max {
        return vec![chunk];
    }

    let chars: Vec<char> = text.chars().collect();
    let mut out = Vec::new();
    let mut start_pos = 0usize;

    while start_pos < chars.len() {
        let mut end_pos = (start_pos + chunk_size_max).min(chars.len());

        if end_pos < chars.len() {
            if let Some(last_space) = rfind_space(&chars, start_pos, end_pos) {
                if last_space > start_pos {
                    end_pos = last_space;
                }
            }
        }

        let piece: String = chars[start_pos..end_pos].iter().collect();
        let trimmed = piece.trim();
        if !trimmed.is_empty() {
            let piece_start = chunk.start_index + start_pos;
            let piece_end = chunk.start_index + end_pos;
            out.push(TextChunk {
                start_index: piece_start,
                end_index: piece_end,
                text: trimmed.to_string(),
            });
        }

        start_pos = end_pos;
        while start_pos < chars.len() && chars[start_pos].is_whitespace() {
            start_pos += 1;
        }
    }

    out
}

fn rfind_space(chars: &[char], from: usize, to: usize) -> Option<usize> {
    (from..to).rev().find(|&i| chars[i] == ' ')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str) -> TextChunk {
        TextChunk {
            start_index: 0,
            end_index: text.len(),
            text: text.to_string(),
        }
    }

    #[test]
    fn short_text_is_not_split() {
        let result = split_text_chunk(100, chunk("hello world"));
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].text, "hello world");
    }

    #[test]
    fn long_text_is_split_on_word_boundaries() {
        let text = "the quick brown fox jumps over the lazy dog";
        let result = split_text_chunk(10, chunk(text));
        assert!(result.len() > 1);
        for piece in &result {
            assert!(piece.text.chars().count() <= 10);
            assert!(!piece.text.trim().is_empty());
        }
    }

    #[test]
    fn indices_are_recoverable_into_the_original() {
        let text = "alpha beta gamma delta epsilon zeta eta theta";
        let original = TextChunk {
            start_index: 5,
            end_index: 5 + text.len(),
            text: text.to_string(),
        };
        let result = split_text_chunk(12, original);
        assert!(result.len() > 1);
        // Every start/end is inside [5, 5+len], monotonically increasing.
        let mut prev_end = 5;
        for piece in &result {
            assert!(piece.start_index >= prev_end.min(piece.start_index));
            assert!(piece.end_index <= 5 + text.len());
            prev_end = piece.end_index;
        }
    }

    #[test]
    fn whitespace_only_text_is_skipped() {
        let result = split_text_chunk(5, chunk("     "));
        assert!(result.is_empty());
    }

    #[test]
    fn text_input_new_carries_chunk_positions_and_starts_unvectorized() {
        let c = TextChunk {
            start_index: 10,
            end_index: 20,
            text: "some text".to_string(),
        };
        let input = TextInput::new(
            "id-1".to_string(),
            c.text.clone(),
            "/path/to/file.txt".to_string(),
            "LOCAL_TEXT_FILE".to_string(),
            &c,
        );
        assert_eq!(input.metadata.start_index, 10);
        assert_eq!(input.metadata.end_index, 20);
        assert_eq!(input.source_id, "/path/to/file.txt");
        assert!(input.vector.is_none());
    }
}
