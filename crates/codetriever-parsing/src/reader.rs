//! The `Reader` trait, the plain-text reader, and extension-based routing
//! (§4.3).

use crate::chunk::{TextChunk, split_text_chunk};
use crate::error::{ParsingError, ParsingResult};
use crate::html::HtmlReader;
use crate::source_type::{SourceType, source_type_for_path};
use std::path::{Path, PathBuf};

/// A source of chunkable text. `read()` returns the canonical text the
/// chunk indices are relative to; for most readers that's the same text
/// `read_iter()` chunks, but HTML's canonical text is the raw markup
/// while the chunked text is the cleaned inner content (§4.3).
pub trait Reader: Send + Sync {
    fn source_type(&self) -> SourceType;
    fn read(&self) -> ParsingResult<String>;
    fn read_iter(&self) -> ParsingResult<Vec<TextChunk>>;
}

/// Reads a file as plain UTF-8 text, one `TextChunk` per non-empty line
/// (further split on word boundaries if a line exceeds `chunk_size_max`).
pub struct TextReader {
    path: PathBuf,
    chunk_size_max: usize,
}

impl TextReader {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, chunk_size_max: usize) -> Self {
        Self {
            path: path.into(),
            chunk_size_max,
        }
    }
}

impl Reader for TextReader {
    fn source_type(&self) -> SourceType {
        SourceType::LocalTextFile
    }

    fn read(&self) -> ParsingResult<String> {
        std::fs::read_to_string(&self.path).map_err(ParsingError::from)
    }

    fn read_iter(&self) -> ParsingResult<Vec<TextChunk>> {
        let content = self.read()?;
        let mut chunks = Vec::new();
        let mut char_index = 0usize;

        for line in content.split_inclusive('\n') {
            let line_len = line.chars().count();
            let trimmed = line.trim_end_matches(['\n', '\r']);

            if !trimmed.trim().is_empty() {
                let line_chunk = TextChunk {
                    start_index: char_index,
                    end_index: char_index + trimmed.chars().count(),
                    text: trimmed.to_string(),
                };
                chunks.extend(split_text_chunk(self.chunk_size_max, line_chunk));
            }

            char_index += line_len;
        }

        Ok(chunks)
    }
}

/// Builds the appropriate [`Reader`] for `path` based on its extension
/// (§4.9's routing step), defaulting to [`TextReader`] for unrecognized
/// or binary-format extensions this repository doesn't decode.
pub fn reader_for_path(path: &Path, chunk_size_max: usize) -> ParsingResult<Box<dyn Reader>> {
    match source_type_for_path(path) {
        SourceType::LocalHtmlFile => Ok(Box::new(HtmlReader::new(path, chunk_size_max))),
        SourceType::LocalPdfFile | SourceType::LocalDocxFile | SourceType::LocalPptxFile => {
            Err(ParsingError::LanguageUnsupported(format!(
                "no decoder registered for {}",
                path.display()
            )))
        }
        _ => Ok(Box::new(TextReader::new(path, chunk_size_max))),
    }
}
