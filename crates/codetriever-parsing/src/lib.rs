//! Codetriever parsing and chunking crate
//!
//! Readers turn a file into position-tracked [`chunk::TextChunk`]s for the
//! ingestion pipeline (§4.3): a word-boundary chunker shared by every
//! reader, a plain-text reader, a tag-aware HTML reader, and the
//! extension-based routing that picks between them.

pub mod chunk;
pub mod error;
pub mod html;
pub mod reader;
pub mod source_type;

pub use chunk::{TextChunk, TextInput, TextInputMetadata, split_text_chunk};
pub use error::{ParsingError, ParsingResult};
pub use html::HtmlReader;
pub use reader::{Reader, TextReader, reader_for_path};
pub use source_type::{SourceType, is_audio_extension, source_type_for_path};
