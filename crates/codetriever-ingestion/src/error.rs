//! Error types for the ingestion coordinator and storage worker.

use codetriever_common::kind::{ErrorKind, HasErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("too many paths expanded from input ({found} > {max})")]
    TooManyPaths { found: usize, max: usize },

    #[error("path not found: {0}")]
    PathNotFound(String),

    #[error("reader error: {0}")]
    Reader(#[from] codetriever_parsing::ParsingError),

    #[error("vector index error: {0}")]
    VectorData(#[from] codetriever_vector_data::VectorDataError),

    #[error("queue error: {0}")]
    Queue(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl HasErrorKind for IngestionError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::TooManyPaths { .. } | Self::PathNotFound(_) => ErrorKind::BadRequest,
            Self::Reader(_) => ErrorKind::BadRequest,
            Self::VectorData(_) | Self::Queue(_) => ErrorKind::Dependency,
            Self::Io(_) => ErrorKind::Internal,
        }
    }
}

pub type IngestionResult<T> = Result<T, IngestionError>;
