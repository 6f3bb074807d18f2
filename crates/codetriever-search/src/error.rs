//! Error types for the search engine (§4.10).

use codetriever_common::kind::{ErrorKind, HasErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("too many sources requested for deep search ({found} > {max})")]
    TooManySources { found: usize, max: usize },

    #[error("timed out waiting for query vectors after {0:?}")]
    VectorTimeout(std::time::Duration),

    #[error("queue error: {0}")]
    Queue(String),

    #[error("vector index error: {0}")]
    VectorData(#[from] codetriever_vector_data::VectorDataError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl HasErrorKind for SearchError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::TooManySources { .. } => ErrorKind::BadRequest,
            Self::VectorTimeout(_) => ErrorKind::Timeout,
            Self::Queue(_) | Self::VectorData(_) => ErrorKind::Dependency,
            Self::Io(_) => ErrorKind::Internal,
        }
    }
}

pub type SearchResult<T> = Result<T, SearchError>;
