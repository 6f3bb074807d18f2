//! Codetriever embedding generation crate
//!
//! This crate provides ML-based embedding generation for semantic code search.
//! It handles the conversion of code text into high-dimensional vectors using
//! transformer models like Jina embeddings.

pub mod embedding;
pub mod error;
pub mod worker;

// Re-export main types
pub use embedding::{
    DefaultEmbeddingProvider, DefaultEmbeddingService, EmbeddingModel, EmbeddingProvider,
    EmbeddingService, EmbeddingStats,
};
pub use error::{EmbeddingError, EmbeddingResult};
pub use worker::EmbedderWorker;
