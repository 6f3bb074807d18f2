//! Value types shared by the [`crate::traits::DataSourceMap`] trait and its
//! SQLite-backed implementation (§4.4).

use serde_json::Map;
use serde_json::Value;

/// Lifecycle state of a data source's collection.
///
/// `NotFound` is never persisted — it's a Rust-side sentinel `get_source_stats`
/// returns for a source with no row, matching the original's behavior of
/// answering with a zeroed-out stats record rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionState {
    Processing,
    Completed,
    Failed,
    NotFound,
}

impl CollectionState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::NotFound => "not_found",
        }
    }
}

impl std::str::FromStr for CollectionState {
    type Err = crate::error::VectorDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "not_found" => Ok(Self::NotFound),
            other => Err(crate::error::VectorDataError::Other(format!(
                "unknown collection state '{other}'"
            ))),
        }
    }
}

/// Per-source aggregate statistics (§4.4 `get_sources_stats`/`get_source_stats*`).
#[derive(Debug, Clone, PartialEq)]
pub struct DataSourceStats {
    pub source_name: Option<String>,
    pub source_path: String,
    pub status: CollectionState,
    pub vector_count: u64,
    pub dimension: usize,
}

impl DataSourceStats {
    #[must_use]
    pub fn not_found(source_path: &str) -> Self {
        Self {
            source_name: None,
            source_path: source_path.to_string(),
            status: CollectionState::NotFound,
            vector_count: 0,
            dimension: 0,
        }
    }
}

/// A collection whose nearest member is within the distance threshold of a
/// query (§4.4 `get_relevant_sources`).
#[derive(Debug, Clone, PartialEq)]
pub struct RelevantCollection {
    pub collection: String,
    pub min_distance: f32,
    pub avg_distance: f32,
    pub count: u64,
}

/// A stored chunk of text with its embedding and arbitrary metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEmbedding {
    pub id: String,
    pub collection: String,
    pub text: String,
    pub vector: Vec<f32>,
    pub metadata: Map<String, Value>,
}

/// A [`StoredEmbedding`] returned from a nearest-neighbor search, paired with
/// its distance to the query vector (ascending = more similar).
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub chunk: StoredEmbedding,
    pub distance: f32,
}

/// A fire-once callback dispatched when an ingestion process finishes.
/// Structurally identical to (and interchangeable with) `codetriever_progress::Callback`.
pub type Callback = Box<dyn FnOnce() + Send>;
