//! Deterministic chunk ID generation

use sha2::{Digest, Sha256};
use uuid::{Uuid, uuid};

/// Namespace UUID for Codetriever chunk IDs (randomly generated once)
/// This ensures our UUIDs don't collide with other systems
const CODETRIEVER_NAMESPACE: Uuid = uuid!("a8f5c3e2-7b9d-4f2a-9e1c-3d5a7b9f1e3c");

/// Generate a deterministic chunk ID based on byte ranges
///
/// The ID is stable for a given combination of:
/// - Repository ID
/// - Branch
/// - File path
/// - Generation
/// - Byte range (start and end)
///
/// Using byte ranges instead of chunk index ensures stability
/// even if the tokenizer or chunking algorithm changes
///
/// Returns a UUID v5 which is deterministic based on the input
pub fn generate_chunk_id(
    repository_id: &str,
    branch: &str,
    file_path: &str,
    generation: i64,
    byte_start: usize,
    byte_end: usize,
) -> Uuid {
    // Create a unique string from all components
    let data = format!("{repository_id}:{branch}:{file_path}:{generation}:{byte_start}:{byte_end}");

    // Generate UUID v5 (deterministic) from namespace and data
    Uuid::new_v5(&CODETRIEVER_NAMESPACE, data.as_bytes())
}

/// Generate a content hash for a file
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
