//! Per-query file-content cache (§4.10.3 step 5, §5 "shared mutable resources").
//! Scoped to a single search call: constructed fresh by the engine, read
//! through for every window that needs a slice of the same backing file.

use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct FileCache {
    files: Mutex<HashMap<String, String>>,
}

impl FileCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `path` on first use and caches its content; returns the cached
    /// content on every subsequent call for the same path within this
    /// cache's lifetime.
    pub async fn read(&self, path: &str) -> std::io::Result<String> {
        if let Some(content) = self.files.lock().expect("file cache mutex poisoned").get(path) {
            return Ok(content.clone());
        }
        let content = tokio::fs::read_to_string(path).await?;
        self.files.lock().expect("file cache mutex poisoned").insert(path.to_string(), content.clone());
        Ok(content)
    }
}

/// Extracts `content[start:end]` by character index, clamping both bounds to
/// the string's length; returns `None` for an empty (post-clamp) slice.
#[must_use]
pub fn slice_chars(content: &str, start: usize, end: usize) -> Option<String> {
    let chars: Vec<char> = content.chars().collect();
    let start = start.min(chars.len());
    let end = end.min(chars.len());
    if start >= end {
        return None;
    }
    Some(chars[start..end].iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn read_caches_content_across_calls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "hello world").unwrap();

        let cache = FileCache::new();
        let first = cache.read(path.to_str().unwrap()).await.unwrap();
        std::fs::remove_file(&path).unwrap();
        let second = cache.read(path.to_str().unwrap()).await.unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn slice_chars_clamps_out_of_range_indices() {
        assert_eq!(slice_chars("hello", 2, 100), Some("llo".to_string()));
        assert_eq!(slice_chars("hello", 10, 20), None);
        assert_eq!(slice_chars("hello", 3, 1), None);
    }
}
