//! Query embedding: splits a search query into per-line chunks, submits them
//! to the embedder pipeline under the `"user-query"` pseudo-source, and
//! polls for the resulting vectors (§4.10.1, §4.10.2).

use std::sync::Arc;
use std::time::{Duration, Instant};

use codetriever_config::constants::{search_chunk_character_limit, search_chunks_limit, search_processing_timeout, user_query_source};
use codetriever_parsing::{TextChunk, TextInput, split_text_chunk};
use codetriever_queue::BoundedQueue;
use codetriever_vector_data::DataSourceMap;

use crate::error::{SearchError, SearchResult};

const POLL_START: Duration = Duration::from_millis(10);
const POLL_MAX: Duration = Duration::from_millis(500);
const POLL_BACKOFF: f64 = 1.2;

/// Splits `query` into per-line, per-chunk `TextInput`s, each tagged with
/// its own `query_id`, and submits them all to `embedder_read_queue`.
/// Returns the distinct `query_id`s produced, capped at
/// `SEARCH_CHUNKS_LIMIT` total chunks across every line.
pub fn submit_query(query: &str, embedder_read_queue: &BoundedQueue<TextInput>) -> SearchResult<Vec<String>> {
    let limit = search_chunks_limit();
    let chunk_limit = search_chunk_character_limit();
    let source = user_query_source();

    let mut query_ids = Vec::new();
    let mut inputs = Vec::new();

    for line in query.lines() {
        if line.is_empty() {
            continue;
        }
        if query_ids.len() >= limit {
            break;
        }
        let query_id = uuid::Uuid::new_v4().to_string();
        let whole = TextChunk { start_index: 0, end_index: line.chars().count(), text: line.to_string() };
        for chunk in split_text_chunk(chunk_limit, whole) {
            inputs.push(TextInput::new(query_id.clone(), chunk.text.clone(), source.clone(), codetriever_parsing::SourceType::UserQuery.as_str().to_string(), &chunk));
        }
        query_ids.push(query_id);
    }

    embedder_read_queue.put_many(inputs).map_err(|e| SearchError::Queue(e.to_string()))?;
    Ok(query_ids)
}

/// Polls `get_text_input_by_id(query_id, "user-query")` for every id in
/// `query_ids` with adaptive backoff until every vector is ready or
/// `SEARCH_PROCESSING_TIMEOUT_SECONDS` elapses.
pub async fn wait_for_vectors(data_source_map: &dyn DataSourceMap, query_ids: &[String]) -> SearchResult<Vec<(String, Vec<f32>)>> {
    let source = user_query_source();
    let deadline = Instant::now() + search_processing_timeout();
    let mut ready: Vec<(String, Vec<f32>)> = Vec::new();
    let mut pending: Vec<String> = query_ids.to_vec();
    let mut delay = POLL_START;

    loop {
        let mut still_pending = Vec::new();
        for query_id in pending {
            match data_source_map.get_text_input_by_id(&query_id, &source).await? {
                Some(stored) if !stored.vector.is_empty() => ready.push((query_id, stored.vector)),
                _ => still_pending.push(query_id),
            }
        }
        pending = still_pending;
        if pending.is_empty() {
            return Ok(ready);
        }
        if Instant::now() >= deadline {
            return Err(SearchError::VectorTimeout(search_processing_timeout()));
        }
        tokio::time::sleep(delay).await;
        delay = Duration::from_secs_f64((delay.as_secs_f64() * POLL_BACKOFF).min(POLL_MAX.as_secs_f64()));
    }
}
