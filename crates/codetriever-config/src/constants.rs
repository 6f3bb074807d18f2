//! Named constants for the ingestion/search pipeline.
//!
//! Each constant is a [`Constant`] wrapped in a [`once_cell::sync::Lazy`] (a
//! plain `static Constant` cannot hold a `List`/`Dict` default, since those
//! require heap allocation the `const` evaluator can't perform) with a
//! small typed accessor function below it. Values mirror the reference
//! system's `server/constants.py`; durations are expressed in seconds
//! there and are coerced the same way here.

use crate::constant::Constant;
use crate::value::ConfigValue;
use once_cell::sync::Lazy;
use std::time::Duration;

macro_rules! constant {
    ($static_name:ident, $name:expr, $env:expr, $default:expr) => {
        pub static $static_name: Lazy<Constant> =
            Lazy::new(|| Constant::new($name, $env, $default));
    };
}

macro_rules! frozen_constant {
    ($static_name:ident, $name:expr, $env:expr, $default:expr) => {
        pub static $static_name: Lazy<Constant> =
            Lazy::new(|| Constant::frozen($name, $env, $default));
    };
}

constant!(
    SEARCH_CHUNK_CHARACTER_LIMIT,
    "SEARCH_CHUNK_CHARACTER_LIMIT",
    "SEARCH_CHUNK_CHARACTER_LIMIT",
    ConfigValue::Int(1000)
);
constant!(
    SEARCH_CHUNKS_LIMIT,
    "SEARCH_CHUNKS_LIMIT",
    "SEARCH_CHUNKS_LIMIT",
    ConfigValue::Int(30)
);
constant!(
    SEARCH_PROCESSING_TIMEOUT_SECONDS,
    "SEARCH_PROCESSING_TIMEOUT_SECONDS",
    "SEARCH_PROCESSING_TIMEOUT_SECONDS",
    ConfigValue::Duration(Duration::from_secs(10))
);
constant!(
    SEARCH_CONTEXT_EXTENSION_CHARACTERS,
    "SEARCH_CONTEXT_EXTENSION_CHARACTERS",
    "SEARCH_CONTEXT_EXTENSION_CHARACTERS",
    ConfigValue::Int(1000)
);
constant!(
    SEARCH_RESULT_LIMIT,
    "SEARCH_RESULT_LIMIT",
    "SEARCH_RESULT_LIMIT",
    ConfigValue::Int(5)
);
constant!(
    DEEP_SEARCH_RESULT_LIMIT,
    "DEEP_SEARCH_RESULT_LIMIT",
    "DEEP_SEARCH_RESULT_LIMIT",
    ConfigValue::Int(30)
);
constant!(
    MAX_SOURCES_IN_DEEP_SEARCH,
    "MAX_SOURCES_IN_DEEP_SEARCH",
    "MAX_SOURCES_IN_DEEP_SEARCH",
    ConfigValue::Int(3)
);
constant!(
    RELEVANT_SOURCES_DISTANCE_THRESHOLD,
    "RELEVANT_SOURCES_DISTANCE_THRESHOLD",
    "RELEVANT_SOURCES_DISTANCE_THRESHOLD",
    ConfigValue::Float(2.0)
);
constant!(
    DOWNLOAD_THREAD_IDLE_TIMEOUT,
    "DOWNLOAD_THREAD_IDLE_TIMEOUT",
    "DOWNLOAD_THREAD_IDLE_TIMEOUT",
    ConfigValue::Duration(Duration::from_secs(300))
);
constant!(
    EMBEDDER_IDLE_TIMEOUT,
    "EMBEDDER_IDLE_TIMEOUT",
    "EMBEDDER_IDLE_TIMEOUT",
    ConfigValue::Duration(Duration::from_secs(10))
);
constant!(
    AUDIO_TRANSCRIPTION_IDLE_TIMEOUT,
    "AUDIO_TRANSCRIPTION_IDLE_TIMEOUT",
    "AUDIO_TRANSCRIPTION_IDLE_TIMEOUT",
    ConfigValue::Duration(Duration::from_secs(10))
);
constant!(
    CHUNK_CHARACTER_LIMIT,
    "CHUNK_CHARACTER_LIMIT",
    "CHUNK_CHARACTER_LIMIT",
    ConfigValue::Int(1500)
);
constant!(
    INGESTION_PROCESS_MAX_FILE_PATHS,
    "INGESTION_PROCESS_MAX_FILE_PATHS",
    "INGESTION_PROCESS_MAX_FILE_PATHS",
    ConfigValue::Int(100)
);
constant!(
    AUDIO_FILE_EXTENSIONS,
    "AUDIO_FILE_EXTENSIONS",
    "AUDIO_FILE_EXTENSIONS",
    ConfigValue::List(vec![
        ".mp3".to_string(),
        ".wav".to_string(),
        ".m4a".to_string(),
        ".flac".to_string(),
        ".ogg".to_string(),
    ])
);
constant!(
    BULK_QUEUE_FULL_RETRY_COUNT,
    "BULK_QUEUE_FULL_RETRY_COUNT",
    "BULK_QUEUE_FULL_RETRY_COUNT",
    ConfigValue::Int(5)
);
constant!(
    BULK_QUEUE_RETRY_BASE_DELAY_MS,
    "BULK_QUEUE_RETRY_BASE_DELAY_MS",
    "BULK_QUEUE_RETRY_BASE_DELAY_MS",
    ConfigValue::Int(50)
);
constant!(
    ASYNC_QUEUE_BATCH_SIZE,
    "ASYNC_QUEUE_BATCH_SIZE",
    "ASYNC_QUEUE_BATCH_SIZE",
    ConfigValue::Int(100)
);
constant!(
    ASYNC_QUEUE_READ_SLEEP_MS,
    "ASYNC_QUEUE_READ_SLEEP_MS",
    "ASYNC_QUEUE_READ_SLEEP_MS",
    ConfigValue::Int(50)
);
constant!(
    ASYNC_QUEUE_MAX_SIZE,
    "ASYNC_QUEUE_MAX_SIZE",
    "ASYNC_QUEUE_MAX_SIZE",
    ConfigValue::Int(100_000)
);
constant!(
    TARGET_AUDIO_BITRATE_KBPS,
    "TARGET_AUDIO_BITRATE_KBPS",
    "TARGET_AUDIO_BITRATE_KBPS",
    ConfigValue::Int(192)
);
frozen_constant!(
    EMBEDDING_DIMENSIONS,
    "EMBEDDING_DIMENSIONS",
    "EMBEDDING_DIMENSIONS",
    ConfigValue::Int(768)
);
frozen_constant!(
    USER_QUERY_SOURCE,
    "USER_QUERY_SOURCE",
    "USER_QUERY_SOURCE",
    ConfigValue::Str(String::from("user-query"))
);
constant!(
    STORAGE_WORKER_BATCH_SIZE,
    "STORAGE_WORKER_BATCH_SIZE",
    "STORAGE_WORKER_BATCH_SIZE",
    ConfigValue::Int(1000)
);
constant!(
    STORAGE_WORKER_IDLE_TIMEOUT,
    "STORAGE_WORKER_IDLE_TIMEOUT",
    "STORAGE_WORKER_IDLE_TIMEOUT",
    ConfigValue::Duration(Duration::from_secs(10))
);

#[must_use]
pub fn search_chunk_character_limit() -> usize {
    i64_or(SEARCH_CHUNK_CHARACTER_LIMIT.get().as_int(), 1000) as usize
}

#[must_use]
pub fn search_chunks_limit() -> usize {
    i64_or(SEARCH_CHUNKS_LIMIT.get().as_int(), 30) as usize
}

#[must_use]
pub fn search_processing_timeout() -> Duration {
    SEARCH_PROCESSING_TIMEOUT_SECONDS
        .get()
        .as_duration()
        .unwrap_or(Duration::from_secs(10))
}

#[must_use]
pub fn search_context_extension_characters() -> usize {
    i64_or(SEARCH_CONTEXT_EXTENSION_CHARACTERS.get().as_int(), 1000) as usize
}

#[must_use]
pub fn search_result_limit() -> usize {
    i64_or(SEARCH_RESULT_LIMIT.get().as_int(), 5) as usize
}

#[must_use]
pub fn deep_search_result_limit() -> usize {
    i64_or(DEEP_SEARCH_RESULT_LIMIT.get().as_int(), 30) as usize
}

#[must_use]
pub fn max_sources_in_deep_search() -> usize {
    i64_or(MAX_SOURCES_IN_DEEP_SEARCH.get().as_int(), 3) as usize
}

#[must_use]
pub fn relevant_sources_distance_threshold() -> f64 {
    RELEVANT_SOURCES_DISTANCE_THRESHOLD
        .get()
        .as_float()
        .unwrap_or(2.0)
}

#[must_use]
pub fn download_thread_idle_timeout() -> Duration {
    DOWNLOAD_THREAD_IDLE_TIMEOUT
        .get()
        .as_duration()
        .unwrap_or(Duration::from_secs(300))
}

#[must_use]
pub fn embedder_idle_timeout() -> Duration {
    EMBEDDER_IDLE_TIMEOUT
        .get()
        .as_duration()
        .unwrap_or(Duration::from_secs(10))
}

#[must_use]
pub fn audio_transcription_idle_timeout() -> Duration {
    AUDIO_TRANSCRIPTION_IDLE_TIMEOUT
        .get()
        .as_duration()
        .unwrap_or(Duration::from_secs(10))
}

#[must_use]
pub fn chunk_character_limit() -> usize {
    i64_or(CHUNK_CHARACTER_LIMIT.get().as_int(), 1500) as usize
}

#[must_use]
pub fn ingestion_process_max_file_paths() -> usize {
    i64_or(INGESTION_PROCESS_MAX_FILE_PATHS.get().as_int(), 100) as usize
}

#[must_use]
pub fn audio_file_extensions() -> Vec<String> {
    AUDIO_FILE_EXTENSIONS
        .get()
        .as_list()
        .map(<[String]>::to_vec)
        .unwrap_or_default()
}

#[must_use]
pub fn bulk_queue_full_retry_count() -> u32 {
    i64_or(BULK_QUEUE_FULL_RETRY_COUNT.get().as_int(), 5) as u32
}

#[must_use]
pub fn bulk_queue_retry_base_delay() -> Duration {
    Duration::from_millis(i64_or(BULK_QUEUE_RETRY_BASE_DELAY_MS.get().as_int(), 50) as u64)
}

#[must_use]
pub fn async_queue_batch_size() -> usize {
    i64_or(ASYNC_QUEUE_BATCH_SIZE.get().as_int(), 100) as usize
}

#[must_use]
pub fn async_queue_read_sleep() -> Duration {
    Duration::from_millis(i64_or(ASYNC_QUEUE_READ_SLEEP_MS.get().as_int(), 50) as u64)
}

#[must_use]
pub fn async_queue_max_size() -> usize {
    i64_or(ASYNC_QUEUE_MAX_SIZE.get().as_int(), 100_000) as usize
}

#[must_use]
pub fn target_audio_bitrate_kbps() -> u32 {
    i64_or(TARGET_AUDIO_BITRATE_KBPS.get().as_int(), 192) as u32
}

#[must_use]
pub fn embedding_dimensions() -> usize {
    i64_or(EMBEDDING_DIMENSIONS.get().as_int(), 768) as usize
}

#[must_use]
pub fn user_query_source() -> String {
    USER_QUERY_SOURCE
        .get()
        .as_str()
        .unwrap_or("user-query")
        .to_string()
}

#[must_use]
pub fn storage_worker_batch_size() -> usize {
    i64_or(STORAGE_WORKER_BATCH_SIZE.get().as_int(), 1000) as usize
}

#[must_use]
pub fn storage_worker_idle_timeout() -> Duration {
    STORAGE_WORKER_IDLE_TIMEOUT
        .get()
        .as_duration()
        .unwrap_or(Duration::from_secs(10))
}

fn i64_or(value: Option<i64>, default: i64) -> i64 {
    value.unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_constants() {
        assert_eq!(search_chunk_character_limit(), 1000);
        assert_eq!(search_chunks_limit(), 30);
        assert_eq!(search_processing_timeout(), Duration::from_secs(10));
        assert_eq!(search_context_extension_characters(), 1000);
        assert_eq!(search_result_limit(), 5);
        assert_eq!(deep_search_result_limit(), 30);
        assert_eq!(max_sources_in_deep_search(), 3);
        assert_eq!(download_thread_idle_timeout(), Duration::from_secs(300));
        assert_eq!(embedder_idle_timeout(), Duration::from_secs(10));
        assert_eq!(audio_transcription_idle_timeout(), Duration::from_secs(10));
        assert_eq!(chunk_character_limit(), 1500);
        assert_eq!(ingestion_process_max_file_paths(), 100);
        assert_eq!(
            audio_file_extensions(),
            vec![".mp3", ".wav", ".m4a", ".flac", ".ogg"]
        );
        assert_eq!(user_query_source(), "user-query");
    }

    #[test]
    fn embedding_dimensions_constant_is_frozen() {
        let err = EMBEDDING_DIMENSIONS.set(ConfigValue::Int(1024)).unwrap_err();
        assert!(matches!(err, crate::ConfigError::Frozen { .. }));
    }
}
