//! SQLite-backed `DataSourceMap` (§4.4).
//!
//! Two tables: `sources` (one row per data source) and `embeddings` (one row
//! per chunk, vectors packed as a little-endian `f32` `BLOB`). Nearest-neighbor
//! search and collection aggregation are computed in-process over rows pulled
//! from `embeddings` — this repository doesn't depend on a SQLite vector
//! extension, since one isn't guaranteed loadable in an arbitrary build
//! environment, unlike the `sqlite_vec`-backed `vec0` table the original
//! queries via `embedding MATCH ?`.

use crate::error::VectorDataResult;
use crate::model::{Callback, CollectionState, DataSourceStats, RelevantCollection, SearchHit, StoredEmbedding};
use crate::traits::DataSourceMap;
use async_trait::async_trait;
use serde_json::Map;
use sqlx::{Row, Sqlite, SqlitePool, QueryBuilder};
use sqlx::sqlite::SqlitePoolOptions;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tokio::runtime::Handle;
use uuid::Uuid;

/// Collections excluded from every nearest-neighbor query — the scratch space
/// query embeddings are stored under during a search (§4.10.1).
const USER_QUERY_COLLECTION: &str = "user-query";

/// Size of the coarse candidate pool `get_relevant_sources` groups by
/// collection before thresholding, matching the original's `k = 4096`.
const RELEVANT_SOURCES_CANDIDATE_POOL: usize = 4096;

pub struct SqliteDataSourceMap {
    pool: SqlitePool,
    /// Captured at construction time (inside the async runtime) so that
    /// synchronous ingestion-callback closures fired from kernel threads can
    /// bridge back into this crate's async queries via `Handle::block_on`.
    handle: Handle,
}

impl SqliteDataSourceMap {
    /// Opens (creating if absent) the embedded database at `db_path` and
    /// ensures its schema exists. Must be called from within a Tokio runtime.
    ///
    /// # Errors
    /// Returns an error if the parent directory can't be created or the
    /// connection/schema setup fails.
    pub async fn connect(db_path: &Path) -> VectorDataResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect(&url)
            .await?;

        sqlx::query("PRAGMA journal_mode=WAL").execute(&pool).await?;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS sources (
                id TEXT PRIMARY KEY,
                source_name TEXT,
                source_path TEXT NOT NULL UNIQUE,
                source_type TEXT NOT NULL,
                state TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await?;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS embeddings (
                id TEXT PRIMARY KEY,
                collection TEXT NOT NULL,
                text TEXT NOT NULL,
                embedding BLOB NOT NULL,
                metadata TEXT
            )",
        )
        .execute(&pool)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_embeddings_collection ON embeddings(collection)")
            .execute(&pool)
            .await?;

        Ok(Self {
            pool,
            handle: Handle::current(),
        })
    }

    async fn collections_details(&self, sources: Option<&[String]>) -> VectorDataResult<Vec<DataSourceStats>> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT source_name, source_path, source_type, state FROM sources");
        if let Some(paths) = sources {
            if paths.is_empty() {
                return Ok(Vec::new());
            }
            push_in_clause(&mut qb, "source_path", paths, true);
        }

        let rows = qb.build().fetch_all(&self.pool).await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let paths: Vec<String> = rows.iter().map(|r| r.get::<String, _>("source_path")).collect();
        let mut counts_qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT collection, COUNT(*) as vector_count FROM embeddings WHERE");
        push_in_clause(&mut counts_qb, "collection", &paths, false);
        counts_qb.push(" GROUP BY collection");
        let count_rows = counts_qb.build().fetch_all(&self.pool).await?;

        let counts: HashMap<String, u64> = count_rows
            .into_iter()
            .map(|r| {
                let collection: String = r.get("collection");
                #[allow(clippy::cast_sign_loss)]
                let count = r.get::<i64, _>("vector_count") as u64;
                (collection, count)
            })
            .collect();

        Ok(rows
            .into_iter()
            .map(|row| {
                let source_path: String = row.get("source_path");
                let vector_count = counts.get(&source_path).copied().unwrap_or(0);
                DataSourceStats {
                    source_name: row.get("source_name"),
                    vector_count,
                    status: CollectionState::from_str(&row.get::<String, _>("state"))
                        .unwrap_or(CollectionState::NotFound),
                    dimension: 0,
                    source_path,
                }
            })
            .collect())
    }

    async fn candidate_rows(&self, sources: Option<&[String]>) -> VectorDataResult<Vec<StoredEmbedding>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, collection, text, embedding, metadata FROM embeddings WHERE collection <> ",
        );
        qb.push_bind(USER_QUERY_COLLECTION);
        if let Some(paths) = sources {
            if paths.is_empty() {
                return Ok(Vec::new());
            }
            qb.push(" AND");
            push_in_clause(&mut qb, "collection", paths, false);
        }

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.into_iter().map(row_to_embedding).collect()
    }
}

/// Appends `column IN (?, ?, ...)` with one bound parameter per value — never
/// a single placeholder standing in for the whole list (§4.4).
fn push_in_clause(qb: &mut QueryBuilder<'_, Sqlite>, column: &str, values: &[String], leading_and: bool) {
    if leading_and {
        qb.push(" AND ");
    } else {
        qb.push(' ');
    }
    qb.push(column).push(" IN (");
    let mut separated = qb.separated(", ");
    for value in values {
        separated.push_bind(value.clone());
    }
    separated.push_unseparated(")");
}

fn pack_vector(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vector.len() * 4);
    for component in vector {
        bytes.extend_from_slice(&component.to_le_bytes());
    }
    bytes
}

fn unpack_vector(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f32>().sqrt()
}

fn row_to_embedding(row: sqlx::sqlite::SqliteRow) -> VectorDataResult<StoredEmbedding> {
    let metadata_json: Option<String> = row.get("metadata");
    let metadata = match metadata_json {
        Some(json) if !json.is_empty() => serde_json::from_str(&json)?,
        _ => Map::new(),
    };
    Ok(StoredEmbedding {
        id: row.get("id"),
        collection: row.get("collection"),
        text: row.get("text"),
        vector: unpack_vector(row.get::<Vec<u8>, _>("embedding").as_slice()),
        metadata,
    })
}

#[async_trait]
impl DataSourceMap for SqliteDataSourceMap {
    async fn exists(&self, source: &str) -> VectorDataResult<bool> {
        let row = sqlx::query("SELECT 1 FROM sources WHERE source_path = ?1")
            .bind(source)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn create(
        &self,
        source: &str,
        source_type: &str,
        source_name: Option<&str>,
        state: CollectionState,
    ) -> VectorDataResult<()> {
        if self.exists(source).await? {
            return Ok(());
        }
        sqlx::query(
            "INSERT INTO sources (id, source_name, source_path, source_type, state) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(source_name)
        .bind(source)
        .bind(source_type)
        .bind(state.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, source: &str) -> VectorDataResult<bool> {
        if !self.exists(source).await? {
            return Ok(false);
        }
        sqlx::query("DELETE FROM sources WHERE source_path = ?1")
            .bind(source)
            .execute(&self.pool)
            .await?;
        sqlx::query("DELETE FROM embeddings WHERE collection = ?1")
            .bind(source)
            .execute(&self.pool)
            .await?;
        Ok(true)
    }

    async fn delete_by_name(&self, source_name: &str) -> VectorDataResult<bool> {
        let paths: Vec<String> = sqlx::query("SELECT source_path FROM sources WHERE source_name = ?1")
            .bind(source_name)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|r| r.get("source_path"))
            .collect();
        if paths.is_empty() {
            return Ok(false);
        }

        let mut delete_embeddings_qb: QueryBuilder<Sqlite> = QueryBuilder::new("DELETE FROM embeddings WHERE");
        push_in_clause(&mut delete_embeddings_qb, "collection", &paths, false);
        delete_embeddings_qb.build().execute(&self.pool).await?;

        sqlx::query("DELETE FROM sources WHERE source_name = ?1")
            .bind(source_name)
            .execute(&self.pool)
            .await?;
        Ok(true)
    }

    async fn set_state(&self, source: &str, state: CollectionState) -> VectorDataResult<()> {
        sqlx::query("UPDATE sources SET state = ?1 WHERE source_path = ?2")
            .bind(state.as_str())
            .bind(source)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_text_input_by_id(&self, id: &str, source: &str) -> VectorDataResult<Option<StoredEmbedding>> {
        let row = sqlx::query(
            "SELECT id, collection, text, embedding, metadata FROM embeddings WHERE id = ?1 AND collection = ?2",
        )
        .bind(id)
        .bind(source)
        .fetch_optional(&self.pool)
        .await?;
        row.map(row_to_embedding).transpose()
    }

    async fn list_sources(&self) -> VectorDataResult<Vec<String>> {
        let rows = sqlx::query("SELECT source_path FROM sources")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|r| r.get("source_path")).collect())
    }

    async fn get_sources_stats(&self) -> VectorDataResult<Vec<DataSourceStats>> {
        self.collections_details(None).await
    }

    async fn get_source_stats(&self, source: &str) -> VectorDataResult<DataSourceStats> {
        let mut stats = self.collections_details(Some(std::slice::from_ref(&source.to_string()))).await?;
        Ok(stats.pop().unwrap_or_else(|| DataSourceStats::not_found(source)))
    }

    async fn get_source_stats_by_name(&self, source_name: &str) -> VectorDataResult<Vec<DataSourceStats>> {
        let paths: Vec<String> = sqlx::query("SELECT source_path FROM sources WHERE source_name = ?1")
            .bind(source_name)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|r| r.get("source_path"))
            .collect();
        if paths.is_empty() {
            return Ok(Vec::new());
        }
        self.collections_details(Some(&paths)).await
    }

    async fn insert_embeddings(&self, collection: &str, items: Vec<StoredEmbedding>) -> VectorDataResult<Vec<String>> {
        let mut ids = Vec::with_capacity(items.len());
        let mut tx = self.pool.begin().await?;
        for item in items {
            let id = if item.id.is_empty() { Uuid::new_v4().to_string() } else { item.id };
            let metadata_json = serde_json::to_string(&item.metadata)?;
            sqlx::query(
                "INSERT INTO embeddings (id, collection, text, embedding, metadata) VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(&id)
            .bind(collection)
            .bind(&item.text)
            .bind(pack_vector(&item.vector))
            .bind(metadata_json)
            .execute(&mut *tx)
            .await?;
            ids.push(id);
        }
        tx.commit().await?;
        Ok(ids)
    }

    async fn search(&self, query: &[f32], sources: Option<&[String]>, k: usize) -> VectorDataResult<Vec<SearchHit>> {
        let rows = self.candidate_rows(sources).await?;
        let mut hits: Vec<SearchHit> = rows
            .into_iter()
            .map(|chunk| {
                let distance = euclidean_distance(query, &chunk.vector);
                SearchHit { chunk, distance }
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        Ok(hits)
    }

    async fn get_relevant_sources(
        &self,
        query: &[f32],
        limit: usize,
        distance_threshold: f32,
        sources: Option<&[String]>,
    ) -> VectorDataResult<Vec<RelevantCollection>> {
        let rows = self.candidate_rows(sources).await?;
        let mut scored: Vec<(String, f32)> = rows
            .into_iter()
            .map(|chunk| (chunk.collection, euclidean_distance(query, &chunk.vector)))
            .collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(RELEVANT_SOURCES_CANDIDATE_POOL);

        let mut grouped: HashMap<String, (f32, f32, u64)> = HashMap::new();
        for (collection, distance) in scored {
            let entry = grouped.entry(collection).or_insert((f32::MAX, 0.0, 0));
            entry.0 = entry.0.min(distance);
            entry.1 += distance;
            entry.2 += 1;
        }

        let mut relevant: Vec<RelevantCollection> = grouped
            .into_iter()
            .filter(|(_, (min_distance, _, _))| *min_distance < distance_threshold)
            .map(|(collection, (min_distance, sum_distance, count))| RelevantCollection {
                collection,
                min_distance,
                #[allow(clippy::cast_precision_loss)]
                avg_distance: sum_distance / count as f32,
                count,
            })
            .collect();
        relevant.sort_by(|a, b| a.min_distance.total_cmp(&b.min_distance));
        relevant.truncate(limit);
        Ok(relevant)
    }

    async fn delete_embeddings(&self, source: Option<&str>) -> VectorDataResult<()> {
        match source {
            Some(source) => {
                sqlx::query("DELETE FROM embeddings WHERE collection = ?1")
                    .bind(source)
                    .execute(&self.pool)
                    .await?;
            }
            None => {
                sqlx::query("DELETE FROM embeddings").execute(&self.pool).await?;
            }
        }
        Ok(())
    }

    fn fail_ingestion_process_callback(self: Arc<Self>, source: String) -> Callback {
        Box::new(move || {
            let handle = self.handle.clone();
            handle.block_on(async move {
                if let Err(err) = self.set_state(&source, CollectionState::Failed).await {
                    tracing::error!(error = %err, %source, "failed to mark data source as failed");
                }
            });
        })
    }

    fn success_ingestion_process_callback(self: Arc<Self>, source: String) -> Callback {
        Box::new(move || {
            let handle = self.handle.clone();
            handle.block_on(async move {
                if let Err(err) = self.set_state(&source, CollectionState::Completed).await {
                    tracing::error!(error = %err, %source, "failed to mark data source as completed");
                }
            });
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn make_map() -> (tempfile::TempDir, SqliteDataSourceMap) {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("embeddings.db");
        let map = SqliteDataSourceMap::connect(&db_path).await.unwrap();
        (dir, map)
    }

    fn embedding(id: &str, collection: &str, vector: Vec<f32>) -> StoredEmbedding {
        let mut metadata = Map::new();
        metadata.insert("id".to_string(), json!(id));
        StoredEmbedding {
            id: id.to_string(),
            collection: collection.to_string(),
            text: format!("text for {id}"),
            vector,
            metadata,
        }
    }

    #[tokio::test]
    async fn create_and_exists_roundtrip() {
        let (_dir, map) = make_map().await;
        assert!(!map.exists("a.txt").await.unwrap());
        map.create("a.txt", "local_text_file", None, CollectionState::Processing)
            .await
            .unwrap();
        assert!(map.exists("a.txt").await.unwrap());
    }

    #[tokio::test]
    async fn create_is_idempotent() {
        let (_dir, map) = make_map().await;
        map.create("a.txt", "local_text_file", Some("A"), CollectionState::Processing)
            .await
            .unwrap();
        map.create("a.txt", "local_text_file", Some("A"), CollectionState::Completed)
            .await
            .unwrap();
        let stats = map.get_source_stats("a.txt").await.unwrap();
        assert_eq!(stats.status, CollectionState::Processing);
    }

    #[tokio::test]
    async fn delete_removes_source_and_embeddings() {
        let (_dir, map) = make_map().await;
        map.create("a.txt", "local_text_file", None, CollectionState::Processing)
            .await
            .unwrap();
        map.insert_embeddings("a.txt", vec![embedding("1", "a.txt", vec![0.1, 0.2])])
            .await
            .unwrap();
        assert!(map.delete("a.txt").await.unwrap());
        assert!(!map.exists("a.txt").await.unwrap());
        assert!(map.search(&[0.1, 0.2], None, 10).await.unwrap().is_empty());
        assert!(!map.delete("a.txt").await.unwrap());
    }

    #[tokio::test]
    async fn delete_by_name_removes_every_matching_source() {
        let (_dir, map) = make_map().await;
        map.create("a.txt", "local_text_file", Some("shared"), CollectionState::Processing)
            .await
            .unwrap();
        map.create("b.txt", "local_text_file", Some("shared"), CollectionState::Processing)
            .await
            .unwrap();
        assert!(map.delete_by_name("shared").await.unwrap());
        assert!(!map.exists("a.txt").await.unwrap());
        assert!(!map.exists("b.txt").await.unwrap());
        assert!(!map.delete_by_name("shared").await.unwrap());
    }

    #[tokio::test]
    async fn set_state_updates_stats() {
        let (_dir, map) = make_map().await;
        map.create("a.txt", "local_text_file", None, CollectionState::Processing)
            .await
            .unwrap();
        map.set_state("a.txt", CollectionState::Completed).await.unwrap();
        let stats = map.get_source_stats("a.txt").await.unwrap();
        assert_eq!(stats.status, CollectionState::Completed);
    }

    #[tokio::test]
    async fn get_text_input_by_id_finds_only_within_its_source() {
        let (_dir, map) = make_map().await;
        map.insert_embeddings("a.txt", vec![embedding("1", "a.txt", vec![1.0])])
            .await
            .unwrap();
        assert!(map.get_text_input_by_id("1", "a.txt").await.unwrap().is_some());
        assert!(map.get_text_input_by_id("1", "b.txt").await.unwrap().is_none());
        assert!(map.get_text_input_by_id("missing", "a.txt").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn search_excludes_user_query_and_orders_by_distance() {
        let (_dir, map) = make_map().await;
        map.insert_embeddings(
            "a.txt",
            vec![
                embedding("far", "a.txt", vec![10.0, 10.0]),
                embedding("near", "a.txt", vec![0.1, 0.1]),
            ],
        )
        .await
        .unwrap();
        map.insert_embeddings(USER_QUERY_COLLECTION, vec![embedding("q", USER_QUERY_COLLECTION, vec![0.0, 0.0])])
            .await
            .unwrap();

        let hits = map.search(&[0.0, 0.0], None, 10).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.id, "near");
        assert_eq!(hits[1].chunk.id, "far");
        assert!(hits[0].distance < hits[1].distance);
    }

    #[tokio::test]
    async fn search_respects_source_filter() {
        let (_dir, map) = make_map().await;
        map.insert_embeddings("a.txt", vec![embedding("a1", "a.txt", vec![0.0])])
            .await
            .unwrap();
        map.insert_embeddings("b.txt", vec![embedding("b1", "b.txt", vec![0.0])])
            .await
            .unwrap();

        let hits = map
            .search(&[0.0], Some(&["a.txt".to_string()]), 10)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.id, "a1");
    }

    #[tokio::test]
    async fn get_relevant_sources_filters_by_threshold() {
        let (_dir, map) = make_map().await;
        map.insert_embeddings("close.txt", vec![embedding("c1", "close.txt", vec![0.0])])
            .await
            .unwrap();
        map.insert_embeddings("far.txt", vec![embedding("f1", "far.txt", vec![100.0])])
            .await
            .unwrap();

        let relevant = map.get_relevant_sources(&[0.0], 10, 5.0, None).await.unwrap();
        assert_eq!(relevant.len(), 1);
        assert_eq!(relevant[0].collection, "close.txt");
        assert_eq!(relevant[0].count, 1);
    }

    #[tokio::test]
    async fn get_sources_stats_reports_vector_counts_per_source() {
        let (_dir, map) = make_map().await;
        map.create("a.txt", "local_text_file", None, CollectionState::Processing)
            .await
            .unwrap();
        map.insert_embeddings(
            "a.txt",
            vec![
                embedding("1", "a.txt", vec![0.0]),
                embedding("2", "a.txt", vec![0.0]),
            ],
        )
        .await
        .unwrap();

        let stats = map.get_sources_stats().await.unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].vector_count, 2);
    }

    #[tokio::test]
    async fn get_source_stats_for_missing_source_is_not_found_not_an_error() {
        let (_dir, map) = make_map().await;
        let stats = map.get_source_stats("missing").await.unwrap();
        assert_eq!(stats.status, CollectionState::NotFound);
        assert_eq!(stats.vector_count, 0);
    }

    #[tokio::test]
    async fn delete_embeddings_scoped_to_one_source() {
        let (_dir, map) = make_map().await;
        map.insert_embeddings("a.txt", vec![embedding("1", "a.txt", vec![0.0])])
            .await
            .unwrap();
        map.insert_embeddings("b.txt", vec![embedding("2", "b.txt", vec![0.0])])
            .await
            .unwrap();

        map.delete_embeddings(Some("a.txt")).await.unwrap();
        assert!(map.search(&[0.0], Some(&["a.txt".to_string()]), 10).await.unwrap().is_empty());
        assert_eq!(map.search(&[0.0], Some(&["b.txt".to_string()]), 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_embeddings_blanket_clears_everything() {
        let (_dir, map) = make_map().await;
        map.insert_embeddings("a.txt", vec![embedding("1", "a.txt", vec![0.0])])
            .await
            .unwrap();
        map.insert_embeddings("b.txt", vec![embedding("2", "b.txt", vec![0.0])])
            .await
            .unwrap();

        map.delete_embeddings(None).await.unwrap();
        assert!(map.search(&[0.0], None, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ingestion_callbacks_set_terminal_state_from_a_blocking_thread() {
        let (_dir, map) = make_map().await;
        map.create("a.txt", "local_text_file", None, CollectionState::Processing)
            .await
            .unwrap();
        let map = Arc::new(map);

        let fail_cb = Arc::clone(&map).fail_ingestion_process_callback("a.txt".to_string());
        std::thread::spawn(fail_cb).join().unwrap();

        let stats = map.get_source_stats("a.txt").await.unwrap();
        assert_eq!(stats.status, CollectionState::Failed);

        let success_cb = Arc::clone(&map).success_ingestion_process_callback("a.txt".to_string());
        std::thread::spawn(success_cb).join().unwrap();
        let stats = map.get_source_stats("a.txt").await.unwrap();
        assert_eq!(stats.status, CollectionState::Completed);
    }
}
