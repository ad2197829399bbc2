//! SQLite-based vector store implementation.
//!
//! Embeddings are stored as little-endian `f32` blobs and compared in Rust.
//! Insertion order is the table's rowid order.

use super::{nearest, IndexedSource, PassageMetadata, QueryResult, VectorRecord, VectorStore};
use crate::error::{HarkError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS passages (
        collection TEXT NOT NULL,
        id TEXT NOT NULL,
        source_id TEXT NOT NULL,
        title TEXT NOT NULL,
        document TEXT NOT NULL,
        end_seconds REAL NOT NULL,
        metadata_json TEXT NOT NULL,
        embedding BLOB NOT NULL,
        indexed_at TEXT NOT NULL,
        PRIMARY KEY (collection, id)
    );

    CREATE INDEX IF NOT EXISTS idx_passages_source ON passages(collection, source_id);
"#;

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Open (or create) a store at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite vector store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| HarkError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn parse_timestamp(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn add(&self, collection: &str, records: &[VectorRecord]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        let now = Utc::now().to_rfc3339();

        for record in records {
            let metadata_json = serde_json::to_string(&record.metadata)?;
            // Delete first so a replaced record moves to the end of rowid order.
            tx.execute(
                "DELETE FROM passages WHERE collection = ?1 AND id = ?2",
                params![collection, record.id],
            )?;
            tx.execute(
                r#"
                INSERT INTO passages
                (collection, id, source_id, title, document, end_seconds, metadata_json, embedding, indexed_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
                params![
                    collection,
                    record.id,
                    record.metadata.source_id,
                    record.metadata.title,
                    record.document,
                    record.metadata.end,
                    metadata_json,
                    Self::embedding_to_bytes(&record.embedding),
                    now,
                ],
            )?;
        }

        tx.commit()?;
        info!("Added {} passages to collection {}", records.len(), collection);
        Ok(records.len())
    }

    #[instrument(skip(self, embedding))]
    async fn query(&self, collection: &str, embedding: &[f32], top_k: usize) -> Result<QueryResult> {
        let records = self.records(collection).await?;
        let result = nearest(records, embedding, top_k);
        debug!("Found {} matching passages", result.len());
        Ok(result)
    }

    #[instrument(skip(self))]
    async fn delete_source(&self, collection: &str, source_id: &str) -> Result<usize> {
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM passages WHERE collection = ?1 AND source_id = ?2",
            params![collection, source_id],
        )?;

        info!("Deleted {} passages for source {}", deleted, source_id);
        Ok(deleted)
    }

    #[instrument(skip(self))]
    async fn list_sources(&self, collection: &str) -> Result<Vec<IndexedSource>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT source_id, MIN(title), COUNT(*), MAX(end_seconds), MAX(indexed_at) AS last_indexed
            FROM passages
            WHERE collection = ?1
            GROUP BY source_id
            ORDER BY last_indexed DESC, source_id
            "#,
        )?;

        let rows = stmt.query_map(params![collection], |row| {
            let indexed_at: String = row.get(4)?;
            Ok(IndexedSource {
                source_id: row.get(0)?,
                title: row.get(1)?,
                passage_count: row.get(2)?,
                duration_seconds: row.get(3)?,
                indexed_at: Self::parse_timestamp(&indexed_at),
            })
        })?;

        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    #[instrument(skip(self))]
    async fn records(&self, collection: &str) -> Result<Vec<VectorRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, document, metadata_json, embedding
            FROM passages
            WHERE collection = ?1
            ORDER BY rowid
            "#,
        )?;

        let rows = stmt
            .query_map(params![collection], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Vec<u8>>(3)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, document, metadata_json, embedding)| {
                let metadata: PassageMetadata = serde_json::from_str(&metadata_json)?;
                Ok(VectorRecord {
                    id,
                    embedding: Self::bytes_to_embedding(&embedding),
                    document,
                    metadata,
                })
            })
            .collect()
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM passages WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::test_support::record;

    #[tokio::test]
    async fn test_sqlite_vector_store() {
        let store = SqliteVectorStore::in_memory().unwrap();

        let mut first = record("ep1", 0, "This is test content", vec![1.0, 0.0, 0.0]);
        first.metadata.speakers = vec!["SPEAKER_00".to_string()];
        first.metadata.has_diarization = true;
        let second = record("ep1", 1, "Unrelated words", vec![0.0, 1.0, 0.0]);
        store.add("podcasts", &[first.clone(), second]).await.unwrap();

        let sources = store.list_sources("podcasts").await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].source_id, "ep1");
        assert_eq!(sources[0].passage_count, 2);
        assert_eq!(sources[0].duration_seconds, 22.0);

        let results = store.query("podcasts", &[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(results.ids, vec!["ep1:0", "ep1:1"]);
        assert!(results.distances[0].abs() < 0.001);
        assert_eq!(results.metadatas[0], first.metadata);

        let deleted = store.delete_source("podcasts", "ep1").await.unwrap();
        assert_eq!(deleted, 2);
        assert!(store.list_sources("podcasts").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_records_keep_insertion_order_and_embeddings() {
        let store = SqliteVectorStore::in_memory().unwrap();
        store
            .add("c", &[record("b", 0, "second source", vec![0.5, -0.25])])
            .await
            .unwrap();
        store
            .add("c", &[record("a", 0, "first source", vec![1.5, 2.0])])
            .await
            .unwrap();
        store.add("other", &[record("z", 0, "elsewhere", vec![1.0, 1.0])]).await.unwrap();

        let records = store.records("c").await.unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b:0", "a:0"]);
        assert_eq!(records[0].embedding, vec![0.5, -0.25]);
        assert_eq!(store.count("c").await.unwrap(), 2);
        assert_eq!(store.count("other").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_replace_by_id() {
        let store = SqliteVectorStore::in_memory().unwrap();
        store.add("c", &[record("ep", 0, "old", vec![1.0])]).await.unwrap();
        store.add("c", &[record("ep", 0, "new", vec![1.0])]).await.unwrap();

        let records = store.records("c").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].document, "new");
    }
}
