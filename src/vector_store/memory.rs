//! In-memory vector store implementation.
//!
//! Useful for testing and small datasets.

use super::{nearest, IndexedSource, QueryResult, VectorRecord, VectorStore};
use crate::error::{HarkError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

struct StoredRecord {
    record: VectorRecord,
    indexed_at: DateTime<Utc>,
}

/// In-memory vector store. Each collection keeps records in insertion order.
pub struct MemoryVectorStore {
    collections: RwLock<HashMap<String, Vec<StoredRecord>>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, Vec<StoredRecord>>>> {
        self.collections
            .read()
            .map_err(|e| HarkError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, Vec<StoredRecord>>>> {
        self.collections
            .write()
            .map_err(|e| HarkError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn add(&self, collection: &str, records: &[VectorRecord]) -> Result<usize> {
        let mut collections = self.write()?;
        let stored = collections.entry(collection.to_string()).or_default();
        let now = Utc::now();

        for record in records {
            // Replacing moves the record to the end, like INSERT OR REPLACE.
            stored.retain(|s| s.record.id != record.id);
            stored.push(StoredRecord {
                record: record.clone(),
                indexed_at: now,
            });
        }

        Ok(records.len())
    }

    async fn query(&self, collection: &str, embedding: &[f32], top_k: usize) -> Result<QueryResult> {
        let records = self.records(collection).await?;
        Ok(nearest(records, embedding, top_k))
    }

    async fn delete_source(&self, collection: &str, source_id: &str) -> Result<usize> {
        let mut collections = self.write()?;
        let Some(stored) = collections.get_mut(collection) else {
            return Ok(0);
        };

        let initial_len = stored.len();
        stored.retain(|s| s.record.metadata.source_id != source_id);
        Ok(initial_len - stored.len())
    }

    async fn list_sources(&self, collection: &str) -> Result<Vec<IndexedSource>> {
        let collections = self.read()?;
        let Some(stored) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut source_map: HashMap<String, IndexedSource> = HashMap::new();

        for s in stored {
            let meta = &s.record.metadata;
            let entry = source_map
                .entry(meta.source_id.clone())
                .or_insert_with(|| IndexedSource {
                    source_id: meta.source_id.clone(),
                    title: meta.title.clone(),
                    passage_count: 0,
                    duration_seconds: 0.0,
                    indexed_at: s.indexed_at,
                });

            entry.passage_count += 1;
            if meta.end > entry.duration_seconds {
                entry.duration_seconds = meta.end;
            }
            if s.indexed_at > entry.indexed_at {
                entry.indexed_at = s.indexed_at;
            }
        }

        let mut sources: Vec<IndexedSource> = source_map.into_values().collect();
        sources.sort_by(|a, b| {
            b.indexed_at
                .cmp(&a.indexed_at)
                .then_with(|| a.source_id.cmp(&b.source_id))
        });

        Ok(sources)
    }

    async fn records(&self, collection: &str) -> Result<Vec<VectorRecord>> {
        let collections = self.read()?;
        Ok(collections
            .get(collection)
            .map(|stored| stored.iter().map(|s| s.record.clone()).collect())
            .unwrap_or_default())
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let collections = self.read()?;
        Ok(collections.get(collection).map_or(0, Vec::len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::test_support::record;

    #[tokio::test]
    async fn test_memory_vector_store() {
        let store = MemoryVectorStore::new();

        let records = vec![
            record("ep1", 0, "Hello world", vec![1.0, 0.0, 0.0]),
            record("ep1", 1, "Goodbye world", vec![0.0, 1.0, 0.0]),
        ];
        store.add("podcasts", &records).await.unwrap();

        assert_eq!(store.count("podcasts").await.unwrap(), 2);
        assert_eq!(store.count("other").await.unwrap(), 0);

        let results = store.query("podcasts", &[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(results.ids, vec!["ep1:0", "ep1:1"]);
        assert!(results.distances[0] < results.distances[1]);
        assert_eq!(results.metadatas[0].title, "ep1.mp3");

        let sources = store.list_sources("podcasts").await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].passage_count, 2);
        assert!(store.is_source_indexed("podcasts", "ep1").await.unwrap());
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let store = MemoryVectorStore::new();
        store.add("a", &[record("ep", 0, "one", vec![1.0])]).await.unwrap();
        store.add("b", &[record("ep", 0, "two", vec![1.0])]).await.unwrap();

        let a = store.records("a").await.unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].document, "one");

        assert_eq!(store.delete_source("a", "ep").await.unwrap(), 1);
        assert_eq!(store.count("a").await.unwrap(), 0);
        assert_eq!(store.count("b").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_replacing_record_keeps_single_copy() {
        let store = MemoryVectorStore::new();
        store.add("c", &[record("ep", 0, "old", vec![1.0])]).await.unwrap();
        store.add("c", &[record("ep", 0, "new", vec![1.0])]).await.unwrap();

        let records = store.records("c").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].document, "new");
    }
}
