//! Vector store abstraction for Hark.
//!
//! The store is an opaque nearest-neighbour index scoped by named collection.
//! It returns ranked passages together with their text and metadata.

mod memory;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::chunking::Passage;
use crate::config::{Settings, VectorStoreSettings};
use crate::error::{HarkError, Result};
use crate::search::Ranking;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Citation metadata stored alongside every passage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassageMetadata {
    /// Source (episode) id.
    pub source_id: String,
    /// Human-readable source title, usually the uploaded file name.
    pub title: String,
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
    /// Position within the source.
    pub sequence_index: usize,
    /// Speakers heard during the passage, in order of first appearance.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub speakers: Vec<String>,
    /// Whether speaker turns were available for the source.
    #[serde(default)]
    pub has_diarization: bool,
}

impl PassageMetadata {
    /// Metadata for a passage without speaker annotation.
    pub fn for_passage(passage: &Passage, title: &str) -> Self {
        Self {
            source_id: passage.source_id.clone(),
            title: title.to_string(),
            start: passage.start,
            end: passage.end,
            sequence_index: passage.sequence_index,
            speakers: Vec::new(),
            has_diarization: false,
        }
    }
}

/// A passage as stored in the vector index.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    /// Passage id (`"{source_id}:{sequence_index}"`).
    pub id: String,
    /// Embedding vector.
    pub embedding: Vec<f32>,
    /// Passage text.
    pub document: String,
    /// Citation metadata.
    pub metadata: PassageMetadata,
}

/// Nearest-neighbour query response, best match first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub ids: Vec<String>,
    pub documents: Vec<String>,
    pub metadatas: Vec<PassageMetadata>,
    /// Cosine distances (`1 - similarity`), ascending.
    pub distances: Vec<f32>,
}

impl QueryResult {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The native order of this response as a ranking.
    pub fn ranking(&self) -> Ranking {
        Ranking::from_ordered(self.ids.iter().cloned())
    }

    /// Append one match; callers push in ranked order.
    pub(crate) fn push(&mut self, record: VectorRecord, distance: f32) {
        self.ids.push(record.id);
        self.documents.push(record.document);
        self.metadatas.push(record.metadata);
        self.distances.push(distance);
    }
}

/// Summary information about an indexed source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedSource {
    /// Source id.
    pub source_id: String,
    /// Source title.
    pub title: String,
    /// Number of indexed passages.
    pub passage_count: u32,
    /// End of the last passage in seconds.
    pub duration_seconds: f64,
    /// When the source was indexed.
    pub indexed_at: DateTime<Utc>,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Add (or replace, by id) records in a collection.
    async fn add(&self, collection: &str, records: &[VectorRecord]) -> Result<usize>;

    /// Return up to `top_k` records closest to `embedding`.
    ///
    /// Equal distances keep insertion order.
    async fn query(&self, collection: &str, embedding: &[f32], top_k: usize) -> Result<QueryResult>;

    /// Delete every record of a source.
    async fn delete_source(&self, collection: &str, source_id: &str) -> Result<usize>;

    /// List indexed sources, most recently indexed first.
    async fn list_sources(&self, collection: &str) -> Result<Vec<IndexedSource>>;

    /// All records of a collection in insertion order.
    async fn records(&self, collection: &str) -> Result<Vec<VectorRecord>>;

    /// Number of records in a collection.
    async fn count(&self, collection: &str) -> Result<usize>;

    /// Check whether a source has any records.
    async fn is_source_indexed(&self, collection: &str, source_id: &str) -> Result<bool> {
        let sources = self.list_sources(collection).await?;
        Ok(sources.iter().any(|s| s.source_id == source_id))
    }
}

/// Open the configured vector store.
pub fn create_vector_store(settings: &VectorStoreSettings) -> Result<Arc<dyn VectorStore>> {
    match settings.provider.as_str() {
        "sqlite" => Ok(Arc::new(SqliteVectorStore::new(&Settings::expand_path(
            &settings.sqlite_path,
        ))?)),
        "memory" => Ok(Arc::new(MemoryVectorStore::new())),
        other => Err(HarkError::Config(format!(
            "Unknown vector store provider: {}",
            other
        ))),
    }
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Cosine distance as reported in [`QueryResult::distances`].
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}

/// Rank records by ascending distance to `embedding`, stable on input order.
pub(crate) fn nearest(records: Vec<VectorRecord>, embedding: &[f32], top_k: usize) -> QueryResult {
    let mut scored: Vec<(f32, VectorRecord)> = records
        .into_iter()
        .map(|r| (cosine_distance(embedding, &r.embedding), r))
        .collect();

    scored.sort_by(|a, b| a.0.total_cmp(&b.0));
    scored.truncate(top_k);

    let mut result = QueryResult::default();
    for (distance, record) in scored {
        result.push(record, distance);
    }
    result
}


#[cfg(test)]
mod tests {
    use super::test_support::record;
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);

        assert_eq!(cosine_similarity(&a, &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_nearest_breaks_ties_by_insertion_order() {
        let records = vec![
            record("ep", 0, "far", vec![0.0, 1.0]),
            record("ep", 1, "twin a", vec![1.0, 0.0]),
            record("ep", 2, "twin b", vec![2.0, 0.0]),
        ];

        let result = nearest(records, &[1.0, 0.0], 10);

        assert_eq!(result.ids, vec!["ep:1", "ep:2", "ep:0"]);
        assert!(result.distances[0].abs() < 1e-6);
        assert!((result.distances[2] - 1.0).abs() < 1e-6);

        let ranking = result.ranking();
        assert_eq!(ranking.rank_of("ep:2"), Some(2));
    }

    #[test]
    fn test_create_vector_store() {
        let memory = VectorStoreSettings {
            provider: "memory".to_string(),
            ..VectorStoreSettings::default()
        };
        assert!(create_vector_store(&memory).is_ok());

        let unknown = VectorStoreSettings {
            provider: "chroma".to_string(),
            ..VectorStoreSettings::default()
        };
        assert!(matches!(create_vector_store(&unknown), Err(HarkError::Config(_))));
    }

    #[test]
    fn test_nearest_truncates() {
        let records = vec![
            record("ep", 0, "a", vec![1.0, 0.0]),
            record("ep", 1, "b", vec![1.0, 0.1]),
        ];
        assert_eq!(nearest(records, &[1.0, 0.0], 1).len(), 1);
    }
}
