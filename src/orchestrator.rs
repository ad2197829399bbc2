//! Retrieval orchestrator for Hark.
//!
//! Owns the corpus for one collection: the vector store handle and the
//! lexical index built from the same records. Ingestion replaces a source's
//! passages in both; retrieval ranks with both and fuses.

use crate::audio::{is_supported_audio, source_id_for};
use crate::chunking::WindowChunker;
use crate::config::Settings;
use crate::diarization::{annotate, Diarizer, RttmDiarizer, SpeakerTurn};
use crate::embedding::{create_embedder, Embedder};
use crate::error::{HarkError, Result};
use crate::rag::{Hit, RankSource};
use crate::search::{fuse, Bm25Params, CorpusEntry, LexicalIndex, Ranking};
use crate::transcription::{load_transcript, Transcriber, Transcript, WhisperTranscriber};
use crate::vector_store::{
    create_vector_store, IndexedSource, PassageMetadata, QueryResult, VectorRecord, VectorStore,
};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

/// Outcome of ingesting one source.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub source_id: String,
    pub title: String,
    /// Number of passages now indexed for the source.
    pub passages: usize,
    /// Whether speaker turns annotated the passages.
    pub has_diarization: bool,
    /// Whether ingestion was skipped because the source was already indexed.
    pub skipped: bool,
}

/// Coordinates passage building, both rankers and fusion for one collection.
pub struct Orchestrator {
    settings: Settings,
    collection: String,
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    transcriber: Arc<dyn Transcriber>,
    diarizer: Option<Arc<dyn Diarizer>>,
    chunker: WindowChunker,
    bm25: Bm25Params,
    // Also the corpus gate: writers hold it across the store mutation and the rebuild.
    lexical: RwLock<Arc<LexicalIndex>>,
}

impl Orchestrator {
    /// Build the orchestrator and its collaborators from settings.
    pub async fn new(settings: Settings) -> Result<Self> {
        let temp_dir = settings.temp_dir();
        std::fs::create_dir_all(&temp_dir)?;

        let transcriber: Arc<dyn Transcriber> = Arc::new(
            WhisperTranscriber::from_settings(&settings.transcription)?.with_work_dir(temp_dir),
        );
        let embedder = create_embedder(&settings.embedding)?;
        let vector_store = create_vector_store(&settings.vector_store)?;
        let diarizer = RttmDiarizer::from_settings(&settings.diarization)
            .map(|d| Arc::new(d) as Arc<dyn Diarizer>);

        Self::with_components(settings, vector_store, embedder, transcriber, diarizer).await
    }

    /// Create an orchestrator with custom components.
    ///
    /// The lexical index is loaded from the store's records for the collection.
    pub async fn with_components(
        settings: Settings,
        vector_store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        transcriber: Arc<dyn Transcriber>,
        diarizer: Option<Arc<dyn Diarizer>>,
    ) -> Result<Self> {
        settings.validate()?;

        let chunker = WindowChunker::new(settings.chunking.window()?);
        let bm25 = Bm25Params {
            k1: settings.retrieval.bm25_k1,
            b: settings.retrieval.bm25_b,
        };
        let collection = settings.vector_store.collection.clone();

        let orchestrator = Self {
            settings,
            collection,
            vector_store,
            embedder,
            transcriber,
            diarizer,
            chunker,
            bm25,
            lexical: RwLock::new(Arc::new(LexicalIndex::default())),
        };

        let index = orchestrator.build_lexical_index().await?;
        info!(
            "Loaded {} passages from collection {}",
            index.len(),
            orchestrator.collection
        );
        *orchestrator.lexical.write().await = Arc::new(index);

        Ok(orchestrator)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Number of passages registered with the lexical ranker.
    pub async fn passage_count(&self) -> usize {
        self.lexical.read().await.len()
    }

    /// Transcribe, chunk and index an audio file.
    ///
    /// The source id is derived from the file's contents. Already indexed
    /// sources are skipped unless `force` is set.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn ingest_file(&self, path: &Path, force: bool) -> Result<IngestReport> {
        if !path.is_file() {
            return Err(HarkError::InvalidInput(format!(
                "File not found: {}",
                path.display()
            )));
        }
        if !is_supported_audio(path) {
            return Err(HarkError::InvalidInput(format!(
                "Unsupported audio format: {}",
                path.display()
            )));
        }

        let source_id = source_id_for(path)?;
        let title = file_title(path);

        if !force && self.vector_store.is_source_indexed(&self.collection, &source_id).await? {
            info!("Source {} is already indexed, skipping", source_id);
            return Ok(IngestReport::skipped(source_id, title));
        }

        let transcript = match self.transcriber.transcribe(path).await {
            Ok(transcript) => transcript,
            Err(e) => {
                warn!("Transcription failed for {}: {}", title, e);
                Transcript::default()
            }
        };
        let turns = self.speaker_turns(path).await;

        self.ingest_transcript_data(&source_id, &title, &transcript, turns.as_deref())
            .await
    }

    /// Index a pre-transcribed JSON transcript.
    ///
    /// Speaker turns are looked up next to the transcript when diarization is enabled.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn ingest_transcript(&self, path: &Path, force: bool) -> Result<IngestReport> {
        let transcript = load_transcript(path)?;
        let source_id = source_id_for(path)?;
        let title = file_title(path);

        if !force && self.vector_store.is_source_indexed(&self.collection, &source_id).await? {
            info!("Source {} is already indexed, skipping", source_id);
            return Ok(IngestReport::skipped(source_id, title));
        }

        let turns = self.speaker_turns(path).await;
        self.ingest_transcript_data(&source_id, &title, &transcript, turns.as_deref())
            .await
    }

    /// Replace a source's passages with those built from `transcript`.
    #[instrument(skip(self, transcript, turns))]
    pub async fn ingest_transcript_data(
        &self,
        source_id: &str,
        title: &str,
        transcript: &Transcript,
        turns: Option<&[SpeakerTurn]>,
    ) -> Result<IngestReport> {
        let passages = self.chunker.chunk_transcript(source_id, transcript);
        debug!("Built {} passages for {}", passages.len(), source_id);

        let texts: Vec<String> = passages.iter().map(|p| p.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != passages.len() {
            return Err(HarkError::Embedding(format!(
                "Expected {} embeddings, got {}",
                passages.len(),
                embeddings.len()
            )));
        }

        let records: Vec<VectorRecord> = passages
            .iter()
            .zip(embeddings)
            .map(|(passage, embedding)| {
                let mut metadata = PassageMetadata::for_passage(passage, title);
                annotate(&mut metadata, turns);
                VectorRecord {
                    id: passage.id(),
                    embedding,
                    document: passage.text.clone(),
                    metadata,
                }
            })
            .collect();

        let mut lexical = self.lexical.write().await;
        let replaced = self.replace_source(source_id, &records).await;
        // Rebuild even on failure so the lexical side matches whatever the store holds.
        *lexical = Arc::new(self.build_lexical_index().await?);
        replaced?;

        info!("Indexed {} passages for {}", records.len(), source_id);

        Ok(IngestReport {
            source_id: source_id.to_string(),
            title: title.to_string(),
            passages: records.len(),
            has_diarization: records.iter().any(|r| r.metadata.has_diarization),
            skipped: false,
        })
    }

    /// Delete a source from both rankers.
    #[instrument(skip(self))]
    pub async fn remove_source(&self, source_id: &str) -> Result<usize> {
        let mut lexical = self.lexical.write().await;
        let deleted = self.vector_store.delete_source(&self.collection, source_id).await;
        *lexical = Arc::new(self.build_lexical_index().await?);

        let deleted = deleted?;
        if deleted == 0 {
            return Err(HarkError::SourceNotFound(source_id.to_string()));
        }
        Ok(deleted)
    }

    /// Indexed sources, most recent first.
    pub async fn list_sources(&self) -> Result<Vec<IndexedSource>> {
        self.vector_store.list_sources(&self.collection).await
    }

    /// Hybrid retrieval: vector and lexical rankings fused by reciprocal rank.
    ///
    /// When one side has no corpus or fails, the other side's results are
    /// returned in its own order. An empty corpus yields no hits.
    #[instrument(skip(self))]
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Hit>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        // Held across both rankings so they see the same corpus.
        let lexical = self.lexical.read().await;

        let breadth = top_k.saturating_mul(self.settings.retrieval.candidate_multiplier.max(1));
        let vector = self.vector_candidates(query, breadth).await;
        let lexical_ranked = if lexical.is_empty() {
            None
        } else {
            Some(lexical.ranked(query))
        };

        let hits = match (vector, lexical_ranked) {
            (None, None) => Vec::new(),
            (Some(vector), None) => {
                debug!("Lexical corpus empty, using vector ranking");
                vector_hits(vector, top_k)
            }
            (None, Some(ranked)) => {
                debug!("Vector ranking unavailable, using lexical ranking");
                ranked
                    .into_iter()
                    .take(top_k)
                    .map(|(entry, score)| entry_hit(entry, score, RankSource::Lexical))
                    .collect()
            }
            (Some(vector), Some(ranked)) => {
                let lexical_ranking =
                    Ranking::from_ordered(ranked.iter().map(|(e, _)| e.passage_id.clone()));
                let fused = fuse(
                    &[vector.ranking(), lexical_ranking],
                    self.settings.retrieval.rrf_k,
                    top_k,
                );

                let positions: HashMap<&str, usize> = vector
                    .ids
                    .iter()
                    .enumerate()
                    .map(|(i, id)| (id.as_str(), i))
                    .collect();

                fused
                    .into_iter()
                    .filter_map(|result| match positions.get(result.passage_id.as_str()) {
                        Some(&i) => Some(Hit {
                            passage_id: result.passage_id.clone(),
                            document_text: vector.documents[i].clone(),
                            metadata: vector.metadatas[i].clone(),
                            score: result.fused_score,
                            ranked_by: RankSource::Fused,
                        }),
                        None => lexical
                            .entry(&result.passage_id)
                            .map(|entry| entry_hit(entry, result.fused_score, RankSource::Fused)),
                    })
                    .collect()
            }
        };

        debug!("Retrieved {} hits", hits.len());
        Ok(hits)
    }

    /// Vector ranking, or `None` when the collection is empty or the embedder fails.
    async fn vector_candidates(&self, query: &str, breadth: usize) -> Option<QueryResult> {
        match self.vector_store.count(&self.collection).await {
            Ok(0) => return None,
            Ok(_) => {}
            Err(e) => {
                warn!("Vector store unavailable: {}", e);
                return None;
            }
        }

        let embedding = match self.embedder.embed(query).await {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!("Query embedding failed, falling back to lexical ranking: {}", e);
                return None;
            }
        };

        match self.vector_store.query(&self.collection, &embedding, breadth).await {
            Ok(result) if !result.is_empty() => Some(result),
            Ok(_) => None,
            Err(e) => {
                warn!("Vector query failed, falling back to lexical ranking: {}", e);
                None
            }
        }
    }

    async fn replace_source(&self, source_id: &str, records: &[VectorRecord]) -> Result<()> {
        self.vector_store.delete_source(&self.collection, source_id).await?;
        if !records.is_empty() {
            self.vector_store.add(&self.collection, records).await?;
        }
        Ok(())
    }

    async fn build_lexical_index(&self) -> Result<LexicalIndex> {
        let records = self.vector_store.records(&self.collection).await?;
        let entries = records.into_iter().map(CorpusEntry::from).collect();
        Ok(LexicalIndex::build(entries, self.bm25))
    }

    async fn speaker_turns(&self, path: &Path) -> Option<Vec<SpeakerTurn>> {
        let diarizer = self.diarizer.as_ref()?;
        match diarizer.diarize(path).await {
            Ok(turns) => Some(turns),
            Err(e) => {
                warn!("Diarization unavailable for {}: {}", path.display(), e);
                None
            }
        }
    }
}

impl IngestReport {
    fn skipped(source_id: String, title: String) -> Self {
        Self {
            source_id,
            title,
            passages: 0,
            has_diarization: false,
            skipped: true,
        }
    }
}

fn file_title(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn vector_hits(result: QueryResult, top_k: usize) -> Vec<Hit> {
    result
        .ids
        .into_iter()
        .zip(result.documents)
        .zip(result.metadatas)
        .zip(result.distances)
        .take(top_k)
        .map(|(((passage_id, document_text), metadata), distance)| Hit {
            passage_id,
            document_text,
            metadata,
            score: f64::from(1.0 - distance),
            ranked_by: RankSource::Vector,
        })
        .collect()
}

fn entry_hit(entry: &CorpusEntry, score: f64, ranked_by: RankSource) -> Hit {
    Hit {
        passage_id: entry.passage_id.clone(),
        document_text: entry.text.clone(),
        metadata: entry.metadata.clone(),
        score,
        ranked_by,
    }
}
