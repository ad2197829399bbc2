//! Okapi BM25 over the registered passage corpus.
//!
//! The index is immutable. Term statistics are corpus-wide, so any change to
//! the entry set means building a new index.

use super::Ranking;
use crate::vector_store::{PassageMetadata, VectorRecord};
use std::collections::HashMap;

/// A passage registered with the lexical ranker.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusEntry {
    pub passage_id: String,
    pub text: String,
    /// Kept so lexical-only hits can carry citations.
    pub metadata: PassageMetadata,
}

impl From<VectorRecord> for CorpusEntry {
    fn from(record: VectorRecord) -> Self {
        Self {
            passage_id: record.id,
            text: record.document,
            metadata: record.metadata,
        }
    }
}

/// BM25 free parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    /// Term-frequency saturation.
    pub k1: f64,
    /// Document length normalization.
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.5, b: 0.75 }
    }
}

/// Lowercase and split on whitespace. No stemming, no stopwords.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(|t| t.to_lowercase()).collect()
}

/// Immutable BM25 index.
#[derive(Debug, Clone, Default)]
pub struct LexicalIndex {
    entries: Vec<CorpusEntry>,
    term_freqs: Vec<HashMap<String, usize>>,
    doc_lens: Vec<usize>,
    idf: HashMap<String, f64>,
    avg_doc_len: f64,
    params: Bm25Params,
}

impl LexicalIndex {
    /// Tokenize and score the whole corpus. Entry order is the tie-break order.
    pub fn build(entries: Vec<CorpusEntry>, params: Bm25Params) -> Self {
        let mut term_freqs = Vec::with_capacity(entries.len());
        let mut doc_lens = Vec::with_capacity(entries.len());
        let mut doc_counts: HashMap<String, usize> = HashMap::new();

        for entry in &entries {
            let tokens = tokenize(&entry.text);
            doc_lens.push(tokens.len());

            let mut freqs: HashMap<String, usize> = HashMap::new();
            for token in tokens {
                *freqs.entry(token).or_default() += 1;
            }
            for term in freqs.keys() {
                *doc_counts.entry(term.clone()).or_default() += 1;
            }
            term_freqs.push(freqs);
        }

        let n = entries.len() as f64;
        let idf = doc_counts
            .into_iter()
            .map(|(term, count)| {
                let count = count as f64;
                (term, (1.0 + (n - count + 0.5) / (count + 0.5)).ln())
            })
            .collect();

        let avg_doc_len = if entries.is_empty() {
            0.0
        } else {
            doc_lens.iter().sum::<usize>() as f64 / n
        };

        Self {
            entries,
            term_freqs,
            doc_lens,
            idf,
            avg_doc_len,
            params,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    /// Look up a registered entry by passage id.
    pub fn entry(&self, passage_id: &str) -> Option<&CorpusEntry> {
        self.entries.iter().find(|e| e.passage_id == passage_id)
    }

    /// BM25 score of every entry, in corpus order.
    pub fn scores(&self, query: &str) -> Vec<f64> {
        let query_terms = tokenize(query);
        (0..self.entries.len())
            .map(|doc| self.score_doc(doc, &query_terms))
            .collect()
    }

    /// Every entry with its score, best first. Equal scores keep corpus order.
    pub fn ranked(&self, query: &str) -> Vec<(&CorpusEntry, f64)> {
        let mut scored: Vec<(&CorpusEntry, f64)> =
            self.entries.iter().zip(self.scores(query)).collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored
    }

    /// Ranking of all registered passages for `query`.
    pub fn rank(&self, query: &str) -> Ranking {
        Ranking::from_ordered(self.ranked(query).into_iter().map(|(e, _)| e.passage_id.clone()))
    }

    fn score_doc(&self, doc: usize, query_terms: &[String]) -> f64 {
        let Bm25Params { k1, b } = self.params;
        let freqs = &self.term_freqs[doc];
        let length_ratio = if self.avg_doc_len > 0.0 {
            self.doc_lens[doc] as f64 / self.avg_doc_len
        } else {
            0.0
        };

        query_terms
            .iter()
            .filter_map(|term| {
                let idf = self.idf.get(term)?;
                let tf = *freqs.get(term)? as f64;
                Some(idf * tf * (k1 + 1.0) / (tf + k1 * (1.0 - b + b * length_ratio)))
            })
            .sum()
    }
}
