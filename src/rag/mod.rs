//! Question answering over retrieved passages.
//!
//! Generation is optional: without a reachable provider the answer is an
//! extractive summary of the top hits, and retrieval works either way.

pub mod context;
mod response;

pub use context::{extractive_summary, format_context, NO_CONTEXT_ANSWER};
pub use response::{AnswerEngine, ChatGenerator, Generator};

use crate::transcription::format_timestamp;
use crate::vector_store::PassageMetadata;
use serde::{Deserialize, Serialize};

/// Which signal placed a hit in the result list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankSource {
    /// Reciprocal rank fusion of both rankers.
    Fused,
    /// Vector ranker only.
    Vector,
    /// Lexical ranker only.
    Lexical,
}

/// A citation-bearing retrieval result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub passage_id: String,
    pub document_text: String,
    pub metadata: PassageMetadata,
    /// Score in the scale of `ranked_by`: fused score, cosine similarity or BM25.
    pub score: f64,
    pub ranked_by: RankSource,
}

impl Hit {
    /// `"mm:ss-mm:ss"` span of the passage.
    pub fn timestamp(&self) -> String {
        format!(
            "{}-{}",
            format_timestamp(self.metadata.start),
            format_timestamp(self.metadata.end)
        )
    }

    /// Human-readable citation, e.g. `"episode.mp3 @ 01:05-01:50"`.
    pub fn citation(&self) -> String {
        format!("{} @ {}", self.metadata.title, self.timestamp())
    }
}

/// A generated (or extractive) answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    /// Provider that produced the text; `None` for the extractive summary.
    pub provider: Option<String>,
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn hit(source_id: &str, start: f64, end: f64, text: &str) -> Hit {
        Hit {
            passage_id: format!("{}:0", source_id),
            document_text: text.to_string(),
            metadata: PassageMetadata {
                source_id: source_id.to_string(),
                title: format!("{}.mp3", source_id),
                start,
                end,
                sequence_index: 0,
                speakers: Vec::new(),
                has_diarization: false,
            },
            score: 0.5,
            ranked_by: RankSource::Fused,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::hit;
    use super::*;

    #[test]
    fn test_citation() {
        let hit = hit("ep1", 65.0, 110.0, "text");
        assert_eq!(hit.citation(), "ep1.mp3 @ 01:05-01:50");
    }

    #[test]
    fn test_rank_source_serializes_lowercase() {
        let json = serde_json::to_string(&RankSource::Lexical).unwrap();
        assert_eq!(json, "\"lexical\"");
    }
}
