//! Lexical ranking and rank fusion.
//!
//! Both rankers speak [`Ranking`]: passage ids in best-first order with
//! 1-based ranks. Fusion only ever looks at ranks, never raw scores.

pub mod fusion;
pub mod lexical;

pub use fusion::{fuse, FusedResult, DEFAULT_RRF_K};
pub use lexical::{Bm25Params, CorpusEntry, LexicalIndex};

use serde::{Deserialize, Serialize};

/// One entry of a ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedId {
    pub passage_id: String,
    /// 1 for the best match.
    pub rank: usize,
}

/// An ordered sequence of `(passage_id, rank)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ranking {
    entries: Vec<RankedId>,
}

impl Ranking {
    /// Assign ranks 1, 2, 3, ... to ids in the given order.
    pub fn from_ordered<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = ids
            .into_iter()
            .enumerate()
            .map(|(i, id)| RankedId {
                passage_id: id.into(),
                rank: i + 1,
            })
            .collect();
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = &RankedId> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Best rank of `passage_id`, if present.
    pub fn rank_of(&self, passage_id: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|e| e.passage_id == passage_id)
            .map(|e| e.rank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranks_start_at_one() {
        let ranking = Ranking::from_ordered(["a", "b", "c"]);
        let ranks: Vec<(&str, usize)> = ranking
            .iter()
            .map(|e| (e.passage_id.as_str(), e.rank))
            .collect();
        assert_eq!(ranks, vec![("a", 1), ("b", 2), ("c", 3)]);
        assert_eq!(ranking.rank_of("c"), Some(3));
        assert_eq!(ranking.rank_of("z"), None);
        assert!(Ranking::default().is_empty());
    }
}
