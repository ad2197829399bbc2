//! Reciprocal rank fusion.

use super::Ranking;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Conventional RRF smoothing constant.
pub const DEFAULT_RRF_K: u32 = 60;

/// A passage with its fused score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedResult {
    pub passage_id: String,
    pub fused_score: f64,
}

/// Fuse rankings by summing `1 / (k_constant + rank)` per passage.
///
/// A passage missing from a ranking gets nothing from it. Equal scores keep
/// the order in which ids were first seen, walking the rankings in order.
/// Only the first occurrence of an id within one ranking counts.
pub fn fuse(rankings: &[Ranking], k_constant: u32, top_k: usize) -> Vec<FusedResult> {
    let k = f64::from(k_constant);
    let mut fused: Vec<FusedResult> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for ranking in rankings {
        let mut seen: HashSet<&str> = HashSet::new();
        for entry in ranking.iter() {
            let id = entry.passage_id.as_str();
            if !seen.insert(id) {
                continue;
            }

            let contribution = 1.0 / (k + entry.rank as f64);
            match positions.get(id) {
                Some(&pos) => fused[pos].fused_score += contribution,
                None => {
                    positions.insert(id, fused.len());
                    fused.push(FusedResult {
                        passage_id: id.to_string(),
                        fused_score: contribution,
                    });
                }
            }
        }
    }

    fused.sort_by(|a, b| b.fused_score.total_cmp(&a.fused_score));
    fused.truncate(top_k);
    fused
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(results: &[FusedResult]) -> Vec<&str> {
        results.iter().map(|r| r.passage_id.as_str()).collect()
    }

    #[test]
    fn test_exact_tie_keeps_first_encountered() {
        let a = Ranking::from_ordered(["x", "y"]);
        let b = Ranking::from_ordered(["y", "x"]);

        let fused = fuse(&[a, b], DEFAULT_RRF_K, 10);

        let expected = 1.0 / 61.0 + 1.0 / 62.0;
        assert_eq!(ids(&fused), vec!["x", "y"]);
        assert!((fused[0].fused_score - expected).abs() < 1e-12);
        assert_eq!(fused[0].fused_score, fused[1].fused_score);
    }

    #[test]
    fn test_unanimous_first_wins() {
        let rankings = vec![
            Ranking::from_ordered(["top", "b", "c"]),
            Ranking::from_ordered(["top", "c", "d"]),
            Ranking::from_ordered(["top", "d", "b"]),
        ];

        let fused = fuse(&rankings, DEFAULT_RRF_K, 10);

        assert_eq!(fused[0].passage_id, "top");
        assert!((fused[0].fused_score - 3.0 / 61.0).abs() < 1e-12);
        assert!(fused[1..].iter().all(|r| r.fused_score < fused[0].fused_score));
    }

    #[test]
    fn test_absent_passage_is_not_forced_last() {
        let vector = Ranking::from_ordered(["solo", "a", "b", "c"]);
        let lexical = Ranking::from_ordered(["c", "b", "a"]);

        let fused = fuse(&[vector, lexical], DEFAULT_RRF_K, 4);

        // solo only scores 1/61 but still beats nothing.
        assert!(ids(&fused).contains(&"solo"));
        assert_eq!(fused.len(), 4);
    }

    #[test]
    fn test_top_k_truncates() {
        let fused = fuse(&[Ranking::from_ordered(["a", "b", "c"])], DEFAULT_RRF_K, 2);
        assert_eq!(ids(&fused), vec!["a", "b"]);
        assert!(fuse(&[Ranking::from_ordered(["a"])], DEFAULT_RRF_K, 0).is_empty());
    }

    #[test]
    fn test_empty_inputs() {
        assert!(fuse(&[], DEFAULT_RRF_K, 5).is_empty());
        assert!(fuse(&[Ranking::default(), Ranking::default()], DEFAULT_RRF_K, 5).is_empty());
    }

    #[test]
    fn test_duplicate_ids_count_once_per_ranking() {
        let noisy = Ranking::from_ordered(["a", "a", "b"]);
        let fused = fuse(&[noisy], 0, 10);

        assert_eq!(ids(&fused), vec!["a", "b"]);
        assert_eq!(fused[0].fused_score, 1.0);
        assert_eq!(fused[1].fused_score, 1.0 / 3.0);
    }

    #[test]
    fn test_smaller_k_sharpens_curve() {
        let a = Ranking::from_ordered(["p", "q"]);
        let sharp = fuse(&[a.clone()], 1, 2);
        let flat = fuse(&[a], 1000, 2);

        let ratio = |r: &[FusedResult]| r[0].fused_score / r[1].fused_score;
        assert!(ratio(&sharp) > ratio(&flat));
    }
}
