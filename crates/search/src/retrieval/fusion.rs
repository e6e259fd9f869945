//! Reciprocal Rank Fusion (RRF) for combining search results
//!
//! RRF is a simple but effective fusion method that:
//! - Doesn't require score normalization
//! - Works well with different scoring distributions
//! - Is robust to outliers
//!
//! Passages are identified by `(source_file, page_number)`. Each list a
//! passage appears in contributes `weight / (k + rank)` with 1-based ranks.

use hydradoc_common::passage::{PassageKey, RetrievedPassage};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// RRF fusion parameters
#[derive(Debug, Clone)]
pub struct RRFusion {
    /// Constant k (typically 60)
    pub k: f32,

    /// Weight for BM25 results
    pub lexical_weight: f32,

    /// Weight for vector results
    pub semantic_weight: f32,
}

impl Default for RRFusion {
    fn default() -> Self {
        Self {
            k: 60.0,
            lexical_weight: 1.0,
            semantic_weight: 1.0,
        }
    }
}

/// One fused passage with its provenance
#[derive(Debug, Clone, Serialize)]
pub struct FusedPassage {
    /// Passage with `relevance_score` set to the fused score
    pub passage: RetrievedPassage,
    pub lexical_rank: Option<usize>,
    pub semantic_rank: Option<usize>,
    pub rrf_score: f32,
}

impl FusedPassage {
    pub fn in_both(&self) -> bool {
        self.lexical_rank.is_some() && self.semantic_rank.is_some()
    }
}

impl RRFusion {
    pub fn new(k: f32, lexical_weight: f32, semantic_weight: f32) -> Self {
        Self {
            k,
            lexical_weight,
            semantic_weight,
        }
    }

    fn contribution(&self, weight: f32, rank: Option<usize>) -> f32 {
        rank.map(|r| weight / (self.k + r as f32)).unwrap_or(0.0)
    }

    /// Fuse BM25 and vector results using RRF.
    ///
    /// Sorted by fused score descending; equal scores keep lexical order,
    /// with semantic-only passages after, in semantic order. At most `limit`.
    pub fn fuse(
        &self,
        lexical_results: Vec<RetrievedPassage>,
        semantic_results: Vec<RetrievedPassage>,
        limit: usize,
    ) -> Vec<FusedPassage> {
        let mut fused: Vec<FusedPassage> = Vec::with_capacity(lexical_results.len() + semantic_results.len());
        let mut positions: HashMap<PassageKey, usize> = HashMap::new();

        // within one list the first occurrence of a passage keeps its rank
        for (rank, passage) in lexical_results.into_iter().enumerate() {
            let key = passage.key();
            if positions.contains_key(&key) {
                continue;
            }
            positions.insert(key, fused.len());
            fused.push(FusedPassage {
                passage,
                lexical_rank: Some(rank + 1),
                semantic_rank: None,
                rrf_score: 0.0,
            });
        }

        let mut seen_semantic: HashSet<PassageKey> = HashSet::new();
        for (rank, passage) in semantic_results.into_iter().enumerate() {
            let key = passage.key();
            if !seen_semantic.insert(key.clone()) {
                continue;
            }
            match positions.get(&key) {
                Some(&pos) => fused[pos].semantic_rank = Some(rank + 1),
                None => {
                    positions.insert(key, fused.len());
                    fused.push(FusedPassage {
                        passage,
                        lexical_rank: None,
                        semantic_rank: Some(rank + 1),
                        rrf_score: 0.0,
                    });
                }
            }
        }

        for entry in &mut fused {
            entry.rrf_score = self.contribution(self.lexical_weight, entry.lexical_rank)
                + self.contribution(self.semantic_weight, entry.semantic_rank);
            entry.passage.relevance_score = entry.rrf_score;
        }

        // Vec::sort_by is stable, ties keep insertion order
        fused.sort_by(|a, b| {
            b.rrf_score
                .partial_cmp(&a.rrf_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        fused.truncate(limit);
        fused
    }
}
