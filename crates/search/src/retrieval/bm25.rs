//! BM25 lexical search over the in-memory passage index
//!
//! Okapi BM25 with the usual parameters. Query and passages share the
//! normalizer's token alphabet, so expanded queries match manual text directly.

use super::{RetrievalMode, Retriever};
use crate::index::{lexical_terms, PassageIndex};
use hydradoc_common::errors::Result;
use hydradoc_common::passage::RetrievedPassage;
use std::collections::HashSet;
use std::sync::Arc;

const BM25_K1: f32 = 1.2;
const BM25_B: f32 = 0.75;

/// BM25 retriever
pub struct BM25Retriever {
    index: Arc<PassageIndex>,
}

impl BM25Retriever {
    /// Create a new BM25 retriever
    pub fn new(index: Arc<PassageIndex>) -> Self {
        Self { index }
    }

    /// Unique query terms in first-seen order
    fn prepare_query(&self, query: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        lexical_terms(query)
            .into_iter()
            .filter(|t| seen.insert(t.clone()))
            .collect()
    }

    fn score(&self, terms: &[String], passage_idx: usize) -> f32 {
        let entry = &self.index.entries()[passage_idx];
        if entry.length == 0 {
            return 0.0;
        }

        let n = self.index.len() as f32;
        let avg_length = self.index.avg_length().max(1.0);
        let length_norm = 1.0 - BM25_B + BM25_B * entry.length as f32 / avg_length;

        terms
            .iter()
            .filter_map(|term| {
                let tf = *entry.term_freqs.get(term)? as f32;
                let df = self.index.doc_freq(term) as f32;
                let idf = ((n - df + 0.5) / (df + 0.5)).ln_1p();
                Some(idf * tf * (BM25_K1 + 1.0) / (tf + BM25_K1 * length_norm))
            })
            .sum()
    }
}

#[async_trait::async_trait]
impl Retriever for BM25Retriever {
    async fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<RetrievedPassage>> {
        let terms = self.prepare_query(query);

        if terms.is_empty() || self.index.is_empty() || limit == 0 {
            return Ok(vec![]);
        }

        let mut scored: Vec<(usize, f32)> = (0..self.index.len())
            .map(|i| (i, self.score(&terms, i)))
            .filter(|(_, score)| *score > 0.0)
            .collect();

        // stable: equal scores keep index order
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);

        let entries = self.index.entries();
        Ok(scored
            .into_iter()
            .map(|(i, score)| entries[i].passage.clone().with_score(score))
            .collect())
    }

    fn mode(&self) -> RetrievalMode {
        RetrievalMode::BM25
    }

    fn is_ready(&self) -> bool {
        !self.index.is_empty()
    }
}
