//! Multi-modal retrieval system
//!
//! Provides three retrieval modes:
//! - Vector search (semantic similarity via embeddings)
//! - BM25 search (lexical matching)
//! - Hybrid search (RRF fusion of BM25 + vector, with single-retriever fallback)

mod bm25;
mod fusion;
mod hybrid;
mod vector;

pub use bm25::BM25Retriever;
pub use fusion::{FusedPassage, RRFusion};
pub use hybrid::{FusionOutcome, HybridRetriever, RetrieverStatus};
pub use vector::VectorRetriever;

use hydradoc_common::errors::Result;
use hydradoc_common::passage::RetrievedPassage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Retrieval mode
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMode {
    /// Vector similarity search
    Vector,
    /// BM25 lexical search
    BM25,
    /// Combined hybrid search
    Hybrid,
}

impl RetrievalMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetrievalMode::Vector => "vector",
            RetrievalMode::BM25 => "bm25",
            RetrievalMode::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for RetrievalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Common trait for all retrievers
#[async_trait::async_trait]
pub trait Retriever: Send + Sync {
    /// Ranked passages for the query, best first, at most `limit`
    async fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<RetrievedPassage>>;

    /// Get the retrieval mode
    fn mode(&self) -> RetrievalMode;

    /// Whether the backing index can serve queries
    fn is_ready(&self) -> bool {
        true
    }
}
