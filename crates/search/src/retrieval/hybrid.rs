//! Hybrid retrieval combining BM25 and vector search
//!
//! Both retrievers run concurrently, each under its own timeout, and their
//! lists are merged with RRF. A retriever that is not ready, fails or times
//! out is dropped from the fusion with a warning; the other one still answers.

use super::{
    fusion::{FusedPassage, RRFusion},
    RetrievalMode, Retriever,
};
use hydradoc_common::config::RetrievalConfig;
use hydradoc_common::errors::{AppError, Result};
use hydradoc_common::metrics;
use hydradoc_common::passage::RetrievedPassage;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How one retriever fared in a hybrid call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum RetrieverStatus {
    Ok { results: usize },
    Unavailable { reason: String },
}

impl RetrieverStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, RetrieverStatus::Ok { .. })
    }
}

/// Fused results plus per-retriever status
#[derive(Debug, Clone, Serialize)]
pub struct FusionOutcome {
    pub results: Vec<FusedPassage>,
    pub lexical: RetrieverStatus,
    pub semantic: RetrieverStatus,
}

impl FusionOutcome {
    pub fn passages(&self) -> Vec<RetrievedPassage> {
        self.results.iter().map(|r| r.passage.clone()).collect()
    }

    pub fn all_unavailable(&self) -> bool {
        !self.lexical.is_available() && !self.semantic.is_available()
    }
}

/// Hybrid retriever combining BM25 and vector
pub struct HybridRetriever {
    lexical: Arc<dyn Retriever>,
    semantic: Arc<dyn Retriever>,
    fusion: RRFusion,
    per_retriever_limit: usize,
    timeout: Duration,
}

impl HybridRetriever {
    /// Create a new hybrid retriever
    pub fn new(lexical: Arc<dyn Retriever>, semantic: Arc<dyn Retriever>) -> Self {
        Self::from_config(lexical, semantic, &RetrievalConfig::default())
    }

    pub fn from_config(
        lexical: Arc<dyn Retriever>,
        semantic: Arc<dyn Retriever>,
        config: &RetrievalConfig,
    ) -> Self {
        Self {
            lexical,
            semantic,
            fusion: RRFusion::new(config.rrf_k, config.lexical_weight, config.semantic_weight),
            per_retriever_limit: config.per_retriever_top_k,
            timeout: config.timeout(),
        }
    }

    pub fn lexical_ready(&self) -> bool {
        self.lexical.is_ready()
    }

    pub fn semantic_ready(&self) -> bool {
        self.semantic.is_ready()
    }

    async fn run(&self, retriever: &dyn Retriever, query: &str) -> Result<Vec<RetrievedPassage>> {
        let mode = retriever.mode();
        if !retriever.is_ready() {
            return Err(AppError::RetrieverUnavailable {
                retriever: mode.to_string(),
                message: "index not built or empty".to_string(),
            });
        }

        let start = Instant::now();
        let result = match tokio::time::timeout(
            self.timeout,
            retriever.retrieve(query, self.per_retriever_limit),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(AppError::RetrieverTimeout {
                retriever: mode.to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        };

        metrics::record_retrieval(start.elapsed().as_secs_f64(), mode.as_str(), result.is_ok());
        result
    }

    fn settle(
        &self,
        mode: RetrievalMode,
        query: &str,
        result: Result<Vec<RetrievedPassage>>,
    ) -> (Vec<RetrievedPassage>, RetrieverStatus) {
        match result {
            Ok(results) => {
                let status = RetrieverStatus::Ok {
                    results: results.len(),
                };
                (results, status)
            }
            Err(e) => {
                warn!(
                    retriever = %mode,
                    query = %query,
                    error = %e,
                    "Retriever unavailable, continuing without it"
                );
                metrics::record_fallback(mode.as_str());
                (Vec::new(), RetrieverStatus::Unavailable { reason: e.to_string() })
            }
        }
    }

    /// Run both retrievers on the expanded query and fuse to `top_k`
    pub async fn fuse(&self, query: &str, top_k: usize) -> FusionOutcome {
        let (lexical, semantic) = tokio::join!(
            self.run(self.lexical.as_ref(), query),
            self.run(self.semantic.as_ref(), query)
        );

        let (lexical_results, lexical_status) = self.settle(self.lexical.mode(), query, lexical);
        let (semantic_results, semantic_status) = self.settle(self.semantic.mode(), query, semantic);

        let results = self.fusion.fuse(lexical_results, semantic_results, top_k);
        metrics::record_fusion(results.len());

        debug!(
            query = %query,
            lexical = ?lexical_status,
            semantic = ?semantic_status,
            fused = results.len(),
            "Hybrid retrieval finished"
        );

        FusionOutcome {
            results,
            lexical: lexical_status,
            semantic: semantic_status,
        }
    }
}

#[async_trait::async_trait]
impl Retriever for HybridRetriever {
    async fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<RetrievedPassage>> {
        let outcome = self.fuse(query, limit).await;
        if outcome.all_unavailable() {
            return Err(AppError::RetrieverUnavailable {
                retriever: self.mode().to_string(),
                message: "no retriever available".to_string(),
            });
        }
        Ok(outcome.passages())
    }

    fn mode(&self) -> RetrievalMode {
        RetrievalMode::Hybrid
    }

    fn is_ready(&self) -> bool {
        self.lexical.is_ready() || self.semantic.is_ready()
    }
}
