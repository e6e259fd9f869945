//! Vector similarity search over passage embeddings
//!
//! Provides semantic search via cosine similarity between the query
//! embedding and the vectors stored in the passage index.

use super::{RetrievalMode, Retriever};
use crate::index::PassageIndex;
use hydradoc_common::embeddings::Embedder;
use hydradoc_common::errors::{AppError, Result};
use hydradoc_common::passage::RetrievedPassage;
use std::sync::Arc;

/// Vector retriever
pub struct VectorRetriever {
    index: Arc<PassageIndex>,
    embedder: Arc<dyn Embedder>,
}

impl VectorRetriever {
    /// Create a new vector retriever
    pub fn new(index: Arc<PassageIndex>, embedder: Arc<dyn Embedder>) -> Self {
        Self { index, embedder }
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[async_trait::async_trait]
impl Retriever for VectorRetriever {
    async fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<RetrievedPassage>> {
        let vectors = self.index.vectors().ok_or_else(|| AppError::RetrieverUnavailable {
            retriever: self.mode().to_string(),
            message: "passage index has no embeddings".to_string(),
        })?;

        if query.trim().is_empty() || limit == 0 {
            return Ok(vec![]);
        }

        let query_embedding = self.embedder.embed(query).await?;

        let mut scored: Vec<(usize, f32)> = vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, cosine_similarity(&query_embedding, v)))
            .collect();

        // stable: ties keep index order
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);

        let entries = self.index.entries();
        Ok(scored
            .into_iter()
            .map(|(i, score)| entries[i].passage.clone().with_score(score))
            .collect())
    }

    fn mode(&self) -> RetrievalMode {
        RetrievalMode::Vector
    }

    fn is_ready(&self) -> bool {
        self.index.has_vectors()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::tests::sample_documents;
    use hydradoc_common::embeddings::MockEmbedder;

    async fn retriever() -> VectorRetriever {
        let embedder: Arc<dyn Embedder> = Arc::new(MockEmbedder::new(256));
        let index = PassageIndex::build(sample_documents(), Some(embedder.clone()), 2).await;
        VectorRetriever::new(Arc::new(index), embedder)
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 1.0]), 0.0);
    }

    #[tokio::test]
    async fn test_ranks_by_similarity() {
        let r = retriever().await;
        assert!(r.is_ready());
        let results = r
            .retrieve("Temperatursonde in die Steckbuchse stecken", 3)
            .await
            .unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].metadata.page_number, 39);
        for pair in results.windows(2) {
            assert!(pair[0].relevance_score >= pair[1].relevance_score);
        }
    }

    #[tokio::test]
    async fn test_unavailable_without_vectors() {
        let embedder: Arc<dyn Embedder> = Arc::new(MockEmbedder::new(32));
        let r = VectorRetriever::new(Arc::new(PassageIndex::from_documents(sample_documents())), embedder);
        assert!(!r.is_ready());
        let err = r.retrieve("druck", 5).await.unwrap_err();
        assert!(matches!(err, AppError::RetrieverUnavailable { .. }));
    }
}
