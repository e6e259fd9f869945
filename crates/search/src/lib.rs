//! HydraDoc Search
//!
//! Retrieval over the pre-parsed manual corpus:
//! - In-memory passage index (one passage per manual page)
//! - BM25 lexical retrieval
//! - Embedding cosine retrieval
//! - Hybrid retrieval with reciprocal-rank fusion and single-retriever fallback

pub mod index;
pub mod retrieval;

pub use index::{CorpusDocument, CorpusPage, DocumentSummary, IndexStats, PassageIndex};
pub use retrieval::{
    BM25Retriever, FusedPassage, FusionOutcome, HybridRetriever, RRFusion, RetrievalMode,
    Retriever, RetrieverStatus, VectorRetriever,
};
