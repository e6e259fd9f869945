//! HydraDoc Common Library
//!
//! Shared code for all HydraDoc crates including:
//! - Error types and handling
//! - Configuration management
//! - Embedding and text-generation client abstractions
//! - Passage types exchanged between retrieval and answering
//! - Query understanding: normalizer, ontologies, classifier, expander
//! - Metrics and observability

pub mod config;
pub mod embeddings;
pub mod errors;
pub mod llm;
pub mod metrics;
pub mod passage;
pub mod query;
pub mod retry;

// Re-export commonly used types
pub use config::AppConfig;
pub use embeddings::Embedder;
pub use errors::{AppError, Result};
pub use llm::Generator;
pub use passage::{PassageKey, PassageMetadata, RetrievedPassage};
pub use query::{Domain, ExpandedQuery, OntologyStore, QueryExpander};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Default generation model
pub const DEFAULT_GENERATION_MODEL: &str = "gpt-4o";
