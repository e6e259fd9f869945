//! Retrieved passage types shared by the retrievers and the context engine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a passage came from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PassageMetadata {
    /// Manual file name as uploaded
    pub source_file: String,

    /// 1-based page number within the manual
    pub page_number: u32,
}

/// A unit of manual text returned by a retriever
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedPassage {
    /// Page text
    pub content: String,

    /// Source location
    pub metadata: PassageMetadata,

    /// Retriever-specific relevance (BM25 score, cosine similarity or RRF score)
    pub relevance_score: f32,
}

/// Identity of a logical passage across rankers
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PassageKey {
    pub source_file: String,
    pub page_number: u32,
}

impl RetrievedPassage {
    pub fn new(source_file: impl Into<String>, page_number: u32, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: PassageMetadata {
                source_file: source_file.into(),
                page_number,
            },
            relevance_score: 0.0,
        }
    }

    /// Builder-style score setter
    pub fn with_score(mut self, score: f32) -> Self {
        self.relevance_score = score;
        self
    }

    pub fn key(&self) -> PassageKey {
        PassageKey {
            source_file: self.metadata.source_file.clone(),
            page_number: self.metadata.page_number,
        }
    }

    /// Citation label, e.g. `pump_manual.pdf (p. 12)`
    pub fn source_label(&self) -> String {
        format!("{} (p. {})", self.metadata.source_file, self.metadata.page_number)
    }
}

impl fmt::Display for PassageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.source_file, self.page_number)
    }
}
