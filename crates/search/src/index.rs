//! In-memory passage index over pre-parsed manual pages
//!
//! The corpus directory holds one JSON document per manual:
//!
//! ```json
//! { "source_file": "cdh2_de.pdf", "pages": [ { "page_number": 4, "text": "..." } ] }
//! ```
//!
//! Every non-empty page becomes one passage. The index keeps term statistics
//! for BM25 and, when an embedder is supplied, one vector per passage. It is
//! immutable once built and shared behind an `Arc`.

use futures::stream::{self, StreamExt, TryStreamExt};
use hydradoc_common::embeddings::Embedder;
use hydradoc_common::errors::{AppError, Result};
use hydradoc_common::metrics;
use hydradoc_common::passage::{PassageKey, RetrievedPassage};
use hydradoc_common::query::tokenize;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Embedding batches in flight while building the index
const EMBEDDING_CONCURRENCY: usize = 4;

/// One pre-parsed manual
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusDocument {
    pub source_file: String,
    pub pages: Vec<CorpusPage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusPage {
    pub page_number: u32,
    pub text: String,
}

/// Per-manual listing entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentSummary {
    pub source_file: String,
    pub passages: usize,
    pub first_page: u32,
    pub last_page: u32,
}

/// Index statistics for readiness reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    pub documents: usize,
    pub passages: usize,
    pub vocabulary: usize,
    pub has_vectors: bool,
    pub embedding_model: Option<String>,
    pub fingerprint: String,
}

/// Lexical terms for BM25: normalizer tokens with edge punctuation trimmed
pub fn lexical_terms(text: &str) -> Vec<String> {
    tokenize(text)
        .into_iter()
        .map(|t| t.trim_matches(|c: char| matches!(c, '.' | ':' | '-' | '/')).to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

#[derive(Debug, Clone)]
pub(crate) struct IndexedPassage {
    pub passage: RetrievedPassage,
    pub term_freqs: HashMap<String, u32>,
    pub length: usize,
}

/// Immutable passage store shared by the lexical and semantic retrievers
#[derive(Debug, Default)]
pub struct PassageIndex {
    passages: Vec<IndexedPassage>,
    doc_freqs: HashMap<String, usize>,
    avg_length: f32,
    vectors: Option<Vec<Vec<f32>>>,
    embedding_model: Option<String>,
    fingerprint: String,
}

impl PassageIndex {
    pub fn empty() -> Self {
        Self::from_documents(Vec::new())
    }

    /// Read every `*.json` document in `dir`, sorted by file name.
    /// A missing directory yields an empty corpus.
    pub async fn load_documents(dir: impl AsRef<Path>) -> Result<Vec<CorpusDocument>> {
        let dir = dir.as_ref();
        if !tokio::fs::try_exists(dir).await.unwrap_or(false) {
            warn!(path = %dir.display(), "Corpus directory not found, starting with an empty index");
            return Ok(Vec::new());
        }

        let corpus_error = |message: String| AppError::Corpus {
            path: dir.display().to_string(),
            message,
        };

        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| corpus_error(e.to_string()))?;

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| corpus_error(e.to_string()))? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            let raw = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| AppError::Corpus {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
            let document: CorpusDocument =
                serde_json::from_str(&raw).map_err(|e| AppError::Corpus {
                    path: path.display().to_string(),
                    message: format!("invalid document: {}", e),
                })?;
            documents.push(document);
        }

        Ok(documents)
    }

    /// Build the lexical part of the index, no vectors
    pub fn from_documents(documents: Vec<CorpusDocument>) -> Self {
        let mut passages = Vec::new();
        let mut seen: HashSet<PassageKey> = HashSet::new();

        for document in documents {
            for page in document.pages {
                if page.text.trim().is_empty() {
                    continue;
                }
                let passage = RetrievedPassage::new(&document.source_file, page.page_number, page.text);
                if !seen.insert(passage.key()) {
                    warn!(passage = %passage.key(), "Duplicate page in corpus, keeping the first");
                    continue;
                }

                let terms = lexical_terms(&passage.content);
                let length = terms.len();
                let mut term_freqs = HashMap::new();
                for term in terms {
                    *term_freqs.entry(term).or_insert(0u32) += 1;
                }

                passages.push(IndexedPassage {
                    passage,
                    term_freqs,
                    length,
                });
            }
        }

        let mut doc_freqs: HashMap<String, usize> = HashMap::new();
        for indexed in &passages {
            for term in indexed.term_freqs.keys() {
                *doc_freqs.entry(term.clone()).or_insert(0) += 1;
            }
        }

        let avg_length = if passages.is_empty() {
            0.0
        } else {
            passages.iter().map(|p| p.length).sum::<usize>() as f32 / passages.len() as f32
        };

        let fingerprint = fingerprint(&passages);
        metrics::record_index_size(passages.len());

        Self {
            passages,
            doc_freqs,
            avg_length,
            vectors: None,
            embedding_model: None,
            fingerprint,
        }
    }

    /// Build the full index. Embedding failures leave the index without
    /// vectors instead of failing the build.
    pub async fn build(
        documents: Vec<CorpusDocument>,
        embedder: Option<Arc<dyn Embedder>>,
        batch_size: usize,
    ) -> Self {
        let mut index = Self::from_documents(documents);

        if let Some(embedder) = embedder {
            match index.embed_passages(embedder.as_ref(), batch_size).await {
                Ok(vectors) => {
                    index.vectors = Some(vectors);
                    index.embedding_model = Some(embedder.model_name().to_string());
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        model = embedder.model_name(),
                        "Passage embedding failed, semantic retrieval disabled"
                    );
                }
            }
        }

        info!(
            passages = index.len(),
            documents = index.document_count(),
            vectors = index.has_vectors(),
            fingerprint = %index.fingerprint,
            "Passage index built"
        );

        index
    }

    /// Load the corpus directory and build the index
    pub async fn from_directory(
        dir: impl AsRef<Path>,
        embedder: Option<Arc<dyn Embedder>>,
        batch_size: usize,
    ) -> Result<Self> {
        let documents = Self::load_documents(dir).await?;
        Ok(Self::build(documents, embedder, batch_size).await)
    }

    async fn embed_passages(&self, embedder: &dyn Embedder, batch_size: usize) -> Result<Vec<Vec<f32>>> {
        let texts: Vec<String> = self.passages.iter().map(|p| p.passage.content.clone()).collect();

        let batches: Vec<Vec<Vec<f32>>> = stream::iter(texts.chunks(batch_size.max(1)))
            .map(|chunk| embedder.embed_batch(chunk))
            .buffered(EMBEDDING_CONCURRENCY)
            .try_collect()
            .await?;

        let vectors: Vec<Vec<f32>> = batches.into_iter().flatten().collect();
        if vectors.len() != self.passages.len() {
            return Err(AppError::EmbeddingError {
                message: format!("Expected {} vectors, got {}", self.passages.len(), vectors.len()),
            });
        }
        if let Some(first) = vectors.first() {
            if first.is_empty() || vectors.iter().any(|v| v.len() != first.len()) {
                return Err(AppError::EmbeddingError {
                    message: "Inconsistent embedding dimensions".to_string(),
                });
            }
        }

        Ok(vectors)
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// True when every passage carries a vector
    pub fn has_vectors(&self) -> bool {
        self.vectors.is_some() && !self.passages.is_empty()
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub(crate) fn entries(&self) -> &[IndexedPassage] {
        &self.passages
    }

    pub(crate) fn vectors(&self) -> Option<&[Vec<f32>]> {
        self.vectors.as_deref()
    }

    pub(crate) fn doc_freq(&self, term: &str) -> usize {
        self.doc_freqs.get(term).copied().unwrap_or(0)
    }

    pub(crate) fn avg_length(&self) -> f32 {
        self.avg_length
    }

    pub fn document_count(&self) -> usize {
        self.passages
            .iter()
            .map(|p| p.passage.metadata.source_file.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Indexed manuals with passage counts, ordered by file name
    pub fn documents(&self) -> Vec<DocumentSummary> {
        let mut by_file: BTreeMap<&str, DocumentSummary> = BTreeMap::new();
        for indexed in &self.passages {
            let meta = &indexed.passage.metadata;
            by_file
                .entry(meta.source_file.as_str())
                .and_modify(|s| {
                    s.passages += 1;
                    s.first_page = s.first_page.min(meta.page_number);
                    s.last_page = s.last_page.max(meta.page_number);
                })
                .or_insert_with(|| DocumentSummary {
                    source_file: meta.source_file.clone(),
                    passages: 1,
                    first_page: meta.page_number,
                    last_page: meta.page_number,
                });
        }
        by_file.into_values().collect()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            documents: self.document_count(),
            passages: self.len(),
            vocabulary: self.doc_freqs.len(),
            has_vectors: self.has_vectors(),
            embedding_model: self.embedding_model.clone(),
            fingerprint: self.fingerprint.clone(),
        }
    }
}

/// Short content hash identifying the indexed corpus
fn fingerprint(passages: &[IndexedPassage]) -> String {
    let mut hasher = Sha256::new();
    for indexed in passages {
        let meta = &indexed.passage.metadata;
        hasher.update(meta.source_file.as_bytes());
        hasher.update(meta.page_number.to_le_bytes());
        hasher.update(indexed.passage.content.as_bytes());
    }
    hex::encode(&hasher.finalize()[..8])
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use hydradoc_common::embeddings::MockEmbedder;

    pub(crate) fn sample_documents() -> Vec<CorpusDocument> {
        vec![
            CorpusDocument {
                source_file: "cdh2_de.pdf".into(),
                pages: vec![
                    CorpusPage {
                        page_number: 1,
                        text: "Hydraulikzylinder Baureihe CDH2 Typenschlüssel und Bestellangabe".into(),
                    },
                    CorpusPage {
                        page_number: 4,
                        text: "Nenndruck 250 bar. Prüfdruck 375 bar. Betriebsdruck max. 250 bar.".into(),
                    },
                    CorpusPage {
                        page_number: 5,
                        text: "   ".into(),
                    },
                    CorpusPage {
                        page_number: 7,
                        text: "Dichtungssatz: O-Ring, Nutring und Abstreifer. Dichtung bei Leckage tauschen.".into(),
                    },
                ],
            },
            CorpusDocument {
                source_file: "backofen_hb.pdf".into(),
                pages: vec![
                    CorpusPage {
                        page_number: 39,
                        text: "Temperatursonde in die Steckbuchse stecken. Die Anzeige zeigt SEnS.".into(),
                    },
                    CorpusPage {
                        page_number: 52,
                        text: "Fehlercode E-12: Türverriegelung defekt. Kundendienst rufen.".into(),
                    },
                ],
            },
        ]
    }

    #[test]
    fn test_one_passage_per_non_empty_page() {
        let index = PassageIndex::from_documents(sample_documents());
        assert_eq!(index.len(), 5);
        assert_eq!(index.document_count(), 2);
        assert!(!index.has_vectors());
    }

    #[test]
    fn test_duplicate_pages_are_skipped() {
        let mut documents = sample_documents();
        documents.push(CorpusDocument {
            source_file: "cdh2_de.pdf".into(),
            pages: vec![CorpusPage {
                page_number: 4,
                text: "other text".into(),
            }],
        });
        let index = PassageIndex::from_documents(documents);
        assert_eq!(index.len(), 5);
    }

    #[test]
    fn test_documents_listing() {
        let index = PassageIndex::from_documents(sample_documents());
        let documents = index.documents();
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].source_file, "backofen_hb.pdf");
        assert_eq!(
            documents[1],
            DocumentSummary {
                source_file: "cdh2_de.pdf".into(),
                passages: 3,
                first_page: 1,
                last_page: 7,
            }
        );
    }

    #[test]
    fn test_lexical_terms_trim_punctuation() {
        assert_eq!(lexical_terms("Prüfdruck 375 bar."), vec!["prüfdruck", "375", "bar"]);
        assert_eq!(lexical_terms("E-12: defekt"), vec!["e-12", "defekt"]);
        assert!(lexical_terms(" -- ... ").is_empty());
    }

    #[test]
    fn test_fingerprint_is_stable_and_content_sensitive() {
        let a = PassageIndex::from_documents(sample_documents());
        let b = PassageIndex::from_documents(sample_documents());
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 16);

        let mut changed = sample_documents();
        changed[0].pages[1].text.push_str(" Berstdruck 500 bar.");
        assert_ne!(PassageIndex::from_documents(changed).fingerprint(), a.fingerprint());
    }

    #[tokio::test]
    async fn test_build_with_embedder_attaches_vectors() {
        let embedder: Arc<dyn Embedder> = Arc::new(MockEmbedder::new(64));
        let index = PassageIndex::build(sample_documents(), Some(embedder), 2).await;
        assert!(index.has_vectors());
        assert_eq!(index.vectors().map(|v| v.len()), Some(5));
        assert_eq!(index.stats().embedding_model.as_deref(), Some("mock-embedding"));
    }

    #[tokio::test]
    async fn test_missing_directory_is_empty_corpus() {
        let index = PassageIndex::from_directory("/nonexistent/hydradoc/corpus", None, 8)
            .await
            .unwrap();
        assert!(index.is_empty());
        assert!(!index.has_vectors());
    }

    #[tokio::test]
    async fn test_load_documents_from_directory() {
        let dir = std::env::temp_dir().join(format!("hydradoc-corpus-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let raw = serde_json::to_string(&sample_documents()[1]).unwrap();
        tokio::fs::write(dir.join("backofen.json"), raw).await.unwrap();
        tokio::fs::write(dir.join("notes.txt"), "ignored").await.unwrap();

        let documents = PassageIndex::load_documents(&dir).await.unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].pages.len(), 2);

        tokio::fs::write(dir.join("broken.json"), "{ not json").await.unwrap();
        let err = PassageIndex::load_documents(&dir).await.unwrap_err();
        assert!(matches!(err, AppError::Corpus { .. }));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
