//! Shared application state

use hydradoc_common::config::AppConfig;
use hydradoc_context::QueryEngine;
use hydradoc_search::PassageIndex;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub engine: Arc<QueryEngine>,
    pub index: Arc<PassageIndex>,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use hydradoc_common::embeddings::{Embedder, MockEmbedder};
    use hydradoc_common::llm::MockGenerator;
    use hydradoc_common::query::OntologyStore;
    use hydradoc_search::{BM25Retriever, CorpusDocument, CorpusPage, HybridRetriever, VectorRetriever};

    fn corpus() -> Vec<CorpusDocument> {
        vec![
            CorpusDocument {
                source_file: "cdh2_de.pdf".into(),
                pages: vec![CorpusPage {
                    page_number: 4,
                    text: "Nenndruck 250 bar. Prüfdruck 375 bar.".into(),
                }],
            },
            CorpusDocument {
                source_file: "backofen_hb.pdf".into(),
                pages: vec![
                    CorpusPage {
                        page_number: 39,
                        text: "Temperatursonde in die Steckbuchse stecken. Anzeige SEnS.".into(),
                    },
                    CorpusPage {
                        page_number: 52,
                        text: "Fehlercode E-12: Türverriegelung defekt.".into(),
                    },
                ],
            },
        ]
    }

    /// State over a small in-memory corpus with mock providers
    pub(crate) async fn test_state() -> AppState {
        let config = Arc::new(AppConfig::default());
        let embedder: Arc<dyn Embedder> = Arc::new(MockEmbedder::new(128));
        let index = Arc::new(PassageIndex::build(corpus(), Some(embedder.clone()), 16).await);
        let retriever = HybridRetriever::from_config(
            Arc::new(BM25Retriever::new(index.clone())),
            Arc::new(VectorRetriever::new(index.clone(), embedder)),
            &config.retrieval,
        );
        let engine = QueryEngine::from_config(
            &config,
            Arc::new(OntologyStore::builtin().unwrap()),
            retriever,
            Arc::new(MockGenerator),
        );

        AppState {
            config,
            engine: Arc::new(engine),
            index,
        }
    }

    /// State with nothing indexed
    pub(crate) fn empty_state() -> AppState {
        let config = Arc::new(AppConfig::default());
        let index = Arc::new(PassageIndex::empty());
        let retriever = HybridRetriever::new(
            Arc::new(BM25Retriever::new(index.clone())),
            Arc::new(VectorRetriever::new(index.clone(), Arc::new(MockEmbedder::new(16)))),
        );
        let engine = QueryEngine::from_config(
            &config,
            Arc::new(OntologyStore::builtin().unwrap()),
            retriever,
            Arc::new(MockGenerator),
        );

        AppState {
            config,
            engine: Arc::new(engine),
            index,
        }
    }
}
