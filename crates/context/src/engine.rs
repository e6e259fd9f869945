//! Query engine
//!
//! Runs one question through the whole pipeline:
//! normalize -> classify -> expand -> hybrid fuse -> assemble -> answer.
//! The engine holds only read-only shared state; everything a request needs
//! travels in [`QueryRequest`].

use crate::answer::AnswerRequester;
use crate::assembler::ContextAssembler;
use crate::prompts::NO_CONTEXT_ANSWER;
use chrono::{DateTime, Utc};
use hydradoc_common::config::AppConfig;
use hydradoc_common::llm::Generator;
use hydradoc_common::metrics;
use hydradoc_common::query::{Domain, ExpandedQuery, OntologyStore, QueryExpander};
use hydradoc_search::retrieval::HybridRetriever;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Per-request input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub request_id: Uuid,
    pub question: String,

    /// Overrides the configured number of fused passages
    pub top_k: Option<usize>,
}

impl QueryRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            question: question.into(),
            top_k: None,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerStatus {
    Answered,
    NoContext,
    GenerationFailed,
}

impl AnswerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerStatus::Answered => "answered",
            AnswerStatus::NoContext => "no_context",
            AnswerStatus::GenerationFailed => "generation_failed",
        }
    }
}

/// Answer plus what the pipeline saw on the way
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryAnswer {
    pub request_id: Uuid,
    pub answer: String,
    pub sources: Vec<String>,
    pub status: AnswerStatus,
    pub domain: Domain,
    pub expanded_query: String,
    pub confidence: f32,
    pub passages_used: usize,
    pub elapsed_ms: u64,
    pub answered_at: DateTime<Utc>,
}

/// End-to-end question answering over the indexed manuals
pub struct QueryEngine {
    expander: QueryExpander,
    retriever: HybridRetriever,
    assembler: ContextAssembler,
    requester: AnswerRequester,
    default_top_k: usize,
}

impl QueryEngine {
    pub fn new(
        expander: QueryExpander,
        retriever: HybridRetriever,
        assembler: ContextAssembler,
        requester: AnswerRequester,
        default_top_k: usize,
    ) -> Self {
        Self {
            expander,
            retriever,
            assembler,
            requester,
            default_top_k,
        }
    }

    pub fn from_config(
        config: &AppConfig,
        ontology: Arc<OntologyStore>,
        retriever: HybridRetriever,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self::new(
            QueryExpander::new(ontology).with_max_context_terms(config.expansion.max_context_terms),
            retriever,
            ContextAssembler::from_config(&config.context),
            AnswerRequester::new(generator, &config.llm),
            config.retrieval.top_k,
        )
    }

    pub fn expander(&self) -> &QueryExpander {
        &self.expander
    }

    pub fn retriever(&self) -> &HybridRetriever {
        &self.retriever
    }

    pub fn expand(&self, question: &str) -> ExpandedQuery {
        self.expander.expand(question)
    }

    pub async fn query(&self, request: &QueryRequest) -> QueryAnswer {
        let span = info_span!("query", request_id = %request.request_id);
        self.run(request).instrument(span).await
    }

    async fn run(&self, request: &QueryRequest) -> QueryAnswer {
        let start = Instant::now();
        let expanded = self.expander.expand(&request.question);
        let expanded_query = expanded.expanded_query();

        info!(
            question = %request.question,
            domain = %expanded.domain,
            confidence = expanded.confidence,
            concepts = ?expanded.matched_concepts,
            rules = ?expanded.fired_rules,
            "Query expanded"
        );

        let finish = |answer: String, sources: Vec<String>, status: AnswerStatus, passages_used: usize| {
            let elapsed = start.elapsed();
            metrics::record_query(
                elapsed.as_secs_f64(),
                expanded.domain.as_str(),
                status.as_str(),
                expanded.confidence,
            );
            info!(
                status = status.as_str(),
                passages_used = passages_used,
                sources = sources.len(),
                elapsed_ms = elapsed.as_millis() as u64,
                "Query finished"
            );
            QueryAnswer {
                request_id: request.request_id,
                answer,
                sources,
                status,
                domain: expanded.domain,
                expanded_query: expanded_query.clone(),
                confidence: expanded.confidence,
                passages_used,
                elapsed_ms: elapsed.as_millis() as u64,
                answered_at: Utc::now(),
            }
        };

        if expanded.is_empty() {
            warn!(question = %request.question, "Question has no searchable terms");
            return finish(NO_CONTEXT_ANSWER.to_string(), Vec::new(), AnswerStatus::NoContext, 0);
        }

        let top_k = request.top_k.unwrap_or(self.default_top_k);
        let outcome = self.retriever.fuse(&expanded_query, top_k).await;
        if outcome.results.is_empty() {
            warn!(
                question = %request.question,
                domain = %expanded.domain,
                lexical = ?outcome.lexical,
                semantic = ?outcome.semantic,
                "No passages retrieved"
            );
            return finish(NO_CONTEXT_ANSWER.to_string(), Vec::new(), AnswerStatus::NoContext, 0);
        }

        let passages = outcome.passages();
        let context = self.assembler.assemble(&passages);
        let used = context.passages_included;

        // sources cite every fused passage, not only those that fit the budget
        let answer = self.requester.answer(&request.question, &context.text, &passages).await;
        if answer.generated {
            finish(answer.text, answer.sources, AnswerStatus::Answered, used)
        } else {
            warn!(
                question = %request.question,
                domain = %expanded.domain,
                model = self.requester.model_name(),
                "Returning generation failure message"
            );
            finish(answer.text, answer.sources, AnswerStatus::GenerationFailed, used)
        }
    }
}
