//! Health check handlers

use axum::{extract::State, http::StatusCode, Json};
use hydradoc_search::IndexStats;
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub index: IndexStats,
    pub retrievers: RetrieverChecks,
}

#[derive(Serialize)]
pub struct RetrieverChecks {
    pub lexical: CheckResult,
    pub semantic: CheckResult,
}

#[derive(Serialize)]
pub struct CheckResult {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckResult {
    fn from_ready(ready: bool, reason: &str) -> Self {
        if ready {
            Self {
                status: "up".to_string(),
                error: None,
            }
        } else {
            Self {
                status: "down".to_string(),
                error: Some(reason.to_string()),
            }
        }
    }
}

/// Liveness probe - always returns healthy if server is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: hydradoc_common::VERSION.to_string(),
    })
}

/// Readiness probe - ready while at least one retriever can answer
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let retriever = state.engine.retriever();
    let lexical_ready = retriever.lexical_ready();
    let semantic_ready = retriever.semantic_ready();

    let checks = RetrieverChecks {
        lexical: CheckResult::from_ready(lexical_ready, "passage index is empty"),
        semantic: CheckResult::from_ready(semantic_ready, "passage index has no embeddings"),
    };

    let any_ready = lexical_ready || semantic_ready;
    let status = if any_ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (
        status,
        Json(ReadyResponse {
            status: if any_ready { "ready" } else { "not_ready" }.to_string(),
            index: state.index.stats(),
            retrievers: checks,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::tests::{empty_state, test_state};

    #[tokio::test]
    async fn test_ready_with_corpus() {
        let (status, Json(body)) = ready(State(test_state().await)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ready");
        assert_eq!(body.index.passages, 3);
        assert_eq!(body.retrievers.semantic.status, "up");
    }

    #[tokio::test]
    async fn test_not_ready_without_corpus() {
        let (status, Json(body)) = ready(State(empty_state())).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.retrievers.lexical.status, "down");
        assert!(body.retrievers.lexical.error.is_some());
    }
}
