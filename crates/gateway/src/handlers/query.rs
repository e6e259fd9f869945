//! Question answering handler

use axum::{extract::State, http::HeaderMap, Json};
use hydradoc_common::errors::Result;
use hydradoc_context::{QueryAnswer, QueryRequest};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::validation_error;
use crate::AppState;

/// Query request body
#[derive(Debug, Deserialize, Validate)]
pub struct QueryBody {
    #[validate(length(min = 1, max = 2000))]
    pub question: String,

    /// Fused passages to use, defaults to the configured value
    #[validate(range(min = 1, max = 50))]
    pub top_k: Option<usize>,
}

/// Id set by the request-id layer, a fresh one otherwise
fn request_id(headers: &HeaderMap) -> Uuid {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())
        .unwrap_or_else(Uuid::new_v4)
}

/// Answer a question from the indexed manuals
pub async fn query(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<QueryBody>,
) -> Result<Json<QueryAnswer>> {
    body.validate().map_err(validation_error)?;

    let mut request = QueryRequest::new(body.question).with_request_id(request_id(&headers));
    request.top_k = body.top_k;

    let answer = state.engine.query(&request).await;
    Ok(Json(answer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::tests::{empty_state, test_state};
    use axum::http::HeaderValue;
    use hydradoc_common::errors::AppError;
    use hydradoc_common::query::Domain;
    use hydradoc_context::AnswerStatus;

    fn body(question: &str, top_k: Option<usize>) -> Json<QueryBody> {
        Json(QueryBody {
            question: question.to_string(),
            top_k,
        })
    }

    #[tokio::test]
    async fn test_query_answers_with_sources() {
        let state = test_state().await;
        let Json(answer) = query(State(state), HeaderMap::new(), body("Fehlercode E-12", Some(2)))
            .await
            .unwrap();

        assert_eq!(answer.status, AnswerStatus::Answered);
        assert_eq!(answer.domain, Domain::Appliance);
        assert!(answer.answer.starts_with("[Mock response"));
        assert!(!answer.sources.is_empty());
        assert!(answer.sources.len() <= 2);
    }

    #[tokio::test]
    async fn test_request_id_header_is_used() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", HeaderValue::from_str(&id.to_string()).unwrap());

        let Json(answer) = query(State(empty_state()), headers, body("Nenndruck", None))
            .await
            .unwrap();

        assert_eq!(answer.request_id, id);
        assert_eq!(answer.status, AnswerStatus::NoContext);
    }

    #[tokio::test]
    async fn test_validation() {
        for (question, top_k) in [("", None), ("Druck", Some(0)), ("Druck", Some(51))] {
            let result = query(State(empty_state()), HeaderMap::new(), body(question, top_k)).await;
            assert!(matches!(result, Err(AppError::Validation { .. })));
        }

        let long = "a".repeat(2001);
        let result = query(State(empty_state()), HeaderMap::new(), body(&long, None)).await;
        match result {
            Err(AppError::Validation { field, .. }) => assert_eq!(field.as_deref(), Some("question")),
            other => panic!("expected validation error, got {:?}", other.map(|_| ())),
        }
    }
}
