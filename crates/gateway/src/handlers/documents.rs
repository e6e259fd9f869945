//! Indexed document listing

use axum::{extract::State, Json};
use hydradoc_search::DocumentSummary;
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct DocumentsResponse {
    pub total: usize,
    pub passages: usize,
    pub fingerprint: String,
    pub documents: Vec<DocumentSummary>,
}

/// List indexed manuals with their page ranges
pub async fn list_documents(State(state): State<AppState>) -> Json<DocumentsResponse> {
    let documents = state.index.documents();
    Json(DocumentsResponse {
        total: documents.len(),
        passages: state.index.len(),
        fingerprint: state.index.fingerprint().to_string(),
        documents,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::tests::test_state;

    #[tokio::test]
    async fn test_lists_documents_in_name_order() {
        let Json(response) = list_documents(State(test_state().await)).await;
        assert_eq!(response.total, 2);
        assert_eq!(response.passages, 3);
        assert_eq!(response.documents[0].source_file, "backofen_hb.pdf");
        assert_eq!(response.documents[0].first_page, 39);
        assert_eq!(response.documents[0].last_page, 52);
    }
}
