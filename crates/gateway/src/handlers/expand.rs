//! Expansion preview handler

use axum::{extract::State, Json};
use hydradoc_common::errors::Result;
use hydradoc_common::query::Domain;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::validation_error;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct ExpandBody {
    #[validate(length(min = 1, max = 2000))]
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct ExpandResponse {
    pub normalized: String,
    pub domain: Domain,
    pub hydraulic_score: f32,
    pub appliance_score: f32,
    pub confidence: f32,
    pub expanded_query: String,
    pub added_terms: Vec<String>,
    pub matched_concepts: Vec<String>,
    pub fired_rules: Vec<usize>,
}

/// Show how a question would be classified and expanded, without retrieval
pub async fn expand(
    State(state): State<AppState>,
    Json(body): Json<ExpandBody>,
) -> Result<Json<ExpandResponse>> {
    body.validate().map_err(validation_error)?;

    let expander = state.engine.expander();
    let classification = expander.classifier().classify_detailed(&body.question);
    let expanded = expander.expand(&body.question);

    let added_terms = expanded
        .terms
        .difference(&expanded.original_terms)
        .cloned()
        .collect();

    tracing::debug!(
        question = %body.question,
        domain = %expanded.domain,
        confidence = expanded.confidence,
        "Expansion preview"
    );

    Ok(Json(ExpandResponse {
        expanded_query: expanded.expanded_query(),
        normalized: expanded.normalized,
        domain: expanded.domain,
        hydraulic_score: classification.hydraulic_score,
        appliance_score: classification.appliance_score,
        confidence: expanded.confidence,
        added_terms,
        matched_concepts: expanded.matched_concepts,
        fired_rules: expanded.fired_rules,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::tests::empty_state;

    async fn preview(question: &str) -> ExpandResponse {
        let body = Json(ExpandBody {
            question: question.to_string(),
        });
        let Json(response) = expand(State(empty_state()), body).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_cross_domain_rule_shows_added_terms() {
        let response = preview("Temperaturanzeige zeigt Sensor").await;
        assert!(response.added_terms.contains(&"bakesensor".to_string()));
        assert!(response.added_terms.contains(&"steckbuchse".to_string()));
        assert!(response.fired_rules.contains(&0));
        assert!(response.appliance_score > 0.0);
    }

    #[tokio::test]
    async fn test_unknown_question_is_unchanged() {
        let response = preview("Hallo").await;
        assert_eq!(response.domain, Domain::Unknown);
        assert_eq!(response.expanded_query, "hallo");
        assert!(response.added_terms.is_empty());
        assert_eq!(response.confidence, 0.0);
    }
}
