//! Domain classification by weighted keyword overlap

use super::normalizer::tokenize;
use super::ontology::OntologyStore;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Subject-matter category of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Domain {
    Hydraulic,
    Appliance,
    Hybrid,
    Unknown,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Hydraulic => "hydraulic",
            Domain::Appliance => "appliance",
            Domain::Hybrid => "hybrid",
            Domain::Unknown => "unknown",
        }
    }

    pub fn includes_hydraulic(&self) -> bool {
        matches!(self, Domain::Hydraulic | Domain::Hybrid)
    }

    pub fn includes_appliance(&self) -> bool {
        matches!(self, Domain::Appliance | Domain::Hybrid)
    }

    /// Decision rule over the two domain scores.
    /// Any two positive scores, tied or not, yield `Hybrid`.
    pub fn from_scores(hydraulic: f32, appliance: f32) -> Self {
        if hydraulic > 0.0 && appliance > 0.0 {
            Domain::Hybrid
        } else if hydraulic > appliance {
            Domain::Hydraulic
        } else if appliance > hydraulic {
            Domain::Appliance
        } else {
            Domain::Unknown
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification outcome with the underlying scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub domain: Domain,
    pub hydraulic_score: f32,
    pub appliance_score: f32,
}

/// Scores queries against the shared ontology store
#[derive(Debug, Clone)]
pub struct DomainClassifier {
    store: Arc<OntologyStore>,
}

impl DomainClassifier {
    pub fn new(store: Arc<OntologyStore>) -> Self {
        Self { store }
    }

    pub fn classify(&self, query: &str) -> Domain {
        self.classify_detailed(query).domain
    }

    pub fn classify_detailed(&self, query: &str) -> Classification {
        let tokens = tokenize(query);
        let token_set: HashSet<&str> = tokens.iter().map(String::as_str).collect();
        self.classify_tokens(&token_set)
    }

    /// Classify an already normalized token set
    pub fn classify_tokens(&self, tokens: &HashSet<&str>) -> Classification {
        let hydraulic_score = self.store.hydraulic.score(tokens);
        let appliance_score = self.store.appliance.score(tokens);

        Classification {
            domain: Domain::from_scores(hydraulic_score, appliance_score),
            hydraulic_score,
            appliance_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> DomainClassifier {
        DomainClassifier::new(Arc::new(OntologyStore::builtin().unwrap()))
    }

    #[test]
    fn test_hydraulic_question() {
        let result = classifier().classify_detailed("Welcher Nenndruck für CDH2?");
        assert_eq!(result.domain, Domain::Hydraulic);
        // druck (1.5) + zylinder (1.3)
        assert!((result.hydraulic_score - 2.8).abs() < 1e-5);
        assert_eq!(result.appliance_score, 0.0);
    }

    #[test]
    fn test_error_code_is_appliance_only() {
        assert_eq!(classifier().classify("Fehlercode E-12"), Domain::Appliance);
    }

    #[test]
    fn test_mixed_vocabulary_is_hybrid() {
        assert_eq!(
            classifier().classify("Dichtung an der Backofentür undicht"),
            Domain::Hybrid
        );
    }

    #[test]
    fn test_no_match_is_unknown() {
        assert_eq!(classifier().classify("Hallo"), Domain::Unknown);
        assert_eq!(classifier().classify(""), Domain::Unknown);
    }

    #[test]
    fn test_duplicate_tokens_count_once() {
        let once = classifier().classify_detailed("druck");
        let thrice = classifier().classify_detailed("Druck druck DRUCK");
        assert_eq!(once.hydraulic_score, thrice.hydraulic_score);
    }

    #[test]
    fn test_decision_rule() {
        assert_eq!(Domain::from_scores(1.0, 1.0), Domain::Hybrid);
        assert_eq!(Domain::from_scores(2.0, 0.5), Domain::Hybrid);
        assert_eq!(Domain::from_scores(0.5, 0.0), Domain::Hydraulic);
        assert_eq!(Domain::from_scores(0.0, 0.5), Domain::Appliance);
        assert_eq!(Domain::from_scores(0.0, 0.0), Domain::Unknown);
    }
}
