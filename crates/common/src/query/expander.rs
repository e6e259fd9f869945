//! Ontology-driven query expansion
//!
//! Seeds the term set with the normalized query tokens, unions in synonyms and
//! a bounded prefix of context terms for every triggered concept of the
//! classified domain(s), then applies the cross-domain rules in order against
//! the growing term set.

use super::classifier::{Domain, DomainClassifier};
use super::normalizer::{normalize, tokenize};
use super::ontology::{Ontology, OntologyStore, RuleCondition};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Default number of context terms pulled in per triggered concept
pub const DEFAULT_MAX_CONTEXT_TERMS: usize = 3;

/// Confidence multiplier for rules fired by an "any" condition
const ANY_RULE_FACTOR: f32 = 0.5;

/// Result of expanding one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpandedQuery {
    /// Normalized input
    pub normalized: String,

    /// Normalized token set of the input
    pub original_terms: BTreeSet<String>,

    /// Full expansion term set, sorted
    pub terms: BTreeSet<String>,

    pub domain: Domain,

    /// Sum of triggered concept weights and rule boosts
    pub confidence: f32,

    /// Triggered concepts as `<domain>/<concept>`
    pub matched_concepts: Vec<String>,

    /// Indices of fired cross-domain rules
    pub fired_rules: Vec<usize>,
}

impl ExpandedQuery {
    /// Space-joined sorted terms, the string handed to the retrievers
    pub fn expanded_query(&self) -> String {
        self.terms.iter().map(String::as_str).collect::<Vec<_>>().join(" ")
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Expands queries against the shared ontology store
#[derive(Debug, Clone)]
pub struct QueryExpander {
    store: Arc<OntologyStore>,
    classifier: DomainClassifier,
    max_context_terms: usize,
}

impl QueryExpander {
    pub fn new(store: Arc<OntologyStore>) -> Self {
        Self {
            classifier: DomainClassifier::new(store.clone()),
            store,
            max_context_terms: DEFAULT_MAX_CONTEXT_TERMS,
        }
    }

    pub fn with_max_context_terms(mut self, max_context_terms: usize) -> Self {
        self.max_context_terms = max_context_terms;
        self
    }

    pub fn classifier(&self) -> &DomainClassifier {
        &self.classifier
    }

    pub fn expand(&self, query: &str) -> ExpandedQuery {
        let normalized = normalize(query);
        let tokens = tokenize(&normalized);
        let token_set: HashSet<&str> = tokens.iter().map(String::as_str).collect();
        let original_terms: BTreeSet<String> = tokens.iter().cloned().collect();

        let classification = self.classifier.classify_tokens(&token_set);
        let domain = classification.domain;

        let mut terms = original_terms.clone();
        let mut confidence = 0.0_f32;
        let mut matched_concepts = Vec::new();

        if domain.includes_hydraulic() {
            confidence += self.apply_ontology(
                Domain::Hydraulic,
                &self.store.hydraulic,
                &token_set,
                &mut terms,
                &mut matched_concepts,
            );
        }
        if domain.includes_appliance() {
            confidence += self.apply_ontology(
                Domain::Appliance,
                &self.store.appliance,
                &token_set,
                &mut terms,
                &mut matched_concepts,
            );
        }

        let mut fired_rules = Vec::new();
        for (index, rule) in self.store.rules.iter().enumerate() {
            let boost = match &rule.condition {
                RuleCondition::All(required) if required.iter().all(|t| terms.contains(t)) => {
                    rule.boost
                }
                RuleCondition::Any(candidates) if candidates.iter().any(|t| terms.contains(t)) => {
                    rule.boost * ANY_RULE_FACTOR
                }
                _ => continue,
            };

            terms.extend(rule.add_terms.iter().cloned());
            confidence += boost;
            fired_rules.push(index);
        }

        debug!(
            query = %normalized,
            domain = %domain,
            confidence,
            matched = ?matched_concepts,
            rules = ?fired_rules,
            "Query expanded"
        );

        ExpandedQuery {
            normalized,
            original_terms,
            terms,
            domain,
            confidence,
            matched_concepts,
            fired_rules,
        }
    }

    fn apply_ontology(
        &self,
        domain: Domain,
        ontology: &Ontology,
        tokens: &HashSet<&str>,
        terms: &mut BTreeSet<String>,
        matched: &mut Vec<String>,
    ) -> f32 {
        let mut confidence = 0.0;
        for (name, pattern) in ontology.matching(tokens) {
            terms.extend(pattern.synonyms.iter().cloned());
            terms.extend(pattern.context_terms.iter().take(self.max_context_terms).cloned());
            confidence += pattern.weight;
            matched.push(format!("{}/{}", domain, name));
        }
        confidence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expander() -> QueryExpander {
        QueryExpander::new(Arc::new(OntologyStore::builtin().unwrap()))
    }

    #[test]
    fn test_pressure_question_pulls_in_synonyms() {
        let expanded = expander().expand("Welcher Nenndruck für CDH2?");
        assert_eq!(expanded.domain, Domain::Hydraulic);
        for term in ["betriebsdruck", "prüfdruck", "berstdruck", "bar", "mpa", "psi"] {
            assert!(expanded.terms.contains(term), "missing {term}");
        }
        // only the first three context terms
        assert!(!expanded.terms.contains("druckstufe"));
        assert!(expanded.matched_concepts.contains(&"hydraulic/druck".to_string()));
        assert!(expanded.matched_concepts.contains(&"hydraulic/zylinder".to_string()));
    }

    #[test]
    fn test_display_and_sensor_rule_fires() {
        let expanded = expander().expand("Temperaturanzeige zeigt falschen Wert, Sensor defekt?");
        assert_eq!(expanded.domain, Domain::Appliance);
        assert!(expanded.terms.contains("bakesensor"));
        assert!(expanded.terms.contains("steckbuchse"));
        assert!(expanded.fired_rules.contains(&0));
        // 1.4 + 1.3 concept weights, 1.0 rule boost
        assert!((expanded.confidence - 3.7).abs() < 1e-5);
    }

    #[test]
    fn test_error_code_any_rule_half_boost() {
        let expanded = expander().expand("Fehlercode E-12");
        assert_eq!(expanded.domain, Domain::Appliance);
        assert_eq!(expanded.fired_rules, vec![1]);
        assert!(expanded.terms.contains("codeanzeige"));
        // fehlercode 1.6 + 0.8 * 0.5
        assert!((expanded.confidence - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_unknown_query_returns_tokens_unchanged() {
        let expanded = expander().expand("Hallo");
        assert_eq!(expanded.domain, Domain::Unknown);
        assert_eq!(expanded.expanded_query(), "hallo");
        assert_eq!(expanded.confidence, 0.0);
        assert!(expanded.matched_concepts.is_empty());
        assert!(expanded.fired_rules.is_empty());
    }

    #[test]
    fn test_rules_chain_off_added_synonyms() {
        // "betriebsdruck" and "o-ring" are keywords; the rule needs the concept
        // names, which only arrive through the synonym sets.
        let expanded = expander().expand("Betriebsdruck O-Ring");
        assert!(!expanded.original_terms.contains("druck"));
        assert!(expanded.terms.contains("leckage"));
        assert!(expanded.terms.contains("druckverlust"));
    }

    #[test]
    fn test_expansion_is_deterministic() {
        let e = expander();
        let queries = [
            "Welcher Nenndruck für CDH2?",
            "Dichtung an der Backofentür undicht",
            "Pumpe Volumenstrom Heizelement Display",
            "",
        ];
        for q in queries {
            let a = e.expand(q);
            let b = e.expand(q);
            assert_eq!(a.expanded_query(), b.expanded_query());
            assert_eq!(a.domain, b.domain);
            assert_eq!(a.confidence.to_bits(), b.confidence.to_bits());
        }
    }

    #[test]
    fn test_expansion_is_monotone() {
        let e = expander();
        let queries = [
            "Welcher Nenndruck für CDH2?",
            "Temperaturanzeige Sensor",
            "Fehlercode E-12",
            "Hallo Welt",
            "p_max 3.5 l/min",
        ];
        for q in queries {
            let expanded = e.expand(q).expanded_query();
            let expanded_tokens: HashSet<&str> = expanded.split(' ').collect();
            for token in tokenize(q) {
                assert!(expanded_tokens.contains(token.as_str()), "{token} dropped from {q}");
            }
        }
    }

    #[test]
    fn test_expanded_string_is_sorted() {
        let expanded = expander().expand("Zylinder Kolben").expanded_query();
        assert!(expanded.contains("hydraulikzylinder"));
        let terms: Vec<&str> = expanded.split(' ').collect();
        let mut sorted = terms.clone();
        sorted.sort();
        assert_eq!(terms, sorted);
    }

    #[test]
    fn test_context_term_bound_is_configurable() {
        let store = Arc::new(OntologyStore::builtin().unwrap());
        let expanded = QueryExpander::new(store).with_max_context_terms(0).expand("Druck");
        assert!(!expanded.terms.contains("bar"));
        assert!(expanded.terms.contains("betriebsdruck"));
    }
}
