//! Ontology store: weighted concept patterns per domain plus cross-domain rules
//!
//! The store is built once at startup, validated, and then shared read-only
//! (`Arc<OntologyStore>`) by every request.

use super::builtin;
use super::normalizer::normalize;
use crate::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// One domain concept, e.g. "druck"
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptPattern {
    /// Single normalized tokens that trigger the concept
    pub keywords: Vec<String>,

    /// Terms unioned into the expansion when triggered
    #[serde(default)]
    pub synonyms: Vec<String>,

    /// Related terms, only a bounded prefix is used
    #[serde(default)]
    pub context_terms: Vec<String>,

    /// Relative importance for scoring and confidence
    pub weight: f32,
}

impl ConceptPattern {
    pub fn new(keywords: &[&str], synonyms: &[&str], context_terms: &[&str], weight: f32) -> Self {
        let owned = |terms: &[&str]| terms.iter().map(|t| t.to_string()).collect();
        Self {
            keywords: owned(keywords),
            synonyms: owned(synonyms),
            context_terms: owned(context_terms),
            weight,
        }
    }

    /// True when any keyword is in the token set
    pub fn matches(&self, tokens: &HashSet<&str>) -> bool {
        self.keywords.iter().any(|k| tokens.contains(k.as_str()))
    }
}

/// Immutable concept table for one domain, keyed by concept name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ontology {
    concepts: BTreeMap<String, ConceptPattern>,
}

impl Ontology {
    pub fn new(concepts: BTreeMap<String, ConceptPattern>) -> Self {
        Self { concepts }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ConceptPattern)> {
        self.concepts.iter()
    }

    pub fn get(&self, name: &str) -> Option<&ConceptPattern> {
        self.concepts.get(name)
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    /// Concepts whose keywords intersect the token set
    pub fn matching<'a>(
        &'a self,
        tokens: &'a HashSet<&'a str>,
    ) -> impl Iterator<Item = (&'a String, &'a ConceptPattern)> + 'a {
        self.concepts.iter().filter(move |(_, p)| p.matches(tokens))
    }

    /// Sum of weights of all matching concepts
    pub fn score(&self, tokens: &HashSet<&str>) -> f32 {
        self.matching(tokens).map(|(_, p)| p.weight).sum()
    }
}

/// Condition of a cross-domain rule, evaluated against the current expansion terms
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RuleCondition {
    /// Every term must be present; fires with the full boost
    All(Vec<String>),
    /// At least one term must be present; fires with half the boost
    Any(Vec<String>),
}

impl RuleCondition {
    pub fn terms(&self) -> &[String] {
        match self {
            RuleCondition::All(terms) | RuleCondition::Any(terms) => terms,
        }
    }
}

/// Inference rule adding terms when its condition holds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossDomainRule {
    pub condition: RuleCondition,
    pub add_terms: Vec<String>,
    pub boost: f32,
}

impl CrossDomainRule {
    pub fn all(terms: &[&str], add: &[&str], boost: f32) -> Self {
        Self {
            condition: RuleCondition::All(terms.iter().map(|t| t.to_string()).collect()),
            add_terms: add.iter().map(|t| t.to_string()).collect(),
            boost,
        }
    }

    pub fn any(terms: &[&str], add: &[&str], boost: f32) -> Self {
        Self {
            condition: RuleCondition::Any(terms.iter().map(|t| t.to_string()).collect()),
            add_terms: add.iter().map(|t| t.to_string()).collect(),
            boost,
        }
    }
}

/// Both domain ontologies plus the rule list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OntologyStore {
    pub hydraulic: Ontology,
    pub appliance: Ontology,
    #[serde(default)]
    pub rules: Vec<CrossDomainRule>,
}

impl OntologyStore {
    /// Validate and wrap the given tables
    pub fn new(hydraulic: Ontology, appliance: Ontology, rules: Vec<CrossDomainRule>) -> Result<Self> {
        let store = Self {
            hydraulic,
            appliance,
            rules,
        };
        store.validate()?;
        Ok(store)
    }

    /// The curated hydraulic + household-appliance tables
    pub fn builtin() -> Result<Self> {
        Self::new(builtin::hydraulic(), builtin::appliance(), builtin::rules())
    }

    /// Load tables from a JSON file with the same record layout
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| AppError::Configuration {
            message: format!("Failed to read ontology {}: {}", path.display(), e),
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let store: OntologyStore = serde_json::from_str(raw)?;
        store.validate()?;
        Ok(store)
    }

    /// Every term the ontology knows: concept names, keywords, synonyms, context terms
    pub fn vocabulary(&self) -> HashSet<&str> {
        let mut vocab = HashSet::new();
        for ontology in [&self.hydraulic, &self.appliance] {
            for (name, pattern) in ontology.iter() {
                vocab.insert(name.as_str());
                vocab.extend(pattern.keywords.iter().map(String::as_str));
                vocab.extend(pattern.synonyms.iter().map(String::as_str));
                vocab.extend(pattern.context_terms.iter().map(String::as_str));
            }
        }
        vocab
    }

    /// Load-time checks; any failure is fatal at startup
    pub fn validate(&self) -> Result<()> {
        for (domain, ontology) in [("hydraulic", &self.hydraulic), ("appliance", &self.appliance)] {
            for (name, pattern) in ontology.iter() {
                let invalid = |message: String| AppError::InvalidOntology {
                    message: format!("{domain}/{name}: {message}"),
                };

                if pattern.keywords.is_empty() {
                    return Err(invalid("keywords must not be empty".into()));
                }
                if !(pattern.weight.is_finite() && pattern.weight > 0.0) {
                    return Err(invalid(format!("weight {} must be positive", pattern.weight)));
                }
                for keyword in &pattern.keywords {
                    if keyword.is_empty() || keyword.contains(' ') || normalize(keyword) != *keyword {
                        return Err(invalid(format!("keyword '{keyword}' is not a normalized token")));
                    }
                }
                for term in pattern.synonyms.iter().chain(&pattern.context_terms) {
                    if term.is_empty() || normalize(term) != *term {
                        return Err(invalid(format!("term '{term}' is not normalized")));
                    }
                }
            }
        }

        let vocab = self.vocabulary();
        for (index, rule) in self.rules.iter().enumerate() {
            let terms = rule.condition.terms();
            if terms.is_empty() {
                return Err(AppError::InvalidOntology {
                    message: format!("rule #{index}: condition must list at least one term"),
                });
            }
            if !(rule.boost.is_finite() && rule.boost > 0.0) {
                return Err(AppError::InvalidOntology {
                    message: format!("rule #{index}: boost {} must be positive", rule.boost),
                });
            }
            if let Some(unknown) = terms.iter().find(|t| !vocab.contains(t.as_str())) {
                return Err(AppError::MalformedOntologyRule {
                    rule: index,
                    term: unknown.clone(),
                });
            }
            if let Some(bad) = rule.add_terms.iter().find(|t| t.is_empty() || normalize(t) != **t) {
                return Err(AppError::InvalidOntology {
                    message: format!("rule #{index}: added term '{bad}' is not normalized"),
                });
            }
        }

        Ok(())
    }
}
