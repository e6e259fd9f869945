//! Query understanding: normalization, domain ontologies, classification and expansion

mod builtin;
pub mod classifier;
pub mod expander;
pub mod normalizer;
pub mod ontology;

pub use classifier::{Classification, Domain, DomainClassifier};
pub use expander::{ExpandedQuery, QueryExpander, DEFAULT_MAX_CONTEXT_TERMS};
pub use normalizer::{normalize, token_set, tokenize};
pub use ontology::{ConceptPattern, CrossDomainRule, Ontology, OntologyStore, RuleCondition};
