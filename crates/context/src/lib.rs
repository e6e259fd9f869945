//! HydraDoc Context Engine
//!
//! Turns retrieved manual passages into an answer:
//! - Context assembly under a character budget
//! - Prompt construction and answer generation with one bounded retry
//! - Source list derivation
//! - The query engine tying expansion, retrieval and answering together

pub mod answer;
pub mod assembler;
pub mod engine;
pub mod prompts;

pub use answer::{collect_sources, Answer, AnswerRequester};
pub use assembler::{AssembledContext, ContextAssembler};
pub use engine::{AnswerStatus, QueryAnswer, QueryEngine, QueryRequest};
