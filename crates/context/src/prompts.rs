//! Prompt text and fixed user-facing messages

/// Instructions placed before the context block
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a technical documentation specialist for industrial hydraulics and for \
household appliances such as ovens, washing machines and dishwashers.

Reply in the language of the user's question.
Answer only from the manual excerpts in the context below.

Display and sensor questions:
- Look for exact display strings and codes (for example \"SEnS\", \"E-2\", \"F-xx\") \
and for terms such as temperature probe, bake sensor and probe socket.
- Reconstruct truncated display strings as precisely as the context allows.

Pressure and hydraulic questions:
- Keep operating pressure, test pressure and burst pressure strictly apart.
- Read ordering-code, type-code, seal and flow-rate tables carefully and never \
separate a code letter from its meaning.

Cite every fact as \"Source: <file> p. <page>\".
If no passage answers the question directly, use closely related passages and say so. \
State that the manuals do not contain the information only when nothing relevant exists.";

/// Answer returned when retrieval produced no usable context
pub const NO_CONTEXT_ANSWER: &str =
    "No relevant passages were found in the indexed manuals for this question.";

/// Answer returned when generation failed after all attempts
pub const GENERATION_FAILED_ANSWER: &str =
    "The answer could not be generated right now. Please try again later.";

/// System instructions, context block and the literal question in one prompt
pub fn build_prompt(system_prompt: &str, context: &str, question: &str) -> String {
    format!(
        "{}\n\nContext from the manuals:\n{}\n\nQuestion: {}\n\nAnswer:",
        system_prompt.trim_end(),
        context,
        question
    )
}
