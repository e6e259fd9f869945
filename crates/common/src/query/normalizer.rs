//! Query normalization and tokenization
//!
//! Lowercases, replaces every character outside the allowed alphabet
//! (letters incl. accented, digits, `_`, whitespace, `-`, `.`, `:`, `/`)
//! with a space, then collapses whitespace.

use std::collections::BTreeSet;

fn is_allowed(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c.is_whitespace() || matches!(c, '-' | '.' | ':' | '/')
}

/// Normalize free text into the ontology's token alphabet. Total and idempotent.
pub fn normalize(text: &str) -> String {
    let mapped: String = text
        .to_lowercase()
        .chars()
        .map(|c| if is_allowed(c) { c } else { ' ' })
        .collect();

    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized whitespace tokens, in query order (duplicates kept)
pub fn tokenize(text: &str) -> Vec<String> {
    normalize(text)
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Normalized token set (duplicates collapsed, sorted)
pub fn token_set(text: &str) -> BTreeSet<String> {
    tokenize(text).into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_and_punctuation() {
        assert_eq!(normalize("Welcher Nenndruck für CDH2?"), "welcher nenndruck für cdh2");
        assert_eq!(normalize("Fehlercode E-12!"), "fehlercode e-12");
    }

    #[test]
    fn test_keeps_allowed_symbols() {
        assert_eq!(normalize("Q = 40 l/min, p_max: 3.5"), "q 40 l/min p_max: 3.5");
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(normalize("  Druck \t\n  Dichtung  "), "druck dichtung");
    }

    #[test]
    fn test_empty_and_symbol_only() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("?!()[]"), "");
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn test_umlauts_survive() {
        assert_eq!(normalize("PRÜFDRUCK Störungscode Öl"), "prüfdruck störungscode öl");
    }

    #[test]
    fn test_idempotence() {
        let samples = [
            "Welcher Nenndruck für CDH2?",
            "Temperaturanzeige (mit Sensor) -- E-2/F-3",
            "  ÄÖÜ ß İstanbul ǅ \u{0301}x ",
            "l/min; bar / psi: 3,5",
            "",
            "emoji 🔧 tool",
        ];
        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn test_token_set_collapses_duplicates() {
        let set = token_set("Druck druck DRUCK bar");
        assert_eq!(set.len(), 2);
        assert!(set.contains("druck"));
        assert!(set.contains("bar"));
    }
}
