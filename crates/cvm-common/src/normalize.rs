use std::sync::LazyLock;

use regex::Regex;

// Keeps word chars, whitespace, hyphen and plus so tokens like "c++" and
// "node-js" survive canonicalization.
static RE_STRIP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s\-+]").unwrap());

static RE_FIRST_INT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// Canonicalize a free-text term list for set comparison.
///
/// Lower-cases, strips punctuation (see `RE_STRIP`), trims, drops empties and
/// de-duplicates while preserving first-seen order. Pure and deterministic.
pub fn normalize_terms(terms: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(terms.len());
    for term in terms {
        let lowered = term.to_lowercase();
        let cleaned = RE_STRIP.replace_all(&lowered, "");
        let cleaned = cleaned.trim();
        if cleaned.is_empty() {
            continue;
        }
        if !out.iter().any(|existing| existing == cleaned) {
            out.push(cleaned.to_string());
        }
    }
    out
}

/// First integer embedded in free text ("5 años" → 5). Used to read a year
/// count out of a job's experience requirement.
pub fn first_integer(text: &str) -> Option<u32> {
    RE_FIRST_INT.find(text).and_then(|m| m.as_str().parse().ok())
}
