use std::collections::HashSet;

use crate::normalize::normalize_terms;

/// Fraction of the `reference` list covered by the `candidate` list, after
/// canonicalization, in [0,1].
///
/// Asymmetric: measures how much of the requirement list the candidate
/// covers, not the reverse. An empty reference yields 0.0; a job that states
/// no requirement in a category grants no credit for it.
pub fn overlap_ratio(reference: &[String], candidate: &[String]) -> f64 {
    let reference: HashSet<String> = normalize_terms(reference).into_iter().collect();
    if reference.is_empty() {
        return 0.0;
    }

    let candidate: HashSet<String> = normalize_terms(candidate).into_iter().collect();
    let matched = reference.intersection(&candidate).count();
    matched as f64 / reference.len().max(1) as f64
}
