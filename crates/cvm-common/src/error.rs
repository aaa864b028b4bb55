use thiserror::Error;

/// Errors surfaced by the evaluator and the batch ranker.
///
/// Refinement-provider failures are intentionally NOT here: they are recovered
/// inside the batch ranker (fallback to the heuristic result) and only logged.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("invalid job profile: {0}")]
    InvalidJob(String),
    #[error("invalid candidate profile: {0}")]
    InvalidCandidate(String),
    #[error("invalid matching weights: {0}")]
    InvalidWeights(String),
}
