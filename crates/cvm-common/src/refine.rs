//! Boundary to the external AI refinement provider.
//!
//! The provider adjusts a heuristic result and adds a natural-language
//! justification. Failures are first-class (`Err`) here; the batch ranker is
//! what converts them into "keep the heuristic result and log a warning",
//! since a provider outage must never fail a batch.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::matching::MatchResult;
use crate::{CandidateProfile, JobProfile};

#[derive(Debug, Error)]
pub enum RefineError {
    #[error("provider transport error: {0}")]
    Transport(String),
    #[error("provider returned status {status}: {message}")]
    Provider { status: u16, message: String },
    #[error("provider reply is not valid JSON: {0}")]
    MalformedReply(String),
    #[error("provider reply has no numeric match_score")]
    MissingScore,
    #[error("provider returned empty content")]
    EmptyContent,
    #[error("refinement timed out")]
    Timeout,
}

/// What a successful refinement call returns. Absent fields fall back to the
/// heuristic values on merge; `match_score` is mandatory, a reply without a
/// numeric score is a failed refinement, not a partial one.
#[derive(Debug, Clone, Deserialize)]
pub struct RefinedEvaluation {
    pub match_score: f64,
    #[serde(default)]
    pub strengths: Option<Vec<String>>,
    #[serde(default)]
    pub gaps: Option<Vec<String>>,
    #[serde(default)]
    pub justification: Option<String>,
    /// The provider's raw JSON reply, kept alongside for debugging.
    #[serde(skip)]
    pub raw: Option<serde_json::Value>,
}

#[async_trait]
pub trait Refiner: Send + Sync {
    async fn refine(
        &self,
        job: &JobProfile,
        candidate: &CandidateProfile,
        base: &MatchResult,
    ) -> Result<RefinedEvaluation, RefineError>;
}

impl MatchResult {
    /// Merge a provider reply into the heuristic result.
    ///
    /// The score is rounded to the nearest integer and clamped into 0..=100;
    /// strengths/gaps/justification replace the heuristic ones when returned.
    /// `base_components` stay untouched so the heuristic pass remains
    /// auditable under any refined score.
    pub fn apply_refinement(mut self, refined: RefinedEvaluation) -> MatchResult {
        let clamped = refined.match_score.round().clamp(0.0, 100.0);
        if (clamped - refined.match_score.round()).abs() > f64::EPSILON {
            tracing::warn!(
                provider_score = refined.match_score,
                "refined score outside 0..=100, clamping"
            );
        }
        self.match_score = clamped as u8;

        if let Some(strengths) = refined.strengths {
            self.strengths = strengths;
        }
        if let Some(gaps) = refined.gaps {
            self.gaps = gaps;
        }
        self.justification = refined.justification;
        self.raw_refined = refined.raw;
        self
    }
}
