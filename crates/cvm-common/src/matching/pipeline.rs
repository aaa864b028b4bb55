use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use super::scoring::{HeuristicEvaluator, MatchResult};
use super::weights::Weights;
use crate::refine::Refiner;
use crate::{CandidateProfile, JobProfile, MatchError};

#[derive(Debug, Clone)]
pub struct MatchEngineConfig {
    pub weights: Weights,
    /// Upper bound on concurrent refinement calls; the provider enforces its
    /// own rate limits, so per-candidate work is throttled here and nowhere
    /// else.
    pub refine_concurrency: usize,
    /// Per-call deadline; a timed-out refinement degrades to the heuristic
    /// result like any other provider failure.
    pub refine_timeout: Duration,
}

impl Default for MatchEngineConfig {
    fn default() -> Self {
        Self {
            weights: Weights::default(),
            refine_concurrency: 4,
            refine_timeout: Duration::from_secs(30),
        }
    }
}

/// Ranks candidates against one job: heuristic pass per candidate, optional
/// AI refinement, stable descending sort, 1-based ranks, optional top-K cut.
pub struct MatchEngine {
    evaluator: HeuristicEvaluator,
    refiner: Option<Arc<dyn Refiner>>,
    config: MatchEngineConfig,
}

impl MatchEngine {
    pub fn new(config: MatchEngineConfig) -> Result<Self, MatchError> {
        let evaluator = HeuristicEvaluator::with_weights(config.weights)?;
        Ok(Self {
            evaluator,
            refiner: None,
            config,
        })
    }

    pub fn with_refiner(mut self, refiner: Arc<dyn Refiner>) -> Self {
        self.refiner = Some(refiner);
        self
    }

    pub fn heuristic_only() -> Self {
        Self {
            evaluator: HeuristicEvaluator::default(),
            refiner: None,
            config: MatchEngineConfig::default(),
        }
    }

    /// Evaluate one candidate, refining when a provider is configured.
    /// Refinement failures are logged and degrade to the heuristic result.
    pub async fn match_candidate(
        &self,
        job: &JobProfile,
        candidate: Arc<CandidateProfile>,
    ) -> Result<MatchResult, MatchError> {
        let base = self.evaluator.evaluate(job, candidate)?;
        let Some(refiner) = &self.refiner else {
            return Ok(base);
        };
        Ok(refine_with_fallback(refiner, self.config.refine_timeout, job, base).await)
    }

    /// Evaluate every candidate independently, then sort and rank.
    ///
    /// Invalid candidates are filtered out with a warning; one bad profile
    /// never aborts the batch, and every valid candidate gets a result. Ties
    /// keep their input order (stable sort); ranks are `1..=N`.
    pub async fn match_batch(
        &self,
        job: &JobProfile,
        candidates: &[CandidateProfile],
        top_k: Option<usize>,
    ) -> Result<Vec<MatchResult>, MatchError> {
        job.validate()?;

        let mut results: Vec<MatchResult> = Vec::with_capacity(candidates.len());
        for (index, candidate) in candidates.iter().enumerate() {
            match self.evaluator.evaluate(job, Arc::new(candidate.clone())) {
                Ok(result) => results.push(result),
                Err(err) => {
                    warn!(
                        index,
                        candidate = candidate.display_name(),
                        error = %err,
                        "skipping candidate that failed validation"
                    );
                }
            }
        }

        if let Some(refiner) = &self.refiner {
            results = self.refine_all(refiner, job, results).await;
        }

        // Stable sort: equal scores retain input order.
        results.sort_by(|a, b| b.match_score.cmp(&a.match_score));
        for (position, result) in results.iter_mut().enumerate() {
            result.rank = Some(position as u32 + 1);
        }

        if let Some(k) = top_k {
            results.truncate(k);
        }

        info!(
            job = %job.title,
            candidates = candidates.len(),
            ranked = results.len(),
            refinement = self.refiner.is_some(),
            "batch matching completed"
        );

        Ok(results)
    }

    /// Refine every heuristic result with bounded concurrency. Each task owns
    /// a clone of its base result, so a panicking provider implementation
    /// still leaves the heuristic outcome for that candidate intact.
    async fn refine_all(
        &self,
        refiner: &Arc<dyn Refiner>,
        job: &JobProfile,
        bases: Vec<MatchResult>,
    ) -> Vec<MatchResult> {
        let semaphore = Arc::new(Semaphore::new(self.config.refine_concurrency.max(1)));
        let job = Arc::new(job.clone());
        let timeout = self.config.refine_timeout;

        let mut tasks: JoinSet<(usize, MatchResult)> = JoinSet::new();
        for (index, base) in bases.iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let refiner = Arc::clone(refiner);
            let job = Arc::clone(&job);
            let base = base.clone();

            tasks.spawn(async move {
                // closed only when the semaphore is dropped, which it is not
                let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
                let refined = refine_with_fallback(&refiner, timeout, &job, base).await;
                (index, refined)
            });
        }

        let mut refined: HashMap<usize, MatchResult> = HashMap::with_capacity(bases.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => {
                    refined.insert(index, result);
                }
                Err(err) => {
                    warn!(error = %err, "refinement task aborted; keeping heuristic result");
                }
            }
        }

        bases
            .into_iter()
            .enumerate()
            .map(|(index, base)| refined.remove(&index).unwrap_or(base))
            .collect()
    }
}

/// The silent-degrade boundary: any provider failure (including timeout)
/// returns the heuristic result unchanged, with a warning.
async fn refine_with_fallback(
    refiner: &Arc<dyn Refiner>,
    timeout: Duration,
    job: &JobProfile,
    base: MatchResult,
) -> MatchResult {
    let call = refiner.refine(job, &base.candidate, &base);
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(refined)) => base.apply_refinement(refined),
        Ok(Err(err)) => {
            warn!(
                candidate = base.candidate.display_name(),
                error = %err,
                "refinement failed; falling back to heuristic result"
            );
            base
        }
        Err(_) => {
            warn!(
                candidate = base.candidate.display_name(),
                timeout_secs = timeout.as_secs_f64(),
                "refinement timed out; falling back to heuristic result"
            );
            base
        }
    }
}
