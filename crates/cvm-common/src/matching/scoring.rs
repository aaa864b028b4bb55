use std::sync::Arc;

use serde::Serialize;

use super::overlap::overlap_ratio;
use super::weights::Weights;
use crate::normalize::first_integer;
use crate::{CandidateProfile, JobProfile, MatchError};

// Qualitative messages shown to recruiters, verbatim in the product language.
pub const STRENGTH_TECHNICAL: &str = "Skills técnicas alineadas con los requisitos clave";
pub const STRENGTH_ATS: &str = "Coincidencia con keywords ATS importantes";
pub const STRENGTH_EXPERIENCE: &str = "Experiencia suficiente";
pub const STRENGTH_EDUCATION: &str = "Educación acorde a lo solicitado";
pub const STRENGTH_SOFT: &str = "Habilidades blandas alineadas";

pub const GAP_TECHNICAL: &str = "Faltan skills técnicas importantes";
pub const GAP_ATS: &str = "Poca coincidencia con keywords ATS";
pub const GAP_EXPERIENCE: &str = "Experiencia por debajo del nivel esperado";
pub const GAP_EDUCATION: &str = "Educación no se ajusta completamente";
pub const GAP_SOFT: &str = "Habilidades blandas limitadas";

/// Neutral score when one side lacks the information to judge a factor.
const NEUTRAL: f64 = 0.5;

/// Per-factor ratios of the heuristic pass, each in [0,1]. Kept on every
/// result, refined or not, so scores stay auditable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreComponents {
    pub technical_ratio: f64,
    pub ats_ratio: f64,
    pub experience_score: f64,
    pub education_score: f64,
    pub soft_ratio: f64,
}

impl ScoreComponents {
    pub fn weighted(&self, weights: &Weights) -> f64 {
        self.technical_ratio * weights.technical
            + self.ats_ratio * weights.ats
            + self.experience_score * weights.experience
            + self.education_score * weights.education
            + self.soft_ratio * weights.soft
    }
}

/// One candidate's evaluation against one job.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    /// Integer score 0..=100.
    pub match_score: u8,
    pub base_components: ScoreComponents,
    pub strengths: Vec<String>,
    pub gaps: Vec<String>,
    /// Present only when AI refinement ran.
    pub justification: Option<String>,
    /// Raw provider reply, kept for debugging refined scores.
    pub raw_refined: Option<serde_json::Value>,
    /// Shared back-reference; the result does not own the profile.
    pub candidate: Arc<CandidateProfile>,
    /// 1-based position, assigned only by the batch ranker.
    pub rank: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct HeuristicEvaluator {
    weights: Weights,
}

impl Default for HeuristicEvaluator {
    fn default() -> Self {
        Self {
            weights: Weights::default(),
        }
    }
}

impl HeuristicEvaluator {
    pub fn with_weights(weights: Weights) -> Result<Self, MatchError> {
        weights.validate()?;
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    /// Deterministic rule-based evaluation. Missing experience data and a job
    /// without education text score neutrally; structurally invalid profiles
    /// are an error, never silently scored.
    pub fn evaluate(
        &self,
        job: &JobProfile,
        candidate: Arc<CandidateProfile>,
    ) -> Result<MatchResult, MatchError> {
        job.validate()?;
        candidate.validate()?;

        let technical_ratio = overlap_ratio(&job.technical_requirements, &candidate.skills_technical);

        // ATS keywords may show up in either skill list.
        let combined_skills: Vec<String> = candidate
            .skills_technical
            .iter()
            .chain(candidate.skills_soft.iter())
            .cloned()
            .collect();
        let ats_ratio = overlap_ratio(&job.ats_keywords, &combined_skills);

        let soft_ratio = overlap_ratio(&job.soft_skills, &candidate.skills_soft);

        let required_years = job
            .experience_required
            .as_deref()
            .and_then(first_integer);
        let experience_score = score_experience(required_years, candidate.years_experience);

        let job_education = job
            .education
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty());
        let education_score = score_education(job_education, &candidate.education);

        let components = ScoreComponents {
            technical_ratio,
            ats_ratio,
            experience_score,
            education_score,
            soft_ratio,
        };

        let match_score = (components.weighted(&self.weights) * 100.0).round() as u8;

        let mut strengths = Vec::new();
        if technical_ratio >= 0.6 {
            strengths.push(STRENGTH_TECHNICAL.to_string());
        }
        if ats_ratio >= 0.5 {
            strengths.push(STRENGTH_ATS.to_string());
        }
        if experience_score >= 0.9 {
            strengths.push(STRENGTH_EXPERIENCE.to_string());
        }
        if education_score >= 0.9 {
            strengths.push(STRENGTH_EDUCATION.to_string());
        }
        if soft_ratio >= 0.6 {
            strengths.push(STRENGTH_SOFT.to_string());
        }

        // Gap thresholds are evaluated independently of the strength ones, so
        // a category can produce neither message.
        let mut gaps = Vec::new();
        if technical_ratio < 0.4 {
            gaps.push(GAP_TECHNICAL.to_string());
        }
        if ats_ratio < 0.25 {
            gaps.push(GAP_ATS.to_string());
        }
        if let Some(required) = required_years.filter(|years| *years > 0) {
            let below = match candidate.years_experience {
                None => true,
                Some(years) => years < f64::from(required) * 0.6,
            };
            if below {
                gaps.push(GAP_EXPERIENCE.to_string());
            }
        }
        if education_score < 0.5 && job_education.is_some() {
            gaps.push(GAP_EDUCATION.to_string());
        }
        if soft_ratio < 0.3 {
            gaps.push(GAP_SOFT.to_string());
        }

        Ok(MatchResult {
            match_score,
            base_components: components,
            strengths,
            gaps,
            justification: None,
            raw_refined: None,
            candidate,
            rank: None,
        })
    }
}

/// Neutral 0.5 when either side is missing its year count; full credit at or
/// above the requirement, otherwise proportional credit in [0,1).
fn score_experience(required_years: Option<u32>, candidate_years: Option<f64>) -> f64 {
    let (Some(required), Some(actual)) = (required_years, candidate_years) else {
        return NEUTRAL;
    };

    let required = f64::from(required);
    if actual >= required {
        1.0
    } else {
        (actual / required).max(0.0)
    }
}

/// 1.0 when any education record contains any word of the job's education
/// text (case-insensitive), 0.0 otherwise; neutral when the job states none.
fn score_education(job_education: Option<&str>, records: &[crate::EducationRecord]) -> f64 {
    let Some(text) = job_education else {
        return NEUTRAL;
    };

    let text = text.to_lowercase();
    let words: Vec<&str> = text.split_whitespace().collect();
    for record in records {
        let joined = record.joined().to_lowercase();
        if words.iter().any(|word| joined.contains(word)) {
            return 1.0;
        }
    }
    0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::weights::DEFAULT_WEIGHTS;
    use crate::EducationRecord;

    fn owned(terms: &[&str]) -> Vec<String> {
        terms.iter().map(|s| s.to_string()).collect()
    }

    fn full_job() -> JobProfile {
        JobProfile {
            title: "Backend Engineer".into(),
            company: Some("Acme".into()),
            technical_requirements: owned(&["Python", "SQL"]),
            ats_keywords: owned(&["python", "etl"]),
            soft_skills: owned(&["comunicación", "trabajo en equipo"]),
            experience_required: Some("5 años".into()),
            education: Some("Grado en Informática".into()),
            ..JobProfile::default()
        }
    }

    fn full_candidate() -> Arc<CandidateProfile> {
        Arc::new(CandidateProfile {
            name: Some("Ana Pérez".into()),
            email: Some("ana@example.com".into()),
            skills_technical: owned(&["python", "sql", "etl"]),
            skills_soft: owned(&["comunicación", "trabajo en equipo"]),
            years_experience: Some(6.0),
            education: vec![EducationRecord {
                institution: Some("UCM".into()),
                degree: Some("Grado en Informática".into()),
                year: Some("2018".into()),
            }],
            ..CandidateProfile::default()
        })
    }

    #[test]
    fn full_match_scores_one_hundred() {
        let result = HeuristicEvaluator::default()
            .evaluate(&full_job(), full_candidate())
            .unwrap();

        assert_eq!(result.match_score, 100);
        assert_eq!(result.strengths.len(), 5);
        assert!(result.gaps.is_empty());
        assert!(result.justification.is_none());
        assert!(result.rank.is_none());
    }

    #[test]
    fn partial_technical_coverage_contributes_weighted_share() {
        // job requires Python + SQL, candidate brings python + java
        let job = JobProfile {
            title: "Dev".into(),
            technical_requirements: owned(&["Python", "SQL"]),
            ..JobProfile::default()
        };
        let candidate = Arc::new(CandidateProfile {
            name: Some("X".into()),
            skills_technical: owned(&["python", "java"]),
            ..CandidateProfile::default()
        });

        let result = HeuristicEvaluator::default().evaluate(&job, candidate).unwrap();
        let components = result.base_components;

        assert!((components.technical_ratio - 0.5).abs() < f64::EPSILON);
        // 0.5 * 0.45 technical + 0.5 * 0.15 neutral experience + 0.5 * 0.10
        // neutral education = 0.35
        assert_eq!(result.match_score, 35);
        let technical_share = components.technical_ratio * DEFAULT_WEIGHTS.technical;
        assert!((technical_share - 0.225).abs() < 1e-9);
    }

    #[test]
    fn experience_below_requirement_is_proportional() {
        let job = JobProfile {
            title: "Dev".into(),
            experience_required: Some("5 años".into()),
            ..JobProfile::default()
        };
        let candidate = Arc::new(CandidateProfile {
            name: Some("X".into()),
            skills_technical: owned(&["python"]),
            years_experience: Some(3.0),
            ..CandidateProfile::default()
        });

        let result = HeuristicEvaluator::default().evaluate(&job, candidate).unwrap();
        assert!((result.base_components.experience_score - 0.6).abs() < 1e-9);
        // 3 years against 5 required sits at the 0.6 gap boundary, which is
        // not strictly below it
        assert!(!result.gaps.contains(&GAP_EXPERIENCE.to_string()));
    }

    #[test]
    fn unknown_experience_scores_neutrally_without_messages() {
        let job = JobProfile {
            title: "Dev".into(),
            ..JobProfile::default()
        };
        let candidate = Arc::new(CandidateProfile {
            name: Some("X".into()),
            skills_technical: owned(&["python"]),
            years_experience: None,
            ..CandidateProfile::default()
        });

        let result = HeuristicEvaluator::default().evaluate(&job, candidate).unwrap();
        assert_eq!(result.base_components.experience_score, 0.5);
        assert!(!result.strengths.contains(&STRENGTH_EXPERIENCE.to_string()));
        assert!(!result.gaps.contains(&GAP_EXPERIENCE.to_string()));
    }

    #[test]
    fn missing_candidate_years_with_requirement_is_a_gap() {
        let job = JobProfile {
            title: "Dev".into(),
            experience_required: Some("4 años".into()),
            ..JobProfile::default()
        };
        let candidate = Arc::new(CandidateProfile {
            name: Some("X".into()),
            skills_technical: owned(&["python"]),
            years_experience: None,
            ..CandidateProfile::default()
        });

        let result = HeuristicEvaluator::default().evaluate(&job, candidate).unwrap();
        assert_eq!(result.base_components.experience_score, 0.5);
        assert!(result.gaps.contains(&GAP_EXPERIENCE.to_string()));
    }

    #[test]
    fn education_match_is_all_or_nothing() {
        let mut job = full_job();
        job.education = Some("Grado en Matemáticas".into());

        // "grado" and "en" still appear in the candidate record
        let result = HeuristicEvaluator::default()
            .evaluate(&job, full_candidate())
            .unwrap();
        assert_eq!(result.base_components.education_score, 1.0);

        job.education = Some("Doctorado".into());
        let result = HeuristicEvaluator::default()
            .evaluate(&job, full_candidate())
            .unwrap();
        assert_eq!(result.base_components.education_score, 0.0);
        assert!(result.gaps.contains(&GAP_EDUCATION.to_string()));
    }

    #[test]
    fn absent_education_text_is_neutral_not_a_gap() {
        let mut job = full_job();
        job.education = None;

        let candidate = Arc::new(CandidateProfile {
            name: Some("X".into()),
            skills_technical: owned(&["python"]),
            ..CandidateProfile::default()
        });

        let result = HeuristicEvaluator::default().evaluate(&job, candidate).unwrap();
        assert_eq!(result.base_components.education_score, 0.5);
        assert!(!result.gaps.contains(&GAP_EDUCATION.to_string()));
    }

    #[test]
    fn ats_keywords_match_against_both_skill_lists() {
        let job = JobProfile {
            title: "Dev".into(),
            ats_keywords: owned(&["python", "liderazgo"]),
            ..JobProfile::default()
        };
        let candidate = Arc::new(CandidateProfile {
            name: Some("X".into()),
            skills_technical: owned(&["python"]),
            skills_soft: owned(&["liderazgo"]),
            ..CandidateProfile::default()
        });

        let result = HeuristicEvaluator::default().evaluate(&job, candidate).unwrap();
        assert!((result.base_components.ats_ratio - 1.0).abs() < f64::EPSILON);
        assert!(result.strengths.contains(&STRENGTH_ATS.to_string()));
    }

    #[test]
    fn empty_requirement_lists_score_zero_and_still_read_as_gaps() {
        // Documented asymmetry: a job with no stated technical requirements
        // gives ratio 0.0 (not neutral), so the technical and soft gap
        // messages still fire. Kept as-is; see DESIGN.md.
        let job = JobProfile {
            title: "Dev".into(),
            ..JobProfile::default()
        };
        let result = HeuristicEvaluator::default()
            .evaluate(&job, full_candidate())
            .unwrap();

        assert_eq!(result.base_components.technical_ratio, 0.0);
        assert_eq!(result.base_components.ats_ratio, 0.0);
        assert_eq!(result.base_components.soft_ratio, 0.0);
        assert!(result.gaps.contains(&GAP_TECHNICAL.to_string()));
        assert!(result.gaps.contains(&GAP_ATS.to_string()));
        assert!(result.gaps.contains(&GAP_SOFT.to_string()));
    }

    #[test]
    fn score_is_the_rounded_weighted_component_sum() {
        let result = HeuristicEvaluator::default()
            .evaluate(&full_job(), full_candidate())
            .unwrap();

        let components = result.base_components;
        let expected = components.technical_ratio * 0.45
            + components.ats_ratio * 0.20
            + components.experience_score * 0.15
            + components.education_score * 0.10
            + components.soft_ratio * 0.10;

        assert!((components.weighted(&DEFAULT_WEIGHTS) - expected).abs() < 1e-6);
        assert_eq!(result.match_score, (expected * 100.0).round() as u8);
        assert!(result.match_score <= 100);
    }

    #[test]
    fn invalid_profiles_fail_fast() {
        let evaluator = HeuristicEvaluator::default();

        let bad_job = JobProfile::default();
        assert!(matches!(
            evaluator.evaluate(&bad_job, full_candidate()),
            Err(MatchError::InvalidJob(_))
        ));

        let bad_candidate = Arc::new(CandidateProfile::default());
        assert!(matches!(
            evaluator.evaluate(&full_job(), bad_candidate),
            Err(MatchError::InvalidCandidate(_))
        ));
    }

    #[test]
    fn negative_years_clamp_to_zero() {
        assert_eq!(score_experience(Some(5), Some(-2.0)), 0.0);
        assert_eq!(score_experience(Some(5), Some(5.0)), 1.0);
        assert_eq!(score_experience(None, Some(10.0)), 0.5);
    }
}
