pub mod error;
pub mod export;
pub mod logging;
pub mod matching;
pub mod normalize;
pub mod refine;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub use error::MatchError;

// Commonly used data models for the matching functions. Both profiles are
// produced by the extraction collaborator; the matcher never parses PDFs.

/// Structured job posting, as returned by the job-analysis extractor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobProfile {
    pub title: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub seniority_level: Option<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub technical_requirements: Vec<String>,
    /// Free text, may embed a year count (e.g. "5 años").
    #[serde(default)]
    pub experience_required: Option<String>,
    /// Free text (e.g. "Grado en Informática").
    #[serde(default)]
    pub education: Option<String>,
    #[serde(default)]
    pub soft_skills: Vec<String>,
    #[serde(default)]
    pub ats_keywords: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub work_mode: Option<String>,
    #[serde(default)]
    pub salary_range: Option<String>,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub required_languages: Vec<String>,
    #[serde(default)]
    pub nice_to_have: Vec<String>,
    #[serde(default)]
    pub analyzed_at: Option<DateTime<Utc>>,
}

impl JobProfile {
    /// A job without a title is an upstream extraction failure, not a
    /// scorable posting.
    pub fn validate(&self) -> Result<(), MatchError> {
        if self.title.trim().is_empty() {
            return Err(MatchError::InvalidJob("job title is empty".into()));
        }
        Ok(())
    }
}

/// Semi-structured candidate profile, as returned by the CV extractor.
///
/// The serde aliases accept the extractor's Spanish field names directly, so
/// its JSON output deserializes without a translation layer. Unknown keys are
/// kept in `extra` instead of being accessed stringly elsewhere.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    #[serde(default, alias = "nombre")]
    pub name: Option<String>,
    #[serde(default, alias = "correo")]
    pub email: Option<String>,
    #[serde(default, alias = "telefono")]
    pub phone: Option<String>,
    #[serde(default, alias = "linkedin")]
    pub link: Option<String>,
    #[serde(default, alias = "skills_tecnicas")]
    pub skills_technical: Vec<String>,
    #[serde(default, alias = "soft_skills")]
    pub skills_soft: Vec<String>,
    #[serde(default, alias = "idiomas")]
    pub languages: Vec<String>,
    #[serde(default, alias = "educacion")]
    pub education: Vec<EducationRecord>,
    #[serde(default, alias = "anios_experiencia")]
    pub years_experience: Option<f64>,
    #[serde(default, alias = "experiencia_laboral")]
    pub work_history: Vec<WorkExperience>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CandidateProfile {
    /// A candidate with no identity and no technical skills carries nothing
    /// the evaluator can score or the caller can display; such records are an
    /// extraction failure and are filtered before batch evaluation.
    pub fn validate(&self) -> Result<(), MatchError> {
        let has_identity = self.name.as_deref().is_some_and(|s| !s.trim().is_empty())
            || self.email.as_deref().is_some_and(|s| !s.trim().is_empty());
        if !has_identity && self.skills_technical.is_empty() {
            return Err(MatchError::InvalidCandidate(
                "candidate has no name, no email and no technical skills".into(),
            ));
        }
        Ok(())
    }

    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("(sin nombre)")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationRecord {
    #[serde(default, alias = "institucion")]
    pub institution: Option<String>,
    #[serde(default, alias = "titulo")]
    pub degree: Option<String>,
    #[serde(default, alias = "anio", deserialize_with = "string_or_number")]
    pub year: Option<String>,
}

impl EducationRecord {
    /// All present fields joined with a space, for keyword containment checks.
    pub fn joined(&self) -> String {
        [
            self.institution.as_deref(),
            self.degree.as_deref(),
            self.year.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkExperience {
    #[serde(default, alias = "puesto", alias = "rol")]
    pub role: Option<String>,
    #[serde(default, alias = "empresa")]
    pub employer: Option<String>,
    #[serde(default, alias = "periodo")]
    pub period: Option<String>,
    #[serde(default, alias = "descripcion")]
    pub description: Option<String>,
}

// The extractor's model sometimes emits years as bare numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(other) => Some(other.to_string()),
    })
}
