//! Flattened projection of a ranking for tabular display and CSV export.

use serde::Serialize;

use crate::matching::MatchResult;

#[derive(Debug, Clone, Serialize)]
pub struct RankingRow {
    pub rank: u32,
    pub score: u8,
    pub name: String,
    pub email: String,
    /// Comma-joined technical skills.
    pub skills: String,
    /// Comma-joined soft skills.
    pub soft_skills: String,
}

impl RankingRow {
    pub fn from_result(result: &MatchResult) -> Self {
        let candidate = &result.candidate;
        Self {
            rank: result.rank.unwrap_or(0),
            score: result.match_score,
            name: candidate.name.clone().unwrap_or_default(),
            email: candidate.email.clone().unwrap_or_default(),
            skills: candidate.skills_technical.join(", "),
            soft_skills: candidate.skills_soft.join(", "),
        }
    }
}

/// Render a ranking as CSV, header included. Joined skill lists contain
/// commas, so fields are quoted per RFC 4180 when needed.
pub fn to_csv(results: &[MatchResult]) -> String {
    let mut out = String::from("rank,score,name,email,skills,soft_skills\n");
    for result in results {
        let row = RankingRow::from_result(result);
        let fields = [
            row.rank.to_string(),
            row.score.to_string(),
            row.name,
            row.email,
            row.skills,
            row.soft_skills,
        ];
        let line: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
