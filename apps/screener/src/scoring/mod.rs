//! Match scoring: a pluggable, trait-based scorer that ranks a candidate profile
//! against a job description.
//!
//! Backends:
//! - `LlmMatchScorer` (explainable): match, stability, breakdown, strengths,
//!   weaknesses and an analysis paragraph from the model.
//! - `LlmMatchScorer` (basic): match and stability only.
//! - `KeywordMatchScorer`: deterministic overlap against extracted requirements.
//!
//! Scorers never fail. An exhausted model call yields `ScoreRecord::zeroed()`.

pub mod keyword;
pub mod llm;
pub mod prompts;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::profile::models::CandidateProfile;

pub use keyword::KeywordMatchScorer;
pub use llm::{LlmMatchScorer, ScoringStyle};

/// Breakdown key under which the model's own stability estimate is kept.
pub const MODEL_STABILITY_KEY: &str = "model_stability";

/// Final result for one résumé. Never mutated after creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreRecord {
    pub overall_match: u32,             // 0 – 100
    pub stability_score: u32,           // 0 – 100
    pub total_experience_years: f64,
    pub relevant_company_count: u32,
    pub score_breakdown: BTreeMap<String, f64>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub analysis_text: String,
}

impl ScoreRecord {
    /// All numbers zero, all lists and text empty.
    pub fn zeroed() -> Self {
        Self::default()
    }

    /// A record carrying the profile's derived figures and the given match.
    pub fn for_profile(profile: &CandidateProfile, overall_match: u32) -> Self {
        Self {
            overall_match: overall_match.min(100),
            stability_score: clamp_percentage(profile.stability_score).unwrap_or(0),
            total_experience_years: profile.total_experience_years.max(0.0),
            relevant_company_count: profile.relevant_company_count() as u32,
            ..Self::default()
        }
    }
}

/// The fit scorer trait. Implement this to swap backends without touching
/// the pipeline.
#[async_trait]
pub trait MatchScorer: Send + Sync {
    async fn score(&self, job_text: &str, profile: &CandidateProfile) -> ScoreRecord;

    /// "explainable" | "basic" | "keyword", for logs.
    fn backend(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// Validation of model verdicts
// ────────────────────────────────────────────────────────────────────────────

/// A validated scoring response.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelVerdict {
    pub overall_match: u32,
    pub stability: u32,
    pub breakdown: BTreeMap<String, f64>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub analysis: String,
}

impl ModelVerdict {
    /// Accepts the payload only when `match` and `stability` are both numeric.
    /// Everything else is optional and dropped if malformed.
    pub fn from_value(value: &Value) -> Option<Self> {
        let overall_match = value.get("match").and_then(parse_percentage)?;
        let stability = value.get("stability").and_then(parse_percentage)?;

        let breakdown = value
            .get("score_breakdown")
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| parse_number(v).map(|n| (k.clone(), n.clamp(0.0, 100.0))))
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            overall_match,
            stability,
            breakdown,
            strengths: string_list(value.get("strengths")),
            weaknesses: string_list(value.get("weaknesses")),
            analysis: value
                .get("detailed_analysis")
                .or_else(|| value.get("analysis"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .trim()
                .to_string(),
        })
    }

    /// Builds the final record. Stability comes from the profile's tenure
    /// arithmetic; the model's estimate is kept in the breakdown.
    pub fn into_record(self, profile: &CandidateProfile) -> ScoreRecord {
        let mut record = ScoreRecord::for_profile(profile, self.overall_match);
        record.score_breakdown = self.breakdown;
        record
            .score_breakdown
            .insert(MODEL_STABILITY_KEY.to_string(), self.stability as f64);
        record.strengths = self.strengths;
        record.weaknesses = self.weaknesses;
        record.analysis_text = self.analysis;
        record
    }
}

/// A number or numeric string (optionally with a trailing `%`).
fn parse_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Clamps to [0, 100] and truncates toward zero.
pub fn clamp_percentage(n: f64) -> Option<u32> {
    n.is_finite().then(|| n.clamp(0.0, 100.0).trunc() as u32)
}

pub fn parse_percentage(value: &Value) -> Option<u32> {
    parse_number(value).and_then(clamp_percentage)
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_match_clamped_to_bounds() {
        assert_eq!(parse_percentage(&json!(150)), Some(100));
        assert_eq!(parse_percentage(&json!(-10)), Some(0));
        assert_eq!(parse_percentage(&json!(72.9)), Some(72));
    }

    #[test]
    fn test_numeric_strings_accepted() {
        assert_eq!(parse_percentage(&json!("85")), Some(85));
        assert_eq!(parse_percentage(&json!(" 64.5% ")), Some(64));
    }

    #[test]
    fn test_non_numeric_rejected() {
        assert_eq!(parse_percentage(&json!("high")), None);
        assert_eq!(parse_percentage(&json!(null)), None);
        assert_eq!(parse_percentage(&json!([80])), None);
    }

    #[test]
    fn test_verdict_requires_match_and_stability() {
        assert!(ModelVerdict::from_value(&json!({"match": 80})).is_none());
        assert!(ModelVerdict::from_value(&json!({"stability": 80})).is_none());
        assert!(ModelVerdict::from_value(&json!({"match": "n/a", "stability": 80})).is_none());
        assert!(ModelVerdict::from_value(&json!({"match": 80, "stability": 40})).is_some());
    }

    #[test]
    fn test_verdict_full_payload() {
        let verdict = ModelVerdict::from_value(&json!({
            "match": 150,
            "stability": -5,
            "score_breakdown": {
                "skills_match": 90,
                "education_match": "70",
                "keyword_match": "lots"
            },
            "strengths": ["Rust", 42, "  "],
            "weaknesses": "No Kafka",
            "detailed_analysis": "  Solid backend profile. "
        }))
        .unwrap();

        assert_eq!(verdict.overall_match, 100);
        assert_eq!(verdict.stability, 0);
        assert_eq!(verdict.breakdown.len(), 2);
        assert_eq!(verdict.breakdown["education_match"], 70.0);
        assert_eq!(verdict.strengths, vec!["Rust"]);
        assert_eq!(verdict.weaknesses, vec!["No Kafka"]);
        assert_eq!(verdict.analysis, "Solid backend profile.");
    }

    #[test]
    fn test_into_record_uses_profile_figures() {
        let profile = CandidateProfile {
            total_experience_years: 4.5,
            stability_score: 87.5,
            ..CandidateProfile::default()
        };
        let verdict = ModelVerdict::from_value(&json!({"match": 66, "stability": 20})).unwrap();

        let record = verdict.into_record(&profile);

        assert_eq!(record.overall_match, 66);
        assert_eq!(record.stability_score, 87);
        assert_eq!(record.total_experience_years, 4.5);
        assert_eq!(record.score_breakdown[MODEL_STABILITY_KEY], 20.0);
    }

    #[test]
    fn test_zeroed_record_is_empty() {
        let record = ScoreRecord::zeroed();
        assert_eq!(record.overall_match, 0);
        assert_eq!(record.stability_score, 0);
        assert_eq!(record.total_experience_years, 0.0);
        assert_eq!(record.relevant_company_count, 0);
        assert!(record.score_breakdown.is_empty());
        assert!(record.strengths.is_empty());
        assert!(record.analysis_text.is_empty());
    }
}
