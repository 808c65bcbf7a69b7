//! Deterministic scorer over extracted job requirements. No model call is
//! made for the score itself, only for reading the job description.
//!
//! Algorithm:
//! 1. education = |résumé ∩ required| / |required|  (0 when nothing is required)
//! 2. skills    = |résumé ∩ required| / |required|  (0 when nothing is required)
//! 3. experience = min(total years / min years, 1)  (1 when no minimum)
//! 4. overall = (0.3 × education + 0.5 × skills + 0.2 × experience) × 100
//!
//! Overlap is case-insensitive on trimmed entries.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;

use crate::extraction::ExtractionClient;
use crate::profile::models::{CandidateProfile, JobRequirements};
use crate::scoring::{clamp_percentage, MatchScorer, ScoreRecord};

const EDUCATION_WEIGHT: f64 = 0.3;
const SKILLS_WEIGHT: f64 = 0.5;
const EXPERIENCE_WEIGHT: f64 = 0.2;

pub struct KeywordMatchScorer {
    extractor: ExtractionClient,
}

impl KeywordMatchScorer {
    pub fn new(extractor: ExtractionClient) -> Self {
        Self { extractor }
    }
}

#[async_trait]
impl MatchScorer for KeywordMatchScorer {
    async fn score(&self, job_text: &str, profile: &CandidateProfile) -> ScoreRecord {
        let requirements = self.extractor.extract_job_requirements(job_text).await;
        compute_keyword_match(&requirements, profile)
    }

    fn backend(&self) -> &'static str {
        "keyword"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Core keyword match algorithm
// ────────────────────────────────────────────────────────────────────────────

pub fn compute_keyword_match(
    requirements: &JobRequirements,
    profile: &CandidateProfile,
) -> ScoreRecord {
    let skills = lowered(profile.skills.iter());
    let education = lowered(profile.education.iter());

    let (skills_ratio, matched, missing) = overlap(&requirements.required_skills, &skills);
    let (education_ratio, _, _) = overlap(&requirements.required_education, &education);

    let experience_ratio = if requirements.min_experience > 0.0 {
        (profile.total_experience_years / requirements.min_experience).min(1.0)
    } else {
        1.0
    };

    let overall = (EDUCATION_WEIGHT * education_ratio
        + SKILLS_WEIGHT * skills_ratio
        + EXPERIENCE_WEIGHT * experience_ratio)
        * 100.0;
    let overall_match = clamp_percentage(overall.round()).unwrap_or(0);

    let score_breakdown = BTreeMap::from([
        ("education_match".to_string(), round_pct(education_ratio)),
        ("experience_match".to_string(), round_pct(experience_ratio)),
        ("skills_match".to_string(), round_pct(skills_ratio)),
    ]);

    let analysis_text = build_recommendation(overall_match, &missing);

    ScoreRecord {
        score_breakdown,
        strengths: matched,
        weaknesses: missing,
        analysis_text,
        ..ScoreRecord::for_profile(profile, overall_match)
    }
}

fn lowered<'a>(items: impl Iterator<Item = &'a String>) -> BTreeSet<String> {
    items
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Returns (ratio, matched, missing) of `required` against `held`.
/// Required entries are deduplicated case-insensitively, first spelling wins.
fn overlap(required: &[String], held: &BTreeSet<String>) -> (f64, Vec<String>, Vec<String>) {
    let mut seen = BTreeSet::new();
    let mut matched = Vec::new();
    let mut missing = Vec::new();

    for item in required {
        let key = item.trim().to_lowercase();
        if key.is_empty() || !seen.insert(key.clone()) {
            continue;
        }
        if held.contains(&key) {
            matched.push(item.trim().to_string());
        } else {
            missing.push(item.trim().to_string());
        }
    }

    if seen.is_empty() {
        return (0.0, matched, missing);
    }
    (matched.len() as f64 / seen.len() as f64, matched, missing)
}

fn round_pct(ratio: f64) -> f64 {
    (ratio * 1000.0).round() / 10.0
}

fn build_recommendation(score: u32, missing: &[String]) -> String {
    let top_gaps: Vec<&str> = missing.iter().take(3).map(String::as_str).collect();

    if score >= 80 {
        "Strong fit. The résumé covers the key job requirements.".to_string()
    } else if top_gaps.is_empty() {
        format!("Partial fit ({score}/100). Education or experience falls short of the requirements.")
    } else if score >= 60 {
        format!(
            "Moderate fit ({score}/100). Missing skills: {}.",
            top_gaps.join(", ")
        )
    } else {
        format!(
            "Low fit ({score}/100). Significant gaps: {}.",
            top_gaps.join(", ")
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
