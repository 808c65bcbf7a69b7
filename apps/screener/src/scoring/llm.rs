use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::llm_client::decode::decode_object;
use crate::llm_client::prompts::{fill_template, prompt_excerpt};
use crate::llm_client::retry::RetryPolicy;
use crate::llm_client::TextModel;
use crate::profile::models::CandidateProfile;
use crate::scoring::prompts::{
    BASIC_SCORE_PROMPT_TEMPLATE, EXPLAINABLE_SCORE_PROMPT_TEMPLATE, MATCH_SCORE_SYSTEM,
};
use crate::scoring::{MatchScorer, ModelVerdict, ScoreRecord};

/// Which scoring contract the model is asked to fulfil.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringStyle {
    /// Breakdown, strengths, weaknesses and analysis.
    Explainable,
    /// Match and stability only.
    Basic,
}

/// Model-backed scorer with validation, clamping and the scoring retry policy.
pub struct LlmMatchScorer {
    model: Arc<dyn TextModel>,
    style: ScoringStyle,
    policy: RetryPolicy,
}

impl LlmMatchScorer {
    pub fn new(model: Arc<dyn TextModel>, style: ScoringStyle) -> Self {
        Self {
            model,
            style,
            policy: RetryPolicy::SCORING,
        }
    }

    fn build_prompt(&self, job_text: &str, profile: &CandidateProfile) -> String {
        let profile_json = serde_json::to_string_pretty(profile).unwrap_or_default();
        let job_text = prompt_excerpt(job_text);

        match self.style {
            ScoringStyle::Explainable => {
                let skills: Vec<&str> = profile.skills.iter().map(String::as_str).collect();
                let positions: Vec<&str> = profile
                    .experience
                    .iter()
                    .map(|e| e.position.as_str())
                    .collect();
                let skills = format!("{skills:?}");
                let education = format!("{:?}", profile.education);
                let total_experience = format!("{:.2}", profile.total_experience_years);
                let positions = format!("{positions:?}");
                fill_template(
                    EXPLAINABLE_SCORE_PROMPT_TEMPLATE,
                    &[
                        ("profile_json", profile_json.as_str()),
                        ("skills", skills.as_str()),
                        ("education", education.as_str()),
                        ("total_experience", total_experience.as_str()),
                        ("positions", positions.as_str()),
                        ("job_text", job_text),
                    ],
                )
            }
            ScoringStyle::Basic => fill_template(
                BASIC_SCORE_PROMPT_TEMPLATE,
                &[("profile_json", profile_json.as_str()), ("job_text", job_text)],
            ),
        }
    }
}

#[async_trait]
impl MatchScorer for LlmMatchScorer {
    async fn score(&self, job_text: &str, profile: &CandidateProfile) -> ScoreRecord {
        let prompt = self.build_prompt(job_text, profile);
        let model = &self.model;
        let style = self.style;

        let verdict = self
            .policy
            .run(
                |_| model.generate(&prompt, MATCH_SCORE_SYSTEM),
                |text| decode_object(text).and_then(|v| ModelVerdict::from_value(&v)),
            )
            .await;

        match verdict {
            Some(verdict) => {
                info!(
                    "Match score: {}/100 (model stability {})",
                    verdict.overall_match, verdict.stability
                );
                let mut record = verdict.into_record(profile);
                if style == ScoringStyle::Basic {
                    record.strengths.clear();
                    record.weaknesses.clear();
                    record.analysis_text.clear();
                }
                record
            }
            None => {
                warn!("Match scoring exhausted, returning zeroed record");
                ScoreRecord::zeroed()
            }
        }
    }

    fn backend(&self) -> &'static str {
        match self.style {
            ScoringStyle::Explainable => "explainable",
            ScoringStyle::Basic => "basic",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::dates::DatePoint;
    use crate::profile::models::RawProfile;
    use crate::testing::ScriptedModel;
    use std::time::Duration;

    fn sample_profile() -> CandidateProfile {
        let raw: RawProfile = serde_json::from_str(
            r#"{
                "skills": ["Rust", "Postgres"],
                "education": ["BSc CS"],
                "experience": [
                    {"company": "Acme", "position": "Backend Engineer", "start": "01/2019", "end": "12/2022", "relevant": true},
                    {"company": "Uni", "position": "Teaching Assistant", "start": "01/2017", "end": "12/2018", "relevant": false}
                ]
            }"#,
        )
        .unwrap();
        let today = DatePoint::new(2024, 6);
        let mut profile = CandidateProfile::from_raw(raw, today);
        profile.enrich(today);
        profile
    }

    #[tokio::test(start_paused = true)]
    async fn test_explainable_score_record() {
        let model = ScriptedModel::always(
            r#"{"match": 81, "stability": 90, "score_breakdown": {"skills_match": 85},
                "strengths": ["Rust"], "weaknesses": ["No Kafka"], "detailed_analysis": "Good fit."}"#,
        );
        let scorer = LlmMatchScorer::new(model.clone(), ScoringStyle::Explainable);
        let profile = sample_profile();

        let record = scorer.score("Rust backend role", &profile).await;

        assert_eq!(model.calls(), 1);
        assert_eq!(record.overall_match, 81);
        // 48 months at Acme → 2.0 points → capped 100
        assert_eq!(record.stability_score, 100);
        assert!((record.total_experience_years - 4.0).abs() < f64::EPSILON);
        assert_eq!(record.relevant_company_count, 1);
        assert_eq!(record.score_breakdown["skills_match"], 85.0);
        assert_eq!(record.strengths, vec!["Rust"]);
        assert_eq!(record.analysis_text, "Good fit.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_prompt_mentions_profile_facts() {
        let model = ScriptedModel::always(r#"{"match": 50, "stability": 50}"#);
        let scorer = LlmMatchScorer::new(model.clone(), ScoringStyle::Explainable);

        scorer.score("JOB-TEXT-MARKER", &sample_profile()).await;

        let prompt = model.last_prompt().unwrap();
        assert!(prompt.contains("JOB-TEXT-MARKER"));
        assert!(prompt.contains("4.00 years"));
        assert!(prompt.contains("Backend Engineer"));
        assert!(prompt.contains("\"Postgres\""));
    }

    #[tokio::test(start_paused = true)]
    async fn test_placeholders_inside_resume_content_stay_literal() {
        let model = ScriptedModel::always(r#"{"match": 50, "stability": 50}"#);
        let scorer = LlmMatchScorer::new(model.clone(), ScoringStyle::Explainable);
        let mut profile = sample_profile();
        profile.skills.insert("{job_text}".to_string());
        profile.education.push("{skills}".to_string());

        scorer.score("JOB-TEXT-MARKER", &profile).await;

        let prompt = model.last_prompt().unwrap();
        assert_eq!(prompt.matches("JOB-TEXT-MARKER").count(), 1);
        assert!(prompt.contains("\"{job_text}\""));
        assert!(prompt.contains("\"{skills}\""));
    }

    #[tokio::test(start_paused = true)]
    async fn test_out_of_range_scores_clamped() {
        let model = ScriptedModel::sequence(vec![Ok(
            r#"{"match": 150, "stability": -10}"#.to_string()
        )]);
        let scorer = LlmMatchScorer::new(model.clone(), ScoringStyle::Basic);

        let record = scorer.score("job", &sample_profile()).await;
        assert_eq!(record.overall_match, 100);
        assert_eq!(record.score_breakdown["model_stability"], 0.0);

        let model = ScriptedModel::always(r#"{"match": -10, "stability": 150}"#);
        let scorer = LlmMatchScorer::new(model, ScoringStyle::Basic);
        let record = scorer.score("job", &sample_profile()).await;
        assert_eq!(record.overall_match, 0);
        assert_eq!(record.score_breakdown["model_stability"], 100.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_basic_style_drops_narrative_fields() {
        let model = ScriptedModel::always(
            r#"{"match": 70, "stability": 60, "strengths": ["x"], "detailed_analysis": "y"}"#,
        );
        let scorer = LlmMatchScorer::new(model, ScoringStyle::Basic);

        let record = scorer.score("job", &sample_profile()).await;

        assert_eq!(record.overall_match, 70);
        assert!(record.strengths.is_empty());
        assert!(record.analysis_text.is_empty());
        assert_eq!(scorer.backend(), "basic");
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_after_five_attempts_returns_zeroed() {
        let model = ScriptedModel::always(r#"{"match": "unknown"}"#);
        let scorer = LlmMatchScorer::new(model.clone(), ScoringStyle::Explainable);
        let start = tokio::time::Instant::now();

        let record = scorer.score("job", &sample_profile()).await;

        assert_eq!(model.calls(), 5);
        assert_eq!(record, ScoreRecord::zeroed());
        // 6s + 7s + 9s + 13s between the five attempts
        assert_eq!(start.elapsed(), Duration::from_secs(35));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_from_prose_wrapped_response() {
        let model = ScriptedModel::sequence(vec![
            Ok(String::new()),
            Ok(r#"Sure, here you go: {"match": "77", "stability": 40} Cheers"#.to_string()),
        ]);
        let scorer = LlmMatchScorer::new(model.clone(), ScoringStyle::Explainable);

        let record = scorer.score("job", &sample_profile()).await;

        assert_eq!(model.calls(), 2);
        assert_eq!(record.overall_match, 77);
    }
}
