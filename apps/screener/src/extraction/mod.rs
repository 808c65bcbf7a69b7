//! Extraction: turns free résumé and job-description text into validated
//! structured data via the text model.
//!
//! Fail-open: every public call returns a fully formed value. When the model
//! never produces an acceptable payload the empty default is returned.

pub mod prompts;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};

use crate::extraction::prompts::{
    JOB_EXTRACT_PROMPT_TEMPLATE, JOB_EXTRACT_SYSTEM, PROFILE_EXTRACT_PROMPT_TEMPLATE,
    PROFILE_EXTRACT_SYSTEM,
};
use crate::llm_client::decode::decode_object;
use crate::llm_client::prompts::{fill_template, prompt_excerpt};
use crate::llm_client::retry::RetryPolicy;
use crate::llm_client::TextModel;
use crate::profile::dates::DatePoint;
use crate::profile::models::{
    CandidateProfile, JobRequirements, RawProfile, PROFILE_KEYS, REQUIREMENT_KEYS,
};

#[derive(Clone)]
pub struct ExtractionClient {
    model: Arc<dyn TextModel>,
    policy: RetryPolicy,
}

impl ExtractionClient {
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        Self {
            model,
            policy: RetryPolicy::EXTRACTION,
        }
    }

    /// Extracts skills, education and employment history from résumé text.
    /// "Present" and unreadable dates resolve to `today`.
    pub async fn extract_profile(&self, resume_text: &str, today: DatePoint) -> CandidateProfile {
        let today_text = today.to_string();
        let prompt = fill_template(
            PROFILE_EXTRACT_PROMPT_TEMPLATE,
            &[
                ("today", today_text.as_str()),
                ("resume_text", prompt_excerpt(resume_text)),
            ],
        );

        let raw: RawProfile = self
            .request(&prompt, PROFILE_EXTRACT_SYSTEM, &PROFILE_KEYS)
            .await
            .unwrap_or_else(|| {
                warn!("Profile extraction exhausted, using empty profile");
                RawProfile::default()
            });

        let profile = CandidateProfile::from_raw(raw, today);
        info!(
            "Extracted profile: {} skills, {} education entries, {} positions",
            profile.skills.len(),
            profile.education.len(),
            profile.experience.len()
        );
        profile
    }

    /// Extracts required education, skills and minimum experience from a job
    /// description.
    pub async fn extract_job_requirements(&self, job_text: &str) -> JobRequirements {
        let prompt = fill_template(
            JOB_EXTRACT_PROMPT_TEMPLATE,
            &[("job_text", prompt_excerpt(job_text))],
        );

        self.request(&prompt, JOB_EXTRACT_SYSTEM, &REQUIREMENT_KEYS)
            .await
            .unwrap_or_else(|| {
                warn!("Job requirement extraction exhausted, using empty requirements");
                JobRequirements::default()
            })
    }

    async fn request<T: DeserializeOwned>(
        &self,
        prompt: &str,
        system: &str,
        required_keys: &[&str],
    ) -> Option<T> {
        let model = &self.model;
        self.policy
            .run(
                |_| model.generate(prompt, system),
                |text| accept_payload(text, required_keys),
            )
            .await
    }
}

/// Decodes `text` and accepts it only when every required key is present and
/// the object deserializes into `T`.
fn accept_payload<T: DeserializeOwned>(text: &str, required_keys: &[&str]) -> Option<T> {
    let value = decode_object(text)?;
    if !has_keys(&value, required_keys) {
        return None;
    }
    serde_json::from_value(value).ok()
}

fn has_keys(value: &Value, keys: &[&str]) -> bool {
    keys.iter().all(|key| value.get(*key).is_some())
}
