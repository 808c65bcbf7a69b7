use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::warn;

use crate::profile::dates::{normalize, DateOrigin, DatePoint};
use crate::profile::intervals::{merge_and_sum, Interval};
use crate::profile::stability::stability_score;

// ────────────────────────────────────────────────────────────────────────────
// Wire shapes: what the model is asked to return. Every field is lenient.
// ────────────────────────────────────────────────────────────────────────────

/// Top-level keys that must be present for an extraction to be accepted.
pub const PROFILE_KEYS: [&str; 3] = ["skills", "education", "experience"];

/// Top-level keys that must be present for a job-requirements extraction.
pub const REQUIREMENT_KEYS: [&str; 3] = ["required_skills", "required_education", "min_experience"];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProfile {
    #[serde(default, deserialize_with = "lenient_strings")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub education: Vec<String>,
    #[serde(default, deserialize_with = "lenient_employment")]
    pub experience: Vec<RawEmployment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEmployment {
    #[serde(default, deserialize_with = "lenient_string")]
    pub company: String,
    #[serde(default, alias = "job_title", alias = "title", deserialize_with = "lenient_string")]
    pub position: String,
    #[serde(default, alias = "start_date", deserialize_with = "lenient_opt_string")]
    pub start: Option<String>,
    #[serde(default, alias = "end_date", deserialize_with = "lenient_opt_string")]
    pub end: Option<String>,
    #[serde(default, alias = "is_relevant", deserialize_with = "lenient_bool")]
    pub relevant: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Domain types
// ────────────────────────────────────────────────────────────────────────────

/// End of an employment period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmploymentEnd {
    Present,
    At(DatePoint),
}

impl EmploymentEnd {
    pub fn resolve(&self, today: DatePoint) -> DatePoint {
        match self {
            EmploymentEnd::Present => today,
            EmploymentEnd::At(point) => *point,
        }
    }
}

impl Serialize for EmploymentEnd {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            EmploymentEnd::Present => serializer.serialize_str("Present"),
            EmploymentEnd::At(point) => point.serialize(serializer),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmploymentRecord {
    pub company: String,
    pub position: String,
    pub start: DatePoint,
    pub end: EmploymentEnd,
    pub is_relevant: bool,
    /// The start month was unreadable and stands in as "now".
    #[serde(skip)]
    pub start_estimated: bool,
}

impl EmploymentRecord {
    /// `None` when the start was never read: such a role covers no time.
    pub fn interval(&self, today: DatePoint) -> Option<Interval> {
        (!self.start_estimated).then(|| Interval::new(self.start, self.end.resolve(today)))
    }

    pub fn tenure_months(&self, today: DatePoint) -> u32 {
        self.interval(today).map_or(0, |interval| interval.months())
    }
}

/// Structured résumé. Derived fields are zero until `enrich` runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CandidateProfile {
    pub skills: BTreeSet<String>,
    pub education: Vec<String>,
    pub experience: Vec<EmploymentRecord>,
    pub total_experience_years: f64,
    pub stability_score: f64,
    /// Dates that could not be read and were taken as "now".
    pub unparsed_dates: u32,
}

impl CandidateProfile {
    /// Normalizes a decoded model payload. A missing start date counts as an
    /// unparsed date resolved to `today`; a missing end date means "present".
    pub fn from_raw(raw: RawProfile, today: DatePoint) -> Self {
        let mut unparsed_dates = 0;

        let experience = raw
            .experience
            .into_iter()
            .map(|job| {
                let start = normalize(job.start.as_deref().unwrap_or_default(), today);
                if start.origin != DateOrigin::Parsed {
                    unparsed_dates += 1;
                    warn!(
                        "Unreadable start date {:?} for {} at {}, using current month",
                        job.start, job.position, job.company
                    );
                }

                let end = match job.end.as_deref() {
                    None => EmploymentEnd::Present,
                    Some(text) => {
                        let end = normalize(text, today);
                        match end.origin {
                            DateOrigin::Parsed => EmploymentEnd::At(end.point),
                            DateOrigin::Present => EmploymentEnd::Present,
                            DateOrigin::Fallback => {
                                unparsed_dates += 1;
                                warn!(
                                    "Unreadable end date {:?} for {} at {}, using current month",
                                    text, job.position, job.company
                                );
                                EmploymentEnd::Present
                            }
                        }
                    }
                };

                EmploymentRecord {
                    company: job.company,
                    position: job.position,
                    start: start.point,
                    end,
                    is_relevant: job.relevant,
                    start_estimated: start.origin != DateOrigin::Parsed,
                }
            })
            .collect();

        Self {
            skills: raw
                .skills
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            education: raw.education,
            experience,
            total_experience_years: 0.0,
            stability_score: 0.0,
            unparsed_dates,
        }
    }

    pub fn relevant_experience(&self) -> impl Iterator<Item = &EmploymentRecord> {
        self.experience.iter().filter(|e| e.is_relevant)
    }

    pub fn relevant_intervals(&self, today: DatePoint) -> Vec<Interval> {
        self.relevant_experience()
            .filter_map(|e| e.interval(today))
            .collect()
    }

    pub fn relevant_company_count(&self) -> usize {
        self.relevant_experience().count()
    }

    /// Fills in total experience (union of relevant intervals) and stability.
    pub fn enrich(&mut self, today: DatePoint) {
        let tenures: Vec<u32> = self
            .relevant_experience()
            .map(|e| e.tenure_months(today))
            .collect();
        self.total_experience_years = merge_and_sum(&self.relevant_intervals(today));
        self.stability_score = stability_score(&tenures);
    }
}

/// Structured job description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobRequirements {
    #[serde(default, deserialize_with = "lenient_strings")]
    pub required_education: Vec<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub required_skills: Vec<String>,
    #[serde(default, deserialize_with = "lenient_years")]
    pub min_experience: f64,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub relevant_titles: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Lenient deserializers
// ────────────────────────────────────────────────────────────────────────────

/// Renders a scalar or object as text; objects join their scalar values.
fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(map) => {
            let parts: Vec<String> = map.values().filter_map(value_to_text).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        }
        Value::Array(_) | Value::Null => None,
    }
}

fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items.iter().filter_map(value_to_text).collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_text(&Value::deserialize(deserializer)?).unwrap_or_default())
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_text(&Value::deserialize(deserializer)?))
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "y"),
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        _ => false,
    })
}

fn lenient_years<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let years = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => leading_number(&s),
        _ => None,
    };
    Ok(years.filter(|y| y.is_finite() && *y > 0.0).unwrap_or(0.0))
}

/// First number in a string such as "5+ years" or "3.5".
fn leading_number(text: &str) -> Option<f64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits.parse().ok()
}

fn lenient_employment<'de, D>(deserializer: D) -> Result<Vec<RawEmployment>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TODAY: DatePoint = DatePoint {
        year: 2024,
        month: 6,
    };

    fn profile_from(value: Value) -> CandidateProfile {
        let raw: RawProfile = serde_json::from_value(value).unwrap();
        CandidateProfile::from_raw(raw, TODAY)
    }

    #[test]
    fn test_full_profile_normalizes() {
        let profile = profile_from(json!({
            "skills": ["Rust", " SQL ", "Rust", ""],
            "education": ["BSc Computer Science"],
            "experience": [
                {"company": "Acme", "position": "Engineer", "start": "01/2020", "end": "06/2021", "relevant": true},
                {"company": "Self", "position": "Freelancer", "start": "2019", "end": "Present", "relevant": false}
            ]
        }));

        assert_eq!(profile.skills.len(), 2);
        assert!(profile.skills.contains("SQL"));
        assert_eq!(profile.education, vec!["BSc Computer Science"]);
        assert_eq!(profile.experience[0].start, DatePoint::new(2020, 1));
        assert_eq!(
            profile.experience[0].end,
            EmploymentEnd::At(DatePoint::new(2021, 6))
        );
        assert_eq!(profile.experience[1].end, EmploymentEnd::Present);
        assert_eq!(profile.relevant_company_count(), 1);
        assert_eq!(profile.unparsed_dates, 0);
    }

    #[test]
    fn test_aliases_and_loose_types() {
        let profile = profile_from(json!({
            "skills": "Python, Docker",
            "education": [{"field": "Physics", "institution": "MIT"}],
            "experience": [
                {"company": "Initech", "job_title": "Analyst", "start_date": 2018, "end_date": "03/2020", "is_relevant": "true"},
                "not an object",
                {"company": "Globex", "title": "Dev", "start": "Jan 2021", "relevant": 1}
            ]
        }));

        assert!(profile.skills.contains("Python"));
        assert!(profile.skills.contains("Docker"));
        assert_eq!(profile.education, vec!["Physics, MIT"]);
        assert_eq!(profile.experience.len(), 2);
        assert_eq!(profile.experience[0].position, "Analyst");
        assert_eq!(profile.experience[0].start, DatePoint::new(2018, 1));
        assert!(profile.experience[0].is_relevant);
        assert_eq!(profile.experience[1].end, EmploymentEnd::Present);
        assert!(profile.experience[1].is_relevant);
    }

    #[test]
    fn test_unreadable_dates_are_counted() {
        let profile = profile_from(json!({
            "skills": [],
            "education": [],
            "experience": [
                {"company": "A", "position": "B", "end": "whenever", "relevant": true}
            ]
        }));
        assert_eq!(profile.unparsed_dates, 2);
        assert_eq!(profile.experience[0].start, TODAY);
        assert_eq!(profile.experience[0].end, EmploymentEnd::Present);
    }

    #[test]
    fn test_enrich_uses_only_relevant_roles() {
        let mut profile = profile_from(json!({
            "skills": [],
            "education": [],
            "experience": [
                {"company": "A", "position": "Dev", "start": "01/2020", "end": "06/2021", "relevant": true},
                {"company": "B", "position": "Dev", "start": "03/2021", "end": "12/2022", "relevant": true},
                {"company": "C", "position": "Intern", "start": "01/2010", "end": "12/2015", "relevant": false}
            ]
        }));
        profile.enrich(TODAY);

        assert!((profile.total_experience_years - 3.0).abs() < f64::EPSILON);
        // 18 months → 1.0, 22 months → 1.0
        assert_eq!(profile.stability_score, 100.0);
        assert_eq!(profile.relevant_company_count(), 2);
    }

    #[test]
    fn test_undated_role_covers_no_time() {
        let mut profile = profile_from(json!({
            "skills": [],
            "education": [],
            "experience": [
                {"company": "A", "position": "Dev", "relevant": true}
            ]
        }));
        profile.enrich(TODAY);

        assert!(profile.experience[0].start_estimated);
        assert_eq!(profile.experience[0].tenure_months(TODAY), 0);
        assert!(profile.relevant_intervals(TODAY).is_empty());
        assert_eq!(profile.total_experience_years, 0.0);
        // still a relevant role, in the shortest tenure bucket
        assert_eq!(profile.stability_score, 25.0);
        assert_eq!(profile.relevant_company_count(), 1);
    }

    #[test]
    fn test_undated_role_does_not_add_to_dated_ones() {
        let mut profile = profile_from(json!({
            "skills": [],
            "education": [],
            "experience": [
                {"company": "A", "position": "Dev", "start": "01/2023", "end": "12/2023", "relevant": true},
                {"company": "B", "position": "Dev", "start": "03/21", "relevant": true}
            ]
        }));
        profile.enrich(TODAY);

        assert_eq!(profile.unparsed_dates, 1);
        assert!((profile.total_experience_years - 1.0).abs() < f64::EPSILON);
        // 12 months → 1.0, undated → 0.25
        assert_eq!(profile.stability_score, 62.5);
    }

    #[test]
    fn test_present_end_resolves_to_today() {
        let mut profile = profile_from(json!({
            "skills": [],
            "education": [],
            "experience": [
                {"company": "A", "position": "Dev", "start": "07/2023", "end": "current", "relevant": true}
            ]
        }));
        profile.enrich(TODAY);
        // Jul 2023 through Jun 2024
        assert!((profile.total_experience_years - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_profile_enriches_to_zero() {
        let mut profile = CandidateProfile::default();
        profile.enrich(TODAY);
        assert_eq!(profile.total_experience_years, 0.0);
        assert_eq!(profile.stability_score, 0.0);
    }

    #[test]
    fn test_profile_serializes_dates_for_prompts() {
        let profile = profile_from(json!({
            "skills": ["Go"],
            "education": [],
            "experience": [
                {"company": "A", "position": "Dev", "start": "02/2022", "end": "Present", "relevant": true}
            ]
        }));
        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["experience"][0]["start"], "02/2022");
        assert_eq!(value["experience"][0]["end"], "Present");
    }

    #[test]
    fn test_job_requirements_lenient_years() {
        let reqs: JobRequirements = serde_json::from_value(json!({
            "required_education": ["BSc"],
            "required_skills": ["Rust", "Kafka"],
            "min_experience": "5+ years"
        }))
        .unwrap();
        assert_eq!(reqs.min_experience, 5.0);
        assert!(reqs.relevant_titles.is_empty());

        let reqs: JobRequirements =
            serde_json::from_value(json!({"min_experience": null})).unwrap();
        assert_eq!(reqs.min_experience, 0.0);
    }
}
