// All LLM prompt constants for the scoring module.

/// System prompt for match scoring. Enforces JSON-only output.
pub const MATCH_SCORE_SYSTEM: &str = "You are an experienced technical recruiter scoring \
    candidates against a job description. Score consistently: the same profile and job \
    must always receive the same score. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Explainable scoring prompt.
/// Replace: {profile_json}, {skills}, {education}, {total_experience},
///          {positions}, {job_text}
pub const EXPLAINABLE_SCORE_PROMPT_TEMPLATE: &str = r#"Analyze this candidate profile against the job description.

CANDIDATE PROFILE:
{profile_json}

Consider these factors:
- Skills match (HIGHEST weight): {skills} vs the required skills in the job description
- Education: {education} vs the required qualifications
- Experience: {total_experience} years vs the experience the job requires
- Position relevance: {positions}
- Keyword presence and career stability

If skills, education and experience all match the job description, rate the candidate high.
If nothing matches, rate it low. Otherwise rate it from the factors above.

Return EXACTLY this JSON format:
{
  "match": 0-100,
  "stability": 0-100,
  "score_breakdown": {
    "skills_match": 0-100,
    "education_match": 0-100,
    "experience_match": 0-100,
    "keyword_match": 0-100
  },
  "strengths": ["list", "of", "strengths"],
  "weaknesses": ["list", "of", "weaknesses"],
  "detailed_analysis": "paragraph explaining the scoring rationale"
}

Job Description:
{job_text}"#;

/// Basic scoring prompt. Replace: {profile_json}, {job_text}
pub const BASIC_SCORE_PROMPT_TEMPLATE: &str = r#"Return EXACTLY this JSON format:
{
  "match": matching_percentage,
  "stability": stability_percentage
}

Calculation Rules:
- match: Skills (40%) + Education (20%) + Experience (40%)
- stability: tenure points converted to a percentage

Candidate Profile:
{profile_json}

Job Description:
{job_text}"#;
