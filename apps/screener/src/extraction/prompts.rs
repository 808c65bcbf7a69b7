// All LLM prompt constants for the extraction module.

/// System prompt for résumé extraction. Enforces JSON-only output.
pub const PROFILE_EXTRACT_SYSTEM: &str = "You are a precise resume data extractor. \
    Extract structured facts from resume text. \
    You MUST respond with valid JSON only, with no markdown fences and no explanations. \
    Never invent employers, dates, or qualifications that are not in the text.";

/// Résumé extraction prompt. Replace `{today}` and `{resume_text}` before sending.
pub const PROFILE_EXTRACT_PROMPT_TEMPLATE: &str = r#"Extract resume data as VALID JSON with this EXACT schema:
{
  "skills": ["Python", "Machine Learning"],
  "education": ["Bachelor's in Computer Science"],
  "experience": [
    {
      "company": "Company Name",
      "position": "Job Title",
      "start": "MM/YYYY",
      "end": "MM/YYYY or Present",
      "relevant": true
    }
  ]
}

Rules:
- Current date: {today}
- Format every date as MM/YYYY, or "Present" for ongoing roles.
- relevant is false for freelancing, volunteer, college/academic, teaching or
  teaching-assistant, internship, fellowship, instructing and project work, and for
  experience outside the professional field. It is true only for genuine professional roles.
- Terminology mentioned inside job or project descriptions that names a skill
  (tools, languages, methods) counts as a skill as well.
- List every position, relevant or not.

Resume Text (truncated):
{resume_text}"#;

/// System prompt for job description extraction. Enforces JSON-only output.
pub const JOB_EXTRACT_SYSTEM: &str = "You are an expert job description analyst. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Job requirements prompt. Replace `{job_text}` before sending.
pub const JOB_EXTRACT_PROMPT_TEMPLATE: &str = r#"Extract the requirements of this job description as VALID JSON with this EXACT schema:
{
  "required_education": ["Degree 1", "Degree 2"],
  "required_skills": ["skill1", "skill2"],
  "min_experience": 3,
  "relevant_titles": ["Title 1", "Title 2"]
}

Rules:
- required_skills: technical skills, normalized (e.g. "JS" → "JavaScript").
- min_experience: minimum years of experience as a number; 0 if not stated.
- relevant_titles: job titles that would count as relevant experience.

Job Description (truncated):
{job_text}"#;
