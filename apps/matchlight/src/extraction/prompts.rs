// All prompt constants for the extraction and comparison calls.
// Templates carry {placeholder} slots filled by the caller before sending.

/// System prompt shared by both document extractions — enforces JSON-only,
/// quote-only output.
pub const EXTRACTION_SYSTEM: &str = "You are a precise document extraction agent. \
    You MUST respond with a single valid JSON object. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Every value must be a direct quote or exact phrase from the source document. \
    Never infer, guess, or invent information. \
    If information is not present, use an empty string or empty array.";

/// CV extraction template. Replace `{cv_text}` before sending.
pub const CV_PARSE_PROMPT_TEMPLATE: &str = r#"Parse the following CV / resume into structured data.

Return a JSON object with this EXACT schema (no extra fields):
{
  "full_name": "EXACT name as written",
  "email": "EXACT email address",
  "phone": "EXACT phone number",
  "location": "EXACT location",
  "linkedin_url": "EXACT LinkedIn URL",
  "portfolio_url": "EXACT portfolio or personal site URL",
  "professional_summary": ["EXACT summary statements"],
  "key_skills": ["EXACT skills as listed"],
  "work_experience": [
    {"company": "EXACT company", "position": "EXACT title", "duration": "EXACT dates",
     "responsibilities": ["EXACT responsibility statements"]}
  ],
  "education": [
    {"institution": "EXACT institution", "degree": "EXACT degree", "year": "EXACT year"}
  ],
  "certifications": ["EXACT certifications"],
  "projects": ["EXACT project descriptions"],
  "languages": ["EXACT languages"],
  "achievements": ["EXACT achievements"],
  "raw_text": "the COMPLETE text of the document, preserving line breaks",
  "confidence_score": 0.95,
  "parsing_notes": ["any notes about parsing difficulties"]
}

Use empty strings / empty arrays for anything the document does not state.
confidence_score reflects how completely and unambiguously the document parsed (0.0 - 1.0).

CV CONTENT:
{cv_text}"#;

/// JD extraction template. Replace `{jd_text}` before sending.
pub const JD_PARSE_PROMPT_TEMPLATE: &str = r#"Parse the following job posting into structured data.

Return a JSON object with this EXACT schema (no extra fields):
{
  "job_title": "EXACT job title",
  "company_name": "EXACT company name",
  "location": "EXACT location",
  "job_summary": ["EXACT summary statements"],
  "required_skills": ["EXACT required skills"],
  "preferred_skills": ["EXACT preferred / nice-to-have skills"],
  "required_experience": ["EXACT experience requirements"],
  "required_education": ["EXACT education requirements"],
  "required_qualifications": ["EXACT required qualifications"],
  "key_responsibilities": ["EXACT responsibility statements"],
  "salary_range": "EXACT salary range",
  "job_type": "EXACT employment type",
  "raw_text": "the COMPLETE text of the posting, preserving line breaks",
  "confidence_score": 0.95,
  "parsing_notes": ["any notes about parsing difficulties"]
}

HARD REQUIREMENTS are explicit must-haves ("required", "must have", minimum years).
PREFERRED items are nice-to-haves ("preferred", "bonus", "a plus").
Use empty strings / empty arrays for anything the posting does not state.

JOB POSTING CONTENT:
{jd_text}"#;

/// Instruction prepended to file (base64 document) requests — the provider
/// performs the binary text extraction itself.
pub const FILE_EXTRACTION_PREAMBLE: &str = "Extract ALL text content from this COMPLETE document \
    (every page — do not stop at page 1) and parse it into the required JSON format. \
    Put the full extracted text, with line breaks preserved, in the raw_text field.";

/// System prompt for the second-stage gap analysis.
pub const GAP_ANALYSIS_SYSTEM: &str = "You are an expert CV-to-job-posting gap analyst. \
    You compare structured extractions of a CV and a job posting and return \
    address-based highlighting instructions plus category scores. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Gap-analysis template. Replace `{cv_data}`, `{jd_data}`,
/// `{cv_addresses}`, and `{jd_addresses}` before sending.
pub const GAP_ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyze the match between this CV and job posting, and return highlighting instructions by address plus comprehensive scoring.

ADDRESS RULES:
- ONLY reference addresses from the lists below. Never invent addresses.
- Available CV addresses: {cv_addresses}
- Available JD addresses: {jd_addresses}

CLASSIFICATIONS (pick exactly one per instruction):
- "match": content directly matches between CV and posting
- "potential": partial or transferable match, or content that should be repositioned
- "gap": a posting requirement with no CV evidence

SCORING GUIDELINES (percentages, 0.0-100.0):
- overall_score: weighted average of all categories
- skills_score: share of required skills the candidate has
- experience_score: quality of experience match
- education_score: education requirement match
- qualifications_score: additional qualifications match

RECOMMENDATIONS must focus on CV presentation, not acquiring new experience:
suggest repositioning existing work, never "learn X" or "gain N years".

Return ONLY this JSON structure:
{
  "cv_instructions": [
    {"address": "cv_skill_12", "classification": "match", "rationale": "Python directly matches a required skill"}
  ],
  "jd_instructions": [
    {"address": "jd_requirement_4", "classification": "gap", "rationale": "AWS experience required but absent from the CV"}
  ],
  "match_score": {
    "overall_score": 75.0,
    "skills_score": 65.0,
    "experience_score": 80.0,
    "education_score": 100.0,
    "qualifications_score": 70.0,
    "recommendations": ["..."],
    "strengths": ["..."],
    "gaps": ["..."]
  },
  "analysis_notes": ["..."]
}

Focus on the most relevant matches and gaps - do not highlight every address.

CV DATA:
{cv_data}

JOB POSTING DATA:
{jd_data}"#;
