// All prompt constants for the generation tasks. Each task pairs a system
// prompt enforcing JSON-only output with an instruction template whose
// placeholders are filled by `tasks::render_*` before sending.

/// System prompt fragment shared by every structured task.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Grounding rules shared by every task that rewrites or analyzes a resume.
pub const NO_HALLUCINATION_RULES: &str = "\
STRICT NON-HALLUCINATION POLICY:
- Do NOT invent employers, roles, dates, degrees, certifications, projects, or skills.
- Do NOT add tools or technologies unless they are already present in the resume or clearly implied by the stated responsibilities.
- If a keyword from the job description cannot be supported by the candidate's stated experience, do NOT include it.
- You may reorder, reword, and surface keywords the resume already supports. Nothing more.";

// ────────────────────────────────────────────────────────────────────────────
// Tailoring (primary task)
// ────────────────────────────────────────────────────────────────────────────

pub const TAILORING_SYSTEM: &str = "You are an expert resume tailor and career coach. \
    You rewrite resumes to match job descriptions without inventing a single fact. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Tailoring prompt. Replace `{resume_text}` and `{job_description}`.
pub const TAILORING_TEMPLATE: &str = r#"Given a resume and a job description, generate a tailored resume and analyze its effectiveness.

Resume to be tailored:
{resume_text}

Job Description to tailor for:
{job_description}

{no_hallucination_rules}

Follow these instructions precisely:

1. SCORE THE ORIGINAL: Analyze the original resume against the job description.
   - Put an overall 0-100 ATS score in `initialAtsScore`.
   - Fill `atsScoreBreakdown` with a 0-100 score and a 1-2 sentence analysis for each of `roleMatch`, `experienceMatch`, and `skillsMatch`.

2. TAILOR THE RESUME: Adapt the candidate's existing resume to better match the job description.
   - Preserve all factual information: roles, companies, dates, education, certifications.
   - Keep every original responsibility and achievement. Preserve each experience entry's bullets in count and grounding; you may lightly rephrase and weave in supported keywords, but never remove content or fabricate outcomes.
   - In each experience description, every bullet point must start with '- ' on its own line.
   - Only create a custom section when content has no natural home in the standard sections.
   - Thesis or dissertation content must be folded into the matching education entry, never placed in a separate labeled block.

3. SCORE THE RESULT: Analyze the NEWLY TAILORED resume and put its 0-100 ATS score in `tailoredAtsScore`.

Do NOT generate a cover letter, skill gap analysis, or interview questions.

Return a JSON object with this EXACT schema:
{
  "initialAtsScore": 42,
  "tailoredAtsScore": 78,
  "atsScoreBreakdown": {
    "roleMatch": {"score": 60, "analysis": "..."},
    "experienceMatch": {"score": 55, "analysis": "..."},
    "skillsMatch": {"score": 30, "analysis": "..."}
  },
  "tailoredResumeJson": "<the tailored resume as a JSON-encoded STRING with fields: basics {name, email, phone, location, summary, links [{label, url}]}, education [{school, degree, year}], experience [{company, role, years, description}], skills [], certifications [], languages [], customSections [{title, content}]>"
}"#;

// ────────────────────────────────────────────────────────────────────────────
// Cover letter
// ────────────────────────────────────────────────────────────────────────────

pub const COVER_LETTER_SYSTEM: &str = "You are an expert career coach writing on behalf of a \
    candidate. Use only facts present in the candidate's resume. \
    You MUST respond with valid JSON only, no markdown fences.";

/// Replace `{resume_text}` and `{job_description}`.
pub const COVER_LETTER_TEMPLATE: &str = r#"Write a professional, concise, natural-sounding cover letter tailored to the job description below. Highlight skills from the resume; it must not read as machine-written, and it must not claim anything the resume does not support.

Resume:
{resume_text}

Job Description:
{job_description}

Return a JSON object: {"coverLetter": "..."}"#;

// ────────────────────────────────────────────────────────────────────────────
// Skill analysis
// ────────────────────────────────────────────────────────────────────────────

/// Replace `{resume_text}` and `{job_description}`.
pub const SKILL_ANALYSIS_TEMPLATE: &str = r#"Analyze the resume against the job description under a strict non-hallucination policy.

Resume:
{resume_text}

Job Description:
{job_description}

1. Identify the critical skills and keywords in the job description that are missing from the resume.
2. Build `integratedKeywords`: skills from the job description that could realistically be surfaced in a tailored resume because the resume already supports or clearly implies them.
3. Build `missingKeywords`: skills that represent a genuine gap and must NOT be added to the resume.
4. Build `suggestedCertifications`: for each identified gap, suggest a relevant online course or certification. Every `url` must point to a specific, real, reputable course or certification page — never a homepage, search page, or placeholder.

Return a JSON object:
{
  "integratedKeywords": ["..."],
  "missingKeywords": ["..."],
  "suggestedCertifications": [{"name": "...", "url": "https://..."}]
}"#;

// ────────────────────────────────────────────────────────────────────────────
// Interview prep
// ────────────────────────────────────────────────────────────────────────────

/// Replace `{resume_text}` and `{job_description}`.
pub const INTERVIEW_PREP_TEMPLATE: &str = r#"Given the resume and job description below, create a list of likely interview questions with strong, concise answers grounded in the candidate's actual experience.

Resume:
{resume_text}

Job Description:
{job_description}

Return a JSON object: {"interviewQA": [{"question": "...", "answer": "..."}]}"#;

// ────────────────────────────────────────────────────────────────────────────
// Career path
// ────────────────────────────────────────────────────────────────────────────

/// Replace `{resume_text}`.
pub const CAREER_PATH_TEMPLATE: &str = r#"You are an expert career advisor. Analyze the following resume and provide actionable career guidance.

Resume Text:
{resume_text}

1. careerSuggestions: 2-3 potential career paths that align with the candidate's experience and skills, each with a title and a brief description of why it fits.
2. possibleJobPositions: several concrete job titles the candidate could search for right now.
3. suggestedCertifications: certifications or courses that would strengthen the profile for these paths. Every url must be a direct, reputable page — no placeholders or generic homepages.

Return a JSON object:
{
  "careerSuggestions": [{"pathTitle": "...", "pathDescription": "..."}],
  "possibleJobPositions": ["..."],
  "suggestedCertifications": [{"name": "...", "url": "https://..."}]
}"#;

// ────────────────────────────────────────────────────────────────────────────
// Structured extraction
// ────────────────────────────────────────────────────────────────────────────

pub const EXTRACTION_SYSTEM: &str = "You are an expert resume parser. You extract facts exactly \
    as written, never inventing or embellishing. \
    You MUST respond with valid JSON only, no markdown fences.";

/// Replace `{raw_text}`.
pub const EXTRACTION_TEMPLATE: &str = r#"Analyze the following raw resume text and extract the information into a structured JSON object.

- Each experience description must be a single string where every bullet point starts on a new line with '- '.
- Extract certifications into `certifications` and spoken languages into `languages`.
- Content that fits none of basics, education, experience, skills, certifications, or languages goes into `customSections`.
- Extract only what is present in the text. Leave fields empty rather than guessing.

Raw Resume Text:
{raw_text}

Return a JSON object with a single field `resumeJson` whose value is the structured resume as a JSON-encoded STRING with fields: basics {name, email, phone, location, summary, links [{label, url}]}, education [{school, degree, year}], experience [{company, role, years, description}], skills [], certifications [], languages [], customSections [{title, content}]."#;

// ────────────────────────────────────────────────────────────────────────────
// Section polishing
// ────────────────────────────────────────────────────────────────────────────

/// Replace `{resume_section}` and `{current_content}`.
pub const POLISH_TEMPLATE: &str = r#"You will be given one section of a resume and its current content. Enhance it by:

1. Rewriting the content to be more impactful and clear, without adding facts.
2. Suggesting stronger verbs to use.
3. Suggesting metrics the candidate could add to quantify achievements.

Section: {resume_section}
Current Content: {current_content}

Return a JSON object:
{
  "polishedContent": "...",
  "suggestedVerbs": ["..."],
  "suggestedMetrics": ["..."]
}"#;

// ────────────────────────────────────────────────────────────────────────────
// Instant ATS preview
// ────────────────────────────────────────────────────────────────────────────

/// Replace `{resume_text}` and `{job_description}`.
pub const ATS_PREVIEW_TEMPLATE: &str = r#"Provide an instant ATS compatibility preview for the resume and job description below.

Resume:
{resume_text}

Job Description:
{job_description}

Return a JSON object with `atsScore` (an integer 0-100) and `exampleFixes` (2-3 actionable, high-impact fixes as strings):
{"atsScore": 55, "exampleFixes": ["..."]}"#;

// ────────────────────────────────────────────────────────────────────────────
// OCR
// ────────────────────────────────────────────────────────────────────────────

pub const OCR_SYSTEM: &str = "You are an expert at Optical Character Recognition. \
    You transcribe documents faithfully, preserving formatting. \
    You MUST respond with valid JSON only, no markdown fences.";

/// The document page is attached to the message alongside this instruction.
pub const OCR_TEMPLATE: &str = r#"Extract all text from the attached document page. Preserve the formatting as much as possible.

Return a JSON object: {"extractedText": "..."}"#;
