//! Task definitions — one named unit per model capability.
//!
//! A task binds a model identifier, a system prompt, an instruction template,
//! and optional sampling configuration. Input and output contracts live in
//! `schema`; the engine ties a task to its contract when it runs it.

pub mod prompts;

/// The model used for all tasks. Intentionally a single constant so new task
/// definitions cannot drift onto a different model by accident.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskId {
    /// The primary task: tailored resume plus both ATS scores.
    Tailoring,
    CoverLetter,
    SkillAnalysis,
    InterviewPrep,
    CareerPath,
    /// Raw resume text into a structured document, for the builder flow.
    Extraction,
    /// Per-section rewrite with verb/metric suggestions.
    Polish,
    /// Instant score preview, single shot.
    AtsPreview,
    /// Image or PDF page into raw text.
    Ocr,
}

/// A fully bound task definition.
#[derive(Debug, Clone, Copy)]
pub struct TaskSpec {
    pub id: TaskId,
    pub model: &'static str,
    pub temperature: Option<f32>,
    pub system: &'static str,
    pub template: &'static str,
}

impl TaskId {
    pub fn spec(self) -> TaskSpec {
        match self {
            TaskId::Tailoring => TaskSpec {
                id: self,
                model: DEFAULT_MODEL,
                temperature: Some(0.2),
                system: prompts::TAILORING_SYSTEM,
                template: prompts::TAILORING_TEMPLATE,
            },
            TaskId::CoverLetter => TaskSpec {
                id: self,
                model: DEFAULT_MODEL,
                temperature: Some(0.7),
                system: prompts::COVER_LETTER_SYSTEM,
                template: prompts::COVER_LETTER_TEMPLATE,
            },
            TaskId::SkillAnalysis => TaskSpec {
                id: self,
                model: DEFAULT_MODEL,
                temperature: None,
                system: prompts::JSON_ONLY_SYSTEM,
                template: prompts::SKILL_ANALYSIS_TEMPLATE,
            },
            TaskId::InterviewPrep => TaskSpec {
                id: self,
                model: DEFAULT_MODEL,
                temperature: None,
                system: prompts::JSON_ONLY_SYSTEM,
                template: prompts::INTERVIEW_PREP_TEMPLATE,
            },
            TaskId::CareerPath => TaskSpec {
                id: self,
                model: DEFAULT_MODEL,
                temperature: None,
                system: prompts::JSON_ONLY_SYSTEM,
                template: prompts::CAREER_PATH_TEMPLATE,
            },
            TaskId::Extraction => TaskSpec {
                id: self,
                model: DEFAULT_MODEL,
                temperature: Some(0.0),
                system: prompts::EXTRACTION_SYSTEM,
                template: prompts::EXTRACTION_TEMPLATE,
            },
            TaskId::Polish => TaskSpec {
                id: self,
                model: DEFAULT_MODEL,
                temperature: None,
                system: prompts::JSON_ONLY_SYSTEM,
                template: prompts::POLISH_TEMPLATE,
            },
            TaskId::AtsPreview => TaskSpec {
                id: self,
                model: DEFAULT_MODEL,
                temperature: None,
                system: prompts::JSON_ONLY_SYSTEM,
                template: prompts::ATS_PREVIEW_TEMPLATE,
            },
            TaskId::Ocr => TaskSpec {
                id: self,
                model: DEFAULT_MODEL,
                temperature: Some(0.0),
                system: prompts::OCR_SYSTEM,
                template: prompts::OCR_TEMPLATE,
            },
        }
    }
}

/// Fills a (resumeText, jobDescription) template. Tailoring templates also
/// carry the shared non-hallucination block.
pub fn render_pair(template: &str, resume_text: &str, job_description: &str) -> String {
    template
        .replace("{no_hallucination_rules}", prompts::NO_HALLUCINATION_RULES)
        .replace("{resume_text}", resume_text)
        .replace("{job_description}", job_description)
}

/// Fills a single-placeholder template.
pub fn render_single(template: &str, placeholder: &str, value: &str) -> String {
    template.replace(placeholder, value)
}

/// Fills the section-polishing template.
pub fn render_polish(template: &str, resume_section: &str, current_content: &str) -> String {
    template
        .replace("{resume_section}", resume_section)
        .replace("{current_content}", current_content)
}
