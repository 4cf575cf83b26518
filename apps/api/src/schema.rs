//! Schema layer — the structured-output contracts for every model task.
//!
//! Each contract is a plain serde type whose field names match the JSON the
//! model is instructed to emit (camelCase on the wire). `validate()` checks
//! structure only — ranges, URL shape, required non-emptiness — never whether
//! the content is truthful. Semantic grounding is enforced in the prompts.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

/// A structural validation failure, pointing at the offending field.
#[derive(Debug, Clone, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A task output contract: deserializable from the model's JSON and
/// structurally validatable. The engine parses then validates, in that order.
pub trait Contract: DeserializeOwned {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Accepted URL shapes for resume links: absolute http(s) or mailto.
pub fn is_valid_link(url: &str) -> bool {
    let url = url.trim();
    url.starts_with("http://") || url.starts_with("https://") || url.starts_with("mailto:")
}

fn check_score(field: &str, score: u8) -> Result<(), ValidationError> {
    if score > 100 {
        return Err(ValidationError::new(
            field,
            format!("score {score} is out of the 0-100 range"),
        ));
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Structured resume document
// ────────────────────────────────────────────────────────────────────────────

/// One labeled link in the basics section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeLink {
    pub label: String,
    pub url: String,
}

/// Identity and contact block of a resume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Basics {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub summary: String,
    /// Self-contained encoded image (data URI). Omitted from JSON when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    pub links: Vec<ResumeLink>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
    pub school: String,
    pub degree: String,
    pub year: String,
}

/// One employment entry. `description` is a newline-joined list of bullet
/// lines, each prefixed with `"- "` once the document has been repaired.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Experience {
    pub company: String,
    pub role: String,
    pub years: String,
    pub description: String,
}

impl Experience {
    /// Non-empty bullet lines of the description.
    pub fn bullet_lines(&self) -> impl Iterator<Item = &str> {
        self.description
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomSection {
    pub title: String,
    pub content: String,
}

/// The canonical resume document. Every array field defaults to empty so a
/// partially-populated JSON object still parses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StructuredResume {
    pub basics: Basics,
    pub education: Vec<Education>,
    pub experience: Vec<Experience>,
    pub skills: Vec<String>,
    pub certifications: Vec<String>,
    pub languages: Vec<String>,
    pub custom_sections: Vec<CustomSection>,
}

impl StructuredResume {
    /// The resume-ready gate: at least one experience entry, and every
    /// experience entry carries at least one non-empty bullet line.
    pub fn is_ready(&self) -> bool {
        !self.experience.is_empty()
            && self
                .experience
                .iter()
                .all(|exp| exp.bullet_lines().next().is_some())
    }
}

impl Contract for StructuredResume {
    fn validate(&self) -> Result<(), ValidationError> {
        for (i, link) in self.basics.links.iter().enumerate() {
            if !is_valid_link(&link.url) {
                return Err(ValidationError::new(
                    format!("basics.links[{i}].url"),
                    format!("'{}' is not an http(s) or mailto URI", link.url),
                ));
            }
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// ATS scoring
// ────────────────────────────────────────────────────────────────────────────

/// One scored dimension of the ATS breakdown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreDetail {
    pub score: u8,
    pub analysis: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AtsScoreBreakdown {
    pub role_match: ScoreDetail,
    pub experience_match: ScoreDetail,
    pub skills_match: ScoreDetail,
}

impl AtsScoreBreakdown {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_score("atsScoreBreakdown.roleMatch.score", self.role_match.score)?;
        check_score(
            "atsScoreBreakdown.experienceMatch.score",
            self.experience_match.score,
        )?;
        check_score("atsScoreBreakdown.skillsMatch.score", self.skills_match.score)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Task output contracts
// ────────────────────────────────────────────────────────────────────────────

/// Raw output of the primary tailoring task. The resume arrives as an opaque
/// JSON string and goes through repair before it becomes a `StructuredResume`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TailoringOutput {
    pub initial_ats_score: u8,
    pub tailored_ats_score: u8,
    pub ats_score_breakdown: AtsScoreBreakdown,
    pub tailored_resume_json: String,
}

impl Contract for TailoringOutput {
    fn validate(&self) -> Result<(), ValidationError> {
        check_score("initialAtsScore", self.initial_ats_score)?;
        check_score("tailoredAtsScore", self.tailored_ats_score)?;
        self.ats_score_breakdown.validate()?;
        if self.tailored_resume_json.trim().is_empty() {
            return Err(ValidationError::new(
                "tailoredResumeJson",
                "embedded resume JSON is empty",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverLetterOutput {
    pub cover_letter: String,
}

impl Contract for CoverLetterOutput {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.cover_letter.trim().is_empty() {
            return Err(ValidationError::new("coverLetter", "letter text is empty"));
        }
        Ok(())
    }
}

/// A suggested course or certification with a direct link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certification {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillAnalysisOutput {
    pub integrated_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub suggested_certifications: Vec<Certification>,
}

impl Contract for SkillAnalysisOutput {
    fn validate(&self) -> Result<(), ValidationError> {
        for (i, cert) in self.suggested_certifications.iter().enumerate() {
            if !cert.url.starts_with("http://") && !cert.url.starts_with("https://") {
                return Err(ValidationError::new(
                    format!("suggestedCertifications[{i}].url"),
                    format!("'{}' is not an absolute http(s) URL", cert.url),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewPrepOutput {
    #[serde(rename = "interviewQA")]
    pub interview_qa: Vec<QaPair>,
}

impl Contract for InterviewPrepOutput {
    fn validate(&self) -> Result<(), ValidationError> {
        for (i, qa) in self.interview_qa.iter().enumerate() {
            if qa.question.trim().is_empty() {
                return Err(ValidationError::new(
                    format!("interviewQA[{i}].question"),
                    "question is empty",
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerSuggestion {
    pub path_title: String,
    pub path_description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerPathOutput {
    pub career_suggestions: Vec<CareerSuggestion>,
    pub suggested_certifications: Vec<Certification>,
    pub possible_job_positions: Vec<String>,
}

impl Contract for CareerPathOutput {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.career_suggestions.is_empty() {
            return Err(ValidationError::new(
                "careerSuggestions",
                "at least one career suggestion is required",
            ));
        }
        Ok(())
    }
}

/// Structured-extraction output: the resume arrives as an opaque JSON string,
/// decoded and validated strictly (no repair stage for extraction).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionOutput {
    pub resume_json: String,
}

impl Contract for ExtractionOutput {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.resume_json.trim().is_empty() {
            return Err(ValidationError::new("resumeJson", "embedded resume JSON is empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolishOutput {
    pub polished_content: String,
    pub suggested_verbs: Vec<String>,
    pub suggested_metrics: Vec<String>,
}

impl Contract for PolishOutput {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.polished_content.trim().is_empty() {
            return Err(ValidationError::new("polishedContent", "polished text is empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrOutput {
    pub extracted_text: String,
}

impl Contract for OcrOutput {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtsPreviewOutput {
    pub ats_score: u8,
    pub example_fixes: Vec<String>,
}

impl Contract for AtsPreviewOutput {
    fn validate(&self) -> Result<(), ValidationError> {
        check_score("atsScore", self.ats_score)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
