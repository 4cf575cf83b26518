//! Task execution engine — decode, validate, repair, retry.
//!
//! Every model call goes output-first through the same funnel: strip fences,
//! reject empty output, parse JSON, deserialize into the task's contract,
//! validate. The primary tailoring task additionally repairs the embedded
//! resume and re-runs the whole pipeline a bounded number of times when the
//! result is unusable. Secondary tasks get exactly one attempt; their caller
//! treats failure as a degraded report, not a fatal one.

use serde_json::Value;
use std::future::Future;
use tracing::{info, warn};

use crate::errors::TaskError;
use crate::llm::{self, Attachment, ModelClient, ModelRequest};
use crate::repair::repair_structured_resume;
use crate::schema::{AtsScoreBreakdown, Contract, StructuredResume, ValidationError};
use crate::tasks::{self, TaskId};

/// Total attempts for the primary task. Attempt 1 plus one immediate re-ask;
/// transient transport failures are already absorbed below this layer.
pub const PRIMARY_MAX_ATTEMPTS: u32 = 2;

/// Outcome of a bounded retry loop, attempt count included for logging.
#[derive(Debug)]
pub enum Retried<T, E> {
    Success { value: T, attempts: u32 },
    Exhausted { error: E, attempts: u32 },
}

/// Runs `attempt` up to `max_attempts` times (at least once) with no delay
/// between attempts. The closure receives the 1-based attempt number.
pub async fn with_retry<T, E, F, Fut>(max_attempts: u32, mut attempt: F) -> Retried<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = max_attempts.max(1);
    let mut last_error = None;
    for n in 1..=max_attempts {
        match attempt(n).await {
            Ok(value) => return Retried::Success { value, attempts: n },
            Err(error) => last_error = Some(error),
        }
    }
    match last_error {
        Some(error) => Retried::Exhausted {
            error,
            attempts: max_attempts,
        },
        // max_attempts >= 1, so the loop body ran at least once.
        None => unreachable!(),
    }
}

/// Decodes raw model output into a validated contract value. Output that is
/// not JSON at all is a parse failure; JSON that does not fit the contract's
/// shape is a validation failure, same as a field failing `validate`.
pub fn decode_contract<T: Contract>(raw: &str) -> Result<T, TaskError> {
    let stripped = llm::strip_json_fences(raw);
    if stripped.is_empty() {
        return Err(TaskError::EmptyModelOutput);
    }
    let value: Value = serde_json::from_str(stripped)?;
    let parsed: T = serde_json::from_value(value)
        .map_err(|e| ValidationError::new("output", e.to_string()))?;
    parsed.validate()?;
    Ok(parsed)
}

/// Runs a single-shot task end to end: one model call, one decode.
pub async fn run_contract_task<T: Contract>(
    llm: &dyn ModelClient,
    id: TaskId,
    prompt: &str,
) -> Result<T, TaskError> {
    let spec = id.spec();
    let raw = llm
        .complete(ModelRequest {
            model: spec.model,
            system: spec.system,
            prompt,
            temperature: spec.temperature,
            attachment: None,
        })
        .await?;
    decode_contract(&raw)
}

// ────────────────────────────────────────────────────────────────────────────
// Primary task
// ────────────────────────────────────────────────────────────────────────────

/// Fully processed result of the primary task: scores plus the repaired,
/// validated, render-ready resume.
#[derive(Debug, Clone)]
pub struct TailoringResult {
    pub initial_ats_score: u8,
    pub tailored_ats_score: u8,
    pub ats_score_breakdown: AtsScoreBreakdown,
    pub resume: StructuredResume,
}

async fn attempt_tailoring(
    llm: &dyn ModelClient,
    prompt: &str,
) -> Result<TailoringResult, TaskError> {
    let output: crate::schema::TailoringOutput =
        run_contract_task(llm, TaskId::Tailoring, prompt).await?;

    // The resume travels as a JSON-encoded string inside the outer object.
    let embedded: Value = serde_json::from_str(&output.tailored_resume_json)?;
    let resume = repair_structured_resume(&embedded);
    resume.validate()?;
    if !resume.is_ready() {
        return Err(TaskError::IncompleteResume);
    }

    Ok(TailoringResult {
        initial_ats_score: output.initial_ats_score,
        tailored_ats_score: output.tailored_ats_score,
        ats_score_breakdown: output.ats_score_breakdown,
        resume,
    })
}

/// Runs the tailoring task with the bounded re-ask loop. Any failure mode,
/// from malformed JSON to a repaired-but-empty resume, consumes one attempt.
pub async fn run_tailoring(
    llm: &dyn ModelClient,
    resume_text: &str,
    job_description: &str,
) -> Result<TailoringResult, TaskError> {
    let prompt = tasks::render_pair(
        TaskId::Tailoring.spec().template,
        resume_text,
        job_description,
    );

    match with_retry(PRIMARY_MAX_ATTEMPTS, |_| attempt_tailoring(llm, &prompt)).await {
        Retried::Success { value, attempts } => {
            info!("tailoring succeeded on attempt {attempts}");
            Ok(value)
        }
        Retried::Exhausted { error, attempts } => {
            warn!("tailoring exhausted {attempts} attempts: {error}");
            Err(error)
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Extraction and OCR
// ────────────────────────────────────────────────────────────────────────────

/// Structured extraction for the builder flow. Strict by design: the input is
/// the user's own resume text, so a parse failure means the model misbehaved
/// and the caller should surface it, not paper over it with repair.
pub async fn run_extraction(
    llm: &dyn ModelClient,
    raw_text: &str,
) -> Result<StructuredResume, TaskError> {
    let prompt = tasks::render_single(TaskId::Extraction.spec().template, "{raw_text}", raw_text);
    let output: crate::schema::ExtractionOutput =
        run_contract_task(llm, TaskId::Extraction, &prompt).await?;

    let resume: StructuredResume = serde_json::from_str(&output.resume_json)?;
    resume.validate()?;
    Ok(resume)
}

/// Transcribes one attached page. Accepts a `data:` URI; PDFs ride as
/// document blocks, everything else as image blocks.
pub async fn run_ocr(llm: &dyn ModelClient, data_uri: &str) -> Result<String, TaskError> {
    let (media_type, data) = llm::parse_data_uri(data_uri)
        .ok_or_else(|| TaskError::MissingInput("a base64 data URI is required".to_string()))?;

    let attachment = if media_type == "application/pdf" {
        Attachment::Document { media_type, data }
    } else {
        Attachment::Image { media_type, data }
    };

    let spec = TaskId::Ocr.spec();
    let raw = llm
        .complete(ModelRequest {
            model: spec.model,
            system: spec.system,
            prompt: spec.template,
            temperature: spec.temperature,
            attachment: Some(attachment),
        })
        .await?;
    let output: crate::schema::OcrOutput = decode_contract(&raw)?;
    Ok(output.extracted_text)
}
