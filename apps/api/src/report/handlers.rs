//! Axum route handlers for the tailoring API.

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::engine;
use crate::errors::{AppError, TaskError};
use crate::extract::extract_resume_text;
use crate::report::{FullReport, Region, RegionsOutcome, TailorResponse};
use crate::schema::{AtsPreviewOutput, PolishOutput, StructuredResume};
use crate::state::AppState;
use crate::tasks::{self, TaskId};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TailorRequest {
    #[serde(default)]
    pub resume_text: String,
    #[serde(default)]
    pub job_description: String,
}

#[derive(Debug, Deserialize)]
pub struct RegionsRequest {
    pub regions: Vec<Region>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureRequest {
    #[serde(default)]
    pub resume_text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureResponse {
    pub resume: StructuredResume,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolishRequest {
    #[serde(default)]
    pub resume_section: String,
    #[serde(default)]
    pub current_content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractResponse {
    pub file_name: String,
    pub resume_text: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/tailor
///
/// Starts or resumes a tailoring session. Returns the session key and the
/// current report; a ready cached report is served instantly while a fresh
/// primary run updates it in the background.
pub async fn handle_tailor(
    State(state): State<AppState>,
    Json(request): Json<TailorRequest>,
) -> Result<Json<TailorResponse>, AppError> {
    let response = state
        .coordinator
        .tailor(&request.resume_text, &request.job_description)
        .await?;
    Ok(Json(response))
}

/// GET /api/v1/tailor/:key
pub async fn handle_get_report(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<FullReport>, AppError> {
    let report = state
        .coordinator
        .get_report(&key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no report for key {key}")))?;
    Ok(Json(report))
}

/// POST /api/v1/tailor/:key/regions
///
/// Requests one or more optional report regions. Already-completed regions
/// are skipped; failures are reported per region, never as a whole-request
/// error.
pub async fn handle_request_regions(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(request): Json<RegionsRequest>,
) -> Result<Json<RegionsOutcome>, AppError> {
    if request.regions.is_empty() {
        return Err(AppError::Validation(
            "at least one region is required".to_string(),
        ));
    }
    let outcome = state
        .coordinator
        .request_regions(&key, &request.regions)
        .await?;
    Ok(Json(outcome))
}

/// POST /api/v1/resume/structure
///
/// Turns raw resume text into a structured document for the builder flow.
pub async fn handle_structure(
    State(state): State<AppState>,
    Json(request): Json<StructureRequest>,
) -> Result<Json<StructureResponse>, AppError> {
    if request.resume_text.trim().is_empty() {
        return Err(TaskError::MissingInput("resumeText".to_string()).into());
    }
    let resume = engine::run_extraction(state.llm.as_ref(), &request.resume_text).await?;
    Ok(Json(StructureResponse { resume }))
}

/// POST /api/v1/resume/polish
pub async fn handle_polish(
    State(state): State<AppState>,
    Json(request): Json<PolishRequest>,
) -> Result<Json<PolishOutput>, AppError> {
    if request.current_content.trim().is_empty() {
        return Err(TaskError::MissingInput("currentContent".to_string()).into());
    }
    let prompt = tasks::render_polish(
        TaskId::Polish.spec().template,
        &request.resume_section,
        &request.current_content,
    );
    let output: PolishOutput =
        engine::run_contract_task(state.llm.as_ref(), TaskId::Polish, &prompt).await?;
    Ok(Json(output))
}

/// POST /api/v1/ats/preview
///
/// Single-shot score preview, cheaper than a full tailoring session.
pub async fn handle_ats_preview(
    State(state): State<AppState>,
    Json(request): Json<TailorRequest>,
) -> Result<Json<AtsPreviewOutput>, AppError> {
    if request.resume_text.trim().is_empty() {
        return Err(TaskError::MissingInput("resumeText".to_string()).into());
    }
    if request.job_description.trim().is_empty() {
        return Err(TaskError::MissingInput("jobDescription".to_string()).into());
    }
    let prompt = tasks::render_pair(
        TaskId::AtsPreview.spec().template,
        &request.resume_text,
        &request.job_description,
    );
    let output: AtsPreviewOutput =
        engine::run_contract_task(state.llm.as_ref(), TaskId::AtsPreview, &prompt).await?;
    Ok(Json(output))
}

/// POST /api/v1/extract
///
/// Multipart upload of a resume file (`file` field). PDFs and images fall
/// back to OCR when direct extraction cannot recover usable text.
pub async fn handle_extract(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ExtractResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("failed to read upload: {e}")))?;
        if bytes.is_empty() {
            return Err(AppError::Validation("uploaded file is empty".to_string()));
        }

        let resume_text = extract_resume_text(state.llm.as_ref(), &file_name, &bytes).await?;
        return Ok(Json(ExtractResponse {
            file_name,
            resume_text,
        }));
    }

    Err(AppError::Validation(
        "multipart field 'file' is required".to_string(),
    ))
}
