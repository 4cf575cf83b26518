//! Resume text extraction from uploaded files.
//!
//! PDFs go through direct text extraction first; scanned PDFs yield little or
//! no text that way, so anything under the threshold falls back to the OCR
//! task with the document attached. Images always go straight to OCR. Other
//! uploads are treated as plain text.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::{info, warn};

use crate::engine;
use crate::errors::TaskError;
use crate::llm::ModelClient;

/// Direct PDF extraction under this many characters means the document is
/// probably scanned and needs OCR.
pub const OCR_FALLBACK_THRESHOLD: usize = 100;

fn extension(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default()
}

fn image_media_type(ext: &str) -> Option<&'static str> {
    match ext {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

fn data_uri(media_type: &str, bytes: &[u8]) -> String {
    format!("data:{media_type};base64,{}", STANDARD.encode(bytes))
}

/// Extracts raw resume text from an uploaded file.
pub async fn extract_resume_text(
    llm: &dyn ModelClient,
    file_name: &str,
    bytes: &[u8],
) -> Result<String, TaskError> {
    let ext = extension(file_name);

    if ext == "pdf" {
        match pdf_extract::extract_text_from_mem(bytes) {
            Ok(text) if text.trim().len() >= OCR_FALLBACK_THRESHOLD => {
                info!("extracted {} chars from PDF directly", text.trim().len());
                return Ok(text);
            }
            Ok(text) => {
                info!(
                    "direct PDF extraction yielded only {} chars, falling back to OCR",
                    text.trim().len()
                );
            }
            Err(e) => {
                warn!("direct PDF extraction failed, falling back to OCR: {e}");
            }
        }
        return engine::run_ocr(llm, &data_uri("application/pdf", bytes)).await;
    }

    if let Some(media_type) = image_media_type(&ext) {
        return engine::run_ocr(llm, &data_uri(media_type, bytes)).await;
    }

    Ok(String::from_utf8_lossy(bytes).into_owned())
}
