//! LLM client — the single point of entry for all model calls.
//!
//! No other module may talk to the provider directly; everything goes through
//! the `ModelClient` trait. The production implementation wraps the Anthropic
//! Messages API with transport-level retry (429/5xx, exponential backoff).
//! The bounded *logical* retry for the primary task lives in `engine`, not
//! here: identical inputs may yield different outputs between calls, so the
//! engine re-asks; this layer only survives transient transport failures.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 8192;
const TRANSPORT_MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },
}

/// A non-text payload attached to the prompt (OCR input).
#[derive(Debug, Clone, Copy)]
pub enum Attachment<'a> {
    Image { media_type: &'a str, data: &'a str },
    Document { media_type: &'a str, data: &'a str },
}

/// One fully-specified model invocation.
#[derive(Debug, Clone, Copy)]
pub struct ModelRequest<'a> {
    pub model: &'a str,
    pub system: &'a str,
    pub prompt: &'a str,
    pub temperature: Option<f32>,
    pub attachment: Option<Attachment<'a>>,
}

/// The provider seam. Production uses `AnthropicClient`; tests script a fake.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Sends one request and returns the model's raw text output. An empty
    /// string means the provider returned no usable text payload.
    async fn complete(&self, request: ModelRequest<'_>) -> Result<String, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    messages: Vec<ApiMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    Image { source: MediaSource<'a> },
    Document { source: MediaSource<'a> },
}

#[derive(Debug, Serialize)]
struct MediaSource<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ContentBlock>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

impl ApiResponse {
    fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Anthropic implementation
// ────────────────────────────────────────────────────────────────────────────

/// Production client for the Anthropic Messages API.
#[derive(Clone)]
pub struct AnthropicClient {
    client: Client,
    api_key: String,
}

impl AnthropicClient {
    pub fn new(api_key: String) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()?,
            api_key,
        })
    }

    fn build_body<'a>(request: &ModelRequest<'a>) -> ApiRequest<'a> {
        let mut content = Vec::with_capacity(2);
        match request.attachment {
            Some(Attachment::Image { media_type, data }) => content.push(ContentPart::Image {
                source: MediaSource {
                    kind: "base64",
                    media_type,
                    data,
                },
            }),
            Some(Attachment::Document { media_type, data }) => {
                content.push(ContentPart::Document {
                    source: MediaSource {
                        kind: "base64",
                        media_type,
                        data,
                    },
                })
            }
            None => {}
        }
        content.push(ContentPart::Text {
            text: request.prompt,
        });

        ApiRequest {
            model: request.model,
            max_tokens: MAX_TOKENS,
            system: request.system,
            temperature: request.temperature,
            messages: vec![ApiMessage {
                role: "user",
                content,
            }],
        }
    }
}

#[async_trait]
impl ModelClient for AnthropicClient {
    async fn complete(&self, request: ModelRequest<'_>) -> Result<String, LlmError> {
        let body = Self::build_body(&request);
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..TRANSPORT_MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "model call attempt {} failed, retrying after {}ms",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let message = response.text().await.unwrap_or_default();
                warn!("model API returned {status}: {message}");
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
                continue;
            }

            if !status.is_success() {
                let raw = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ApiError>(&raw)
                    .map(|e| e.error.message)
                    .unwrap_or(raw);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let parsed: ApiResponse = response.json().await?;
            debug!(
                "model call succeeded: input_tokens={}, output_tokens={}",
                parsed.usage.input_tokens, parsed.usage.output_tokens
            );
            return Ok(parsed.text().unwrap_or_default().to_string());
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: TRANSPORT_MAX_RETRIES,
        }))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Text utilities
// ────────────────────────────────────────────────────────────────────────────

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

/// Splits a `data:<media>;base64,<payload>` URI into media type and payload.
pub fn parse_data_uri(uri: &str) -> Option<(&str, &str)> {
    let rest = uri.strip_prefix("data:")?;
    let (meta, data) = rest.split_once(',')?;
    let media_type = meta.strip_suffix(";base64")?;
    if media_type.is_empty() || data.is_empty() {
        return None;
    }
    Some((media_type, data))
}
