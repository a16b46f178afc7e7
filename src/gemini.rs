use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::models::{Photo, StyleParams, StyleReport};
use crate::prompts::{hair_collage_prompt, style_report_prompt};
use crate::stylist::{GeneratedImage, StyleModel};

const ERROR_BODY_LIMIT: usize = 500;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("request to model failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("model returned no text")]
    EmptyResponse,

    #[error("model returned an invalid style report: {0}")]
    InvalidReport(#[from] serde_json::Error),

    #[error("model returned undecodable image data: {0}")]
    InvalidImageData(#[from] base64::DecodeError),
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    parts: Option<Vec<GeminiPart>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData", alias = "inline_data")]
        inline_data: GeminiInlineData,
    },
    #[allow(dead_code)]
    Other(Value),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    #[serde(alias = "mime_type")]
    mime_type: String,
    data: String,
}

impl GeminiResponse {
    fn parts(&self) -> impl Iterator<Item = &GeminiPart> {
        self.candidates
            .iter()
            .flatten()
            .filter_map(|c| c.content.as_ref())
            .filter_map(|c| c.parts.as_ref())
            .flatten()
    }

    fn text(&self) -> String {
        self.parts()
            .filter_map(|part| match part {
                GeminiPart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    fn images(&self) -> Result<Vec<GeneratedImage>, ModelError> {
        self.parts()
            .filter_map(|part| match part {
                GeminiPart::InlineData { inline_data } if inline_data.mime_type.starts_with("image/") => {
                    Some(inline_data)
                }
                _ => None,
            })
            .map(|inline| -> Result<GeneratedImage, ModelError> {
                Ok(GeneratedImage {
                    mime_type: inline.mime_type.clone(),
                    bytes: general_purpose::STANDARD.decode(&inline.data)?,
                })
            })
            .collect()
    }
}

fn truncate_for_log(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let truncated: String = value.chars().take(limit).collect();
    format!("{truncated}... (truncated)")
}

// Prefer the API's own error message over the raw body
fn error_message(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    serde_json::from_str::<Value>(trimmed)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(|v| v.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| truncate_for_log(trimmed, ERROR_BODY_LIMIT))
}

/// Removes a surrounding markdown code fence (```json ... ```), which the model
/// sometimes adds even in JSON mode.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    text_model: String,
    image_model: String,
}

impl GeminiClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        text_model: &str,
        image_model: &str,
        timeout: Duration,
    ) -> Result<Self, ModelError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            text_model: text_model.to_string(),
            image_model: image_model.to_string(),
        })
    }

    async fn generate_content(&self, model: &str, payload: &Value) -> Result<GeminiResponse, ModelError> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        Ok(response.json::<GeminiResponse>().await?)
    }
}

fn photo_part(photo: &Photo) -> Value {
    json!({
        "inline_data": {
            "mime_type": photo.mime_type,
            "data": general_purpose::STANDARD.encode(&photo.bytes),
        }
    })
}

#[async_trait]
impl StyleModel for GeminiClient {
    async fn style_report(&self, photo: &Photo, params: &StyleParams) -> Result<StyleReport, ModelError> {
        let payload = json!({
            "contents": [{
                "parts": [{ "text": style_report_prompt(params) }, photo_part(photo)]
            }],
            "generationConfig": {
                "temperature": 0.7,
                "responseMimeType": "application/json"
            }
        });

        let response = self.generate_content(&self.text_model, &payload).await?;
        let text = response.text();
        if text.trim().is_empty() {
            return Err(ModelError::EmptyResponse);
        }

        let report: StyleReport = serde_json::from_str(strip_code_fences(&text)).inspect_err(|err| {
            warn!(
                "Style report did not match schema: {err}; preview: {}",
                truncate_for_log(&text, 200)
            )
        })?;
        debug!(
            outfits = report.outfits.len(),
            hairstyles = report.hairstyles.len(),
            "Style report parsed"
        );
        Ok(report)
    }

    async fn hair_images(&self, photo: &Photo, hairstyles: &[String]) -> Result<Vec<GeneratedImage>, ModelError> {
        let payload = json!({
            "contents": [{
                "parts": [{ "text": hair_collage_prompt(hairstyles) }, photo_part(photo)]
            }],
            "generationConfig": {
                "responseModalities": ["TEXT", "IMAGE"]
            }
        });

        let response = self.generate_content(&self.image_model, &payload).await?;
        let images = response.images()?;
        debug!(count = images.len(), "Image model returned images");
        Ok(images)
    }
}
