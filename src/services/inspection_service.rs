// src/services/inspection_service.rs
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::{Value, json};
use thiserror::Error;

use crate::{config::DEFAULT_GEMINI_URL, errors::SurplusError as AppError, models::inspection::FreshnessReport};

const INSPECTOR_PROMPT: &str = "You are a Food Safety Inspector. Analyze this image. \
Return valid, strictly valid JSON only (no markdown code blocks, just the raw JSON object). \
The JSON structure must be: \
{ \"is_safe\": boolean, \"freshness_score\": number (1-10), \
\"detected_category\": string (Enum: 'Cooked', 'Raw', 'Packaged'), \"reasoning\": string }.";

#[derive(Debug, Error)]
pub enum InspectionError {
    #[error("AI service rate limited")]
    RateLimited,

    #[error("AI service unavailable: {0}")]
    Unavailable(String),

    #[error("Unparsable AI response")]
    Unparsable { raw: String },
}

impl From<InspectionError> for AppError {
    fn from(error: InspectionError) -> Self {
        match error {
            InspectionError::RateLimited => AppError::AiRateLimited,
            InspectionError::Unavailable(msg) => AppError::AiUnavailable(msg),
            InspectionError::Unparsable { raw } => AppError::AiResponseInvalid { raw },
        }
    }
}

#[async_trait]
pub trait FoodInspector: Send + Sync {
    async fn inspect(&self, image: &[u8], mime_type: &str) -> Result<FreshnessReport, AppError>;
}

/// Strips markdown fences the model sometimes wraps its JSON in.
pub fn clean_response(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

pub fn parse_report(text: &str) -> Result<FreshnessReport, InspectionError> {
    serde_json::from_str(&clean_response(text)).map_err(|e| {
        tracing::error!("AI Response Parsing Error: {} Raw text: {}", e, text);
        InspectionError::Unparsable { raw: text.to_string() }
    })
}

/// Concatenated text parts of the first candidate.
fn candidate_text(body: &Value) -> Option<String> {
    let parts = body
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();
    Some(text)
}

pub struct GeminiInspector {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiInspector {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_GEMINI_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    async fn generate(&self, image: &[u8], mime_type: &str) -> Result<String, InspectionError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let request = json!({
            "contents": [{
                "parts": [
                    { "text": INSPECTOR_PROMPT },
                    { "inline_data": { "mime_type": mime_type, "data": STANDARD.encode(image) } },
                ]
            }]
        });

        let response = self
            .client
            .post(url)
            .query(&[("key", &self.api_key)])
            .json(&request)
            .send()
            .await
            .map_err(|e| InspectionError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!("Gemini API rate limited");
            return Err(InspectionError::RateLimited);
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Gemini API Error ({}): {}", status, error_text);
            return Err(InspectionError::Unavailable(format!("{}: {}", status, error_text)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| InspectionError::Unavailable(e.to_string()))?;

        candidate_text(&body).ok_or_else(|| InspectionError::Unparsable { raw: body.to_string() })
    }
}

#[async_trait]
impl FoodInspector for GeminiInspector {
    async fn inspect(&self, image: &[u8], mime_type: &str) -> Result<FreshnessReport, AppError> {
        if image.is_empty() {
            return Err(AppError::bad_request("No image provided"));
        }

        tracing::info!("Inspecting {} byte image with {}", image.len(), self.model);
        let text = self.generate(image, mime_type).await?;
        Ok(parse_report(&text)?)
    }
}

// Mock inspector for development and testing
#[derive(Debug, Default)]
pub struct MockInspector;

#[async_trait]
impl FoodInspector for MockInspector {
    async fn inspect(&self, image: &[u8], mime_type: &str) -> Result<FreshnessReport, AppError> {
        if image.is_empty() {
            return Err(AppError::bad_request("No image provided"));
        }

        tracing::info!("[MOCK] Would inspect {} byte {} image", image.len(), mime_type);
        Ok(FreshnessReport {
            is_safe: true,
            freshness_score: 8.0,
            detected_category: "Cooked".to_string(),
            reasoning: "Demo inspection: food looks fresh and well stored.".to_string(),
        })
    }
}
