use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::copy::fallback_copy_text;
use crate::models::{CopySource, GenerateCopyResponse};

pub const DEMO_KEY: &str = "DEMO_KEY";

const SYSTEM_INSTRUCTION: &str = "You are an expert marketing copywriter. Produce engaging, conversion-focused copy using markdown where appropriate.";

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("HTTP error: {0}")] Http(String),
    #[error("Other: {0}")] Other(String),
}

/// Anything that turns a prompt into text. The Gemini client in production,
/// canned generators in tests.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_text(&self, prompt: &str) -> Result<String, GeminiError>;

    fn is_demo(&self) -> bool { false }
}

pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, base_url: String, model: String, timeout: Duration) -> Self {
        let client = Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
            warn!("⚠️ Falling back to default HTTP client: {}", e);
            Client::new()
        });
        Self { client, api_key, base_url, model }
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate_text(&self, prompt: &str) -> Result<String, GeminiError> {
        if self.is_demo() {
            info!("Using demo mode - generating fallback copy");
            return Ok(fallback_copy_text(prompt));
        }

        info!(model = %self.model, "Generating text with Gemini API...");

        let payload = json!({
            "systemInstruction": { "parts": [{ "text": SYSTEM_INSTRUCTION }] },
            "contents": [{
                "parts": [{"text": format!("Create compelling marketing copy for the following product details:\n\n{prompt}")}]
            }],
            "generationConfig": {
                "temperature": 0.7,
                "topK": 40,
                "topP": 0.95,
                "maxOutputTokens": 450
            }
        });

        let url = format!("{}/models/{}:generateContent?key={}", self.base_url, self.model, self.api_key);

        let response = self.client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| GeminiError::Http(e.to_string()))?;

        let status = response.status();
        let response_text = response.text().await.map_err(|e| GeminiError::Http(e.to_string()))?;

        if !status.is_success() {
            error!("❌ Gemini API text generation failed with status {}: {}", status, response_text);
            return Err(GeminiError::Http(format!("HTTP {}: {}", status, response_text)));
        }

        let parsed: GeminiResponse = serde_json::from_str(&response_text)
            .map_err(|e| GeminiError::Other(format!("Failed to parse response: {}", e)))?;

        first_text(&parsed).ok_or_else(|| GeminiError::Other("No text content found in response".to_string()))
    }

    fn is_demo(&self) -> bool { self.api_key.is_empty() || self.api_key == DEMO_KEY }
}

/// Runs the copy endpoint logic: model first, markdown fallback when the
/// model fails or returns nothing.
pub async fn generate_copy(generator: &dyn TextGenerator, prompt: &str) -> GenerateCopyResponse {
    let prompt = prompt.trim().to_string();
    let mut source = CopySource::Fallback;
    let mut copy = String::new();

    if !generator.is_demo() {
        match generator.generate_text(&prompt).await {
            Ok(text) if !text.trim().is_empty() => {
                copy = text.trim().to_string();
                source = CopySource::Gemini;
            }
            Ok(_) => warn!("⚠️ Model returned empty copy, using fallback copy instead"),
            Err(e) => error!("❌ Copy generation failed, using fallback copy instead: {}", e),
        }
    }

    if copy.is_empty() {
        copy = fallback_copy_text(&prompt);
    }

    info!(source = ?source, chars = copy.len(), "✅ Copy generated");
    GenerateCopyResponse { copy, prompt, source, generated_at: Utc::now() }
}

// --- Response Parsing Helpers ---

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate { #[serde(default)] content: Content }

#[derive(Debug, Deserialize, Default)]
struct Content { #[serde(default)] parts: Vec<Part> }

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    Other(serde_json::Value),
}

fn first_text(resp: &GeminiResponse) -> Option<String> {
    resp.candidates
        .iter()
        .flat_map(|c| c.content.parts.iter())
        .find_map(|p| match p {
            Part::Text { text } => Some(text.trim().to_string()),
            Part::Other(_) => None,
        })
}
