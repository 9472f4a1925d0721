use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::json;

use super::{AiService, AnalysisResult, build_prompt, parse_ai_response, response_schema};
use crate::config::GeminiConfig;

const SYSTEM_INSTRUCTION: &str = "You are an expert photo metadata analyst. All your responses must use Canadian English spelling (e.g., 'colour', 'centre').";

pub struct GeminiService {
    api_key: String,
    model: String,
    client: Client,
}

impl GeminiService {
    /// Create a service from explicit configuration.
    ///
    /// Fails when no real API key is configured, so a missing key surfaces
    /// before any image is read.
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        if !config.has_api_key() {
            anyhow::bail!(
                "Gemini API key not configured. Set `gemini.api_key` in config.json or the GEMINI_API_KEY environment variable."
            );
        }
        Ok(Self {
            api_key: config.api_key.trim().to_string(),
            model: config.model.clone(),
            client: Client::new(),
        })
    }

    fn request_body(image_base64: &str, mime_type: &str, location: Option<&str>) -> serde_json::Value {
        json!({
            "contents": [
                {
                    "parts": [
                        { "text": build_prompt(location) },
                        {
                            "inline_data": {
                                "mime_type": mime_type,
                                "data": image_base64
                            }
                        }
                    ]
                }
            ],
            "systemInstruction": {
                "parts": [{ "text": SYSTEM_INSTRUCTION }]
            },
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": response_schema()
            }
        })
    }
}

#[async_trait::async_trait]
impl AiService for GeminiService {
    fn name(&self) -> &str {
        "Gemini"
    }

    async fn analyze(
        &self,
        image_base64: &str,
        mime_type: &str,
        location: Option<&str>,
    ) -> Result<AnalysisResult> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(image_base64, mime_type, location))
            .send()
            .await
            .context("Gemini request failed")?;

        let status = resp.status();
        let text = resp.text().await.context("Failed to read Gemini response")?;

        if !status.is_success() {
            anyhow::bail!("Gemini API error ({}): {}", status, text);
        }

        let json: serde_json::Value =
            serde_json::from_str(&text).context("Failed to parse Gemini response JSON")?;

        let content = json["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .context("No content in Gemini response")?;

        parse_ai_response(content).context("Failed to analyze image")
    }
}
