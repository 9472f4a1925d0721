mod gemini;

pub use gemini::GeminiService;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Number of keyword tags requested from the model.
pub const TAG_COUNT: usize = 20;

/// Structured metadata returned by AI vision analysis.
///
/// `title`, `description` and `tags` are always requested. `latitude` and
/// `longitude` are only asked for when the user supplied a location, and the
/// model may still leave them out. `location` is never produced by the model:
/// it is the user's own text, attached with [`AnalysisResult::with_location`].
///
/// Coordinates are decimal degrees; presence (not zero) is what counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AnalysisResult {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl AnalysisResult {
    /// Attach the user-supplied location. Blank text clears it.
    pub fn with_location(mut self, location: Option<&str>) -> Self {
        self.location = location
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from);
        self
    }

    /// Both coordinates, when the model supplied both as finite numbers.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
            _ => None,
        }
    }
}

/// Trait for AI vision services.
///
/// The crate ships [`GeminiService`]; tests and alternative backends
/// implement this directly.
#[async_trait::async_trait]
pub trait AiService: Send + Sync {
    /// The display name of this service (e.g., "Gemini").
    fn name(&self) -> &str;
    /// Analyze a base64-encoded image and return structured metadata.
    ///
    /// * `image_base64`: The image bytes encoded as base64
    /// * `mime_type`: The MIME type of the image (e.g., `"image/jpeg"`)
    /// * `location`: Where the photo was taken, if the user said so
    async fn analyze(
        &self,
        image_base64: &str,
        mime_type: &str,
        location: Option<&str>,
    ) -> Result<AnalysisResult>;
}

/// Build the analysis prompt.
///
/// With a location, the model is also asked for that location's coordinates.
pub fn build_prompt(location: Option<&str>) -> String {
    match location.map(str::trim).filter(|l| !l.is_empty()) {
        Some(location) => format!(
            "Analyze this image, which was taken in or around \"{location}\". Generate a title, description, and meta tags. Also, provide the GPS latitude and longitude for \"{location}\". The response must follow the provided JSON schema."
        ),
        None => "Analyze this image and generate a title, description, and meta tags based on the provided JSON schema. Ensure the response strictly follows the schema.".to_string(),
    }
}

/// JSON schema the model's response must follow.
pub fn response_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "title": {
                "type": "STRING",
                "description": "A short, catchy title for the image, maximum 10 words."
            },
            "description": {
                "type": "STRING",
                "description": "A detailed description of the image, 50 words or less."
            },
            "tags": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": format!("A list of exactly {TAG_COUNT} relevant meta tag keywords for the image. These should be single words or short phrases.")
            },
            "latitude": {
                "type": "NUMBER",
                "description": "The geographical latitude for the provided location. Omit if no location is provided or found. Example: 43.6532"
            },
            "longitude": {
                "type": "NUMBER",
                "description": "The geographical longitude for the provided location. Omit if no location is provided or found. Example: -79.3832"
            }
        },
        "required": ["title", "description", "tags"]
    })
}

/// Parse raw AI response text into an [`AnalysisResult`].
///
/// Schema-constrained output is normally clean JSON, but code fences,
/// surrounding prose and trailing commas are tolerated. `title` and
/// `description` must be present.
pub fn parse_ai_response(text: &str) -> Result<AnalysisResult> {
    log::debug!("Raw AI response:\n{text}");

    let cleaned = text.trim();

    for candidate in extract_json_candidates(cleaned) {
        if let Ok(result) = serde_json::from_str::<AnalysisResult>(&candidate) {
            return Ok(result);
        }

        let fixed = fix_trailing_commas(&candidate);
        if let Ok(result) = serde_json::from_str::<AnalysisResult>(&fixed) {
            return Ok(result);
        }
    }

    anyhow::bail!("Could not parse AI response as JSON")
}

/// Extract possible JSON object strings from AI response text.
fn extract_json_candidates(text: &str) -> Vec<String> {
    let mut candidates = Vec::new();

    // Strip markdown code fences (```json ... ``` or ``` ... ```)
    if text.contains("```") {
        let stripped = text
            .lines()
            .skip_while(|l| !l.trim().starts_with("```"))
            .skip(1)
            .take_while(|l| !l.trim().starts_with("```"))
            .collect::<Vec<_>>()
            .join("\n");
        if !stripped.is_empty() {
            candidates.push(stripped);
        }
    }

    // Outermost { ... }
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if end > start {
            candidates.push(text[start..=end].to_string());
        }
    }

    candidates.push(text.to_string());

    candidates
}

/// Fix trailing commas in JSON (e.g. {"a": 1,} or ["a",])
fn fix_trailing_commas(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;
    let mut escape_next = false;

    while let Some(c) = chars.next() {
        if escape_next {
            result.push(c);
            escape_next = false;
            continue;
        }
        if c == '\\' && in_string {
            result.push(c);
            escape_next = true;
            continue;
        }
        if c == '"' {
            in_string = !in_string;
            result.push(c);
            continue;
        }
        if !in_string && c == ',' {
            let rest = chars.clone().find(|c| !c.is_whitespace());
            if matches!(rest, Some('}') | Some(']')) {
                continue;
            }
        }
        result.push(c);
    }
    result
}
