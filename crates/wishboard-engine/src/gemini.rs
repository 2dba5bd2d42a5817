use std::env;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::blocking::{Client as HttpClient, Response as HttpResponse};
use serde_json::{json, Value};

pub const TEXT_MODEL: &str = "gemini-2.5-flash";
pub const IMAGE_MODEL: &str = "gemini-2.5-flash-image";

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
// One attempt per user action; a request completes or fails, nothing retries.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Debug, Clone)]
pub struct ImageBytes {
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
}

pub struct GeminiClient {
    api_base: String,
    http: HttpClient,
}

impl GeminiClient {
    pub fn new() -> Self {
        Self::with_base(
            env::var("GEMINI_API_BASE")
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        )
    }

    pub fn with_base(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            http: HttpClient::new(),
        }
    }

    pub fn generate_text(&self, api_key: &str, model: &str, prompt: &str) -> Result<String> {
        let payload = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }],
            }],
        });
        let response = self.post(&self.endpoint_for_model(model), api_key, &payload)?;
        let body = response_json_or_error("Gemini", response)?;
        let text = extract_text(&body);
        if text.trim().is_empty() {
            bail!("Gemini returned no text");
        }
        Ok(text.trim().to_string())
    }

    pub fn generate_image(&self, api_key: &str, model: &str, prompt: &str) -> Result<ImageBytes> {
        let payload = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }],
            }],
            "generationConfig": {
                "responseModalities": ["IMAGE"],
            },
            "safetySettings": default_safety_settings(),
        });
        let response = self.post(&self.endpoint_for_model(model), api_key, &payload)?;
        let body = response_json_or_error("Gemini", response)?;
        if let Some(image) = extract_image(&body)? {
            return Ok(image);
        }
        if let Some(reason) = finish_reason(&body) {
            bail!("Gemini blocked generation: {reason}");
        }
        bail!("Gemini returned no image data");
    }

    fn endpoint_for_model(&self, model: &str) -> String {
        let trimmed = model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }

    fn post(&self, endpoint: &str, api_key: &str, payload: &Value) -> Result<HttpResponse> {
        self.http
            .post(endpoint)
            .query(&[("key", api_key)])
            .timeout(REQUEST_TIMEOUT)
            .json(payload)
            .send()
            .with_context(|| format!("Gemini request failed ({endpoint})"))
    }
}

impl Default for GeminiClient {
    fn default() -> Self {
        Self::new()
    }
}

// Wealth/luxury prompts trip the default filters, so the board relaxes them.
fn default_safety_settings() -> Value {
    Value::Array(
        [
            "HARM_CATEGORY_HARASSMENT",
            "HARM_CATEGORY_HATE_SPEECH",
            "HARM_CATEGORY_SEXUALLY_EXPLICIT",
            "HARM_CATEGORY_DANGEROUS_CONTENT",
        ]
        .into_iter()
        .map(|category| {
            json!({
                "category": category,
                "threshold": "BLOCK_NONE",
            })
        })
        .collect(),
    )
}

fn response_json_or_error(provider: &str, response: HttpResponse) -> Result<Value> {
    let status = response.status();
    let text = response
        .text()
        .with_context(|| format!("{provider} response read failed"))?;
    if !status.is_success() {
        bail!("{provider} returned {status}: {}", truncate_text(&text, 300));
    }
    serde_json::from_str(&text).with_context(|| format!("{provider} response was not JSON"))
}

fn extract_text(body: &Value) -> String {
    for candidate in candidates(body) {
        for part in content_parts(candidate) {
            if let Some(text) = part.get("text").and_then(Value::as_str) {
                if !text.trim().is_empty() {
                    return text.to_string();
                }
            }
        }
    }
    String::new()
}

fn extract_image(body: &Value) -> Result<Option<ImageBytes>> {
    for candidate in candidates(body) {
        for part in content_parts(candidate) {
            let Some(inline) = part
                .get("inlineData")
                .or_else(|| part.get("inline_data"))
                .and_then(Value::as_object)
            else {
                continue;
            };
            let data = inline.get("data").and_then(Value::as_str).unwrap_or_default();
            if data.is_empty() {
                continue;
            }
            let bytes = BASE64
                .decode(data.as_bytes())
                .context("Gemini image base64 decode failed")?;
            let mime_type = inline
                .get("mimeType")
                .or_else(|| inline.get("mime_type"))
                .and_then(Value::as_str)
                .map(str::to_string);
            return Ok(Some(ImageBytes { bytes, mime_type }));
        }
    }
    Ok(None)
}

fn finish_reason(body: &Value) -> Option<&str> {
    candidates(body)
        .first()?
        .get("finishReason")
        .and_then(Value::as_str)
        .filter(|reason| *reason != "STOP")
}

fn candidates(body: &Value) -> &[Value] {
    body.get("candidates")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn content_parts(candidate: &Value) -> &[Value] {
    candidate
        .get("content")
        .and_then(Value::as_object)
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{extract_image, extract_text, finish_reason, GeminiClient};

    #[test]
    fn endpoint_accepts_bare_and_prefixed_models() {
        let client = GeminiClient::with_base("https://api.test/v1beta/");
        assert_eq!(
            client.endpoint_for_model("gemini-2.5-flash"),
            "https://api.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert_eq!(
            client.endpoint_for_model("models/gemini-2.5-flash"),
            "https://api.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn extract_text_takes_first_non_empty_part() {
        let body = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "  " }, { "text": "un Ferrari rojo" }] },
            }],
        });
        assert_eq!(extract_text(&body), "un Ferrari rojo");
        assert_eq!(extract_text(&json!({})), "");
    }

    #[test]
    fn extract_image_decodes_inline_data_in_either_casing() -> anyhow::Result<()> {
        let body = json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "caption" },
                    { "inlineData": { "mimeType": "image/png", "data": "aGVsbG8=" } },
                ]},
            }],
        });
        let image = extract_image(&body)?.expect("image present");
        assert_eq!(image.bytes, b"hello");
        assert_eq!(image.mime_type.as_deref(), Some("image/png"));

        let snake = json!({
            "candidates": [{
                "content": { "parts": [
                    { "inline_data": { "mime_type": "image/jpeg", "data": "aGVsbG8=" } },
                ]},
            }],
        });
        let image = extract_image(&snake)?.expect("image present");
        assert_eq!(image.mime_type.as_deref(), Some("image/jpeg"));
        Ok(())
    }

    #[test]
    fn empty_inline_data_yields_no_image() -> anyhow::Result<()> {
        let body = json!({
            "candidates": [{
                "content": { "parts": [{ "inlineData": { "data": "" } }] },
            }],
        });
        assert!(extract_image(&body)?.is_none());
        Ok(())
    }

    #[test]
    fn safety_blocks_surface_through_finish_reason() {
        let body = json!({
            "candidates": [{ "finishReason": "SAFETY", "content": { "parts": [] } }],
        });
        assert_eq!(finish_reason(&body), Some("SAFETY"));

        let normal = json!({
            "candidates": [{ "finishReason": "STOP", "content": { "parts": [] } }],
        });
        assert_eq!(finish_reason(&normal), None);
    }
}
