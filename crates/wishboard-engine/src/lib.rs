pub mod credentials;
pub mod fallback;
pub mod gemini;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use wishboard_contracts::events::EventWriter;

use crate::gemini::{GeminiClient, ImageBytes, IMAGE_MODEL, TEXT_MODEL};

const STYLE_SUFFIX: &str = " . photorealistic, 8k, cinematic lighting, highly detailed, masterpiece.";

pub const GENERIC_PLAN: &str = "1. Define tu objetivo con claridad absoluta.\n2. Ahorra e invierte el 20% de tus ingresos consistentemente.\n3. Visualiza el éxito diariamente y actúa como si ya fuera tuyo.";

/// The AI service layer. Both public operations absorb every failure:
/// callers always get a usable image reference or plan text back, never an
/// error. Failure details go to the event log instead.
pub struct WishEngine {
    events: EventWriter,
    client: GeminiClient,
    text_model: String,
    image_model: String,
}

impl WishEngine {
    pub fn new(events: EventWriter) -> Self {
        Self::with_client(events, GeminiClient::new())
    }

    pub fn with_client(events: EventWriter, client: GeminiClient) -> Self {
        Self {
            events,
            client,
            text_model: TEXT_MODEL.to_string(),
            image_model: IMAGE_MODEL.to_string(),
        }
    }

    /// Resolves to a usable image reference no matter what fails along the
    /// way. `fresh` makes a degraded result visibly different on repeat
    /// calls, so a user-triggered regenerate never looks like a no-op.
    pub fn generate_wish_image(&self, prompt: &str, fresh: bool) -> String {
        let Some(api_key) = credentials::resolve() else {
            self.record_image_fallback(prompt, fresh, "no credential configured");
            return fallback::select(prompt, fresh);
        };
        match self.try_generate_image(&api_key, prompt) {
            Ok(data_uri) => {
                let _ = self.events.emit(
                    "image_generated",
                    map_object(json!({
                        "prompt": prompt,
                        "artifact_id": short_id(prompt),
                        "bytes": data_uri.len(),
                    })),
                );
                data_uri
            }
            Err(err) => {
                self.record_image_fallback(prompt, fresh, &error_chain_text(&err, 300));
                fallback::select(prompt, fresh)
            }
        }
    }

    /// Always returns plan text; offline boards and failed requests get the
    /// canned 3-step plan.
    pub fn generate_action_plan(&self, title: &str, target_amount: f64) -> String {
        let Some(api_key) = credentials::resolve() else {
            let _ = self.events.emit(
                "plan_fallback",
                map_object(json!({
                    "title": title,
                    "reason": "no credential configured",
                })),
            );
            return GENERIC_PLAN.to_string();
        };

        let instruction = format!(
            "Plan de acción de 3 pasos breves para conseguir: \"{title}\" (${target_amount}). \
             Tono: asesor financiero de élite. Español."
        );
        match self.client.generate_text(&api_key, &self.text_model, &instruction) {
            Ok(plan) => {
                let _ = self.events.emit(
                    "plan_generated",
                    map_object(json!({ "title": title })),
                );
                plan
            }
            Err(err) => {
                let _ = self.events.emit(
                    "plan_fallback",
                    map_object(json!({
                        "title": title,
                        "reason": error_chain_text(&err, 300),
                    })),
                );
                GENERIC_PLAN.to_string()
            }
        }
    }

    fn try_generate_image(&self, api_key: &str, prompt: &str) -> Result<String> {
        let enhanced = self.enhance_prompt(api_key, prompt);
        let image = self.client.generate_image(
            api_key,
            &self.image_model,
            &format!("{enhanced}{STYLE_SUFFIX}"),
        )?;
        data_uri_from(image)
    }

    // Best-effort translation/expansion of the prompt; any failure or empty
    // answer falls back to the raw prompt.
    fn enhance_prompt(&self, api_key: &str, prompt: &str) -> String {
        let instruction = format!(
            "Translate this text to a detailed English prompt for an image generator \
             (like Midjourney/DALL-E).\n\
             RULES:\n\
             1. Keep it under 40 words.\n\
             2. PRESERVE EXACTLY: Colors, Brands (Ferrari, Rolex, etc.), Models, Years.\n\
             3. Do NOT add generic filler like \"luxury lifestyle\" if it conflicts with the object.\n\
             4. If it's a car, mention the car clearly.\n\n\
             Input: \"{prompt}\""
        );
        match self.client.generate_text(api_key, &self.text_model, &instruction) {
            Ok(enhanced) if !enhanced.trim().is_empty() => enhanced,
            _ => prompt.to_string(),
        }
    }

    fn record_image_fallback(&self, prompt: &str, fresh: bool, reason: &str) {
        let _ = self.events.emit(
            "image_fallback",
            map_object(json!({
                "prompt": prompt,
                "fresh": fresh,
                "bucket": fallback::bucket_name(prompt),
                "reason": reason,
            })),
        );
    }
}

fn data_uri_from(image: ImageBytes) -> Result<String> {
    // Reject payloads that do not decode as an image.
    image::load_from_memory(&image.bytes).context("generated image did not decode")?;
    let mime = image.mime_type.unwrap_or_else(|| "image/png".to_string());
    Ok(format!("data:{mime};base64,{}", BASE64.encode(&image.bytes)))
}

fn short_id(prompt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..4])
}

fn error_chain_text(err: &anyhow::Error, max_chars: usize) -> String {
    let mut parts = Vec::new();
    for cause in err.chain() {
        let text = cause.to_string();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }
        if parts
            .last()
            .map(|existing| existing == trimmed)
            .unwrap_or(false)
        {
            continue;
        }
        parts.push(trimmed.to_string());
    }
    if parts.is_empty() {
        return truncate_text(&err.to_string(), max_chars);
    }
    truncate_text(&parts.join(" | caused by: "), max_chars)
}

fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}

fn map_object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}
