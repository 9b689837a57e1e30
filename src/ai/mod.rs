// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Generative AI seam and lenient response parsing

pub mod gemini;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::Result;

pub use gemini::GeminiClient;

/// Base64 payload attached to a prompt (image or recorded audio)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineMedia {
    pub mime_type: String,
    pub data: String,
}

impl InlineMedia {
    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.to_string(),
            data: BASE64.encode(bytes),
        }
    }
}

/// Raw speech returned by the model, usually PCM
#[derive(Debug, Clone)]
pub struct SpeechAudio {
    pub data: Vec<u8>,
    pub mime_type: String,
}

#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub data: Vec<u8>,
    pub mime_type: String,
}

/// Operations the backend needs from a generative model provider
#[async_trait]
pub trait GenerativeAi: Send + Sync {
    /// Plain text completion
    async fn generate_text(&self, prompt: &str) -> Result<String>;

    /// Text completion grounded on an image or audio clip
    async fn generate_with_media(&self, prompt: &str, media: &InlineMedia) -> Result<String>;

    /// Speak `text` with a prebuilt voice
    async fn synthesize_speech(&self, text: &str, voice: &str) -> Result<SpeechAudio>;

    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage>;
}

/// Where a JSON object could start: a brace followed by a key or a closing brace
fn object_start_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"\{\s*["}]"#).ok()).as_ref()
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the info string (e.g. `json`)
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    body.trim_end().trim_end_matches("```").trim()
}

/// Pull the first JSON object out of model text that may be fenced or chatty
pub fn extract_json(text: &str) -> Option<Value> {
    let body = strip_code_fence(text);
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(body) {
        return Some(value);
    }

    // Parse one value from each candidate start and ignore whatever trails it
    object_start_pattern()?.find_iter(body).find_map(|start| {
        let mut values = serde_json::Deserializer::from_str(&body[start.start()..]).into_iter::<Value>();
        match values.next() {
            Some(Ok(value @ Value::Object(_))) => Some(value),
            _ => None,
        }
    })
}

/// Split a `data:<mime>;base64,<payload>` URL; raw base64 passes through
pub fn split_data_url(input: &str) -> (Option<&str>, &str) {
    match input.strip_prefix("data:").and_then(|rest| rest.split_once(',')) {
        Some((header, payload)) => {
            let mime = header.split(';').next().filter(|m| !m.is_empty());
            (mime, payload)
        }
        None => (None, input),
    }
}
