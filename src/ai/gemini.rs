// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Gemini REST client (generateContent for text, vision, speech and images)

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

use super::{GeneratedImage, GenerativeAi, InlineMedia, SpeechAudio};
use crate::config::{AiConfig, ModelConfig};
use crate::{CeriaError, Result};

/// Longest upstream error body kept in error messages
const MAX_ERROR_BODY: usize = 300;

/// Gemini API client
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    models: ModelConfig,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("models", &self.models)
            .finish()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<Value>,
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<RequestPart>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum RequestPart {
    Text { text: String },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
    #[serde(rename = "inlineData")]
    inline_data: Option<InlineData>,
}

impl GenerateResponse {
    fn parts(self) -> impl Iterator<Item = ResponsePart> {
        self.candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
    }

    fn text(self) -> Option<String> {
        let text: String = self.parts().filter_map(|p| p.text).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    fn inline_data(self) -> Option<InlineData> {
        self.parts().find_map(|p| p.inline_data)
    }
}

impl GeminiClient {
    /// Create a client from config; fails when no API key is set
    pub fn new(config: &AiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| CeriaError::AiUnavailable("GEMINI_API_KEY is not set".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            models: config.models.clone(),
        })
    }

    async fn generate(&self, model: &str, request: &GenerateRequest) -> Result<GenerateResponse> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        debug!("Sending request to Gemini: model={}", model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Gemini rate limited model {}", model);
            return Err(CeriaError::RateLimited);
        }
        if !status.is_success() {
            let mut message = response.text().await.unwrap_or_default();
            if message.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY).rev().find(|i| message.is_char_boundary(*i)).unwrap_or(0);
                message.truncate(cut);
            }
            return Err(CeriaError::Upstream { status: status.as_u16(), message });
        }

        Ok(response.json().await?)
    }

    fn user_content(parts: Vec<RequestPart>) -> Vec<Content> {
        vec![Content { role: "user", parts }]
    }

    fn decode(data: &InlineData) -> Result<Vec<u8>> {
        BASE64
            .decode(data.data.as_bytes())
            .map_err(|e| CeriaError::MalformedResponse(format!("invalid base64 payload: {}", e)))
    }
}

#[async_trait]
impl GenerativeAi for GeminiClient {
    async fn generate_text(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            contents: Self::user_content(vec![RequestPart::Text { text: prompt.to_string() }]),
            generation_config: None,
        };
        self.generate(&self.models.text, &request)
            .await?
            .text()
            .ok_or_else(|| CeriaError::MalformedResponse("response has no text".to_string()))
    }

    async fn generate_with_media(&self, prompt: &str, media: &InlineMedia) -> Result<String> {
        let request = GenerateRequest {
            contents: Self::user_content(vec![
                RequestPart::Text { text: prompt.to_string() },
                RequestPart::InlineData {
                    inline_data: InlineData {
                        mime_type: media.mime_type.clone(),
                        data: media.data.clone(),
                    },
                },
            ]),
            generation_config: None,
        };
        self.generate(&self.models.vision, &request)
            .await?
            .text()
            .ok_or_else(|| CeriaError::MalformedResponse("response has no text".to_string()))
    }

    async fn synthesize_speech(&self, text: &str, voice: &str) -> Result<SpeechAudio> {
        let request = GenerateRequest {
            contents: Self::user_content(vec![RequestPart::Text { text: text.to_string() }]),
            generation_config: Some(json!({
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": voice } }
                }
            })),
        };
        let inline = self
            .generate(&self.models.tts, &request)
            .await?
            .inline_data()
            .ok_or_else(|| CeriaError::MalformedResponse("response has no audio".to_string()))?;

        Ok(SpeechAudio {
            data: Self::decode(&inline)?,
            mime_type: inline.mime_type,
        })
    }

    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage> {
        let request = GenerateRequest {
            contents: Self::user_content(vec![RequestPart::Text { text: prompt.to_string() }]),
            generation_config: Some(json!({ "responseModalities": ["TEXT", "IMAGE"] })),
        };
        let inline = self
            .generate(&self.models.image, &request)
            .await?
            .inline_data()
            .ok_or_else(|| CeriaError::MalformedResponse("response has no image".to_string()))?;

        Ok(GeneratedImage {
            data: Self::decode(&inline)?,
            mime_type: inline.mime_type,
        })
    }
}
