// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Handwriting, pronunciation, speech and voice-tutor services
//!
//! Recognition never fails the request on an AI problem: a missing key,
//! an upstream error or an unreadable answer all produce a localized
//! fallback result. Speech needs the model and reports it as unavailable.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::{imageops::FilterType, ImageFormat};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Cursor;
use tracing::{debug, warn};

use crate::ai::{extract_json, split_data_url, GenerativeAi, InlineMedia};
use crate::audio;
use crate::config::AppConfig;
use crate::locale::{Fallback, Locale};
use crate::prompts::Prompts;
use crate::{CeriaError, Result};

/// Longest edge of a handwriting image sent upstream
pub const MAX_IMAGE_EDGE: u32 = 512;

const DEFAULT_AUDIO_MIME: &str = "audio/webm";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandwritingRequest {
    pub image: String,
    pub expected_letter: String,
    #[serde(default)]
    pub locale: Locale,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HandwritingResult {
    pub recognized_letter: String,
    pub is_correct: bool,
    pub confidence: f64,
    pub feedback: String,
    pub fallback: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PronunciationRequest {
    pub audio: String,
    pub mime_type: Option<String>,
    pub expected_text: String,
    #[serde(default)]
    pub locale: Locale,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PronunciationResult {
    pub is_correct: bool,
    pub score: u32,
    pub transcription: String,
    pub feedback: String,
    pub fallback: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TtsRequest {
    pub text: String,
    #[serde(default)]
    pub locale: Locale,
    pub voice: Option<String>,
}

/// Base64 WAV ready for an `<audio>` element
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechResponse {
    pub audio: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceTutorRequest {
    pub content: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    #[serde(default)]
    pub locale: Locale,
    #[serde(default, rename = "directTTS")]
    pub direct_tts: bool,
}

fn default_content_type() -> String {
    "text".to_string()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceTutorResponse {
    pub text: String,
    pub audio: Option<String>,
    pub mime_type: Option<String>,
    pub fallback: bool,
}

/// Compare loosely: case, punctuation and spacing do not matter
fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Decode a data URL or raw base64 image, shrink it and re-encode as PNG
pub fn prepare_handwriting_image(raw: &str) -> Result<Vec<u8>> {
    let (_, payload) = split_data_url(raw.trim());
    let bytes = BASE64
        .decode(payload.trim().as_bytes())
        .map_err(|e| CeriaError::InvalidImage(format!("not valid base64: {}", e)))?;

    let mut img = image::load_from_memory(&bytes).map_err(|e| CeriaError::InvalidImage(e.to_string()))?;
    if img.width() > MAX_IMAGE_EDGE || img.height() > MAX_IMAGE_EDGE {
        img = img.resize(MAX_IMAGE_EDGE, MAX_IMAGE_EDGE, FilterType::Triangle);
    }

    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)?;
    debug!("Prepared handwriting image {}x{} ({} bytes)", img.width(), img.height(), out.len());
    Ok(out)
}

impl HandwritingResult {
    fn fallback(locale: Locale) -> Self {
        Self {
            recognized_letter: "?".to_string(),
            is_correct: false,
            confidence: 0.0,
            feedback: Fallback::HandwritingRetry.text(locale).to_string(),
            fallback: true,
        }
    }

    /// Read the model's answer; a bare one- or two-character reply counts as the letter
    pub fn from_model_text(text: &str, expected: &str, locale: Locale) -> Self {
        let (recognized, is_correct, confidence, feedback) = match extract_json(text) {
            Some(json) => (
                str_field(&json, "recognizedLetter"),
                json.get("isCorrect").and_then(Value::as_bool),
                json.get("confidence").and_then(Value::as_f64),
                str_field(&json, "feedback"),
            ),
            None => {
                let plain = text.trim().trim_matches('"').trim();
                let letter = (!plain.is_empty() && plain.chars().count() <= 2).then(|| plain.to_string());
                (letter, None, None, None)
            }
        };

        let Some(recognized) = recognized else {
            return Self::fallback(locale);
        };

        let is_correct = is_correct.unwrap_or_else(|| normalize(&recognized) == normalize(expected));
        let feedback = feedback.unwrap_or_else(|| {
            if is_correct {
                Fallback::TutorEncourage.text(locale).to_string()
            } else {
                Fallback::HandwritingRetry.text(locale).to_string()
            }
        });

        Self {
            recognized_letter: recognized,
            is_correct,
            confidence: confidence.unwrap_or(if is_correct { 1.0 } else { 0.0 }).clamp(0.0, 1.0),
            feedback,
            fallback: false,
        }
    }
}

impl PronunciationResult {
    fn fallback(locale: Locale) -> Self {
        Self {
            is_correct: false,
            score: 0,
            transcription: String::new(),
            feedback: Fallback::PronunciationRetry.text(locale).to_string(),
            fallback: true,
        }
    }

    /// Read the model's answer; plain text is taken as the transcription
    pub fn from_model_text(text: &str, expected: &str, locale: Locale) -> Self {
        let (transcription, is_correct, score, feedback) = match extract_json(text) {
            Some(json) => (
                str_field(&json, "transcription"),
                json.get("isCorrect").and_then(Value::as_bool),
                json.get("score").and_then(Value::as_f64),
                str_field(&json, "feedback"),
            ),
            None => {
                let plain = text.trim();
                ((!plain.is_empty()).then(|| plain.to_string()), None, None, None)
            }
        };

        let Some(transcription) = transcription else {
            return Self::fallback(locale);
        };

        let is_correct = is_correct.unwrap_or_else(|| normalize(&transcription) == normalize(expected));
        let score = score
            .map(|s| s.round().clamp(0.0, 100.0) as u32)
            .unwrap_or(if is_correct { 100 } else { 0 });
        let feedback = feedback.unwrap_or_else(|| {
            if is_correct {
                Fallback::TutorEncourage.text(locale).to_string()
            } else {
                Fallback::PronunciationRetry.text(locale).to_string()
            }
        });

        Self { is_correct, score, transcription, feedback, fallback: false }
    }
}

/// Recognize a handwritten letter; AI trouble yields the `"?"` fallback
pub async fn recognize_handwriting(
    ai: Option<&dyn GenerativeAi>,
    prompts: &Prompts,
    request: &HandwritingRequest,
) -> Result<HandwritingResult> {
    if request.expected_letter.trim().is_empty() {
        return Err(CeriaError::Invalid("expectedLetter must not be empty".into()));
    }
    let png = prepare_handwriting_image(&request.image)?;

    let Some(ai) = ai else {
        return Ok(HandwritingResult::fallback(request.locale));
    };

    let prompt = prompts.handwriting(request.expected_letter.trim(), request.locale)?;
    let media = InlineMedia::from_bytes("image/png", &png);
    match ai.generate_with_media(&prompt, &media).await {
        Ok(text) => Ok(HandwritingResult::from_model_text(&text, &request.expected_letter, request.locale)),
        Err(e) => {
            warn!("Handwriting recognition failed: {}", e);
            Ok(HandwritingResult::fallback(request.locale))
        }
    }
}

/// Assess a recorded attempt at `expectedText`
pub async fn assess_pronunciation(
    ai: Option<&dyn GenerativeAi>,
    prompts: &Prompts,
    request: &PronunciationRequest,
) -> Result<PronunciationResult> {
    if request.expected_text.trim().is_empty() {
        return Err(CeriaError::Invalid("expectedText must not be empty".into()));
    }
    let (url_mime, payload) = split_data_url(request.audio.trim());
    let payload = payload.trim();
    if payload.is_empty() || BASE64.decode(payload.as_bytes()).is_err() {
        return Err(CeriaError::Invalid("audio must be base64 encoded".into()));
    }

    let Some(ai) = ai else {
        return Ok(PronunciationResult::fallback(request.locale));
    };

    let mime = request.mime_type.as_deref().or(url_mime).unwrap_or(DEFAULT_AUDIO_MIME);
    let prompt = prompts.pronunciation(request.expected_text.trim(), request.locale)?;
    let media = InlineMedia { mime_type: mime.to_string(), data: payload.to_string() };
    match ai.generate_with_media(&prompt, &media).await {
        Ok(text) => Ok(PronunciationResult::from_model_text(&text, &request.expected_text, request.locale)),
        Err(e) => {
            warn!("Pronunciation assessment failed: {}", e);
            Ok(PronunciationResult::fallback(request.locale))
        }
    }
}

/// Speak text as base64 WAV
pub async fn synthesize(
    ai: &dyn GenerativeAi,
    config: &AppConfig,
    text: &str,
    locale: Locale,
    voice: Option<&str>,
) -> Result<SpeechResponse> {
    let text = text.trim();
    if text.is_empty() {
        return Err(CeriaError::Invalid("text must not be empty".into()));
    }
    let voice = voice.unwrap_or_else(|| config.ai.voices.for_locale(locale));
    let speech = ai.synthesize_speech(text, voice).await?;
    let wav = audio::to_wav(speech.data, &speech.mime_type);
    Ok(SpeechResponse {
        audio: BASE64.encode(wav),
        mime_type: "audio/wav".to_string(),
    })
}

/// Explain content to the child (or read it verbatim) and speak the result
pub async fn voice_tutor(
    ai: &dyn GenerativeAi,
    config: &AppConfig,
    prompts: &Prompts,
    request: &VoiceTutorRequest,
) -> Result<VoiceTutorResponse> {
    let content = request.content.trim();
    if content.is_empty() {
        return Err(CeriaError::Invalid("content must not be empty".into()));
    }

    let mut fallback = false;
    let text = if request.direct_tts {
        content.to_string()
    } else {
        let prompt = prompts.voice_tutor(content, &request.content_type, request.locale)?;
        match ai.generate_text(&prompt).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                fallback = true;
                Fallback::TutorEncourage.text(request.locale).to_string()
            }
            Err(e) => {
                warn!("Voice tutor explanation failed: {}", e);
                fallback = true;
                Fallback::TutorEncourage.text(request.locale).to_string()
            }
        }
    };

    match synthesize(ai, config, &text, request.locale, None).await {
        Ok(speech) => Ok(VoiceTutorResponse {
            text,
            audio: Some(speech.audio),
            mime_type: Some(speech.mime_type),
            fallback,
        }),
        Err(e) => {
            warn!("Voice tutor speech failed: {}", e);
            Ok(VoiceTutorResponse { text, audio: None, mime_type: None, fallback: true })
        }
    }
}
