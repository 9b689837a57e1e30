// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Speech and recognition endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use std::sync::Arc;

use super::error::{ApiError, ApiResult};
use super::AppState;
use crate::recognition::{
    self, HandwritingRequest, HandwritingResult, PronunciationRequest, PronunciationResult, SpeechResponse,
    TtsRequest, VoiceTutorRequest, VoiceTutorResponse,
};

pub async fn tts(
    State(state): State<Arc<AppState>>,
    body: Result<Json<TtsRequest>, JsonRejection>,
) -> ApiResult<Json<SpeechResponse>> {
    let Json(body) = body?;
    let ai = state.ai_for(body.locale)?;
    let speech = recognition::synthesize(ai, &state.config, &body.text, body.locale, body.voice.as_deref())
        .await
        .map_err(|e| ApiError::from_ai(e, body.locale))?;
    Ok(Json(speech))
}

pub async fn voice_tutor(
    State(state): State<Arc<AppState>>,
    body: Result<Json<VoiceTutorRequest>, JsonRejection>,
) -> ApiResult<Json<VoiceTutorResponse>> {
    let Json(body) = body?;
    let ai = state.ai_for(body.locale)?;
    let response = recognition::voice_tutor(ai, &state.config, &state.prompts, &body)
        .await
        .map_err(|e| ApiError::from_ai(e, body.locale))?;
    Ok(Json(response))
}

pub async fn pronunciation(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PronunciationRequest>, JsonRejection>,
) -> ApiResult<Json<PronunciationResult>> {
    let Json(body) = body?;
    Ok(Json(recognition::assess_pronunciation(state.ai(), &state.prompts, &body).await?))
}

pub async fn handwriting(
    State(state): State<Arc<AppState>>,
    body: Result<Json<HandwritingRequest>, JsonRejection>,
) -> ApiResult<Json<HandwritingResult>> {
    let Json(body) = body?;
    Ok(Json(recognition::recognize_handwriting(state.ai(), &state.prompts, &body).await?))
}
