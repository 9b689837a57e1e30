// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Asset generation endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::{Admin, AuthParent};
use super::error::{ApiError, ApiResult};
use super::AppState;
use crate::generation::{BatchRequest, BatchResponse, GeneratedAsset};
use crate::locale::Locale;

#[derive(Deserialize)]
pub struct AudioBody {
    text: String,
    key: Option<String>,
    #[serde(default)]
    locale: Locale,
}

#[derive(Deserialize)]
pub struct VocabImageBody {
    word: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarBody {
    kid_id: String,
    description: Option<String>,
}

/// Which batch a request runs
#[derive(Clone, Copy)]
enum Batch {
    Audio,
    Vocab,
    Equipment,
    Pets,
    Alphabet,
}

async fn run_batch(
    state: &AppState,
    batch: Batch,
    body: Result<Json<BatchRequest>, JsonRejection>,
) -> ApiResult<Json<BatchResponse>> {
    let Json(request) = body?;
    let locale = request.locale.unwrap_or_default();
    let ai = state.ai_for(locale)?;
    let generator = state.generator(ai);
    let response = match batch {
        Batch::Audio => generator.audio_batch(&request).await,
        Batch::Vocab => generator.vocab_batch(&request).await,
        Batch::Equipment => generator.equipment_batch(&request).await,
        Batch::Pets => generator.pets_batch(&request).await,
        Batch::Alphabet => generator.alphabet_batch(&request).await,
    };
    Ok(Json(response.map_err(|e| ApiError::from_ai(e, locale))?))
}

pub async fn audio(
    State(state): State<Arc<AppState>>,
    _admin: Admin,
    body: Result<Json<AudioBody>, JsonRejection>,
) -> ApiResult<Json<GeneratedAsset>> {
    let Json(body) = body?;
    let ai = state.ai_for(body.locale)?;
    let asset = state
        .generator(ai)
        .single_audio(&body.text, body.key.as_deref(), body.locale)
        .await
        .map_err(|e| ApiError::from_ai(e, body.locale))?;
    Ok(Json(asset))
}

pub async fn audio_batch(
    State(state): State<Arc<AppState>>,
    _admin: Admin,
    body: Result<Json<BatchRequest>, JsonRejection>,
) -> ApiResult<Json<BatchResponse>> {
    run_batch(&state, Batch::Audio, body).await
}

pub async fn vocab_batch(
    State(state): State<Arc<AppState>>,
    _admin: Admin,
    body: Result<Json<BatchRequest>, JsonRejection>,
) -> ApiResult<Json<BatchResponse>> {
    run_batch(&state, Batch::Vocab, body).await
}

pub async fn vocab_image(
    State(state): State<Arc<AppState>>,
    _admin: Admin,
    body: Result<Json<VocabImageBody>, JsonRejection>,
) -> ApiResult<Json<GeneratedAsset>> {
    let Json(body) = body?;
    let locale = Locale::default();
    let ai = state.ai_for(locale)?;
    let asset = state
        .generator(ai)
        .vocab_image(&body.word)
        .await
        .map_err(|e| ApiError::from_ai(e, locale))?;
    Ok(Json(asset))
}

pub async fn equipment(
    State(state): State<Arc<AppState>>,
    _admin: Admin,
    body: Result<Json<BatchRequest>, JsonRejection>,
) -> ApiResult<Json<BatchResponse>> {
    run_batch(&state, Batch::Equipment, body).await
}

pub async fn pets(
    State(state): State<Arc<AppState>>,
    _admin: Admin,
    body: Result<Json<BatchRequest>, JsonRejection>,
) -> ApiResult<Json<BatchResponse>> {
    run_batch(&state, Batch::Pets, body).await
}

pub async fn alphabet(
    State(state): State<Arc<AppState>>,
    _admin: Admin,
    body: Result<Json<BatchRequest>, JsonRejection>,
) -> ApiResult<Json<BatchResponse>> {
    run_batch(&state, Batch::Alphabet, body).await
}

pub async fn avatar(
    State(state): State<Arc<AppState>>,
    parent: AuthParent,
    body: Result<Json<AvatarBody>, JsonRejection>,
) -> ApiResult<Json<GeneratedAsset>> {
    let Json(body) = body?;
    let kid = parent.owned_kid(&state, &body.kid_id)?;
    let ai = state.ai_for(kid.locale)?;
    let asset = state
        .generator(ai)
        .avatar(&kid, body.description.as_deref())
        .await
        .map_err(|e| ApiError::from_ai(e, kid.locale))?;
    Ok(Json(asset))
}
