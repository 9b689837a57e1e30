// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Parent registration and kid profiles

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::auth::AuthParent;
use super::error::{ApiError, ApiResult};
use super::AppState;
use crate::db::{Kid, NewKid};
use crate::progression::LevelProgress;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterParent {
    email: String,
    display_name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredParent {
    parent_id: String,
    token: String,
}

/// Kid with derived level progress
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KidProfile {
    #[serde(flatten)]
    kid: Kid,
    level_progress: LevelProgress,
}

impl From<Kid> for KidProfile {
    fn from(kid: Kid) -> Self {
        let level_progress = kid.level_progress();
        Self { kid, level_progress }
    }
}

pub async fn register_parent(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RegisterParent>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RegisteredParent>)> {
    let Json(body) = body?;
    let (parent, token) = state.db.create_parent(&body.email, &body.display_name)?;
    info!("Registered parent {}", parent.id);
    Ok((StatusCode::CREATED, Json(RegisteredParent { parent_id: parent.id, token })))
}

pub async fn list_kids(State(state): State<Arc<AppState>>, parent: AuthParent) -> ApiResult<Json<Vec<KidProfile>>> {
    let kids = state.db.list_kids(&parent.0.id)?;
    Ok(Json(kids.into_iter().map(KidProfile::from).collect()))
}

pub async fn create_kid(
    State(state): State<Arc<AppState>>,
    parent: AuthParent,
    body: Result<Json<NewKid>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<KidProfile>)> {
    let Json(body) = body?;
    if body.name.trim().is_empty() {
        return Err(ApiError::bad_request("name must not be empty"));
    }
    let kid = state.db.create_kid(&parent.0.id, &body)?;
    Ok((StatusCode::CREATED, Json(kid.into())))
}

pub async fn get_kid(
    State(state): State<Arc<AppState>>,
    parent: AuthParent,
    Path(kid_id): Path<String>,
) -> ApiResult<Json<KidProfile>> {
    Ok(Json(parent.owned_kid(&state, &kid_id)?.into()))
}

pub async fn delete_kid(
    State(state): State<Arc<AppState>>,
    parent: AuthParent,
    Path(kid_id): Path<String>,
) -> ApiResult<StatusCode> {
    if state.db.delete_kid(&parent.0.id, &kid_id)? {
        info!("Deleted kid {}", kid_id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::kid_not_found())
    }
}
