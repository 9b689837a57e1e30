// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Curriculum browsing, activity play and settlement

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::auth::AuthParent;
use super::error::{ApiError, ApiResult};
use super::AppState;
use crate::db::curriculum::{ActivityView, ThemeSummary};
use crate::db::{ActivityKind, KidProgress, Settlement};
use crate::locale::Locale;

#[derive(Deserialize)]
pub struct LocaleQuery {
    locale: Option<Locale>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KidQuery {
    kid_id: String,
    locale: Option<Locale>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectView {
    id: String,
    title: String,
    icon: Option<String>,
    sort_order: i64,
}

/// Playable activity with its exercise content
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDetail {
    id: String,
    theme_id: String,
    kind: ActivityKind,
    title: String,
    xp_reward: u32,
    content: serde_json::Value,
}

#[derive(Deserialize)]
pub struct CompleteBody {
    score: u32,
}

pub async fn list_subjects(
    State(state): State<Arc<AppState>>,
    query: Result<Query<LocaleQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<SubjectView>>> {
    let Query(query) = query?;
    let locale = query.locale.unwrap_or_default();
    let subjects = state
        .db
        .list_subjects()?
        .into_iter()
        .map(|s| SubjectView {
            title: s.title.get(locale).to_string(),
            id: s.id,
            icon: s.icon,
            sort_order: s.sort_order,
        })
        .collect();
    Ok(Json(subjects))
}

pub async fn list_themes(
    State(state): State<Arc<AppState>>,
    parent: AuthParent,
    Path(subject_id): Path<String>,
    query: Result<Query<KidQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<ThemeSummary>>> {
    let Query(query) = query?;
    let kid = parent.owned_kid(&state, &query.kid_id)?;
    if !state.db.subject_exists(&subject_id)? {
        return Err(crate::CeriaError::NotFound(format!("subject {}", subject_id)).into());
    }
    let locale = query.locale.unwrap_or(kid.locale);
    Ok(Json(state.db.theme_summaries(&subject_id, &kid.id, locale)?))
}

pub async fn list_activities(
    State(state): State<Arc<AppState>>,
    parent: AuthParent,
    Path(theme_id): Path<String>,
    query: Result<Query<KidQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<ActivityView>>> {
    let Query(query) = query?;
    let kid = parent.owned_kid(&state, &query.kid_id)?;
    if state.db.get_theme(&theme_id)?.is_none() {
        return Err(crate::CeriaError::NotFound(format!("theme {}", theme_id)).into());
    }
    let locale = query.locale.unwrap_or(kid.locale);
    Ok(Json(state.db.activity_views(&theme_id, &kid.id, locale)?))
}

pub async fn get_activity(
    State(state): State<Arc<AppState>>,
    Path(activity_id): Path<String>,
    query: Result<Query<LocaleQuery>, QueryRejection>,
) -> ApiResult<Json<ActivityDetail>> {
    let Query(query) = query?;
    let activity = state
        .db
        .get_activity(&activity_id)?
        .ok_or_else(|| ApiError::from(crate::CeriaError::NotFound(format!("activity {}", activity_id))))?;
    let locale = query.locale.unwrap_or_default();
    Ok(Json(ActivityDetail {
        title: activity.title.get(locale).to_string(),
        id: activity.id,
        theme_id: activity.theme_id,
        kind: activity.kind,
        xp_reward: activity.xp_reward,
        content: activity.content,
    }))
}

pub async fn start_activity(
    State(state): State<Arc<AppState>>,
    parent: AuthParent,
    Path((kid_id, activity_id)): Path<(String, String)>,
) -> ApiResult<Json<KidProgress>> {
    let kid = parent.owned_kid(&state, &kid_id)?;
    Ok(Json(state.db.start_activity(&kid.id, &activity_id)?))
}

pub async fn complete_activity(
    State(state): State<Arc<AppState>>,
    parent: AuthParent,
    Path((kid_id, activity_id)): Path<(String, String)>,
    body: Result<Json<CompleteBody>, JsonRejection>,
) -> ApiResult<Json<Settlement>> {
    let kid = parent.owned_kid(&state, &kid_id)?;
    let Json(body) = body?;
    let settlement = state
        .db
        .complete_activity(&kid.id, &activity_id, body.score, state.config.rewards.replay_xp)?;
    info!(
        "Kid {} completed {} with {} stars (+{} XP)",
        kid.id, activity_id, settlement.stars, settlement.xp_gained
    );
    Ok(Json(settlement))
}

pub async fn kid_progress(
    State(state): State<Arc<AppState>>,
    parent: AuthParent,
    Path(kid_id): Path<String>,
) -> ApiResult<Json<Vec<KidProgress>>> {
    let kid = parent.owned_kid(&state, &kid_id)?;
    Ok(Json(state.db.progress_for_kid(&kid.id)?))
}
