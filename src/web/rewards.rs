// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Catalogs, inventory, loadout and the leaderboard

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    response::Json,
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::AuthParent;
use super::error::ApiResult;
use super::AppState;
use crate::db::{Equipment, Equipped, LeaderboardEntry, Pet, Slot};

const DEFAULT_LEADERBOARD: usize = 20;
const MAX_LEADERBOARD: usize = 100;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipBody {
    slot: Slot,
    item_id: Option<String>,
}

#[derive(Deserialize)]
pub struct LeaderboardQuery {
    limit: Option<usize>,
}

pub async fn equipment_catalog(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Equipment>>> {
    Ok(Json(state.db.list_equipment()?))
}

pub async fn pet_catalog(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Pet>>> {
    Ok(Json(state.db.list_pets()?))
}

pub async fn inventory(
    State(state): State<Arc<AppState>>,
    parent: AuthParent,
    Path(kid_id): Path<String>,
) -> ApiResult<Json<Vec<Equipment>>> {
    let kid = parent.owned_kid(&state, &kid_id)?;
    Ok(Json(state.db.inventory(&kid.id)?))
}

pub async fn kid_pets(
    State(state): State<Arc<AppState>>,
    parent: AuthParent,
    Path(kid_id): Path<String>,
) -> ApiResult<Json<Vec<Pet>>> {
    let kid = parent.owned_kid(&state, &kid_id)?;
    Ok(Json(state.db.kid_pets(&kid.id)?))
}

pub async fn get_equipped(
    State(state): State<Arc<AppState>>,
    parent: AuthParent,
    Path(kid_id): Path<String>,
) -> ApiResult<Json<Equipped>> {
    let kid = parent.owned_kid(&state, &kid_id)?;
    Ok(Json(state.db.equipped(&kid.id)?))
}

pub async fn set_equipped(
    State(state): State<Arc<AppState>>,
    parent: AuthParent,
    Path(kid_id): Path<String>,
    body: Result<Json<EquipBody>, JsonRejection>,
) -> ApiResult<Json<Equipped>> {
    let kid = parent.owned_kid(&state, &kid_id)?;
    let Json(body) = body?;
    let item = body.item_id.as_deref().map(str::trim).filter(|id| !id.is_empty());
    Ok(Json(state.db.set_equipped(&kid.id, body.slot, item)?))
}

pub async fn leaderboard(
    State(state): State<Arc<AppState>>,
    query: Result<Query<LeaderboardQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<LeaderboardEntry>>> {
    let Query(query) = query?;
    let limit = query.limit.unwrap_or(DEFAULT_LEADERBOARD).clamp(1, MAX_LEADERBOARD);
    Ok(Json(state.db.leaderboard(limit)?))
}
