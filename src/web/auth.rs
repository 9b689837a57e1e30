// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Request authentication: parent bearer tokens and the admin service key

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use std::sync::Arc;
use tracing::debug;

use super::error::ApiError;
use super::AppState;
use crate::db::{Kid, Parent};

pub const SERVICE_KEY_HEADER: &str = "x-service-key";

/// The parent making the request
#[derive(Debug, Clone)]
pub struct AuthParent(pub Parent);

impl AuthParent {
    /// Fetch a kid this parent owns; other parents' kids look missing
    pub fn owned_kid(&self, state: &AppState, kid_id: &str) -> Result<Kid, ApiError> {
        state
            .db
            .get_owned_kid(&self.0.id, kid_id)?
            .ok_or_else(ApiError::kid_not_found)
    }
}

/// Marker for requests carrying the service key
#[derive(Debug, Clone, Copy)]
pub struct Admin;

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthParent {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;
        match state.db.parent_by_token(token)? {
            Some(parent) => Ok(AuthParent(parent)),
            None => {
                debug!("Rejected unknown bearer token");
                Err(ApiError::unauthorized("Invalid token"))
            }
        }
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Admin {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config.auth.service_key.as_deref() else {
            return Err(ApiError::unauthorized("Admin access is not configured"));
        };
        let given = parts
            .headers
            .get(SERVICE_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing service key"))?;

        // blake3::Hash equality is constant-time
        if blake3::hash(given.as_bytes()) == blake3::hash(expected.as_bytes()) {
            Ok(Admin)
        } else {
            Err(ApiError::unauthorized("Invalid service key"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header: &str, value: &str) -> Parts {
        let (parts, _) = Request::builder().header(header, value).body(()).unwrap().into_parts();
        parts
    }

    #[test]
    fn test_bearer_parsing() {
        assert_eq!(bearer_token(&parts_with("authorization", "Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&parts_with("authorization", "Basic abc")), None);
        assert_eq!(bearer_token(&parts_with("authorization", "Bearer  ")), None);
        assert_eq!(bearer_token(&parts_with("x-other", "Bearer abc")), None);
    }
}
