// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! JSON error responses `{error, code}`

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::error;

use crate::locale::{Fallback, Locale};
use crate::CeriaError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub fallback_text: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody<'a> {
    error: &'a str,
    code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    fallback_text: Option<&'a str>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self { status, code, message: message.into(), fallback_text: None }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn kid_not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "KID_NOT_FOUND", "Kid not found")
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message)
    }

    /// AI is not configured; the child still gets something to read
    pub fn ai_unavailable(locale: Locale) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "AI_UNAVAILABLE", "AI service is not configured")
            .with_fallback(locale)
    }

    /// Map an error from an AI-backed call; AI failures carry fallback text in `locale`
    pub fn from_ai(err: CeriaError, locale: Locale) -> Self {
        let localized = err.is_ai_failure();
        let api = Self::from(err);
        if localized {
            api.with_fallback(locale)
        } else {
            api
        }
    }

    pub fn with_fallback(mut self, locale: Locale) -> Self {
        self.fallback_text = Some(Fallback::Unavailable.text(locale).to_string());
        self
    }
}

impl From<CeriaError> for ApiError {
    fn from(err: CeriaError) -> Self {
        match err {
            CeriaError::NotFound(what) => Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", format!("Not found: {}", what)),
            CeriaError::Unauthorized(msg) => Self::unauthorized(msg),
            CeriaError::Invalid(msg) => Self::bad_request(msg),
            CeriaError::InvalidImage(msg) => Self::new(StatusCode::BAD_REQUEST, "INVALID_IMAGE", msg),
            CeriaError::ActivityLocked(id) => Self::new(
                StatusCode::BAD_REQUEST,
                "ACTIVITY_LOCKED",
                format!("Activity {} is locked", id),
            ),
            CeriaError::AiUnavailable(msg) => Self::new(StatusCode::SERVICE_UNAVAILABLE, "AI_UNAVAILABLE", msg),
            CeriaError::RateLimited => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "AI_RATE_LIMITED",
                "AI service is busy, try again shortly",
            ),
            e @ (CeriaError::Upstream { .. } | CeriaError::MalformedResponse(_) | CeriaError::Http(_)) => {
                error!("AI call failed: {}", e);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "AI_ERROR", e.to_string())
            }
            e => {
                error!("Request failed: {}", e);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", "Internal server error")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: &self.message,
            code: self.code,
            fallback_text: self.fallback_text.as_deref(),
        };
        (self.status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (CeriaError::NotFound("x".into()), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (CeriaError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            (CeriaError::Invalid("x".into()), StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            (CeriaError::InvalidImage("x".into()), StatusCode::BAD_REQUEST, "INVALID_IMAGE"),
            (CeriaError::ActivityLocked("x".into()), StatusCode::BAD_REQUEST, "ACTIVITY_LOCKED"),
            (CeriaError::AiUnavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE, "AI_UNAVAILABLE"),
            (CeriaError::RateLimited, StatusCode::SERVICE_UNAVAILABLE, "AI_RATE_LIMITED"),
            (CeriaError::Config("x".into()), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        ];
        for (err, status, code) in cases {
            let api = ApiError::from(err);
            assert_eq!(api.status, status);
            assert_eq!(api.code, code);
        }
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let api = ApiError::from(CeriaError::Config("db password wrong".into()));
        assert!(!api.message.contains("password"));
    }

    #[test]
    fn test_ai_failures_carry_fallback_text() {
        let api = ApiError::from_ai(CeriaError::RateLimited, Locale::En);
        assert_eq!(api.code, "AI_RATE_LIMITED");
        assert_eq!(api.fallback_text.as_deref(), Some(Fallback::Unavailable.text(Locale::En)));

        let api = ApiError::from_ai(CeriaError::Upstream { status: 502, message: "bad gateway".into() }, Locale::Zh);
        assert_eq!(api.code, "AI_ERROR");
        assert_eq!(api.fallback_text.as_deref(), Some(Fallback::Unavailable.text(Locale::Zh)));

        let api = ApiError::from_ai(CeriaError::Invalid("text must not be empty".into()), Locale::Ms);
        assert_eq!(api.code, "INVALID_REQUEST");
        assert!(api.fallback_text.is_none());
    }

    #[tokio::test]
    async fn test_body_shape() {
        let response = ApiError::ai_unavailable(Locale::Zh).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = axum::body::to_bytes(response.into_body(), 10_000).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "AI_UNAVAILABLE");
        assert!(json["error"].is_string());
        assert_eq!(json["fallbackText"], Fallback::Unavailable.text(Locale::Zh));
    }
}
