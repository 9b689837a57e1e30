// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for Ceria

use thiserror::Error;

/// Result type alias for Ceria operations
pub type Result<T> = std::result::Result<T, CeriaError>;

/// Ceria error types
#[derive(Error, Debug)]
pub enum CeriaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Prompt template error: {0}")]
    Prompt(#[from] minijinja::Error),

    #[error("AI service not available: {0}")]
    AiUnavailable(String),

    #[error("AI service rate limited the request")]
    RateLimited,

    #[error("AI service returned status {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Unexpected AI response: {0}")]
    MalformedResponse(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid request: {0}")]
    Invalid(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Activity is locked: {0}")]
    ActivityLocked(String),
}

impl CeriaError {
    /// True when the upstream AI call is worth one more attempt after a pause
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, CeriaError::RateLimited)
    }

    /// True for failures of the AI service itself rather than of the request or storage
    pub fn is_ai_failure(&self) -> bool {
        matches!(
            self,
            CeriaError::AiUnavailable(_)
                | CeriaError::RateLimited
                | CeriaError::Upstream { .. }
                | CeriaError::MalformedResponse(_)
                | CeriaError::Http(_)
        )
    }
}
