// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for Ceria

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::locale::Locale;

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    /// Generative AI settings
    #[serde(default)]
    pub ai: AiConfig,

    /// HTTP server settings
    #[serde(default)]
    pub web: WebConfig,

    /// Database settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Where generated audio and images are written
    #[serde(default)]
    pub media: MediaConfig,

    /// Batch generation pacing
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Reward rules
    #[serde(default)]
    pub rewards: RewardConfig,

    /// Admin access
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AiConfig {
    #[serde(default = "default_ai_url")]
    pub base_url: String,
    #[serde(default)]
    pub models: ModelConfig,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub voices: VoiceConfig,
    /// Read from `GEMINI_API_KEY`; never written back to disk
    #[serde(skip)]
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ModelConfig {
    #[serde(default = "default_text_model")]
    pub text: String,
    #[serde(default = "default_text_model")]
    pub vision: String,
    #[serde(default = "default_tts_model")]
    pub tts: String,
    #[serde(default = "default_image_model")]
    pub image: String,
}

/// Prebuilt TTS voice per locale
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct VoiceConfig {
    #[serde(default = "default_voice")]
    pub ms: String,
    #[serde(default = "default_voice")]
    pub zh: String,
    #[serde(default = "default_voice")]
    pub en: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WebConfig {
    #[serde(default = "default_web_host")]
    pub host: String,
    #[serde(default = "default_web_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MediaConfig {
    #[serde(default = "default_media_dir")]
    pub dir: String,
    #[serde(default = "default_media_prefix")]
    pub url_prefix: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GenerationConfig {
    /// Pause between consecutive AI calls in a batch
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    /// Base backoff after a 429; multiplied by the attempt number
    #[serde(default = "default_backoff_ms")]
    pub retry_backoff_ms: u64,
    #[serde(default = "default_max_batch")]
    pub max_batch: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct RewardConfig {
    /// Grant the activity's XP again when a completed activity is replayed
    #[serde(default)]
    pub replay_xp: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AuthConfig {
    /// Read from `CERIA_SERVICE_KEY`; never written back to disk
    #[serde(skip)]
    pub service_key: Option<String>,
}

// Default value functions
fn default_ai_url() -> String { "https://generativelanguage.googleapis.com/v1beta".to_string() }
fn default_timeout() -> u64 { 60 }
fn default_text_model() -> String { "gemini-2.5-flash".to_string() }
fn default_tts_model() -> String { "gemini-2.5-flash-preview-tts".to_string() }
fn default_image_model() -> String { "gemini-2.5-flash-image".to_string() }
fn default_voice() -> String { "Kore".to_string() }
fn default_web_host() -> String { "127.0.0.1".to_string() }
fn default_web_port() -> u16 { 8080 }
fn default_db_path() -> String { "ceria.db".to_string() }
fn default_media_dir() -> String { "media".to_string() }
fn default_media_prefix() -> String { "/media".to_string() }
fn default_delay_ms() -> u64 { 2000 }
fn default_backoff_ms() -> u64 { 5000 }
fn default_max_batch() -> usize { 10 }

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: default_ai_url(),
            models: ModelConfig::default(),
            timeout_secs: default_timeout(),
            voices: VoiceConfig::default(),
            api_key: None,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            text: default_text_model(),
            vision: default_text_model(),
            tts: default_tts_model(),
            image: default_image_model(),
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            ms: default_voice(),
            zh: default_voice(),
            en: "Puck".to_string(),
        }
    }
}

impl VoiceConfig {
    pub fn for_locale(&self, locale: Locale) -> &str {
        match locale {
            Locale::Ms => &self.ms,
            Locale::Zh => &self.zh,
            Locale::En => &self.en,
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            dir: default_media_dir(),
            url_prefix: default_media_prefix(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            retry_backoff_ms: default_backoff_ms(),
            max_batch: default_max_batch(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file, then apply environment overrides
    pub fn load(path: &Path) -> crate::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)
                .map_err(|e| crate::CeriaError::Config(format!("Failed to parse config: {}", e)))?
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Save configuration to a JSON file (secrets are skipped)
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply overrides from an environment lookup
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("GEMINI_API_KEY") {
            self.ai.api_key = Some(key);
        }
        if let Some(key) = non_empty("CERIA_SERVICE_KEY") {
            self.auth.service_key = Some(key);
        }
        if let Some(path) = non_empty("CERIA_DATABASE_PATH") {
            self.database.path = path;
        }
        if let Some(dir) = non_empty("CERIA_MEDIA_DIR") {
            self.media.dir = dir;
        }
    }

    /// Whether generative AI calls can be made at all
    pub fn ai_available(&self) -> bool {
        self.ai.api_key.is_some()
    }

    /// Check values that would make the server misbehave
    pub fn validate(&self) -> crate::Result<()> {
        if self.generation.max_batch == 0 {
            return Err(crate::CeriaError::Config("generation.max_batch must be at least 1".into()));
        }
        if !self.media.url_prefix.starts_with('/') {
            return Err(crate::CeriaError::Config("media.url_prefix must start with '/'".into()));
        }
        if self.ai.timeout_secs == 0 {
            return Err(crate::CeriaError::Config("ai.timeout_secs must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"web": {"port": 9000}}"#).unwrap();
        assert_eq!(config.web.port, 9000);
        assert_eq!(config.web.host, "127.0.0.1");
        assert_eq!(config.generation.max_batch, 10);
        assert!(!config.rewards.replay_xp);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("GEMINI_API_KEY", "abc"),
            ("CERIA_SERVICE_KEY", "svc"),
            ("CERIA_DATABASE_PATH", "/tmp/x.db"),
            ("CERIA_MEDIA_DIR", "  "),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert!(config.ai_available());
        assert_eq!(config.auth.service_key.as_deref(), Some("svc"));
        assert_eq!(config.database.path, "/tmp/x.db");
        assert_eq!(config.media.dir, "media");
    }

    #[test]
    fn test_secrets_not_serialized() {
        let mut config = AppConfig::default();
        config.ai.api_key = Some("secret-key".into());
        config.auth.service_key = Some("secret-svc".into());
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret-key"));
        assert!(!json.contains("secret-svc"));
    }

    #[test]
    fn test_validate() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());
        config.generation.max_batch = 0;
        assert!(config.validate().is_err());
    }
}
