// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! JSON HTTP API for the Ceria learning app

pub mod ai;
pub mod auth;
pub mod error;
pub mod generate;
pub mod kids;
pub mod learning;
pub mod rewards;

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::ai::{GeminiClient, GenerativeAi};
use crate::config::AppConfig;
use crate::db::Database;
use crate::generation::Generator;
use crate::locale::Locale;
use crate::media::MediaStore;
use crate::prompts::Prompts;

use error::ApiError;

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: AppConfig,
    pub ai: Option<Arc<dyn GenerativeAi>>,
    pub media: MediaStore,
    pub prompts: Prompts,
}

impl AppState {
    /// Build state from config; AI stays off when no API key is configured
    pub fn new(config: AppConfig, db: Database) -> crate::Result<Self> {
        let ai: Option<Arc<dyn GenerativeAi>> = if config.ai_available() {
            Some(Arc::new(GeminiClient::new(&config.ai)?))
        } else {
            warn!("GEMINI_API_KEY not set; AI endpoints will answer with fallbacks");
            None
        };
        Self::with_ai(config, db, ai)
    }

    pub fn with_ai(config: AppConfig, db: Database, ai: Option<Arc<dyn GenerativeAi>>) -> crate::Result<Self> {
        Ok(Self {
            media: MediaStore::from_config(&config.media),
            prompts: Prompts::new()?,
            db,
            config,
            ai,
        })
    }

    pub fn ai(&self) -> Option<&dyn GenerativeAi> {
        self.ai.as_deref()
    }

    /// The AI provider, or a 503 carrying fallback text in `locale`
    pub fn ai_for(&self, locale: Locale) -> Result<&dyn GenerativeAi, ApiError> {
        self.ai().ok_or_else(|| ApiError::ai_unavailable(locale))
    }

    pub fn generator<'a>(&'a self, ai: &'a dyn GenerativeAi) -> Generator<'a> {
        Generator::new(ai, &self.db, &self.media, &self.prompts, &self.config)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    ai_available: bool,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        ai_available: state.ai.is_some(),
    })
}

/// Create the web application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let media_prefix = state.config.media.url_prefix.trim_end_matches('/').to_string();
    let media_dir = state.media.root().to_path_buf();

    let router = Router::new()
        .route("/health", get(health))
        // Accounts
        .route("/api/parents", post(kids::register_parent))
        .route("/api/kids", get(kids::list_kids).post(kids::create_kid))
        .route("/api/kids/:kid_id", get(kids::get_kid).delete(kids::delete_kid))
        // Curriculum and play
        .route("/api/subjects", get(learning::list_subjects))
        .route("/api/subjects/:subject_id/themes", get(learning::list_themes))
        .route("/api/themes/:theme_id/activities", get(learning::list_activities))
        .route("/api/activities/:activity_id", get(learning::get_activity))
        .route("/api/kids/:kid_id/progress", get(learning::kid_progress))
        .route("/api/kids/:kid_id/activities/:activity_id/start", post(learning::start_activity))
        .route("/api/kids/:kid_id/activities/:activity_id/complete", post(learning::complete_activity))
        // Rewards
        .route("/api/equipment", get(rewards::equipment_catalog))
        .route("/api/pets", get(rewards::pet_catalog))
        .route("/api/kids/:kid_id/inventory", get(rewards::inventory))
        .route("/api/kids/:kid_id/pets", get(rewards::kid_pets))
        .route("/api/kids/:kid_id/equipped", get(rewards::get_equipped).put(rewards::set_equipped))
        .route("/api/leaderboard", get(rewards::leaderboard))
        // Speech and recognition
        .route("/api/tts", post(ai::tts))
        .route("/api/voice-tutor", post(ai::voice_tutor))
        .route("/api/pronunciation", post(ai::pronunciation))
        .route("/api/handwriting", post(ai::handwriting))
        // Generation
        .route("/api/generate-audio", post(generate::audio))
        .route("/api/generate-audio-batch", post(generate::audio_batch))
        .route("/api/generate-avatar", post(generate::avatar))
        .route("/api/generate-equipment", post(generate::equipment))
        .route("/api/generate-pets", post(generate::pets))
        .route("/api/generate-vocab-batch", post(generate::vocab_batch))
        .route("/api/generate-vocab-image", post(generate::vocab_image))
        .route("/api/fix-alphabet-images", post(generate::alphabet));

    let router = if media_prefix.is_empty() {
        router
    } else {
        router.nest_service(&media_prefix, ServeDir::new(media_dir))
    };

    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the web server with config and database
pub async fn start_server(config: AppConfig, db: Database) -> crate::Result<()> {
    let state = Arc::new(AppState::new(config.clone(), db)?);

    let addr = format!("{}:{}", config.web.host, config.web.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Ceria API listening on http://{}", addr);

    let router = create_router(state);
    axum::serve(listener, router)
        .await
        .map_err(|e| crate::CeriaError::Config(format!("Server error: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::stub::StubAi;
    use crate::seed::seed_all;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    const SERVICE_KEY: &str = "test-service-key";

    struct TestApp {
        router: Router,
        state: Arc<AppState>,
        _media: TempDir,
    }

    fn test_app(ai: Option<Arc<dyn GenerativeAi>>) -> TestApp {
        let media = TempDir::new().unwrap();
        let db = Database::in_memory().unwrap();
        seed_all(&db).unwrap();

        let mut config = AppConfig::default();
        config.media.dir = media.path().to_string_lossy().into_owned();
        config.auth.service_key = Some(SERVICE_KEY.to_string());
        config.generation.delay_ms = 0;
        config.generation.retry_backoff_ms = 0;

        let state = Arc::new(AppState::with_ai(config, db, ai).unwrap());
        TestApp { router: create_router(state.clone()), state, _media: media }
    }

    impl TestApp {
        async fn call(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
            let mut req = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                req = req.header("authorization", format!("Bearer {}", token));
            }
            if uri.starts_with("/api/generate") || uri.starts_with("/api/fix") {
                req = req.header("x-service-key", SERVICE_KEY);
            }
            let req = match body {
                Some(body) => req
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => req.body(Body::empty()).unwrap(),
            };

            let resp = self.router.clone().oneshot(req).await.unwrap();
            let status = resp.status();
            let bytes = axum::body::to_bytes(resp.into_body(), 1_000_000).await.unwrap();
            let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
            (status, value)
        }

        /// Admin call with an explicit (possibly missing) service key
        async fn admin_call(&self, uri: &str, key: Option<&str>, body: Value) -> (StatusCode, Value) {
            let mut req = Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json");
            if let Some(key) = key {
                req = req.header("x-service-key", key);
            }
            let req = req.body(Body::from(body.to_string())).unwrap();
            let resp = self.router.clone().oneshot(req).await.unwrap();
            let status = resp.status();
            let bytes = axum::body::to_bytes(resp.into_body(), 1_000_000).await.unwrap();
            let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
            (status, value)
        }

        /// Start and finish every activity of the first Malay theme
        async fn finish_first_theme(&self, token: &str, kid_id: &str) {
            for activity in ["bm-huruf-abjad", "bm-huruf-tulis", "bm-huruf-padan"] {
                let base = format!("/api/kids/{}/activities/{}", kid_id, activity);
                let (status, _) = self.call("POST", &format!("{}/start", base), Some(token), None).await;
                assert_eq!(status, StatusCode::OK);
                let (status, _) = self
                    .call("POST", &format!("{}/complete", base), Some(token), Some(json!({"score": 90})))
                    .await;
                assert_eq!(status, StatusCode::OK);
            }
        }

        /// Register a parent with one kid; returns (token, kid id)
        async fn family(&self, email: &str) -> (String, String) {
            let (status, parent) = self
                .call("POST", "/api/parents", None, Some(json!({"email": email, "displayName": "Parent"})))
                .await;
            assert_eq!(status, StatusCode::CREATED);
            let token = parent["token"].as_str().unwrap().to_string();

            let (status, kid) = self
                .call("POST", "/api/kids", Some(&token), Some(json!({"name": "Wei Ling", "locale": "zh"})))
                .await;
            assert_eq!(status, StatusCode::CREATED);
            (token, kid["id"].as_str().unwrap().to_string())
        }
    }

    fn png_data_url() -> String {
        use base64::{engine::general_purpose::STANDARD, Engine as _};
        let img = image::DynamicImage::ImageLuma8(image::GrayImage::new(8, 8));
        let mut out = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png).unwrap();
        format!("data:image/png;base64,{}", STANDARD.encode(out))
    }

    #[tokio::test]
    async fn test_health_reports_ai_state() {
        let app = test_app(None);
        let (status, body) = app.call("GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["aiAvailable"], false);
    }

    #[tokio::test]
    async fn test_kid_routes_require_token() {
        let app = test_app(None);
        let (status, body) = app.call("GET", "/api/kids", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHORIZED");

        let (status, _) = app.call("GET", "/api/kids", Some("ceria_bogus"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_kid_profile_and_isolation() {
        let app = test_app(None);
        let (token, kid_id) = app.family("mum@example.my").await;
        let (other_token, _) = app.family("dad@example.my").await;

        let (status, kid) = app.call("GET", &format!("/api/kids/{}", kid_id), Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(kid["locale"], "zh");
        assert_eq!(kid["levelProgress"]["level"], 1);

        let (status, body) = app.call("GET", &format!("/api/kids/{}", kid_id), Some(&other_token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "KID_NOT_FOUND");

        let (status, _) = app
            .call("GET", &format!("/api/kids/{}/equipped", kid_id), Some(&other_token), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app.call("DELETE", &format!("/api/kids/{}", kid_id), Some(&other_token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = app.call("DELETE", &format!("/api/kids/{}", kid_id), Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_play_flow() {
        let app = test_app(None);
        let (token, kid_id) = app.family("ibu@example.my").await;

        let (status, subjects) = app.call("GET", "/api/subjects?locale=en", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(subjects[0]["title"], "Malay");

        let (_, themes) = app
            .call("GET", &format!("/api/subjects/bahasa-melayu/themes?kidId={}", kid_id), Some(&token), None)
            .await;
        let theme_id = themes[0]["id"].as_str().unwrap().to_string();

        let (_, activities) = app
            .call("GET", &format!("/api/themes/{}/activities?kidId={}", theme_id, kid_id), Some(&token), None)
            .await;
        let first = activities[0]["id"].as_str().unwrap().to_string();
        let second = activities[1]["id"].as_str().unwrap().to_string();
        assert_eq!(activities[0]["status"], "available");
        assert_eq!(activities[1]["status"], "locked");

        let start = |id: &str| format!("/api/kids/{}/activities/{}/start", kid_id, id);
        let (status, body) = app.call("POST", &start(&second), Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "ACTIVITY_LOCKED");

        let (status, progress) = app.call("POST", &start(&first), Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(progress["status"], "in_progress");

        let complete = format!("/api/kids/{}/activities/{}/complete", kid_id, first);
        let (status, body) = app.call("POST", &complete, Some(&token), Some(json!({"score": 150}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_REQUEST");

        let (status, settlement) = app.call("POST", &complete, Some(&token), Some(json!({"score": 85}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(settlement["stars"], 3);
        assert!(settlement["xpGained"].as_u64().unwrap() > 0);

        let (_, board) = app.call("GET", "/api/leaderboard?limit=5", None, None).await;
        assert_eq!(board[0]["kidId"], kid_id.as_str());
        assert!(board[0].get("parentId").is_none());
    }

    #[tokio::test]
    async fn test_equip_requires_ownership() {
        let app = test_app(None);
        let (token, kid_id) = app.family("ibu@example.my").await;
        let uri = format!("/api/kids/{}/equipped", kid_id);

        let (status, _) = app
            .call("PUT", &uri, Some(&token), Some(json!({"slot": "weapon", "itemId": "diamond-sword"})))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = app
            .call("PUT", &uri, Some(&token), Some(json!({"slot": "cape", "itemId": "x"})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_REQUEST");

        let (status, equipped) = app.call("PUT", &uri, Some(&token), Some(json!({"slot": "weapon", "itemId": null}))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(equipped["weapon"].is_null());
    }

    #[tokio::test]
    async fn test_speech_without_ai_is_unavailable() {
        let app = test_app(None);
        let (status, body) = app
            .call("POST", "/api/tts", None, Some(json!({"text": "kucing", "locale": "ms"})))
            .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "AI_UNAVAILABLE");
        assert!(body["fallbackText"].as_str().unwrap().contains("Maaf"));
    }

    #[tokio::test]
    async fn test_handwriting_without_ai_falls_back() {
        let app = test_app(None);
        let (status, body) = app
            .call("POST", "/api/handwriting", None, Some(json!({"image": png_data_url(), "expectedLetter": "A"})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["recognizedLetter"], "?");
        assert_eq!(body["isCorrect"], false);

        let (status, body) = app
            .call("POST", "/api/handwriting", None, Some(json!({"image": "bm90IGFuIGltYWdl", "expectedLetter": "A"})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_IMAGE");
    }

    #[tokio::test]
    async fn test_malformed_json_is_rejected() {
        let app = test_app(None);
        let req = Request::builder()
            .method("POST")
            .uri("/api/tts")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let resp = app.router.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_generation_requires_service_key() {
        let app = test_app(Some(Arc::new(StubAi::default())));
        let req = Request::builder()
            .method("POST")
            .uri("/api/generate-vocab-batch")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let resp = app.router.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_vocab_batch_pages_through_list() {
        let app = test_app(Some(Arc::new(StubAi::default())));
        let (status, body) = app
            .call("POST", "/api/generate-vocab-batch", None, Some(json!({"startIndex": 0, "count": 5})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["processed"], 5);
        assert_eq!(body["total"], 15);
        assert_eq!(body["nextIndex"], 5);
        assert_eq!(body["results"][0]["status"], "generated");

        let (_, body) = app
            .call("POST", "/api/generate-vocab-batch", None, Some(json!({"startIndex": 10, "count": 5})))
            .await;
        assert!(body["nextIndex"].is_null());
        assert_eq!(app.state.db.list_assets(crate::db::AssetKind::VocabImage).unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_avatar_for_own_kid() {
        let app = test_app(Some(Arc::new(StubAi::default())));
        let (token, kid_id) = app.family("ibu@example.my").await;

        let (status, asset) = app
            .call("POST", "/api/generate-avatar", Some(&token), Some(json!({"kidId": kid_id})))
            .await;
        assert_eq!(status, StatusCode::OK);

        let (_, kid) = app.call("GET", &format!("/api/kids/{}", kid_id), Some(&token), None).await;
        assert_eq!(kid["avatarUrl"], asset["url"]);
    }

    #[tokio::test]
    async fn test_pronunciation_route() {
        let ai = StubAi::replying(&[r#"{"transcription":"bola","isCorrect":true,"score":95,"feedback":"Bagus!"}"#]);
        let app = test_app(Some(Arc::new(ai)));
        let body = json!({"audio": "data:audio/webm;base64,AAAA", "expectedText": "bola", "locale": "ms"});
        let (status, result) = app.call("POST", "/api/pronunciation", None, Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(result["isCorrect"], true);
        assert_eq!(result["score"], 95);
        assert_eq!(result["transcription"], "bola");
        assert_eq!(result["fallback"], false);

        let (status, body) = app
            .call("POST", "/api/pronunciation", None, Some(json!({"audio": "%%%", "expectedText": "bola"})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn test_pronunciation_route_without_ai_falls_back() {
        let app = test_app(None);
        let body = json!({"audio": "AAAA", "expectedText": "猫", "locale": "zh"});
        let (status, result) = app.call("POST", "/api/pronunciation", None, Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(result["isCorrect"], false);
        assert_eq!(result["score"], 0);
        assert_eq!(result["fallback"], true);
        assert_eq!(result["feedback"], crate::locale::Fallback::PronunciationRetry.text(Locale::Zh));
    }

    #[tokio::test]
    async fn test_voice_tutor_route() {
        let app = test_app(Some(Arc::new(StubAi::replying(&["A untuk ayam!"]))));
        let body = json!({"content": "Huruf A", "contentType": "letter", "locale": "ms"});
        let (status, result) = app.call("POST", "/api/voice-tutor", None, Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(result["text"], "A untuk ayam!");
        assert_eq!(result["mimeType"], "audio/wav");
        assert!(result["audio"].is_string());
        assert_eq!(result["fallback"], false);
    }

    #[tokio::test]
    async fn test_voice_tutor_route_without_ai() {
        let app = test_app(None);
        let body = json!({"content": "Hello", "locale": "en", "directTTS": true});
        let (status, result) = app.call("POST", "/api/voice-tutor", None, Some(body)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(result["code"], "AI_UNAVAILABLE");
        assert_eq!(result["fallbackText"], crate::locale::Fallback::Unavailable.text(Locale::En));
    }

    #[tokio::test]
    async fn test_single_audio_route() {
        let app = test_app(Some(Arc::new(StubAi::default())));
        let body = json!({"text": "Selamat pagi", "locale": "ms"});
        let (status, asset) = app.admin_call("/api/generate-audio", Some(SERVICE_KEY), body.clone()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(asset["key"], "selamat-pagi");
        assert_eq!(asset["mimeType"], "audio/wav");
        assert!(asset["url"].as_str().unwrap().ends_with("selamat-pagi-ms.wav"));

        let (status, result) = app.admin_call("/api/generate-audio", Some("wrong-key"), body.clone()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(result["code"], "UNAUTHORIZED");
        let (status, _) = app.admin_call("/api/generate-audio", None, body).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_vocab_image_route() {
        let app = test_app(Some(Arc::new(StubAi::default())));
        let (status, asset) = app
            .call("POST", "/api/generate-vocab-image", None, Some(json!({"word": "kucing"})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(asset["mimeType"], "image/png");
        assert!(asset["url"].is_string());
    }

    #[tokio::test]
    async fn test_vocab_image_route_rate_limited_twice() {
        let ai = StubAi::failing_images(vec![crate::CeriaError::RateLimited, crate::CeriaError::RateLimited]);
        let app = test_app(Some(Arc::new(ai)));
        let (status, body) = app
            .call("POST", "/api/generate-vocab-image", None, Some(json!({"word": "kucing"})))
            .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "AI_RATE_LIMITED");
        assert_eq!(body["fallbackText"], crate::locale::Fallback::Unavailable.text(Locale::Ms));
    }

    #[tokio::test]
    async fn test_fix_alphabet_route() {
        let app = test_app(Some(Arc::new(StubAi::default())));
        let (status, body) = app
            .call("POST", "/api/fix-alphabet-images", None, Some(json!({"startIndex": 0, "count": 5})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 26);
        assert_eq!(body["processed"], 5);
        assert_eq!(body["nextIndex"], 5);
    }

    #[tokio::test]
    async fn test_fix_alphabet_route_without_ai() {
        let app = test_app(None);
        let (status, body) = app.call("POST", "/api/fix-alphabet-images", None, Some(json!({}))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "AI_UNAVAILABLE");
        assert!(body["fallbackText"].is_string());
    }

    #[tokio::test]
    async fn test_equip_owned_rewards() {
        let app = test_app(None);
        let (token, kid_id) = app.family("ibu@example.my").await;
        let (other_token, _) = app.family("ayah@example.my").await;
        app.finish_first_theme(&token, &kid_id).await;

        let (_, inventory) = app.call("GET", &format!("/api/kids/{}/inventory", kid_id), Some(&token), None).await;
        assert!(inventory.as_array().unwrap().iter().any(|item| item["id"] == "leather-helmet"));

        let uri = format!("/api/kids/{}/equipped", kid_id);
        let (status, equipped) = app
            .call("PUT", &uri, Some(&token), Some(json!({"slot": "helmet", "itemId": "leather-helmet"})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(equipped["helmet"], "leather-helmet");

        let (status, equipped) = app
            .call("PUT", &uri, Some(&token), Some(json!({"slot": "pet", "itemId": "kitten"})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(equipped["pet"], "kitten");

        let (status, body) = app
            .call("PUT", &uri, Some(&token), Some(json!({"slot": "boots", "itemId": "leather-helmet"})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_REQUEST");

        let (status, body) = app
            .call("PUT", &uri, Some(&other_token), Some(json!({"slot": "helmet", "itemId": null})))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "KID_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_pet_routes() {
        let app = test_app(None);
        let (token, kid_id) = app.family("ibu@example.my").await;
        let (other_token, _) = app.family("ayah@example.my").await;

        let (status, catalog) = app.call("GET", "/api/pets", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(catalog.as_array().unwrap().len(), 6);

        let uri = format!("/api/kids/{}/pets", kid_id);
        let (_, pets) = app.call("GET", &uri, Some(&token), None).await;
        assert!(pets.as_array().unwrap().is_empty());

        app.finish_first_theme(&token, &kid_id).await;
        let (status, pets) = app.call("GET", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(pets.as_array().unwrap().len(), 1);
        assert_eq!(pets[0]["id"], "kitten");

        let (status, body) = app.call("GET", &uri, Some(&other_token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "KID_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_foreign_kid_hidden_before_body_checks() {
        let app = test_app(None);
        let (_, kid_id) = app.family("ibu@example.my").await;
        let (other_token, _) = app.family("ayah@example.my").await;

        let complete = format!("/api/kids/{}/activities/bm-huruf-abjad/complete", kid_id);
        let (status, body) = app
            .call("POST", &complete, Some(&other_token), Some(json!({"score": "lots"})))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "KID_NOT_FOUND");

        let (status, body) = app
            .call("PUT", &format!("/api/kids/{}/equipped", kid_id), Some(&other_token), Some(json!({"slot": 7})))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "KID_NOT_FOUND");
    }
}
