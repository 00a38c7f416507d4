use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod analytics;
mod auth;
mod config;
mod db;
mod dto;
mod error;
mod handlers;
mod models;
mod services;

use auth::rate_limit::RateLimitState;
use config::{Config, LlmMode, StoreBackend};
use db::RecordStore;
use services::{CompletionClient, MusicCatalog, NarrativeGenerator, OpenAiClient, OpenAiSettings};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub config: Arc<Config>,
    pub narrator: NarrativeGenerator,
    pub music: Arc<MusicCatalog>,
    pub rate_limiter: RateLimitState,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moodlog_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env()?);

    let store: Arc<dyn RecordStore> = match config.store_backend {
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;
            let pool = db::pool::create_pool(url).await?;

            sqlx::migrate!("./migrations").run(&pool).await?;
            tracing::info!("Database migrations applied");

            Arc::new(db::postgres::PgRecordStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory record store; data is lost on restart");
            Arc::new(db::memory::MemoryStore::new())
        }
    };

    let client: Option<Arc<dyn CompletionClient>> =
        match (config.llm_mode, config.openai_api_key.clone()) {
            (LlmMode::Remote, Some(api_key)) => Some(Arc::new(OpenAiClient::new(OpenAiSettings {
                api_key,
                base_url: config.openai_base_url.clone(),
                model: config.openai_model.clone(),
                temperature: config.openai_temperature,
            })?)),
            (LlmMode::Remote, None) => {
                tracing::warn!("OPENAI_API_KEY not set; narrative routes will answer 503");
                None
            }
            (LlmMode::Offline, _) => {
                tracing::info!("LLM_MODE=offline; reports use the statistics template");
                None
            }
        };
    let narrator = NarrativeGenerator::new(client, config.llm_mode, config.display_offset());

    let music = Arc::new(MusicCatalog::load(&config.music_catalog_path)?);

    let state = AppState {
        store,
        config: config.clone(),
        narrator,
        music,
        rate_limiter: RateLimitState::new(),
    };

    let app = build_router(state)
        .layer(cors_layer(&config)?)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http());

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz));

    // Routes that may call the completion service
    let ai_routes = Router::new()
        .route("/api/reports", post(handlers::reports::create_report))
        .route("/api/music/suggestion", post(handlers::reports::suggest_music))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::rate_limit::rate_limit_ai,
        ));

    let protected_routes = Router::new()
        // Records
        .route("/api/records", get(handlers::records::list_records))
        .route(
            "/api/records/by-date/:date",
            get(handlers::records::list_records_on_date),
        )
        .route(
            "/api/records/:kind/:id",
            get(handlers::records::get_record)
                .put(handlers::records::update_record)
                .delete(handlers::records::delete_record),
        )
        // Entries
        .route("/api/emotions", post(handlers::entries::create_emotion))
        .route("/api/diaries", post(handlers::entries::create_diary))
        // Stats
        .route("/api/stats/calendar", get(handlers::stats::get_calendar))
        .route("/api/stats/period", get(handlers::stats::get_period_stats))
        .route("/api/stats/patterns", get(handlers::stats::get_patterns))
        // Music catalogue
        .route("/api/music/fallback", get(handlers::reports::music_fallback))
        .merge(ai_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

fn cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = vec![config.frontend_url.parse::<axum::http::HeaderValue>()?];
    for o in &config.cors_extra_origins {
        if let Ok(hv) = o.parse::<axum::http::HeaderValue>() {
            origins.push(hv);
        }
    }

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .allow_credentials(true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use chrono::{Datelike, Duration, Utc};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::db::memory::MemoryStore;
    use crate::models::record::{local_today, EmotionLabel, Record, RecordKind};

    const CATALOG: &str = include_str!("../resources/music_catalog.json");

    fn test_app(store: MemoryStore, config: Config) -> Router {
        let config = Arc::new(config);
        let narrator = NarrativeGenerator::new(None, config.llm_mode, config.display_offset());
        build_router(AppState {
            store: Arc::new(store),
            config,
            narrator,
            music: Arc::new(MusicCatalog::from_json(CATALOG).unwrap()),
            rate_limiter: RateLimitState::new(),
        })
    }

    fn bearer(owner: &str) -> String {
        format!(
            "Bearer {}",
            auth::jwt::issue_token(owner, 600, &Config::for_tests())
        )
    }

    async fn send(app: &Router, method: &str, uri: &str, owner: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(owner) = owner {
            req = req.header(header::AUTHORIZATION, bearer(owner));
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn today() -> chrono::NaiveDate {
        local_today(Utc::now(), Config::for_tests().display_offset())
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = test_app(MemoryStore::new(), Config::for_tests());
        let (status, body) = send(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, _) = send(&app, "GET", "/readyz", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn api_requires_a_bearer_token() {
        let app = test_app(MemoryStore::new(), Config::for_tests());
        let (status, body) = send(&app, "GET", "/api/records", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["kind"], "unauthorized");
    }

    #[tokio::test]
    async fn emotion_round_trip_through_listing() {
        let app = test_app(MemoryStore::new(), Config::for_tests());
        let (status, created) = send(
            &app,
            "POST",
            "/api/emotions",
            Some("alice"),
            Some(json!({ "emotion_label": "happy", "note": "sunny walk" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["emotion_score"], 80);
        assert_eq!(created["type"], "emotion");

        let (status, listed) = send(&app, "GET", "/api/records?limit=5", Some("alice"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed["success"], true);
        assert_eq!(listed["records"].as_array().unwrap().len(), 1);

        // Another owner sees nothing.
        let (_, other) = send(&app, "GET", "/api/records", Some("bob"), None).await;
        assert!(other["records"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn range_and_limit_are_mutually_exclusive() {
        let app = test_app(MemoryStore::new(), Config::for_tests());
        let (status, body) = send(
            &app,
            "GET",
            "/api/records?start=2026-05-01&end=2026-05-07&limit=3",
            Some("alice"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["kind"], "validation");
    }

    #[cfg(target_pointer_width = "64")]
    #[tokio::test]
    async fn limit_past_the_signed_range_is_rejected() {
        let app = test_app(MemoryStore::new(), Config::for_tests());
        let uri = format!("/api/records?limit={}", usize::MAX);
        let (status, body) = send(&app, "GET", &uri, Some("alice"), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["kind"], "validation");
    }

    #[tokio::test]
    async fn store_failure_lists_as_empty_envelope() {
        let store = MemoryStore::new();
        store.set_unavailable(true).await;
        let app = test_app(store, Config::for_tests());

        let (status, body) = send(&app, "GET", "/api/records", Some("alice"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert!(body["records"].as_array().unwrap().is_empty());
        assert!(body["error"].is_string());

        let (status, body) = send(&app, "GET", "/api/stats/patterns", Some("alice"), None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["kind"], "store_unavailable");
    }

    #[tokio::test]
    async fn fourth_diary_of_the_day_is_rejected_before_writing() {
        let store = MemoryStore::new();
        let app = test_app(store.clone(), Config::for_tests());
        let diary = json!({ "emotion_label": "good", "content": "a quiet day" });

        for _ in 0..3 {
            let (status, _) = send(&app, "POST", "/api/diaries", Some("alice"), Some(diary.clone())).await;
            assert_eq!(status, StatusCode::CREATED);
        }
        let (status, body) = send(&app, "POST", "/api/diaries", Some("alice"), Some(diary)).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"]["kind"], "diary_limit");

        assert_eq!(store.count_diaries_on("alice", today()).await.unwrap(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_diaries_never_exceed_the_daily_limit() {
        let store = MemoryStore::new();
        let app = test_app(store.clone(), Config::for_tests());
        let diary = json!({ "emotion_label": "okay", "content": "rush hour" });

        let handles: Vec<_> = (0..12)
            .map(|_| {
                let app = app.clone();
                let diary = diary.clone();
                tokio::spawn(async move {
                    send(&app, "POST", "/api/diaries", Some("alice"), Some(diary)).await.0
                })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                StatusCode::CREATED => created += 1,
                status => assert_eq!(status, StatusCode::TOO_MANY_REQUESTS),
            }
        }
        assert_eq!(created, 3);
        assert_eq!(store.count_diaries_on("alice", today()).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn entries_reject_bad_dates_and_labels() {
        let app = test_app(MemoryStore::new(), Config::for_tests());
        let future = today() + Duration::days(1);
        let (status, _) = send(
            &app,
            "POST",
            "/api/emotions",
            Some("alice"),
            Some(json!({ "emotion_label": "calm", "date": future })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = send(
            &app,
            "POST",
            "/api/diaries",
            Some("alice"),
            Some(json!({ "emotion_label": "great", "content": "wrong vocabulary" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn update_and_delete_are_owner_scoped() {
        let app = test_app(MemoryStore::new(), Config::for_tests());
        let (_, created) = send(
            &app,
            "POST",
            "/api/emotions",
            Some("alice"),
            Some(json!({ "emotion_label": "down" })),
        )
        .await;
        let uri = format!("/api/records/emotion/{}", created["id"].as_str().unwrap());

        let (status, _) = send(&app, "PUT", &uri, Some("bob"), Some(json!({ "emotion_score": 90 }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, updated) = send(&app, "PUT", &uri, Some("alice"), Some(json!({ "emotion_score": 55 }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["emotion_score"], 55);
        assert!(updated["updated_at"].is_string());

        let (status, _) = send(&app, "DELETE", &uri, Some("alice"), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, "GET", &uri, Some("alice"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn calendar_and_period_stats() {
        let app = test_app(MemoryStore::new(), Config::for_tests());
        for label in ["great", "calm"] {
            send(&app, "POST", "/api/emotions", Some("alice"), Some(json!({ "emotion_label": label }))).await;
        }

        let (status, cal) = send(&app, "GET", "/api/stats/calendar", Some("alice"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cal["cells"].as_array().unwrap().len(), 42);
        assert_eq!(cal["month_average"], 80);

        let (status, period) = send(&app, "GET", "/api/stats/period?period=month", Some("alice"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(period["stats"]["average_score"], 80);
        assert_eq!(period["stats"]["total_count"], 2);
        assert_eq!(period["weekday_averages"].as_array().unwrap().len(), 7);

        let (status, _) = send(&app, "GET", "/api/stats/calendar?year=2026&month=13", Some("alice"), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn calendar_beyond_the_date_range_is_a_validation_error() {
        let app = test_app(MemoryStore::new(), Config::for_tests());
        let uri = format!("/api/stats/calendar?year={}&month=12", chrono::NaiveDate::MAX.year());
        let (status, body) = send(&app, "GET", &uri, Some("alice"), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["kind"], "validation");
    }

    #[tokio::test]
    async fn patterns_without_data() {
        let app = test_app(MemoryStore::new(), Config::for_tests());
        let (status, body) = send(&app, "GET", "/api/stats/patterns", Some("alice"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["has_data"], false);
        assert!(body["analysis"].is_null());
    }

    #[tokio::test]
    async fn offline_report_and_music_routes() {
        let store = MemoryStore::new();
        let ts = Utc::now() - Duration::days(1);
        let mut record = Record {
            id: uuid::Uuid::new_v4(),
            owner_id: "alice".into(),
            kind: RecordKind::Emotion,
            date: ts.date_naive(),
            timestamp: ts,
            emotion_score: Some(70),
            emotion_label: EmotionLabel::Happy,
            emotion_emoji: None,
            note: None,
            content: None,
            is_shared: false,
            created_at: ts,
            updated_at: None,
        };
        store.insert_raw(record.clone()).await;
        record.id = uuid::Uuid::new_v4();
        record.emotion_score = Some(150);
        store.insert_raw(record).await;
        let app = test_app(store, Config::for_tests());

        let (status, body) = send(&app, "POST", "/api/reports", Some("alice"), Some(json!({ "preset": "last_week" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["report"]["source"], "statistics");
        assert!(body["report"]["summary"]["overview"]
            .as_str()
            .unwrap()
            .contains("average score of 70"));

        let (status, body) = send(
            &app,
            "POST",
            "/api/music/suggestion",
            Some("alice"),
            Some(json!({ "emotion_label": "calm" })),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["kind"], "not_configured");

        let (status, body) = send(&app, "GET", "/api/music/fallback?label=calm", Some("alice"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tracks"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn ai_routes_are_throttled_per_owner() {
        let mut config = Config::for_tests();
        config.ai_calls_per_hour = 2;
        let app = test_app(MemoryStore::new(), config);
        let body = json!({ "preset": "last_week" });

        for _ in 0..2 {
            let (status, _) = send(&app, "POST", "/api/reports", Some("alice"), Some(body.clone())).await;
            assert_eq!(status, StatusCode::OK);
        }
        let (status, err) = send(&app, "POST", "/api/reports", Some("alice"), Some(body.clone())).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err["error"]["kind"], "rate_limited");

        let (status, _) = send(&app, "POST", "/api/reports", Some("bob"), Some(body)).await;
        assert_eq!(status, StatusCode::OK);
    }
}
