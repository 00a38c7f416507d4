use chrono::{FixedOffset, Offset, Utc};
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmMode {
    Remote,
    Offline,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub frontend_url: String,
    pub cors_extra_origins: Vec<String>,

    pub store_backend: StoreBackend,
    pub database_url: Option<String>,

    pub jwt_secret: String,

    pub llm_mode: LlmMode,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub openai_temperature: f32,

    /// Offset used for "today", weekday and time-of-day buckets.
    pub display_utc_offset_minutes: i32,
    pub music_catalog_path: String,
    pub ai_calls_per_hour: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let store_backend = match env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "postgres".into())
            .to_lowercase()
            .as_str()
        {
            "postgres" => StoreBackend::Postgres,
            "memory" => StoreBackend::Memory,
            other => anyhow::bail!("STORE_BACKEND must be postgres or memory, got {other}"),
        };

        let database_url = env::var("DATABASE_URL").ok().filter(|s| !s.is_empty());
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL must be set when STORE_BACKEND=postgres");
        }

        let llm_mode = match env::var("LLM_MODE")
            .unwrap_or_else(|_| "remote".into())
            .to_lowercase()
            .as_str()
        {
            "remote" => LlmMode::Remote,
            "offline" => LlmMode::Offline,
            other => anyhow::bail!("LLM_MODE must be remote or offline, got {other}"),
        };

        let display_utc_offset_minutes: i32 = env::var("DISPLAY_UTC_OFFSET_MINUTES")
            .unwrap_or_else(|_| "0".into())
            .parse()
            .map_err(|_| anyhow::anyhow!("DISPLAY_UTC_OFFSET_MINUTES must be a number"))?;
        if FixedOffset::east_opt(display_utc_offset_minutes * 60).is_none() {
            anyhow::bail!("DISPLAY_UTC_OFFSET_MINUTES is out of range");
        }

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a number"))?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            cors_extra_origins: env::var("CORS_EXTRA_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_default(),

            store_backend,
            database_url,

            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?,

            llm_mode,
            openai_api_key: env::var("OPENAI_API_KEY").ok().filter(|s| !s.is_empty()),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".into()),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into()),
            openai_temperature: env::var("OPENAI_TEMPERATURE")
                .unwrap_or_else(|_| "0.7".into())
                .parse()
                .unwrap_or(0.7),

            display_utc_offset_minutes,
            music_catalog_path: env::var("MUSIC_CATALOG_PATH")
                .unwrap_or_else(|_| "resources/music_catalog.json".into()),
            ai_calls_per_hour: env::var("AI_CALLS_PER_HOUR")
                .unwrap_or_else(|_| "20".into())
                .parse()
                .unwrap_or(20),
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn display_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.display_utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix())
    }

    /// Settings for a test router: memory store, offline narratives, UTC.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            frontend_url: "http://localhost:3000".into(),
            cors_extra_origins: Vec::new(),
            store_backend: StoreBackend::Memory,
            database_url: None,
            jwt_secret: "test-secret".into(),
            llm_mode: LlmMode::Offline,
            openai_api_key: None,
            openai_base_url: "http://127.0.0.1:1".into(),
            openai_model: "gpt-4o-mini".into(),
            openai_temperature: 0.7,
            display_utc_offset_minutes: 0,
            music_catalog_path: "resources/music_catalog.json".into(),
            ai_calls_per_hour: 20,
        }
    }
}
