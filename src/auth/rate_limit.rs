use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    Extension,
};
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;

use crate::auth::middleware::AuthUser;
use crate::error::AppError;
use crate::AppState;

/// AI calls are counted per owner over this window.
const AI_WINDOW_SECS: u64 = 3600;

/// In-memory rate limit state (for single-instance deployments)
#[derive(Clone, Default)]
pub struct RateLimitState {
    entries: Arc<Mutex<HashMap<String, RateLimitEntry>>>,
}

struct RateLimitEntry {
    count: u32,
    window_start: Instant,
}

impl RateLimitState {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Count one request for `key`. Returns Ok(remaining) or Err(retry_after).
    pub async fn check_with_limits(
        &self,
        key: &str,
        max_requests: u32,
        window_secs: u64,
    ) -> Result<u32, Duration> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let window = Duration::from_secs(window_secs);

        let entry = entries.entry(key.to_string()).or_insert(RateLimitEntry {
            count: 0,
            window_start: now,
        });

        // Reset window if expired
        if now.duration_since(entry.window_start) > window {
            entry.count = 0;
            entry.window_start = now;
        }

        if entry.count >= max_requests {
            let retry_after = window.saturating_sub(now.duration_since(entry.window_start));
            return Err(retry_after);
        }

        entry.count += 1;
        Ok(max_requests - entry.count)
    }
}

/// Per-owner throttle for routes that call the completion service.
/// Must sit inside `require_auth`.
pub async fn rate_limit_ai(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = format!("ai:{}", auth_user.owner_id);
    let limit = state.config.ai_calls_per_hour;

    match state
        .rate_limiter
        .check_with_limits(&key, limit, AI_WINDOW_SECS)
        .await
    {
        Ok(remaining) => {
            tracing::debug!(owner_id = %auth_user.owner_id, remaining = remaining, "AI rate limit check passed");
            Ok(next.run(req).await)
        }
        Err(retry_after) => {
            tracing::warn!(
                owner_id = %auth_user.owner_id,
                retry_after_secs = retry_after.as_secs(),
                "AI rate limit exceeded"
            );
            Err(AppError::RateLimited)
        }
    }
}
