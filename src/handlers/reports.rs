use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::Utc;
use serde::Serialize;
use validator::Validate;

use crate::analytics::period_stats;
use crate::auth::middleware::AuthUser;
use crate::db::{fetch_records, FetchMode};
use crate::dto::{MusicFallbackQuery, MusicSuggestionRequest, ReportRequest};
use crate::error::AppResult;
use crate::models::record::{local_today, EmotionLabel};
use crate::models::report::{MusicSuggestion, ReportEnvelope, Track};
use crate::AppState;

/// Tracks returned by the catalogue route.
pub const FALLBACK_PICKS: usize = 3;

pub async fn create_report(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(req): Json<ReportRequest>,
) -> AppResult<Json<ReportEnvelope>> {
    let now = Utc::now();
    let today = local_today(now, state.config.display_offset());
    let (period_start, period_end) = req.period(today)?;

    let records = fetch_records(
        state.store.as_ref(),
        &auth_user.owner_id,
        FetchMode::Range {
            start: period_start,
            end: period_end,
        },
    )
    .await?;
    let stats = period_stats(&records);

    let report = state
        .narrator
        .generate_report(&records, &stats, period_start, period_end)
        .await?;

    tracing::info!(
        owner_id = %auth_user.owner_id,
        records = records.len(),
        source = ?report.source,
        "Report generated"
    );

    Ok(Json(ReportEnvelope {
        period_start,
        period_end,
        generated_at: now,
        report,
    }))
}

pub async fn suggest_music(
    State(state): State<AppState>,
    Extension(_auth_user): Extension<AuthUser>,
    Json(req): Json<MusicSuggestionRequest>,
) -> AppResult<Json<MusicSuggestion>> {
    req.validate()?;
    let score = req
        .emotion_score
        .unwrap_or_else(|| req.emotion_label.default_score());

    let suggestion = state
        .narrator
        .generate_music_suggestion(req.emotion_label, score, req.note.as_deref())
        .await?;
    Ok(Json(suggestion))
}

#[derive(Debug, Serialize)]
pub struct MusicFallbackResponse {
    pub label: EmotionLabel,
    pub tracks: Vec<Track>,
}

pub async fn music_fallback(
    State(state): State<AppState>,
    Query(query): Query<MusicFallbackQuery>,
) -> Json<MusicFallbackResponse> {
    let tracks = state
        .music
        .pick(query.label, FALLBACK_PICKS, &mut rand::thread_rng());
    Json(MusicFallbackResponse {
        label: query.label,
        tracks,
    })
}
