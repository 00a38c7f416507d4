use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{Duration, NaiveDate, Utc};
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::dto::{CreateDiaryRequest, CreateEmotionRequest};
use crate::error::{AppError, AppResult};
use crate::models::record::{
    entry_timestamp, local_today, EmotionLabel, NewDiary, NewEmotion, Record, RecordKind,
};
use crate::AppState;

/// Diary entries allowed per owner per logical day.
pub const DIARY_DAILY_LIMIT: i64 = 3;

/// How far back an entry may be dated.
pub const MAX_BACKDATE_DAYS: i64 = 7;

pub async fn create_emotion(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(req): Json<CreateEmotionRequest>,
) -> AppResult<(StatusCode, Json<Record>)> {
    req.validate()?;
    check_vocabulary(req.emotion_label, RecordKind::Emotion)?;

    let now = Utc::now();
    let offset = state.config.display_offset();
    let date = entry_date(req.date, local_today(now, offset))?;

    let record = state
        .store
        .insert_emotion(NewEmotion {
            owner_id: auth_user.owner_id.clone(),
            date,
            timestamp: entry_timestamp(date, now, offset),
            emotion_score: req
                .emotion_score
                .unwrap_or_else(|| req.emotion_label.default_score()),
            emotion_label: req.emotion_label,
            emotion_emoji: req
                .emotion_emoji
                .or_else(|| Some(req.emotion_label.emoji().to_string())),
            note: req.note.filter(|n| !n.trim().is_empty()),
        })
        .await?;

    tracing::info!(owner_id = %auth_user.owner_id, id = %record.id, date = %date, "Emotion recorded");
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn create_diary(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(req): Json<CreateDiaryRequest>,
) -> AppResult<(StatusCode, Json<Record>)> {
    req.validate()?;
    check_vocabulary(req.emotion_label, RecordKind::Diary)?;

    let now = Utc::now();
    let offset = state.config.display_offset();
    let date = entry_date(req.date, local_today(now, offset))?;

    let written = state
        .store
        .insert_diary(
            NewDiary {
                owner_id: auth_user.owner_id.clone(),
                date,
                timestamp: entry_timestamp(date, now, offset),
                emotion_score: req
                    .emotion_score
                    .unwrap_or_else(|| req.emotion_label.default_score()),
                emotion_label: req.emotion_label,
                content: req.content,
                is_shared: req.is_shared,
            },
            DIARY_DAILY_LIMIT,
        )
        .await?;
    let Some(record) = written else {
        tracing::info!(owner_id = %auth_user.owner_id, date = %date, "Diary limit reached");
        return Err(AppError::DiaryLimit(DIARY_DAILY_LIMIT));
    };

    tracing::info!(owner_id = %auth_user.owner_id, id = %record.id, date = %date, "Diary written");
    Ok((StatusCode::CREATED, Json(record)))
}

fn check_vocabulary(label: EmotionLabel, kind: RecordKind) -> AppResult<()> {
    if label.vocabulary() != kind {
        return Err(AppError::Validation(format!(
            "label {label} cannot be used for {}",
            kind.collection()
        )));
    }
    Ok(())
}

/// Entries may be dated from a week ago up to today, never in the future.
fn entry_date(requested: Option<NaiveDate>, today: NaiveDate) -> AppResult<NaiveDate> {
    let date = requested.unwrap_or(today);
    if date > today {
        return Err(AppError::Validation("date cannot be in the future".into()));
    }
    if date < today - Duration::days(MAX_BACKDATE_DAYS) {
        return Err(AppError::Validation(format!(
            "date can be at most {MAX_BACKDATE_DAYS} days ago"
        )));
    }
    Ok(date)
}
