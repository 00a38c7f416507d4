//! # Request/Response DTOs
//!
//! API contract types for the record, stats and narrative routes.
//!
//! Conventions:
//! - `*Request`  → deserialized from client JSON body
//! - `*Query`    → deserialized from query params
//! - `*Response` → serialized to client JSON
//! - Field limits are expressed via `validator` derive macros

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::analytics::StatsPeriod;
use crate::db::FetchMode;
use crate::error::AppError;
use crate::models::record::{EmotionLabel, Record, RecordPatch};

// ============================================================================
// Common
// ============================================================================

/// Standard delete confirmation
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
    pub id: Uuid,
}

// ============================================================================
// Records
// ============================================================================

/// GET /api/records
///
/// `start` and `end` select a date range; `limit` selects the newest N.
/// The two are mutually exclusive; neither means everything.
#[derive(Debug, Default, Deserialize)]
pub struct RecordsQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub limit: Option<usize>,
}

impl RecordsQuery {
    pub fn mode(&self) -> Result<FetchMode, AppError> {
        match (self.start, self.end, self.limit) {
            (None, None, None) => Ok(FetchMode::All),
            (None, None, Some(0)) => Err(AppError::Validation("limit must be positive".into())),
            (None, None, Some(n)) if i64::try_from(n).is_err() => {
                Err(AppError::Validation("limit is too large".into()))
            }
            (None, None, Some(n)) => Ok(FetchMode::Limit(n)),
            (Some(start), Some(end), None) => {
                if start > end {
                    return Err(AppError::Validation("start must not be after end".into()));
                }
                Ok(FetchMode::Range { start, end })
            }
            (_, _, Some(_)) => Err(AppError::Validation(
                "range and limit cannot be combined".into(),
            )),
            _ => Err(AppError::Validation(
                "start and end must be given together".into(),
            )),
        }
    }
}

/// Listing envelope. A store failure still answers with `success: false`
/// and an empty list.
#[derive(Debug, Serialize)]
pub struct RecordsResponse {
    pub success: bool,
    pub records: Vec<Record>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RecordsResponse {
    pub fn ok(records: Vec<Record>) -> Self {
        Self {
            success: true,
            records,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            records: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// POST /api/emotions
#[derive(Debug, Deserialize, Validate)]
pub struct CreateEmotionRequest {
    /// Logical day. Default: today at the display offset
    pub date: Option<NaiveDate>,

    pub emotion_label: EmotionLabel,

    /// Default: the label's own score
    #[validate(range(min = 0, max = 100, message = "Score must be 0-100"))]
    pub emotion_score: Option<i32>,

    #[validate(length(max = 16, message = "Emoji too long"))]
    pub emotion_emoji: Option<String>,

    #[validate(length(max = 100, message = "Note must be at most 100 characters"))]
    pub note: Option<String>,
}

/// POST /api/diaries
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDiaryRequest {
    pub date: Option<NaiveDate>,

    pub emotion_label: EmotionLabel,

    #[validate(range(min = 0, max = 100, message = "Score must be 0-100"))]
    pub emotion_score: Option<i32>,

    #[validate(length(min = 1, max = 500, message = "Content must be 1-500 characters"))]
    pub content: String,

    #[serde(default)]
    pub is_shared: bool,
}

/// PUT /api/records/:kind/:id
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRecordRequest {
    #[validate(range(min = 0, max = 100, message = "Score must be 0-100"))]
    pub emotion_score: Option<i32>,

    pub emotion_label: Option<EmotionLabel>,

    #[validate(length(max = 16, message = "Emoji too long"))]
    pub emotion_emoji: Option<String>,

    #[validate(length(max = 100, message = "Note must be at most 100 characters"))]
    pub note: Option<String>,

    #[validate(length(min = 1, max = 500, message = "Content must be 1-500 characters"))]
    pub content: Option<String>,

    pub is_shared: Option<bool>,
}

impl From<UpdateRecordRequest> for RecordPatch {
    fn from(req: UpdateRecordRequest) -> Self {
        Self {
            emotion_score: req.emotion_score,
            emotion_label: req.emotion_label,
            emotion_emoji: req.emotion_emoji,
            note: req.note,
            content: req.content,
            is_shared: req.is_shared,
        }
    }
}

// ============================================================================
// Stats
// ============================================================================

/// GET /api/stats/calendar. Default: the current month
#[derive(Debug, Default, Deserialize)]
pub struct CalendarQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

/// GET /api/stats/period. Default: week
#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    #[serde(default)]
    pub period: StatsPeriod,
}

// ============================================================================
// Narratives
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportPreset {
    LastWeek,
    LastMonth,
    Custom,
}

/// POST /api/reports
#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    pub preset: Option<ReportPreset>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ReportRequest {
    /// Resolve the requested period against `today`. Default preset: last week.
    pub fn period(&self, today: NaiveDate) -> Result<(NaiveDate, NaiveDate), AppError> {
        let preset = match (self.preset, self.start_date, self.end_date) {
            (Some(ReportPreset::LastWeek | ReportPreset::LastMonth), Some(_), _)
            | (Some(ReportPreset::LastWeek | ReportPreset::LastMonth), _, Some(_)) => {
                return Err(AppError::Validation(
                    "start_date and end_date only apply to custom reports".into(),
                ))
            }
            (Some(p), _, _) => p,
            (None, Some(_), _) | (None, _, Some(_)) => ReportPreset::Custom,
            (None, None, None) => ReportPreset::LastWeek,
        };

        match preset {
            ReportPreset::LastWeek => Ok((today - chrono::Duration::days(7), today)),
            ReportPreset::LastMonth => {
                let start = today
                    .checked_sub_months(Months::new(1))
                    .ok_or_else(|| AppError::Validation("date out of range".into()))?;
                Ok((start, today))
            }
            ReportPreset::Custom => match (self.start_date, self.end_date) {
                (Some(start), Some(end)) if start <= end => Ok((start, end)),
                (Some(_), Some(_)) => Err(AppError::Validation(
                    "start_date must not be after end_date".into(),
                )),
                _ => Err(AppError::Validation(
                    "custom reports need start_date and end_date".into(),
                )),
            },
        }
    }
}

/// POST /api/music/suggestion
#[derive(Debug, Deserialize, Validate)]
pub struct MusicSuggestionRequest {
    pub emotion_label: EmotionLabel,

    #[validate(range(min = 0, max = 100, message = "Score must be 0-100"))]
    pub emotion_score: Option<i32>,

    #[validate(length(max = 100, message = "Note must be at most 100 characters"))]
    pub note: Option<String>,
}

/// GET /api/music/fallback
#[derive(Debug, Deserialize)]
pub struct MusicFallbackQuery {
    pub label: EmotionLabel,
}
