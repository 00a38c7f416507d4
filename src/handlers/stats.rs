use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{Datelike, Duration, Utc};
use serde::Serialize;

use crate::analytics::daily::{calendar_bounds, DailyPoint};
use crate::analytics::time::TimeOfDayAverage;
use crate::analytics::{
    calendar_month, daily_averages, daily_trend, pattern_analysis, period_stats,
    time_of_day_averages, weekday_averages, within_period, CalendarMonth, PatternAnalysis,
    PeriodStats, StatsPeriod, WeekdayAverage,
};
use crate::auth::middleware::AuthUser;
use crate::db::{fetch_records, FetchMode};
use crate::dto::{CalendarQuery, PeriodQuery};
use crate::error::{AppError, AppResult};
use crate::models::record::local_today;
use crate::AppState;

pub async fn get_calendar(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<CalendarQuery>,
) -> AppResult<Json<CalendarMonth>> {
    let today = local_today(Utc::now(), state.config.display_offset());
    let year = query.year.unwrap_or(today.year());
    let month = query.month.unwrap_or(today.month());

    let (grid_start, grid_end) = calendar_bounds(year, month)
        .ok_or_else(|| AppError::Validation("invalid year or month".into()))?;

    let records = fetch_records(
        state.store.as_ref(),
        &auth_user.owner_id,
        FetchMode::Range {
            start: grid_start,
            end: grid_end,
        },
    )
    .await?;

    let days = daily_averages(&records);
    let calendar = calendar_month(year, month, &days)
        .ok_or_else(|| AppError::Validation("invalid year or month".into()))?;
    Ok(Json(calendar))
}

#[derive(Debug, Serialize)]
pub struct PeriodStatsResponse {
    pub period: StatsPeriod,
    pub stats: PeriodStats,
    pub daily_trend: Vec<DailyPoint>,
    pub weekday_averages: Vec<WeekdayAverage>,
    pub time_of_day: Vec<TimeOfDayAverage>,
}

pub async fn get_period_stats(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<PeriodQuery>,
) -> AppResult<Json<PeriodStatsResponse>> {
    let now = Utc::now();
    let offset = state.config.display_offset();
    let today = local_today(now, offset);

    // One extra day so the timestamp window is fully covered.
    let start = today - Duration::days(query.period.days() + 1);
    let records = fetch_records(
        state.store.as_ref(),
        &auth_user.owner_id,
        FetchMode::Range { start, end: today },
    )
    .await?;
    let records = within_period(&records, query.period, now);

    Ok(Json(PeriodStatsResponse {
        period: query.period,
        stats: period_stats(&records),
        daily_trend: daily_trend(&records),
        weekday_averages: weekday_averages(&records, offset),
        time_of_day: time_of_day_averages(&records, offset),
    }))
}

#[derive(Debug, Serialize)]
pub struct PatternsResponse {
    pub has_data: bool,
    pub analysis: Option<PatternAnalysis>,
}

pub async fn get_patterns(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<PatternsResponse>> {
    let records = fetch_records(state.store.as_ref(), &auth_user.owner_id, FetchMode::All).await?;
    let analysis = pattern_analysis(&records, state.config.display_offset());

    Ok(Json(PatternsResponse {
        has_data: analysis.is_some(),
        analysis,
    }))
}
