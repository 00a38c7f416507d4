use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

use super::{rounded_mean, valid_records, valid_score, ScoreBand};
use crate::models::record::Record;

/// Cells in a calendar view: six full weeks.
pub const CALENDAR_CELLS: usize = 42;

/// Number of dated points kept by [`daily_trend`].
pub const DAILY_TREND_POINTS: usize = 7;

#[derive(Debug, Clone, Serialize)]
pub struct DailyAverage {
    pub date: NaiveDate,
    pub avg_score: i32,
    pub count: usize,
    pub records: Vec<Record>,
}

/// Bucket valid records by logical day, ascending by date.
pub fn daily_averages(records: &[Record]) -> Vec<DailyAverage> {
    let mut buckets: BTreeMap<NaiveDate, Vec<&Record>> = BTreeMap::new();
    for record in valid_records(records) {
        buckets.entry(record.date).or_default().push(record);
    }

    buckets
        .into_iter()
        .filter_map(|(date, day)| {
            let avg_score = rounded_mean(day.iter().filter_map(|r| valid_score(r)))?;
            Some(DailyAverage {
                date,
                avg_score,
                count: day.len(),
                records: day.into_iter().cloned().collect(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub score: i32,
    pub count: usize,
}

/// The last seven dated averages, oldest first, for a line chart.
pub fn daily_trend(records: &[Record]) -> Vec<DailyPoint> {
    let days = daily_averages(records);
    let skip = days.len().saturating_sub(DAILY_TREND_POINTS);
    days.into_iter()
        .skip(skip)
        .map(|d| DailyPoint {
            date: d.date,
            score: d.avg_score,
            count: d.count,
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarCell {
    pub date: NaiveDate,
    pub is_current_month: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_score: Option<i32>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub band: Option<ScoreBand>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    pub cells: Vec<CalendarCell>,
    /// Mean of the per-day averages inside the month; `None` without data.
    pub month_average: Option<i32>,
}

/// First and last date of the 42-cell grid for a month, or `None` when the
/// month or any cell falls outside the representable date range.
pub fn calendar_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let leading = first.weekday().num_days_from_sunday() as i64;
    let grid_start = first.checked_sub_signed(Duration::days(leading))?;
    let grid_end = grid_start.checked_add_signed(Duration::days(CALENDAR_CELLS as i64 - 1))?;
    Some((grid_start, grid_end))
}

/// Lay out a Sunday-first six-week grid for `year`/`month`.
///
/// Returns `None` for an invalid month.
pub fn calendar_month(year: i32, month: u32, days: &[DailyAverage]) -> Option<CalendarMonth> {
    let (grid_start, _) = calendar_bounds(year, month)?;

    let by_date: BTreeMap<NaiveDate, &DailyAverage> = days.iter().map(|d| (d.date, d)).collect();

    let cells: Vec<CalendarCell> = (0..CALENDAR_CELLS as i64)
        .map(|offset| {
            // Bounds checked above, so every cell is in range.
            let date = grid_start + Duration::days(offset);
            let day = by_date.get(&date);
            CalendarCell {
                date,
                is_current_month: date.year() == year && date.month() == month,
                avg_score: day.map(|d| d.avg_score),
                count: day.map(|d| d.count).unwrap_or(0),
                band: day.map(|d| ScoreBand::of(d.avg_score)),
            }
        })
        .collect();

    let month_average = rounded_mean(
        days.iter()
            .filter(|d| d.date.year() == year && d.date.month() == month)
            .map(|d| d.avg_score),
    );

    Some(CalendarMonth {
        year,
        month,
        cells,
        month_average,
    })
}
