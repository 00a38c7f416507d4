//! Pure aggregation over a single owner's records.
//!
//! Every public function filters out records without a usable score first
//! (null or outside 0..=100) and never mutates its input. Empty input always
//! produces a defined empty state.

pub mod daily;
pub mod patterns;
pub mod period;
pub mod time;
pub mod trend;

use serde::Serialize;

use crate::models::record::Record;

pub use daily::{calendar_month, daily_averages, daily_trend, CalendarMonth, DailyAverage};
pub use patterns::{pattern_analysis, PatternAnalysis};
pub use period::{period_stats, within_period, PeriodStats, StatsPeriod};
pub use time::{time_of_day_averages, weekday_averages, WeekdayAverage};
pub use trend::{classify_trend, Trend};

pub const MIN_SCORE: i32 = 0;
pub const MAX_SCORE: i32 = 100;

/// Score of a record if it may take part in statistics.
pub fn valid_score(record: &Record) -> Option<i32> {
    record
        .emotion_score
        .filter(|s| (MIN_SCORE..=MAX_SCORE).contains(s))
}

/// Records with a usable score, in input order.
pub fn valid_records(records: &[Record]) -> Vec<&Record> {
    records.iter().filter(|r| valid_score(r).is_some()).collect()
}

/// Integer mean, rounded half up. `None` for an empty set.
pub(crate) fn rounded_mean<I>(scores: I) -> Option<i32>
where
    I: IntoIterator<Item = i32>,
{
    let (sum, count) = scores
        .into_iter()
        .fold((0i64, 0i64), |(s, c), x| (s + x as i64, c + 1));
    if count == 0 {
        return None;
    }
    Some((sum as f64 / count as f64).round() as i32)
}

/// Unrounded mean of already-validated records.
pub(crate) fn mean_of(records: &[&Record]) -> Option<f64> {
    if records.is_empty() {
        return None;
    }
    let sum: i64 = records
        .iter()
        .filter_map(|r| valid_score(r))
        .map(i64::from)
        .sum();
    Some(sum as f64 / records.len() as f64)
}

/// Coarse band used to colour heatmap cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Excellent,
    Good,
    Neutral,
    Low,
    VeryLow,
}

impl ScoreBand {
    pub fn of(score: i32) -> Self {
        match score {
            s if s >= 80 => Self::Excellent,
            s if s >= 60 => Self::Good,
            s if s >= 40 => Self::Neutral,
            s if s >= 20 => Self::Low,
            _ => Self::VeryLow,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use uuid::Uuid;

    use crate::models::record::{EmotionLabel, Record};

    pub fn record_at(timestamp: DateTime<Utc>, score: Option<i32>, label: EmotionLabel) -> Record {
        Record {
            id: Uuid::new_v4(),
            owner_id: "owner".into(),
            kind: label.vocabulary(),
            date: timestamp.date_naive(),
            timestamp,
            emotion_score: score,
            emotion_label: label,
            emotion_emoji: None,
            note: None,
            content: None,
            is_shared: false,
            created_at: timestamp,
            updated_at: None,
        }
    }

    /// Record at noon UTC on the given day.
    pub fn record_on(y: i32, m: u32, d: u32, score: i32) -> Record {
        let day = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        let ts = Utc.from_utc_datetime(&day.and_hms_opt(12, 0, 0).unwrap());
        record_at(ts, Some(score), EmotionLabel::Calm)
    }

    /// Newest-first records, one hour apart, with the given scores.
    pub fn newest_first(scores: &[i32]) -> Vec<Record> {
        let start = Utc.with_ymd_and_hms(2026, 6, 30, 23, 0, 0).unwrap();
        scores
            .iter()
            .enumerate()
            .map(|(i, s)| {
                record_at(
                    start - chrono::Duration::hours(i as i64),
                    Some(*s),
                    EmotionLabel::Calm,
                )
            })
            .collect()
    }
}
