use chrono::{Datelike, FixedOffset, Timelike};
use serde::Serialize;

use super::{rounded_mean, valid_records, valid_score};
use crate::models::record::Record;

pub const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekdayAverage {
    pub weekday: &'static str,
    /// 0 when no record falls on this weekday.
    pub average: i32,
    pub count: usize,
}

/// Dense Sunday..Saturday table keyed by the weekday of `timestamp` at `offset`.
pub fn weekday_averages(records: &[Record], offset: FixedOffset) -> Vec<WeekdayAverage> {
    let mut buckets: [Vec<i32>; 7] = Default::default();
    for record in valid_records(records) {
        let idx = record
            .timestamp
            .with_timezone(&offset)
            .weekday()
            .num_days_from_sunday() as usize;
        if let Some(score) = valid_score(record) {
            buckets[idx].push(score);
        }
    }

    WEEKDAY_NAMES
        .iter()
        .zip(buckets)
        .map(|(name, scores)| WeekdayAverage {
            weekday: name,
            count: scores.len(),
            average: rounded_mean(scores).unwrap_or(0),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub const ALL: [TimeOfDay; 4] = [Self::Morning, Self::Afternoon, Self::Evening, Self::Night];

    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=10 => Self::Morning,
            11..=16 => Self::Afternoon,
            17..=20 => Self::Evening,
            _ => Self::Night,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
            Self::Night => "night",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeOfDayAverage {
    pub slot: TimeOfDay,
    /// `None` when no record falls in this slot.
    pub average: Option<i32>,
    pub count: usize,
}

/// Averages per part of the day, morning first.
pub fn time_of_day_averages(records: &[Record], offset: FixedOffset) -> Vec<TimeOfDayAverage> {
    TimeOfDay::ALL
        .iter()
        .map(|slot| {
            let scores: Vec<i32> = valid_records(records)
                .into_iter()
                .filter(|r| TimeOfDay::from_hour(r.timestamp.with_timezone(&offset).hour()) == *slot)
                .filter_map(valid_score)
                .collect();
            TimeOfDayAverage {
                slot: *slot,
                count: scores.len(),
                average: rounded_mean(scores),
            }
        })
        .collect()
}
