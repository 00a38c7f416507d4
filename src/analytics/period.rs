use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::trend::trend_of;
use super::{rounded_mean, valid_records, valid_score, Trend};
use crate::models::record::{EmotionLabel, Record};

/// Size of the best and worst moment lists.
pub const MOMENTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StatsPeriod {
    #[default]
    Week,
    Month,
}

impl StatsPeriod {
    pub fn days(&self) -> i64 {
        match self {
            Self::Week => 7,
            Self::Month => 30,
        }
    }
}

/// Records whose `timestamp` falls within the period ending at `now`.
pub fn within_period(records: &[Record], period: StatsPeriod, now: DateTime<Utc>) -> Vec<Record> {
    let since = now - Duration::days(period.days());
    records
        .iter()
        .filter(|r| r.timestamp >= since)
        .cloned()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelCount {
    pub label: EmotionLabel,
    pub count: usize,
}

/// Label counts in first-seen order.
pub fn label_frequency(records: &[Record]) -> Vec<LabelCount> {
    frequency_of(&valid_records(records))
}

fn frequency_of(valid: &[&Record]) -> Vec<LabelCount> {
    let mut counts: Vec<LabelCount> = Vec::new();
    for record in valid {
        match counts.iter_mut().find(|c| c.label == record.emotion_label) {
            Some(entry) => entry.count += 1,
            None => counts.push(LabelCount {
                label: record.emotion_label,
                count: 1,
            }),
        }
    }
    counts
}

/// Highest count wins; ties go to the label seen first.
pub fn most_frequent_label(counts: &[LabelCount]) -> Option<&LabelCount> {
    counts.iter().fold(None, |best: Option<&LabelCount>, c| match best {
        Some(b) if b.count >= c.count => Some(b),
        _ => Some(c),
    })
}

/// Top and bottom records by score.
///
/// Best is highest first. Worst is lowest first. With fewer than three records
/// both lists hold every record.
pub fn best_and_worst(records: &[Record]) -> (Vec<Record>, Vec<Record>) {
    moments_of(&valid_records(records))
}

fn moments_of(valid: &[&Record]) -> (Vec<Record>, Vec<Record>) {
    let mut sorted: Vec<&Record> = valid.to_vec();
    sorted.sort_by_key(|r| std::cmp::Reverse(valid_score(r)));

    let best = sorted.iter().take(MOMENTS).map(|r| (*r).clone()).collect();
    let worst = sorted.iter().rev().take(MOMENTS).map(|r| (*r).clone()).collect();
    (best, worst)
}

#[derive(Debug, Clone, Serialize)]
pub struct PeriodStats {
    pub average_score: i32,
    pub total_count: usize,
    pub best_moments: Vec<Record>,
    pub worst_moments: Vec<Record>,
    pub label_frequency: Vec<LabelCount>,
    pub trend: Trend,
    /// Set when no record had a usable score.
    pub insufficient_data: bool,
}

impl PeriodStats {
    pub fn empty() -> Self {
        Self {
            average_score: 0,
            total_count: 0,
            best_moments: Vec::new(),
            worst_moments: Vec::new(),
            label_frequency: Vec::new(),
            trend: Trend::Stable,
            insufficient_data: true,
        }
    }
}

/// Statistics over newest-first records.
pub fn period_stats(records: &[Record]) -> PeriodStats {
    let valid = valid_records(records);
    let Some(average_score) = rounded_mean(valid.iter().filter_map(|r| valid_score(r))) else {
        return PeriodStats::empty();
    };

    let (best_moments, worst_moments) = moments_of(&valid);
    PeriodStats {
        average_score,
        total_count: valid.len(),
        best_moments,
        worst_moments,
        label_frequency: frequency_of(&valid),
        trend: trend_of(&valid),
        insufficient_data: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::fixtures::{newest_first, record_at, record_on};
    use chrono::TimeZone;

    fn scores(records: &[Record]) -> Vec<i32> {
        records.iter().filter_map(|r| r.emotion_score).collect()
    }

    #[test]
    fn overall_average_of_three_days() {
        let records = vec![
            record_on(2026, 2, 3, 40),
            record_on(2026, 2, 2, 60),
            record_on(2026, 2, 1, 80),
        ];
        let stats = period_stats(&records);
        assert_eq!(stats.average_score, 60);
        assert_eq!(stats.total_count, 3);
        assert!(!stats.insufficient_data);
    }

    #[test]
    fn empty_and_all_invalid_report_insufficient_data() {
        let stats = period_stats(&[]);
        assert!(stats.insufficient_data);
        assert_eq!(stats.total_count, 0);
        assert_eq!(stats.trend, Trend::Stable);

        let stats = period_stats(&newest_first(&[-5, 150]));
        assert!(stats.insufficient_data);
        assert_eq!(stats.average_score, 0);
    }

    #[test]
    fn invalid_scores_do_not_move_the_average() {
        let mut records = newest_first(&[80, -5, 150, 60]);
        records[1].emotion_score = None;
        let stats = period_stats(&records);
        assert_eq!(stats.average_score, 70);
        assert_eq!(stats.total_count, 2);
    }

    #[test]
    fn best_and_worst_moments() {
        let records = newest_first(&[50, 90, 10, 70, 30, 100]);
        let (best, worst) = best_and_worst(&records);
        assert_eq!(scores(&best), vec![100, 90, 70]);
        assert_eq!(scores(&worst), vec![10, 30, 50]);
    }

    #[test]
    fn fewer_than_three_moments() {
        let records = newest_first(&[40, 80]);
        let (best, worst) = best_and_worst(&records);
        assert_eq!(scores(&best), vec![80, 40]);
        assert_eq!(scores(&worst), vec![40, 80]);
    }

    #[test]
    fn single_record_stats() {
        let stats = period_stats(&newest_first(&[42]));
        assert_eq!(stats.average_score, 42);
        assert_eq!(stats.trend, Trend::Stable);
        assert_eq!(stats.best_moments.len(), 1);
        assert_eq!(stats.worst_moments.len(), 1);
    }

    #[test]
    fn label_frequency_in_first_seen_order() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
        let records = vec![
            record_at(ts, Some(60), EmotionLabel::Calm),
            record_at(ts, Some(30), EmotionLabel::Anxious),
            record_at(ts, Some(30), EmotionLabel::Anxious),
            record_at(ts, Some(60), EmotionLabel::Calm),
            record_at(ts, Some(100), EmotionLabel::Great),
        ];
        let counts = label_frequency(&records);
        assert_eq!(
            counts,
            vec![
                LabelCount { label: EmotionLabel::Calm, count: 2 },
                LabelCount { label: EmotionLabel::Anxious, count: 2 },
                LabelCount { label: EmotionLabel::Great, count: 1 },
            ]
        );
        assert_eq!(most_frequent_label(&counts).unwrap().label, EmotionLabel::Calm);
        assert!(most_frequent_label(&[]).is_none());
    }

    #[test]
    fn period_window_filters_on_timestamp() {
        let now = Utc.with_ymd_and_hms(2026, 6, 30, 12, 0, 0).unwrap();
        let records = vec![
            record_at(now - Duration::days(1), Some(50), EmotionLabel::Calm),
            record_at(now - Duration::days(8), Some(50), EmotionLabel::Calm),
            record_at(now - Duration::days(29), Some(50), EmotionLabel::Calm),
            record_at(now - Duration::days(31), Some(50), EmotionLabel::Calm),
        ];
        assert_eq!(within_period(&records, StatsPeriod::Week, now).len(), 1);
        assert_eq!(within_period(&records, StatsPeriod::Month, now).len(), 3);
    }
}
