use chrono::FixedOffset;
use serde::Serialize;

use super::period::{label_frequency, most_frequent_label, LabelCount};
use super::time::weekday_averages;
use super::trend::trend_of;
use super::{rounded_mean, valid_records, valid_score, Trend};
use crate::models::record::Record;

/// Below this a weekday average is called out as a concern.
pub const CONCERN_THRESHOLD: i32 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayScore {
    pub name: &'static str,
    pub score: i32,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub title: String,
    pub description: String,
}

/// Template narrative computed from the numbers alone.
#[derive(Debug, Clone, Serialize)]
pub struct StatisticalNarrative {
    pub main_insight: String,
    pub detailed_analysis: String,
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
    pub recommendations: Vec<Recommendation>,
    pub encouragement: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatternAnalysis {
    pub total_records: usize,
    pub avg_score: i32,
    pub best_day: Option<DayScore>,
    pub worst_day: Option<DayScore>,
    pub trend: Trend,
    pub most_common: Option<LabelCount>,
    pub narrative: StatisticalNarrative,
}

/// Long-run patterns over newest-first records.
///
/// Returns `None` when no record has a usable score.
pub fn pattern_analysis(records: &[Record], offset: FixedOffset) -> Option<PatternAnalysis> {
    let valid = valid_records(records);
    let avg_score = rounded_mean(valid.iter().filter_map(|r| valid_score(r)))?;

    let mut days: Vec<DayScore> = weekday_averages(records, offset)
        .into_iter()
        .filter(|w| w.count > 0)
        .map(|w| DayScore {
            name: w.weekday,
            score: w.average,
            count: w.count,
        })
        .collect();
    days.sort_by_key(|d| std::cmp::Reverse(d.score));
    let best_day = days.first().cloned();
    let worst_day = days.last().cloned();

    let trend = trend_of(&valid);
    let most_common = most_frequent_label(&label_frequency(records)).cloned();

    let narrative = narrate(
        avg_score,
        best_day.as_ref(),
        worst_day.as_ref(),
        trend,
        most_common.as_ref(),
    );

    Some(PatternAnalysis {
        total_records: valid.len(),
        avg_score,
        best_day,
        worst_day,
        trend,
        most_common,
        narrative,
    })
}

fn narrate(
    avg_score: i32,
    best: Option<&DayScore>,
    worst: Option<&DayScore>,
    trend: Trend,
    most_common: Option<&LabelCount>,
) -> StatisticalNarrative {
    let main_insight = match trend {
        Trend::Improving => "Your mood has been improving lately.",
        Trend::Declining => "Your mood could use some extra care lately.",
        Trend::Stable => "Your mood has been holding steady.",
    };
    let encouragement = match trend {
        Trend::Improving => "Keep it up, the positive change shows.",
        Trend::Declining => "Hard stretches pass. Make time to look after yourself.",
        Trend::Stable => "You are managing your mood steadily. Keep going.",
    };

    let label = most_common.map(|c| c.label.as_str()).unwrap_or("unknown");
    let mut detailed_analysis = format!(
        "Your overall average mood score is {avg_score}, and the feeling you recorded most is \"{label}\"."
    );
    if let Some(best) = best {
        detailed_analysis.push_str(&format!(
            " You tend to feel best on {} ({} points).",
            best.name, best.score
        ));
    }

    let strengths = vec![
        "Regular journaling is building your self-awareness.".to_string(),
        match best {
            Some(best) if best.score > 0 => format!("You keep a good mood on {}.", best.name),
            _ => "You are keeping a positive mindset.".to_string(),
        },
    ];

    let low_day = worst.filter(|w| w.score < CONCERN_THRESHOLD);
    let concerns = match low_day {
        Some(worst) => vec![
            format!("{} needs some extra attention.", worst.name),
            "Look for ways to manage stress.".to_string(),
        ],
        None => vec![
            "Things look generally good.".to_string(),
            "Try to keep your current pattern.".to_string(),
        ],
    };

    let recommendations = vec![
        Recommendation {
            title: "Regular routine".into(),
            description: "Wake up and go to bed at similar times each day to steady your rhythm."
                .into(),
        },
        Recommendation {
            title: "Stress management".into(),
            description: match low_day {
                Some(worst) => format!("Plan more rest on {}.", worst.name),
                None => "Keep up your current good habits.".to_string(),
            },
        },
    ];

    StatisticalNarrative {
        main_insight: main_insight.into(),
        detailed_analysis,
        strengths,
        concerns,
        recommendations,
        encouragement: encouragement.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::fixtures::{newest_first, record_on};
    use crate::models::record::EmotionLabel;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn nothing_to_analyse() {
        assert!(pattern_analysis(&[], utc()).is_none());
        assert!(pattern_analysis(&newest_first(&[-1, 101]), utc()).is_none());
    }

    #[test]
    fn best_and_worst_weekday_among_days_with_data() {
        // 2026-03-01 Sunday, 03-03 Tuesday, 03-06 Friday.
        let records = vec![
            record_on(2026, 3, 6, 30),
            record_on(2026, 3, 3, 90),
            record_on(2026, 3, 1, 70),
        ];
        let analysis = pattern_analysis(&records, utc()).unwrap();
        assert_eq!(analysis.total_records, 3);
        assert_eq!(analysis.avg_score, 63);
        assert_eq!(analysis.best_day.as_ref().unwrap().name, "Tuesday");
        assert_eq!(analysis.worst_day.as_ref().unwrap().name, "Friday");
        assert_eq!(analysis.most_common.as_ref().unwrap().label, EmotionLabel::Calm);
        assert_eq!(analysis.most_common.as_ref().unwrap().count, 3);

        let concerns = &analysis.narrative.concerns;
        assert!(concerns[0].contains("Friday"));
        assert!(analysis.narrative.recommendations[1]
            .description
            .contains("Friday"));
        assert!(analysis.narrative.detailed_analysis.contains("Tuesday (90 points)"));
    }

    #[test]
    fn weekday_ties_keep_sunday_first_order() {
        // Monday and Wednesday both average 50.
        let records = vec![record_on(2026, 3, 4, 50), record_on(2026, 3, 2, 50)];
        let analysis = pattern_analysis(&records, utc()).unwrap();
        assert_eq!(analysis.best_day.unwrap().name, "Monday");
        assert_eq!(analysis.worst_day.unwrap().name, "Wednesday");
    }

    #[test]
    fn good_weeks_have_no_day_concern() {
        let records = vec![record_on(2026, 3, 2, 80), record_on(2026, 3, 3, 70)];
        let analysis = pattern_analysis(&records, utc()).unwrap();
        assert_eq!(analysis.narrative.concerns[0], "Things look generally good.");
        assert_eq!(analysis.trend, Trend::Stable);
        assert_eq!(
            analysis.narrative.main_insight,
            "Your mood has been holding steady."
        );
    }

    #[test]
    fn narrative_follows_trend() {
        let mut scores = vec![90; 10];
        scores.extend(vec![40; 10]);
        let analysis = pattern_analysis(&newest_first(&scores), utc()).unwrap();
        assert_eq!(analysis.trend, Trend::Improving);
        assert!(analysis.narrative.main_insight.contains("improving"));
    }
}
