use chrono::{FixedOffset, NaiveDate};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use super::completion::{parse_reply, CompletionClient, NarrativeError};
use crate::analytics::period::most_frequent_label;
use crate::analytics::time::{time_of_day_averages, TimeOfDay, TimeOfDayAverage};
use crate::analytics::{PeriodStats, Trend};
use crate::config::LlmMode;
use crate::models::record::{EmotionLabel, Record};
use crate::models::report::{
    ActionRecommendation, FoodRecommendation, MusicSuggestion, NarrativeSource, PeriodReport,
    ReportSummary, TimeAnalysis, TimeSlotAnalysis, WeekTrend,
};

/// Builds prompts, calls the completion backend and parses its replies.
#[derive(Clone)]
pub struct NarrativeGenerator {
    client: Option<Arc<dyn CompletionClient>>,
    mode: LlmMode,
    offset: FixedOffset,
}

/// Record fields embedded in prompts.
#[derive(Serialize)]
struct PromptRecord<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    date: NaiveDate,
    timestamp: String,
    score: Option<i32>,
    label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
}

impl NarrativeGenerator {
    pub fn new(
        client: Option<Arc<dyn CompletionClient>>,
        mode: LlmMode,
        offset: FixedOffset,
    ) -> Self {
        Self {
            client,
            mode,
            offset,
        }
    }

    fn client(&self) -> Result<&Arc<dyn CompletionClient>, NarrativeError> {
        match self.mode {
            LlmMode::Offline => Err(NarrativeError::NotConfigured),
            LlmMode::Remote => self.client.as_ref().ok_or(NarrativeError::NotConfigured),
        }
    }

    async fn call(&self, purpose: &'static str, prompt: &str) -> Result<String, NarrativeError> {
        let client = self.client()?;
        let started = Instant::now();
        let result = client.complete(prompt).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(reply) => {
                tracing::info!(purpose, elapsed_ms, reply_len = reply.len(), "Completion received")
            }
            Err(e) => tracing::warn!(purpose, elapsed_ms, error = %e, "Completion failed"),
        }
        result
    }

    /// Narrative report for the records of one period.
    ///
    /// Offline mode answers with the statistics template instead of calling out.
    pub async fn generate_report(
        &self,
        records: &[Record],
        stats: &PeriodStats,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<PeriodReport, NarrativeError> {
        if self.mode == LlmMode::Offline {
            return Ok(self.statistical_report(records, stats, period_start, period_end));
        }

        let prompt = report_prompt(records, stats, period_start, period_end, self.offset);
        let reply = self.call("report", &prompt).await?;
        let mut report: PeriodReport = parse_reply(&reply)?;
        report.source = NarrativeSource::Remote;
        Ok(report)
    }

    pub async fn generate_music_suggestion(
        &self,
        label: EmotionLabel,
        score: i32,
        note: Option<&str>,
    ) -> Result<MusicSuggestion, NarrativeError> {
        let prompt = music_prompt(label, score, note);
        let reply = self.call("music", &prompt).await?;
        parse_reply(&reply)
    }

    /// Report built from the numbers alone, without a completion call.
    pub fn statistical_report(
        &self,
        records: &[Record],
        stats: &PeriodStats,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> PeriodReport {
        let title = format!("Your mood from {period_start} to {period_end}");
        let overview = if stats.insufficient_data {
            "There are no scored entries in this period yet. Record a few moods to see your report."
                .to_string()
        } else {
            let most = most_frequent_label(&stats.label_frequency)
                .map(|c| format!(" You most often felt \"{}\".", c.label))
                .unwrap_or_default();
            format!(
                "You recorded {} entries with an average score of {}.{} Your mood has been {}.",
                stats.total_count,
                stats.average_score,
                most,
                trend_phrase(stats.trend)
            )
        };

        let mut time_analysis = TimeAnalysis::default();
        for slot in time_of_day_averages(records, self.offset) {
            let analysis = slot_analysis(&slot);
            match slot.slot {
                TimeOfDay::Morning => time_analysis.morning = analysis,
                TimeOfDay::Afternoon => time_analysis.afternoon = analysis,
                TimeOfDay::Evening => time_analysis.evening = analysis,
                TimeOfDay::Night => time_analysis.night = analysis,
            }
        }

        let low = !stats.insufficient_data && stats.average_score < 50;
        let food_recommendations = vec![FoodRecommendation {
            time_of_day: TimeOfDay::Afternoon.as_str().into(),
            foods: if low {
                vec!["Bananas".into(), "Dark chocolate".into(), "Nuts".into()]
            } else {
                vec!["Seasonal fruit".into(), "Yogurt".into()]
            },
            reason: "Steady energy through the afternoon helps keep your mood even.".into(),
        }];
        let action_recommendations = vec![
            ActionRecommendation {
                category: "exercise".into(),
                actions: vec!["Take a 20 minute walk outside".into()],
                benefit: "Light activity and daylight lift mood and ease stress.".into(),
            },
            ActionRecommendation {
                category: "rest".into(),
                actions: vec!["Keep a regular bedtime".into()],
                benefit: "A stable sleep rhythm keeps your mood steadier.".into(),
            },
        ];

        PeriodReport {
            summary: ReportSummary {
                title,
                overview,
                week_trend: week_trend(stats.trend),
            },
            time_analysis,
            food_recommendations,
            action_recommendations,
            encouragement: match stats.trend {
                Trend::Improving => "You are on a good path. Keep doing what works for you.",
                Trend::Declining => "Tough weeks pass. Be gentle with yourself and rest when you can.",
                Trend::Stable => "You are keeping a steady balance. Keep recording how you feel.",
            }
            .into(),
            source: NarrativeSource::Statistics,
        }
    }
}

fn week_trend(trend: Trend) -> WeekTrend {
    match trend {
        Trend::Improving => WeekTrend::Rising,
        Trend::Declining => WeekTrend::Falling,
        Trend::Stable => WeekTrend::Steady,
    }
}

fn trend_phrase(trend: Trend) -> &'static str {
    match trend {
        Trend::Improving => "improving",
        Trend::Declining => "declining",
        Trend::Stable => "steady",
    }
}

fn slot_analysis(slot: &TimeOfDayAverage) -> Option<TimeSlotAnalysis> {
    let average = slot.average?;
    let recommendations = if average < 50 {
        vec![
            format!("Plan something restful for the {}.", slot.slot.as_str()),
            "Try a few minutes of slow breathing.".to_string(),
        ]
    } else {
        vec![format!("Keep your {} routine going.", slot.slot.as_str())]
    };
    Some(TimeSlotAnalysis {
        analysis: format!(
            "Average score {} across {} entries in the {}.",
            average,
            slot.count,
            slot.slot.as_str()
        ),
        recommendations,
    })
}

fn prompt_records(records: &[Record], offset: FixedOffset) -> String {
    let slim: Vec<PromptRecord<'_>> = records
        .iter()
        .map(|r| PromptRecord {
            kind: r.kind.collection(),
            date: r.date,
            timestamp: r.timestamp.with_timezone(&offset).to_rfc3339(),
            score: r.emotion_score,
            label: r.emotion_label.as_str(),
            note: r.note.as_deref(),
            content: r.content.as_deref(),
        })
        .collect();
    serde_json::to_string(&slim).unwrap_or_else(|_| "[]".into())
}

fn report_prompt(
    records: &[Record],
    stats: &PeriodStats,
    period_start: NaiveDate,
    period_end: NaiveDate,
    offset: FixedOffset,
) -> String {
    format!(
        r#"You are a warm counsellor. Analyse the emotion records from {period_start} to {period_end}.

[Data]
- Total records: {total}
- Average score: {average}
- Records: {records}

Reply with JSON only, no markdown, in exactly this shape:
{{
  "summary": {{
    "title": "one line title",
    "overview": "3-4 sentence summary",
    "weekTrend": "rising | falling | steady"
  }},
  "timeAnalysis": {{
    "morning": {{ "analysis": "text", "recommendations": ["tip 1", "tip 2"] }},
    "afternoon": {{ "analysis": "text", "recommendations": ["tip 1", "tip 2"] }},
    "evening": {{ "analysis": "text", "recommendations": ["tip 1", "tip 2"] }},
    "night": {{ "analysis": "text", "recommendations": ["tip 1", "tip 2"] }}
  }},
  "foodRecommendations": [
    {{ "timeOfDay": "afternoon", "foods": ["food 1"], "reason": "why" }}
  ],
  "actionRecommendations": [
    {{ "category": "exercise", "actions": ["action 1"], "benefit": "effect" }}
  ],
  "encouragement": "a short encouraging message"
}}"#,
        total = stats.total_count,
        average = stats.average_score,
        records = prompt_records(records, offset),
    )
}

fn music_prompt(label: EmotionLabel, score: i32, note: Option<&str>) -> String {
    format!(
        r#"The user just recorded a feeling.
- Feeling: {label} (score: {score})
- Note: {note}

Recommend one song that fits this mood and offer a few kind words.
Reply with JSON only, no markdown, in exactly this shape:
{{
  "comment": "two warm sentences that empathise with the user",
  "music": {{
    "title": "song title",
    "artist": "artist name",
    "reason": "why this song fits"
  }}
}}"#,
        note = note.filter(|n| !n.trim().is_empty()).unwrap_or("none"),
    )
}
