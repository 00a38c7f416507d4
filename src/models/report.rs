use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Where a narrative came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeSource {
    #[default]
    Remote,
    Statistics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekTrend {
    Rising,
    Falling,
    Steady,
}

/// Period report in the exact shape the completion model is asked to return.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodReport {
    pub summary: ReportSummary,
    pub time_analysis: TimeAnalysis,
    #[serde(default)]
    pub food_recommendations: Vec<FoodRecommendation>,
    #[serde(default)]
    pub action_recommendations: Vec<ActionRecommendation>,
    pub encouragement: String,
    #[serde(default)]
    pub source: NarrativeSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub title: String,
    pub overview: String,
    pub week_trend: WeekTrend,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimeAnalysis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub morning: Option<TimeSlotAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub afternoon: Option<TimeSlotAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evening: Option<TimeSlotAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub night: Option<TimeSlotAnalysis>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlotAnalysis {
    pub analysis: String,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodRecommendation {
    pub time_of_day: String,
    pub foods: Vec<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRecommendation {
    pub category: String,
    pub actions: Vec<String>,
    pub benefit: String,
}

/// Report plus the period it covers, as served over HTTP.
#[derive(Debug, Serialize)]
pub struct ReportEnvelope {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub report: PeriodReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicSuggestion {
    pub comment: String,
    pub music: SuggestedTrack,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestedTrack {
    pub title: String,
    pub artist: String,
    pub reason: String,
}

/// Entry of the static fallback catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub title: String,
    pub artist: String,
    pub url: String,
}
