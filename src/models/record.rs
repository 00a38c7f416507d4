use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which logical collection a record lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Emotion,
    Diary,
}

impl RecordKind {
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Emotion => "emotions",
            Self::Diary => "diaries",
        }
    }
}

/// Mood categories. The first eight belong to quick emotion entries, the last
/// five to diary entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "emotion_label", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EmotionLabel {
    Great,
    Loving,
    Happy,
    Calm,
    Down,
    Anxious,
    Angry,
    Exhausted,
    VeryGood,
    Good,
    Okay,
    Bad,
    VeryBad,
}

impl EmotionLabel {
    pub const EMOTION_LABELS: [EmotionLabel; 8] = [
        Self::Great,
        Self::Loving,
        Self::Happy,
        Self::Calm,
        Self::Down,
        Self::Anxious,
        Self::Angry,
        Self::Exhausted,
    ];

    pub const DIARY_LABELS: [EmotionLabel; 5] = [
        Self::VeryGood,
        Self::Good,
        Self::Okay,
        Self::Bad,
        Self::VeryBad,
    ];

    /// Score used when a write names the label without an explicit score.
    pub fn default_score(&self) -> i32 {
        match self {
            Self::Great => 100,
            Self::Loving => 90,
            Self::Happy => 80,
            Self::Calm => 60,
            Self::Down => 40,
            Self::Anxious => 30,
            Self::Angry => 25,
            Self::Exhausted => 20,
            Self::VeryGood => 100,
            Self::Good => 80,
            Self::Okay => 50,
            Self::Bad => 30,
            Self::VeryBad => 0,
        }
    }

    /// The collection whose vocabulary this label belongs to.
    pub fn vocabulary(&self) -> RecordKind {
        if Self::DIARY_LABELS.contains(self) {
            RecordKind::Diary
        } else {
            RecordKind::Emotion
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Great => "🌟",
            Self::Loving => "🤗",
            Self::Happy => "😊",
            Self::Calm => "😌",
            Self::Down => "😔",
            Self::Anxious => "😰",
            Self::Angry => "😤",
            Self::Exhausted => "😢",
            Self::VeryGood => "😄",
            Self::Good => "🙂",
            Self::Okay => "😐",
            Self::Bad => "🙁",
            Self::VeryBad => "😢",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Great => "great",
            Self::Loving => "loving",
            Self::Happy => "happy",
            Self::Calm => "calm",
            Self::Down => "down",
            Self::Anxious => "anxious",
            Self::Angry => "angry",
            Self::Exhausted => "exhausted",
            Self::VeryGood => "very_good",
            Self::Good => "good",
            Self::Okay => "okay",
            Self::Bad => "bad",
            Self::VeryBad => "very_bad",
        }
    }
}

impl std::fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single emotion or diary entry, as returned by the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: Uuid,
    pub owner_id: String,
    #[serde(rename = "type")]
    pub kind: RecordKind,
    pub date: NaiveDate,
    pub timestamp: DateTime<Utc>,
    /// Nullable because stored documents are not guaranteed to carry a score.
    pub emotion_score: Option<i32>,
    pub emotion_label: EmotionLabel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotion_emoji: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub is_shared: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewEmotion {
    pub owner_id: String,
    pub date: NaiveDate,
    pub timestamp: DateTime<Utc>,
    pub emotion_score: i32,
    pub emotion_label: EmotionLabel,
    pub emotion_emoji: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewDiary {
    pub owner_id: String,
    pub date: NaiveDate,
    pub timestamp: DateTime<Utc>,
    pub emotion_score: i32,
    pub emotion_label: EmotionLabel,
    pub content: String,
    pub is_shared: bool,
}

/// Fields merged into an existing record. `None` leaves the stored value as is.
#[derive(Debug, Clone, Default)]
pub struct RecordPatch {
    pub emotion_score: Option<i32>,
    pub emotion_label: Option<EmotionLabel>,
    pub emotion_emoji: Option<String>,
    pub note: Option<String>,
    pub content: Option<String>,
    pub is_shared: Option<bool>,
}

/// Local calendar day for `now` at the given display offset.
pub fn local_today(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    now.with_timezone(&offset).date_naive()
}

/// Combine the logical entry day with the current local time of day.
pub fn entry_timestamp(date: NaiveDate, now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    let local_time = now.with_timezone(&offset).time();
    match offset.from_local_datetime(&date.and_time(local_time)).single() {
        Some(local) => local.with_timezone(&Utc),
        None => Utc.from_utc_datetime(&date.and_time(local_time)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn vocabularies_are_disjoint() {
        for label in EmotionLabel::EMOTION_LABELS {
            assert_eq!(label.vocabulary(), RecordKind::Emotion);
        }
        for label in EmotionLabel::DIARY_LABELS {
            assert_eq!(label.vocabulary(), RecordKind::Diary);
        }
    }

    #[test]
    fn default_scores_stay_in_range() {
        for label in EmotionLabel::EMOTION_LABELS
            .iter()
            .chain(EmotionLabel::DIARY_LABELS.iter())
        {
            assert!((0..=100).contains(&label.default_score()), "{label}");
        }
    }

    #[test]
    fn label_serializes_snake_case() {
        let json = serde_json::to_string(&EmotionLabel::VeryGood).unwrap();
        assert_eq!(json, "\"very_good\"");
        let parsed: EmotionLabel = serde_json::from_str("\"exhausted\"").unwrap();
        assert_eq!(parsed, EmotionLabel::Exhausted);
    }

    #[test]
    fn entry_timestamp_keeps_local_time_of_day() {
        let offset = FixedOffset::east_opt(9 * 3600).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 1, 30, 0).unwrap(); // 10:30 local
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();

        let ts = entry_timestamp(date, now, offset);
        let local = ts.with_timezone(&offset);
        assert_eq!(local.date_naive(), date);
        assert_eq!(local.hour(), 10);
        assert_eq!(local.minute(), 30);
    }

    #[test]
    fn local_today_respects_offset() {
        let offset = FixedOffset::east_opt(9 * 3600).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 20, 0, 0).unwrap();
        assert_eq!(
            local_today(now, offset),
            NaiveDate::from_ymd_opt(2026, 3, 11).unwrap()
        );
    }
}
