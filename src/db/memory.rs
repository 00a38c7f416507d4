use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::store::{FetchMode, RecordStore, StoreError};
use crate::models::record::{NewDiary, NewEmotion, Record, RecordKind, RecordPatch};

/// Process-local record store for offline mode and tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<RecordKind, Vec<Record>>,
    unavailable: bool,
}

impl Inner {
    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable("memory store switched off".into()));
        }
        Ok(())
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail, to exercise the failure paths.
    #[cfg(test)]
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.inner.write().await.unavailable = unavailable;
    }

    /// Insert a fully-formed record, bypassing write validation.
    #[cfg(test)]
    pub async fn insert_raw(&self, record: Record) {
        let mut inner = self.inner.write().await;
        inner.collections.entry(record.kind).or_default().push(record);
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn query(
        &self,
        kind: RecordKind,
        owner_id: &str,
        mode: &FetchMode,
    ) -> Result<Vec<Record>, StoreError> {
        let inner = self.inner.read().await;
        inner.check()?;

        let mut records: Vec<Record> = inner
            .collections
            .get(&kind)
            .map(|c| c.iter().filter(|r| r.owner_id == owner_id).cloned().collect())
            .unwrap_or_default();

        match *mode {
            FetchMode::Range { start, end } => {
                records.retain(|r| r.date >= start && r.date <= end);
            }
            FetchMode::Limit(n) => {
                records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
                records.truncate(n);
            }
            FetchMode::All => {
                records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            }
        }

        Ok(records)
    }

    async fn get(
        &self,
        owner_id: &str,
        kind: RecordKind,
        id: Uuid,
    ) -> Result<Option<Record>, StoreError> {
        let inner = self.inner.read().await;
        inner.check()?;
        Ok(inner
            .collections
            .get(&kind)
            .and_then(|c| c.iter().find(|r| r.id == id && r.owner_id == owner_id))
            .cloned())
    }

    async fn insert_emotion(&self, new: NewEmotion) -> Result<Record, StoreError> {
        let mut inner = self.inner.write().await;
        inner.check()?;
        let record = Record {
            id: Uuid::new_v4(),
            owner_id: new.owner_id,
            kind: RecordKind::Emotion,
            date: new.date,
            timestamp: new.timestamp,
            emotion_score: Some(new.emotion_score),
            emotion_label: new.emotion_label,
            emotion_emoji: new.emotion_emoji,
            note: new.note,
            content: None,
            is_shared: false,
            created_at: Utc::now(),
            updated_at: None,
        };
        inner
            .collections
            .entry(RecordKind::Emotion)
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn insert_diary(
        &self,
        new: NewDiary,
        daily_limit: i64,
    ) -> Result<Option<Record>, StoreError> {
        let mut inner = self.inner.write().await;
        inner.check()?;
        let existing = inner
            .collections
            .get(&RecordKind::Diary)
            .map(|c| {
                c.iter()
                    .filter(|r| r.owner_id == new.owner_id && r.date == new.date)
                    .count() as i64
            })
            .unwrap_or(0);
        if existing >= daily_limit {
            return Ok(None);
        }
        let record = Record {
            id: Uuid::new_v4(),
            owner_id: new.owner_id,
            kind: RecordKind::Diary,
            date: new.date,
            timestamp: new.timestamp,
            emotion_score: Some(new.emotion_score),
            emotion_label: new.emotion_label,
            emotion_emoji: None,
            note: None,
            content: Some(new.content),
            is_shared: new.is_shared,
            created_at: Utc::now(),
            updated_at: None,
        };
        inner
            .collections
            .entry(RecordKind::Diary)
            .or_default()
            .push(record.clone());
        Ok(Some(record))
    }

    async fn update(
        &self,
        owner_id: &str,
        kind: RecordKind,
        id: Uuid,
        patch: &RecordPatch,
    ) -> Result<Option<Record>, StoreError> {
        let mut inner = self.inner.write().await;
        inner.check()?;
        let Some(record) = inner
            .collections
            .get_mut(&kind)
            .and_then(|c| c.iter_mut().find(|r| r.id == id && r.owner_id == owner_id))
        else {
            return Ok(None);
        };

        if let Some(score) = patch.emotion_score {
            record.emotion_score = Some(score);
        }
        if let Some(label) = patch.emotion_label {
            record.emotion_label = label;
        }
        if let Some(emoji) = &patch.emotion_emoji {
            record.emotion_emoji = Some(emoji.clone());
        }
        if let Some(note) = &patch.note {
            record.note = Some(note.clone());
        }
        if let Some(content) = &patch.content {
            record.content = Some(content.clone());
        }
        if let Some(shared) = patch.is_shared {
            record.is_shared = shared;
        }
        record.updated_at = Some(Utc::now());

        Ok(Some(record.clone()))
    }

    async fn delete(&self, owner_id: &str, kind: RecordKind, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        inner.check()?;
        let Some(collection) = inner.collections.get_mut(&kind) else {
            return Ok(false);
        };
        let before = collection.len();
        collection.retain(|r| !(r.id == id && r.owner_id == owner_id));
        Ok(collection.len() < before)
    }

    async fn count_diaries_on(&self, owner_id: &str, date: NaiveDate) -> Result<i64, StoreError> {
        let inner = self.inner.read().await;
        inner.check()?;
        Ok(inner
            .collections
            .get(&RecordKind::Diary)
            .map(|c| {
                c.iter()
                    .filter(|r| r.owner_id == owner_id && r.date == date)
                    .count() as i64
            })
            .unwrap_or(0))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.inner.read().await.check()
    }
}
