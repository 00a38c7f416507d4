use async_trait::async_trait;
use chrono::NaiveDate;
use futures_util::future::try_join;
use uuid::Uuid;

use crate::models::record::{NewDiary, NewEmotion, Record, RecordKind, RecordPatch};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

/// How a fetch selects records. Range and limit never combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Inclusive on both ends, by logical `date`. Never truncated.
    Range { start: NaiveDate, end: NaiveDate },
    /// The `n` newest records by `timestamp` across both collections.
    Limit(usize),
    All,
}

impl FetchMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Range { .. } => "range",
            Self::Limit(_) => "limit",
            Self::All => "all",
        }
    }
}

/// Predicate-query access to the `emotions` and `diaries` collections.
///
/// Every method is scoped by `owner_id`; a record owned by someone else is
/// indistinguishable from a missing one.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Query a single collection. Results carry `kind` already set.
    async fn query(
        &self,
        kind: RecordKind,
        owner_id: &str,
        mode: &FetchMode,
    ) -> Result<Vec<Record>, StoreError>;

    async fn get(
        &self,
        owner_id: &str,
        kind: RecordKind,
        id: Uuid,
    ) -> Result<Option<Record>, StoreError>;

    async fn insert_emotion(&self, new: NewEmotion) -> Result<Record, StoreError>;

    /// Write a diary unless the owner already has `daily_limit` diaries on
    /// `new.date`, in which case nothing is written and `None` is returned.
    /// The count and the write are atomic with respect to other writers.
    async fn insert_diary(
        &self,
        new: NewDiary,
        daily_limit: i64,
    ) -> Result<Option<Record>, StoreError>;

    /// Merge `patch` into the record and stamp `updated_at`.
    async fn update(
        &self,
        owner_id: &str,
        kind: RecordKind,
        id: Uuid,
        patch: &RecordPatch,
    ) -> Result<Option<Record>, StoreError>;

    /// Returns whether a record was removed.
    async fn delete(&self, owner_id: &str, kind: RecordKind, id: Uuid) -> Result<bool, StoreError>;

    async fn count_diaries_on(&self, owner_id: &str, date: NaiveDate) -> Result<i64, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Fetch from both collections concurrently, merge newest first.
///
/// In limit mode the merged list is truncated after sorting, so the result is
/// the overall newest `n` rather than `n` from each collection.
pub async fn fetch_records(
    store: &dyn RecordStore,
    owner_id: &str,
    mode: FetchMode,
) -> Result<Vec<Record>, StoreError> {
    let (emotions, diaries) = try_join(
        store.query(RecordKind::Emotion, owner_id, &mode),
        store.query(RecordKind::Diary, owner_id, &mode),
    )
    .await
    .map_err(|e| {
        tracing::error!(owner_id = %owner_id, mode = mode.name(), error = %e, "Record fetch failed");
        e
    })?;

    tracing::debug!(
        owner_id = %owner_id,
        mode = mode.name(),
        emotions = emotions.len(),
        diaries = diaries.len(),
        "Fetched records"
    );

    let mut records = Vec::with_capacity(emotions.len() + diaries.len());
    records.extend(emotions.into_iter().map(|r| tag(r, RecordKind::Emotion)));
    records.extend(diaries.into_iter().map(|r| tag(r, RecordKind::Diary)));
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    if let FetchMode::Limit(n) = mode {
        records.truncate(n);
    }

    Ok(records)
}

/// All records whose logical day is `date`.
pub async fn records_on_date(
    store: &dyn RecordStore,
    owner_id: &str,
    date: NaiveDate,
) -> Result<Vec<Record>, StoreError> {
    fetch_records(store, owner_id, FetchMode::Range { start: date, end: date }).await
}

fn tag(mut record: Record, kind: RecordKind) -> Record {
    record.kind = kind;
    record
}
