use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::db::store::{FetchMode, RecordStore, StoreError};
use crate::models::record::{
    EmotionLabel, NewDiary, NewEmotion, Record, RecordKind, RecordPatch,
};

#[derive(Debug, FromRow)]
struct EmotionRow {
    id: Uuid,
    owner_id: String,
    date: NaiveDate,
    timestamp: DateTime<Utc>,
    emotion_score: Option<i32>,
    emotion_label: EmotionLabel,
    emotion_emoji: Option<String>,
    note: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<EmotionRow> for Record {
    fn from(row: EmotionRow) -> Self {
        Self {
            id: row.id,
            owner_id: row.owner_id,
            kind: RecordKind::Emotion,
            date: row.date,
            timestamp: row.timestamp,
            emotion_score: row.emotion_score,
            emotion_label: row.emotion_label,
            emotion_emoji: row.emotion_emoji,
            note: row.note,
            content: None,
            is_shared: false,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct DiaryRow {
    id: Uuid,
    owner_id: String,
    date: NaiveDate,
    timestamp: DateTime<Utc>,
    emotion_score: Option<i32>,
    emotion_label: EmotionLabel,
    content: String,
    is_shared: bool,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<DiaryRow> for Record {
    fn from(row: DiaryRow) -> Self {
        Self {
            id: row.id,
            owner_id: row.owner_id,
            kind: RecordKind::Diary,
            date: row.date,
            timestamp: row.timestamp,
            emotion_score: row.emotion_score,
            emotion_label: row.emotion_label,
            emotion_emoji: None,
            note: None,
            content: Some(row.content),
            is_shared: row.is_shared,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Postgres-backed store: one table per collection.
#[derive(Clone)]
pub struct PgRecordStore {
    db: PgPool,
}

impl PgRecordStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn query_emotions(&self, owner_id: &str, mode: &FetchMode) -> Result<Vec<Record>, sqlx::Error> {
        let rows = match *mode {
            FetchMode::Range { start, end } => {
                sqlx::query_as::<_, EmotionRow>(
                    r#"
                    SELECT * FROM emotions
                    WHERE owner_id = $1 AND date >= $2 AND date <= $3
                    "#,
                )
                .bind(owner_id)
                .bind(start)
                .bind(end)
                .fetch_all(&self.db)
                .await?
            }
            FetchMode::Limit(n) => {
                sqlx::query_as::<_, EmotionRow>(
                    r#"
                    SELECT * FROM emotions
                    WHERE owner_id = $1
                    ORDER BY timestamp DESC
                    LIMIT $2
                    "#,
                )
                .bind(owner_id)
                .bind(i64::try_from(n).unwrap_or(i64::MAX))
                .fetch_all(&self.db)
                .await?
            }
            FetchMode::All => {
                sqlx::query_as::<_, EmotionRow>(
                    "SELECT * FROM emotions WHERE owner_id = $1 ORDER BY timestamp DESC",
                )
                .bind(owner_id)
                .fetch_all(&self.db)
                .await?
            }
        };
        Ok(rows.into_iter().map(Record::from).collect())
    }

    async fn query_diaries(&self, owner_id: &str, mode: &FetchMode) -> Result<Vec<Record>, sqlx::Error> {
        let rows = match *mode {
            FetchMode::Range { start, end } => {
                sqlx::query_as::<_, DiaryRow>(
                    r#"
                    SELECT * FROM diaries
                    WHERE owner_id = $1 AND date >= $2 AND date <= $3
                    "#,
                )
                .bind(owner_id)
                .bind(start)
                .bind(end)
                .fetch_all(&self.db)
                .await?
            }
            FetchMode::Limit(n) => {
                sqlx::query_as::<_, DiaryRow>(
                    r#"
                    SELECT * FROM diaries
                    WHERE owner_id = $1
                    ORDER BY timestamp DESC
                    LIMIT $2
                    "#,
                )
                .bind(owner_id)
                .bind(i64::try_from(n).unwrap_or(i64::MAX))
                .fetch_all(&self.db)
                .await?
            }
            FetchMode::All => {
                sqlx::query_as::<_, DiaryRow>(
                    "SELECT * FROM diaries WHERE owner_id = $1 ORDER BY timestamp DESC",
                )
                .bind(owner_id)
                .fetch_all(&self.db)
                .await?
            }
        };
        Ok(rows.into_iter().map(Record::from).collect())
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn query(
        &self,
        kind: RecordKind,
        owner_id: &str,
        mode: &FetchMode,
    ) -> Result<Vec<Record>, StoreError> {
        let records = match kind {
            RecordKind::Emotion => self.query_emotions(owner_id, mode).await?,
            RecordKind::Diary => self.query_diaries(owner_id, mode).await?,
        };
        Ok(records)
    }

    async fn get(
        &self,
        owner_id: &str,
        kind: RecordKind,
        id: Uuid,
    ) -> Result<Option<Record>, StoreError> {
        let record = match kind {
            RecordKind::Emotion => sqlx::query_as::<_, EmotionRow>(
                "SELECT * FROM emotions WHERE id = $1 AND owner_id = $2",
            )
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.db)
            .await?
            .map(Record::from),
            RecordKind::Diary => sqlx::query_as::<_, DiaryRow>(
                "SELECT * FROM diaries WHERE id = $1 AND owner_id = $2",
            )
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.db)
            .await?
            .map(Record::from),
        };
        Ok(record)
    }

    async fn insert_emotion(&self, new: NewEmotion) -> Result<Record, StoreError> {
        let row = sqlx::query_as::<_, EmotionRow>(
            r#"
            INSERT INTO emotions (id, owner_id, date, timestamp, emotion_score, emotion_label, emotion_emoji, note)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.owner_id)
        .bind(new.date)
        .bind(new.timestamp)
        .bind(new.emotion_score)
        .bind(new.emotion_label)
        .bind(&new.emotion_emoji)
        .bind(&new.note)
        .fetch_one(&self.db)
        .await?;
        Ok(row.into())
    }

    async fn insert_diary(
        &self,
        new: NewDiary,
        daily_limit: i64,
    ) -> Result<Option<Record>, StoreError> {
        let mut tx = self.db.begin().await?;

        // Serialises writers for the same owner and day until commit.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(format!("diary:{}:{}", new.owner_id, new.date))
            .execute(&mut *tx)
            .await?;

        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM diaries WHERE owner_id = $1 AND date = $2",
        )
        .bind(&new.owner_id)
        .bind(new.date)
        .fetch_one(&mut *tx)
        .await?;
        if existing >= daily_limit {
            return Ok(None);
        }

        let row = sqlx::query_as::<_, DiaryRow>(
            r#"
            INSERT INTO diaries (id, owner_id, date, timestamp, emotion_score, emotion_label, content, is_shared)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.owner_id)
        .bind(new.date)
        .bind(new.timestamp)
        .bind(new.emotion_score)
        .bind(new.emotion_label)
        .bind(&new.content)
        .bind(new.is_shared)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(Some(row.into()))
    }

    async fn update(
        &self,
        owner_id: &str,
        kind: RecordKind,
        id: Uuid,
        patch: &RecordPatch,
    ) -> Result<Option<Record>, StoreError> {
        let record = match kind {
            RecordKind::Emotion => sqlx::query_as::<_, EmotionRow>(
                r#"
                UPDATE emotions SET
                    emotion_score = COALESCE($3, emotion_score),
                    emotion_label = COALESCE($4, emotion_label),
                    emotion_emoji = COALESCE($5, emotion_emoji),
                    note = COALESCE($6, note),
                    updated_at = NOW()
                WHERE id = $1 AND owner_id = $2
                RETURNING *
                "#,
            )
            .bind(id)
            .bind(owner_id)
            .bind(patch.emotion_score)
            .bind(patch.emotion_label)
            .bind(&patch.emotion_emoji)
            .bind(&patch.note)
            .fetch_optional(&self.db)
            .await?
            .map(Record::from),
            RecordKind::Diary => sqlx::query_as::<_, DiaryRow>(
                r#"
                UPDATE diaries SET
                    emotion_score = COALESCE($3, emotion_score),
                    emotion_label = COALESCE($4, emotion_label),
                    content = COALESCE($5, content),
                    is_shared = COALESCE($6, is_shared),
                    updated_at = NOW()
                WHERE id = $1 AND owner_id = $2
                RETURNING *
                "#,
            )
            .bind(id)
            .bind(owner_id)
            .bind(patch.emotion_score)
            .bind(patch.emotion_label)
            .bind(&patch.content)
            .bind(patch.is_shared)
            .fetch_optional(&self.db)
            .await?
            .map(Record::from),
        };
        Ok(record)
    }

    async fn delete(&self, owner_id: &str, kind: RecordKind, id: Uuid) -> Result<bool, StoreError> {
        let sql = match kind {
            RecordKind::Emotion => "DELETE FROM emotions WHERE id = $1 AND owner_id = $2",
            RecordKind::Diary => "DELETE FROM diaries WHERE id = $1 AND owner_id = $2",
        };
        let result = sqlx::query(sql)
            .bind(id)
            .bind(owner_id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_diaries_on(&self, owner_id: &str, date: NaiveDate) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM diaries WHERE owner_id = $1 AND date = $2",
        )
        .bind(owner_id)
        .bind(date)
        .fetch_one(&self.db)
        .await?;
        Ok(count)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.db)
            .await?;
        Ok(())
    }
}
