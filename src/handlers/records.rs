use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::NaiveDate;
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::db::{fetch_records, records_on_date};
use crate::dto::{DeleteResponse, RecordsQuery, RecordsResponse, UpdateRecordRequest};
use crate::error::{AppError, AppResult};
use crate::models::record::{Record, RecordKind, RecordPatch};
use crate::AppState;

/// Store failures come back as `success: false` with no records.
pub async fn list_records(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<RecordsQuery>,
) -> AppResult<Json<RecordsResponse>> {
    let mode = query.mode()?;

    let response = match fetch_records(state.store.as_ref(), &auth_user.owner_id, mode).await {
        Ok(records) => RecordsResponse::ok(records),
        Err(e) => RecordsResponse::failed(e.to_string()),
    };
    Ok(Json(response))
}

pub async fn list_records_on_date(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(date): Path<NaiveDate>,
) -> Json<RecordsResponse> {
    let response = match records_on_date(state.store.as_ref(), &auth_user.owner_id, date).await {
        Ok(records) => RecordsResponse::ok(records),
        Err(e) => RecordsResponse::failed(e.to_string()),
    };
    Json(response)
}

pub async fn get_record(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path((kind, id)): Path<(RecordKind, Uuid)>,
) -> AppResult<Json<Record>> {
    let record = state
        .store
        .get(&auth_user.owner_id, kind, id)
        .await?
        .ok_or(AppError::NotFound("Record not found".into()))?;

    Ok(Json(record))
}

pub async fn update_record(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path((kind, id)): Path<(RecordKind, Uuid)>,
    Json(req): Json<UpdateRecordRequest>,
) -> AppResult<Json<Record>> {
    req.validate()?;
    let patch = RecordPatch::from(req);
    check_patch(kind, &patch)?;

    let record = state
        .store
        .update(&auth_user.owner_id, kind, id, &patch)
        .await?
        .ok_or(AppError::NotFound("Record not found".into()))?;

    tracing::info!(owner_id = %auth_user.owner_id, kind = kind.collection(), id = %id, "Record updated");
    Ok(Json(record))
}

pub async fn delete_record(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path((kind, id)): Path<(RecordKind, Uuid)>,
) -> AppResult<Json<DeleteResponse>> {
    if !state.store.delete(&auth_user.owner_id, kind, id).await? {
        return Err(AppError::NotFound("Record not found".into()));
    }

    tracing::info!(owner_id = %auth_user.owner_id, kind = kind.collection(), id = %id, "Record deleted");
    Ok(Json(DeleteResponse { deleted: true, id }))
}

/// Fields a patch may touch depend on the collection.
fn check_patch(kind: RecordKind, patch: &RecordPatch) -> AppResult<()> {
    if let Some(label) = patch.emotion_label {
        if label.vocabulary() != kind {
            return Err(AppError::Validation(format!(
                "label {label} does not belong to {}",
                kind.collection()
            )));
        }
    }
    match kind {
        RecordKind::Emotion if patch.content.is_some() || patch.is_shared.is_some() => Err(
            AppError::Validation("emotion entries have no content or sharing".into()),
        ),
        RecordKind::Diary if patch.note.is_some() || patch.emotion_emoji.is_some() => Err(
            AppError::Validation("diary entries have no note or emoji".into()),
        ),
        _ => Ok(()),
    }
}
