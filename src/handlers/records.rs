//! Records handlers

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use serde_json::Value;
use validator::Validate;

use crate::{AppState, AppError, AppResult};
use crate::models::{parse_record_id, InsertedRecord, RecordFilter, RecordResponse, StoredRecord};

/// List stored records, newest first
pub async fn list(
    State(state): State<AppState>,
    filter: Result<Query<RecordFilter>, QueryRejection>,
) -> AppResult<Json<Vec<RecordResponse>>> {
    let Query(filter) = filter?;
    filter.validate()?;

    let records = StoredRecord::list(&state.pool, &filter).await?;
    tracing::info!("Retrieved {} records", records.len());

    Ok(Json(records.into_iter().map(StoredRecord::into_response).collect()))
}

/// Insert a JSON document
pub async fn create(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<InsertedRecord>> {
    let document = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(document)) => document,
        Ok(_) => return Err(AppError::ValidationError("Record must be a JSON object".to_string())),
        Err(e) => return Err(AppError::ValidationError(format!("Failed to decode JSON: {}", e))),
    };

    let record = StoredRecord::create(&state.pool, document).await?;
    tracing::info!("Inserted record with ID: {}", record.id);

    Ok(Json(InsertedRecord {
        inserted_id: record.id.to_string(),
    }))
}

/// Get single record
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<RecordResponse>> {
    let id = parse_record_id(&id).ok_or_else(|| {
        tracing::warn!("Invalid ID format: {}", id);
        AppError::ValidationError("Invalid ID format".to_string())
    })?;

    let record = StoredRecord::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| {
            tracing::warn!("Record not found: {}", id);
            AppError::NotFound("Record not found".to_string())
        })?;

    Ok(Json(record.into_response()))
}
