//! Prediction handlers

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Deserialize;

use crate::{AppState, AppError, AppResult};
use crate::features::{input, ParsedRecord, StudentRecord};
use crate::model::{classify, ClassifyOptions, ClassifyOutcome};

#[derive(Debug, Deserialize, Default)]
pub struct PredictOptions {
    /// Echo each input record next to its prediction
    #[serde(default)]
    pub echo: bool,
}

/// POST /api/v1/predict - JSON object or array of objects
pub async fn predict_json(
    State(state): State<AppState>,
    options: Result<Query<PredictOptions>, QueryRejection>,
    body: Bytes,
) -> AppResult<Json<ClassifyOutcome>> {
    let Query(options) = options?;
    if body.is_empty() {
        return Err(input::InputError::Empty.into());
    }

    let body: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
        tracing::error!("Failed to decode JSON: {}", e);
        AppError::ValidationError(format!("Failed to decode JSON: {}", e))
    })?;

    let records = input::parse_json(body)?;
    tracing::info!("POST /predict called with {} records", records.len());

    run(&state, records, options.echo)
}

/// GET /api/v1/predict - query parameters form a single record
pub async fn predict_query(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<ClassifyOutcome>> {
    let record = StudentRecord::from_query(params);
    tracing::info!("GET /predict called with {} fields", record.len());

    run(&state, vec![Ok(record)], false)
}

/// POST /api/v1/predict/csv - CSV upload with a header row
pub async fn predict_csv(
    State(state): State<AppState>,
    options: Result<Query<PredictOptions>, QueryRejection>,
    body: String,
) -> AppResult<Json<ClassifyOutcome>> {
    let Query(options) = options?;
    let records = input::parse_csv(&body, &state.schema)?;
    tracing::info!("POST /predict/csv called with {} rows", records.len());

    run(&state, records, options.echo)
}

fn run(state: &AppState, records: Vec<ParsedRecord>, echo: bool) -> AppResult<Json<ClassifyOutcome>> {
    let options = ClassifyOptions {
        echo,
        max_batch_size: state.config.max_batch_size,
    };

    let outcome = classify(&state.model, &state.schema, records, &options)?;
    Ok(Json(outcome))
}
