//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;

use crate::{db, AppState};
use crate::model::ModelStatus;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: i64,
    model_loaded: bool,
}

#[derive(Serialize)]
pub struct HomeResponse {
    message: &'static str,
    db_status: String,
    model: ModelStatus,
}

pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let model_loaded = state.model.is_loaded();

    Json(HealthResponse {
        status: if model_loaded { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().timestamp(),
        model_loaded,
    })
}

/// Service banner with database and model status
pub async fn home(State(state): State<AppState>) -> Json<HomeResponse> {
    let db_status = match db::ping(&state.pool).await {
        Ok(()) => "SUCCESS".to_string(),
        Err(e) => {
            tracing::error!("Database connection failed: {}", e);
            e.to_string()
        }
    };

    Json(HomeResponse {
        message: "Student Pass Prediction API is running!",
        db_status,
        model: state.model.status(),
    })
}
