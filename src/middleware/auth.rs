//! API key middleware

use axum::{
    extract::{State, Request},
    middleware::Next,
    response::Response,
};

use crate::{AppState, AppError};

/// Header carrying the shared API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Middleware: Require the shared API key (exact match)
pub async fn require_api_key(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req.headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    if provided != Some(state.config.api_key.as_str()) {
        tracing::warn!("Unauthorized API key attempt on {}", req.uri().path());
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(req).await)
}
