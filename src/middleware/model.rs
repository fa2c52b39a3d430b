//! Model availability guard

use axum::{
    extract::{State, Request},
    middleware::Next,
    response::Response,
};

use crate::{AppState, AppError};

/// Middleware: Reject prediction requests while no model is loaded
pub async fn require_model(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    state.model.predictor()?;
    Ok(next.run(req).await)
}
