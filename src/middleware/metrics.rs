//! Request latency and status tracking

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use crate::telemetry;

/// Label for requests that matched no route
pub const UNMATCHED_ROUTE: &str = "unmatched";

/// Middleware: log and record every request
pub async fn track_requests(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let uri = req.uri().path().to_string();
    // Route templates only; raw paths would grow the series set without bound
    let path = req.extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string());

    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16();

    tracing::info!(
        "Endpoint: {} ({}), Method: {}, Status: {}, Latency: {:.4}s",
        path, uri, method, status, latency
    );
    telemetry::record_http_request(&method, &path, status, latency);

    response
}
