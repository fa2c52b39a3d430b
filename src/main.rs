//! StudentPass Prediction Server
//!
//! Serves the student-performance classifier over HTTP.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   STUDENTPASS SERVER                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌─────────────┐  ┌───────────────────────┐ │
//! │  │  API      │  │  Feature    │  │  Model                │ │
//! │  │  (Axum)   │─▶│  Reconciler │─▶│  (Predictor, loaded   │ │
//! │  │           │  │  (schema)   │  │   once at startup)    │ │
//! │  └─────┬─────┘  └─────────────┘  └───────────────────────┘ │
//! │        ▼                                                    │
//! │  ┌─────────────┐                                           │
//! │  │ PostgreSQL  │  records collection                       │
//! │  └─────────────┘                                           │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;
mod error;
mod features;
mod handlers;
mod middleware;
mod model;
mod models;
mod telemetry;

use axum::{
    Router,
    routing::{get, post},
    middleware as axum_middleware,
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use std::net::SocketAddr;
use std::sync::Arc;

use features::FeatureSchema;
use model::ModelState;

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging and metrics
    telemetry::init_tracing(&config);
    telemetry::init_metrics()?;

    tracing::info!("StudentPass Server starting...");
    tracing::info!("Database: {}", config.database_url.split('@').last().unwrap_or("***"));

    // Load the model exactly once; a failure leaves the server up but unable to predict
    let schema = FeatureSchema::student();
    let model = ModelState::load(&config.model_path, &schema);
    if !model.is_loaded() {
        tracing::warn!("Prediction endpoints will return 503 until restarted with a valid model");
    }

    // Initialize database pool
    let pool = db::create_pool(&config.database_url)?;

    // Run migrations
    tracing::info!("Running database migrations...");
    if let Err(e) = db::run_migrations(&pool).await {
        tracing::error!("Failed to run migrations: {}", e);
    }

    // Build application state
    let state = AppState {
        pool,
        config: config.clone(),
        schema: Arc::new(schema),
        model: Arc::new(model),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: sqlx::PgPool,
    pub config: config::Config,
    pub schema: Arc<FeatureSchema>,
    pub model: Arc<ModelState>,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/", get(handlers::health::home))
        .route("/health", get(handlers::health::check))
        .route("/metrics", get(telemetry::handler))
        .route("/api/v1/schema", get(handlers::schema::get))

        // Records
        .route("/api/v1/records", get(handlers::records::list).post(handlers::records::create))
        .route("/api/v1/records/:id", get(handlers::records::get));

    // Prediction routes (API key, then model availability)
    let predict_routes = Router::new()
        .route("/api/v1/predict", get(handlers::predict::predict_query).post(handlers::predict::predict_json))
        .route("/api/v1/predict/csv", post(handlers::predict::predict_csv))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::model::require_model
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_api_key
        ));

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .merge(predict_routes)
        .layer(axum_middleware::from_fn(middleware::metrics::track_requests))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}

#[cfg(test)]
impl AppState {
    /// State over a lazy pool that never connects unless a query runs
    pub fn for_tests(model: ModelState) -> Self {
        let config = config::Config::for_tests();
        let pool = db::create_pool(&config.database_url)
            .expect("lazy pool");

        Self {
            pool,
            config,
            schema: Arc::new(FeatureSchema::student()),
            model: Arc::new(model),
        }
    }
}
