//! Model lifecycle
//!
//! Loaded exactly once before the listener binds, read-only afterwards.
//! A failed load is recorded instead of aborting the process; every
//! prediction request is then rejected until restart.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::pipeline::LinearPipeline;
use super::predictor::Predictor;
use crate::features::FeatureSchema;
use crate::{telemetry, AppError};

pub enum ModelState {
    Ready {
        predictor: Arc<dyn Predictor>,
        loaded_at: DateTime<Utc>,
    },
    Unavailable {
        reason: String,
    },
}

/// Model status for health endpoints
#[derive(Debug, Clone, Serialize)]
pub struct ModelStatus {
    pub model_loaded: bool,
    pub model_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loaded_at: Option<DateTime<Utc>>,
}

impl ModelState {
    /// Load the pipeline artifact, recording failure instead of returning it
    pub fn load(path: impl AsRef<Path>, schema: &FeatureSchema) -> Self {
        let path = path.as_ref();
        tracing::info!("Loading model from: {}", path.display());

        let loaded = LinearPipeline::load(path)
            .and_then(|pipeline| pipeline.check_schema(schema).map(|_| pipeline));

        match loaded {
            Ok(pipeline) => {
                tracing::info!("Model loaded successfully: {}", pipeline.name());
                Self::ready(Arc::new(pipeline))
            }
            Err(e) => {
                tracing::error!("Error loading model: {}", e);
                telemetry::record_model_load_failure();
                Self::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn ready(predictor: Arc<dyn Predictor>) -> Self {
        Self::Ready {
            predictor,
            loaded_at: Utc::now(),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Shared predictor handle, or `ModelUnavailable`
    pub fn predictor(&self) -> Result<&dyn Predictor, AppError> {
        match self {
            Self::Ready { predictor, .. } => Ok(predictor.as_ref()),
            Self::Unavailable { reason } => Err(AppError::ModelUnavailable(reason.clone())),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    pub fn status(&self) -> ModelStatus {
        match self {
            Self::Ready { predictor, loaded_at } => ModelStatus {
                model_loaded: true,
                model_name: predictor.name().to_string(),
                loaded_at: Some(*loaded_at),
            },
            Self::Unavailable { .. } => ModelStatus {
                model_loaded: false,
                model_name: "None".to_string(),
                loaded_at: None,
            },
        }
    }
}
