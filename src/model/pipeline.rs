//! Linear Pipeline - JSON model artifact
//!
//! Standard-scaled numeric columns, one-hot categorical columns and a
//! logistic regression head, exported from the training notebook as JSON.
//!
//! ```text
//! table ──► [scale numeric] ──┐
//!                             ├──► design matrix · w + b ──► sigmoid ──► label
//! table ──► [one-hot cats] ───┘
//! ```

use std::path::Path;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::predictor::{FeatureTable, Label, PredictError, Predictor};
use crate::features::{FeatureSchema, FeatureValue};

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("model artifact not found: {0}")]
    NotFound(String),

    #[error("failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid model artifact: {0}")]
    Invalid(String),
}

// ============================================================================
// ARTIFACT
// ============================================================================

/// What to do with a category the encoder never saw during training
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleUnknown {
    #[default]
    Error,
    Ignore,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericEncoder {
    pub column: String,
    pub mean: f64,
    pub scale: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalEncoder {
    pub column: String,
    pub categories: Vec<String>,
    #[serde(default)]
    pub handle_unknown: HandleUnknown,
}

/// Serialized pipeline.
///
/// Coefficients are laid out as all numeric columns first, then each
/// categorical column's one-hot block in encoder order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineArtifact {
    pub model_name: String,
    #[serde(default)]
    pub version: String,
    pub numeric: Vec<NumericEncoder>,
    pub categorical: Vec<CategoricalEncoder>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// [negative, positive]
    #[serde(default = "default_labels")]
    pub labels: [Label; 2],
}

fn default_threshold() -> f64 {
    0.5
}

fn default_labels() -> [Label; 2] {
    [0, 1]
}

impl PipelineArtifact {
    /// Width of the encoded design matrix
    pub fn feature_width(&self) -> usize {
        self.numeric.len() + self.categorical.iter().map(|c| c.categories.len()).sum::<usize>()
    }

    /// Input columns consumed, numeric first
    pub fn input_columns(&self) -> impl Iterator<Item = &str> {
        self.numeric
            .iter()
            .map(|e| e.column.as_str())
            .chain(self.categorical.iter().map(|e| e.column.as_str()))
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

#[derive(Debug, Clone)]
pub struct LinearPipeline {
    artifact: PipelineArtifact,
    weights: Array1<f64>,
}

impl LinearPipeline {
    /// Load a pipeline artifact from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelLoadError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ModelLoadError::NotFound(path.display().to_string()));
        }

        let bytes = std::fs::read(path)?;
        Self::from_slice(&bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ModelLoadError> {
        let artifact: PipelineArtifact = serde_json::from_slice(bytes)?;
        Self::from_artifact(artifact)
    }

    pub fn from_artifact(artifact: PipelineArtifact) -> Result<Self, ModelLoadError> {
        let width = artifact.feature_width();
        if artifact.coefficients.len() != width {
            return Err(ModelLoadError::Invalid(format!(
                "expected {} coefficients, found {}",
                width,
                artifact.coefficients.len()
            )));
        }

        if let Some(enc) = artifact
            .numeric
            .iter()
            .find(|e| !e.scale.is_finite() || e.scale == 0.0)
        {
            return Err(ModelLoadError::Invalid(format!(
                "column '{}' has unusable scale {}",
                enc.column, enc.scale
            )));
        }

        if let Some(enc) = artifact.numeric.iter().find(|e| !e.mean.is_finite()) {
            return Err(ModelLoadError::Invalid(format!(
                "column '{}' has non-finite mean {}",
                enc.column, enc.mean
            )));
        }

        if let Some(pos) = artifact.coefficients.iter().position(|c| !c.is_finite()) {
            return Err(ModelLoadError::Invalid(format!(
                "coefficient {} is not finite ({})",
                pos, artifact.coefficients[pos]
            )));
        }

        if !artifact.intercept.is_finite() {
            return Err(ModelLoadError::Invalid(format!(
                "intercept {} is not finite",
                artifact.intercept
            )));
        }

        if !(0.0..=1.0).contains(&artifact.threshold) {
            return Err(ModelLoadError::Invalid(format!(
                "threshold {} outside [0, 1]",
                artifact.threshold
            )));
        }

        let weights = Array1::from(artifact.coefficients.clone());
        Ok(Self { artifact, weights })
    }

    pub fn artifact(&self) -> &PipelineArtifact {
        &self.artifact
    }

    /// Every column the artifact consumes must exist in `schema`
    pub fn check_schema(&self, schema: &FeatureSchema) -> Result<(), ModelLoadError> {
        let missing: Vec<&str> = self
            .artifact
            .input_columns()
            .filter(|name| schema.column(name).is_none())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ModelLoadError::Invalid(format!(
                "artifact consumes columns absent from the feature layout: {}",
                missing.join(", ")
            )))
        }
    }

    /// Positive-class probability per row
    pub fn probabilities(&self, table: &FeatureTable) -> Result<Array1<f64>, PredictError> {
        let design = self.encode(table)?;
        let logits = design.dot(&self.weights) + self.artifact.intercept;
        Ok(logits.mapv(sigmoid))
    }

    fn encode(&self, table: &FeatureTable) -> Result<Array2<f64>, PredictError> {
        let mut design = Array2::<f64>::zeros((table.row_count(), self.weights.len()));
        let mut offset = 0;

        for enc in &self.artifact.numeric {
            let col = input_column(table, &enc.column)?;

            for (i, row) in table.rows().iter().enumerate() {
                let cell = cell(row, col, i)?;
                let x = numeric_value(cell).ok_or_else(|| {
                    PredictError::SchemaMismatch(format!(
                        "column '{}' expects a numeric value, got '{}' (row {})",
                        enc.column, cell, i
                    ))
                })?;
                design[[i, offset]] = (x - enc.mean) / enc.scale;
            }

            offset += 1;
        }

        for enc in &self.artifact.categorical {
            let col = input_column(table, &enc.column)?;

            for (i, row) in table.rows().iter().enumerate() {
                let category = cell(row, col, i)?.to_string();

                match enc.categories.iter().position(|c| *c == category) {
                    Some(pos) => design[[i, offset + pos]] = 1.0,
                    None if enc.handle_unknown == HandleUnknown::Ignore => {}
                    None => {
                        return Err(PredictError::SchemaMismatch(format!(
                            "found unknown category '{}' in column '{}' (row {})",
                            category, enc.column, i
                        )));
                    }
                }
            }

            offset += enc.categories.len();
        }

        Ok(design)
    }
}

impl Predictor for LinearPipeline {
    fn name(&self) -> &str {
        &self.artifact.model_name
    }

    fn predict(&self, table: &FeatureTable) -> Result<Vec<Label>, PredictError> {
        if table.is_empty() {
            return Ok(Vec::new());
        }

        let [negative, positive] = self.artifact.labels;
        let threshold = self.artifact.threshold;

        Ok(self
            .probabilities(table)?
            .iter()
            .map(|&p| if p >= threshold { positive } else { negative })
            .collect())
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn input_column(table: &FeatureTable, name: &str) -> Result<usize, PredictError> {
    table.column_index(name).ok_or_else(|| {
        PredictError::SchemaMismatch(format!("column '{}' is missing from the input table", name))
    })
}

fn cell(row: &[FeatureValue], col: usize, row_index: usize) -> Result<&FeatureValue, PredictError> {
    row.get(col).ok_or_else(|| {
        PredictError::Internal(format!("row {} has {} cells, expected more than {}", row_index, row.len(), col))
    })
}

/// Numbers pass through; numeric strings are parsed
fn numeric_value(value: &FeatureValue) -> Option<f64> {
    value.as_f64().or_else(|| match value {
        FeatureValue::Text(s) => s.trim().parse::<f64>().ok().filter(|x| x.is_finite()),
        FeatureValue::Number(_) => None,
    })
}

// ============================================================================
// TESTS
// ============================================================================
