//! Predictor capability
//!
//! Any trained-model format can sit behind [`Predictor`]; the service only
//! ever needs `predict(table) -> labels`.

use thiserror::Error;

use crate::features::{FeatureSchema, FeatureValue, ReconciledRecord};

/// Predicted class label
pub type Label = i64;

#[derive(Debug, Error)]
pub enum PredictError {
    /// The assembled table does not fit what the model was trained on
    #[error("{0}")]
    SchemaMismatch(String),

    #[error("prediction failed: {0}")]
    Internal(String),
}

/// Prediction backend (linear pipeline today, ONNX or others later)
pub trait Predictor: Send + Sync {
    fn name(&self) -> &str;

    /// One label per table row, in row order
    fn predict(&self, table: &FeatureTable) -> Result<Vec<Label>, PredictError>;
}

/// Columnar input handed to a predictor: ordered column names, one row per
/// record
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    columns: Vec<String>,
    rows: Vec<Vec<FeatureValue>>,
}

impl FeatureTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<FeatureValue>>) -> Self {
        Self { columns, rows }
    }

    /// Project reconciled records onto the schema's column order
    pub fn from_records(schema: &FeatureSchema, records: &[ReconciledRecord]) -> Self {
        let columns: Vec<String> = schema.column_names().map(str::to_string).collect();
        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|name| {
                        record
                            .get(name)
                            .cloned()
                            .or_else(|| schema.default_for(name).cloned())
                            .unwrap_or_else(|| FeatureValue::from(0))
                    })
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<FeatureValue>] {
        &self.rows
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
