//! Payload decoding: JSON bodies and CSV uploads

use serde_json::Value;
use thiserror::Error;

use super::layout::{ColumnKind, FeatureSchema, FeatureValue};
use super::reconcile::OneOrMany;
use super::record::{ParsedRecord, StudentRecord};

#[derive(Debug, Error)]
pub enum InputError {
    #[error("No input data provided")]
    Empty,

    #[error("Expected a JSON object or an array of objects")]
    NotRecords,

    #[error("Failed to parse CSV: {0}")]
    Csv(String),
}

impl From<csv::Error> for InputError {
    fn from(err: csv::Error) -> Self {
        InputError::Csv(err.to_string())
    }
}

/// Split a decoded JSON body into one or many raw records
pub fn json_payload(body: Value) -> Result<OneOrMany<Value>, InputError> {
    match body {
        Value::Null => Err(InputError::Empty),
        Value::Object(_) => Ok(OneOrMany::One(body)),
        Value::Array(items) => Ok(OneOrMany::Many(items)),
        _ => Err(InputError::NotRecords),
    }
}

/// Parse every element of a JSON payload, keeping per-index failures
pub fn parse_json(body: Value) -> Result<Vec<ParsedRecord>, InputError> {
    let records = json_payload(body)?
        .into_vec()
        .iter()
        .enumerate()
        .map(|(index, value)| StudentRecord::from_json(index, value))
        .collect();

    Ok(records)
}

/// Parse a CSV document with a header row.
///
/// Empty cells are treated as absent so the schema default applies.
/// Only cells of numeric schema columns are read as numbers; everything
/// else keeps its exact text.
pub fn parse_csv(body: &str, schema: &FeatureSchema) -> Result<Vec<ParsedRecord>, InputError> {
    if body.trim().is_empty() {
        return Err(InputError::Empty);
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers = reader.headers()?.clone();
    let mut records = Vec::new();

    for row in reader.records() {
        let row = row?;
        let record: StudentRecord = headers
            .iter()
            .zip(row.iter())
            .filter(|(_, cell)| !cell.is_empty())
            .map(|(name, cell)| (name.to_string(), csv_cell(schema, name, cell)))
            .collect();
        records.push(Ok(record));
    }

    Ok(records)
}

fn csv_cell(schema: &FeatureSchema, name: &str, cell: &str) -> FeatureValue {
    let numeric = schema
        .column(name)
        .is_some_and(|c| c.kind == ColumnKind::Numeric);
    if !numeric {
        return FeatureValue::from(cell);
    }

    if let Ok(int) = cell.parse::<i64>() {
        return FeatureValue::from(int);
    }

    cell.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(FeatureValue::Number)
        .unwrap_or_else(|| FeatureValue::from(cell))
}
