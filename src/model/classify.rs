//! Classification: validate → reconcile → predict
//!
//! Batch policy: partial success. Records that fail validation are reported
//! by index and skipped; the rest are predicted in a single predictor call.
//! A batch where every record is invalid fails as a whole. Predictor errors
//! always fail the whole batch.

use serde::Serialize;

use super::predictor::{FeatureTable, Label, PredictError, Predictor};
use super::state::ModelState;
use crate::features::{
    check_required, reconcile, FeatureSchema, ParsedRecord, ReconciledRecord, RecordIssue,
    StudentRecord,
};
use crate::{telemetry, AppError, AppResult};

/// Default upper bound on records per request
pub const DEFAULT_MAX_BATCH_SIZE: usize = 1000;

#[derive(Debug, Clone)]
pub struct ClassifyOptions {
    /// Echo each original record next to its prediction
    pub echo: bool,
    pub max_batch_size: usize,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            echo: false,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    /// Position of the record in the request batch
    pub index: usize,
    pub prediction: Label,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<StudentRecord>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ClassifyOutcome {
    pub predictions: Vec<PredictionResult>,
    pub errors: Vec<RecordIssue>,
}

/// Run the predictor once over schema-conformant records.
///
/// Results carry positional indexes into `records`. An empty slice returns
/// an empty result without touching the predictor.
pub fn predict(
    predictor: &dyn Predictor,
    schema: &FeatureSchema,
    records: &[ReconciledRecord],
) -> Result<Vec<PredictionResult>, PredictError> {
    if records.is_empty() {
        return Ok(Vec::new());
    }

    let table = FeatureTable::from_records(schema, records);
    let labels = predictor.predict(&table)?;

    if labels.len() != records.len() {
        return Err(PredictError::Internal(format!(
            "predictor returned {} labels for {} records",
            labels.len(),
            records.len()
        )));
    }

    Ok(labels
        .into_iter()
        .enumerate()
        .map(|(index, prediction)| PredictionResult {
            index,
            prediction,
            input: None,
        })
        .collect())
}

/// Classify a decoded request batch
pub fn classify(
    model: &ModelState,
    schema: &FeatureSchema,
    records: Vec<ParsedRecord>,
    options: &ClassifyOptions,
) -> AppResult<ClassifyOutcome> {
    let predictor = model.predictor()?;

    if records.len() > options.max_batch_size {
        return Err(AppError::ValidationError(format!(
            "Batch of {} records exceeds the limit of {}",
            records.len(),
            options.max_batch_size
        )));
    }

    let mut indexes = Vec::with_capacity(records.len());
    let mut valid = Vec::with_capacity(records.len());
    let mut errors = Vec::new();

    for (index, parsed) in records.into_iter().enumerate() {
        let checked = parsed.and_then(|record| {
            check_required(index, &record, schema)?;
            Ok(record)
        });

        match checked {
            Ok(record) => {
                indexes.push(index);
                valid.push(record);
            }
            Err(issue) => errors.push(issue),
        }
    }

    if valid.is_empty() && !errors.is_empty() {
        tracing::warn!("Validation failed for all {} records", errors.len());
        telemetry::record_predictions(0, errors.len());
        return Err(AppError::InvalidRecords(errors));
    }

    let echoed = options.echo.then(|| valid.clone());
    let reconciled = reconcile(valid, schema);
    tracing::debug!("Reconciled {} records against schema v{}", reconciled.len(), schema.version());

    let results = predict(predictor, schema, &reconciled).map_err(|e| {
        tracing::warn!("Predictor rejected batch of {}: {}", reconciled.len(), e);
        AppError::from(e)
    })?;

    let mut echoed = echoed.map(Vec::into_iter);
    let predictions: Vec<PredictionResult> = results
        .into_iter()
        .zip(indexes)
        .map(|(mut result, index)| {
            result.index = index;
            result.input = echoed.as_mut().and_then(|it| it.next());
            result
        })
        .collect();

    telemetry::record_predictions(predictions.len(), errors.len());
    tracing::info!(
        "Predictions: {} ok, {} rejected (model: {})",
        predictions.len(),
        errors.len(),
        predictor.name()
    );

    Ok(ClassifyOutcome { predictions, errors })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureValue;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Predicts 1 when school == "GP", counts calls
    struct SchoolPredictor {
        calls: AtomicUsize,
    }

    impl SchoolPredictor {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Predictor for SchoolPredictor {
        fn name(&self) -> &str {
            "school-stub"
        }

        fn predict(&self, table: &FeatureTable) -> Result<Vec<Label>, PredictError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let col = table
                .column_index("school")
                .ok_or_else(|| PredictError::SchemaMismatch("no school".into()))?;

            table
                .rows()
                .iter()
                .map(|row| match &row[col] {
                    FeatureValue::Text(s) if s == "GP" => Ok(1),
                    FeatureValue::Text(s) if s == "MS" => Ok(0),
                    other => Err(PredictError::SchemaMismatch(format!(
                        "found unknown category '{}' in column 'school'",
                        other
                    ))),
                })
                .collect()
        }
    }

    fn student(school: &str) -> StudentRecord {
        StudentRecord::new()
            .with("school", school)
            .with("sex", "F")
            .with("age", 17)
            .with("address", "U")
            .with("Medu", 4)
            .with("Fedu", 3)
    }

    fn ready(predictor: Arc<SchoolPredictor>) -> ModelState {
        ModelState::ready(predictor)
    }

    #[test]
    fn test_empty_input_returns_empty_output() {
        let stub = SchoolPredictor::new();
        let schema = FeatureSchema::student();

        let results = predict(stub.as_ref(), &schema, &[]).unwrap();
        assert!(results.is_empty());
        assert_eq!(stub.calls(), 0);

        let outcome = classify(&ready(stub.clone()), &schema, Vec::new(), &ClassifyOptions::default()).unwrap();
        assert!(outcome.predictions.is_empty());
        assert!(outcome.errors.is_empty());
        assert_eq!(stub.calls(), 0);
    }

    #[test]
    fn test_single_predictor_call_per_batch() {
        let stub = SchoolPredictor::new();
        let schema = FeatureSchema::student();
        let records = vec![Ok(student("GP")), Ok(student("MS")), Ok(student("GP"))];

        let outcome = classify(&ready(stub.clone()), &schema, records, &ClassifyOptions::default()).unwrap();

        let labels: Vec<Label> = outcome.predictions.iter().map(|p| p.prediction).collect();
        assert_eq!(labels, vec![1, 0, 1]);
        assert_eq!(stub.calls(), 1);
    }

    #[test]
    fn test_unavailable_model() {
        let schema = FeatureSchema::student();
        let state = ModelState::unavailable("Model not found: performance_pipeline.json");

        let result = classify(&state, &schema, vec![Ok(student("GP"))], &ClassifyOptions::default());
        assert!(matches!(result, Err(AppError::ModelUnavailable(_))));
    }

    #[test]
    fn test_partial_batch_reports_index() {
        let stub = SchoolPredictor::new();
        let schema = FeatureSchema::student();
        let incomplete = StudentRecord::new()
            .with("school", "MS")
            .with("sex", "M")
            .with("address", "R")
            .with("Medu", 2)
            .with("Fedu", 2);

        let outcome = classify(
            &ready(stub.clone()),
            &schema,
            vec![Ok(student("GP")), Ok(incomplete)],
            &ClassifyOptions::default(),
        )
        .unwrap();

        assert_eq!(outcome.predictions.len(), 1);
        assert_eq!(outcome.predictions[0].index, 0);
        assert_eq!(outcome.predictions[0].prediction, 1);

        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].index, 1);
        assert_eq!(outcome.errors[0].missing_features, vec!["age"]);
    }

    #[test]
    fn test_indexes_map_back_after_rejections() {
        let stub = SchoolPredictor::new();
        let schema = FeatureSchema::student();
        let records = vec![
            Err(RecordIssue::message(0, "Record must be a JSON object")),
            Ok(student("MS")),
            Ok(StudentRecord::new()),
            Ok(student("GP")),
        ];

        let outcome = classify(&ready(stub), &schema, records, &ClassifyOptions::default()).unwrap();

        let indexed: Vec<(usize, Label)> =
            outcome.predictions.iter().map(|p| (p.index, p.prediction)).collect();
        assert_eq!(indexed, vec![(1, 0), (3, 1)]);

        let rejected: Vec<usize> = outcome.errors.iter().map(|e| e.index).collect();
        assert_eq!(rejected, vec![0, 2]);
    }

    #[test]
    fn test_all_invalid_fails() {
        let stub = SchoolPredictor::new();
        let schema = FeatureSchema::student();

        let result = classify(
            &ready(stub.clone()),
            &schema,
            vec![Ok(StudentRecord::new().with("school", "GP"))],
            &ClassifyOptions::default(),
        );

        match result {
            Err(AppError::InvalidRecords(issues)) => {
                assert_eq!(issues.len(), 1);
                assert_eq!(issues[0].missing_features, vec!["sex", "age", "address", "Medu", "Fedu"]);
            }
            other => panic!("expected InvalidRecords, got {:?}", other.map(|o| o.predictions)),
        }
        assert_eq!(stub.calls(), 0);
    }

    #[test]
    fn test_predictor_rejection_fails_whole_batch() {
        let stub = SchoolPredictor::new();
        let schema = FeatureSchema::student();

        let result = classify(
            &ready(stub),
            &schema,
            vec![Ok(student("GP")), Ok(student("XX"))],
            &ClassifyOptions::default(),
        );

        assert!(matches!(result, Err(AppError::SchemaMismatch(msg)) if msg.contains("'XX'")));
    }

    #[test]
    fn test_echo_attaches_original_record() {
        let stub = SchoolPredictor::new();
        let schema = FeatureSchema::student();
        let original = student("GP").with("nickname", "ana");
        let options = ClassifyOptions {
            echo: true,
            ..ClassifyOptions::default()
        };

        let outcome = classify(&ready(stub), &schema, vec![Ok(original.clone())], &options).unwrap();
        assert_eq!(outcome.predictions[0].input.as_ref(), Some(&original));
    }

    #[test]
    fn test_batch_size_limit() {
        let stub = SchoolPredictor::new();
        let schema = FeatureSchema::student();
        let options = ClassifyOptions {
            echo: false,
            max_batch_size: 2,
        };
        let records = (0..3).map(|_| Ok(student("GP"))).collect();

        let result = classify(&ready(stub.clone()), &schema, records, &options);
        assert!(matches!(result, Err(AppError::ValidationError(_))));
        assert_eq!(stub.calls(), 0);
    }
}
