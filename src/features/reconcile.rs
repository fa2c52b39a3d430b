//! Schema-driven reconciliation
//!
//! Turns partially-specified records into rows holding exactly the schema's
//! columns, in schema order. Unknown input columns are dropped on purpose so
//! clients may send superfluous fields.

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::layout::{FeatureSchema, FeatureValue};
use super::record::{RecordIssue, StudentRecord};

/// A single record or a batch of them
#[derive(Debug, Clone, PartialEq)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

impl From<StudentRecord> for OneOrMany<StudentRecord> {
    fn from(record: StudentRecord) -> Self {
        OneOrMany::One(record)
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(items: Vec<T>) -> Self {
        OneOrMany::Many(items)
    }
}

/// A record conforming to a [`FeatureSchema`]
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledRecord {
    columns: Vec<(String, FeatureValue)>,
}

impl ReconciledRecord {
    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl Serialize for ReconciledRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Fill absent columns with schema defaults and fix column order.
///
/// A single record yields a one-element batch. Present values pass through
/// unchanged.
pub fn reconcile(
    records: impl Into<OneOrMany<StudentRecord>>,
    schema: &FeatureSchema,
) -> Vec<ReconciledRecord> {
    records
        .into()
        .into_vec()
        .iter()
        .map(|record| reconcile_record(record, schema))
        .collect()
}

pub fn reconcile_record(record: &StudentRecord, schema: &FeatureSchema) -> ReconciledRecord {
    let columns = schema
        .columns()
        .iter()
        .map(|column| {
            let value = record
                .get(&column.name)
                .cloned()
                .unwrap_or_else(|| column.default.clone());
            (column.name.clone(), value)
        })
        .collect();

    ReconciledRecord { columns }
}

/// Check required columns before any defaults are applied
pub fn check_required(
    index: usize,
    record: &StudentRecord,
    schema: &FeatureSchema,
) -> Result<(), RecordIssue> {
    let missing: Vec<String> = schema
        .required()
        .filter(|column| !record.contains(&column.name))
        .map(|column| column.name.clone())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(RecordIssue::missing(index, missing))
    }
}
