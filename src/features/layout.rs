//! Feature Layout - Centralized Feature Definition
//!
//! **This file controls the feature schema the model was trained on.**
//!
//! ## Rules:
//! 1. Add column → increment FEATURE_VERSION
//! 2. Change order → increment FEATURE_VERSION
//! 3. Change a default → increment FEATURE_VERSION
//!
//! The pipeline consumes a positional table, so the order of
//! [`STUDENT_LAYOUT`] is part of the model contract.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current feature layout version
pub const FEATURE_VERSION: u8 = 1;

/// Default for absent categorical columns
pub const CATEGORICAL_DEFAULT: &str = "none";

// ============================================================================
// VALUES
// ============================================================================

/// A single scalar cell value.
///
/// Numbers keep their JSON representation so `17` echoes back as `17`,
/// not `17.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(serde_json::Number),
    Text(String),
}

impl FeatureValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(n) => n.as_f64(),
            FeatureValue::Text(_) => None,
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Number(n) => write!(f, "{}", n),
            FeatureValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for FeatureValue {
    fn from(v: i64) -> Self {
        FeatureValue::Number(v.into())
    }
}

impl From<i32> for FeatureValue {
    fn from(v: i32) -> Self {
        FeatureValue::Number(v.into())
    }
}

impl From<&str> for FeatureValue {
    fn from(v: &str) -> Self {
        FeatureValue::Text(v.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(v: String) -> Self {
        FeatureValue::Text(v)
    }
}

// ============================================================================
// COLUMNS
// ============================================================================

/// Type class of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

impl ColumnKind {
    /// Value used when a record omits the column
    pub fn default_value(self) -> FeatureValue {
        match self {
            ColumnKind::Numeric => FeatureValue::from(0),
            ColumnKind::Categorical => FeatureValue::from(CATEGORICAL_DEFAULT),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureColumn {
    pub name: String,
    pub kind: ColumnKind,
    pub default: FeatureValue,
    /// Records lacking a required column are rejected before reconciliation
    pub required: bool,
}

impl FeatureColumn {
    pub fn new(name: impl Into<String>, kind: ColumnKind, required: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            default: kind.default_value(),
            required,
        }
    }
}

// ============================================================================
// STUDENT LAYOUT (Authoritative source)
// ============================================================================

use ColumnKind::{Categorical as C, Numeric as N};

/// Columns in training order: (name, kind, required)
pub const STUDENT_LAYOUT: &[(&str, ColumnKind, bool)] = &[
    ("school", C, true),
    ("sex", C, true),
    ("age", N, true),
    ("address", C, true),
    ("Medu", N, true),
    ("Fedu", N, true),
    ("higher", C, false),
    ("romantic", C, false),
    ("dataset", C, false),
    ("Fjob", C, false),
    ("activities", C, false),
    ("Walc", N, false),
    ("health", N, false),
    ("Mjob", C, false),
    ("freetime", N, false),
    ("failures", N, false),
    ("goout", N, false),
    ("schoolsup", C, false),
    ("G2", N, false),
    ("nursery", C, false),
    ("Pstatus", C, false),
    ("traveltime", N, false),
    ("studytime", N, false),
    ("G3", N, false),
    ("famsize", C, false),
    ("paid", C, false),
    ("guardian", C, false),
    ("Dalc", N, false),
    ("internet", C, false),
    ("famsup", C, false),
    ("absences", N, false),
    ("G1", N, false),
    ("reason", C, false),
    ("famrel", N, false),
];

/// Total number of student columns
pub const STUDENT_FEATURE_COUNT: usize = 34;

// ============================================================================
// SCHEMA
// ============================================================================

/// Ordered, immutable column set the predictor expects
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSchema {
    version: u8,
    columns: Vec<FeatureColumn>,
}

impl FeatureSchema {
    pub fn new(version: u8, columns: Vec<FeatureColumn>) -> Self {
        Self { version, columns }
    }

    /// The schema of the shipped student-performance pipeline
    pub fn student() -> Self {
        let columns = STUDENT_LAYOUT
            .iter()
            .map(|&(name, kind, required)| FeatureColumn::new(name, kind, required))
            .collect();
        Self::new(FEATURE_VERSION, columns)
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn required(&self) -> impl Iterator<Item = &FeatureColumn> {
        self.columns.iter().filter(|c| c.required)
    }

    pub fn column(&self, name: &str) -> Option<&FeatureColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn default_for(&self, name: &str) -> Option<&FeatureValue> {
        self.column(name).map(|c| &c.default)
    }

    /// CRC32 over version and ordered column names
    pub fn layout_hash(&self) -> u32 {
        let mut hasher = Hasher::new();
        hasher.update(&[self.version]);

        for column in &self.columns {
            hasher.update(column.name.as_bytes());
            hasher.update(&[0]);
        }

        hasher.finalize()
    }

    pub fn layout_info(&self) -> LayoutInfo {
        LayoutInfo {
            version: self.version,
            hash: format!("{:08x}", self.layout_hash()),
            feature_count: self.columns.len(),
            columns: self.columns.clone(),
        }
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::student()
    }
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Layout description served to clients
#[derive(Debug, Clone, Serialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: String,
    pub feature_count: usize,
    pub columns: Vec<FeatureColumn>,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_count() {
        assert_eq!(STUDENT_LAYOUT.len(), STUDENT_FEATURE_COUNT);
        assert_eq!(FeatureSchema::student().len(), STUDENT_FEATURE_COUNT);
    }

    #[test]
    fn test_no_duplicate_columns() {
        let schema = FeatureSchema::student();
        let mut names: Vec<&str> = schema.column_names().collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), STUDENT_FEATURE_COUNT);
    }

    #[test]
    fn test_required_columns() {
        let schema = FeatureSchema::student();
        let required: Vec<&str> = schema.required().map(|c| c.name.as_str()).collect();
        assert_eq!(required, vec!["school", "sex", "age", "address", "Medu", "Fedu"]);
    }

    #[test]
    fn test_defaults_follow_kind() {
        let schema = FeatureSchema::student();
        assert_eq!(schema.default_for("traveltime"), Some(&FeatureValue::from(0)));
        assert_eq!(schema.default_for("G3"), Some(&FeatureValue::from(0)));
        assert_eq!(schema.default_for("Mjob"), Some(&FeatureValue::from("none")));
        assert_eq!(schema.default_for("unknown"), None);
    }

    #[test]
    fn test_layout_hash_stable() {
        assert_eq!(
            FeatureSchema::student().layout_hash(),
            FeatureSchema::student().layout_hash()
        );
    }

    #[test]
    fn test_layout_hash_detects_reorder() {
        let original = FeatureSchema::student();
        let mut columns = original.columns().to_vec();
        columns.swap(0, 1);
        let reordered = FeatureSchema::new(FEATURE_VERSION, columns);

        assert_ne!(original.layout_hash(), reordered.layout_hash());
    }

    #[test]
    fn test_column_lookup() {
        let schema = FeatureSchema::student();
        assert_eq!(schema.columns()[0].name, "school");
        assert_eq!(schema.column("famrel").map(|c| c.kind), Some(ColumnKind::Numeric));
        assert!(schema.column("nonexistent").is_none());
    }

    #[test]
    fn test_number_display_keeps_integers() {
        assert_eq!(FeatureValue::from(17).to_string(), "17");
        assert_eq!(FeatureValue::from("GP").to_string(), "GP");
    }
}
