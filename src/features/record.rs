//! Student records as received from clients

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::Value;

use super::layout::FeatureValue;

/// One row to classify, possibly incomplete
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StudentRecord {
    fields: BTreeMap<String, FeatureValue>,
}

impl StudentRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<FeatureValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FeatureValue>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Build a record from one element of a JSON payload.
    ///
    /// Nulls count as absent. Booleans are kept as their text form.
    /// Arrays and objects are rejected.
    pub fn from_json(index: usize, value: &Value) -> Result<Self, RecordIssue> {
        let object = value
            .as_object()
            .ok_or_else(|| RecordIssue::message(index, "Record must be a JSON object"))?;

        let mut record = Self::new();
        let mut invalid = Vec::new();

        for (name, value) in object {
            match value {
                Value::Null => {}
                Value::Number(n) => record.insert(name.clone(), FeatureValue::Number(n.clone())),
                Value::String(s) => record.insert(name.clone(), s.clone()),
                Value::Bool(b) => record.insert(name.clone(), b.to_string()),
                Value::Array(_) | Value::Object(_) => invalid.push(name.clone()),
            }
        }

        if !invalid.is_empty() {
            return Err(RecordIssue::invalid(index, invalid));
        }

        Ok(record)
    }

    /// Query parameters arrive as strings and stay strings
    pub fn from_query(params: HashMap<String, String>) -> Self {
        params.into_iter().collect()
    }
}

impl FromIterator<(String, FeatureValue)> for StudentRecord {
    fn from_iter<I: IntoIterator<Item = (String, FeatureValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl FromIterator<(String, String)> for StudentRecord {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(k, v)| (k, FeatureValue::Text(v)))
            .collect()
    }
}

/// Why a single batch element was rejected
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordIssue {
    pub index: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_features: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub invalid_features: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RecordIssue {
    pub fn missing(index: usize, features: Vec<String>) -> Self {
        Self {
            index,
            missing_features: features,
            invalid_features: Vec::new(),
            message: None,
        }
    }

    pub fn invalid(index: usize, features: Vec<String>) -> Self {
        Self {
            index,
            missing_features: Vec::new(),
            invalid_features: features,
            message: Some("Feature values must be scalars".to_string()),
        }
    }

    pub fn message(index: usize, message: impl Into<String>) -> Self {
        Self {
            index,
            missing_features: Vec::new(),
            invalid_features: Vec::new(),
            message: Some(message.into()),
        }
    }
}

/// Outcome of parsing one batch element
pub type ParsedRecord = Result<StudentRecord, RecordIssue>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_keeps_scalars() {
        let record = StudentRecord::from_json(0, &json!({
            "school": "GP",
            "age": 17,
            "higher": true,
            "G3": null
        }))
        .unwrap();

        assert_eq!(record.get("school"), Some(&FeatureValue::from("GP")));
        assert_eq!(record.get("age"), Some(&FeatureValue::from(17)));
        assert_eq!(record.get("higher"), Some(&FeatureValue::from("true")));
        assert!(!record.contains("G3"));
    }

    #[test]
    fn test_from_json_rejects_nested_values() {
        let issue = StudentRecord::from_json(3, &json!({
            "school": "GP",
            "grades": [10, 12],
            "family": {"size": "GT3"}
        }))
        .unwrap_err();

        assert_eq!(issue.index, 3);
        assert_eq!(issue.invalid_features, vec!["family", "grades"]);
    }

    #[test]
    fn test_from_json_rejects_non_objects() {
        let issue = StudentRecord::from_json(1, &json!("GP")).unwrap_err();
        assert_eq!(issue.index, 1);
        assert!(issue.message.is_some());
    }

    #[test]
    fn test_from_query_keeps_strings() {
        let mut params = HashMap::new();
        params.insert("age".to_string(), "17".to_string());
        let record = StudentRecord::from_query(params);
        assert_eq!(record.get("age"), Some(&FeatureValue::from("17")));
    }

    #[test]
    fn test_issue_serialization_skips_empty_lists() {
        let value = serde_json::to_value(RecordIssue::missing(1, vec!["age".into()])).unwrap();
        assert_eq!(value, json!({"index": 1, "missing_features": ["age"]}));
    }
}
