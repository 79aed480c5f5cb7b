use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Keys that describe ground truth on sample records. They are tracked beside
/// the form and must never reach the scoring service.
pub const LABEL_FIELDS: [&str; 2] = ["actual_risk", "actual_risk_label"];

pub const RISKY_LABEL: &str = "Riskli";
pub const SAFE_LABEL: &str = "Güvenli";

/// Server-declared description of the fields a credit application carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub numeric_features: Vec<String>,
    pub categorical_features: BTreeMap<String, CategoricalFeature>,
    #[serde(default)]
    pub all_features: Vec<String>,
}

/// Allowed values for one categorical field, in server order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalFeature {
    #[serde(rename = "type", default = "categorical_type")]
    pub kind: String,
    #[serde(rename = "values", default)]
    pub allowed_values: Vec<String>,
}

fn categorical_type() -> String {
    "categorical".to_string()
}

impl FeatureSchema {
    /// Every field the form owns: numeric fields, then categorical fields.
    /// `all_features` is only a cross-check. Duplicates and label keys are
    /// dropped.
    pub fn field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let candidates = self
            .numeric_features
            .iter()
            .chain(self.categorical_features.keys());
        for name in candidates {
            if is_label_field(name) || names.iter().any(|existing| existing == name) {
                continue;
            }
            names.push(name.clone());
        }
        names
    }

    pub fn contains(&self, field: &str) -> bool {
        !is_label_field(field)
            && (self.is_numeric(field) || self.categorical_features.contains_key(field))
    }

    pub fn is_numeric(&self, field: &str) -> bool {
        self.numeric_features.iter().any(|name| name == field)
    }

    pub fn categorical(&self, field: &str) -> Option<&CategoricalFeature> {
        self.categorical_features.get(field)
    }

    /// Names listed in `all_features` that neither typed list declares.
    pub fn undeclared_features(&self) -> Vec<&str> {
        self.all_features
            .iter()
            .filter(|name| !self.is_numeric(name) && !self.categorical_features.contains_key(*name))
            .map(String::as_str)
            .collect()
    }
}

pub fn is_label_field(field: &str) -> bool {
    LABEL_FIELDS.contains(&field)
}

/// Scalar held by a form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(Number),
    Text(String),
}

impl FieldValue {
    pub fn int(value: i64) -> Self {
        Self::Number(Number::from(value))
    }

    /// Non-finite floats have no JSON form and become empty text.
    pub fn float(value: f64) -> Self {
        match Number::from_f64(value) {
            Some(number) => Self::Number(number),
            None => Self::Text(String::new()),
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Numeric reading of the value; text is parsed when it looks numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(number) => number.as_f64(),
            FieldValue::Text(text) => text.trim().parse::<f64>().ok(),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, FieldValue::Text(text) if text.is_empty())
    }

    /// Parse user input for `field`: numeric schema fields become numbers
    /// (integers when possible), everything else stays text.
    pub fn parse_for(schema: &FeatureSchema, field: &str, raw: &str) -> Result<Self, String> {
        if !schema.is_numeric(field) {
            return Ok(Self::text(raw));
        }
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Self::text(""));
        }
        if let Ok(int) = trimmed.parse::<i64>() {
            return Ok(Self::int(int));
        }
        trimmed
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .map(Self::float)
            .ok_or_else(|| format!("'{raw}' is not a number (field {field})"))
    }

    pub(crate) fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => Some(Self::Number(number.clone())),
            Value::String(text) => Some(Self::Text(text.clone())),
            Value::Bool(flag) => Some(Self::Text(flag.to_string())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(number) => write!(f, "{number}"),
            FieldValue::Text(text) => write!(f, "{text}"),
        }
    }
}

/// Payload posted to `/predict`: schema fields only.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CreditApplication {
    fields: BTreeMap<String, FieldValue>,
}

impl CreditApplication {
    /// Label keys are dropped here regardless of what the caller passes in.
    pub(crate) fn from_fields(fields: BTreeMap<String, FieldValue>) -> Self {
        let fields = fields
            .into_iter()
            .filter(|(name, _)| !is_label_field(name))
            .collect();
        Self { fields }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// Ground truth attached to a historical sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundTruth {
    pub label: Option<String>,
    pub code: Option<String>,
}

impl GroundTruth {
    /// Human label, derived from the raw code when the server sent only that.
    pub fn resolved_label(&self) -> Option<&str> {
        if let Some(label) = self.label.as_deref().filter(|label| !label.is_empty()) {
            return Some(label);
        }
        match self.code.as_deref() {
            Some("bad") => Some(RISKY_LABEL),
            Some("good") => Some(SAFE_LABEL),
            _ => None,
        }
    }
}

/// Historical application returned by `/sample-data`.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRecord {
    pub fields: BTreeMap<String, Option<FieldValue>>,
    pub ground_truth: Option<GroundTruth>,
}

impl SampleRecord {
    /// Split a flat sample object into submittable fields and the label subset.
    pub fn from_map(map: Map<String, Value>) -> Self {
        let mut fields = BTreeMap::new();
        let mut label = None;
        let mut code = None;

        for (key, value) in map {
            match key.as_str() {
                "actual_risk_label" => label = value.as_str().map(str::to_string),
                "actual_risk" => code = value.as_str().map(str::to_string),
                _ => {
                    fields.insert(key, FieldValue::from_json(&value));
                }
            }
        }

        let ground_truth = if label.is_some() || code.is_some() {
            Some(GroundTruth { label, code })
        } else {
            None
        };

        Self {
            fields,
            ground_truth,
        }
    }
}

/// Coarse risk band reported by the scoring service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

/// Authoritative business outcome returned by the scoring service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Approve,
    Review,
    Reject,
}

impl Decision {
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Approve => "APPROVE",
            Decision::Review => "REVIEW",
            Decision::Reject => "REJECT",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub risk_score: u8,
    pub risk_probability: f64,
    pub risk_level: RiskLevel,
    pub decision: Decision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl PredictionResponse {
    pub(crate) fn contract_violation(&self) -> Option<String> {
        if self.risk_score > 100 {
            return Some(format!("risk_score {} exceeds 100", self.risk_score));
        }
        if !(0.0..=1.0).contains(&self.risk_probability) {
            return Some(format!(
                "risk_probability {} outside [0, 1]",
                self.risk_probability
            ));
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPerformanceResponse {
    pub metrics: ModelMetrics,
    /// Row = actual, column = predicted, order [negative, positive].
    pub confusion_matrix: Vec<Vec<u64>>,
    pub dataset_info: String,
}

/// Reply of the scoring service's `/health` probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendHealth {
    pub status: String,
    #[serde(default)]
    pub model_trained: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> FeatureSchema {
        serde_json::from_value(json!({
            "numeric_features": ["duration", "age"],
            "categorical_features": {
                "housing": { "type": "categorical", "values": ["own", "rent"] }
            },
            "all_features": ["duration", "age", "housing", "actual_risk"]
        }))
        .expect("schema parses")
    }

    #[test]
    fn field_names_skip_duplicates_and_labels() {
        assert_eq!(schema().field_names(), vec!["duration", "age", "housing"]);
        assert!(!schema().contains("actual_risk"));
    }

    #[test]
    fn untyped_names_are_only_reported() {
        let mut schema = schema();
        schema.all_features.push("telephone_hint".to_string());
        assert!(!schema.contains("telephone_hint"));
        assert!(!schema.field_names().iter().any(|name| name == "telephone_hint"));
        assert_eq!(schema.undeclared_features(), vec!["actual_risk", "telephone_hint"]);
    }

    #[test]
    fn sample_split_moves_labels_out_of_fields() {
        let map = json!({
            "age": 41,
            "housing": "rent",
            "actual_risk": "bad",
            "actual_risk_label": "Riskli"
        });
        let Value::Object(map) = map else {
            unreachable!()
        };

        let record = SampleRecord::from_map(map);

        assert_eq!(record.fields.len(), 2);
        assert!(record.fields.keys().all(|key| !is_label_field(key)));
        let truth = record.ground_truth.expect("label tracked");
        assert_eq!(truth.resolved_label(), Some(RISKY_LABEL));
    }

    #[test]
    fn label_derived_from_code_when_missing() {
        let truth = GroundTruth {
            label: None,
            code: Some("good".to_string()),
        };
        assert_eq!(truth.resolved_label(), Some(SAFE_LABEL));
    }

    #[test]
    fn numeric_parse_prefers_integers() {
        let schema = schema();
        assert_eq!(
            FieldValue::parse_for(&schema, "age", " 40 ").expect("parses"),
            FieldValue::int(40)
        );
        assert_eq!(
            FieldValue::parse_for(&schema, "housing", "own").expect("text"),
            FieldValue::text("own")
        );
        assert!(FieldValue::parse_for(&schema, "age", "forty").is_err());
    }

    #[test]
    fn decision_uses_uppercase_wire_names() {
        let response: PredictionResponse = serde_json::from_value(json!({
            "risk_score": 62,
            "risk_probability": 0.62,
            "risk_level": "High",
            "decision": "REJECT"
        }))
        .expect("prediction parses");
        assert_eq!(response.decision, Decision::Reject);
        assert!(response.contract_violation().is_none());
    }
}
