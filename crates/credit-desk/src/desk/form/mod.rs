//! Schema-driven form state: values, field errors, completion and focus.

pub mod catalog;
pub mod rules;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::defaults::{DefaultValuePolicy, NO_ALLOWED_VALUES};
use super::domain::{FeatureSchema, FieldValue, GroundTruth, SampleRecord};
use super::error::{DeskError, ValidationFailure};
pub use catalog::{describe, FieldDescriptor, FormGroup};
pub use rules::{range_rule, FieldRule, ValidatorRegistry};

/// Field values keyed by schema name, their validation errors, and the
/// completion percentage derived from them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormState {
    pub(crate) values: BTreeMap<String, Option<FieldValue>>,
    pub(crate) errors: BTreeMap<String, String>,
    completion: u8,
    #[serde(skip)]
    pub(crate) ground_truth: Option<GroundTruth>,
}

impl FormState {
    pub fn value(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field).and_then(Option::as_ref)
    }

    pub fn values(&self) -> &BTreeMap<String, Option<FieldValue>> {
        &self.values
    }

    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    pub fn completion(&self) -> u8 {
        self.completion
    }

    /// Ground truth of the loaded sample, tracked beside the fields.
    pub fn ground_truth(&self) -> Option<&GroundTruth> {
        self.ground_truth.as_ref()
    }

    pub fn is_filled(&self, field: &str) -> bool {
        self.value(field).map(|value| !value.is_blank()).unwrap_or(false)
    }

    pub fn filled_count(&self) -> usize {
        self.values.keys().filter(|field| self.is_filled(field)).count()
    }

    pub fn missing_fields(&self) -> Vec<String> {
        self.values
            .keys()
            .filter(|field| !self.is_filled(field))
            .cloned()
            .collect()
    }

    /// Empty fields and filled fields holding an error; both block submission.
    pub fn blocking_fields(&self) -> ValidationFailure {
        ValidationFailure {
            missing: self.missing_fields(),
            invalid: self
                .errors
                .keys()
                .filter(|field| self.is_filled(field))
                .cloned()
                .collect(),
        }
    }

    pub(crate) fn recompute_completion(&mut self) {
        let total = self.values.len();
        self.completion = if total == 0 {
            0
        } else {
            (100.0 * self.filled_count() as f64 / total as f64).round() as u8
        };
    }
}

/// Owns the form for one schema. Every mutation goes through here so errors
/// and completion never drift from the values.
#[derive(Debug, Clone)]
pub struct FormStateEngine {
    schema: Arc<FeatureSchema>,
    state: FormState,
    validators: ValidatorRegistry,
    policy: DefaultValuePolicy,
    focused: Option<String>,
}

impl FormStateEngine {
    pub fn new(schema: Arc<FeatureSchema>) -> Self {
        Self::with_validators(schema, ValidatorRegistry::standard())
    }

    pub fn with_validators(schema: Arc<FeatureSchema>, validators: ValidatorRegistry) -> Self {
        let mut engine = Self {
            state: FormState::default(),
            schema,
            validators,
            policy: DefaultValuePolicy,
            focused: None,
        };
        engine.reseed();
        engine
    }

    pub fn schema(&self) -> &Arc<FeatureSchema> {
        &self.schema
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn completion_percentage(&self) -> u8 {
        self.state.completion
    }

    pub fn ground_truth(&self) -> Option<&GroundTruth> {
        self.state.ground_truth.as_ref()
    }

    /// Update one field, re-validate it and recompute completion. `None`
    /// clears the value.
    pub fn set(&mut self, field: &str, value: Option<FieldValue>) -> Result<(), DeskError> {
        if !self.schema.contains(field) {
            return Err(DeskError::UnknownField(field.to_string()));
        }
        self.state.values.insert(field.to_string(), value);
        self.validate_field(field);
        self.state.recompute_completion();
        Ok(())
    }

    /// Re-seed from `schema`, dropping every error, the tracked label and focus.
    pub fn reset(&mut self, schema: Arc<FeatureSchema>) {
        self.schema = schema;
        self.focused = None;
        self.reseed();
    }

    /// Replace all field values with the sample's and track its label apart.
    /// Sample keys outside the schema are ignored; schema fields the sample
    /// lacks become unset.
    pub fn apply_sample(&mut self, sample: SampleRecord) {
        let SampleRecord {
            mut fields,
            ground_truth,
        } = sample;

        let mut values = BTreeMap::new();
        for field in self.schema.field_names() {
            let value = fields.remove(&field).flatten();
            values.insert(field, value);
        }
        if !fields.is_empty() {
            debug!(ignored = ?fields.keys().collect::<Vec<_>>(), "sample fields outside schema");
        }

        self.state.values = values;
        self.state.ground_truth = ground_truth;
        self.revalidate_all();
        self.state.recompute_completion();
    }

    /// Track the field the user is pointing at; unknown names clear focus.
    pub fn focus(&mut self, field: Option<&str>) {
        self.focused = field
            .filter(|name| self.schema.contains(name))
            .map(str::to_string);
    }

    pub fn focused(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    /// Tooltip text for the focused field, when the catalog has one.
    pub fn tooltip(&self) -> Option<&'static str> {
        self.focused
            .as_deref()
            .and_then(|field| catalog::describe(field).description)
    }

    pub fn descriptors(&self) -> Vec<FieldDescriptor> {
        self.schema
            .field_names()
            .iter()
            .map(|field| catalog::describe(field))
            .collect()
    }

    fn reseed(&mut self) {
        self.state = self.policy.defaults_for(&self.schema);
    }

    fn revalidate_all(&mut self) {
        self.state.errors.clear();
        let fields: Vec<String> = self.state.values.keys().cloned().collect();
        for field in fields {
            self.validate_field(&field);
        }
    }

    fn validate_field(&mut self, field: &str) {
        let message = match self.state.values.get(field) {
            Some(Some(value)) if !value.is_blank() => self.validators.check(field, value),
            _ => self
                .schema
                .categorical(field)
                .filter(|feature| feature.allowed_values.is_empty())
                .map(|_| NO_ALLOWED_VALUES.to_string()),
        };

        match message {
            Some(message) => {
                self.state.errors.insert(field.to_string(), message);
            }
            None => {
                self.state.errors.remove(field);
            }
        }
    }
}
