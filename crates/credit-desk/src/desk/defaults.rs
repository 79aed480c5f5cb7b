use super::domain::{FeatureSchema, FieldValue};
use super::form::FormState;

/// Seed values for the fields of the reference credit dataset.
const NUMERIC_DEFAULTS: [(&str, i64); 7] = [
    ("duration", 24),
    ("credit_amount", 5000),
    ("age", 35),
    ("installment_commitment", 3),
    ("residence_since", 2),
    ("existing_credits", 1),
    ("num_dependents", 1),
];

pub(crate) const NO_ALLOWED_VALUES: &str = "no selectable values were provided for this field";

/// Derives the initial value of every schema field. Deterministic and
/// infallible: a categorical field without allowed values is left unset and
/// flagged.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultValuePolicy;

impl DefaultValuePolicy {
    pub fn defaults_for(&self, schema: &FeatureSchema) -> FormState {
        let mut state = FormState::default();

        for field in schema.field_names() {
            if schema.is_numeric(&field) {
                state.values.insert(field.clone(), Some(numeric_default(&field)));
                continue;
            }

            match schema.categorical(&field) {
                Some(feature) => match feature.allowed_values.first() {
                    Some(first) => {
                        state.values.insert(field, Some(FieldValue::text(first.clone())));
                    }
                    None => {
                        state.errors.insert(field.clone(), NO_ALLOWED_VALUES.to_string());
                        state.values.insert(field, None);
                    }
                },
                None => {
                    state.values.insert(field, None);
                }
            }
        }

        state.recompute_completion();
        state
    }
}

pub fn numeric_default(field: &str) -> FieldValue {
    let value = NUMERIC_DEFAULTS
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, value)| *value)
        .unwrap_or(0);
    FieldValue::int(value)
}
