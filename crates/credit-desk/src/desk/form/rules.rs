use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::desk::domain::FieldValue;

/// Check for a single field. `Err` carries the message shown next to it.
pub type FieldRule = Arc<dyn Fn(&FieldValue) -> Result<(), String> + Send + Sync>;

/// Per-field validation keyed by schema name. Fields without an entry are
/// never flagged.
#[derive(Clone, Default)]
pub struct ValidatorRegistry {
    rules: HashMap<String, FieldRule>,
}

impl ValidatorRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Inclusive bounds the desk enforces before anything is sent.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register_range("age", 18.0, 100.0);
        registry.register_range("credit_amount", 0.0, 20_000.0);
        registry.register_range("duration", 1.0, 120.0);
        registry
    }

    pub fn register(&mut self, field: impl Into<String>, rule: FieldRule) -> &mut Self {
        self.rules.insert(field.into(), rule);
        self
    }

    pub fn register_range(&mut self, field: &str, min: f64, max: f64) -> &mut Self {
        self.register(field, range_rule(field, min, max))
    }

    pub fn has_rule(&self, field: &str) -> bool {
        self.rules.contains_key(field)
    }

    pub fn check(&self, field: &str, value: &FieldValue) -> Option<String> {
        self.rules.get(field).and_then(|rule| rule(value).err())
    }
}

impl fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields: Vec<&String> = self.rules.keys().collect();
        fields.sort();
        f.debug_struct("ValidatorRegistry")
            .field("fields", &fields)
            .finish()
    }
}

pub fn range_rule(field: &str, min: f64, max: f64) -> FieldRule {
    let field = field.to_string();
    Arc::new(move |value: &FieldValue| match value.as_f64() {
        Some(number) if (min..=max).contains(&number) => Ok(()),
        Some(_) => Err(format!("{field} out of range ({min}-{max})")),
        None => Err(format!("{field} must be a number")),
    })
}
