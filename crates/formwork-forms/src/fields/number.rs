use formwork_core::FormResult;

use crate::config::FieldConfig;
use crate::field::{with_rules, Field, FieldCore, BASE_RULES};
use crate::validator::ValidationRule;
use crate::value::Value;

/// A numeric field. Numeric strings read from the input become numbers;
/// anything else is kept as typed so the `number` rule can reject it.
#[derive(Debug)]
pub struct NumberField {
    core: FieldCore,
}

impl NumberField {
    /// Creates a number field.
    pub fn new(config: FieldConfig) -> FormResult<Self> {
        Ok(Self {
            core: FieldCore::new("number", config, Value::Null)?,
        })
    }
}

fn coerce(value: Value) -> Value {
    let Value::String(text) = &value else {
        return value;
    };
    let trimmed = text.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return n.into();
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map_or(value, Value::Number)
}

impl Field for NumberField {
    fn core(&self) -> &FieldCore {
        &self.core
    }

    fn value(&self) -> Value {
        coerce(self.core.resolve_value())
    }

    fn output_value(&self) -> Option<Value> {
        match self.value() {
            Value::String(s) if s.is_empty() => Some(Value::Null),
            value => Some(value),
        }
    }

    fn validations(&self) -> Vec<ValidationRule> {
        let mut rules = BASE_RULES.to_vec();
        rules.push("number");
        with_rules(&self.core, &rules)
    }
}
