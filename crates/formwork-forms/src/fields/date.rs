use chrono::NaiveDate;

use formwork_core::FormResult;

use crate::config::FieldConfig;
use crate::field::{with_rules, Field, FieldCore, BASE_RULES};
use crate::validator::{check_date, RuleOverride, ValidationRule, DATE_FORMAT};
use crate::value::{to_text, Value};

/// A date field.
///
/// Values are strings in the field's display format (ISO by default).
/// `min` and `max` bounds are always ISO dates.
#[derive(Debug)]
pub struct DateField {
    core: FieldCore,
    format: String,
}

impl DateField {
    /// Creates a date field using ISO `YYYY-MM-DD`.
    pub fn new(config: FieldConfig) -> FormResult<Self> {
        Self::with_format(config, DATE_FORMAT)
    }

    /// Creates a date field with a custom `chrono` format string.
    pub fn with_format(config: FieldConfig, format: impl Into<String>) -> FormResult<Self> {
        Ok(Self {
            core: FieldCore::new("date", config, Value::Null)?,
            format: format.into(),
        })
    }

    /// The display format.
    pub fn format(&self) -> &str {
        &self.format
    }

    /// The current value as a date, if it parses.
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(to_text(&self.value()).trim(), &self.format).ok()
    }

    /// Sets the value from a date.
    pub fn set_date(&self, date: NaiveDate) {
        self.set_value(Value::String(date.format(&self.format).to_string()), true);
    }
}

impl Field for DateField {
    fn core(&self) -> &FieldCore {
        &self.core
    }

    fn validations(&self) -> Vec<ValidationRule> {
        let mut rules = BASE_RULES.to_vec();
        rules.push("date");
        with_rules(&self.core, &rules)
    }

    fn rule_override(&self, name: &str) -> Option<RuleOverride<'_>> {
        match name {
            "date" => Some(Box::new(move |value: &Value| check_date(&self.core, value, &self.format))),
            _ => None,
        }
    }
}
