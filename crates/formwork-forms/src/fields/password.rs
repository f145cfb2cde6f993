use tracing::trace;

use formwork_core::FormResult;

use crate::config::FieldConfig;
use crate::field::{with_rules, Field, FieldCore, BASE_RULES};
use crate::validator::{RuleOverride, ValidationRule};
use crate::value::{to_text, Value};

/// A masked text field.
#[derive(Debug)]
pub struct PasswordField {
    core: FieldCore,
}

impl PasswordField {
    /// Creates a password field.
    pub fn new(config: FieldConfig) -> FormResult<Self> {
        Ok(Self {
            core: FieldCore::new("password", config, Value::Null)?,
        })
    }
}

impl Field for PasswordField {
    fn core(&self) -> &FieldCore {
        &self.core
    }

    fn render_input(&self) -> String {
        // never echo the secret back into markup
        self.core.render_input("password", &Value::Null)
    }
}

/// Repeats a [`PasswordField`] and must match it. It never appears in the
/// form's values.
#[derive(Debug)]
pub struct PasswordConfirmField {
    core: FieldCore,
    target: String,
}

impl PasswordConfirmField {
    /// Creates a confirmation for the password field with id `target`.
    pub fn new(config: FieldConfig, target: impl Into<String>) -> FormResult<Self> {
        Ok(Self {
            core: FieldCore::new("password", config, Value::Null)?,
            target: target.into(),
        })
    }

    /// The id of the field being confirmed.
    pub fn target(&self) -> &str {
        &self.target
    }

    fn check_match(&self, value: &Value) -> Result<(), String> {
        let Some(target) = self.core.form().and_then(|form| form.field(&self.target)) else {
            trace!(field = %self.id(), target = %self.target, "Confirmation target not found");
            return Ok(());
        };
        if to_text(&target.value()) == to_text(value) {
            Ok(())
        } else {
            Err(self.core.text("errors.passwordMatch", &[]))
        }
    }
}

impl Field for PasswordConfirmField {
    fn core(&self) -> &FieldCore {
        &self.core
    }

    fn output_value(&self) -> Option<Value> {
        None
    }

    fn validations(&self) -> Vec<ValidationRule> {
        let mut rules = BASE_RULES.to_vec();
        rules.push("passwordMatch");
        with_rules(&self.core, &rules)
    }

    fn rule_override(&self, name: &str) -> Option<RuleOverride<'_>> {
        match name {
            "passwordMatch" => Some(Box::new(move |value: &Value| self.check_match(value))),
            _ => None,
        }
    }

    fn render_input(&self) -> String {
        self.core.render_input("password", &Value::Null)
    }
}
