use formwork_core::FormResult;

use crate::config::FieldConfig;
use crate::field::{Field, FieldCore};
use crate::value::Value;

/// A single on/off checkbox. A required checkbox must be checked.
#[derive(Debug)]
pub struct CheckboxField {
    core: FieldCore,
}

impl CheckboxField {
    /// Creates a checkbox, unchecked unless the configuration says otherwise.
    pub fn new(config: FieldConfig) -> FormResult<Self> {
        Ok(Self {
            core: FieldCore::new("checkbox", config, Value::Bool(false))?,
        })
    }

    /// Whether the box is checked.
    pub fn checked(&self) -> bool {
        truthy(&self.core.resolve_value())
    }

    /// Checks or unchecks the box.
    pub fn set_checked(&self, checked: bool) {
        self.set_value(Value::Bool(checked), true);
    }

    /// Flips the box and schedules a change signal.
    pub fn toggle(&self) {
        self.handle_input(Value::Bool(!self.checked()));
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.as_str(), "true" | "on" | "1" | "checked"),
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::Null | Value::Array(_) | Value::Object(_) => false,
    }
}

impl Field for CheckboxField {
    fn core(&self) -> &FieldCore {
        &self.core
    }

    fn value(&self) -> Value {
        Value::Bool(self.checked())
    }

    fn render_input(&self) -> String {
        let markup = self.core.render_input("checkbox", &Value::Bool(true));
        if self.checked() {
            markup.replacen('>', " checked>", 1)
        } else {
            markup
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthy_values() {
        for v in [json!(true), json!("on"), json!("true"), json!(1)] {
            assert!(truthy(&v), "{v}");
        }
        for v in [json!(false), json!(""), json!("off"), json!(0), Value::Null] {
            assert!(!truthy(&v), "{v}");
        }
    }

    #[test]
    fn test_required_must_be_checked() {
        let field = CheckboxField::new(FieldConfig::new("terms").required(true)).unwrap();
        assert_eq!(field.output_value(), Some(json!(false)));
        assert!(!field.validate());
        field.set_checked(true);
        assert!(field.validate());
    }

    #[test]
    fn test_toggle_and_render() {
        let field = CheckboxField::new(FieldConfig::new("news").value(true)).unwrap();
        assert!(field.checked());
        field.toggle();
        assert!(!field.checked());
        field.toggle();
        field.render();
        assert!(field.core().element().content().contains(" checked>"));
    }
}
