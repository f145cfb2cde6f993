use formwork_core::FormResult;

use crate::capabilities::{normalize_array, HasMultiValue, HasOptions, OptionSet};
use crate::config::FieldConfig;
use crate::field::{Field, FieldCore};
use crate::value::{Value, Values};

/// A group of checkboxes over an option list.
///
/// The value is the list of checked option values. In binary mode the
/// output is instead a map from every option value to whether it is
/// checked.
#[derive(Debug)]
pub struct CheckboxesField {
    core: FieldCore,
    options: OptionSet,
    binary: bool,
}

impl CheckboxesField {
    /// Creates a checkbox group with the configured options.
    pub fn new(config: FieldConfig) -> FormResult<Self> {
        let options = OptionSet::new(config.options.clone());
        let core = FieldCore::new("checkboxes", config, Value::Array(Vec::new()))?;
        let field = Self {
            core,
            options,
            binary: false,
        };
        let initial = normalize_array(&field.core.stored_value());
        field.core.store_value(Value::Array(initial), false);
        Ok(field)
    }

    /// Switches binary output on or off.
    #[must_use]
    pub const fn binary(mut self, binary: bool) -> Self {
        self.binary = binary;
        self
    }

    /// Whether binary output is on.
    pub const fn is_binary(&self) -> bool {
        self.binary
    }
}

impl Field for CheckboxesField {
    fn core(&self) -> &FieldCore {
        &self.core
    }

    fn value(&self) -> Value {
        Value::Array(self.selected())
    }

    fn set_value(&self, value: Value, update: bool) {
        self.core.store_value(Value::Array(normalize_array(&value)), update);
        if self.core.has_rendered() {
            self.render();
        }
    }

    fn output_value(&self) -> Option<Value> {
        if !self.binary {
            return Some(self.value());
        }
        let selected = self.selected();
        let map: Values = self
            .options
            .values()
            .into_iter()
            .map(|v| {
                let on = selected.contains(&v);
                (crate::value::to_text(&v), Value::Bool(on))
            })
            .collect();
        Some(Value::Object(map))
    }

    fn render(&self) {
        if !self.core.has_rendered() {
            self.prune_selected();
        }
        let input = self.render_input();
        self.core.render_with(&input, &self.value());
    }

    fn render_input(&self) -> String {
        format!(
            r#"<div class="checkboxes" id="{}">{}</div>"#,
            crate::render::escape_html(self.id()),
            self.options_markup()
        )
    }
}

impl HasOptions for CheckboxesField {
    fn option_set(&self) -> &OptionSet {
        &self.options
    }

    fn options_replaced(&self) {
        self.prune_selected();
    }
}

impl HasMultiValue for CheckboxesField {
    fn available_values(&self) -> Vec<Value> {
        self.options.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::FieldOption;
    use serde_json::json;

    fn xyz() -> Vec<FieldOption> {
        ["x", "y", "z"]
            .into_iter()
            .map(|v| FieldOption::new(v, v.to_uppercase()))
            .collect()
    }

    #[test]
    fn test_binary_output() {
        let field = CheckboxesField::new(FieldConfig::new("flags").options(xyz()).value(json!(["x"])))
            .unwrap()
            .binary(true);
        assert_eq!(
            field.output_value(),
            Some(json!({"x": true, "y": false, "z": false}))
        );
        let keys: Vec<_> = field
            .output_value()
            .unwrap()
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        assert_eq!(keys, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_list_output() {
        let field = CheckboxesField::new(FieldConfig::new("flags").options(xyz())).unwrap();
        field.add_value(json!("z"));
        field.add_value(json!("x"));
        assert_eq!(field.output_value(), Some(json!(["z", "x"])));
    }

    #[test]
    fn test_scalar_initial_value_normalized() {
        let field = CheckboxesField::new(FieldConfig::new("f").value("y")).unwrap();
        assert_eq!(field.value(), json!(["y"]));
    }

    #[test]
    fn test_min_items() {
        let field = CheckboxesField::new(FieldConfig::new("f").options(xyz()).min_length(2)).unwrap();
        field.add_value(json!("x"));
        assert!(!field.validate());
        assert_eq!(field.error_messages(), vec!["Select at least 2 items."]);
        field.add_value(json!("y"));
        assert!(field.validate());
    }

    #[test]
    fn test_required_with_nothing_checked() {
        let field = CheckboxesField::new(FieldConfig::new("f").options(xyz()).required(true)).unwrap();
        assert!(!field.validate());
    }
}
