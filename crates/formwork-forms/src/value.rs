//! Field values and option descriptors.
//!
//! Values are [`serde_json::Value`]s so every field shape (scalar, list of
//! selections, list of file descriptors, boolean map) shares one type.
//! [`Values`] is the insertion-ordered map a form produces on submission.

use serde::{Deserialize, Serialize};

pub use serde_json::Value;

/// The flat `field id -> output value` map collected from a form.
pub type Values = serde_json::Map<String, Value>;

/// Returns `true` for values a `required` rule treats as missing:
/// null, `false`, the empty string and empty arrays or objects.
///
/// Zero is a value, not an absence.
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(true) | Value::Number(_) => false,
    }
}

/// Returns the length used by length rules: character count for strings,
/// element count for arrays and objects. Numbers and booleans have none.
pub fn length(value: &Value) -> Option<usize> {
    match value {
        Value::Null => Some(0),
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        Value::Object(map) => Some(map.len()),
        Value::Bool(_) | Value::Number(_) => None,
    }
}

/// Renders a value the way it appears in an attribute: strings verbatim,
/// null as the empty string, anything else as JSON.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A selectable option.
///
/// Options are keyed by [`FieldOption::key`], the textual form of `value`.
/// Unknown keys in a JSON option descriptor are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldOption {
    /// The value submitted when this option is selected.
    pub value: Value,
    /// Display text.
    #[serde(default)]
    pub label: String,
    /// Optional icon name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Optional secondary line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_title: Option<String>,
    /// Any other descriptor properties.
    #[serde(flatten)]
    pub extra: Values,
}

impl FieldOption {
    /// Creates an option with a value and label.
    pub fn new(value: impl Into<Value>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            icon: None,
            sub_title: None,
            extra: Values::new(),
        }
    }

    /// Sets the icon.
    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Sets the secondary line.
    #[must_use]
    pub fn sub_title(mut self, sub_title: impl Into<String>) -> Self {
        self.sub_title = Some(sub_title.into());
        self
    }

    /// The index key for this option.
    pub fn key(&self) -> String {
        to_text(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_empty() {
        assert!(is_empty(&Value::Null));
        assert!(is_empty(&json!("")));
        assert!(is_empty(&json!([])));
        assert!(is_empty(&json!({})));
        assert!(is_empty(&json!(false)));
        assert!(!is_empty(&json!(0)));
        assert!(!is_empty(&json!(" ")));
        assert!(!is_empty(&json!(["a"])));
    }

    #[test]
    fn test_length_counts_chars() {
        assert_eq!(length(&json!("héllo")), Some(5));
        assert_eq!(length(&json!([1, 2])), Some(2));
        assert_eq!(length(&json!(12)), None);
    }

    #[test]
    fn test_to_text() {
        assert_eq!(to_text(&json!("abc")), "abc");
        assert_eq!(to_text(&Value::Null), "");
        assert_eq!(to_text(&json!(1)), "1");
        assert_eq!(to_text(&json!(true)), "true");
    }

    #[test]
    fn test_option_deserialize_with_extra() {
        let opt: FieldOption = serde_json::from_value(json!({
            "value": "nl",
            "label": "Netherlands",
            "subTitle": "Europe",
            "flag": "🇳🇱"
        }))
        .unwrap();
        assert_eq!(opt.sub_title.as_deref(), Some("Europe"));
        assert_eq!(opt.extra.get("flag"), Some(&json!("🇳🇱")));
        assert_eq!(opt.key(), "nl");
    }
}
