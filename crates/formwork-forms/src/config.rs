//! Field configuration.
//!
//! A [`FieldConfig`] is everything a field is constructed from. It can be
//! built fluently or deserialized from a JSON descriptor (camelCase keys);
//! callbacks and collaborators are only settable from code.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use formwork_core::{FormResult, TextResolver};
use formwork_signals::SignalReceiver;

use crate::field::{ChangeEvent, FieldCore, FocusEvent};
use crate::render::Renderer;
use crate::validator::RuleFn;
use crate::value::{FieldOption, Value};

/// A field-level validator run after every declared rule.
pub type CustomValidation = Arc<dyn Fn(&Value, &FieldCore) -> Result<(), String> + Send + Sync>;

/// Construction options shared by every field kind.
///
/// # Examples
///
/// ```
/// use formwork_forms::config::FieldConfig;
///
/// let config = FieldConfig::new("username")
///     .label("Username")
///     .required(true)
///     .min_length(3);
/// assert_eq!(config.id.as_deref(), Some("username"));
/// ```
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldConfig {
    /// The field id. Construction fails without one.
    pub id: Option<String>,
    /// The declared initial value.
    pub value: Option<Value>,
    /// Human-readable label.
    pub label: Option<String>,
    /// Whether an empty value fails validation.
    pub required: bool,
    /// Whether the field starts disabled.
    pub disabled: bool,
    /// Whether the field is read-only.
    pub read_only: bool,
    /// Placeholder text for empty controls.
    pub placeholder: Option<String>,
    /// Help text under the control.
    pub description: Option<String>,
    /// Small print under the description.
    pub footnote: Option<String>,
    /// Hover text.
    pub tooltip: Option<String>,
    /// Leading icon name.
    pub icon: Option<String>,
    /// Trailing icon name.
    pub icon_right: Option<String>,
    /// Overrides the wrapper template.
    pub template: Option<String>,
    /// Overrides the control template.
    pub input_template: Option<String>,
    /// Minimum length (characters, or items for list values).
    pub min_length: Option<usize>,
    /// Maximum length (characters, or items for list values).
    pub max_length: Option<usize>,
    /// Inclusive `[min, max]` length range.
    pub size: Option<(usize, usize)>,
    /// Regular expression the value must match.
    pub pattern: Option<String>,
    /// Lower bound for numbers and dates.
    pub min: Option<Value>,
    /// Upper bound for numbers and dates.
    pub max: Option<Value>,
    /// Allowed file extensions, without the dot.
    pub accept: Vec<String>,
    /// Minimum file size in megabytes.
    pub min_size: Option<f64>,
    /// Maximum file size in megabytes.
    pub max_size: Option<f64>,
    /// Static options for option-bearing kinds.
    pub options: Vec<FieldOption>,
    /// Extra named rules appended to the field kind's rule list.
    pub validations: Vec<String>,
    /// Rules given as functions, run after the named ones.
    #[serde(skip)]
    pub rule_fns: Vec<RuleFn>,
    /// Custom validator.
    #[serde(skip)]
    pub validation: Option<CustomValidation>,
    /// Receiver connected to the field's `change` signal.
    #[serde(skip)]
    pub on_change: Option<SignalReceiver<ChangeEvent>>,
    /// Receiver connected to the field's `focus` signal.
    #[serde(skip)]
    pub on_focus: Option<SignalReceiver<FocusEvent>>,
    /// Text resolver for messages; defaults to the English catalog.
    #[serde(skip)]
    pub texts: Option<Arc<dyn TextResolver>>,
    /// Markup renderer; defaults to the placeholder renderer.
    #[serde(skip)]
    pub renderer: Option<Arc<dyn Renderer>>,
}

impl fmt::Debug for FieldConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldConfig")
            .field("id", &self.id)
            .field("value", &self.value)
            .field("label", &self.label)
            .field("required", &self.required)
            .field("disabled", &self.disabled)
            .field("read_only", &self.read_only)
            .field("options", &self.options)
            .field("validations", &self.validations)
            .field("rule_fns", &self.rule_fns.len())
            .field("validation", &self.validation.is_some())
            .finish_non_exhaustive()
    }
}

impl FieldConfig {
    /// Creates a configuration with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Parses a JSON descriptor.
    pub fn from_json(descriptor: Value) -> FormResult<Self> {
        Ok(serde_json::from_value(descriptor)?)
    }

    /// Sets the declared initial value.
    #[must_use]
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Sets the label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets whether this field is required.
    #[must_use]
    pub const fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets whether this field starts disabled.
    #[must_use]
    pub const fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Sets whether this field is read-only.
    #[must_use]
    pub const fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Sets the placeholder.
    #[must_use]
    pub fn placeholder(mut self, text: impl Into<String>) -> Self {
        self.placeholder = Some(text.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Sets the footnote.
    #[must_use]
    pub fn footnote(mut self, text: impl Into<String>) -> Self {
        self.footnote = Some(text.into());
        self
    }

    /// Sets the tooltip.
    #[must_use]
    pub fn tooltip(mut self, text: impl Into<String>) -> Self {
        self.tooltip = Some(text.into());
        self
    }

    /// Sets the leading icon.
    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Sets the trailing icon.
    #[must_use]
    pub fn icon_right(mut self, icon: impl Into<String>) -> Self {
        self.icon_right = Some(icon.into());
        self
    }

    /// Overrides the wrapper template.
    #[must_use]
    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Overrides the control template.
    #[must_use]
    pub fn input_template(mut self, template: impl Into<String>) -> Self {
        self.input_template = Some(template.into());
        self
    }

    /// Sets the minimum length.
    #[must_use]
    pub const fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    /// Sets the maximum length.
    #[must_use]
    pub const fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    /// Sets an inclusive length range.
    #[must_use]
    pub const fn size(mut self, min: usize, max: usize) -> Self {
        self.size = Some((min, max));
        self
    }

    /// Sets the pattern the value must match.
    #[must_use]
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Sets the lower bound.
    #[must_use]
    pub fn min(mut self, min: impl Into<Value>) -> Self {
        self.min = Some(min.into());
        self
    }

    /// Sets the upper bound.
    #[must_use]
    pub fn max(mut self, max: impl Into<Value>) -> Self {
        self.max = Some(max.into());
        self
    }

    /// Sets the allowed file extensions.
    #[must_use]
    pub fn accept<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.accept = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the minimum file size in megabytes.
    #[must_use]
    pub const fn min_size(mut self, megabytes: f64) -> Self {
        self.min_size = Some(megabytes);
        self
    }

    /// Sets the maximum file size in megabytes.
    #[must_use]
    pub const fn max_size(mut self, megabytes: f64) -> Self {
        self.max_size = Some(megabytes);
        self
    }

    /// Sets the static options.
    #[must_use]
    pub fn options(mut self, options: Vec<FieldOption>) -> Self {
        self.options = options;
        self
    }

    /// Appends a named rule.
    #[must_use]
    pub fn rule(mut self, name: impl Into<String>) -> Self {
        self.validations.push(name.into());
        self
    }

    /// Appends a rule given as a function.
    #[must_use]
    pub fn rule_fn<F>(mut self, rule: F) -> Self
    where
        F: Fn(&Value, &FieldCore) -> Result<(), String> + Send + Sync + 'static,
    {
        self.rule_fns.push(Arc::new(rule));
        self
    }

    /// Sets the custom validator.
    #[must_use]
    pub fn validation<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Value, &FieldCore) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validation = Some(Arc::new(validator));
        self
    }

    /// Sets the change receiver.
    #[must_use]
    pub fn on_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.on_change = Some(Arc::new(callback));
        self
    }

    /// Sets the focus receiver.
    #[must_use]
    pub fn on_focus<F>(mut self, callback: F) -> Self
    where
        F: Fn(&FocusEvent) + Send + Sync + 'static,
    {
        self.on_focus = Some(Arc::new(callback));
        self
    }

    /// Sets the text resolver.
    #[must_use]
    pub fn texts(mut self, texts: Arc<dyn TextResolver>) -> Self {
        self.texts = Some(texts);
        self
    }

    /// Sets the renderer.
    #[must_use]
    pub fn renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder() {
        let config = FieldConfig::new("age")
            .required(true)
            .min(0)
            .max(150)
            .rule("number")
            .description("Years");
        assert!(config.required);
        assert_eq!(config.min, Some(json!(0)));
        assert_eq!(config.validations, vec!["number".to_string()]);
        assert_eq!(config.description.as_deref(), Some("Years"));
    }

    #[test]
    fn test_from_json_camel_case() {
        let config = FieldConfig::from_json(json!({
            "id": "bio",
            "readOnly": true,
            "maxLength": 200,
            "iconRight": "pen",
            "size": [2, 10],
            "accept": ["png", "jpg"],
            "options": [{"value": "a", "label": "A"}]
        }))
        .unwrap();
        assert_eq!(config.id.as_deref(), Some("bio"));
        assert!(config.read_only);
        assert_eq!(config.max_length, Some(200));
        assert_eq!(config.icon_right.as_deref(), Some("pen"));
        assert_eq!(config.size, Some((2, 10)));
        assert_eq!(config.accept, vec!["png", "jpg"]);
        assert_eq!(config.options, vec![FieldOption::new("a", "A")]);
    }

    #[test]
    fn test_from_json_without_id_parses() {
        let config = FieldConfig::from_json(json!({"label": "Nameless"})).unwrap();
        assert!(config.id.is_none());
    }

    #[test]
    fn test_from_json_wrong_type() {
        assert!(FieldConfig::from_json(json!({"required": "yes"})).is_err());
    }

    #[test]
    fn test_debug_hides_callbacks() {
        let config = FieldConfig::new("x").validation(|_, _| Ok(()));
        let dbg = format!("{config:?}");
        assert!(dbg.contains("validation: true"));
    }
}
