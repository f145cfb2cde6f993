//! The field contract.
//!
//! Every field kind embeds a [`FieldCore`] holding the shared state (value,
//! errors, element, signals, back-reference to the owning form) and
//! implements [`Field`], whose provided methods give the uniform lifecycle:
//! value resolution, validation, rendering, change signalling. Kinds
//! override only what differs: the value shape, the output value, the rule
//! list and per-rule overrides.

use std::sync::{Arc, RwLock, RwLockReadGuard, Weak};

use tracing::{debug, trace};

use formwork_core::i18n::default_texts;
use formwork_core::{FormError, FormResult, TextResolver};
use formwork_signals::Signal;

use crate::config::FieldConfig;
use crate::element::{classes, Element, InputElement};
use crate::form::Form;
use crate::render::{escape_html, PlaceholderRenderer, Renderer, TemplateVars};
use crate::render::{FIELD_TEMPLATE, INPUT_TEMPLATE};
use crate::validator::{FieldValidator, RuleOverride, ValidationRule};
use crate::value::{to_text, Value};

/// Sent on the `change` signal.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    /// The id of the field that changed.
    pub field_id: String,
    /// The field's value when the signal fired.
    pub value: Value,
    /// The name of the triggering event, if any.
    pub event: Option<String>,
}

/// Sent on the `error` signal when validation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEvent {
    /// The id of the failing field.
    pub field_id: String,
    /// The current messages.
    pub messages: Vec<String>,
}

/// Sent on the `focus` signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusEvent {
    /// The id of the focused field.
    pub field_id: String,
}

/// The signals every field exposes.
#[derive(Debug, Default)]
pub struct FieldSignals {
    /// Fired on the frame after the value changes.
    pub change: Signal<ChangeEvent>,
    /// Fired when validation fails.
    pub error: Signal<ErrorEvent>,
    /// Fired when the field takes focus.
    pub focus: Signal<FocusEvent>,
}

#[derive(Debug)]
struct FieldState {
    value: Value,
    errors: Vec<String>,
    is_valid: Option<bool>,
    disabled: bool,
    element: Element,
    has_rendered: bool,
}

/// State shared by every field kind.
pub struct FieldCore {
    id: String,
    kind: &'static str,
    config: FieldConfig,
    texts: Arc<dyn TextResolver>,
    renderer: Arc<dyn Renderer>,
    state: RwLock<FieldState>,
    form: RwLock<Weak<Form>>,
    this: RwLock<Option<Weak<dyn Field>>>,
    signals: FieldSignals,
}

impl std::fmt::Debug for FieldCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldCore")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("state", &self.state)
            .field("signals", &self.signals)
            .finish_non_exhaustive()
    }
}

impl FieldCore {
    /// Builds the shared state for a field of `kind`.
    ///
    /// `empty` is the value the field starts with when the configuration
    /// declares none.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::MissingId`] if the configuration has no id or an
    /// empty one.
    pub fn new(kind: &'static str, config: FieldConfig, empty: Value) -> FormResult<Self> {
        let id = match config.id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => return Err(FormError::MissingId),
        };

        let mut element = Element::new(format!("field-{kind}"));
        element.set_attribute("id", id.clone());
        element.toggle_class(classes::FIELD_DISABLED, config.disabled);
        if config.disabled {
            element.set_attribute("disabled", "");
        }
        if config.read_only {
            element.set_attribute("readonly", "");
        }
        if config.required {
            element.set_attribute("required", "");
        }

        let signals = FieldSignals::default();
        if let Some(callback) = &config.on_change {
            signals.change.connect("on_change", Arc::clone(callback));
        }
        if let Some(callback) = &config.on_focus {
            signals.focus.connect("on_focus", Arc::clone(callback));
        }

        let texts = config.texts.clone().unwrap_or_else(default_texts);
        let renderer = config
            .renderer
            .clone()
            .unwrap_or_else(|| Arc::new(PlaceholderRenderer));

        debug!(field = %id, kind, "Created field");
        Ok(Self {
            state: RwLock::new(FieldState {
                value: config.value.clone().unwrap_or(empty),
                errors: Vec::new(),
                is_valid: None,
                disabled: config.disabled,
                element,
                has_rendered: false,
            }),
            id,
            kind,
            texts,
            renderer,
            config,
            form: RwLock::new(Weak::new()),
            this: RwLock::new(None),
            signals,
        })
    }

    fn state(&self) -> RwLockReadGuard<'_, FieldState> {
        self.state.read().expect("field state lock poisoned")
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut FieldState) -> R) -> R {
        let mut state = self.state.write().expect("field state lock poisoned");
        f(&mut state)
    }

    /// The field id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The field kind, e.g. `"text"` or `"checkboxes"`.
    pub const fn kind(&self) -> &'static str {
        self.kind
    }

    /// The configuration the field was built from.
    pub const fn config(&self) -> &FieldConfig {
        &self.config
    }

    /// The field's signals.
    pub const fn signals(&self) -> &FieldSignals {
        &self.signals
    }

    /// Resolves a message through the field's text resolver.
    pub fn text(&self, key: &str, replacements: &[(&str, String)]) -> String {
        self.texts.text(key, replacements)
    }

    /// Renders a template through the field's renderer.
    pub fn render_template(&self, template: &str, vars: &TemplateVars) -> String {
        self.renderer.render(template, vars)
    }

    /// A snapshot of the field's element.
    pub fn element(&self) -> Element {
        self.state().element.clone()
    }

    /// Mutates the field's element.
    pub fn with_element<R>(&self, f: impl FnOnce(&mut Element) -> R) -> R {
        self.with_state(|state| f(&mut state.element))
    }

    /// The owning form, if registered and still alive.
    pub fn form(&self) -> Option<Arc<Form>> {
        self.form.read().expect("form reference lock poisoned").upgrade()
    }

    pub(crate) fn bind(&self, form: &Arc<Form>, this: Weak<dyn Field>) {
        *self.form.write().expect("form reference lock poisoned") = Arc::downgrade(form);
        *self.this.write().expect("self reference lock poisoned") = Some(this);
    }

    pub(crate) fn set_attached(&self, attached: bool) {
        self.with_element(|el| el.set_attached(attached));
    }

    /// Whether the field has completed its first render.
    pub fn has_rendered(&self) -> bool {
        self.state().has_rendered
    }

    /// Resolves the scalar value: the input's live value, then the input's
    /// `value` attribute, then the element's `value` attribute, then the
    /// stored value, then the empty string.
    pub fn resolve_value(&self) -> Value {
        let state = self.state();
        if let Some(input) = state.element.input() {
            if let Some(value) = &input.value {
                return value.clone();
            }
            if let Some(attr) = input.attribute("value") {
                return Value::String(attr.to_string());
            }
        }
        if let Some(attr) = state.element.attribute("value") {
            return Value::String(attr.to_string());
        }
        if state.value.is_null() {
            Value::String(String::new())
        } else {
            state.value.clone()
        }
    }

    /// The stored value, bypassing the element.
    pub fn stored_value(&self) -> Value {
        self.state().value.clone()
    }

    /// Stores `value`, propagates it to the bound input and, when `update`
    /// is set and the element is attached, reflects it into the element's
    /// `value` attribute.
    pub fn store_value(&self, value: Value, update: bool) {
        self.with_state(|state| {
            if let Some(input) = state.element.input_mut() {
                input.value = Some(value.clone());
                input.set_attribute("value", to_text(&value));
            }
            if update && state.element.is_attached() {
                state.element.set_attribute("value", to_text(&value));
            }
            state.value = value;
        });
    }

    /// Records a validation outcome. With `update`, the error class and
    /// display follow `valid`, `is_valid` is cached and failures are
    /// signalled.
    pub fn apply_validation(&self, valid: bool, errors: Vec<String>, update: bool) {
        let messages = errors.clone();
        self.with_state(|state| {
            state.errors = errors;
            if update {
                state.is_valid = Some(valid);
                state.element.toggle_class(classes::FIELD_ERROR, !valid);
                state.element.set_error_display(state.errors.clone());
            }
        });
        if update && !valid {
            self.signals.error.send(&ErrorEvent {
                field_id: self.id.clone(),
                messages,
            });
        }
    }

    /// Marks the field invalid with a single message.
    pub fn set_error(&self, message: impl Into<String>) {
        self.apply_validation(false, vec![message.into()], true);
    }

    /// Clears errors and the error state.
    pub fn clear_errors(&self) {
        self.with_state(|state| {
            state.errors.clear();
            state.is_valid = None;
            state.element.toggle_class(classes::FIELD_ERROR, false);
            state.element.set_error_display(Vec::new());
        });
    }

    /// Current error messages.
    pub fn error_messages(&self) -> Vec<String> {
        self.state().errors.clone()
    }

    /// The cached result of the last updating validation.
    pub fn is_valid(&self) -> Option<bool> {
        self.state().is_valid
    }

    /// Whether the field is configured as required.
    pub const fn is_required(&self) -> bool {
        self.config.required
    }

    /// Whether the field is currently disabled.
    pub fn is_disabled(&self) -> bool {
        self.state().disabled
    }

    /// Disables or enables the field, reflecting it on the element and input.
    pub fn set_disabled(&self, disabled: bool) {
        self.with_state(|state| {
            state.disabled = disabled;
            state.element.toggle_class(classes::FIELD_DISABLED, disabled);
            if disabled {
                state.element.set_attribute("disabled", "");
            } else {
                state.element.remove_attribute("disabled");
            }
            if let Some(input) = state.element.input_mut() {
                input.disabled = disabled;
            }
        });
    }

    /// Focuses the input and fires the `focus` signal.
    pub fn focus(&self) {
        self.with_state(|state| {
            if let Some(input) = state.element.input_mut() {
                input.focused = true;
            }
        });
        self.signals.focus.send(&FocusEvent {
            field_id: self.id.clone(),
        });
    }

    /// Disconnects every signal receiver and detaches the element.
    pub fn detach(&self) {
        self.signals.change.disconnect_all();
        self.signals.error.disconnect_all();
        self.signals.focus.disconnect_all();
        self.set_attached(false);
        debug!(field = %self.id, "Detached field");
    }

    /// Schedules a `change` signal for the next frame.
    ///
    /// Several calls before the frame runs produce one signal carrying the
    /// value at that time. Nothing is sent if the form has been detached
    /// by then, or if the field is not registered with a form.
    pub fn call_on_change(&self, event: Option<String>) {
        let Some(form) = self.form() else {
            trace!(field = %self.id, "Change on unregistered field ignored");
            return;
        };
        let Some(this) = self.this.read().expect("self reference lock poisoned").clone() else {
            return;
        };
        let form_ref = Arc::downgrade(&form);
        let field_id = self.id.clone();
        form.scheduler()
            .schedule(format!("change:{field_id}"), move || {
                let (Some(field), Some(form)) = (this.upgrade(), form_ref.upgrade()) else {
                    return;
                };
                if !form.is_attached() {
                    trace!(field = %field_id, "Form detached; change dropped");
                    return;
                }
                let value = field.value();
                field.core().signals.change.send(&ChangeEvent {
                    field_id,
                    value,
                    event,
                });
            });
    }

    /// Renders the standard control markup for an input of `input_type`.
    pub fn render_input(&self, input_type: &str, value: &Value) -> String {
        let mut flags = String::new();
        if self.is_disabled() {
            flags.push_str(" disabled");
        }
        if self.config.read_only {
            flags.push_str(" readonly");
        }
        if self.config.required {
            flags.push_str(" required");
        }
        let template = self.config.input_template.as_deref().unwrap_or(INPUT_TEMPLATE);
        let vars = TemplateVars::new()
            .text("id", self.id.clone())
            .text("type", input_type)
            .text("value", to_text(value))
            .text("placeholder", self.config.placeholder.clone().unwrap_or_default())
            .safe("state", flags);
        self.render_template(template, &vars)
    }

    /// Wraps `input` in the field template and stores the result. The first
    /// call binds an input element holding `value`.
    pub fn render_with(&self, input: &str, value: &Value) {
        let errors: String = self
            .error_messages()
            .iter()
            .map(|m| format!("<li>{}</li>", escape_html(m)))
            .collect();
        let template = self.config.template.as_deref().unwrap_or(FIELD_TEMPLATE);
        let vars = TemplateVars::new()
            .text("id", self.id.clone())
            .text("label", self.config.label.clone().unwrap_or_default())
            .text("description", self.config.description.clone().unwrap_or_default())
            .text("footnote", self.config.footnote.clone().unwrap_or_default())
            .text("tooltip", self.config.tooltip.clone().unwrap_or_default())
            .text("icon", self.config.icon.clone().unwrap_or_default())
            .text("icon_right", self.config.icon_right.clone().unwrap_or_default())
            .safe("input", input)
            .safe("errors", errors);
        let markup = self.render_template(template, &vars);

        self.with_state(|state| {
            state.element.set_content(markup);
            if state.element.input().is_none() {
                let mut bound = InputElement::new(value.clone());
                bound.disabled = state.disabled;
                state.element.bind_input(bound);
            }
            state.has_rendered = true;
        });
        trace!(field = %self.id, "Rendered field");
    }
}

/// The uniform field contract.
///
/// Implementors provide [`Field::core`]; everything else has a default
/// that kinds override as needed.
pub trait Field: Send + Sync {
    /// The shared field state.
    fn core(&self) -> &FieldCore;

    /// The field id.
    fn id(&self) -> &str {
        self.core().id()
    }

    /// The current raw value.
    fn value(&self) -> Value {
        self.core().resolve_value()
    }

    /// Sets the value. See [`FieldCore::store_value`].
    fn set_value(&self, value: Value, update: bool) {
        self.core().store_value(value, update);
    }

    /// The value this field contributes to the form. `None` leaves the
    /// field out of the form's values entirely.
    fn output_value(&self) -> Option<Value> {
        Some(self.value())
    }

    /// The rule list: the base rules, then configured names, then
    /// configured functions.
    fn validations(&self) -> Vec<ValidationRule> {
        base_validations(self.core())
    }

    /// A kind-specific implementation of the named rule.
    fn rule_override(&self, _name: &str) -> Option<RuleOverride<'_>> {
        None
    }

    /// Validates the current value, updating the error state.
    fn validate(&self) -> bool {
        self.validate_with(&self.value(), true)
    }

    /// Validates `value`. With `update`, the result is cached and reflected
    /// on the element.
    fn validate_with(&self, value: &Value, update: bool) -> bool {
        let mut validator = FieldValidator::new(self);
        let valid = validator.validate(value);
        self.core().apply_validation(valid, validator.into_errors(), update);
        valid
    }

    /// Whether this field only groups other fields.
    fn is_container(&self) -> bool {
        false
    }

    /// Markup for the control itself.
    fn render_input(&self) -> String {
        let core = self.core();
        core.render_input(core.kind(), &self.value())
    }

    /// Renders the field into its element.
    fn render(&self) {
        let input = self.render_input();
        self.core().render_with(&input, &self.value());
    }

    /// Applies a value typed by the user and schedules a change signal.
    /// A field currently in error is revalidated.
    fn handle_input(&self, value: Value) {
        self.set_value(value, true);
        if self.core().is_valid() == Some(false) {
            self.validate();
        }
        self.core().call_on_change(Some("input".to_string()));
    }

    /// Focuses the field.
    fn focus(&self) {
        self.core().focus();
    }

    /// Marks the field invalid with `message`.
    fn set_error(&self, message: &str) {
        self.core().set_error(message);
    }

    /// Current error messages.
    fn error_messages(&self) -> Vec<String> {
        self.core().error_messages()
    }

    /// Whether the field is required.
    fn is_required(&self) -> bool {
        self.core().is_required()
    }

    /// Whether the field is disabled.
    fn is_disabled(&self) -> bool {
        self.core().is_disabled()
    }

    /// Disables the field.
    fn disable(&self) {
        self.core().set_disabled(true);
    }

    /// Enables the field.
    fn enable(&self) {
        self.core().set_disabled(false);
    }
}

/// The rules every field starts from.
pub const BASE_RULES: &[&str] = &["required", "minLength", "maxLength", "size", "regex"];

/// The base rules followed by the configured names and functions.
pub fn base_validations(core: &FieldCore) -> Vec<ValidationRule> {
    with_rules(core, BASE_RULES)
}

/// `kind_rules` followed by the configured names and functions.
pub fn with_rules(core: &FieldCore, kind_rules: &[&str]) -> Vec<ValidationRule> {
    let config = core.config();
    kind_rules
        .iter()
        .map(|name| ValidationRule::from(*name))
        .chain(config.validations.iter().cloned().map(ValidationRule::Named))
        .chain(config.rule_fns.iter().cloned().map(ValidationRule::Callable))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::TextField;
    use serde_json::json;
    use std::sync::Mutex;

    #[test]
    fn test_missing_id_fails() {
        assert!(matches!(
            TextField::new(FieldConfig::default()),
            Err(FormError::MissingId)
        ));
        assert!(matches!(
            TextField::new(FieldConfig::new("")),
            Err(FormError::MissingId)
        ));
    }

    #[test]
    fn test_id_verbatim() {
        let field = TextField::new(FieldConfig::new("First Name!")).unwrap();
        assert_eq!(field.id(), "First Name!");
        assert_eq!(field.core().element().attribute("id"), Some("First Name!"));
    }

    #[test]
    fn test_value_resolution_order() {
        let field = TextField::new(FieldConfig::new("x")).unwrap();
        assert_eq!(field.value(), json!(""));

        field.set_value(json!("stored"), false);
        assert_eq!(field.value(), json!("stored"));

        field.core().with_element(|el| el.set_attribute("value", "attr"));
        assert_eq!(field.value(), json!("attr"));

        field.core().with_element(|el| {
            let mut input = InputElement::default();
            input.set_attribute("value", "input-attr");
            el.bind_input(input);
        });
        assert_eq!(field.value(), json!("input-attr"));

        field.core().with_element(|el| el.input_mut().unwrap().value = Some(json!("live")));
        assert_eq!(field.value(), json!("live"));
    }

    #[test]
    fn test_set_value_reflects_only_when_attached() {
        let field = TextField::new(FieldConfig::new("x")).unwrap();
        field.set_value(json!("a"), true);
        assert_eq!(field.core().element().attribute("value"), None);

        field.core().set_attached(true);
        field.set_value(json!("b"), true);
        assert_eq!(field.core().element().attribute("value"), Some("b"));

        field.set_value(json!("c"), false);
        assert_eq!(field.core().element().attribute("value"), Some("b"));
        assert_eq!(field.core().stored_value(), json!("c"));
    }

    #[test]
    fn test_validate_toggles_error_state_and_signals() {
        let field = TextField::new(FieldConfig::new("name").required(true)).unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        field.core().signals().error.connect(
            "test",
            Arc::new(move |e: &ErrorEvent| s.lock().unwrap().push(e.messages.clone())),
        );

        assert!(!field.validate());
        let el = field.core().element();
        assert!(el.has_class(classes::FIELD_ERROR));
        assert_eq!(el.error_display(), ["This field is required."]);
        assert_eq!(field.core().is_valid(), Some(false));
        assert_eq!(seen.lock().unwrap().len(), 1);

        field.set_value(json!("Ada"), false);
        assert!(field.validate());
        assert!(!field.core().element().has_class(classes::FIELD_ERROR));
        assert!(field.error_messages().is_empty());
    }

    #[test]
    fn test_validate_without_update_leaves_ui() {
        let field = TextField::new(FieldConfig::new("name").required(true)).unwrap();
        assert!(!field.validate_with(&json!(""), false));
        assert_eq!(field.core().is_valid(), None);
        assert!(!field.core().element().has_class(classes::FIELD_ERROR));
        assert_eq!(field.error_messages().len(), 1);
    }

    #[test]
    fn test_validations_concatenate() {
        let field = TextField::new(FieldConfig::new("x").rule("color").rule_fn(|_, _| Ok(()))).unwrap();
        let rules = field.validations();
        let names: Vec<_> = rules.iter().map(ValidationRule::name).collect();
        assert_eq!(
            names,
            vec![
                Some("required"),
                Some("minLength"),
                Some("maxLength"),
                Some("size"),
                Some("regex"),
                Some("color"),
                None
            ]
        );
    }

    #[test]
    fn test_disable_enable() {
        let field = TextField::new(FieldConfig::new("x").disabled(true)).unwrap();
        assert!(field.is_disabled());
        field.render();
        assert!(field.core().element().input().unwrap().disabled);

        field.enable();
        let el = field.core().element();
        assert!(!field.is_disabled());
        assert!(!el.has_class(classes::FIELD_DISABLED));
        assert_eq!(el.attribute("disabled"), None);
        assert!(!el.input().unwrap().disabled);
    }

    #[test]
    fn test_set_error_and_focus() {
        let field = TextField::new(FieldConfig::new("x")).unwrap();
        let focused = Arc::new(Mutex::new(None));
        let f = focused.clone();
        field.core().signals().focus.connect(
            "test",
            Arc::new(move |e: &FocusEvent| *f.lock().unwrap() = Some(e.field_id.clone())),
        );
        field.set_error("Taken");
        assert_eq!(field.error_messages(), vec!["Taken"]);
        field.render();
        field.focus();
        assert!(field.core().element().input().unwrap().focused);
        assert_eq!(focused.lock().unwrap().as_deref(), Some("x"));
    }

    #[test]
    fn test_render_escapes_label() {
        let field = TextField::new(
            FieldConfig::new("x")
                .label("<b>Name</b>")
                .value("v")
                .placeholder("Type"),
        )
        .unwrap();
        assert!(!field.core().has_rendered());
        field.render();
        let el = field.core().element();
        assert!(el.content().contains("&lt;b&gt;Name&lt;/b&gt;"));
        assert!(el.content().contains(r#"value="v""#));
        assert!(el.content().contains(r#"placeholder="Type""#));
        assert!(field.core().has_rendered());
    }

    #[test]
    fn test_detach_disconnects_receivers() {
        let field = TextField::new(FieldConfig::new("x").on_change(|_| {})).unwrap();
        assert_eq!(field.core().signals().change.receiver_count(), 1);
        field.core().detach();
        assert_eq!(field.core().signals().change.receiver_count(), 0);
    }
}
