//! The validation pipeline.
//!
//! A [`FieldValidator`] is bound to one field for one call. It walks the
//! field's declared rules in order, resolves each one and collects a message
//! for every failure. Rules never short-circuit, so a value that breaks
//! three rules reports three messages.
//!
//! Resolution order for a rule:
//! 1. a callable supplied directly in the rule list,
//! 2. an override the field kind provides for that rule name,
//! 3. a built-in rule from this module,
//! 4. nothing: unknown names are a no-op.

use std::sync::Arc;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{trace, warn};

use crate::field::{Field, FieldCore};
use crate::value::{is_empty, length, to_text, Value};

/// A rule supplied as a function instead of a name.
pub type RuleFn = Arc<dyn Fn(&Value, &FieldCore) -> Result<(), String> + Send + Sync>;

/// The signature of a built-in rule.
pub type BuiltinRule = fn(&FieldCore, &Value) -> Result<(), String>;

/// A rule a field kind supplies in place of (or in addition to) a built-in.
pub type RuleOverride<'a> = Box<dyn Fn(&Value) -> Result<(), String> + Send + Sync + 'a>;

/// One entry of a field's rule list.
#[derive(Clone)]
pub enum ValidationRule {
    /// Resolved by name through the field and the built-in table.
    Named(String),
    /// Called directly.
    Callable(RuleFn),
}

impl std::fmt::Debug for ValidationRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Callable(_) => f.write_str("Callable(..)"),
        }
    }
}

impl From<&str> for ValidationRule {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for ValidationRule {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl ValidationRule {
    /// The rule name, if it has one.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            Self::Callable(_) => None,
        }
    }
}

/// How a rule was resolved.
pub enum RuleMethod<'a> {
    /// A callable from the rule list.
    Callable(RuleFn),
    /// An override supplied by the field kind.
    Override(RuleOverride<'a>),
    /// A built-in rule.
    BuiltIn(BuiltinRule),
}

impl RuleMethod<'_> {
    fn call(&self, core: &FieldCore, value: &Value) -> Result<(), String> {
        match self {
            Self::Callable(rule) => rule(value, core),
            Self::Override(rule) => rule(value),
            Self::BuiltIn(rule) => rule(core, value),
        }
    }
}

/// Runs a field's rules against a value.
pub struct FieldValidator<'f, F: Field + ?Sized> {
    field: &'f F,
    errors: Vec<String>,
}

impl<'f, F: Field + ?Sized> FieldValidator<'f, F> {
    /// Binds a validator to `field`.
    pub const fn new(field: &'f F) -> Self {
        Self {
            field,
            errors: Vec::new(),
        }
    }

    /// Validates `value`. Errors from the previous call are discarded.
    pub fn validate(&mut self, value: &Value) -> bool {
        self.errors.clear();
        let rules = self.field.validations();
        let mut valid = self.run_validation_methods(&rules, value);

        let core = self.field.core();
        if let Some(custom) = &core.config().validation {
            if let Err(message) = custom(value, core) {
                self.errors.push(message);
                valid = false;
            }
        }
        valid
    }

    /// Runs every rule in `rules`, appending a message for each failure.
    pub fn run_validation_methods(&mut self, rules: &[ValidationRule], value: &Value) -> bool {
        let mut valid = true;
        for rule in rules {
            let Some(method) = self.method(rule) else {
                trace!(field = %self.field.id(), rule = ?rule.name(), "No rule registered under this name");
                continue;
            };
            if let Err(message) = method.call(self.field.core(), value) {
                self.errors.push(message);
                valid = false;
            }
        }
        valid
    }

    /// Resolves a rule: callable, then field override, then built-in.
    pub fn method(&self, rule: &ValidationRule) -> Option<RuleMethod<'f>> {
        match rule {
            ValidationRule::Callable(rule) => Some(RuleMethod::Callable(Arc::clone(rule))),
            ValidationRule::Named(name) => self
                .field
                .rule_override(name)
                .map(RuleMethod::Override)
                .or_else(|| builtin(name).map(RuleMethod::BuiltIn)),
        }
    }

    /// Messages from the last call.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Consumes the validator, returning its messages.
    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }
}

/// Looks up a built-in rule by name.
pub fn builtin(name: &str) -> Option<BuiltinRule> {
    let rule: BuiltinRule = match name {
        "required" => required,
        "minLength" => min_length,
        "maxLength" => max_length,
        "size" => size,
        "regex" => pattern,
        "number" => number,
        "color" => color,
        "url" => url,
        "email" => email,
        "date" => date,
        "extension" => extension,
        "minSize" => min_size,
        "maxSize" => max_size,
        _ => return None,
    };
    Some(rule)
}

static COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(#([0-9a-fA-F]{3}|[0-9a-fA-F]{4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})|rgba?\(\s*\d{1,3}\s*,\s*\d{1,3}\s*,\s*\d{1,3}\s*(,\s*(0|1|0?\.\d+)\s*)?\))$",
    )
    .expect("color pattern is valid")
});

static URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(https?|ftp)://[^\s/$.?#][^\s]*$").expect("url pattern is valid")
});

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

fn required(core: &FieldCore, value: &Value) -> Result<(), String> {
    if core.is_required() && is_empty(value) {
        return Err(core.text("errors.required", &[]));
    }
    Ok(())
}

/// The quantity length rules compare: item count for lists, the number
/// itself for numbers, character count otherwise.
#[allow(clippy::cast_precision_loss)]
fn measure(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or_default(),
        Value::Bool(_) => to_text(value).chars().count() as f64,
        other => length(other).unwrap_or_default() as f64,
    }
}

#[allow(clippy::cast_precision_loss)]
fn min_length(core: &FieldCore, value: &Value) -> Result<(), String> {
    let Some(min) = core.config().min_length else {
        return Ok(());
    };
    if measure(value) < min as f64 {
        let key = if value.is_array() {
            "errors.minItems"
        } else {
            "errors.minLength"
        };
        return Err(core.text(key, &[("min", min.to_string())]));
    }
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn max_length(core: &FieldCore, value: &Value) -> Result<(), String> {
    let Some(max) = core.config().max_length else {
        return Ok(());
    };
    if measure(value) > max as f64 {
        let key = if value.is_array() {
            "errors.maxItems"
        } else {
            "errors.maxLength"
        };
        return Err(core.text(key, &[("max", max.to_string())]));
    }
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn size(core: &FieldCore, value: &Value) -> Result<(), String> {
    let Some((min, max)) = core.config().size else {
        return Ok(());
    };
    let (lo, hi) = (min as f64, max as f64);
    let len = measure(value);
    if len < lo || len > hi {
        return Err(core.text(
            "errors.size",
            &[("min", min.to_string()), ("max", max.to_string())],
        ));
    }
    Ok(())
}

fn pattern(core: &FieldCore, value: &Value) -> Result<(), String> {
    let Some(source) = core.config().pattern.as_deref() else {
        return Ok(());
    };
    if is_empty(value) {
        return Ok(());
    }
    match Regex::new(source) {
        Ok(re) if re.is_match(&to_text(value)) => Ok(()),
        Ok(_) => Err(core.text("errors.regex", &[])),
        Err(err) => {
            warn!(field = %core.id(), pattern = source, error = %err, "Invalid pattern");
            Err(core.text("errors.regex", &[]))
        }
    }
}

/// Reads a number from a JSON number or a numeric string.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

fn number(core: &FieldCore, value: &Value) -> Result<(), String> {
    if is_empty(value) {
        return Ok(());
    }
    let Some(n) = as_number(value) else {
        return Err(core.text("errors.number", &[]));
    };
    let config = core.config();
    if let Some(min) = &config.min {
        if as_number(min).is_some_and(|min| n < min) {
            return Err(core.text("errors.numberMin", &[("min", to_text(min))]));
        }
    }
    if let Some(max) = &config.max {
        if as_number(max).is_some_and(|max| n > max) {
            return Err(core.text("errors.numberMax", &[("max", to_text(max))]));
        }
    }
    Ok(())
}

fn color(core: &FieldCore, value: &Value) -> Result<(), String> {
    if is_empty(value) || COLOR.is_match(to_text(value).trim()) {
        return Ok(());
    }
    Err(core.text("errors.color", &[]))
}

fn url(core: &FieldCore, value: &Value) -> Result<(), String> {
    if is_empty(value) || URL.is_match(&to_text(value)) {
        return Ok(());
    }
    Err(core.text("errors.url", &[]))
}

fn email(core: &FieldCore, value: &Value) -> Result<(), String> {
    if is_empty(value) || EMAIL.is_match(&to_text(value)) {
        return Ok(());
    }
    Err(core.text("errors.email", &[]))
}

/// The ISO format used by date values and bounds.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Checks a date value in `format` against the configured bounds, which
/// are always ISO dates.
pub fn check_date(core: &FieldCore, value: &Value, format: &str) -> Result<(), String> {
    if is_empty(value) {
        return Ok(());
    }
    let Ok(parsed) = NaiveDate::parse_from_str(to_text(value).trim(), format) else {
        return Err(core.text("errors.date", &[]));
    };
    let bound = |v: &Option<Value>| {
        v.as_ref()
            .and_then(|b| NaiveDate::parse_from_str(&to_text(b), DATE_FORMAT).ok())
    };
    let config = core.config();
    if let Some(min) = bound(&config.min) {
        if parsed < min {
            return Err(core.text("errors.dateMin", &[("min", min.format(format).to_string())]));
        }
    }
    if let Some(max) = bound(&config.max) {
        if parsed > max {
            return Err(core.text("errors.dateMax", &[("max", max.format(format).to_string())]));
        }
    }
    Ok(())
}

fn date(core: &FieldCore, value: &Value) -> Result<(), String> {
    check_date(core, value, DATE_FORMAT)
}

/// File descriptors in a value: a single object or a list of them.
fn files(value: &Value) -> Vec<&serde_json::Map<String, Value>> {
    match value {
        Value::Object(file) => vec![file],
        Value::Array(items) => items.iter().filter_map(Value::as_object).collect(),
        _ => Vec::new(),
    }
}

fn file_name(file: &serde_json::Map<String, Value>) -> String {
    file.get("name").map(to_text).unwrap_or_default()
}

fn file_size(file: &serde_json::Map<String, Value>) -> f64 {
    file.get("size").and_then(Value::as_f64).unwrap_or_default()
}

fn extension(core: &FieldCore, value: &Value) -> Result<(), String> {
    let accept: Vec<String> = core
        .config()
        .accept
        .iter()
        .map(|ext| ext.trim_start_matches('.').to_lowercase())
        .collect();
    if accept.is_empty() {
        return Ok(());
    }
    for file in files(value) {
        let name = file_name(file);
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();
        if !accept.contains(&ext) {
            return Err(core.text(
                "errors.extension",
                &[("extension", ext), ("accept", accept.join(", "))],
            ));
        }
    }
    Ok(())
}

fn min_size(core: &FieldCore, value: &Value) -> Result<(), String> {
    let Some(megabytes) = core.config().min_size else {
        return Ok(());
    };
    let limit = megabytes * BYTES_PER_MB;
    for file in files(value) {
        if file_size(file) < limit {
            return Err(core.text(
                "errors.minSize",
                &[("name", file_name(file)), ("size", megabytes.to_string())],
            ));
        }
    }
    Ok(())
}

fn max_size(core: &FieldCore, value: &Value) -> Result<(), String> {
    let Some(megabytes) = core.config().max_size else {
        return Ok(());
    };
    let limit = megabytes * BYTES_PER_MB;
    for file in files(value) {
        if file_size(file) > limit {
            return Err(core.text(
                "errors.maxSize",
                &[("name", file_name(file)), ("size", megabytes.to_string())],
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldConfig;
    use crate::fields::TextField;
    use serde_json::json;

    fn field(config: FieldConfig) -> TextField {
        TextField::new(config).unwrap()
    }

    fn errors_for(field: &TextField, value: Value) -> Vec<String> {
        let mut validator = FieldValidator::new(field);
        validator.validate(&value);
        validator.into_errors()
    }

    #[test]
    fn test_required_skipped_when_optional() {
        let f = field(FieldConfig::new("name"));
        assert!(errors_for(&f, json!("")).is_empty());
    }

    #[test]
    fn test_required_message() {
        let f = field(FieldConfig::new("name").required(true));
        assert_eq!(errors_for(&f, json!("")), vec!["This field is required."]);
    }

    #[test]
    fn test_no_short_circuit() {
        let f = field(
            FieldConfig::new("code")
                .required(true)
                .min_length(3)
                .size(3, 5)
                .validation(|_, _| Err("custom".into())),
        );
        let errors = errors_for(&f, json!(""));
        assert_eq!(errors.len(), 4);
        assert_eq!(errors[0], "This field is required.");
        assert_eq!(errors[1], "Enter at least 3 characters.");
        assert_eq!(errors[3], "custom");
    }

    #[test]
    fn test_errors_reset_between_calls() {
        let f = field(FieldConfig::new("name").required(true));
        let mut validator = FieldValidator::new(&f);
        assert!(!validator.validate(&json!("")));
        assert!(validator.validate(&json!("ok")));
        assert!(validator.errors().is_empty());
    }

    #[test]
    fn test_length_rules_on_lists_use_item_messages() {
        let f = field(FieldConfig::new("tags").min_length(2).max_length(3));
        assert_eq!(errors_for(&f, json!(["a"])), vec!["Select at least 2 items."]);
        assert_eq!(
            errors_for(&f, json!(["a", "b", "c", "d"])),
            vec!["Select no more than 3 items."]
        );
    }

    #[test]
    fn test_length_rules_on_numbers_compare_numerically() {
        let f = field(FieldConfig::new("n").max_length(10));
        assert!(errors_for(&f, json!(9)).is_empty());
        assert_eq!(errors_for(&f, json!(11)).len(), 1);
    }

    #[test]
    fn test_regex_unanchored_and_skipped_on_empty() {
        let f = field(FieldConfig::new("zip").pattern(r"\d{4}"));
        assert!(errors_for(&f, json!("")).is_empty());
        assert!(errors_for(&f, json!("NL 1234 AB")).is_empty());
        assert_eq!(
            errors_for(&f, json!("abcd")),
            vec!["The value does not match the expected format."]
        );
    }

    #[test]
    fn test_invalid_pattern_fails_closed() {
        let f = field(FieldConfig::new("x").pattern("("));
        assert_eq!(errors_for(&f, json!("a")).len(), 1);
    }

    #[test]
    fn test_unknown_rule_is_noop() {
        let f = field(FieldConfig::new("x").rule("doesNotExist"));
        assert!(errors_for(&f, json!("a")).is_empty());
    }

    #[test]
    fn test_callable_rule_receives_core() {
        let f = field(FieldConfig::new("x").rule_fn(|value, core| {
            if value == "bad" {
                Err(format!("{} is bad", core.id()))
            } else {
                Ok(())
            }
        }));
        assert_eq!(errors_for(&f, json!("bad")), vec!["x is bad"]);
        assert!(errors_for(&f, json!("good")).is_empty());
    }

    #[test]
    fn test_builtin_lookup() {
        assert!(builtin("required").is_some());
        assert!(builtin("maxSize").is_some());
        assert!(builtin("passwordMatch").is_none());
    }

    #[test]
    fn test_number_bounds() {
        let f = field(FieldConfig::new("age").rule("number").min(18).max(99));
        assert!(errors_for(&f, json!("42")).is_empty());
        assert_eq!(errors_for(&f, json!("abc")), vec!["Enter a valid number."]);
        assert_eq!(
            errors_for(&f, json!(17)),
            vec!["Enter a number greater than or equal to 18."]
        );
        assert_eq!(
            errors_for(&f, json!(100)),
            vec!["Enter a number less than or equal to 99."]
        );
    }

    #[test]
    fn test_color() {
        let f = field(FieldConfig::new("c").rule("color"));
        for ok in ["#fff", "#00ff00", "#00ff0080", "rgb(1, 2, 3)", "rgba(1,2,3,0.5)"] {
            assert!(errors_for(&f, json!(ok)).is_empty(), "{ok}");
        }
        assert_eq!(errors_for(&f, json!("blue")), vec!["Enter a valid color."]);
    }

    #[test]
    fn test_url_and_email() {
        let f = field(FieldConfig::new("u").rule("url").rule("email"));
        let errors = errors_for(&f, json!("nope"));
        assert_eq!(errors, vec!["Enter a valid URL.", "Enter a valid email address."]);
        let f = field(FieldConfig::new("u").rule("url"));
        assert!(errors_for(&f, json!("https://example.com/a?b=c")).is_empty());
        let f = field(FieldConfig::new("e").rule("email"));
        assert!(errors_for(&f, json!("someone@example.org")).is_empty());
    }

    #[test]
    fn test_date_bounds() {
        let f = field(
            FieldConfig::new("d")
                .rule("date")
                .min("2024-01-01")
                .max("2024-12-31"),
        );
        assert!(errors_for(&f, json!("2024-06-15")).is_empty());
        assert_eq!(errors_for(&f, json!("15/06/2024")), vec!["Enter a valid date."]);
        assert_eq!(
            errors_for(&f, json!("2023-12-31")),
            vec!["Enter a date on or after 2024-01-01."]
        );
    }

    #[test]
    fn test_file_rules() {
        let f = field(
            FieldConfig::new("upload")
                .accept([".png", "JPG"])
                .min_size(0.001)
                .max_size(1.0)
                .rule("extension")
                .rule("minSize")
                .rule("maxSize"),
        );
        let ok = json!([{"name": "a.PNG", "size": 2048, "type": "image/png"}]);
        assert!(errors_for(&f, ok).is_empty());

        let bad = json!([
            {"name": "notes.txt", "size": 10, "type": "text/plain"},
            {"name": "huge.jpg", "size": 2 * 1024 * 1024, "type": "image/jpeg"}
        ]);
        let errors = errors_for(&f, bad);
        assert_eq!(
            errors,
            vec![
                "Files of type txt are not allowed (png, jpg).",
                "notes.txt is smaller than 0.001 MB.",
                "huge.jpg is larger than 1 MB.",
            ]
        );
    }
}
