//! Template rendering for field markup.
//!
//! Rendering is a collaborator: fields hand a template and a set of
//! variables to a [`Renderer`] and store whatever comes back in their
//! [`Element`](crate::element::Element). The default
//! [`PlaceholderRenderer`] substitutes `{{ name }}` placeholders
//! deterministically, escaping text variables and passing safe markup
//! through untouched.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// Wraps a field: label, control, description and errors.
pub const FIELD_TEMPLATE: &str = r#"<label for="{{ id }}">{{ label }}</label>{{ input }}<small>{{ description }}</small><ul class="field__errors">{{ errors }}</ul>"#;

/// A single-value control.
pub const INPUT_TEMPLATE: &str = r#"<input id="{{ id }}" name="{{ id }}" type="{{ type }}" value="{{ value }}" placeholder="{{ placeholder }}"{{ state }}>"#;

/// One entry of an option list.
pub const OPTION_TEMPLATE: &str =
    r#"<option value="{{ value }}"{{ selected }}>{{ label }}</option>"#;

/// Shown while options load.
pub const PRELOADER_TEMPLATE: &str = r#"<div class="preloader">{{ text }}</div>"#;

/// Shown when an option list is empty.
pub const EMPTY_OPTIONS_TEMPLATE: &str = r#"<div class="options--empty">{{ text }}</div>"#;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_.-]+)\s*\}\}").expect("placeholder pattern is valid")
});

/// Variables passed to a template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateVars {
    vars: BTreeMap<String, (String, bool)>,
}

impl TemplateVars {
    /// Creates an empty variable set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a text variable; it is HTML-escaped on substitution.
    #[must_use]
    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.vars.insert(name.to_string(), (value.into(), false));
        self
    }

    /// Adds pre-rendered markup; it is substituted verbatim.
    #[must_use]
    pub fn safe(mut self, name: &str, markup: impl Into<String>) -> Self {
        self.vars.insert(name.to_string(), (markup.into(), true));
        self
    }

    /// Returns the substituted form of a variable, if present.
    pub fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).map(|(value, safe)| {
            if *safe {
                value.clone()
            } else {
                escape_html(value)
            }
        })
    }
}

/// Produces markup from a template and variables.
pub trait Renderer: Send + Sync {
    /// Renders `template` with `vars`. Must be deterministic.
    fn render(&self, template: &str, vars: &TemplateVars) -> String;
}

/// Replaces `{{ name }}` placeholders; unknown names render as nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderRenderer;

impl Renderer for PlaceholderRenderer {
    fn render(&self, template: &str, vars: &TemplateVars) -> String {
        PLACEHOLDER
            .replace_all(template, |caps: &regex::Captures<'_>| {
                vars.get(&caps[1]).unwrap_or_default()
            })
            .into_owned()
    }
}

/// Escapes HTML special characters in a string.
///
/// Replaces `&`, `<`, `>`, `"`, and `'` with their HTML entity equivalents.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitutes_and_escapes() {
        let vars = TemplateVars::new()
            .text("label", "Name <required>")
            .safe("input", "<input>");
        let out = PlaceholderRenderer.render("<b>{{label}}</b>{{ input }}", &vars);
        assert_eq!(out, "<b>Name &lt;required&gt;</b><input>");
    }

    #[test]
    fn test_unknown_placeholder_is_empty() {
        let out = PlaceholderRenderer.render("[{{ missing }}]", &TemplateVars::new());
        assert_eq!(out, "[]");
    }

    #[test]
    fn test_render_is_deterministic() {
        let vars = TemplateVars::new()
            .text("value", "a")
            .text("label", "A")
            .safe("selected", "");
        let first = PlaceholderRenderer.render(OPTION_TEMPLATE, &vars);
        let second = PlaceholderRenderer.render(OPTION_TEMPLATE, &vars);
        assert_eq!(first, second);
        assert_eq!(first, r#"<option value="a">A</option>"#);
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;/a&gt;");
    }
}
