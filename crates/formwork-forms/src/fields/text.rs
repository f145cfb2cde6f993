use formwork_core::FormResult;

use crate::config::FieldConfig;
use crate::field::{with_rules, Field, FieldCore, BASE_RULES};
use crate::render::TemplateVars;
use crate::validator::ValidationRule;
use crate::value::{to_text, Value};

const TEXTAREA_TEMPLATE: &str =
    r#"<textarea id="{{ id }}" name="{{ id }}" placeholder="{{ placeholder }}">{{ value }}</textarea>"#;

/// The flavours of single-line (and multi-line) text input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextKind {
    /// Free text.
    #[default]
    Text,
    /// An email address; adds the `email` rule.
    Email,
    /// A URL; adds the `url` rule.
    Url,
    /// A hex or `rgb()` color; adds the `color` rule.
    Color,
    /// A search box.
    Search,
    /// Multi-line free text.
    Textarea,
}

impl TextKind {
    /// The kind name, also used as the input type.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Email => "email",
            Self::Url => "url",
            Self::Color => "color",
            Self::Search => "search",
            Self::Textarea => "textarea",
        }
    }

    const fn rule(self) -> Option<&'static str> {
        match self {
            Self::Email => Some("email"),
            Self::Url => Some("url"),
            Self::Color => Some("color"),
            Self::Text | Self::Search | Self::Textarea => None,
        }
    }
}

/// A string-valued field.
#[derive(Debug)]
pub struct TextField {
    core: FieldCore,
    kind: TextKind,
}

/// A text field validating colors.
pub type ColorField = TextField;

impl TextField {
    /// Creates a plain text field.
    pub fn new(config: FieldConfig) -> FormResult<Self> {
        Self::with_kind(config, TextKind::Text)
    }

    /// Creates a text field of the given kind.
    pub fn with_kind(config: FieldConfig, kind: TextKind) -> FormResult<Self> {
        Ok(Self {
            core: FieldCore::new(kind.name(), config, Value::Null)?,
            kind,
        })
    }

    /// Creates an email field.
    pub fn email(config: FieldConfig) -> FormResult<Self> {
        Self::with_kind(config, TextKind::Email)
    }

    /// Creates a URL field.
    pub fn url(config: FieldConfig) -> FormResult<Self> {
        Self::with_kind(config, TextKind::Url)
    }

    /// Creates a color field.
    pub fn color(config: FieldConfig) -> FormResult<Self> {
        Self::with_kind(config, TextKind::Color)
    }

    /// Creates a search field.
    pub fn search(config: FieldConfig) -> FormResult<Self> {
        Self::with_kind(config, TextKind::Search)
    }

    /// Creates a multi-line text field.
    pub fn textarea(config: FieldConfig) -> FormResult<Self> {
        Self::with_kind(config, TextKind::Textarea)
    }

    /// The field's text kind.
    pub const fn text_kind(&self) -> TextKind {
        self.kind
    }
}

impl Field for TextField {
    fn core(&self) -> &FieldCore {
        &self.core
    }

    fn validations(&self) -> Vec<ValidationRule> {
        let mut rules = BASE_RULES.to_vec();
        rules.extend(self.kind.rule());
        with_rules(&self.core, &rules)
    }

    fn render_input(&self) -> String {
        if self.kind != TextKind::Textarea {
            return self.core.render_input(self.kind.name(), &self.value());
        }
        let vars = TemplateVars::new()
            .text("id", self.id())
            .text("placeholder", self.core.config().placeholder.clone().unwrap_or_default())
            .text("value", to_text(&self.value()));
        self.core.render_template(TEXTAREA_TEMPLATE, &vars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_adds_rule() {
        let field = TextField::email(FieldConfig::new("mail")).unwrap();
        let names: Vec<_> = field
            .validations()
            .iter()
            .filter_map(|r| r.name().map(str::to_string))
            .collect();
        assert_eq!(names.last().map(String::as_str), Some("email"));

        field.set_value(json!("not-an-email"), false);
        assert!(!field.validate());
        assert_eq!(field.error_messages(), vec!["Enter a valid email address."]);
    }

    #[test]
    fn test_color_field() {
        let field: ColorField = TextField::color(FieldConfig::new("c").value("#abcdef")).unwrap();
        assert!(field.validate());
        assert_eq!(field.core().kind(), "color");
    }

    #[test]
    fn test_render_input_type() {
        let field = TextField::url(FieldConfig::new("site")).unwrap();
        field.render();
        assert!(field.core().element().content().contains(r#"type="url""#));
    }

    #[test]
    fn test_textarea_markup() {
        let field = TextField::textarea(FieldConfig::new("bio").value("a < b")).unwrap();
        field.render();
        let content = field.core().element().content().to_string();
        assert!(content.contains(r#"<textarea id="bio" name="bio" placeholder="">a &lt; b</textarea>"#));
    }
}
