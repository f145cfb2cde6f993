use formwork_core::FormResult;

use crate::capabilities::{normalize_array, HasAsyncFetch, HasMultiValue, HasOptions, OptionSet};
use crate::config::FieldConfig;
use crate::field::{Field, FieldCore};
use crate::render::{escape_html, TemplateVars};
use crate::value::{to_text, Value};

const TAG_TEMPLATE: &str = r#"<span class="tag" data-value="{{ value }}">{{ label }}</span>"#;

/// A list of tags picked from (fetched) suggestions or, when allowed,
/// typed freely.
#[derive(Debug)]
pub struct TagField {
    core: FieldCore,
    options: OptionSet,
    allow_custom: bool,
}

impl TagField {
    /// Creates a tag field with the configured suggestions.
    pub fn new(config: FieldConfig) -> FormResult<Self> {
        Self::with_option_set(config, OptionSet::default())
    }

    /// Creates a tag field around an existing option set.
    pub fn with_option_set(config: FieldConfig, options: OptionSet) -> FormResult<Self> {
        if !config.options.is_empty() {
            options.replace(config.options.clone());
        }
        let field = Self {
            core: FieldCore::new("tag", config, Value::Array(Vec::new()))?,
            options,
            allow_custom: false,
        };
        let initial = normalize_array(&field.core.stored_value());
        field.core.store_value(Value::Array(initial), false);
        Ok(field)
    }

    /// Allows tags that match no option.
    #[must_use]
    pub const fn allow_custom(mut self, allow: bool) -> Self {
        self.allow_custom = allow;
        self
    }

    /// Adds the tag for `text`: the option whose value or label matches it
    /// (ignoring case), or the text itself when custom tags are allowed.
    /// Returns whether a tag was added.
    pub fn add_tag(&self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        let matched = self.options.options().into_iter().find(|o| {
            o.key().eq_ignore_ascii_case(text) || o.label.eq_ignore_ascii_case(text)
        });
        match matched {
            Some(option) => self.add_value(option.value),
            None if self.allow_custom => self.add_value(Value::String(text.to_string())),
            None => false,
        }
    }
}

impl Field for TagField {
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

    fn render_input(&self) -> String {
        let tags: String = self
            .selected()
            .iter()
            .map(|value| {
                let label = self
                    .option(value)
                    .map_or_else(|| to_text(value), |o| o.label);
                let vars = TemplateVars::new().text("value", to_text(value)).text("label", label);
                self.core.render_template(TAG_TEMPLATE, &vars)
            })
            .collect();
        format!(
            r#"<div class="tags" id="{}">{tags}{}</div>"#,
            escape_html(self.id()),
            self.core.render_input("search", &Value::Null)
        )
    }
}

impl HasOptions for TagField {
    fn option_set(&self) -> &OptionSet {
        &self.options
    }
}

impl HasMultiValue for TagField {
    fn available_values(&self) -> Vec<Value> {
        self.options.values()
    }

    // Options are search suggestions; a chosen tag stays when they change.
    fn restricts_to_options(&self) -> bool {
        false
    }
}

impl HasAsyncFetch for TagField {}
