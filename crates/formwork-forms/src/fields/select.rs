use formwork_core::FormResult;

use crate::capabilities::{HasAsyncFetch, HasOptions, OptionSet};
use crate::config::FieldConfig;
use crate::field::{with_rules, Field, FieldCore, BASE_RULES};
use crate::render::TemplateVars;
use crate::validator::{RuleOverride, ValidationRule};
use crate::value::{is_empty, FieldOption, Value};

const SELECT_TEMPLATE: &str = r#"<select id="{{ id }}" name="{{ id }}"{{ state }}>{{ options }}</select>"#;

/// Picks one value from an option list, static or fetched.
///
/// The `option` rule rejects a value that is not among the loaded options.
/// It passes while no options are loaded, since a fetched list may not
/// have arrived yet.
#[derive(Debug)]
pub struct SelectField {
    core: FieldCore,
    options: OptionSet,
}

impl SelectField {
    /// Creates a select with the configured options.
    pub fn new(config: FieldConfig) -> FormResult<Self> {
        Self::with_option_set(config, OptionSet::default())
    }

    /// Creates a select around an existing option set. Configured options,
    /// if any, replace the set's contents.
    pub fn with_option_set(config: FieldConfig, options: OptionSet) -> FormResult<Self> {
        if !config.options.is_empty() {
            options.replace(config.options.clone());
        }
        Ok(Self {
            core: FieldCore::new("select", config, Value::Null)?,
            options,
        })
    }

    /// The option matching the current value.
    pub fn selected_option(&self) -> Option<FieldOption> {
        self.option(&self.value())
    }

    fn check_option(&self, value: &Value) -> Result<(), String> {
        if is_empty(value) || self.options.options().is_empty() || self.option(value).is_some() {
            return Ok(());
        }
        Err(self.core.text("errors.option", &[]))
    }
}

impl Field for SelectField {
    fn core(&self) -> &FieldCore {
        &self.core
    }

    fn validations(&self) -> Vec<ValidationRule> {
        let mut rules = BASE_RULES.to_vec();
        rules.push("option");
        with_rules(&self.core, &rules)
    }

    fn rule_override(&self, name: &str) -> Option<RuleOverride<'_>> {
        match name {
            "option" => Some(Box::new(move |value: &Value| self.check_option(value))),
            _ => None,
        }
    }

    fn render_input(&self) -> String {
        let state = if self.is_disabled() { " disabled" } else { "" };
        let vars = TemplateVars::new()
            .text("id", self.id())
            .safe("state", state)
            .safe("options", self.options_markup());
        self.core.render_template(SELECT_TEMPLATE, &vars)
    }
}

impl HasOptions for SelectField {
    fn option_set(&self) -> &OptionSet {
        &self.options
    }

    fn selected_attribute(&self) -> &'static str {
        "selected"
    }
}

impl HasAsyncFetch for SelectField {}
