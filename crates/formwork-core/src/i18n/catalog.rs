//! Translation catalog backing the default [`TextResolver`].
//!
//! A [`Catalog`] stores message tables per language code and resolves keys
//! against the active language, falling back to the base language (the part
//! before `-`) and then to English.
//!
//! ## JSON Format
//!
//! ```json
//! {
//!   "messages": {
//!     "errors.required": "Dieses Feld ist erforderlich."
//!   }
//! }
//! ```

use std::collections::HashMap;
use std::sync::RwLock;

use super::{interpolate, TextResolver};

/// Built-in English messages for every validation rule shipped with formwork.
pub const DEFAULT_MESSAGES: &[(&str, &str)] = &[
    ("errors.required", "This field is required."),
    ("errors.minLength", "Enter at least {min} characters."),
    ("errors.maxLength", "Enter no more than {max} characters."),
    ("errors.minItems", "Select at least {min} items."),
    ("errors.maxItems", "Select no more than {max} items."),
    ("errors.size", "Enter between {min} and {max} characters."),
    ("errors.regex", "The value does not match the expected format."),
    ("errors.number", "Enter a valid number."),
    ("errors.numberMin", "Enter a number greater than or equal to {min}."),
    ("errors.numberMax", "Enter a number less than or equal to {max}."),
    ("errors.color", "Enter a valid color."),
    ("errors.url", "Enter a valid URL."),
    ("errors.email", "Enter a valid email address."),
    ("errors.date", "Enter a valid date."),
    ("errors.dateMin", "Enter a date on or after {min}."),
    ("errors.dateMax", "Enter a date on or before {max}."),
    ("errors.extension", "Files of type {extension} are not allowed ({accept})."),
    ("errors.minSize", "{name} is smaller than {size} MB."),
    ("errors.maxSize", "{name} is larger than {size} MB."),
    ("errors.passwordMatch", "The passwords do not match."),
    ("errors.option", "Select a valid option."),
    ("options.empty", "No options available."),
    ("options.loading", "Loading..."),
];

/// A thread-safe, per-language message store.
#[derive(Debug, Default)]
pub struct Catalog {
    language: RwLock<String>,
    messages: RwLock<HashMap<String, HashMap<String, String>>>,
}

impl Catalog {
    /// Creates an empty catalog with the given active language.
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: RwLock::new(language.into()),
            messages: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a catalog with the English default messages registered.
    pub fn with_defaults(language: impl Into<String>) -> Self {
        let catalog = Self::new(language);
        catalog.register("en", DEFAULT_MESSAGES.iter().copied());
        catalog
    }

    /// Registers messages for a language, merging over existing entries.
    pub fn register<'a>(&self, language: &str, entries: impl IntoIterator<Item = (&'a str, &'a str)>) {
        let mut messages = self.messages.write().expect("catalog lock poisoned");
        let table = messages.entry(language.to_string()).or_default();
        for (key, text) in entries {
            table.insert(key.to_string(), text.to_string());
        }
    }

    /// Loads messages for a language from a JSON document.
    ///
    /// Only the `messages` object is read; other keys are ignored.
    pub fn load_from_json(&self, language: &str, json_str: &str) -> Result<(), String> {
        let value: serde_json::Value =
            serde_json::from_str(json_str).map_err(|e| format!("Invalid JSON: {e}"))?;

        let entries: Vec<(String, String)> = value
            .get("messages")
            .and_then(|v| v.as_object())
            .map(|messages| {
                messages
                    .iter()
                    .filter_map(|(k, v)| v.as_str().map(|t| (k.clone(), t.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        self.register(
            language,
            entries.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        );
        Ok(())
    }

    /// Switches the active language.
    pub fn activate(&self, language: impl Into<String>) {
        *self.language.write().expect("catalog lock poisoned") = language.into();
    }

    /// Returns the active language code.
    pub fn language(&self) -> String {
        self.language.read().expect("catalog lock poisoned").clone()
    }

    /// Returns `true` if messages are registered for the given language.
    pub fn has_language(&self, language: &str) -> bool {
        self.messages
            .read()
            .expect("catalog lock poisoned")
            .contains_key(language)
    }

    /// Looks up the raw (uninterpolated) message for a key.
    pub fn lookup(&self, key: &str) -> Option<String> {
        let language = self.language();
        let messages = self.messages.read().expect("catalog lock poisoned");
        let base = language.split('-').next().unwrap_or(&language);

        [language.as_str(), base, "en"]
            .iter()
            .find_map(|lang| messages.get(*lang).and_then(|t| t.get(key)).cloned())
    }
}

impl TextResolver for Catalog {
    fn text(&self, key: &str, replacements: &[(&str, String)]) -> String {
        let template = self.lookup(key).unwrap_or_else(|| key.to_string());
        interpolate(&template, replacements)
    }
}
