//! Text resolution for user-facing messages.
//!
//! Fields never hard-code the messages they show. Every validation message is
//! looked up by key through a [`TextResolver`], which is treated as a pure
//! function `(key, replacements) -> String`. The default implementation is a
//! [`Catalog`](catalog::Catalog) seeded with English messages.
//!
//! ## Quick Start
//!
//! ```
//! use formwork_core::i18n::{Catalog, TextResolver};
//!
//! let catalog = Catalog::with_defaults("en");
//! let text = catalog.text("errors.minLength", &[("min", "3".to_string())]);
//! assert_eq!(text, "Enter at least 3 characters.");
//! ```

pub mod catalog;

use std::sync::Arc;

use once_cell::sync::Lazy;

pub use catalog::Catalog;

use crate::settings::{Settings, SETTINGS};

/// Resolves a message key into display text.
pub trait TextResolver: Send + Sync {
    /// Returns the text for `key`, with each `{name}` placeholder replaced by
    /// the matching entry in `replacements`. Unknown keys resolve to the key.
    fn text(&self, key: &str, replacements: &[(&str, String)]) -> String;
}

impl<F> TextResolver for F
where
    F: Fn(&str, &[(&str, String)]) -> String + Send + Sync,
{
    fn text(&self, key: &str, replacements: &[(&str, String)]) -> String {
        self(key, replacements)
    }
}

static DEFAULT_CATALOG: Lazy<Arc<Catalog>> = Lazy::new(|| Arc::new(catalog_for(SETTINGS.get())));

/// Builds a catalog with the default messages, active in the settings'
/// `language_code`.
pub fn catalog_for(settings: &Settings) -> Catalog {
    Catalog::with_defaults(settings.language_code.clone())
}

/// The shared default catalog. Hosts register translations here; the
/// active language comes from the global settings.
pub fn default_catalog() -> Arc<Catalog> {
    Arc::clone(&DEFAULT_CATALOG)
}

/// Returns the shared default resolver.
pub fn default_texts() -> Arc<dyn TextResolver> {
    default_catalog()
}

/// Replaces `{name}` placeholders in `template`.
///
/// # Examples
///
/// ```
/// use formwork_core::i18n::interpolate;
///
/// assert_eq!(
///     interpolate("Between {min} and {max}.", &[("min", "1".into()), ("max", "9".into())]),
///     "Between 1 and 9."
/// );
/// ```
pub fn interpolate(template: &str, replacements: &[(&str, String)]) -> String {
    replacements
        .iter()
        .fold(template.to_string(), |acc, (name, value)| {
            acc.replace(&format!("{{{name}}}"), value)
        })
}
