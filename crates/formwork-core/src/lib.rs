//! # formwork-core
//!
//! Core types for the formwork library: errors, settings, logging, text
//! resolution and small persistence capabilities. This crate has no
//! framework dependencies and is the foundation for all other crates.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Library settings and the global instance
//! - [`settings_loader`] - Loading settings from TOML/JSON and the environment
//! - [`logging`] - Tracing-based logging integration
//! - [`i18n`] - Message catalog and the text resolution trait
//! - [`storage`] - Key-value persistence capability

pub mod error;
pub mod i18n;
pub mod logging;
pub mod settings;
pub mod settings_loader;
pub mod storage;

// Re-export the most commonly used types at the crate root.
pub use error::{FormError, FormResult};
pub use i18n::TextResolver;
pub use settings::{Settings, SETTINGS};
pub use storage::{KeyValueStore, MemoryStore};
