//! Settings loading from configuration files.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML or JSON document (overriding defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `FORMWORK_DEBUG` | `debug` |
//! | `FORMWORK_LOG_LEVEL` | `log_level` |
//! | `FORMWORK_LANGUAGE_CODE` | `language_code` |
//! | `FORMWORK_SUBMIT_DEBOUNCE_MS` | `submit_debounce_ms` |
//! | `FORMWORK_SEARCH_DEBOUNCE_MS` | `search_debounce_ms` |
//! | `FORMWORK_FETCH_TIMEOUT_MS` | `fetch_timeout_ms` |
//! | `FORMWORK_FRAME_INTERVAL_MS` | `frame_interval_ms` |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use formwork_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("config/forms.toml").unwrap();
//! ```

use std::path::Path;

use crate::error::FormError;
use crate::settings::Settings;

/// Loads settings from a TOML string. Keys not present keep their defaults.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, FormError> {
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| FormError::ConfigurationError(format!("Failed to parse TOML: {e}")))?;

    merge_over_defaults(toml_to_json(toml_value), "TOML")
}

/// Loads settings from a TOML file.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Settings, FormError> {
    let content = read_file(path.as_ref(), "TOML")?;
    from_toml_str(&content)
}

/// Loads settings from a TOML file and then applies environment variable overrides.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<Settings, FormError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from a JSON string. Keys not present keep their defaults.
pub fn from_json_str(json_str: &str) -> Result<Settings, FormError> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| FormError::ConfigurationError(format!("Failed to parse JSON: {e}")))?;

    merge_over_defaults(json_value, "JSON")
}

/// Loads settings from a JSON file.
pub fn from_json_file(path: impl AsRef<Path>) -> Result<Settings, FormError> {
    let content = read_file(path.as_ref(), "JSON")?;
    from_json_str(&content)
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies `FORMWORK_*` environment variable overrides to a settings struct.
///
/// Unparseable numeric values are ignored.
pub fn apply_env_overrides(settings: &mut Settings) {
    if let Ok(val) = std::env::var("FORMWORK_DEBUG") {
        settings.debug = matches!(val.to_lowercase().as_str(), "true" | "1" | "yes");
    }

    if let Ok(val) = std::env::var("FORMWORK_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Ok(val) = std::env::var("FORMWORK_LANGUAGE_CODE") {
        settings.language_code = val;
    }

    if let Some(ms) = env_millis("FORMWORK_SUBMIT_DEBOUNCE_MS") {
        settings.submit_debounce_ms = ms;
    }

    if let Some(ms) = env_millis("FORMWORK_SEARCH_DEBOUNCE_MS") {
        settings.search_debounce_ms = ms;
    }

    if let Some(ms) = env_millis("FORMWORK_FETCH_TIMEOUT_MS") {
        settings.fetch_timeout_ms = Some(ms);
    }

    if let Some(ms) = env_millis("FORMWORK_FRAME_INTERVAL_MS") {
        settings.frame_interval_ms = ms;
    }
}

// ============================================================
// Helpers
// ============================================================

fn env_millis(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn read_file(path: &Path, format: &str) -> Result<String, FormError> {
    std::fs::read_to_string(path).map_err(|e| {
        FormError::ConfigurationError(format!(
            "Failed to read {format} file '{}': {e}",
            path.display()
        ))
    })
}

fn merge_over_defaults(value: serde_json::Value, format: &str) -> Result<Settings, FormError> {
    let default_json = serde_json::to_value(Settings::default()).map_err(|e| {
        FormError::ConfigurationError(format!("Failed to serialize default settings: {e}"))
    })?;

    let merged = merge_json(default_json, value);
    serde_json::from_value(merged).map_err(|e| {
        FormError::ConfigurationError(format!("Failed to deserialize settings from {format}: {e}"))
    })
}

/// Converts a TOML value to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => {
            let map: serde_json::Map<String, serde_json::Value> = table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
    }
}

/// Deep-merges two JSON values. The `override_val` takes precedence.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = if let Some(base_v) = base_map.remove(&key) {
                    merge_json(base_v, override_v)
                } else {
                    override_v
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}
