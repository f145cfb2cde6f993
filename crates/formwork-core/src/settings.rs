//! Settings for the formwork library.
//!
//! [`Settings`] holds the tunables shared by every form: debounce windows,
//! fetch timeouts, frame pacing, logging and the active language. A global
//! instance is available through [`SETTINGS`]; forms can also be configured
//! from an explicit `Settings` value.

use std::sync::OnceLock;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The complete set of library settings.
///
/// # Examples
///
/// ```
/// use formwork_core::Settings;
///
/// let settings = Settings::default();
/// assert_eq!(settings.submit_debounce_ms, 1000);
/// assert_eq!(settings.language_code, "en");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Enables human-readable log output.
    pub debug: bool,
    /// The tracing filter directive, e.g. `"info"` or `"formwork_forms=debug"`.
    pub log_level: String,
    /// The language used by the default text catalog.
    pub language_code: String,
    /// Minimum time between two accepted submit attempts.
    pub submit_debounce_ms: u64,
    /// Delay before an option search query is sent to the fetcher.
    pub search_debounce_ms: u64,
    /// Upper bound on a single option fetch. `None` waits indefinitely.
    pub fetch_timeout_ms: Option<u64>,
    /// Interval used by the frame loop that flushes deferred change signals.
    pub frame_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            log_level: "info".to_string(),
            language_code: "en".to_string(),
            submit_debounce_ms: 1000,
            search_debounce_ms: 300,
            fetch_timeout_ms: None,
            frame_interval_ms: 16,
        }
    }
}

impl Settings {
    /// The submit debounce window as a [`Duration`].
    pub const fn submit_debounce(&self) -> Duration {
        Duration::from_millis(self.submit_debounce_ms)
    }

    /// The search debounce window as a [`Duration`].
    pub const fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// The fetch timeout, if one is configured.
    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_ms.map(Duration::from_millis)
    }

    /// The frame loop interval as a [`Duration`].
    pub const fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

/// Lazily configured global settings.
///
/// The first call to [`LazySettings::get`] freezes the settings; call
/// [`LazySettings::configure`] before that to install non-default values.
pub struct LazySettings {
    inner: OnceLock<Settings>,
}

impl LazySettings {
    const fn new() -> Self {
        Self {
            inner: OnceLock::new(),
        }
    }

    /// Installs the given settings. Returns `false` if settings were already
    /// configured or read.
    pub fn configure(&self, settings: Settings) -> bool {
        self.inner.set(settings).is_ok()
    }

    /// Returns the configured settings, falling back to defaults.
    pub fn get(&self) -> &Settings {
        self.inner.get_or_init(Settings::default)
    }

    /// Returns `true` once settings have been configured or read.
    pub fn is_configured(&self) -> bool {
        self.inner.get().is_some()
    }
}

/// The global settings instance.
pub static SETTINGS: LazySettings = LazySettings::new();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert!(!s.debug);
        assert_eq!(s.log_level, "info");
        assert_eq!(s.submit_debounce(), Duration::from_secs(1));
        assert_eq!(s.search_debounce(), Duration::from_millis(300));
        assert!(s.fetch_timeout().is_none());
        assert_eq!(s.frame_interval(), Duration::from_millis(16));
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let s: Settings = serde_json::from_str(r#"{"submit_debounce_ms": 50}"#).unwrap();
        assert_eq!(s.submit_debounce_ms, 50);
        assert_eq!(s.search_debounce_ms, 300);
    }

    #[test]
    fn test_fetch_timeout_duration() {
        let s = Settings {
            fetch_timeout_ms: Some(2500),
            ..Settings::default()
        };
        assert_eq!(s.fetch_timeout(), Some(Duration::from_millis(2500)));
    }

    #[test]
    fn test_lazy_settings_configure_once() {
        let lazy = LazySettings::new();
        assert!(!lazy.is_configured());
        assert!(lazy.configure(Settings {
            submit_debounce_ms: 10,
            ..Settings::default()
        }));
        assert!(!lazy.configure(Settings::default()));
        assert_eq!(lazy.get().submit_debounce_ms, 10);
    }
}
