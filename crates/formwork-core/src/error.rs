//! Core error types for the formwork library.
//!
//! Only contract violations and I/O-bound failures are errors. A value that
//! fails validation is an expected outcome and is reported through the
//! field's message list, never through [`FormError`].

use thiserror::Error;

/// The primary error type for formwork.
#[derive(Error, Debug)]
pub enum FormError {
    /// A field was constructed without an identifier.
    #[error("Field is missing an id")]
    MissingId,

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// An option fetch function rejected.
    #[error("Fetching options for '{field}' failed: {message}")]
    FetchFailed {
        /// The id of the field whose options were being fetched.
        field: String,
        /// The fetcher's failure message.
        message: String,
    },

    /// An option fetch did not settle within the configured timeout.
    #[error("Fetching options for '{field}' timed out after {millis}ms")]
    FetchTimedOut {
        /// The id of the field whose options were being fetched.
        field: String,
        /// The timeout that elapsed.
        millis: u64,
    },

    /// A field operation needed an owning form but none was registered.
    #[error("Field '{0}' is not registered with a form")]
    Detached(String),

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<serde_json::Error> for FormError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// A convenience type alias for `Result<T, FormError>`.
pub type FormResult<T> = Result<T, FormError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_id_display() {
        assert_eq!(FormError::MissingId.to_string(), "Field is missing an id");
    }

    #[test]
    fn test_fetch_failed_display() {
        let err = FormError::FetchFailed {
            field: "country".into(),
            message: "503".into(),
        };
        assert_eq!(err.to_string(), "Fetching options for 'country' failed: 503");
    }

    #[test]
    fn test_fetch_timeout_display() {
        let err = FormError::FetchTimedOut {
            field: "tags".into(),
            millis: 250,
        };
        assert!(err.to_string().contains("250ms"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: FormError = io_err.into();
        assert!(err.to_string().contains("file missing"));
    }

    #[test]
    fn test_serde_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: FormError = json_err.into();
        assert!(matches!(err, FormError::SerializationError(_)));
    }
}
