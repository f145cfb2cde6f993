//! # formwork
//!
//! Composable form fields with a shared validation, value and submission
//! contract.
//!
//! This is the meta-crate that re-exports all sub-crates for convenient access.
//! You can depend on `formwork` to get everything, or depend on individual
//! crates for finer-grained control.

/// Errors, settings, logging, text resolution and persistence.
pub use formwork_core as core;

/// Signal dispatcher for change, error and focus notifications.
#[cfg(feature = "signals")]
pub use formwork_signals as signals;

/// Fields, capabilities and the form aggregator.
#[cfg(feature = "forms")]
pub use formwork_forms as forms;

/// Commonly used types in one import.
pub mod prelude {
    pub use formwork_core::{FormError, FormResult, Settings, SETTINGS};

    #[cfg(feature = "forms")]
    pub use formwork_forms::{
        Field, FieldConfig, FieldOption, Form, FormConfig, HasAsyncFetch, HasMultiValue,
        HasOptions, SubmitOutcome, SubmitReturn, Values,
    };
}

// Re-export key third-party crates
pub use async_trait;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tracing;
