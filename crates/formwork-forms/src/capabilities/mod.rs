//! Capabilities layered onto the base [`Field`](crate::field::Field)
//! contract.
//!
//! A field kind opts into multi-value selection, an option set or
//! asynchronous option loading by implementing the matching trait. Kinds
//! that need several (a tag field is multi-valued *and* fetches options)
//! implement each one directly.

pub mod array;
pub mod options;

pub use array::{normalize_array, HasMultiValue};
pub use options::{HasAsyncFetch, HasOptions, OptionSet, OptionsFetcher};
