//! # formwork-forms
//!
//! Form fields with a shared contract for values, validation, rendering and
//! change notification, plus the [`Form`](form::Form) that aggregates them
//! and runs submission.
//!
//! ## Modules
//!
//! - [`value`] - The dynamic value type, option entries and emptiness rules
//! - [`element`] - The observable element model a field renders into
//! - [`render`] - Template substitution and the pluggable renderer
//! - [`config`] - Field configuration, deserializable from JSON
//! - [`validator`] - The validation pipeline and the built-in rule table
//! - [`field`] - The [`Field`](field::Field) trait and its shared state
//! - [`scheduler`] - Coalesced next-frame jobs for change signals
//! - [`form`] - Field registry, aggregation and debounced submission
//! - [`capabilities`] - Multi-value, option list and async fetch behavior
//! - [`fields`] - The concrete field kinds
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use formwork_forms::{FieldConfig, Form, FormConfig, TextField};
//!
//! let form = Form::new(FormConfig::new("signup"));
//! let name = TextField::new(FieldConfig::new("name").required(true)).unwrap();
//! form.register_field(Arc::new(name));
//! assert!(!form.validate());
//! ```

pub mod capabilities;
pub mod config;
pub mod element;
pub mod field;
pub mod fields;
pub mod form;
pub mod render;
pub mod scheduler;
pub mod validator;
pub mod value;

pub use capabilities::{HasAsyncFetch, HasMultiValue, HasOptions, OptionSet, OptionsFetcher};
pub use config::FieldConfig;
pub use element::{classes, Element};
pub use field::{ChangeEvent, ErrorEvent, Field, FieldCore, FocusEvent};
pub use fields::{
    CheckboxField, CheckboxesField, ColorField, DateField, FileField, FileInfo, GroupField,
    NumberField, PasswordConfirmField, PasswordField, SelectField, TagField, TextField, TextKind,
};
pub use form::{Form, FormConfig, SubmitEvent, SubmitOutcome, SubmitReturn};
pub use render::{Renderer, TemplateVars};
pub use validator::ValidationRule;
pub use value::{FieldOption, Value, Values};
