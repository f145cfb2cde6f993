//! Concrete field kinds.
//!
//! | Kind | Value | Capabilities |
//! |------|-------|--------------|
//! | [`TextField`] | string | |
//! | [`NumberField`] | number | |
//! | [`PasswordField`], [`PasswordConfirmField`] | string | |
//! | [`DateField`] | ISO date string | |
//! | [`FileField`] | list of file descriptors | |
//! | [`CheckboxField`] | boolean | |
//! | [`CheckboxesField`] | list, or a boolean map in binary mode | multi-value, options |
//! | [`SelectField`] | option value | options, async fetch |
//! | [`TagField`] | list | multi-value, options, async fetch |
//! | [`GroupField`] | none | container |

mod checkbox;
mod checkboxes;
mod date;
mod file;
mod group;
mod number;
mod password;
mod select;
mod tag;
mod text;

pub use checkbox::CheckboxField;
pub use checkboxes::CheckboxesField;
pub use date::DateField;
pub use file::{FileField, FileInfo};
pub use group::GroupField;
pub use number::NumberField;
pub use password::{PasswordConfirmField, PasswordField};
pub use select::SelectField;
pub use tag::TagField;
pub use text::{ColorField, TextField, TextKind};
