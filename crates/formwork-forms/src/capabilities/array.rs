//! Multi-value selection.
//!
//! The value of a multi-value field is always an array with no duplicates,
//! kept in insertion order. Mutations update the stored value immediately;
//! the element is refreshed only once the field has rendered, so values
//! can be set up before any options exist.
//!
//! Once rendered, selections are kept to the available values: values that
//! match no option are dropped on first render, when options are replaced,
//! and on every later mutation. An empty option list counts as not loaded
//! yet and restricts nothing.

use tracing::debug;

use crate::field::Field;
use crate::value::Value;

/// Turns any value into a duplicate-free list: arrays keep their first
/// occurrences, null and the empty string become empty, scalars become a
/// one-element list.
pub fn normalize_array(value: &Value) -> Vec<Value> {
    let items = match value {
        Value::Null => return Vec::new(),
        Value::String(s) if s.is_empty() => return Vec::new(),
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    };
    let mut unique: Vec<Value> = Vec::with_capacity(items.len());
    for item in items {
        if !unique.contains(&item) {
            unique.push(item);
        }
    }
    unique
}

/// A field whose value is a set of selections.
pub trait HasMultiValue: Field {
    /// Every value that can be selected, in display order.
    fn available_values(&self) -> Vec<Value>;

    /// The current selections.
    fn selected(&self) -> Vec<Value> {
        normalize_array(&self.core().stored_value())
    }

    /// Whether rendered selections are limited to the available values.
    fn restricts_to_options(&self) -> bool {
        true
    }

    /// Whether `value` may be selected right now.
    fn accepts_value(&self, value: &Value) -> bool {
        if !self.restricts_to_options() || !self.core().has_rendered() {
            return true;
        }
        let available = self.available_values();
        available.is_empty() || available.contains(value)
    }

    /// Replaces the selections, refreshing the element if it has rendered.
    /// A rendered field drops values it does not accept.
    fn commit_selected(&self, values: Vec<Value>) {
        let core = self.core();
        let rendered = core.has_rendered();
        let values = if rendered {
            values.into_iter().filter(|v| self.accepts_value(v)).collect()
        } else {
            values
        };
        core.store_value(Value::Array(values), rendered);
        if rendered {
            self.render();
        }
    }

    /// Drops the selections that match no available value, without
    /// re-rendering. Returns whether anything was dropped.
    fn prune_selected(&self) -> bool {
        if !self.restricts_to_options() {
            return false;
        }
        let available = self.available_values();
        if available.is_empty() {
            return false;
        }
        let selected = self.selected();
        let kept: Vec<Value> = selected
            .iter()
            .filter(|v| available.contains(v))
            .cloned()
            .collect();
        if kept.len() == selected.len() {
            return false;
        }
        debug!(
            field = %self.id(),
            dropped = selected.len() - kept.len(),
            "Dropping selections with no matching option"
        );
        let core = self.core();
        core.store_value(Value::Array(kept), core.has_rendered());
        true
    }

    /// Adds `value` unless already selected or not accepted. Returns
    /// whether it was added.
    fn add_value(&self, value: Value) -> bool {
        let mut selected = self.selected();
        if selected.contains(&value) || !self.accepts_value(&value) {
            return false;
        }
        selected.push(value);
        self.commit_selected(selected);
        true
    }

    /// Removes `value`. Returns whether it was selected.
    fn remove_value(&self, value: &Value) -> bool {
        let mut selected = self.selected();
        let before = selected.len();
        selected.retain(|v| v != value);
        if selected.len() == before {
            return false;
        }
        self.commit_selected(selected);
        true
    }

    /// Whether `value` is selected.
    fn has_value(&self, value: &Value) -> bool {
        self.selected().contains(value)
    }

    /// Selects every available value except `exceptions`.
    fn check_all(&self, exceptions: &[Value]) {
        let all = self
            .available_values()
            .into_iter()
            .filter(|v| !exceptions.contains(v))
            .collect();
        self.commit_selected(normalize_array(&Value::Array(all)));
    }

    /// Clears the selections.
    fn uncheck_all(&self) {
        self.commit_selected(Vec::new());
    }

    /// Clears the selections if everything is selected, otherwise selects
    /// everything.
    fn toggle_all(&self) {
        let available = self.available_values();
        let checked = self
            .selected()
            .iter()
            .filter(|v| available.contains(v))
            .count();
        if checked == available.len() {
            self.uncheck_all();
        } else {
            self.check_all(&[]);
        }
    }
}
