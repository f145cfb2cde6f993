//! The presentation-side element model.
//!
//! An [`Element`] stands in for the node a field or form is rendered into:
//! attributes, a class list, rendered markup, an attachment flag and an
//! optional bound [`InputElement`]. Hosts mirror these into whatever
//! rendering layer they use; the field and form logic only ever reads and
//! writes this model.

use std::collections::{BTreeMap, BTreeSet};

use crate::value::Value;

/// State class names applied by fields and forms.
pub mod classes {
    /// A field whose last validation failed.
    pub const FIELD_ERROR: &str = "field--error";
    /// A disabled field.
    pub const FIELD_DISABLED: &str = "field--disabled";
    /// A field waiting for options.
    pub const FIELD_LOADING: &str = "field--loading";
    /// A collapsible group that is open.
    pub const GROUP_OPEN: &str = "group--open";
    /// A form whose last validation failed.
    pub const FORM_INVALID: &str = "form--invalid";
    /// A form waiting on an asynchronous submit handler.
    pub const FORM_SUBMITTING: &str = "form--submitting";
    /// A form whose last submission succeeded.
    pub const FORM_SUCCESS: &str = "form--success";
}

/// The interactive control inside a field (text box, select, checkbox list).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputElement {
    /// The live value, as the user last left it.
    pub value: Option<Value>,
    attributes: BTreeMap<String, String>,
    /// Whether the control currently has focus.
    pub focused: bool,
    /// Whether the control is disabled.
    pub disabled: bool,
}

impl InputElement {
    /// Creates an input holding `value`.
    pub fn new(value: Value) -> Self {
        Self {
            value: Some(value),
            ..Self::default()
        }
    }

    /// Returns an attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Sets an attribute.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Removes an attribute.
    pub fn remove_attribute(&mut self, name: &str) {
        self.attributes.remove(name);
    }
}

/// A field's or form's own node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    tag: String,
    attributes: BTreeMap<String, String>,
    classes: BTreeSet<String>,
    attached: bool,
    content: String,
    error_display: Vec<String>,
    input: Option<InputElement>,
}

impl Element {
    /// Creates a detached element.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// The element's tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Returns an attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Sets an attribute.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Removes an attribute.
    pub fn remove_attribute(&mut self, name: &str) {
        self.attributes.remove(name);
    }

    /// Returns `true` if the class is present.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    /// Adds or removes a class depending on `on`.
    pub fn toggle_class(&mut self, class: &str, on: bool) {
        if on {
            self.classes.insert(class.to_string());
        } else {
            self.classes.remove(class);
        }
    }

    /// The current class list, sorted.
    pub fn classes(&self) -> Vec<&str> {
        self.classes.iter().map(String::as_str).collect()
    }

    /// Whether the element is attached to the document.
    pub const fn is_attached(&self) -> bool {
        self.attached
    }

    /// Marks the element attached or detached.
    pub fn set_attached(&mut self, attached: bool) {
        self.attached = attached;
    }

    /// The rendered markup.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Replaces the rendered markup.
    pub fn set_content(&mut self, content: String) {
        self.content = content;
    }

    /// Messages shown in the inline error list.
    pub fn error_display(&self) -> &[String] {
        &self.error_display
    }

    /// Replaces the inline error list.
    pub fn set_error_display(&mut self, messages: Vec<String>) {
        self.error_display = messages;
    }

    /// The bound input, if the field has rendered one.
    pub const fn input(&self) -> Option<&InputElement> {
        self.input.as_ref()
    }

    /// Mutable access to the bound input.
    pub fn input_mut(&mut self) -> Option<&mut InputElement> {
        self.input.as_mut()
    }

    /// Binds an input, replacing any previous one.
    pub fn bind_input(&mut self, input: InputElement) {
        self.input = Some(input);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_toggle_class() {
        let mut el = Element::new("field-text");
        el.toggle_class(classes::FIELD_ERROR, true);
        el.toggle_class(classes::FIELD_ERROR, true);
        assert!(el.has_class(classes::FIELD_ERROR));
        assert_eq!(el.classes(), vec![classes::FIELD_ERROR]);
        el.toggle_class(classes::FIELD_ERROR, false);
        assert!(el.classes().is_empty());
    }

    #[test]
    fn test_attributes() {
        let mut el = Element::new("form");
        el.set_attribute("id", "signup");
        assert_eq!(el.attribute("id"), Some("signup"));
        el.remove_attribute("id");
        assert_eq!(el.attribute("id"), None);
        assert_eq!(el.tag(), "form");
    }

    #[test]
    fn test_bind_input() {
        let mut el = Element::new("field-text");
        assert!(el.input().is_none());
        el.bind_input(InputElement::new(json!("abc")));
        el.input_mut().unwrap().set_attribute("value", "abc");
        let input = el.input().unwrap();
        assert_eq!(input.value, Some(json!("abc")));
        assert_eq!(input.attribute("value"), Some("abc"));
    }
}
