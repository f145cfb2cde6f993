use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use tracing::debug;

use formwork_core::{FormError, FormResult, KeyValueStore};

use crate::config::FieldConfig;
use crate::element::classes;
use crate::field::{Field, FieldCore};
use crate::validator::ValidationRule;
use crate::value::Value;

/// A collapsible container.
///
/// A group carries no value of its own. Its children register directly
/// with the form, so the form sees (and validates) them like any other
/// field. With a [`KeyValueStore`], the open state is remembered under
/// `formwork.group.<id>.open`.
pub struct GroupField {
    core: FieldCore,
    children: RwLock<Vec<String>>,
    open: AtomicBool,
    store: Option<Arc<dyn KeyValueStore>>,
}

impl std::fmt::Debug for GroupField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupField")
            .field("core", &self.core)
            .field("children", &self.children)
            .field("open", &self.open)
            .field("remembers", &self.store.is_some())
            .finish()
    }
}

impl GroupField {
    /// Creates a closed group.
    pub fn new(config: FieldConfig) -> FormResult<Self> {
        Ok(Self {
            core: FieldCore::new("group", config, Value::Null)?,
            children: RwLock::new(Vec::new()),
            open: AtomicBool::new(false),
            store: None,
        })
    }

    /// Remembers the open state in `store`, restoring any saved state.
    #[must_use]
    pub fn remember(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        if let Some(saved) = store.get(&self.storage_key()) {
            self.apply_open(saved == "true");
        }
        self.store = Some(store);
        self
    }

    /// The key the open state is stored under.
    pub fn storage_key(&self) -> String {
        format!("formwork.group.{}.open", self.id())
    }

    /// Registers `child` with this group's form and records it as a child.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Detached`] if the group is not registered with
    /// a form.
    pub fn add_child(&self, child: Arc<dyn Field>) -> FormResult<()> {
        let form = self
            .core
            .form()
            .ok_or_else(|| FormError::Detached(self.id().to_string()))?;
        let child_id = child.id().to_string();
        form.register_field(child);
        let mut children = self.children.write().expect("group children lock poisoned");
        if !children.contains(&child_id) {
            children.push(child_id);
        }
        Ok(())
    }

    /// The ids of the group's children.
    pub fn children(&self) -> Vec<String> {
        self.children.read().expect("group children lock poisoned").clone()
    }

    /// Whether the group is open.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Opens the group.
    pub fn open(&self) {
        self.set_open(true);
    }

    /// Closes the group.
    pub fn close(&self) {
        self.set_open(false);
    }

    /// Flips the group.
    pub fn toggle(&self) {
        self.set_open(!self.is_open());
    }

    fn set_open(&self, open: bool) {
        self.apply_open(open);
        if let Some(store) = &self.store {
            store.set(&self.storage_key(), open.to_string());
        }
        debug!(group = %self.id(), open, "Toggled group");
    }

    fn apply_open(&self, open: bool) {
        self.open.store(open, Ordering::SeqCst);
        self.core.with_element(|el| el.toggle_class(classes::GROUP_OPEN, open));
    }
}

impl Field for GroupField {
    fn core(&self) -> &FieldCore {
        &self.core
    }

    fn output_value(&self) -> Option<Value> {
        None
    }

    fn validations(&self) -> Vec<ValidationRule> {
        Vec::new()
    }

    fn is_container(&self) -> bool {
        true
    }

    fn render_input(&self) -> String {
        let children: String = self
            .children()
            .iter()
            .map(|id| format!(r#"<div data-field="{}"></div>"#, crate::render::escape_html(id)))
            .collect();
        format!(r#"<fieldset>{children}</fieldset>"#)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::TextField;
    use crate::form::{Form, FormConfig};
    use formwork_core::{MemoryStore, Settings};
    use serde_json::json;

    fn form() -> Arc<Form> {
        Form::new(FormConfig::from_settings("profile", &Settings::default()))
    }

    #[test]
    fn test_children_register_with_form() {
        let form = form();
        let group = Arc::new(GroupField::new(FieldConfig::new("address")).unwrap());
        form.register_field(group.clone());
        group
            .add_child(Arc::new(TextField::new(FieldConfig::new("street").value("Main")).unwrap()))
            .unwrap();
        group
            .add_child(Arc::new(TextField::new(FieldConfig::new("city").required(true)).unwrap()))
            .unwrap();

        assert_eq!(group.children(), vec!["street", "city"]);
        assert_eq!(form.field_ids(), vec!["address", "street", "city"]);

        let values = form.values();
        assert!(!values.contains_key("address"));
        assert_eq!(values.get("street"), Some(&json!("Main")));

        assert!(!form.validate());
        assert_eq!(
            form.field("city").unwrap().error_messages(),
            vec!["This field is required."]
        );
    }

    #[test]
    fn test_add_child_without_form() {
        let group = GroupField::new(FieldConfig::new("g")).unwrap();
        let child = Arc::new(TextField::new(FieldConfig::new("c")).unwrap());
        assert!(matches!(group.add_child(child), Err(FormError::Detached(id)) if id == "g"));
    }

    #[test]
    fn test_open_state_is_remembered() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let group = GroupField::new(FieldConfig::new("advanced"))
            .unwrap()
            .remember(store.clone());
        assert!(!group.is_open());
        group.toggle();
        assert!(group.is_open());
        assert!(group.core().element().has_class(classes::GROUP_OPEN));
        assert_eq!(store.get("formwork.group.advanced.open").as_deref(), Some("true"));

        let restored = GroupField::new(FieldConfig::new("advanced"))
            .unwrap()
            .remember(store.clone());
        assert!(restored.is_open());
        restored.close();
        assert_eq!(store.get("formwork.group.advanced.open").as_deref(), Some("false"));
    }

    #[test]
    fn test_group_always_valid() {
        let group = GroupField::new(FieldConfig::new("g").required(true)).unwrap();
        assert!(group.validate());
        assert!(group.is_container());
    }
}
