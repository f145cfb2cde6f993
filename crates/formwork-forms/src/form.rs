//! The form aggregator.
//!
//! A [`Form`] owns a registry of fields in registration order. It validates
//! them all, collects their output values into a flat [`Values`] map and
//! runs a debounced validate-then-submit protocol.
//!
//! ## Submission
//!
//! 1. The submit event's default action is prevented.
//! 2. Attempts within the debounce window of the last accepted attempt are
//!    dropped without any callback.
//! 3. The attempt time is recorded.
//! 4. The form validates; on failure the first invalid field takes focus.
//! 5. On success the submit handler receives the values. A handler may
//!    finish synchronously or hand back a future, during which the form
//!    carries the `form--submitting` class.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn, Instrument};

use formwork_core::logging::form_span;
use formwork_core::{Settings, SETTINGS};

use crate::element::{classes, Element};
use crate::field::Field;
use crate::scheduler::FrameScheduler;
use crate::value::Values;

/// What a submit handler hands back.
pub enum SubmitReturn {
    /// Finished; `true` means the submission succeeded.
    Done(bool),
    /// Still running; resolves to the success flag.
    Pending(Pin<Box<dyn Future<Output = bool> + Send>>),
}

impl SubmitReturn {
    /// Wraps a future resolving to the success flag.
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = bool> + Send + 'static,
    {
        Self::Pending(Box::pin(future))
    }
}

impl From<bool> for SubmitReturn {
    fn from(success: bool) -> Self {
        Self::Done(success)
    }
}

impl std::fmt::Debug for SubmitReturn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Done(ok) => f.debug_tuple("Done").field(ok).finish(),
            Self::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// The submit callback.
pub type SubmitHandler = Arc<dyn Fn(Values) -> SubmitReturn + Send + Sync>;

/// The result of one submit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Dropped: inside the debounce window.
    Debounced,
    /// Validation failed; holds the id of the field that took focus.
    Invalid {
        /// The focused field.
        focused: Option<String>,
    },
    /// The handler ran.
    Submitted {
        /// What the handler reported.
        success: bool,
    },
    /// Valid, but no handler is registered.
    Unhandled,
}

/// The event passed to [`Form::handle_submit`].
#[derive(Debug, Clone, Default)]
pub struct SubmitEvent {
    default_prevented: bool,
}

impl SubmitEvent {
    /// Creates an event.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stops the host's default submit behavior.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Whether [`SubmitEvent::prevent_default`] was called.
    pub const fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Form-level configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormConfig {
    /// The form id, used for the element and log spans.
    pub id: String,
    /// Minimum time between two accepted submit attempts.
    pub debounce: Duration,
    /// Interval of the frame loop started by [`Form::start_frame_loop`].
    pub frame_interval: Duration,
}

impl FormConfig {
    /// Creates a configuration from the global settings.
    pub fn new(id: impl Into<String>) -> Self {
        Self::from_settings(id, SETTINGS.get())
    }

    /// Creates a configuration from explicit settings.
    pub fn from_settings(id: impl Into<String>, settings: &Settings) -> Self {
        Self {
            id: id.into(),
            debounce: settings.submit_debounce(),
            frame_interval: settings.frame_interval(),
        }
    }

    /// Sets the debounce window.
    #[must_use]
    pub const fn debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}

/// A registry of fields with validation, value collection and submission.
pub struct Form {
    config: FormConfig,
    fields: RwLock<Vec<(String, Arc<dyn Field>)>>,
    values: RwLock<Values>,
    is_valid: RwLock<Option<bool>>,
    submit_time: Mutex<Option<Instant>>,
    handler: RwLock<Option<SubmitHandler>>,
    element: RwLock<Element>,
    scheduler: Arc<FrameScheduler>,
    ready: watch::Sender<bool>,
}

impl std::fmt::Debug for Form {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Form")
            .field("config", &self.config)
            .field("fields", &self.field_ids())
            .field("is_valid", &self.is_valid())
            .finish_non_exhaustive()
    }
}

impl Form {
    /// Creates an empty, detached form.
    pub fn new(config: FormConfig) -> Arc<Self> {
        let mut element = Element::new("form");
        element.set_attribute("id", config.id.clone());
        let (ready, _) = watch::channel(false);
        Arc::new(Self {
            config,
            fields: RwLock::new(Vec::new()),
            values: RwLock::new(Values::new()),
            is_valid: RwLock::new(None),
            submit_time: Mutex::new(None),
            handler: RwLock::new(None),
            element: RwLock::new(element),
            scheduler: Arc::new(FrameScheduler::new()),
            ready,
        })
    }

    /// The form id.
    pub fn id(&self) -> &str {
        &self.config.id
    }

    /// The form's configuration.
    pub const fn config(&self) -> &FormConfig {
        &self.config
    }

    /// Registers `field`, pointing its back-reference at this form.
    ///
    /// Registering a second field under an existing id replaces the first
    /// one in place and logs a warning.
    pub fn register_field(self: &Arc<Self>, field: Arc<dyn Field>) {
        let id = field.id().to_string();
        field.core().bind(self, Arc::downgrade(&field));

        let mut fields = self.fields.write().expect("field registry lock poisoned");
        if let Some(slot) = fields.iter_mut().find(|(existing, _)| *existing == id) {
            warn!(form = %self.config.id, field = %id, "Duplicate field id; replacing earlier registration");
            slot.1 = field;
        } else {
            debug!(form = %self.config.id, field = %id, "Registered field");
            fields.push((id, field));
        }
    }

    /// Registers, attaches and, once the form is ready, renders `field`.
    pub async fn mount(self: &Arc<Self>, field: Arc<dyn Field>) {
        self.register_field(Arc::clone(&field));
        field.core().set_attached(true);
        self.ready().await;
        field.render();
    }

    /// Looks up a field by id.
    pub fn field(&self, id: &str) -> Option<Arc<dyn Field>> {
        self.fields
            .read()
            .expect("field registry lock poisoned")
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, field)| Arc::clone(field))
    }

    /// All fields in registration order.
    pub fn fields(&self) -> Vec<Arc<dyn Field>> {
        self.fields
            .read()
            .expect("field registry lock poisoned")
            .iter()
            .map(|(_, field)| Arc::clone(field))
            .collect()
    }

    /// All field ids in registration order.
    pub fn field_ids(&self) -> Vec<String> {
        self.fields
            .read()
            .expect("field registry lock poisoned")
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Collects every field's output value in registration order. Fields
    /// with no output are left out.
    pub fn values(&self) -> Values {
        let mut values = Values::new();
        for field in self.fields() {
            if let Some(value) = field.output_value() {
                values.insert(field.id().to_string(), value);
            }
        }
        *self.values.write().expect("values lock poisoned") = values.clone();
        values
    }

    /// The snapshot taken by the last [`Form::values`] call.
    pub fn last_values(&self) -> Values {
        self.values.read().expect("values lock poisoned").clone()
    }

    /// Sets the value of every field named in `values`. Unknown keys are
    /// ignored.
    pub fn set_values(&self, values: &Values) {
        for (id, value) in values {
            match self.field(id) {
                Some(field) => field.set_value(value.clone(), true),
                None => debug!(form = %self.config.id, field = %id, "No field for value"),
            }
        }
    }

    /// Validates every field without stopping at the first failure.
    pub fn validate(&self) -> bool {
        self.values();
        let mut valid = true;
        for field in self.fields() {
            valid &= field.validate();
        }
        *self.is_valid.write().expect("validity lock poisoned") = Some(valid);
        self.toggle_class(classes::FORM_INVALID, !valid);
        debug!(form = %self.config.id, valid, "Validated form");
        valid
    }

    /// The result of the last [`Form::validate`].
    pub fn is_valid(&self) -> Option<bool> {
        *self.is_valid.read().expect("validity lock poisoned")
    }

    /// Registers the submit handler, replacing any previous one.
    pub fn on_submit<F, R>(&self, handler: F)
    where
        F: Fn(Values) -> R + Send + Sync + 'static,
        R: Into<SubmitReturn>,
    {
        let handler: SubmitHandler = Arc::new(move |values| handler(values).into());
        *self.handler.write().expect("handler lock poisoned") = Some(handler);
    }

    /// Handles a submit event from the host.
    pub async fn handle_submit(&self, event: &mut SubmitEvent) -> SubmitOutcome {
        event.prevent_default();
        self.submit().await
    }

    /// Runs one submit attempt.
    pub async fn submit(&self) -> SubmitOutcome {
        self.submit_inner().instrument(form_span(&self.config.id)).await
    }

    async fn submit_inner(&self) -> SubmitOutcome {
        let now = Instant::now();
        {
            let mut last = self.submit_time.lock().expect("submit time lock poisoned");
            if let Some(previous) = *last {
                if now.duration_since(previous) < self.config.debounce {
                    debug!("Submit attempt inside debounce window dropped");
                    return SubmitOutcome::Debounced;
                }
            }
            *last = Some(now);
        }

        if !self.validate() {
            let focused = self.focus_first_error();
            return SubmitOutcome::Invalid { focused };
        }

        let handler = self.handler.read().expect("handler lock poisoned").clone();
        let Some(handler) = handler else {
            debug!("Valid submission with no handler");
            return SubmitOutcome::Unhandled;
        };

        self.toggle_class(classes::FORM_SUCCESS, false);
        let success = match handler(self.last_values()) {
            SubmitReturn::Done(success) => success,
            SubmitReturn::Pending(future) => {
                self.toggle_class(classes::FORM_SUBMITTING, true);
                let success = future.await;
                self.toggle_class(classes::FORM_SUBMITTING, false);
                success
            }
        };
        self.toggle_class(classes::FORM_SUCCESS, success);
        info!(success, "Form submitted");
        SubmitOutcome::Submitted { success }
    }

    /// Focuses the first field whose last validation failed.
    pub fn focus_first_error(&self) -> Option<String> {
        let field = self
            .fields()
            .into_iter()
            .find(|field| field.core().is_valid() == Some(false))?;
        field.focus();
        Some(field.id().to_string())
    }

    /// Clears every field's errors and the form's state classes.
    pub fn reset(&self) {
        for field in self.fields() {
            field.core().clear_errors();
        }
        *self.is_valid.write().expect("validity lock poisoned") = None;
        for class in [
            classes::FORM_INVALID,
            classes::FORM_SUBMITTING,
            classes::FORM_SUCCESS,
        ] {
            self.toggle_class(class, false);
        }
    }

    /// Marks the form attached to the document.
    pub fn attach(&self) {
        self.element.write().expect("form element lock poisoned").set_attached(true);
    }

    /// Marks the form detached. Pending change signals are dropped when
    /// their frame runs.
    pub fn detach(&self) {
        self.element.write().expect("form element lock poisoned").set_attached(false);
    }

    /// Whether the form is attached.
    pub fn is_attached(&self) -> bool {
        self.element.read().expect("form element lock poisoned").is_attached()
    }

    /// Signals that the form is ready; mounts waiting on it proceed.
    pub fn mark_ready(&self) {
        self.ready.send_replace(true);
    }

    /// Waits until [`Form::mark_ready`] has been called.
    pub async fn ready(&self) {
        let mut rx = self.ready.subscribe();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                break;
            }
        }
    }

    /// A snapshot of the form's element.
    pub fn element(&self) -> Element {
        self.element.read().expect("form element lock poisoned").clone()
    }

    fn toggle_class(&self, class: &str, on: bool) {
        self.element
            .write()
            .expect("form element lock poisoned")
            .toggle_class(class, on);
    }

    /// The scheduler used for deferred change signals.
    pub const fn scheduler(&self) -> &Arc<FrameScheduler> {
        &self.scheduler
    }

    /// Runs pending change signals now.
    pub fn flush_frame(&self) -> usize {
        self.scheduler.flush()
    }

    /// Starts flushing change signals every frame interval.
    pub fn start_frame_loop(&self) -> JoinHandle<()> {
        self.scheduler.spawn_frame_loop(self.config.frame_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldConfig;
    use crate::field::ChangeEvent;
    use crate::fields::{PasswordConfirmField, PasswordField, TextField};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn form() -> Arc<Form> {
        Form::new(FormConfig::from_settings("test", &Settings::default()))
    }

    fn text(config: FieldConfig) -> Arc<dyn Field> {
        Arc::new(TextField::new(config).unwrap())
    }

    #[test]
    fn test_register_binds_back_reference() {
        let form = form();
        let field = text(FieldConfig::new("name"));
        form.register_field(field.clone());
        let owner = field.core().form().unwrap();
        assert!(Arc::ptr_eq(&owner, &form));
    }

    #[test]
    fn test_duplicate_id_replaces_in_place() {
        let form = form();
        form.register_field(text(FieldConfig::new("a").value("first")));
        form.register_field(text(FieldConfig::new("b")));
        form.register_field(text(FieldConfig::new("a").value("second")));
        assert_eq!(form.field_ids(), vec!["a", "b"]);
        assert_eq!(form.values().get("a"), Some(&json!("second")));
    }

    #[test]
    fn test_values_in_registration_order() {
        let form = form();
        for id in ["z", "a", "m"] {
            form.register_field(text(FieldConfig::new(id).value(id)));
        }
        let keys: Vec<_> = form.values().keys().cloned().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_values_skip_fields_without_output() {
        let form = form();
        form.register_field(Arc::new(PasswordField::new(FieldConfig::new("password")).unwrap()));
        form.register_field(Arc::new(
            PasswordConfirmField::new(FieldConfig::new("confirm"), "password").unwrap(),
        ));
        let values = form.values();
        assert!(values.contains_key("password"));
        assert!(!values.contains_key("confirm"));
    }

    #[test]
    fn test_set_values_ignores_unknown_keys() {
        let form = form();
        form.register_field(text(FieldConfig::new("a")));
        let mut input = Values::new();
        input.insert("a".into(), json!("x"));
        input.insert("ghost".into(), json!("y"));
        form.set_values(&input);
        let values = form.values();
        assert_eq!(values.get("a"), Some(&json!("x")));
        assert!(!values.contains_key("ghost"));
    }

    #[test]
    fn test_validate_visits_every_field() {
        let form = form();
        let calls = Arc::new(AtomicUsize::new(0));
        for id in ["a", "b", "c"] {
            let c = calls.clone();
            form.register_field(text(FieldConfig::new(id).required(true).validation(move |_, _| {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })));
        }
        assert!(!form.validate());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(form.element().has_class(classes::FORM_INVALID));
        assert_eq!(form.is_valid(), Some(false));
        assert_eq!(form.last_values().len(), 3);
    }

    #[tokio::test]
    async fn test_submit_invalid_focuses_first_error() {
        let form = form();
        form.register_field(text(FieldConfig::new("ok").value("fine")));
        form.register_field(text(FieldConfig::new("bad").required(true)));
        form.register_field(text(FieldConfig::new("worse").required(true)));
        let outcome = form.submit().await;
        assert_eq!(
            outcome,
            SubmitOutcome::Invalid {
                focused: Some("bad".into())
            }
        );
    }

    #[tokio::test]
    async fn test_handle_submit_prevents_default() {
        let form = form();
        let mut event = SubmitEvent::new();
        assert_eq!(form.handle_submit(&mut event).await, SubmitOutcome::Unhandled);
        assert!(event.is_default_prevented());
    }

    #[tokio::test]
    async fn test_async_handler_sets_submitting_marker() {
        let form = form();
        form.register_field(text(FieldConfig::new("a").value("x")));
        let (tx, rx) = tokio::sync::oneshot::channel::<bool>();
        let rx = Arc::new(Mutex::new(Some(rx)));
        form.on_submit(move |_| {
            let rx = rx.lock().unwrap().take().unwrap();
            SubmitReturn::pending(async move { rx.await.unwrap_or(false) })
        });

        let submitting = {
            let form = form.clone();
            tokio::spawn(async move { form.submit().await })
        };
        tokio::task::yield_now().await;
        while !form.element().has_class(classes::FORM_SUBMITTING) {
            tokio::task::yield_now().await;
        }
        tx.send(true).unwrap();
        assert_eq!(
            submitting.await.unwrap(),
            SubmitOutcome::Submitted { success: true }
        );
        let el = form.element();
        assert!(!el.has_class(classes::FORM_SUBMITTING));
        assert!(el.has_class(classes::FORM_SUCCESS));
    }

    #[tokio::test]
    async fn test_mount_waits_for_ready() {
        let form = form();
        let field = text(FieldConfig::new("late"));
        let mounting = {
            let form = form.clone();
            let field = field.clone();
            tokio::spawn(async move { form.mount(field).await })
        };
        tokio::task::yield_now().await;
        assert!(!field.core().has_rendered());
        form.mark_ready();
        mounting.await.unwrap();
        assert!(field.core().has_rendered());
        assert!(field.core().element().is_attached());
    }

    #[test]
    fn test_change_signal_coalesces_and_requires_attachment() {
        let form = form();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        let field = text(FieldConfig::new("q").on_change(move |e: &ChangeEvent| {
            s.lock().unwrap().push(e.value.clone());
        }));
        form.register_field(field.clone());
        form.attach();

        field.handle_input(json!("a"));
        field.handle_input(json!("ab"));
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(form.flush_frame(), 1);
        assert_eq!(*seen.lock().unwrap(), vec![json!("ab")]);

        field.handle_input(json!("abc"));
        form.detach();
        form.flush_frame();
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_reset_clears_markers() {
        let form = form();
        form.register_field(text(FieldConfig::new("a").required(true)));
        assert!(!form.validate());
        form.reset();
        assert!(!form.element().has_class(classes::FORM_INVALID));
        assert!(form.fields()[0].error_messages().is_empty());
        assert_eq!(form.is_valid(), None);
    }
}
