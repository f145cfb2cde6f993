//! Option sets, static or fetched.
//!
//! An [`OptionSet`] holds a field's options in display order with an index
//! by value. Options either come from the configuration or from an
//! [`OptionsFetcher`] called with `(query, page, field_id)`.
//!
//! Fetches are numbered. When two overlap, only the most recently started
//! one may replace the options; an older response arriving late is
//! discarded. A failed fetch clears the loading state and returns the error
//! to the caller.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use formwork_core::{FormError, FormResult, SETTINGS};

use crate::element::classes;
use crate::field::Field;
use crate::render::{TemplateVars, EMPTY_OPTIONS_TEMPLATE, OPTION_TEMPLATE, PRELOADER_TEMPLATE};
use crate::value::{to_text, FieldOption, Value};

/// Loads options for a field.
#[async_trait]
pub trait OptionsFetcher: Send + Sync {
    /// Returns the options matching `query` on `page`.
    async fn fetch(&self, query: &str, page: usize, field_id: &str)
        -> Result<Vec<FieldOption>, String>;
}

#[async_trait]
impl<F, Fut> OptionsFetcher for F
where
    F: Fn(String, usize, String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<FieldOption>, String>> + Send,
{
    async fn fetch(
        &self,
        query: &str,
        page: usize,
        field_id: &str,
    ) -> Result<Vec<FieldOption>, String> {
        self(query.to_string(), page, field_id.to_string()).await
    }
}

#[derive(Debug, Default)]
struct OptionState {
    options: Vec<FieldOption>,
    by_value: HashMap<String, usize>,
    is_loading: bool,
    fetch_query: Option<String>,
    page: usize,
}

/// A field's options and fetch bookkeeping.
pub struct OptionSet {
    state: RwLock<OptionState>,
    fetcher: RwLock<Option<Arc<dyn OptionsFetcher>>>,
    generation: AtomicU64,
    search_generation: AtomicU64,
    search_debounce: Duration,
    fetch_timeout: Option<Duration>,
    empty_text: Option<String>,
}

impl std::fmt::Debug for OptionSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionSet")
            .field("state", &self.state)
            .field("generation", &self.generation)
            .field("search_debounce", &self.search_debounce)
            .field("fetch_timeout", &self.fetch_timeout)
            .finish_non_exhaustive()
    }
}

impl Default for OptionSet {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl OptionSet {
    /// Creates a set holding `options`, with timing taken from the global
    /// settings.
    pub fn new(options: Vec<FieldOption>) -> Self {
        let settings = SETTINGS.get();
        let set = Self {
            state: RwLock::new(OptionState::default()),
            fetcher: RwLock::new(None),
            generation: AtomicU64::new(0),
            search_generation: AtomicU64::new(0),
            search_debounce: settings.search_debounce(),
            fetch_timeout: settings.fetch_timeout(),
            empty_text: None,
        };
        set.replace(options);
        set
    }

    /// Sets the fetcher.
    #[must_use]
    pub fn with_fetcher(self, fetcher: Arc<dyn OptionsFetcher>) -> Self {
        self.set_fetcher(fetcher);
        self
    }

    /// Sets the search debounce window.
    #[must_use]
    pub const fn with_search_debounce(mut self, debounce: Duration) -> Self {
        self.search_debounce = debounce;
        self
    }

    /// Sets the fetch timeout.
    #[must_use]
    pub const fn with_fetch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Sets the text shown in place of an empty option list.
    #[must_use]
    pub fn with_empty_text(mut self, text: impl Into<String>) -> Self {
        self.empty_text = Some(text.into());
        self
    }

    /// Replaces the options and rebuilds the index. When two options share
    /// a value, the index points at the later one.
    pub fn replace(&self, options: Vec<FieldOption>) {
        let by_value = options
            .iter()
            .enumerate()
            .map(|(i, option)| (option.key(), i))
            .collect();
        let mut state = self.state.write().expect("option state lock poisoned");
        state.options = options;
        state.by_value = by_value;
    }

    /// The options in display order.
    pub fn options(&self) -> Vec<FieldOption> {
        self.state.read().expect("option state lock poisoned").options.clone()
    }

    /// The option with `value`, if any.
    pub fn get(&self, value: &Value) -> Option<FieldOption> {
        let state = self.state.read().expect("option state lock poisoned");
        state
            .by_value
            .get(&to_text(value))
            .and_then(|&i| state.options.get(i))
            .cloned()
    }

    /// The option values in display order.
    pub fn values(&self) -> Vec<Value> {
        self.state
            .read()
            .expect("option state lock poisoned")
            .options
            .iter()
            .map(|o| o.value.clone())
            .collect()
    }

    /// Whether a fetch is in flight.
    pub fn is_loading(&self) -> bool {
        self.state.read().expect("option state lock poisoned").is_loading
    }

    /// The query of the most recent fetch.
    pub fn fetch_query(&self) -> Option<String> {
        self.state.read().expect("option state lock poisoned").fetch_query.clone()
    }

    /// The page of the most recent fetch.
    pub fn page(&self) -> usize {
        self.state.read().expect("option state lock poisoned").page
    }

    /// Sets the fetcher.
    pub fn set_fetcher(&self, fetcher: Arc<dyn OptionsFetcher>) {
        *self.fetcher.write().expect("fetcher lock poisoned") = Some(fetcher);
    }

    /// The fetcher, if one is set.
    pub fn fetcher(&self) -> Option<Arc<dyn OptionsFetcher>> {
        self.fetcher.read().expect("fetcher lock poisoned").clone()
    }

    /// The search debounce window.
    pub const fn search_debounce(&self) -> Duration {
        self.search_debounce
    }

    /// The fetch timeout.
    pub const fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout
    }

    /// The custom empty-list text.
    pub fn empty_text(&self) -> Option<&str> {
        self.empty_text.as_deref()
    }

    /// Starts a fetch and returns its ticket.
    fn begin_fetch(&self, query: &str, page: usize) -> u64 {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let mut state = self.state.write().expect("option state lock poisoned");
        state.is_loading = true;
        state.fetch_query = Some(query.to_string());
        state.page = page;
        ticket
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket
    }

    fn finish_fetch(&self) {
        self.state.write().expect("option state lock poisoned").is_loading = false;
    }

    fn next_search(&self) -> u64 {
        self.search_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current_search(&self, ticket: u64) -> bool {
        self.search_generation.load(Ordering::SeqCst) == ticket
    }
}

/// A field with an option set.
pub trait HasOptions: Field {
    /// The field's options.
    fn option_set(&self) -> &OptionSet;

    /// The options in display order.
    fn options(&self) -> Vec<FieldOption> {
        self.option_set().options()
    }

    /// The option with `value`, if any.
    fn option(&self, value: &Value) -> Option<FieldOption> {
        self.option_set().get(value)
    }

    /// Whether `option` is part of the current value.
    fn is_selected(&self, option: &FieldOption) -> bool {
        match self.value() {
            Value::Array(items) => items.contains(&option.value),
            value => to_text(&value) == option.key(),
        }
    }

    /// Replaces the options. With `update`, the element is refreshed.
    fn set_options(&self, options: Vec<FieldOption>, update: bool) {
        debug!(field = %self.id(), count = options.len(), "Setting options");
        self.option_set().replace(options);
        if update {
            self.options_replaced();
            self.render_options();
        }
    }

    /// Runs after options are replaced with `update`, before the refresh.
    fn options_replaced(&self) {}

    /// The attribute marking a selected entry in [`HasOptions::options_markup`].
    fn selected_attribute(&self) -> &'static str {
        "checked"
    }

    /// Markup for the option list: the preloader while loading, the empty
    /// placeholder for no options, the list otherwise.
    fn options_markup(&self) -> String {
        let core = self.core();
        let set = self.option_set();
        if set.is_loading() {
            let vars = TemplateVars::new().text("text", core.text("options.loading", &[]));
            return core.render_template(PRELOADER_TEMPLATE, &vars);
        }
        let options = set.options();
        if options.is_empty() {
            let text = set
                .empty_text()
                .map_or_else(|| core.text("options.empty", &[]), str::to_string);
            let vars = TemplateVars::new().text("text", text);
            return core.render_template(EMPTY_OPTIONS_TEMPLATE, &vars);
        }
        options
            .iter()
            .map(|option| {
                let selected = if self.is_selected(option) {
                    format!(" {}", self.selected_attribute())
                } else {
                    String::new()
                };
                let vars = TemplateVars::new()
                    .text("value", option.key())
                    .text("label", option.label.clone())
                    .safe("selected", selected);
                core.render_template(OPTION_TEMPLATE, &vars)
            })
            .collect()
    }

    /// Refreshes the element with the current options, if rendered.
    fn render_options(&self) {
        let loading = self.option_set().is_loading();
        let core = self.core();
        core.with_element(|el| el.toggle_class(classes::FIELD_LOADING, loading));
        if core.has_rendered() {
            self.render();
        }
    }

    /// Whether options are loading.
    fn is_loading_options(&self) -> bool {
        self.option_set().is_loading()
    }
}

/// A field whose options come from an [`OptionsFetcher`].
#[async_trait]
pub trait HasAsyncFetch: HasOptions {
    /// Sets the fetcher.
    fn set_fetch_options(&self, fetcher: Arc<dyn OptionsFetcher>) {
        self.option_set().set_fetcher(fetcher);
    }

    /// Fetches the first page of options for `query`.
    ///
    /// Returns `Ok(true)` when the options were replaced and `Ok(false)`
    /// when the response was superseded by a newer fetch.
    async fn fetch_options(&self, query: &str) -> FormResult<bool> {
        self.fetch_options_page(query, 0).await
    }

    /// Fetches one page of options for `query`.
    async fn fetch_options_page(&self, query: &str, page: usize) -> FormResult<bool> {
        let set = self.option_set();
        let Some(fetcher) = set.fetcher() else {
            return Err(FormError::ConfigurationError(format!(
                "field '{}' has no options fetcher",
                self.id()
            )));
        };

        let ticket = set.begin_fetch(query, page);
        self.render_options();

        let field_id = self.id().to_string();
        let fetch = fetcher.fetch(query, page, &field_id);
        let result = match set.fetch_timeout() {
            Some(timeout) => match tokio::time::timeout(timeout, fetch).await {
                Ok(result) => result.map_err(|message| FormError::FetchFailed {
                    field: field_id.clone(),
                    message,
                }),
                Err(_) => Err(FormError::FetchTimedOut {
                    field: field_id.clone(),
                    millis: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                }),
            },
            None => fetch.await.map_err(|message| FormError::FetchFailed {
                field: field_id.clone(),
                message,
            }),
        };

        if !set.is_current(ticket) {
            warn!(field = %field_id, query, "Discarding superseded options response");
            return Ok(false);
        }
        set.finish_fetch();

        match result {
            Ok(options) => {
                self.on_options_fetched(options);
                Ok(true)
            }
            Err(err) => {
                self.render_options();
                Err(err)
            }
        }
    }

    /// Receives a fetched option list. Replaces the options by default.
    fn on_options_fetched(&self, options: Vec<FieldOption>) {
        self.set_options(options, true);
    }

    /// Fetches for `query` after the search debounce window, unless another
    /// search starts meanwhile. Returns `Ok(false)` when superseded.
    async fn search(&self, query: &str) -> FormResult<bool> {
        let set = self.option_set();
        let ticket = set.next_search();
        tokio::time::sleep(set.search_debounce()).await;
        if !set.is_current_search(ticket) {
            debug!(field = %self.id(), query, "Search superseded");
            return Ok(false);
        }
        self.fetch_options(query).await
    }
}
