//! Named filter registry.
//!
//! Filters let code outside a script override a value the script computed,
//! without touching the script. Each filter name holds a list of callbacks; the
//! value is threaded through them in priority order, each one receiving the
//! previous result.
//!
//! # Example
//!
//! ```
//! use scriptlet_host::filter::FilterRegistry;
//!
//! let filters = FilterRegistry::new();
//! filters
//!     .add_filter("script.conditional", "never-on-legacy", 10, |value, handle| {
//!         value && handle != "legacy-js"
//!     })
//!     .unwrap();
//!
//! assert!(filters.apply("script.conditional", true, "widget-js"));
//! assert!(!filters.apply("script.conditional", true, "legacy-js"));
//! // Unknown filters pass the value through.
//! assert!(!filters.apply("unknown", false, "widget-js"));
//! ```

use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;
use thiserror::Error;

/// A boolean filter callback. Receives the current value and the script handle.
pub type BoolFilter = Arc<dyn Fn(bool, &str) -> bool + Send + Sync>;

/// Errors that can occur during filter registration.
#[derive(Debug, Clone, Error)]
pub enum FilterRegistrationError {
    /// A callback with this name already exists on the filter.
    #[error("filter callback '{name}' already registered for '{filter}'")]
    DuplicateName {
        /// The filter the duplicate was found on.
        filter: String,
        /// The duplicate callback name.
        name: String,
    },
}

struct FilterEntry {
    name: String,
    priority: i32,
    callback: BoolFilter,
}

/// Registry of named boolean filters.
///
/// Callbacks run in ascending priority; equal priorities run in registration
/// order.
#[derive(Default)]
pub struct FilterRegistry {
    filters: RwLock<HashMap<String, Vec<FilterEntry>>>,
}

impl FilterRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            filters: RwLock::new(HashMap::new()),
        }
    }

    /// Adds a named callback to a filter.
    ///
    /// # Errors
    ///
    /// Returns [`FilterRegistrationError::DuplicateName`] if `name` is already
    /// registered on `filter`.
    pub fn add_filter<F>(
        &self,
        filter: impl Into<String>,
        name: impl Into<String>,
        priority: i32,
        callback: F,
    ) -> Result<&Self, FilterRegistrationError>
    where
        F: Fn(bool, &str) -> bool + Send + Sync + 'static,
    {
        let filter = filter.into();
        let name = name.into();

        let mut filters = self.filters.write();
        let entries = filters.entry(filter.clone()).or_default();

        if entries.iter().any(|entry| entry.name == name) {
            return Err(FilterRegistrationError::DuplicateName { filter, name });
        }

        let position = entries.partition_point(|entry| entry.priority <= priority);
        entries.insert(
            position,
            FilterEntry {
                name,
                priority,
                callback: Arc::new(callback),
            },
        );
        Ok(self)
    }

    /// Removes a named callback. Returns true if it was present.
    pub fn remove_filter(&self, filter: &str, name: &str) -> bool {
        let mut filters = self.filters.write();
        let Some(entries) = filters.get_mut(filter) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|entry| entry.name != name);
        before != entries.len()
    }

    /// Threads `value` through every callback on `filter`.
    ///
    /// Runs on a snapshot taken before the first callback, so callbacks may
    /// add or remove filters; the change applies from the next call.
    #[must_use]
    pub fn apply(&self, filter: &str, value: bool, handle: &str) -> bool {
        let callbacks: Vec<BoolFilter> = match self.filters.read().get(filter) {
            Some(entries) => entries
                .iter()
                .map(|entry| Arc::clone(&entry.callback))
                .collect(),
            None => return value,
        };
        callbacks
            .iter()
            .fold(value, |acc, callback| callback(acc, handle))
    }

    /// Returns the number of callbacks on `filter`.
    #[must_use]
    pub fn filter_count(&self, filter: &str) -> usize {
        self.filters.read().get(filter).map_or(0, Vec::len)
    }

    /// Checks if a callback with the given name exists on `filter`.
    #[must_use]
    pub fn contains_filter(&self, filter: &str, name: &str) -> bool {
        self.filters
            .read()
            .get(filter)
            .is_some_and(|entries| entries.iter().any(|entry| entry.name == name))
    }
}

impl core::fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let filters = self.filters.read();
        let mut names: Vec<&str> = filters.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("FilterRegistry")
            .field("filters", &names)
            .finish()
    }
}
