//! Live bindings: one consumer's attachment to a live query.
//!
//! A binding owns at most one store listener at a time and exposes its
//! latest value as an [`ObservableResult`]. Call `observe` on every
//! evaluation with whatever the consumer currently wants; the binding only
//! touches the store when the resolved identity actually changes.
//!
//! Every listener is opened under a fresh [`Generation`]. Callbacks carry the
//! generation they were opened with, and anything that arrives after the
//! binding has moved on is dropped without touching the result.
//!
//! # Example
//!
//! ```ignore
//! let store = Arc::new(MemoryStore::new());
//! let mut binding = CollectionBinding::new(store.clone());
//!
//! let jobs = QueryDescriptor::new().equals("category", "jobs");
//! let result = binding.observe("listings", &jobs)?;
//! assert!(result.is_loading);
//!
//! store.pump();
//! let result = binding.result();
//! println!("{} listings", result.items.len());
//! ```
//!
//! [`Generation`]: crate::types::Generation

mod collection;
mod document;
mod shared;

pub use collection::CollectionBinding;
pub use document::DocumentBinding;

use crate::error::{BindingError, ListenerError, Result};
use serde::Serialize;

/// Value exposed to the view.
///
/// `is_loading` is true from the moment a listener opens until its first
/// snapshot or error. An `error` never clears `items`: the last good data
/// stays visible next to the failure.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ObservableResult<T> {
    pub items: T,
    pub is_loading: bool,
    pub error: Option<ListenerError>,
}

impl<T: Default> Default for ObservableResult<T> {
    fn default() -> Self {
        Self {
            items: T::default(),
            is_loading: false,
            error: None,
        }
    }
}

impl<T> ObservableResult<T> {
    /// Loaded without error.
    pub fn is_ready(&self) -> bool {
        !self.is_loading && self.error.is_none()
    }

    /// Items, or the listener error for callers that want `?`.
    pub fn into_result(self) -> Result<T> {
        match self.error {
            Some(error) => Err(BindingError::Listener(error)),
            None => Ok(self.items),
        }
    }
}

/// Binding settings.
#[derive(Clone, Debug)]
pub struct BindingOptions {
    /// Name used in log events. Defaults to the binding kind.
    pub label: Option<String>,

    /// Capacity of the change-notification channel.
    /// Default: 16
    pub change_buffer: usize,
}

impl Default for BindingOptions {
    fn default() -> Self {
        Self {
            label: None,
            change_buffer: 16,
        }
    }
}

impl BindingOptions {
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Counters for one binding.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BindingStats {
    pub subscriptions_opened: u64,
    pub cancellations: u64,
    pub snapshots_applied: u64,
    pub errors: u64,
    /// Callbacks dropped because their generation was outdated.
    pub stale_discarded: u64,
}
