//! The remote document store contract.
//!
//! A store pushes a full snapshot on subscribe and on every later change,
//! or a terminal error, through an [`EventSink`]. Subscribing hands back a
//! [`ListenerHandle`], the only way to stop the listener.
//!
//! Stores are not required to make cancellation synchronous: a snapshot that
//! was already in flight may still reach the sink after
//! [`ListenerHandle::cancel`] returns. Bindings guard against this on their
//! side.

mod memory;
mod recording;

pub use memory::MemoryStore;
pub use recording::{RecordingStore, StoreCall};

use crate::error::ListenerError;
use crate::query::QueryDescriptor;
use crate::types::{Document, DocumentKey, ListenerId};
use std::fmt;
use std::sync::Arc;

/// Event pushed by a store listener.
#[derive(Clone, Debug, PartialEq)]
pub enum ListenerEvent<T> {
    /// Full current value: an ordered result set, or a document-or-absent.
    Snapshot(T),
    /// Terminal failure. No further events follow.
    Error(ListenerError),
}

/// Callback receiving listener events.
pub type EventSink<T> = Arc<dyn Fn(ListenerEvent<T>) + Send + Sync>;

/// A push-based document store.
pub trait DocumentStore: Send + Sync {
    /// Listen to the documents of `collection` matching `descriptor`.
    fn subscribe_collection(
        &self,
        collection: &str,
        descriptor: &QueryDescriptor,
        sink: EventSink<Vec<Document>>,
    ) -> ListenerHandle;

    /// Listen to a single document. Absence is delivered as `Snapshot(None)`.
    fn subscribe_document(
        &self,
        key: &DocumentKey,
        sink: EventSink<Option<Document>>,
    ) -> ListenerHandle;
}

/// Capability to stop one store listener.
///
/// Cancelling is idempotent; the underlying unsubscribe runs at most once.
/// Dropping the handle cancels it.
pub struct ListenerHandle {
    id: ListenerId,
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl ListenerHandle {
    pub fn new(id: ListenerId, cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            id,
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_none()
    }

    /// Stop the listener.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("id", &self.id)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
