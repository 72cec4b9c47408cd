//! Single-document bindings.

use super::shared::{Binding, LiveTarget};
use super::{BindingOptions, BindingStats, ObservableResult};
use crate::error::Result;
use crate::query::validate_collection;
use crate::store::{DocumentStore, EventSink, ListenerHandle};
use crate::types::{Document, DocumentKey, Generation};
use crossbeam_channel::Receiver;
use std::sync::Arc;

struct DocumentTarget {
    key: DocumentKey,
}

impl LiveTarget for DocumentTarget {
    type Identity = DocumentKey;
    type Value = Option<Document>;

    fn identity(&self) -> &DocumentKey {
        &self.key
    }

    fn open(&self, store: &dyn DocumentStore, sink: EventSink<Option<Document>>) -> ListenerHandle {
        store.subscribe_document(&self.key, sink)
    }
}

/// Live view of one document.
///
/// `items` is `None` both before the first snapshot and when the document
/// does not exist. Tell them apart with `is_loading`; a failed read shows up
/// in `error`, never as `None` alone.
pub struct DocumentBinding {
    inner: Binding<DocumentTarget>,
}

impl DocumentBinding {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_options(store, BindingOptions::default())
    }

    pub fn with_options(store: Arc<dyn DocumentStore>, options: BindingOptions) -> Self {
        Self {
            inner: Binding::new(store, options, "document"),
        }
    }

    /// Observe `collection/document_id`.
    ///
    /// An empty `document_id` opens nothing and yields an idle, empty
    /// result right away; any previous listener is cancelled. Callers
    /// often build the key before a dependent id is known.
    pub fn observe(
        &mut self,
        collection: &str,
        document_id: &str,
    ) -> Result<ObservableResult<Option<Document>>> {
        if document_id.is_empty() {
            self.inner.activate(None);
            return Ok(self.inner.result());
        }

        validate_collection(collection)?;
        let key = DocumentKey::new(collection, document_id);
        if !self.inner.is_current(&key) {
            self.inner.activate(Some(DocumentTarget { key }));
        }
        Ok(self.inner.result())
    }

    /// Reopen the current document, keeping the last value while loading.
    pub fn resubscribe(&mut self) {
        self.inner.resubscribe();
    }

    /// Cancel the listener. Safe to call any number of times.
    pub fn teardown(&mut self) {
        self.inner.teardown();
    }

    pub fn result(&self) -> ObservableResult<Option<Document>> {
        self.inner.result()
    }

    pub fn key(&self) -> Option<&DocumentKey> {
        self.inner.identity()
    }

    pub fn generation(&self) -> Generation {
        self.inner.generation()
    }

    pub fn is_active(&self) -> bool {
        self.inner.is_active()
    }

    pub fn stats(&self) -> BindingStats {
        self.inner.stats()
    }

    pub fn changes(&self) -> Receiver<Generation> {
        self.inner.changes()
    }
}
