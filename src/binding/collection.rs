//! Collection bindings.

use super::shared::{Binding, LiveTarget};
use super::{BindingOptions, BindingStats, ObservableResult};
use crate::error::Result;
use crate::query::{resolve, QueryDescriptor, QueryIdentity};
use crate::store::{DocumentStore, EventSink, ListenerHandle};
use crate::types::{Document, Generation};
use crossbeam_channel::Receiver;
use std::sync::Arc;

struct CollectionTarget {
    identity: QueryIdentity,
    descriptor: QueryDescriptor,
}

impl LiveTarget for CollectionTarget {
    type Identity = QueryIdentity;
    type Value = Vec<Document>;

    fn identity(&self) -> &QueryIdentity {
        &self.identity
    }

    fn open(&self, store: &dyn DocumentStore, sink: EventSink<Vec<Document>>) -> ListenerHandle {
        store.subscribe_collection(self.identity.collection(), &self.descriptor, sink)
    }
}

/// Live view of the documents in a collection matching a descriptor.
///
/// Each snapshot replaces `items` wholesale, in store order.
pub struct CollectionBinding {
    inner: Binding<CollectionTarget>,
}

impl CollectionBinding {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_options(store, BindingOptions::default())
    }

    pub fn with_options(store: Arc<dyn DocumentStore>, options: BindingOptions) -> Self {
        Self {
            inner: Binding::new(store, options, "collection"),
        }
    }

    /// Observe `collection` filtered by `descriptor`.
    ///
    /// Safe to call on every evaluation with a freshly built descriptor:
    /// a descriptor with the same content keeps the open listener. A
    /// malformed descriptor is rejected before any store call and leaves the
    /// current listener as it was.
    pub fn observe(
        &mut self,
        collection: &str,
        descriptor: &QueryDescriptor,
    ) -> Result<ObservableResult<Vec<Document>>> {
        let identity = resolve(collection, descriptor)?;
        if !self.inner.is_current(&identity) {
            self.inner.activate(Some(CollectionTarget {
                identity,
                descriptor: descriptor.clone(),
            }));
        }
        Ok(self.inner.result())
    }

    /// Reopen the current query, keeping the last items while loading.
    pub fn resubscribe(&mut self) {
        self.inner.resubscribe();
    }

    /// Cancel the listener. Safe to call any number of times.
    pub fn teardown(&mut self) {
        self.inner.teardown();
    }

    pub fn result(&self) -> ObservableResult<Vec<Document>> {
        self.inner.result()
    }

    pub fn identity(&self) -> Option<&QueryIdentity> {
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

    /// Receiver woken with the generation whenever the result changes.
    pub fn changes(&self) -> Receiver<Generation> {
        self.inner.changes()
    }
}
