//! Scriptable store that records every call.

use super::{DocumentStore, EventSink, ListenerEvent, ListenerHandle};
use crate::query::QueryDescriptor;
use crate::types::{Document, DocumentKey, ListenerId};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// A call made against a [`RecordingStore`].
#[derive(Clone, Debug, PartialEq)]
pub enum StoreCall {
    SubscribeCollection {
        listener: ListenerId,
        collection: String,
        descriptor: QueryDescriptor,
    },
    SubscribeDocument {
        listener: ListenerId,
        key: DocumentKey,
    },
    Cancel {
        listener: ListenerId,
    },
}

#[derive(Default)]
struct Recorded {
    calls: Vec<StoreCall>,
    collection_sinks: HashMap<ListenerId, EventSink<Vec<Document>>>,
    document_sinks: HashMap<ListenerId, EventSink<Option<Document>>>,
    cancelled: HashSet<ListenerId>,
    next_id: u64,
}

/// Store that never delivers on its own.
///
/// Every subscribe and cancel is logged in call order. Events are pushed by
/// the caller through [`RecordingStore::deliver_collection`] and
/// [`RecordingStore::deliver_document`], which also reach cancelled
/// listeners, so late in-flight callbacks can be replayed on demand.
#[derive(Clone, Default)]
pub struct RecordingStore {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All calls so far, in order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.inner.lock().calls.clone()
    }

    pub fn subscribe_count(&self) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| !matches!(c, StoreCall::Cancel { .. }))
            .count()
    }

    pub fn cancel_count(&self) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, StoreCall::Cancel { .. }))
            .count()
    }

    /// Id of the most recently opened listener.
    pub fn last_listener(&self) -> Option<ListenerId> {
        self.inner.lock().calls.iter().rev().find_map(|c| match c {
            StoreCall::SubscribeCollection { listener, .. }
            | StoreCall::SubscribeDocument { listener, .. } => Some(*listener),
            StoreCall::Cancel { .. } => None,
        })
    }

    pub fn is_cancelled(&self, listener: ListenerId) -> bool {
        self.inner.lock().cancelled.contains(&listener)
    }

    /// Number of listeners opened and not yet cancelled.
    pub fn live_count(&self) -> usize {
        let rec = self.inner.lock();
        rec.collection_sinks
            .keys()
            .chain(rec.document_sinks.keys())
            .filter(|id| !rec.cancelled.contains(id))
            .count()
    }

    /// Push an event to a collection listener. Returns false for an unknown id.
    pub fn deliver_collection(&self, listener: ListenerId, event: ListenerEvent<Vec<Document>>) -> bool {
        // Clone the sink out so the callback runs without the lock held.
        let sink = self.inner.lock().collection_sinks.get(&listener).cloned();
        match sink {
            Some(sink) => {
                sink(event);
                true
            }
            None => false,
        }
    }

    /// Push an event to a document listener. Returns false for an unknown id.
    pub fn deliver_document(&self, listener: ListenerId, event: ListenerEvent<Option<Document>>) -> bool {
        let sink = self.inner.lock().document_sinks.get(&listener).cloned();
        match sink {
            Some(sink) => {
                sink(event);
                true
            }
            None => false,
        }
    }

    fn handle(&self, id: ListenerId) -> ListenerHandle {
        let inner = self.inner.clone();
        ListenerHandle::new(id, move || {
            let mut rec = inner.lock();
            rec.cancelled.insert(id);
            rec.calls.push(StoreCall::Cancel { listener: id });
        })
    }

    fn next_id(rec: &mut Recorded) -> ListenerId {
        rec.next_id += 1;
        ListenerId(rec.next_id)
    }
}

impl DocumentStore for RecordingStore {
    fn subscribe_collection(
        &self,
        collection: &str,
        descriptor: &QueryDescriptor,
        sink: EventSink<Vec<Document>>,
    ) -> ListenerHandle {
        let id = {
            let mut rec = self.inner.lock();
            let id = Self::next_id(&mut rec);
            rec.calls.push(StoreCall::SubscribeCollection {
                listener: id,
                collection: collection.to_string(),
                descriptor: descriptor.clone(),
            });
            rec.collection_sinks.insert(id, sink);
            id
        };
        self.handle(id)
    }

    fn subscribe_document(
        &self,
        key: &DocumentKey,
        sink: EventSink<Option<Document>>,
    ) -> ListenerHandle {
        let id = {
            let mut rec = self.inner.lock();
            let id = Self::next_id(&mut rec);
            rec.calls.push(StoreCall::SubscribeDocument {
                listener: id,
                key: key.clone(),
            });
            rec.document_sinks.insert(id, sink);
            id
        };
        self.handle(id)
    }
}
