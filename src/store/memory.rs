//! In-process document store with queued snapshot delivery.

use super::{DocumentStore, EventSink, ListenerEvent, ListenerHandle};
use crate::error::ListenerError;
use crate::query::{self, QueryDescriptor};
use crate::types::{Document, DocumentKey, ListenerId};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

type Delivery = Box<dyn FnOnce() + Send>;

enum Listener {
    Collection {
        collection: String,
        descriptor: QueryDescriptor,
        sink: EventSink<Vec<Document>>,
    },
    Document {
        key: DocumentKey,
        sink: EventSink<Option<Document>>,
    },
}

impl Listener {
    fn collection(&self) -> &str {
        match self {
            Listener::Collection { collection, .. } => collection,
            Listener::Document { key, .. } => &key.collection,
        }
    }
}

struct Inner {
    /// collection -> (id -> document)
    collections: RwLock<HashMap<String, BTreeMap<String, Document>>>,
    listeners: RwLock<HashMap<ListenerId, Listener>>,
    /// Collections whose listeners are rejected.
    denied: RwLock<HashMap<String, ListenerError>>,
    next_id: AtomicU64,
    queue_tx: Sender<Delivery>,
    queue_rx: Receiver<Delivery>,
}

/// Document store held in memory.
///
/// Writes do not call listeners directly. Each affected listener gets a
/// fresh snapshot queued, and [`MemoryStore::pump`] runs the queue, the way
/// an event loop would run store callbacks. Cancelling a listener stops
/// future snapshots but leaves already-queued ones in place.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (queue_tx, queue_rx) = unbounded();
        Self {
            inner: Arc::new(Inner {
                collections: RwLock::new(HashMap::new()),
                listeners: RwLock::new(HashMap::new()),
                denied: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                queue_tx,
                queue_rx,
            }),
        }
    }

    /// Insert or replace a document and notify affected listeners.
    pub fn put(&self, collection: &str, doc: Document) {
        self.inner
            .collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .insert(doc.id.clone(), doc);
        self.notify(collection);
    }

    /// Delete a document. Returns false if it did not exist.
    pub fn delete(&self, collection: &str, id: &str) -> bool {
        let removed = self
            .inner
            .collections
            .write()
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .is_some();
        if removed {
            self.notify(collection);
        }
        removed
    }

    /// Read a document without subscribing.
    pub fn document(&self, key: &DocumentKey) -> Option<Document> {
        self.inner
            .collections
            .read()
            .get(&key.collection)
            .and_then(|docs| docs.get(&key.id))
            .cloned()
    }

    /// Reject every listener on `collection`, current and future.
    ///
    /// Current listeners receive `error` as their terminal event.
    pub fn deny(&self, collection: &str, error: ListenerError) {
        self.inner
            .denied
            .write()
            .insert(collection.to_string(), error.clone());

        let mut listeners = self.inner.listeners.write();
        let failed: Vec<ListenerId> = listeners
            .iter()
            .filter(|(_, l)| l.collection() == collection)
            .map(|(id, _)| *id)
            .collect();

        for id in failed {
            if let Some(listener) = listeners.remove(&id) {
                debug!(listener = id.0, collection, "listener rejected");
                self.enqueue_error(&listener, error.clone());
            }
        }
    }

    /// Lift a rejection set by [`MemoryStore::deny`].
    pub fn allow(&self, collection: &str) {
        self.inner.denied.write().remove(collection);
    }

    /// Deliver every queued event. Returns how many ran.
    pub fn pump(&self) -> usize {
        let mut delivered = 0;
        while let Ok(delivery) = self.inner.queue_rx.try_recv() {
            delivery();
            delivered += 1;
        }
        delivered
    }

    /// Number of queued, undelivered events.
    pub fn pending(&self) -> usize {
        self.inner.queue_rx.len()
    }

    /// Number of live listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.read().len()
    }

    fn register(&self, listener: Listener) -> ListenerHandle {
        let id = ListenerId(self.inner.next_id.fetch_add(1, Ordering::SeqCst));

        let rejection = self.inner.denied.read().get(listener.collection()).cloned();
        if let Some(error) = rejection {
            debug!(listener = id.0, collection = listener.collection(), "listener rejected");
            self.enqueue_error(&listener, error);
            return ListenerHandle::new(id, || {});
        }

        self.inner.listeners.write().insert(id, listener);
        if let Some(listener) = self.inner.listeners.read().get(&id) {
            self.enqueue_snapshot(listener);
        }

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        ListenerHandle::new(id, move || {
            if let Some(inner) = weak.upgrade() {
                if inner.listeners.write().remove(&id).is_some() {
                    debug!(listener = id.0, "listener cancelled");
                }
            }
        })
    }

    fn notify(&self, collection: &str) {
        let listeners = self.inner.listeners.read();
        for listener in listeners.values() {
            if listener.collection() == collection {
                self.enqueue_snapshot(listener);
            }
        }
    }

    fn enqueue_snapshot(&self, listener: &Listener) {
        let collections = self.inner.collections.read();
        let delivery: Delivery = match listener {
            Listener::Collection {
                collection,
                descriptor,
                sink,
            } => {
                let docs = match collections.get(collection) {
                    Some(docs) => query::apply(descriptor, docs.values()),
                    None => Vec::new(),
                };
                let sink = sink.clone();
                Box::new(move || sink(ListenerEvent::Snapshot(docs)))
            }
            Listener::Document { key, sink } => {
                let doc = collections
                    .get(&key.collection)
                    .and_then(|docs| docs.get(&key.id))
                    .cloned();
                let sink = sink.clone();
                Box::new(move || sink(ListenerEvent::Snapshot(doc)))
            }
        };
        // Receiver lives in `inner`, so the channel cannot be disconnected here.
        let _ = self.inner.queue_tx.send(delivery);
    }

    fn enqueue_error(&self, listener: &Listener, error: ListenerError) {
        let delivery: Delivery = match listener {
            Listener::Collection { sink, .. } => {
                let sink = sink.clone();
                Box::new(move || sink(ListenerEvent::Error(error)))
            }
            Listener::Document { sink, .. } => {
                let sink = sink.clone();
                Box::new(move || sink(ListenerEvent::Error(error)))
            }
        };
        let _ = self.inner.queue_tx.send(delivery);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for MemoryStore {
    fn subscribe_collection(
        &self,
        collection: &str,
        descriptor: &QueryDescriptor,
        sink: EventSink<Vec<Document>>,
    ) -> ListenerHandle {
        self.register(Listener::Collection {
            collection: collection.to_string(),
            descriptor: descriptor.clone(),
            sink,
        })
    }

    fn subscribe_document(
        &self,
        key: &DocumentKey,
        sink: EventSink<Option<Document>>,
    ) -> ListenerHandle {
        self.register(Listener::Document {
            key: key.clone(),
            sink,
        })
    }
}
