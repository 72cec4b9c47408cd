//! Generation-guarded binding shared by the collection and document variants.

use super::{BindingOptions, BindingStats, ObservableResult};
use crate::store::{DocumentStore, EventSink, ListenerEvent, ListenerHandle};
use crate::types::Generation;
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, trace, warn};

/// Something a binding can listen to.
pub(crate) trait LiveTarget: Send + 'static {
    type Identity: Clone + PartialEq + fmt::Debug + fmt::Display + Send + 'static;
    type Value: Clone + Default + PartialEq + Send + 'static;

    fn identity(&self) -> &Self::Identity;

    fn open(&self, store: &dyn DocumentStore, sink: EventSink<Self::Value>) -> ListenerHandle;
}

/// State written by store callbacks.
struct Slot<T> {
    generation: Generation,
    result: ObservableResult<T>,
    stats: BindingStats,
}

/// The one open listener of a binding.
struct Subscription<T> {
    target: T,
    generation: Generation,
    handle: ListenerHandle,
}

pub(crate) struct Binding<T: LiveTarget> {
    store: Arc<dyn DocumentStore>,
    label: String,
    slot: Arc<Mutex<Slot<T::Value>>>,
    active: Option<Subscription<T>>,
    changes_tx: Sender<Generation>,
    changes_rx: Receiver<Generation>,
}

impl<T: LiveTarget> Binding<T> {
    pub(crate) fn new(store: Arc<dyn DocumentStore>, options: BindingOptions, kind: &str) -> Self {
        let (changes_tx, changes_rx) = bounded(options.change_buffer.max(1));
        Self {
            store,
            label: options.label.unwrap_or_else(|| kind.to_string()),
            slot: Arc::new(Mutex::new(Slot {
                generation: Generation::default(),
                result: ObservableResult::default(),
                stats: BindingStats::default(),
            })),
            active: None,
            changes_tx,
            changes_rx,
        }
    }

    /// Whether the open listener was opened for `identity`.
    pub(crate) fn is_current(&self, identity: &T::Identity) -> bool {
        self.active
            .as_ref()
            .map_or(false, |sub| sub.target.identity() == identity)
    }

    /// Point the binding at `target`, or at nothing.
    ///
    /// Same identity as the open listener: nothing happens. Otherwise the
    /// open listener is cancelled before the next one is opened, and the
    /// generation moves on so late callbacks from the old one are dropped.
    pub(crate) fn activate(&mut self, target: Option<T>) {
        if let (Some(next), Some(sub)) = (&target, &self.active) {
            if next.identity() == sub.target.identity() {
                trace!(binding = %self.label, identity = %next.identity(), "identity unchanged");
                return;
            }
        }

        if target.is_none() && self.active.is_none() {
            let mut slot = self.slot.lock();
            let idle = ObservableResult::default();
            if slot.result != idle {
                slot.result = idle;
                let generation = slot.generation;
                drop(slot);
                self.notify(generation);
            }
            return;
        }

        let loading = target.is_some();
        let (generation, _) = self.retire(|result| {
            *result = ObservableResult {
                items: T::Value::default(),
                is_loading: loading,
                error: None,
            };
        });
        self.notify(generation);

        if let Some(target) = target {
            self.open(target, generation);
        }
    }

    /// Reopen the current identity, e.g. after a listener error.
    ///
    /// Keeps the last items visible while loading. No-op when idle.
    pub(crate) fn resubscribe(&mut self) {
        if self.active.is_none() {
            return;
        }
        let (generation, retired) = self.retire(|result| {
            result.is_loading = true;
            result.error = None;
        });
        let Some(target) = retired else {
            return;
        };
        debug!(
            binding = %self.label,
            identity = %target.identity(),
            generation = generation.0,
            "resubscribing"
        );
        self.notify(generation);
        self.open(target, generation);
    }

    /// Cancel the listener. Idempotent.
    pub(crate) fn teardown(&mut self) {
        if self.active.is_none() {
            return;
        }
        let (generation, _) = self.retire(|result| result.is_loading = false);
        self.notify(generation);
    }

    pub(crate) fn result(&self) -> ObservableResult<T::Value> {
        self.slot.lock().result.clone()
    }

    pub(crate) fn generation(&self) -> Generation {
        self.slot.lock().generation
    }

    pub(crate) fn stats(&self) -> BindingStats {
        self.slot.lock().stats.clone()
    }

    pub(crate) fn identity(&self) -> Option<&T::Identity> {
        self.active.as_ref().map(|sub| sub.target.identity())
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub(crate) fn changes(&self) -> Receiver<Generation> {
        self.changes_rx.clone()
    }

    fn open(&mut self, target: T, generation: Generation) {
        let slot: Weak<Mutex<Slot<T::Value>>> = Arc::downgrade(&self.slot);
        let changes = self.changes_tx.clone();
        let label = self.label.clone();

        let sink: EventSink<T::Value> = Arc::new(move |event: ListenerEvent<T::Value>| {
            if let Some(slot) = slot.upgrade() {
                apply_event(&slot, generation, event, &changes, &label);
            }
        });

        self.slot.lock().stats.subscriptions_opened += 1;
        debug!(
            binding = %self.label,
            identity = %target.identity(),
            generation = generation.0,
            "opening listener"
        );

        // The store may call the sink before returning; the slot lock is not held here.
        let handle = target.open(self.store.as_ref(), sink);
        self.active = Some(Subscription {
            target,
            generation,
            handle,
        });
    }

    /// Move to the next generation, then cancel the open listener.
    ///
    /// The generation moves under the slot lock before the handle is
    /// cancelled, so a callback the store runs during or after cancellation
    /// is already stale. Returns the new generation and the retired target.
    fn retire(
        &mut self,
        update: impl FnOnce(&mut ObservableResult<T::Value>),
    ) -> (Generation, Option<T>) {
        let retired = self.active.take();
        let generation = {
            let mut slot = self.slot.lock();
            slot.generation = slot.generation.next();
            if retired.is_some() {
                slot.stats.cancellations += 1;
            }
            update(&mut slot.result);
            slot.generation
        };

        let target = retired.map(|mut sub| {
            sub.handle.cancel();
            debug!(
                binding = %self.label,
                identity = %sub.target.identity(),
                generation = sub.generation.0,
                "listener cancelled"
            );
            sub.target
        });
        (generation, target)
    }

    fn notify(&self, generation: Generation) {
        // A full buffer already holds a pending wake-up.
        let _ = self.changes_tx.try_send(generation);
    }
}

impl<T: LiveTarget> Drop for Binding<T> {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn apply_event<V>(
    slot: &Mutex<Slot<V>>,
    generation: Generation,
    event: ListenerEvent<V>,
    changes: &Sender<Generation>,
    label: &str,
) {
    let mut slot = slot.lock();
    if slot.generation != generation {
        slot.stats.stale_discarded += 1;
        trace!(
            binding = label,
            stale = generation.0,
            current = slot.generation.0,
            "stale callback ignored"
        );
        return;
    }

    match event {
        ListenerEvent::Snapshot(items) => {
            slot.result.items = items;
            slot.result.is_loading = false;
            slot.result.error = None;
            slot.stats.snapshots_applied += 1;
        }
        ListenerEvent::Error(error) => {
            warn!(binding = label, generation = generation.0, %error, "listener failed");
            slot.result.error = Some(error);
            slot.result.is_loading = false;
            slot.stats.errors += 1;
        }
    }
    drop(slot);

    let _ = changes.try_send(generation);
}
