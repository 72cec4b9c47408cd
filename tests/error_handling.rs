//! Error handling and edge case tests.

use livebind::{
    equals, limit, order_by, resolve, BindingError, CollectionBinding, Document, DocumentBinding,
    ListenerError, ListenerErrorCode, ListenerEvent, QueryDescriptor, RecordingStore,
    SortDirection,
};
use serde_json::json;
use std::sync::Arc;

// --- Invalid descriptors ---

#[test]
fn test_empty_collection_name() {
    let result = resolve("", &QueryDescriptor::new());
    assert!(matches!(result, Err(BindingError::InvalidDescriptor(_))));
}

#[test]
fn test_zero_limit() {
    let descriptor: QueryDescriptor = vec![limit(0)].into();
    let result = resolve("listings", &descriptor);
    assert!(matches!(result, Err(BindingError::InvalidDescriptor(_))));
}

#[test]
fn test_duplicate_limit() {
    let descriptor: QueryDescriptor = vec![limit(10), order_by("price", SortDirection::Asc), limit(5)].into();
    let result = resolve("listings", &descriptor);
    assert!(matches!(result, Err(BindingError::InvalidDescriptor(_))));
}

#[test]
fn test_nan_equality() {
    let descriptor: QueryDescriptor = vec![equals("price", f64::NAN)].into();
    assert!(resolve("listings", &descriptor).is_err());
}

#[test]
fn test_unsupported_wire_clauses() {
    let cases = vec![
        json!([{"op": "greater_than", "field": "price", "value": 3}]),
        json!([{"op": "equals", "field": "price"}]),
        json!([{"op": "limit", "count": -1}]),
        json!([{"op": "equals", "field": "tags", "value": ["a", "b"]}]),
        json!([{"op": "order_by", "field": "price", "direction": "sideways"}]),
        json!([{"op": "limit", "count": 3, "offset": 2}]),
        json!({"op": "limit", "count": 3}),
    ];

    for wire in cases {
        let result = QueryDescriptor::from_json(&wire);
        assert!(
            matches!(result, Err(BindingError::InvalidDescriptor(_))),
            "expected rejection for {}",
            wire
        );
    }
}

#[test]
fn test_integer_beyond_i64_rejected() {
    let widest = json!([{"op": "equals", "field": "n", "value": 18446744073709551615u64}]);
    let next = json!([{"op": "equals", "field": "n", "value": 18446744073709551614u64}]);

    for wire in [widest, next] {
        let result = QueryDescriptor::from_json(&wire);
        assert!(
            matches!(result, Err(BindingError::InvalidDescriptor(_))),
            "expected rejection for {}",
            wire
        );
    }

    let fits = json!([{"op": "equals", "field": "n", "value": 9223372036854775807u64}]);
    let descriptor = QueryDescriptor::from_json(&fits).unwrap();
    assert_eq!(descriptor, QueryDescriptor::new().equals("n", i64::MAX));
}

#[test]
fn test_invalid_descriptor_makes_no_store_call() {
    let store = Arc::new(RecordingStore::new());
    let mut binding = CollectionBinding::new(store.clone());

    let descriptor: QueryDescriptor = vec![equals(" ", "jobs")].into();
    let result = binding.observe("listings", &descriptor);

    assert!(matches!(result, Err(BindingError::InvalidDescriptor(_))));
    assert!(store.calls().is_empty());
    assert!(!binding.is_active());
    assert!(!binding.result().is_loading);
}

// --- Listener errors ---

#[test]
fn test_listener_error_is_not_an_empty_result() {
    let store = Arc::new(RecordingStore::new());
    let mut binding = CollectionBinding::new(store.clone());
    binding.observe("listings", &QueryDescriptor::new()).unwrap();
    let listener = store.last_listener().unwrap();

    store.deliver_collection(
        listener,
        ListenerEvent::Error(ListenerError::new(ListenerErrorCode::InvalidQuery, "index missing")),
    );

    let result = binding.result();
    assert!(result.items.is_empty());
    assert!(!result.is_ready());
    assert_eq!(result.error.unwrap().code, ListenerErrorCode::InvalidQuery);
}

#[test]
fn test_listener_error_not_retried() {
    let store = Arc::new(RecordingStore::new());
    let mut binding = CollectionBinding::new(store.clone());
    binding.observe("listings", &QueryDescriptor::new()).unwrap();
    let listener = store.last_listener().unwrap();

    store.deliver_collection(listener, ListenerEvent::Error(ListenerError::unavailable("offline")));
    // Re-rendering with the same query does not reopen.
    binding.observe("listings", &QueryDescriptor::new()).unwrap();

    assert_eq!(store.subscribe_count(), 1);
    assert!(binding.result().error.is_some());
}

#[test]
fn test_snapshot_after_error_clears_it() {
    let store = Arc::new(RecordingStore::new());
    let mut binding = DocumentBinding::new(store.clone());
    binding.observe("users", "u1").unwrap();
    let listener = store.last_listener().unwrap();

    store.deliver_document(listener, ListenerEvent::Error(ListenerError::unavailable("offline")));
    store.deliver_document(listener, ListenerEvent::Snapshot(Some(Document::new("u1"))));

    let result = binding.result();
    assert!(result.is_ready());
    assert_eq!(result.items, Some(Document::new("u1")));
}

#[test]
fn test_resubscribe_when_idle_is_noop() {
    let store = Arc::new(RecordingStore::new());
    let mut binding = DocumentBinding::new(store.clone());
    binding.resubscribe();
    binding.observe("users", "").unwrap();
    binding.resubscribe();
    assert!(store.calls().is_empty());
}

#[test]
fn test_late_callback_after_binding_dropped() {
    let store = Arc::new(RecordingStore::new());
    let listener = {
        let mut binding = CollectionBinding::new(store.clone());
        binding.observe("listings", &QueryDescriptor::new()).unwrap();
        store.last_listener().unwrap()
    };

    assert!(store.is_cancelled(listener));
    // Sink outlives the binding; delivering must be harmless.
    assert!(store.deliver_collection(listener, ListenerEvent::Snapshot(vec![])));
}

#[test]
fn test_into_result_surfaces_listener_error() {
    let store = Arc::new(RecordingStore::new());
    let mut binding = CollectionBinding::new(store.clone());
    binding.observe("listings", &QueryDescriptor::new()).unwrap();
    let listener = store.last_listener().unwrap();

    store.deliver_collection(listener, ListenerEvent::Snapshot(vec![Document::new("a")]));
    assert_eq!(binding.result().into_result().unwrap().len(), 1);

    store.deliver_collection(listener, ListenerEvent::Error(ListenerError::permission_denied("nope")));
    let err = binding.result().into_result().unwrap_err();
    assert!(matches!(err, BindingError::Listener(ref e) if e.code == ListenerErrorCode::PermissionDenied));
}
