//! # Live Bindings
//!
//! Turns a query against a push-based document store into a value that
//! keeps itself up to date.
//!
//! ## Core Concepts
//!
//! - **Descriptors**: Ordered filter/sort/limit clauses for a collection
//! - **Identity**: Content-derived key deciding whether two requests are the same live query
//! - **Bindings**: One consumer's attachment point, owning at most one store listener
//! - **Generations**: Per-binding counter that keeps late callbacks from stale listeners inert
//!
//! ## Example
//!
//! ```ignore
//! use livebind::{LiveClient, MemoryStore, QueryDescriptor, Document};
//!
//! let store = Arc::new(MemoryStore::new());
//! store.put("listings", Document::new("a").with("category", "jobs"));
//!
//! let client = LiveClient::new(store.clone());
//! let mut feed = client.collection_binding();
//!
//! // Called on every render; only a change in content reopens the listener.
//! let jobs = QueryDescriptor::new().equals("category", "jobs");
//! feed.observe("listings", &jobs)?;
//!
//! store.pump();
//! assert_eq!(feed.result().items.len(), 1);
//!
//! // Owner id not known yet: nothing is opened.
//! let mut owner = client.document_binding();
//! owner.observe("users", "")?;
//! ```

pub mod binding;
pub mod client;
pub mod error;
pub mod query;
pub mod store;
pub mod taxonomy;
pub mod types;

// Re-exports
pub use binding::{BindingOptions, BindingStats, CollectionBinding, DocumentBinding, ObservableResult};
pub use client::{ClientConfig, LiveClient};
pub use error::{BindingError, ListenerError, ListenerErrorCode, Result};
pub use query::{
    equals, limit, order_by, resolve, Clause, FieldValue, QueryDescriptor, QueryIdentity,
    SortDirection,
};
pub use store::{
    DocumentStore, EventSink, ListenerEvent, ListenerHandle, MemoryStore, RecordingStore, StoreCall,
};
pub use taxonomy::{category, CategorySpec, FieldKind, FieldSpec, CATEGORIES};
pub use types::*;
