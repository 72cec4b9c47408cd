//! Client facade handing out bindings over one shared store.

use crate::binding::{BindingOptions, CollectionBinding, DocumentBinding};
use crate::error::Result;
use crate::query::QueryDescriptor;
use crate::store::DocumentStore;
use std::sync::Arc;

/// Client configuration.
#[derive(Clone, Debug, Default)]
pub struct ClientConfig {
    /// Options applied to every binding this client creates.
    pub bindings: BindingOptions,
}

/// Entry point for screens.
///
/// Holds the store handle so screens do not reach for a process-wide one.
/// Bindings created here are independent: two bindings observing the same
/// query each own their own listener.
#[derive(Clone)]
pub struct LiveClient {
    store: Arc<dyn DocumentStore>,
    config: ClientConfig,
}

impl LiveClient {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_config(store, ClientConfig::default())
    }

    pub fn with_config(store: Arc<dyn DocumentStore>, config: ClientConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Fresh, idle collection binding.
    pub fn collection_binding(&self) -> CollectionBinding {
        CollectionBinding::with_options(self.store.clone(), self.config.bindings.clone())
    }

    /// Fresh, idle document binding.
    pub fn document_binding(&self) -> DocumentBinding {
        DocumentBinding::with_options(self.store.clone(), self.config.bindings.clone())
    }

    /// Collection binding already observing `collection` with `descriptor`.
    pub fn observe_collection(
        &self,
        collection: &str,
        descriptor: &QueryDescriptor,
    ) -> Result<CollectionBinding> {
        let mut binding = self.collection_binding();
        binding.observe(collection, descriptor)?;
        Ok(binding)
    }

    /// Document binding already observing `collection/document_id`.
    pub fn observe_document(&self, collection: &str, document_id: &str) -> Result<DocumentBinding> {
        let mut binding = self.document_binding();
        binding.observe(collection, document_id)?;
        Ok(binding)
    }
}
