#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

//! Common test utilities for metadata-store integration tests

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use metadata_store::{
    Collaborators, JsonDocumentCodec, MetadataStore, MetadataStoreConfig, StaticDiscoverer,
};
use metadata_store_sdk::{
    Capability, DataProperty, EntityType, MetadataTransport, NativeType, NavigationProperty,
    TypeDiscoverer,
};
use serde_json::Value;

/// Serves canned documents and counts round trips.
#[derive(Default)]
pub struct MockTransport {
    documents: HashMap<String, Value>,
    delay: Duration,
    pub calls: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, service_name: &str, document: Value) -> Self {
        self.documents.insert(service_name.to_owned(), document);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataTransport for MockTransport {
    async fn fetch_raw(&self, service_name: &str) -> anyhow::Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.documents
            .get(service_name)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("unknown service {service_name}"))
    }
}

/// Wraps another discoverer and counts scans.
pub struct CountingDiscoverer {
    inner: StaticDiscoverer,
    pub scans: AtomicUsize,
}

impl CountingDiscoverer {
    pub fn new(inner: StaticDiscoverer) -> Self {
        Self {
            inner,
            scans: AtomicUsize::new(0),
        }
    }

    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }
}

impl TypeDiscoverer for CountingDiscoverer {
    fn discover(&self, capability: Capability, module: &str) -> Vec<NativeType> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        self.inner.discover(capability, module)
    }
}

pub fn create_store_with(
    transport: Arc<dyn MetadataTransport>,
    discoverer: Arc<dyn TypeDiscoverer>,
) -> MetadataStore {
    MetadataStore::new(
        MetadataStoreConfig::default(),
        Collaborators {
            transport,
            discoverer,
            codec: Arc::new(JsonDocumentCodec),
        },
    )
    .unwrap()
}

pub fn create_store() -> MetadataStore {
    create_store_with(
        Arc::new(MockTransport::new()),
        Arc::new(StaticDiscoverer::new()),
    )
}

fn keyed(short_name: &str) -> EntityType {
    EntityType::new(short_name, "Sales")
        .with_data_property(DataProperty::new("Id").with_data_type("Int32").part_of_key())
}

/// `Order` with a `Customer` navigation implemented by `CustomerId`.
pub fn order() -> EntityType {
    keyed("Order")
        .with_data_property(DataProperty::new("CustomerId").with_data_type("Int32"))
        .with_data_property(DataProperty::new("ShipTo").with_complex_type_name("Address:#Sales"))
        .with_navigation_property(
            NavigationProperty::new("Customer", "Customer:#Sales")
                .with_association("Customer_Orders")
                .with_foreign_key("CustomerId"),
        )
        .with_default_resource_name("Orders")
}

/// `Customer` with the inverse `Orders` collection.
pub fn customer() -> EntityType {
    keyed("Customer")
        .with_navigation_property(
            NavigationProperty::new("Orders", "Order:#Sales")
                .with_association("Customer_Orders")
                .scalar(false)
                .with_inv_foreign_key("CustomerId"),
        )
        .with_default_resource_name("Customers")
}

pub fn address() -> metadata_store_sdk::ComplexType {
    metadata_store_sdk::ComplexType::new("Address", "Sales")
        .with_data_property(DataProperty::new("City").with_data_type("String"))
}
