//! Metadata Store Module
//!
//! A thread-safe registry of structural metadata (entity types, complex
//! types and their properties). Metadata may arrive in any order; references
//! between types are resolved as their targets become known:
//! - navigation properties are paired with their inverses
//! - foreign-key properties are linked to the relationships they implement
//! - complex-typed properties are bound to their complex types
//! - derived entity types are linked to their base types
//!
//! Native types declared through `inventory` are bound to the structural
//! types they correspond to as their modules are probed.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

// === PUBLIC CONTRACT ===
pub use metadata_store_sdk as sdk;

pub mod host;
pub use host::MetadataStoreHost;

pub mod local_client;
pub use local_client::MetadataStoreLocalClient;

pub use config::MetadataStoreConfig;
pub use domain::error::{DomainError, RecordedError};
pub use domain::service::{Collaborators, MetadataCodec, MetadataStore};
pub use infra::{InventoryDiscoverer, JsonDocumentCodec, StaticDiscoverer};

// === INTERNAL MODULES ===
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;

use std::sync::Arc;

use metadata_store_sdk::MetadataTransport;

/// Builds a store wired to the inventory discoverer and the JSON codec.
///
/// # Errors
///
/// Propagates store construction failures.
pub fn build_store(
    config: MetadataStoreConfig,
    transport: Arc<dyn MetadataTransport>,
) -> Result<MetadataStore, DomainError> {
    MetadataStore::new(
        config,
        Collaborators {
            transport,
            discoverer: Arc::new(InventoryDiscoverer),
            codec: Arc::new(JsonDocumentCodec),
        },
    )
}
