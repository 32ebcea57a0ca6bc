//! `MetadataStoreClient` trait and collaborator contracts.
//!
//! The store itself owns the type graph; everything it needs from the outside
//! world is expressed here as a trait so hosts can plug in their own transport
//! and type-discovery mechanism.

use async_trait::async_trait;

use crate::error::MetadataStoreError;
use crate::models::{ComplexType, DataService, EntityType, StructuralType};
use crate::native::{Capability, NativeType};

/// Fetches the raw metadata document of a named service.
///
/// Timeouts and retries are the transport's business; failures propagate to
/// the caller of `fetch_metadata` unchanged.
#[async_trait]
pub trait MetadataTransport: Send + Sync {
    async fn fetch_raw(&self, service_name: &str) -> anyhow::Result<serde_json::Value>;
}

/// Locates concrete native types implementing a capability inside a code module.
pub trait TypeDiscoverer: Send + Sync {
    fn discover(&self, capability: Capability, module: &str) -> Vec<NativeType>;
}

/// Public API trait for the `metadata-store` module.
///
/// ```ignore
/// let order = client.get_entity_type("Order:#Sales").await?;
/// ```
#[async_trait]
pub trait MetadataStoreClient: Send + Sync {
    /// Fetch and merge the metadata of a service, at most once per service name.
    ///
    /// # Errors
    ///
    /// * `Transport` - If the underlying fetch fails
    /// * `InvalidDocument` - If the fetched document cannot be decoded
    /// * `MissingKey` - If the document declares a concrete entity type without keys
    async fn fetch_metadata(&self, service: DataService)
    -> Result<DataService, MetadataStoreError>;

    /// Retrieve an entity type by qualified or unique short name.
    ///
    /// # Errors
    ///
    /// * `NotFound` - If no such type is registered
    /// * `WrongKind` - If the name denotes a complex type
    async fn get_entity_type(&self, name: &str) -> Result<EntityType, MetadataStoreError>;

    /// Retrieve a complex type by qualified or unique short name.
    ///
    /// # Errors
    ///
    /// * `NotFound` - If no such type is registered
    /// * `WrongKind` - If the name denotes an entity type
    async fn get_complex_type(&self, name: &str) -> Result<ComplexType, MetadataStoreError>;

    /// Snapshot of every registered structural type, in registration order.
    async fn list_structural_types(&self) -> Result<Vec<StructuralType>, MetadataStoreError>;

    /// Export the whole store as a metadata document.
    async fn export_metadata(&self) -> Result<serde_json::Value, MetadataStoreError>;
}
