//! Local client implementing the `MetadataStoreClient` trait.

use std::sync::Arc;

use async_trait::async_trait;
use metadata_store_sdk::{
    ComplexType, DataService, EntityType, MetadataStoreClient, MetadataStoreError, StructuralType,
};

use crate::domain::error::DomainError;
use crate::host::MetadataStoreHost;

/// Local client for the Metadata Store module.
///
/// Resolves the host's current store on every call, so a reset is picked up
/// without rebuilding the client.
pub struct MetadataStoreLocalClient {
    host: Arc<MetadataStoreHost>,
}

impl MetadataStoreLocalClient {
    #[must_use]
    pub fn new(host: Arc<MetadataStoreHost>) -> Self {
        Self { host }
    }
}

fn required<T>(name: &str, found: Option<T>) -> Result<T, MetadataStoreError> {
    found.ok_or_else(|| DomainError::not_found(name).into())
}

#[async_trait]
impl MetadataStoreClient for MetadataStoreLocalClient {
    async fn fetch_metadata(
        &self,
        service: DataService,
    ) -> Result<DataService, MetadataStoreError> {
        let store = self.host.current();
        store
            .fetch_metadata(service)
            .await
            .map_err(MetadataStoreError::from)
    }

    async fn get_entity_type(&self, name: &str) -> Result<EntityType, MetadataStoreError> {
        let found = self.host.current().get_entity_type(name, false)?;
        required(name, found)
    }

    async fn get_complex_type(&self, name: &str) -> Result<ComplexType, MetadataStoreError> {
        let found = self.host.current().get_complex_type(name, false)?;
        required(name, found)
    }

    async fn list_structural_types(&self) -> Result<Vec<StructuralType>, MetadataStoreError> {
        Ok(self.host.current().structural_types())
    }

    async fn export_metadata(&self) -> Result<serde_json::Value, MetadataStoreError> {
        self.host
            .current()
            .export_metadata()
            .map_err(MetadataStoreError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MetadataStoreConfig;
    use crate::domain::service::{Collaborators, MetadataStore};
    use crate::infra::{JsonDocumentCodec, StaticDiscoverer};
    use metadata_store_sdk::{DataProperty, MetadataTransport};
    use serde_json::json;

    struct FixedTransport;

    #[async_trait]
    impl MetadataTransport for FixedTransport {
        async fn fetch_raw(&self, _service_name: &str) -> anyhow::Result<serde_json::Value> {
            Ok(json!({
                "structuralTypes": [
                    { "shortName": "Address", "namespace": "Sales", "isComplexType": true,
                      "dataProperties": [{ "name": "City", "dataType": "String" }] },
                    { "shortName": "Customer", "namespace": "Sales",
                      "dataProperties": [{ "name": "Id", "dataType": "Int32", "isPartOfKey": true }] }
                ]
            }))
        }
    }

    fn create_client() -> MetadataStoreLocalClient {
        let store = MetadataStore::new(
            MetadataStoreConfig::default(),
            Collaborators {
                transport: Arc::new(FixedTransport),
                discoverer: Arc::new(StaticDiscoverer::new()),
                codec: Arc::new(JsonDocumentCodec),
            },
        )
        .unwrap();
        MetadataStoreLocalClient::new(Arc::new(MetadataStoreHost::new(store)))
    }

    #[tokio::test]
    async fn test_fetch_and_get() {
        let client = create_client();
        let service = client.fetch_metadata(DataService::new("sales")).await.unwrap();
        assert_eq!(service.service_name, "sales");

        let customer = client.get_entity_type("Customer").await.unwrap();
        assert_eq!(customer.name(), "Customer:#Sales");
        assert_eq!(client.list_structural_types().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_get_not_found() {
        let client = create_client();
        let err = client.get_entity_type("Missing:#Sales").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_get_wrong_kind() {
        let client = create_client();
        client.fetch_metadata(DataService::new("sales")).await.unwrap();
        let err = client.get_complex_type("Customer:#Sales").await.unwrap_err();
        assert!(err.is_wrong_kind());
    }

    #[tokio::test]
    async fn test_export_lists_fetched_service_types() {
        let client = create_client();
        client.fetch_metadata(DataService::new("sales")).await.unwrap();
        client
            .host
            .current()
            .add_type(
                EntityType::new("Order", "Sales")
                    .with_data_property(DataProperty::new("Id").part_of_key()),
            )
            .unwrap();

        let exported = client.export_metadata().await.unwrap();
        assert_eq!(exported["structuralTypes"].as_array().unwrap().len(), 3);
        assert_eq!(exported["dataServices"][0]["serviceName"], "sales");
    }
}
