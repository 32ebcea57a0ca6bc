//! JSON metadata document codec.

use metadata_store_sdk::{DataService, ValidatorDefinition, builtin_convention};
use serde_json::Value;
use tracing::{debug, warn};

use super::dto::{DataServiceDto, MetadataDocument, StructuralTypeDto};
use crate::domain::error::DomainError;
use crate::domain::service::{MetadataCodec, MetadataStore};

/// Reads and writes the store as a `MetadataDocument` JSON tree.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonDocumentCodec;

impl MetadataCodec for JsonDocumentCodec {
    fn encode(&self, store: &MetadataStore) -> Result<Value, DomainError> {
        let convention = store.naming_convention();
        let document = MetadataDocument {
            metadata_version: Some(store.metadata_version().to_owned()),
            naming_convention: Some(convention.name().to_owned()),
            data_services: store.data_services().iter().map(DataServiceDto::from).collect(),
            structural_types: store
                .structural_types()
                .iter()
                .map(|t| StructuralTypeDto::from_model(t, convention.as_ref()))
                .collect(),
            resource_entity_type_map: store.resource_entity_type_map(),
        };
        Ok(serde_json::to_value(document)?)
    }

    fn decode(&self, store: &MetadataStore, document: &Value) -> Result<(), DomainError> {
        let document: MetadataDocument = serde_json::from_value(document.clone())?;

        if let Some(version) = &document.metadata_version
            && version != store.metadata_version()
        {
            warn!(document = %version, store = %store.metadata_version(), "Metadata version mismatch");
        }

        // Nothing is applied until the whole document is known to be acceptable.
        let convention = match &document.naming_convention {
            Some(name) => builtin_convention(name)
                .ok_or_else(|| DomainError::UnknownNamingConvention(name.clone()))?,
            None => store.naming_convention(),
        };
        for dto in &document.structural_types {
            dto.check_key()?;
        }

        let type_count = document.structural_types.len();
        let mut validator_for = |d: &ValidatorDefinition| store.find_or_create_validator(d);
        for dto in document.structural_types {
            store.add_type(dto.into_model(convention.as_ref(), &mut validator_for))?;
        }

        if document.naming_convention.is_some() {
            store.set_naming_convention(convention);
        }
        for service in document.data_services {
            store.add_data_service(DataService::from(service));
        }
        for (resource_name, entity_type_name) in document.resource_entity_type_map {
            store.set_entity_type_for_resource_name(resource_name, entity_type_name);
        }

        debug!(types = type_count, "Decoded metadata document");
        Ok(())
    }
}
