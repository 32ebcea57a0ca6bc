//! Serialized form of a metadata document.
//!
//! Property names are written in their server form; the active naming
//! convention translates them on the way in and out.

use std::collections::BTreeMap;
use std::sync::Arc;

use metadata_store_sdk::{
    ComplexType, DataProperty, DataService, EntityType, NamingConvention, NavigationProperty,
    StructuralType, Validator, ValidatorDefinition, qualify_type_name,
};
use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_false(value: &bool) -> bool {
    !*value
}

const fn default_true() -> bool {
    true
}

/// Top-level metadata document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub naming_convention: Option<String>,
    #[serde(default)]
    pub data_services: Vec<DataServiceDto>,
    #[serde(default)]
    pub structural_types: Vec<StructuralTypeDto>,
    #[serde(default)]
    pub resource_entity_type_map: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataServiceDto {
    pub service_name: String,
    #[serde(default = "default_true")]
    pub has_server_metadata: bool,
}

impl From<&DataService> for DataServiceDto {
    fn from(service: &DataService) -> Self {
        Self {
            service_name: service.service_name.clone(),
            has_server_metadata: service.has_server_metadata,
        }
    }
}

impl From<DataServiceDto> for DataService {
    fn from(dto: DataServiceDto) -> Self {
        Self {
            service_name: dto.service_name,
            has_server_metadata: dto.has_server_metadata,
        }
    }
}

/// An entity or complex type, tagged by `isComplexType`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuralTypeDto {
    pub short_name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_complex_type: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_abstract: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_resource_name: Option<String>,
    #[serde(default)]
    pub data_properties: Vec<DataPropertyDto>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub navigation_properties: Vec<NavigationPropertyDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPropertyDto {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complex_type_name: Option<String>,
    #[serde(default = "default_true")]
    pub is_nullable: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_part_of_key: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<ValidatorDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationPropertyDto {
    pub name: String,
    pub entity_type_name: String,
    #[serde(default = "default_true")]
    pub is_scalar: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub association_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub foreign_key_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inv_foreign_key_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<ValidatorDefinition>,
}

fn to_server(names: &[String], convention: &dyn NamingConvention) -> Vec<String> {
    names
        .iter()
        .map(|n| convention.client_property_name_to_server(n))
        .collect()
}

fn to_client(names: Vec<String>, convention: &dyn NamingConvention) -> Vec<String> {
    names
        .into_iter()
        .map(|n| convention.server_property_name_to_client(&n))
        .collect()
}

fn definitions(validators: &[Arc<Validator>]) -> Vec<ValidatorDefinition> {
    validators.iter().map(|v| v.definition().clone()).collect()
}

/// Materializes validator definitions, dropping those that fail.
pub type MaterializeValidator<'a> = dyn FnMut(&ValidatorDefinition) -> Option<Arc<Validator>> + 'a;

fn materialize(
    definitions: &[ValidatorDefinition],
    validator_for: &mut MaterializeValidator<'_>,
) -> Vec<Arc<Validator>> {
    definitions.iter().filter_map(|d| validator_for(d)).collect()
}

impl DataPropertyDto {
    fn from_model(property: &DataProperty, convention: &dyn NamingConvention) -> Self {
        Self {
            name: convention.client_property_name_to_server(&property.name),
            data_type: property.data_type.clone(),
            complex_type_name: property.complex_type_name.clone(),
            is_nullable: property.is_nullable,
            is_part_of_key: property.is_part_of_key,
            max_length: property.max_length,
            validators: definitions(&property.validators),
        }
    }

    fn into_model(
        self,
        convention: &dyn NamingConvention,
        validator_for: &mut MaterializeValidator<'_>,
    ) -> DataProperty {
        DataProperty {
            name: convention.server_property_name_to_client(&self.name),
            data_type: self.data_type,
            complex_type_name: self.complex_type_name,
            is_part_of_key: self.is_part_of_key,
            is_nullable: self.is_nullable && !self.is_part_of_key,
            max_length: self.max_length,
            validators: materialize(&self.validators, validator_for),
            ..DataProperty::default()
        }
    }
}

impl NavigationPropertyDto {
    fn from_model(property: &NavigationProperty, convention: &dyn NamingConvention) -> Self {
        Self {
            name: convention.client_property_name_to_server(&property.name),
            entity_type_name: property.entity_type_name.clone(),
            is_scalar: property.is_scalar,
            association_name: property.association_name.clone(),
            foreign_key_names: to_server(&property.foreign_key_names, convention),
            inv_foreign_key_names: to_server(&property.inv_foreign_key_names, convention),
            validators: definitions(&property.validators),
        }
    }

    fn into_model(
        self,
        convention: &dyn NamingConvention,
        validator_for: &mut MaterializeValidator<'_>,
    ) -> NavigationProperty {
        NavigationProperty {
            name: convention.server_property_name_to_client(&self.name),
            entity_type_name: self.entity_type_name,
            is_scalar: self.is_scalar,
            association_name: self.association_name,
            foreign_key_names: to_client(self.foreign_key_names, convention),
            inv_foreign_key_names: to_client(self.inv_foreign_key_names, convention),
            validators: materialize(&self.validators, validator_for),
            ..NavigationProperty::default()
        }
    }
}

impl StructuralTypeDto {
    /// Rejects a concrete entity type declaring no key property, before any
    /// part of the document is applied.
    ///
    /// # Errors
    ///
    /// Returns `MissingKey` naming the offending type.
    pub fn check_key(&self) -> Result<(), DomainError> {
        if self.is_complex_type
            || self.is_abstract
            || self.data_properties.iter().any(|p| p.is_part_of_key)
        {
            return Ok(());
        }
        Err(DomainError::missing_key(qualify_type_name(
            &self.short_name,
            &self.namespace,
        )))
    }

    /// Declared shape of a type; resolution state is not serialized.
    #[must_use]
    pub fn from_model(structural_type: &StructuralType, convention: &dyn NamingConvention) -> Self {
        let data_properties = structural_type
            .data_properties()
            .iter()
            .map(|p| DataPropertyDto::from_model(p, convention))
            .collect();

        match structural_type {
            StructuralType::Entity(entity) => Self {
                short_name: entity.short_name.clone(),
                namespace: entity.namespace.clone(),
                is_complex_type: false,
                is_abstract: entity.is_abstract,
                base_type_name: entity.base_type_name.clone(),
                default_resource_name: entity.default_resource_name.clone(),
                data_properties,
                navigation_properties: entity
                    .navigation_properties
                    .iter()
                    .map(|p| NavigationPropertyDto::from_model(p, convention))
                    .collect(),
            },
            StructuralType::Complex(complex) => Self {
                short_name: complex.short_name.clone(),
                namespace: complex.namespace.clone(),
                is_complex_type: true,
                is_abstract: false,
                base_type_name: None,
                default_resource_name: None,
                data_properties,
                navigation_properties: Vec::new(),
            },
        }
    }

    pub fn into_model(
        self,
        convention: &dyn NamingConvention,
        validator_for: &mut MaterializeValidator<'_>,
    ) -> StructuralType {
        let data_properties = self
            .data_properties
            .into_iter()
            .map(|p| p.into_model(convention, validator_for))
            .collect();

        if self.is_complex_type {
            return ComplexType {
                short_name: self.short_name,
                namespace: self.namespace,
                is_anonymous: false,
                data_properties,
            }
            .into();
        }

        EntityType {
            short_name: self.short_name,
            namespace: self.namespace,
            is_abstract: self.is_abstract,
            base_type_name: self.base_type_name,
            default_resource_name: self.default_resource_name,
            data_properties,
            navigation_properties: self
                .navigation_properties
                .into_iter()
                .map(|p| p.into_model(convention, validator_for))
                .collect(),
            ..EntityType::default()
        }
        .into()
    }
}
