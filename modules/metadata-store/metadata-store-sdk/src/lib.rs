//! Metadata Store SDK
//!
//! This crate provides the public contract of the `metadata-store` module:
//! - `StructuralType`, `EntityType`, `ComplexType` and their properties
//! - `NativeType` descriptors and the `inventory`-backed registration table
//! - `Validator` definitions and the `ValidatorFactory` constructor type
//! - `NamingConvention` strategies
//! - `MetadataTransport` / `TypeDiscoverer` collaborator traits
//! - `MetadataStoreClient` trait and `MetadataStoreError`
//!
//! ## Usage
//!
//! ```ignore
//! use metadata_store_sdk::{DataService, MetadataStoreClient};
//!
//! let client: Arc<dyn MetadataStoreClient> = ...;
//! client.fetch_metadata(DataService::new("sales")).await?;
//! let order = client.get_entity_type("Order:#Sales").await?;
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub mod api;
pub mod error;
pub mod models;
pub mod naming;
pub mod native;
pub mod validator;

// Re-export main types at crate root for convenience
pub use api::{MetadataStoreClient, MetadataTransport, TypeDiscoverer};
pub use error::MetadataStoreError;
pub use models::{
    ComplexType, DataProperty, DataPropertyRef, DataService, EntityType, NavigationProperty,
    NavigationPropertyRef, StructuralKind, StructuralType, qualify_type_name,
    split_qualified_name,
};
pub use naming::{CamelCaseConvention, NamingConvention, NoChangeConvention, builtin_convention};
pub use native::{Capability, NativeType, NativeTypeRegistration};
pub use validator::{Validator, ValidatorDefinition, ValidatorFactory};
