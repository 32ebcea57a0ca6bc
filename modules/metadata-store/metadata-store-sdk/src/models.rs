//! Public models for the `metadata-store` module.
//!
//! These are transport-agnostic descriptors of a data model. Resolved
//! references between types are expressed by qualified type name, so a
//! snapshot handed out by the store can be inspected without holding any lock.

use std::fmt;
use std::sync::Arc;

use crate::validator::Validator;

/// Separator between the short name and the namespace of a qualified type name.
pub const NAMESPACE_SEPARATOR: &str = ":#";

/// Builds a qualified structural type name (`Order:#Sales`).
///
/// An empty namespace yields the short name alone.
#[must_use]
pub fn qualify_type_name(short_name: &str, namespace: &str) -> String {
    if namespace.is_empty() {
        short_name.to_owned()
    } else {
        format!("{short_name}{NAMESPACE_SEPARATOR}{namespace}")
    }
}

/// Splits a qualified type name into its short name and optional namespace.
#[must_use]
pub fn split_qualified_name(name: &str) -> (&str, Option<&str>) {
    match name.split_once(NAMESPACE_SEPARATOR) {
        Some((short_name, namespace)) => (short_name, Some(namespace)),
        None => (name, None),
    }
}

/// Identifies a navigation property by its declaring entity type and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NavigationPropertyRef {
    /// Qualified name of the declaring entity type.
    pub entity_type: String,
    /// Name of the navigation property.
    pub name: String,
}

impl NavigationPropertyRef {
    #[must_use]
    pub fn new(entity_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for NavigationPropertyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.entity_type, self.name)
    }
}

/// Identifies a data property by its declaring structural type and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DataPropertyRef {
    /// Qualified name of the declaring structural type.
    pub structural_type: String,
    /// Name of the data property.
    pub name: String,
}

impl DataPropertyRef {
    #[must_use]
    pub fn new(structural_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            structural_type: structural_type.into(),
            name: name.into(),
        }
    }
}

/// A scalar or complex-typed field of a structural type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataProperty {
    pub name: String,
    /// Scalar data type name (`Int32`, `String`, ...). `None` for complex properties.
    pub data_type: Option<String>,
    /// Qualified name of the complex type this property embeds, as declared.
    pub complex_type_name: Option<String>,
    /// Qualified name of the complex type once it has been bound.
    pub complex_type: Option<String>,
    pub is_part_of_key: bool,
    pub is_nullable: bool,
    pub is_foreign_key: bool,
    /// Navigation property this foreign key implements.
    pub related_navigation_property: Option<NavigationPropertyRef>,
    pub max_length: Option<u32>,
    pub validators: Vec<Arc<Validator>>,
}

impl DataProperty {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_nullable: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }

    #[must_use]
    pub fn with_complex_type_name(mut self, complex_type_name: impl Into<String>) -> Self {
        self.complex_type_name = Some(complex_type_name.into());
        self
    }

    /// Marks the property as part of the entity key (keys are never nullable).
    #[must_use]
    pub fn part_of_key(mut self) -> Self {
        self.is_part_of_key = true;
        self.is_nullable = false;
        self
    }

    #[must_use]
    pub fn nullable(mut self, is_nullable: bool) -> Self {
        self.is_nullable = is_nullable;
        self
    }

    #[must_use]
    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    #[must_use]
    pub fn with_validator(mut self, validator: Arc<Validator>) -> Self {
        self.validators.push(validator);
        self
    }

    /// Returns `true` if this property embeds a complex type.
    #[must_use]
    pub const fn is_complex_property(&self) -> bool {
        self.complex_type_name.is_some()
    }
}

/// A relationship field connecting one entity type to another.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NavigationProperty {
    pub name: String,
    /// Qualified name of the target entity type, as declared.
    pub entity_type_name: String,
    /// Qualified name of the target entity type once it has been resolved.
    pub entity_type: Option<String>,
    /// Pairs this property with its inverse on the related type.
    pub association_name: Option<String>,
    pub is_scalar: bool,
    /// Data properties on the declaring type that implement this relationship.
    pub foreign_key_names: Vec<String>,
    /// Data properties on the target type that implement this relationship.
    pub inv_foreign_key_names: Vec<String>,
    pub inverse: Option<NavigationPropertyRef>,
    /// Qualified name of the declaring entity type, set when the type is added.
    pub parent_type: Option<String>,
    pub validators: Vec<Arc<Validator>>,
}

impl NavigationProperty {
    #[must_use]
    pub fn new(name: impl Into<String>, entity_type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entity_type_name: entity_type_name.into(),
            is_scalar: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_association(mut self, association_name: impl Into<String>) -> Self {
        self.association_name = Some(association_name.into());
        self
    }

    #[must_use]
    pub fn scalar(mut self, is_scalar: bool) -> Self {
        self.is_scalar = is_scalar;
        self
    }

    #[must_use]
    pub fn with_foreign_key(mut self, data_property_name: impl Into<String>) -> Self {
        self.foreign_key_names.push(data_property_name.into());
        self
    }

    #[must_use]
    pub fn with_inv_foreign_key(mut self, data_property_name: impl Into<String>) -> Self {
        self.inv_foreign_key_names.push(data_property_name.into());
        self
    }

    /// Returns `true` once the target entity type is known.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.entity_type.is_some()
    }
}

/// A structural type with identity: key properties and navigation properties.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntityType {
    pub short_name: String,
    pub namespace: String,
    pub is_abstract: bool,
    pub is_anonymous: bool,
    /// Qualified name of the base type, as declared.
    pub base_type_name: Option<String>,
    /// Qualified name of the base type once it is registered.
    pub base_entity_type: Option<String>,
    /// Qualified names of registered types deriving from this one.
    pub sub_types: Vec<String>,
    pub default_resource_name: Option<String>,
    pub data_properties: Vec<DataProperty>,
    pub navigation_properties: Vec<NavigationProperty>,
    /// Data properties of this type that are foreign keys of its own navigation properties.
    pub foreign_key_properties: Vec<String>,
    /// Foreign keys declared on related types whose relationship involves this type.
    pub inverse_foreign_key_properties: Vec<DataPropertyRef>,
}

impl EntityType {
    #[must_use]
    pub fn new(short_name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            short_name: short_name.into(),
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_data_property(mut self, property: DataProperty) -> Self {
        self.data_properties.push(property);
        self
    }

    #[must_use]
    pub fn with_navigation_property(mut self, property: NavigationProperty) -> Self {
        self.navigation_properties.push(property);
        self
    }

    #[must_use]
    pub fn with_base_type(mut self, base_type_name: impl Into<String>) -> Self {
        self.base_type_name = Some(base_type_name.into());
        self
    }

    #[must_use]
    pub fn with_default_resource_name(mut self, resource_name: impl Into<String>) -> Self {
        self.default_resource_name = Some(resource_name.into());
        self
    }

    #[must_use]
    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    #[must_use]
    pub fn anonymous(mut self) -> Self {
        self.is_anonymous = true;
        self
    }

    /// Qualified name (`ShortName:#Namespace`).
    #[must_use]
    pub fn name(&self) -> String {
        qualify_type_name(&self.short_name, &self.namespace)
    }

    pub fn key_properties(&self) -> impl Iterator<Item = &DataProperty> {
        self.data_properties.iter().filter(|p| p.is_part_of_key)
    }

    #[must_use]
    pub fn data_property(&self, name: &str) -> Option<&DataProperty> {
        self.data_properties.iter().find(|p| p.name == name)
    }

    #[must_use]
    pub fn navigation_property(&self, name: &str) -> Option<&NavigationProperty> {
        self.navigation_properties.iter().find(|p| p.name == name)
    }
}

/// A structural type without identity, embeddable as a property value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComplexType {
    pub short_name: String,
    pub namespace: String,
    pub is_anonymous: bool,
    pub data_properties: Vec<DataProperty>,
}

impl ComplexType {
    #[must_use]
    pub fn new(short_name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            short_name: short_name.into(),
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_data_property(mut self, property: DataProperty) -> Self {
        self.data_properties.push(property);
        self
    }

    #[must_use]
    pub fn anonymous(mut self) -> Self {
        self.is_anonymous = true;
        self
    }

    #[must_use]
    pub fn name(&self) -> String {
        qualify_type_name(&self.short_name, &self.namespace)
    }

    #[must_use]
    pub fn data_property(&self, name: &str) -> Option<&DataProperty> {
        self.data_properties.iter().find(|p| p.name == name)
    }
}

/// Which variant of structural type a descriptor is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuralKind {
    Entity,
    Complex,
}

impl fmt::Display for StructuralKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entity => f.write_str("entity type"),
            Self::Complex => f.write_str("complex type"),
        }
    }
}

/// An entity or complex type descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum StructuralType {
    Entity(EntityType),
    Complex(ComplexType),
}

impl StructuralType {
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Entity(t) => t.name(),
            Self::Complex(t) => t.name(),
        }
    }

    #[must_use]
    pub fn short_name(&self) -> &str {
        match self {
            Self::Entity(t) => &t.short_name,
            Self::Complex(t) => &t.short_name,
        }
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        match self {
            Self::Entity(t) => &t.namespace,
            Self::Complex(t) => &t.namespace,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> StructuralKind {
        match self {
            Self::Entity(_) => StructuralKind::Entity,
            Self::Complex(_) => StructuralKind::Complex,
        }
    }

    #[must_use]
    pub const fn is_entity_type(&self) -> bool {
        matches!(self, Self::Entity(_))
    }

    #[must_use]
    pub const fn is_complex_type(&self) -> bool {
        matches!(self, Self::Complex(_))
    }

    /// Complex types are never abstract.
    #[must_use]
    pub const fn is_abstract(&self) -> bool {
        match self {
            Self::Entity(t) => t.is_abstract,
            Self::Complex(_) => false,
        }
    }

    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        match self {
            Self::Entity(t) => t.is_anonymous,
            Self::Complex(t) => t.is_anonymous,
        }
    }

    #[must_use]
    pub fn data_properties(&self) -> &[DataProperty] {
        match self {
            Self::Entity(t) => &t.data_properties,
            Self::Complex(t) => &t.data_properties,
        }
    }

    pub fn data_properties_mut(&mut self) -> &mut Vec<DataProperty> {
        match self {
            Self::Entity(t) => &mut t.data_properties,
            Self::Complex(t) => &mut t.data_properties,
        }
    }

    #[must_use]
    pub const fn as_entity_type(&self) -> Option<&EntityType> {
        match self {
            Self::Entity(t) => Some(t),
            Self::Complex(_) => None,
        }
    }

    pub fn as_entity_type_mut(&mut self) -> Option<&mut EntityType> {
        match self {
            Self::Entity(t) => Some(t),
            Self::Complex(_) => None,
        }
    }

    #[must_use]
    pub const fn as_complex_type(&self) -> Option<&ComplexType> {
        match self {
            Self::Complex(t) => Some(t),
            Self::Entity(_) => None,
        }
    }
}

impl From<EntityType> for StructuralType {
    fn from(t: EntityType) -> Self {
        Self::Entity(t)
    }
}

impl From<ComplexType> for StructuralType {
    fn from(t: ComplexType) -> Self {
        Self::Complex(t)
    }
}

/// A remote service whose metadata has been (or will be) merged into the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataService {
    pub service_name: String,
    pub has_server_metadata: bool,
}

impl DataService {
    #[must_use]
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            has_server_metadata: true,
        }
    }

    #[must_use]
    pub fn without_server_metadata(mut self) -> Self {
        self.has_server_metadata = false;
        self
    }
}
