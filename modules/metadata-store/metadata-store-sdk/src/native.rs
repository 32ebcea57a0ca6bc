//! Native (host) type descriptors.
//!
//! Native types are the runtime side of the type bridge. They are contributed
//! by code modules through `inventory::submit!` of a `NativeTypeRegistration`,
//! or handed to the store directly by a custom `TypeDiscoverer`.

use std::fmt;

use crate::validator::ValidatorFactory;

/// A capability (marker) a native type can implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Capability(&'static str);

impl Capability {
    /// Types that map to entity types.
    pub const ENTITY: Self = Self("entity");
    /// Types that map to complex types.
    pub const COMPLEX_OBJECT: Self = Self("complex_object");
    /// Validator implementations.
    pub const VALIDATOR: Self = Self("validator");

    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// A host type discovered in a code module.
#[derive(Clone)]
pub struct NativeType {
    /// Name of the hosting code module.
    pub module: String,
    pub namespace: String,
    pub name: String,
    pub capabilities: Vec<Capability>,
    pub is_abstract: bool,
    pub is_generic: bool,
    pub validator_factory: Option<ValidatorFactory>,
}

impl NativeType {
    #[must_use]
    pub fn new(
        module: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            module: module.into(),
            namespace: namespace.into(),
            name: name.into(),
            capabilities: Vec::new(),
            is_abstract: false,
            is_generic: false,
            validator_factory: None,
        }
    }

    #[must_use]
    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities.push(capability);
        self
    }

    #[must_use]
    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    #[must_use]
    pub fn generic(mut self) -> Self {
        self.is_generic = true;
        self
    }

    #[must_use]
    pub fn with_validator_factory(mut self, factory: ValidatorFactory) -> Self {
        self.validator_factory = Some(factory);
        self.with_capability(Capability::VALIDATOR)
    }

    #[must_use]
    pub fn implements(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Full path of the type (`namespace::name`).
    #[must_use]
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}::{}", self.namespace, self.name)
        }
    }

    /// Two descriptors denote the same native type when module and path match.
    #[must_use]
    pub fn same_type(&self, other: &Self) -> bool {
        self.module == other.module && self.namespace == other.namespace && self.name == other.name
    }
}

impl fmt::Debug for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeType")
            .field("module", &self.module)
            .field("namespace", &self.namespace)
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .field("is_abstract", &self.is_abstract)
            .field("is_generic", &self.is_generic)
            .field("has_validator_factory", &self.validator_factory.is_some())
            .finish()
    }
}

/// Link-time registration of a native type.
///
/// ```ignore
/// inventory::submit! {
///     NativeTypeRegistration {
///         module: env!("CARGO_PKG_NAME"),
///         namespace: "Sales",
///         name: "Order",
///         capabilities: &[Capability::ENTITY],
///         is_abstract: false,
///         is_generic: false,
///         validator_factory: None,
///     }
/// }
/// ```
pub struct NativeTypeRegistration {
    pub module: &'static str,
    pub namespace: &'static str,
    pub name: &'static str,
    pub capabilities: &'static [Capability],
    pub is_abstract: bool,
    pub is_generic: bool,
    pub validator_factory: Option<ValidatorFactory>,
}

inventory::collect!(NativeTypeRegistration);

impl NativeTypeRegistration {
    #[must_use]
    pub fn to_native_type(&self) -> NativeType {
        NativeType {
            module: self.module.to_owned(),
            namespace: self.namespace.to_owned(),
            name: self.name.to_owned(),
            capabilities: self.capabilities.to_vec(),
            is_abstract: self.is_abstract,
            is_generic: self.is_generic,
            validator_factory: self.validator_factory,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_type_builder() {
        let t = NativeType::new("sales-model", "Sales", "Order").with_capability(Capability::ENTITY);
        assert!(t.implements(Capability::ENTITY));
        assert!(!t.implements(Capability::VALIDATOR));
        assert_eq!(t.full_name(), "Sales::Order");
    }

    #[test]
    fn test_same_type() {
        let a = NativeType::new("m", "Sales", "Order");
        let b = NativeType::new("m", "Sales", "Order").with_capability(Capability::ENTITY);
        let c = NativeType::new("other", "Sales", "Order");
        assert!(a.same_type(&b));
        assert!(!a.same_type(&c));
    }
}
