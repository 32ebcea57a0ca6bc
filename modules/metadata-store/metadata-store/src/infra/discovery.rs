//! `TypeDiscoverer` implementations.
//!
//! Native types are declared with `inventory::submit!` of a
//! `NativeTypeRegistration`; crates that do so must be linked into the final
//! binary (a `use some_crate as _;` is enough) for their types to be found.

use std::collections::HashMap;

use metadata_store_sdk::{Capability, NativeType, NativeTypeRegistration, TypeDiscoverer};

/// Scans the link-time `NativeTypeRegistration` table.
#[derive(Debug, Default, Clone, Copy)]
pub struct InventoryDiscoverer;

impl TypeDiscoverer for InventoryDiscoverer {
    fn discover(&self, capability: Capability, module: &str) -> Vec<NativeType> {
        inventory::iter::<NativeTypeRegistration>
            .into_iter()
            .filter(|r| r.module == module && r.capabilities.contains(&capability))
            .map(NativeTypeRegistration::to_native_type)
            .collect()
    }
}

/// A hand-maintained table of native types, grouped by module.
#[derive(Debug, Default, Clone)]
pub struct StaticDiscoverer {
    modules: HashMap<String, Vec<NativeType>>,
}

impl StaticDiscoverer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_type(mut self, native: NativeType) -> Self {
        self.modules
            .entry(native.module.clone())
            .or_default()
            .push(native);
        self
    }
}

impl TypeDiscoverer for StaticDiscoverer {
    fn discover(&self, capability: Capability, module: &str) -> Vec<NativeType> {
        self.modules
            .get(module)
            .map(|types| {
                types
                    .iter()
                    .filter(|t| t.implements(capability))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::discovery::OWN_MODULE;

    #[test]
    fn test_inventory_finds_builtin_validators() {
        let found = InventoryDiscoverer.discover(Capability::VALIDATOR, OWN_MODULE);
        let mut names: Vec<_> = found.iter().map(|t| t.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(
            names,
            vec![
                "EmailAddressValidator",
                "MaxLengthValidator",
                "RequiredValidator",
                "StringLengthValidator"
            ]
        );
        assert!(found.iter().all(|t| t.validator_factory.is_some()));
    }

    #[test]
    fn test_inventory_filters_by_module_and_capability() {
        assert!(InventoryDiscoverer.discover(Capability::ENTITY, OWN_MODULE).is_empty());
        assert!(InventoryDiscoverer.discover(Capability::VALIDATOR, "sales-model").is_empty());
    }

    #[test]
    fn test_static_discoverer_filters_capability() {
        let discoverer = StaticDiscoverer::new()
            .with_type(NativeType::new("sales-model", "Sales", "Order").with_capability(Capability::ENTITY))
            .with_type(NativeType::new("sales-model", "Sales", "Address").with_capability(Capability::COMPLEX_OBJECT));

        let entities = discoverer.discover(Capability::ENTITY, "sales-model");
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].name, "Order");
        assert!(discoverer.discover(Capability::ENTITY, "other").is_empty());
    }
}
