//! Type graph: the arena of structural types, its name indexes and the
//! pending-reference tables.
//!
//! The graph itself is not synchronized; `MetadataStore` guards it with a
//! single `RwLock` so that an `add` and the whole resolution cascade it
//! triggers are observed atomically.

use std::collections::HashMap;

use metadata_store_sdk::{
    ComplexType, DataProperty, EntityType, NavigationProperty, StructuralKind, StructuralType,
};
use tracing::debug;

use super::bridge::NativeTypeBridge;
use super::error::DomainError;

/// Arena slot of a structural type. Slots are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeIdx(pub(crate) usize);

/// A property addressed by its owning type slot and its position in that
/// type's data or navigation property list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertySlot {
    pub(crate) owner: TypeIdx,
    pub(crate) index: usize,
}

/// What `TypeGraph::add` did with the incoming type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Newly registered under its name.
    Registered,
    /// A type with the same name was already present; nothing changed.
    Duplicate,
    /// Stored and resolved, but not registered by name.
    Anonymous,
}

#[derive(Debug, Default)]
pub struct TypeGraph {
    pub(crate) types: Vec<StructuralType>,
    pub(crate) names: Vec<String>,
    pub(crate) by_name: HashMap<String, TypeIdx>,
    pub(crate) by_short_name: HashMap<String, Vec<TypeIdx>>,
    /// Named types in registration order.
    pub(crate) registered: Vec<TypeIdx>,
    /// Complex-typed data properties waiting for their complex type, keyed by its name.
    pub(crate) pending_complex: HashMap<String, Vec<PropertySlot>>,
    /// Navigation properties waiting for their target entity type, keyed by its name.
    pub(crate) pending_navigation: HashMap<String, Vec<PropertySlot>>,
    pub(crate) bridge: NativeTypeBridge,
}

impl TypeGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a structural type and runs every resolution step it triggers.
    ///
    /// # Errors
    ///
    /// Returns `MissingKey` for a concrete entity type without key properties.
    pub fn add(
        &mut self,
        structural_type: StructuralType,
    ) -> Result<(AddOutcome, TypeIdx), DomainError> {
        let name = structural_type.name();

        if let StructuralType::Entity(entity) = &structural_type
            && !entity.is_abstract
            && entity.key_properties().next().is_none()
        {
            return Err(DomainError::missing_key(name));
        }

        let is_anonymous = structural_type.is_anonymous();
        if !is_anonymous && let Some(existing) = self.by_name.get(&name) {
            debug!(type_name = %name, "Structural type already registered; ignoring duplicate");
            return Ok((AddOutcome::Duplicate, *existing));
        }

        let mut structural_type = structural_type;
        if let Some(entity) = structural_type.as_entity_type_mut() {
            for np in &mut entity.navigation_properties {
                np.parent_type = Some(name.clone());
            }
        }

        let idx = TypeIdx(self.types.len());
        let short_name = structural_type.short_name().to_owned();
        self.types.push(structural_type);
        self.names.push(name.clone());

        let outcome = if is_anonymous {
            AddOutcome::Anonymous
        } else {
            self.by_name.insert(name.clone(), idx);
            self.by_short_name.entry(short_name).or_default().push(idx);
            self.registered.push(idx);
            AddOutcome::Registered
        };

        self.resolve_added(idx);
        debug!(type_name = %name, ?outcome, "Added structural type");

        Ok((outcome, idx))
    }

    /// Looks up a type by exact qualified name, falling back to a unique short name.
    ///
    /// # Errors
    ///
    /// Returns `AmbiguousShortName` when the short name matches several types.
    pub fn lookup(&self, name: &str) -> Result<Option<TypeIdx>, DomainError> {
        if let Some(idx) = self.by_name.get(name) {
            return Ok(Some(*idx));
        }
        match self.by_short_name.get(name).map(Vec::as_slice) {
            Some([only]) => Ok(Some(*only)),
            Some([_, _, ..]) => Err(DomainError::ambiguous(name)),
            _ => Ok(None),
        }
    }

    /// Typed lookup honoring the "not found is OK" opt-in.
    ///
    /// # Errors
    ///
    /// - `WrongKind` if the name resolves to a type of the other kind
    /// - `NotFound` if nothing matches and `ok_if_not_found` is `false`
    pub fn get(
        &self,
        name: &str,
        kind: Option<StructuralKind>,
        ok_if_not_found: bool,
    ) -> Result<Option<&StructuralType>, DomainError> {
        let Some(idx) = self.lookup(name)? else {
            if ok_if_not_found {
                return Ok(None);
            }
            return Err(DomainError::not_found(name));
        };
        let found = self.type_at(idx);
        if let (Some(expected), Some(t)) = (kind, found)
            && t.kind() != expected
        {
            return Err(DomainError::wrong_kind(name, expected));
        }
        Ok(found)
    }

    #[must_use]
    pub fn type_at(&self, idx: TypeIdx) -> Option<&StructuralType> {
        self.types.get(idx.0)
    }

    #[must_use]
    pub fn name_at(&self, idx: TypeIdx) -> Option<&str> {
        self.names.get(idx.0).map(String::as_str)
    }

    /// Registered (non-anonymous) type of the given kind, by exact qualified name.
    #[must_use]
    pub fn registered_of_kind(&self, name: &str, kind: StructuralKind) -> Option<TypeIdx> {
        let idx = *self.by_name.get(name)?;
        (self.type_at(idx)?.kind() == kind).then_some(idx)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.registered.len()
    }

    /// Snapshot of all registered types, in registration order.
    #[must_use]
    pub fn structural_types(&self) -> Vec<StructuralType> {
        self.registered
            .iter()
            .filter_map(|idx| self.type_at(*idx).cloned())
            .collect()
    }

    #[must_use]
    pub fn entity_types(&self) -> Vec<EntityType> {
        self.registered
            .iter()
            .filter_map(|idx| self.type_at(*idx)?.as_entity_type().cloned())
            .collect()
    }

    #[must_use]
    pub fn complex_types(&self) -> Vec<ComplexType> {
        self.registered
            .iter()
            .filter_map(|idx| self.type_at(*idx)?.as_complex_type().cloned())
            .collect()
    }

    /// Number of navigation properties still waiting for their target.
    #[must_use]
    pub fn pending_navigation_count(&self) -> usize {
        self.pending_navigation.values().map(Vec::len).sum()
    }

    /// Number of complex properties still waiting for their complex type.
    #[must_use]
    pub fn pending_complex_count(&self) -> usize {
        self.pending_complex.values().map(Vec::len).sum()
    }

    #[must_use]
    pub const fn bridge(&self) -> &NativeTypeBridge {
        &self.bridge
    }

    pub const fn bridge_mut(&mut self) -> &mut NativeTypeBridge {
        &mut self.bridge
    }

    pub(crate) fn entity(&self, idx: TypeIdx) -> Option<&EntityType> {
        self.type_at(idx)?.as_entity_type()
    }

    pub(crate) fn entity_mut(&mut self, idx: TypeIdx) -> Option<&mut EntityType> {
        self.types.get_mut(idx.0)?.as_entity_type_mut()
    }

    pub(crate) fn navigation(&self, slot: PropertySlot) -> Option<&NavigationProperty> {
        self.entity(slot.owner)?.navigation_properties.get(slot.index)
    }

    pub(crate) fn navigation_mut(&mut self, slot: PropertySlot) -> Option<&mut NavigationProperty> {
        self.entity_mut(slot.owner)?
            .navigation_properties
            .get_mut(slot.index)
    }

    pub(crate) fn data_property(&self, slot: PropertySlot) -> Option<&DataProperty> {
        self.type_at(slot.owner)?.data_properties().get(slot.index)
    }

    pub(crate) fn data_property_mut(&mut self, slot: PropertySlot) -> Option<&mut DataProperty> {
        self.types
            .get_mut(slot.owner.0)?
            .data_properties_mut()
            .get_mut(slot.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyed(short_name: &str) -> EntityType {
        EntityType::new(short_name, "Sales")
            .with_data_property(DataProperty::new("Id").with_data_type("Int32").part_of_key())
    }

    #[test]
    fn test_add_registers_by_name() {
        let mut graph = TypeGraph::new();
        let (outcome, _) = graph.add(keyed("Order").into()).unwrap();
        assert_eq!(outcome, AddOutcome::Registered);
        assert!(graph.contains("Order:#Sales"));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_duplicate_add_is_ignored() {
        let mut graph = TypeGraph::new();
        let (_, first) = graph.add(keyed("Order").into()).unwrap();
        let (outcome, second) = graph.add(keyed("Order").into()).unwrap();
        assert_eq!(outcome, AddOutcome::Duplicate);
        assert_eq!(first, second);
        assert_eq!(graph.structural_types().len(), 1);
    }

    #[test]
    fn test_missing_key_rejected() {
        let mut graph = TypeGraph::new();
        let result = graph.add(EntityType::new("Order", "Sales").into());
        assert!(matches!(result, Err(DomainError::MissingKey(_))));
        assert!(graph.is_empty());
    }

    #[test]
    fn test_abstract_without_key_accepted() {
        let mut graph = TypeGraph::new();
        let result = graph.add(EntityType::new("Party", "Sales").abstract_type().into());
        assert!(result.is_ok());
    }

    #[test]
    fn test_anonymous_not_registered_by_name() {
        let mut graph = TypeGraph::new();
        let (outcome, idx) = graph
            .add(ComplexType::new("Projection", "Sales").anonymous().into())
            .unwrap();
        assert_eq!(outcome, AddOutcome::Anonymous);
        assert!(!graph.contains("Projection:#Sales"));
        assert!(graph.type_at(idx).is_some());
        assert!(graph.structural_types().is_empty());
    }

    #[test]
    fn test_lookup_by_short_name() {
        let mut graph = TypeGraph::new();
        graph.add(keyed("Order").into()).unwrap();
        let found = graph.get("Order", Some(StructuralKind::Entity), false).unwrap();
        assert_eq!(found.map(StructuralType::name), Some("Order:#Sales".to_owned()));
    }

    #[test]
    fn test_lookup_ambiguous_short_name() {
        let mut graph = TypeGraph::new();
        graph.add(keyed("Order").into()).unwrap();
        graph
            .add(
                EntityType::new("Order", "Archive")
                    .with_data_property(DataProperty::new("Id").part_of_key())
                    .into(),
            )
            .unwrap();
        assert!(matches!(
            graph.lookup("Order"),
            Err(DomainError::AmbiguousShortName(_))
        ));
    }

    #[test]
    fn test_get_wrong_kind() {
        let mut graph = TypeGraph::new();
        graph.add(ComplexType::new("Address", "Sales").into()).unwrap();
        let result = graph.get("Address", Some(StructuralKind::Entity), true);
        assert!(matches!(result, Err(DomainError::WrongKind { .. })));
    }

    #[test]
    fn test_get_not_found_opt_in() {
        let graph = TypeGraph::new();
        assert!(graph.get("Missing:#Sales", None, true).unwrap().is_none());
        assert!(matches!(
            graph.get("Missing:#Sales", None, false),
            Err(DomainError::NotFound(_))
        ));
    }
}
