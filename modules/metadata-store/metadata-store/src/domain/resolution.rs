//! Forward-reference resolution.
//!
//! Every `TypeGraph::add` runs `resolve_added` on the new slot. References
//! whose target is not registered yet are parked in one of the two pending
//! tables and drained exactly once, when the awaited type arrives.

use metadata_store_sdk::{DataPropertyRef, NavigationPropertyRef, StructuralKind};
use tracing::debug;

use super::graph::{PropertySlot, TypeGraph, TypeIdx};

impl TypeGraph {
    pub(crate) fn resolve_added(&mut self, idx: TypeIdx) {
        let Some(t) = self.type_at(idx) else {
            return;
        };
        let is_anonymous = t.is_anonymous();
        let kind = t.kind();
        let name = self.name_at(idx).unwrap_or_default().to_owned();

        if !is_anonymous {
            self.bridge.bind_structural(&name);
        }

        self.resolve_complex_properties(idx);

        match kind {
            StructuralKind::Complex => {
                if !is_anonymous {
                    self.drain_pending_complex(&name);
                }
            }
            StructuralKind::Entity => {
                self.resolve_navigation_properties(idx);
                if !is_anonymous {
                    self.drain_pending_navigation(idx, &name);
                    self.link_base_type(idx);
                    self.adopt_sub_types(idx, &name);
                }
            }
        }
    }

    /// Binds each unresolved complex property of `idx` or parks it as pending.
    fn resolve_complex_properties(&mut self, idx: TypeIdx) {
        let count = self
            .type_at(idx)
            .map_or(0, |t| t.data_properties().len());

        for index in 0..count {
            let slot = PropertySlot { owner: idx, index };
            let Some(target) = self.data_property(slot).and_then(|p| {
                if p.complex_type.is_some() {
                    None
                } else {
                    p.complex_type_name.clone()
                }
            }) else {
                continue;
            };

            if self
                .registered_of_kind(&target, StructuralKind::Complex)
                .is_some()
            {
                self.bind_complex_property(slot, &target);
            } else {
                debug!(complex_type = %target, "Complex type not yet known; deferring property");
                self.pending_complex.entry(target).or_default().push(slot);
            }
        }
    }

    fn bind_complex_property(&mut self, slot: PropertySlot, complex_type: &str) {
        if let Some(p) = self.data_property_mut(slot)
            && p.complex_type.is_none()
        {
            p.complex_type = Some(complex_type.to_owned());
        }
    }

    /// Binds every complex property that was waiting on `name`.
    fn drain_pending_complex(&mut self, name: &str) {
        let Some(slots) = self.pending_complex.remove(name) else {
            return;
        };
        debug!(complex_type = %name, count = slots.len(), "Resolving deferred complex properties");
        for slot in slots {
            self.bind_complex_property(slot, name);
        }
    }

    /// Binds leftover pending complex properties whose target is now registered.
    ///
    /// Returns how many properties were bound.
    pub(crate) fn resolve_dangling_complex_properties(&mut self) -> usize {
        let ready: Vec<String> = self
            .pending_complex
            .keys()
            .filter(|name| {
                self.registered_of_kind(name, StructuralKind::Complex)
                    .is_some()
            })
            .cloned()
            .collect();

        let mut bound = 0;
        for name in ready {
            bound += self.pending_complex.get(&name).map_or(0, Vec::len);
            self.drain_pending_complex(&name);
        }
        bound
    }

    /// Resolves each navigation property of `idx` or parks it as pending.
    fn resolve_navigation_properties(&mut self, idx: TypeIdx) {
        let count = self
            .entity(idx)
            .map_or(0, |e| e.navigation_properties.len());

        for index in 0..count {
            let slot = PropertySlot { owner: idx, index };
            let (target_name, nav_name) = match self.navigation(slot) {
                Some(np) if !np.is_resolved() => (np.entity_type_name.clone(), np.name.clone()),
                _ => continue,
            };

            match self.registered_of_kind(&target_name, StructuralKind::Entity) {
                Some(target) => self.resolve_navigation(slot, target),
                None => {
                    debug!(entity_type = %target_name, navigation = %nav_name, "Target entity type not yet known; deferring navigation property");
                    self.pending_navigation
                        .entry(target_name)
                        .or_default()
                        .push(slot);
                }
            }
        }
    }

    /// Resolves every navigation property that was waiting on the entity type `name`.
    fn drain_pending_navigation(&mut self, target: TypeIdx, name: &str) {
        let Some(slots) = self.pending_navigation.remove(name) else {
            return;
        };
        debug!(entity_type = %name, count = slots.len(), "Resolving deferred navigation properties");
        for slot in slots {
            self.resolve_navigation(slot, target);
        }
    }

    /// Binds `slot` to its target entity type, pairs it with its inverse and
    /// links the foreign keys implementing it. A resolved property is never
    /// resolved again.
    fn resolve_navigation(&mut self, slot: PropertySlot, target: TypeIdx) {
        let Some(target_name) = self.name_at(target).map(ToOwned::to_owned) else {
            return;
        };
        let Some(np_ref) = self.navigation_ref(slot) else {
            return;
        };

        let association = match self.navigation_mut(slot) {
            Some(np) if np.entity_type.is_none() => {
                np.entity_type = Some(target_name);
                np.association_name.clone()
            }
            _ => return,
        };

        let inverse = association
            .as_deref()
            .and_then(|association| self.find_inverse(target, association, &np_ref));

        match inverse {
            Some(inverse_slot) => self.pair_inverses(slot, inverse_slot),
            None => self.mark_inverse_foreign_keys(slot, target),
        }

        self.link_foreign_keys(slot, target);
    }

    /// Finds the navigation property on `target` sharing `association` but not
    /// identical to `np_ref` (different name or different declaring type).
    fn find_inverse(
        &self,
        target: TypeIdx,
        association: &str,
        np_ref: &NavigationPropertyRef,
    ) -> Option<PropertySlot> {
        let target_name = self.name_at(target)?;
        let entity = self.entity(target)?;

        entity
            .navigation_properties
            .iter()
            .position(|candidate| {
                candidate.association_name.as_deref() == Some(association)
                    && (candidate.name != np_ref.name || target_name != np_ref.entity_type)
            })
            .map(|index| PropertySlot {
                owner: target,
                index,
            })
    }

    fn pair_inverses(&mut self, a: PropertySlot, b: PropertySlot) {
        let (Some(a_ref), Some(b_ref)) = (self.navigation_ref(a), self.navigation_ref(b)) else {
            return;
        };
        debug!(navigation = %a_ref, inverse = %b_ref, "Paired inverse navigation properties");
        if let Some(np) = self.navigation_mut(a) {
            np.inverse = Some(b_ref);
        }
        if let Some(np) = self.navigation_mut(b) {
            np.inverse = Some(a_ref);
        }
    }

    /// Unidirectional relationship: the foreign keys live on the target type.
    fn mark_inverse_foreign_keys(&mut self, slot: PropertySlot, target: TypeIdx) {
        let Some(np_ref) = self.navigation_ref(slot) else {
            return;
        };
        let Some(target_name) = self.name_at(target).map(ToOwned::to_owned) else {
            return;
        };
        let inv_fk_names = self
            .navigation(slot)
            .map(|np| np.inv_foreign_key_names.clone())
            .unwrap_or_default();

        for fk_name in inv_fk_names {
            let Some(fk_slot) = self.find_data_property(target, &fk_name) else {
                debug!(entity_type = %target_name, property = %fk_name, "Inverse foreign key property not found");
                continue;
            };
            if let Some(dp) = self.data_property_mut(fk_slot) {
                dp.is_foreign_key = true;
                if dp.related_navigation_property.is_none() {
                    dp.related_navigation_property = Some(np_ref.clone());
                }
            }
            if let Some(owner) = self.entity_mut(slot.owner) {
                push_unique(
                    &mut owner.inverse_foreign_key_properties,
                    DataPropertyRef::new(target_name.clone(), fk_name),
                );
            }
        }
    }

    /// Links each forward foreign key of `slot` to it, both ways.
    fn link_foreign_keys(&mut self, slot: PropertySlot, target: TypeIdx) {
        let Some(np_ref) = self.navigation_ref(slot) else {
            return;
        };
        let fk_names = self
            .navigation(slot)
            .map(|np| np.foreign_key_names.clone())
            .unwrap_or_default();

        for fk_name in fk_names {
            let Some(fk_slot) = self.find_data_property(slot.owner, &fk_name) else {
                debug!(navigation = %np_ref, property = %fk_name, "Foreign key property not found");
                continue;
            };
            if let Some(dp) = self.data_property_mut(fk_slot) {
                dp.is_foreign_key = true;
                dp.related_navigation_property = Some(np_ref.clone());
            }
            if let Some(owner) = self.entity_mut(slot.owner) {
                push_unique(&mut owner.foreign_key_properties, fk_name.clone());
            }
            if let Some(target_entity) = self.entity_mut(target) {
                push_unique(
                    &mut target_entity.inverse_foreign_key_properties,
                    DataPropertyRef::new(np_ref.entity_type.clone(), fk_name),
                );
            }
        }
    }

    /// Links `idx` to its declared base type if that base is registered.
    fn link_base_type(&mut self, idx: TypeIdx) {
        let Some(base_name) = self
            .entity(idx)
            .filter(|e| e.base_entity_type.is_none())
            .and_then(|e| e.base_type_name.clone())
        else {
            return;
        };
        if let Some(base) = self.registered_of_kind(&base_name, StructuralKind::Entity) {
            self.set_base_type(idx, base);
        }
    }

    /// Links already registered types that declared `name` as their base.
    fn adopt_sub_types(&mut self, base: TypeIdx, name: &str) {
        let waiting: Vec<TypeIdx> = self
            .registered
            .iter()
            .copied()
            .filter(|idx| *idx != base)
            .filter(|idx| {
                self.entity(*idx).is_some_and(|e| {
                    e.base_entity_type.is_none() && e.base_type_name.as_deref() == Some(name)
                })
            })
            .collect();

        for derived in waiting {
            self.set_base_type(derived, base);
        }
    }

    fn set_base_type(&mut self, derived: TypeIdx, base: TypeIdx) {
        let (Some(derived_name), Some(base_name)) = (
            self.name_at(derived).map(ToOwned::to_owned),
            self.name_at(base).map(ToOwned::to_owned),
        ) else {
            return;
        };
        if let Some(e) = self.entity_mut(derived) {
            e.base_entity_type = Some(base_name.clone());
        }
        if let Some(e) = self.entity_mut(base) {
            push_unique(&mut e.sub_types, derived_name.clone());
        }
        debug!(entity_type = %derived_name, base_type = %base_name, "Linked sub-entity type");
    }

    fn navigation_ref(&self, slot: PropertySlot) -> Option<NavigationPropertyRef> {
        let owner = self.name_at(slot.owner)?;
        let np = self.navigation(slot)?;
        Some(NavigationPropertyRef::new(owner, np.name.clone()))
    }

    fn find_data_property(&self, owner: TypeIdx, name: &str) -> Option<PropertySlot> {
        self.type_at(owner)?
            .data_properties()
            .iter()
            .position(|p| p.name == name)
            .map(|index| PropertySlot { owner, index })
    }
}

fn push_unique<T: PartialEq>(items: &mut Vec<T>, item: T) {
    if !items.contains(&item) {
        items.push(item);
    }
}
