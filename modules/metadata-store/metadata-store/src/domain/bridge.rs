//! Bidirectional binding between structural types and native types.
//!
//! Entries are keyed by structural type name and filled in from either side
//! as each becomes known. A side, once written, is never overwritten.

use std::collections::HashMap;

use metadata_store_sdk::NativeType;
use tracing::debug;

/// One entry of the bridge; either side may still be missing.
#[derive(Debug, Clone, Default)]
pub struct TypeBinding {
    /// Qualified name of the registered structural type.
    pub structural: Option<String>,
    pub native: Option<NativeType>,
}

#[cfg(test)]
impl TypeBinding {
    const fn is_complete(&self) -> bool {
        self.structural.is_some() && self.native.is_some()
    }
}

/// Result of binding a native type.
#[derive(Debug, Clone)]
pub struct NativeBinding {
    /// Structural type name, if that side is already known.
    pub structural: Option<String>,
    /// `true` when this call filled the native side of the entry.
    pub first_seen: bool,
}

#[derive(Debug, Default)]
pub struct NativeTypeBridge {
    bindings: HashMap<String, TypeBinding>,
}

impl NativeTypeBridge {
    /// Fills the structural side of the entry for `name`, creating it if absent.
    pub fn bind_structural(&mut self, name: &str) -> &TypeBinding {
        let binding = self.bindings.entry(name.to_owned()).or_default();
        if binding.structural.is_none() {
            binding.structural = Some(name.to_owned());
        }
        binding
    }

    /// Fills the native side of the entry for `structural_name`, creating it if absent.
    pub fn bind_native(&mut self, structural_name: &str, native: &NativeType) -> NativeBinding {
        let binding = self.bindings.entry(structural_name.to_owned()).or_default();
        let first_seen = match &binding.native {
            None => {
                binding.native = Some(native.clone());
                true
            }
            Some(existing) => {
                if !existing.same_type(native) {
                    debug!(
                        structural_type = %structural_name,
                        bound = %existing.full_name(),
                        rejected = %native.full_name(),
                        "Native side already bound; keeping first binding"
                    );
                }
                false
            }
        };
        NativeBinding {
            structural: binding.structural.clone(),
            first_seen,
        }
    }

    #[must_use]
    pub fn binding(&self, structural_name: &str) -> Option<&TypeBinding> {
        self.bindings.get(structural_name)
    }

    #[must_use]
    pub fn native_for(&self, structural_name: &str) -> Option<&NativeType> {
        self.bindings.get(structural_name)?.native.as_ref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
