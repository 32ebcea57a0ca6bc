//! Validator registry.
//!
//! Maps canonical validator names to their factories and interns validator
//! instances by serialized definition, so structurally identical validators
//! are shared across the whole store.

use std::collections::HashMap;
use std::sync::Arc;

use metadata_store_sdk::validator::{canonical_key, definition_name};
use metadata_store_sdk::{
    Capability, NativeType, NativeTypeRegistration, Validator, ValidatorDefinition,
    ValidatorFactory,
};
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, warn};

use super::discovery::OWN_MODULE;
use super::error::RecordedError;

const VALIDATOR_SUFFIX: &str = "Validator";

/// Derives the canonical validator name from a native type name:
/// `MaxLengthValidator` becomes `maxLength`.
#[must_use]
pub fn validator_name_for_type(type_name: &str) -> String {
    let base = type_name
        .strip_suffix(VALIDATOR_SUFFIX)
        .filter(|s| !s.is_empty())
        .unwrap_or(type_name);
    let mut chars = base.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

#[derive(Default)]
struct ValidatorTables {
    factories: HashMap<String, ValidatorFactory>,
    /// Canonical serialized definition -> interned instance.
    interned: HashMap<String, Arc<Validator>>,
}

#[derive(Default)]
pub struct ValidatorRegistry {
    tables: Mutex<ValidatorTables>,
    errors: Mutex<Vec<RecordedError>>,
}

impl ValidatorRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes a concrete, non-generic validator type by its canonical name.
    ///
    /// Returns `false` if the type was skipped.
    pub fn register_type(&self, native: &NativeType) -> bool {
        if native.is_abstract || native.is_generic {
            return false;
        }
        let Some(factory) = native.validator_factory else {
            return false;
        };
        let name = validator_name_for_type(&native.name);
        debug!(validator = %name, native_type = %native.full_name(), "Registered validator type");
        self.tables.lock().factories.insert(name, factory);
        true
    }

    #[must_use]
    pub fn is_registered(&self, name: &str) -> bool {
        self.tables.lock().factories.contains_key(name)
    }

    /// Returns the interned validator for `definition`, constructing it on first use.
    ///
    /// An unknown validator name or a rejected definition is recorded in the
    /// error list and yields `None`.
    pub fn find_or_create(&self, definition: &ValidatorDefinition) -> Option<Arc<Validator>> {
        let key = canonical_key(definition);
        let name = definition_name(definition).unwrap_or_default().to_owned();

        let outcome = {
            let mut tables = self.tables.lock();
            if let Some(existing) = tables.interned.get(&key) {
                return Some(Arc::clone(existing));
            }
            match tables.factories.get(&name).copied() {
                None => Err(format!("Unable to create a validator for {name}")),
                Some(factory) => factory(definition).map(|validator| {
                    let validator = Arc::new(validator);
                    validator.mark_interned();
                    tables.interned.insert(key, Arc::clone(&validator));
                    validator
                }),
            }
        };

        match outcome {
            Ok(validator) => Some(validator),
            Err(message) => {
                warn!(validator = %name, error = %message, "Validator could not be materialized");
                self.errors.lock().push(RecordedError::new(name, message));
                None
            }
        }
    }

    /// Returns the canonical instance for the validator's definition, making
    /// `validator` canonical if none exists yet.
    pub fn intern(&self, validator: Arc<Validator>) -> Arc<Validator> {
        let key = validator.canonical_key();
        let mut tables = self.tables.lock();
        if let Some(existing) = tables.interned.get(&key) {
            return Arc::clone(existing);
        }
        validator.mark_interned();
        tables.interned.insert(key, Arc::clone(&validator));
        validator
    }

    /// Snapshot of the recorded validator errors.
    #[must_use]
    pub fn errors(&self) -> Vec<RecordedError> {
        self.errors.lock().clone()
    }

    #[cfg(test)]
    fn interned_count(&self) -> usize {
        self.tables.lock().interned.len()
    }
}

fn required(definition: &ValidatorDefinition) -> Result<Validator, String> {
    Ok(Validator::from_definition(definition.clone()))
}

fn email_address(definition: &ValidatorDefinition) -> Result<Validator, String> {
    Ok(Validator::from_definition(definition.clone()))
}

fn max_length(definition: &ValidatorDefinition) -> Result<Validator, String> {
    require_length(definition, "maxLength")?;
    Ok(Validator::from_definition(definition.clone()))
}

fn string_length(definition: &ValidatorDefinition) -> Result<Validator, String> {
    let min = require_length(definition, "minLength")?;
    let max = require_length(definition, "maxLength")?;
    if min > max {
        return Err(format!("minLength {min} exceeds maxLength {max}"));
    }
    Ok(Validator::from_definition(definition.clone()))
}

fn require_length(definition: &ValidatorDefinition, param: &str) -> Result<u64, String> {
    definition
        .get(param)
        .and_then(Value::as_u64)
        .ok_or_else(|| format!("missing or non-numeric {param} parameter"))
}

inventory::submit! {
    NativeTypeRegistration {
        module: OWN_MODULE,
        namespace: "Validation",
        name: "RequiredValidator",
        capabilities: &[Capability::VALIDATOR],
        is_abstract: false,
        is_generic: false,
        validator_factory: Some(required),
    }
}

inventory::submit! {
    NativeTypeRegistration {
        module: OWN_MODULE,
        namespace: "Validation",
        name: "MaxLengthValidator",
        capabilities: &[Capability::VALIDATOR],
        is_abstract: false,
        is_generic: false,
        validator_factory: Some(max_length),
    }
}

inventory::submit! {
    NativeTypeRegistration {
        module: OWN_MODULE,
        namespace: "Validation",
        name: "StringLengthValidator",
        capabilities: &[Capability::VALIDATOR],
        is_abstract: false,
        is_generic: false,
        validator_factory: Some(string_length),
    }
}

inventory::submit! {
    NativeTypeRegistration {
        module: OWN_MODULE,
        namespace: "Validation",
        name: "EmailAddressValidator",
        capabilities: &[Capability::VALIDATOR],
        is_abstract: false,
        is_generic: false,
        validator_factory: Some(email_address),
    }
}
