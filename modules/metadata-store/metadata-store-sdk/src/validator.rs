//! Validator definitions.
//!
//! A validator is identified by its serialized definition: a JSON object
//! carrying a `name` field plus any parameters. Two validators with identical
//! definitions are interchangeable, which is what the store's interning
//! cache relies on.

use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;

/// Serialized validator definition (`{"name": "maxLength", "maxLength": 40}`).
pub type ValidatorDefinition = serde_json::Map<String, Value>;

/// Constructs a validator from its definition, rejecting missing or malformed parameters.
pub type ValidatorFactory = fn(&ValidatorDefinition) -> Result<Validator, String>;

const NAME_FIELD: &str = "name";

#[derive(Debug)]
pub struct Validator {
    definition: ValidatorDefinition,
    interned: AtomicBool,
}

impl Validator {
    /// Creates a validator with the given name and parameters.
    #[must_use]
    pub fn new(name: &str, mut params: ValidatorDefinition) -> Self {
        params.insert(NAME_FIELD.to_owned(), Value::String(name.to_owned()));
        Self::from_definition(params)
    }

    #[must_use]
    pub const fn from_definition(definition: ValidatorDefinition) -> Self {
        Self {
            definition,
            interned: AtomicBool::new(false),
        }
    }

    /// Validator name as stored in the definition; empty if absent.
    #[must_use]
    pub fn name(&self) -> &str {
        definition_name(&self.definition).unwrap_or_default()
    }

    #[must_use]
    pub const fn definition(&self) -> &ValidatorDefinition {
        &self.definition
    }

    #[must_use]
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.definition.get(key)
    }

    /// Canonical serialized form used as the interning key.
    #[must_use]
    pub fn canonical_key(&self) -> String {
        canonical_key(&self.definition)
    }

    #[must_use]
    pub fn is_interned(&self) -> bool {
        self.interned.load(Ordering::Acquire)
    }

    /// Marks this instance as the canonical shared instance for its definition.
    pub fn mark_interned(&self) {
        self.interned.store(true, Ordering::Release);
    }
}

impl PartialEq for Validator {
    fn eq(&self, other: &Self) -> bool {
        self.definition == other.definition
    }
}

/// Reads the `name` field of a definition.
#[must_use]
pub fn definition_name(definition: &ValidatorDefinition) -> Option<&str> {
    definition.get(NAME_FIELD).and_then(Value::as_str)
}

/// Canonical serialized form of a definition.
///
/// Object keys are sorted at every level, so structurally equal definitions
/// serialize to identical strings whatever the map's iteration order.
#[must_use]
pub fn canonical_key(definition: &ValidatorDefinition) -> String {
    sorted_object(definition).to_string()
}

fn sorted_object(map: &ValidatorDefinition) -> Value {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
    Value::Object(
        entries
            .into_iter()
            .map(|(key, value)| (key.clone(), sorted_value(value)))
            .collect(),
    )
}

fn sorted_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => sorted_object(map),
        Value::Array(items) => Value::Array(items.iter().map(sorted_value).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> ValidatorDefinition {
        match value {
            Value::Object(map) => map,
            _ => ValidatorDefinition::new(),
        }
    }

    #[test]
    fn test_name_and_params() {
        let v = Validator::new("maxLength", params(json!({ "maxLength": 40 })));
        assert_eq!(v.name(), "maxLength");
        assert_eq!(v.param("maxLength"), Some(&json!(40)));
        assert!(!v.is_interned());
    }

    #[test]
    fn test_canonical_key_ignores_insertion_order() {
        let a = Validator::from_definition(params(json!({ "name": "stringLength", "minLength": 1, "maxLength": 5 })));
        let b = Validator::from_definition(params(json!({ "maxLength": 5, "name": "stringLength", "minLength": 1 })));
        assert_eq!(a.canonical_key(), b.canonical_key());
        assert_eq!(a, b);
    }

    #[test]
    fn test_canonical_key_sorts_nested_objects() {
        let mut outer = ValidatorDefinition::new();
        outer.insert("pattern".to_owned(), json!({ "flags": "i", "expr": "^a" }));
        outer.insert("name".to_owned(), json!("regex"));

        let key = canonical_key(&outer);
        assert_eq!(key, r#"{"name":"regex","pattern":{"expr":"^a","flags":"i"}}"#);
    }

    #[test]
    fn test_mark_interned() {
        let v = Validator::new("required", ValidatorDefinition::new());
        v.mark_interned();
        assert!(v.is_interned());
    }
}
