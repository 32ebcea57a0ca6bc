//! Configuration for the Metadata Store module.

use serde::Deserialize;

use crate::domain::error::DomainError;

/// Configuration for the Metadata Store module.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct MetadataStoreConfig {
    /// Version string written into exported documents.
    /// Default: `"1.0.5"`
    pub metadata_version: String,

    /// Name of the naming convention active at construction.
    /// Default: `"noChange"`
    pub naming_convention: String,

    /// Code modules probed for native types when the store is created.
    pub probe_modules: Vec<String>,

    /// Whether validator discovery scans the store's own module, where the
    /// built-in validators live.
    /// Default: `true`
    pub include_own_module_for_validators: bool,
}

impl Default for MetadataStoreConfig {
    fn default() -> Self {
        Self {
            metadata_version: "1.0.5".to_owned(),
            naming_convention: "noChange".to_owned(),
            probe_modules: Vec::new(),
            include_own_module_for_validators: true,
        }
    }
}

impl MetadataStoreConfig {
    /// Parses an optional raw configuration section.
    ///
    /// A missing section or a non-object value yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDocument` if the section is an object that does not parse.
    pub fn from_section(section: Option<&serde_json::Value>) -> Result<Self, DomainError> {
        let Some(section) = section.filter(|s| s.is_object()) else {
            return Ok(Self::default());
        };
        Ok(serde_json::from_value(section.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_config() {
        let cfg = MetadataStoreConfig::default();
        assert_eq!(cfg.metadata_version, "1.0.5");
        assert_eq!(cfg.naming_convention, "noChange");
        assert!(cfg.probe_modules.is_empty());
        assert!(cfg.include_own_module_for_validators);
    }

    #[test]
    fn test_missing_section_uses_defaults() {
        assert_eq!(
            MetadataStoreConfig::from_section(None).unwrap(),
            MetadataStoreConfig::default()
        );
        assert_eq!(
            MetadataStoreConfig::from_section(Some(&json!("oops"))).unwrap(),
            MetadataStoreConfig::default()
        );
    }

    #[test]
    fn test_partial_section_fills_defaults() {
        let section = json!({ "naming_convention": "camelCase", "probe_modules": ["sales-model"] });
        let cfg = MetadataStoreConfig::from_section(Some(&section)).unwrap();
        assert_eq!(cfg.naming_convention, "camelCase");
        assert_eq!(cfg.probe_modules, vec!["sales-model"]);
        assert_eq!(cfg.metadata_version, "1.0.5");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let section = json!({ "naming": "camelCase" });
        assert!(matches!(
            MetadataStoreConfig::from_section(Some(&section)),
            Err(DomainError::InvalidDocument(_))
        ));
    }
}
