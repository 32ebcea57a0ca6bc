//! Naming conventions.
//!
//! A naming convention translates property names between the server and the
//! client, and derives the structural type name a native type corresponds to.

use std::fmt;
use std::sync::Arc;

use crate::models::qualify_type_name;
use crate::native::NativeType;

pub trait NamingConvention: Send + Sync + fmt::Debug {
    /// Name under which the convention is exported.
    fn name(&self) -> &str;

    fn server_property_name_to_client(&self, server_name: &str) -> String;

    fn client_property_name_to_server(&self, client_name: &str) -> String;

    /// Structural type name a native type would be registered under.
    fn structural_type_name(&self, native: &NativeType) -> String {
        qualify_type_name(&native.name, &native.namespace)
    }
}

/// Leaves names untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoChangeConvention;

impl NoChangeConvention {
    pub const NAME: &'static str = "noChange";
}

impl NamingConvention for NoChangeConvention {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn server_property_name_to_client(&self, server_name: &str) -> String {
        server_name.to_owned()
    }

    fn client_property_name_to_server(&self, client_name: &str) -> String {
        client_name.to_owned()
    }
}

/// `CustomerId` on the server is `customerId` on the client.
#[derive(Debug, Default, Clone, Copy)]
pub struct CamelCaseConvention;

impl CamelCaseConvention {
    pub const NAME: &'static str = "camelCase";
}

impl NamingConvention for CamelCaseConvention {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn server_property_name_to_client(&self, server_name: &str) -> String {
        map_first_char(server_name, char::to_ascii_lowercase)
    }

    fn client_property_name_to_server(&self, client_name: &str) -> String {
        map_first_char(client_name, char::to_ascii_uppercase)
    }
}

fn map_first_char(s: &str, f: impl Fn(&char) -> char) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => {
            let mut out = String::with_capacity(s.len());
            out.push(f(&first));
            out.push_str(chars.as_str());
            out
        }
        None => String::new(),
    }
}

/// Looks up one of the built-in conventions by its exported name.
#[must_use]
pub fn builtin_convention(name: &str) -> Option<Arc<dyn NamingConvention>> {
    match name {
        NoChangeConvention::NAME => Some(Arc::new(NoChangeConvention)),
        CamelCaseConvention::NAME => Some(Arc::new(CamelCaseConvention)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_case_round_trip() {
        let c = CamelCaseConvention;
        assert_eq!(c.server_property_name_to_client("CustomerId"), "customerId");
        assert_eq!(c.client_property_name_to_server("customerId"), "CustomerId");
        assert_eq!(c.server_property_name_to_client(""), "");
    }

    #[test]
    fn test_structural_type_name() {
        let native = NativeType::new("sales-model", "Sales", "Order");
        assert_eq!(NoChangeConvention.structural_type_name(&native), "Order:#Sales");
    }

    #[test]
    fn test_builtin_lookup() {
        assert_eq!(builtin_convention("camelCase").unwrap().name(), "camelCase");
        assert_eq!(builtin_convention("noChange").unwrap().name(), "noChange");
        assert!(builtin_convention("snake").is_none());
    }
}
