#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Integration tests for metadata document export and import

mod common;

use std::sync::Arc;

use common::{MockTransport, address, create_store, create_store_with, customer, order};
use metadata_store::domain::discovery::OWN_MODULE;
use metadata_store::{DomainError, InventoryDiscoverer, MetadataStore};
use metadata_store_sdk::{DataService, StructuralType, Validator};
use serde_json::json;

fn populated() -> MetadataStore {
    let store = create_store();
    store.add_type(order()).unwrap();
    store.add_type(customer()).unwrap();
    store.add_type(address()).unwrap();
    store.add_data_service(DataService::new("sales"));
    store.set_entity_type_for_resource_name("PastOrders", "Order:#Sales");
    store
}

fn sorted_types(store: &MetadataStore) -> Vec<StructuralType> {
    let mut all = store.structural_types();
    all.sort_by_key(StructuralType::name);
    all
}

#[test]
fn test_export_document_shape() {
    let exported = populated().export_metadata().unwrap();

    assert_eq!(exported["metadataVersion"], "1.0.5");
    assert_eq!(exported["namingConvention"], "noChange");
    assert_eq!(exported["dataServices"][0]["serviceName"], "sales");
    assert_eq!(exported["resourceEntityTypeMap"]["Orders"], "Order:#Sales");

    let types = exported["structuralTypes"].as_array().unwrap();
    assert_eq!(types.len(), 3);
    let address = types.iter().find(|t| t["shortName"] == "Address").unwrap();
    assert_eq!(address["isComplexType"], true);
}

#[test]
fn test_round_trip_into_fresh_store() {
    let source = populated();
    let document = source.export_metadata_string().unwrap();

    let target = create_store();
    target.import_metadata_str(&document).unwrap();

    assert_eq!(sorted_types(&target), sorted_types(&source));
    assert_eq!(
        target.resource_entity_type_map(),
        source.resource_entity_type_map()
    );
    assert_eq!(target.data_services(), source.data_services());

    let order = target.get_entity_type("Order", false).unwrap().unwrap();
    assert!(order.navigation_property("Customer").unwrap().inverse.is_some());
}

#[test]
fn test_import_resolves_complex_declared_later() {
    let store = create_store();
    store
        .import_metadata(&json!({
            "structuralTypes": [
                { "shortName": "Order", "namespace": "Sales",
                  "dataProperties": [
                      { "name": "Id", "isPartOfKey": true },
                      { "name": "ShipTo", "complexTypeName": "Address:#Sales" }
                  ] },
                { "shortName": "Address", "namespace": "Sales", "isComplexType": true,
                  "dataProperties": [{ "name": "City" }] }
            ]
        }))
        .unwrap();

    assert_eq!(store.pending_complex_count(), 0);
    let order = store.get_entity_type("Order", false).unwrap().unwrap();
    assert_eq!(
        order.data_property("ShipTo").unwrap().complex_type.as_deref(),
        Some("Address:#Sales")
    );
}

#[test]
fn test_import_applies_naming_convention() {
    let store = create_store();
    store
        .import_metadata(&json!({
            "namingConvention": "camelCase",
            "structuralTypes": [
                { "shortName": "Customer", "namespace": "Sales",
                  "dataProperties": [{ "name": "CustomerId", "isPartOfKey": true }] }
            ]
        }))
        .unwrap();

    assert_eq!(store.naming_convention().name(), "camelCase");
    let customer = store.get_entity_type("Customer", false).unwrap().unwrap();
    assert!(customer.data_property("customerId").is_some());

    let exported = store.export_metadata().unwrap();
    assert_eq!(
        exported["structuralTypes"][0]["dataProperties"][0]["name"],
        "CustomerId"
    );
}

#[test]
fn test_import_unknown_naming_convention_rejected() {
    let store = create_store();
    let err = store
        .import_metadata(&json!({ "namingConvention": "kebabCase" }))
        .unwrap_err();
    assert!(matches!(err, DomainError::UnknownNamingConvention(_)));
}

#[test]
fn test_import_missing_key_is_fatal() {
    let store = create_store();
    let err = store
        .import_metadata(&json!({
            "structuralTypes": [{ "shortName": "Log", "namespace": "Audit" }]
        }))
        .unwrap_err();
    assert!(matches!(err, DomainError::MissingKey(_)));
}

#[test]
fn test_rejected_import_applies_nothing() {
    let store = populated();
    let before = sorted_types(&store);

    let err = store
        .import_metadata(&json!({
            "namingConvention": "camelCase",
            "dataServices": [{ "serviceName": "audit" }],
            "structuralTypes": [
                { "shortName": "Entry", "namespace": "Audit",
                  "dataProperties": [{ "name": "Id", "isPartOfKey": true }] },
                { "shortName": "Log", "namespace": "Audit" }
            ],
            "resourceEntityTypeMap": { "Orders": "Entry:#Audit" }
        }))
        .unwrap_err();

    assert!(matches!(err, DomainError::MissingKey(ref name) if name == "Log:#Audit"));
    assert_eq!(sorted_types(&store), before);
    assert_eq!(store.naming_convention().name(), "noChange");
    assert!(!store.has_metadata_for("audit"));
    assert_eq!(
        store.entity_type_name_for_resource("Orders").as_deref(),
        Some("Order:#Sales")
    );
}

#[test]
fn test_import_invalid_json_string() {
    let store = create_store();
    assert!(matches!(
        store.import_metadata_str("{ not json"),
        Err(DomainError::InvalidDocument(_))
    ));
}

#[test]
fn test_import_materializes_and_shares_validators() {
    let store = create_store_with(Arc::new(MockTransport::new()), Arc::new(InventoryDiscoverer));
    store.probe(&[OWN_MODULE]).unwrap();

    store
        .import_metadata(&json!({
            "structuralTypes": [
                { "shortName": "Customer", "namespace": "Sales",
                  "dataProperties": [
                      { "name": "Id", "isPartOfKey": true, "validators": [{ "name": "required" }] },
                      { "name": "Name", "validators": [
                          { "name": "required" },
                          { "name": "maxLength", "maxLength": 40 },
                          { "name": "creditCard" }
                      ] }
                  ] }
            ]
        }))
        .unwrap();

    let customer = store.get_entity_type("Customer", false).unwrap().unwrap();
    let id = customer.data_property("Id").unwrap();
    let name = customer.data_property("Name").unwrap();
    assert_eq!(name.validators.len(), 2);
    assert!(Arc::ptr_eq(&id.validators[0], &name.validators[0]));

    let errors = store.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].source, "creditCard");

    let extra = Arc::new(Validator::new("required", serde_json::Map::new()));
    assert!(Arc::ptr_eq(&store.intern_validator(extra), &id.validators[0]));
}
