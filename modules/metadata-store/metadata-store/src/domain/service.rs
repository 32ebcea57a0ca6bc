//! Domain service for the Metadata Store module.

use std::collections::BTreeMap;
use std::sync::Arc;

use metadata_store_sdk::{
    Capability, ComplexType, DataService, EntityType, MetadataTransport, NamingConvention,
    NativeType, StructuralKind, StructuralType, TypeDiscoverer, Validator, ValidatorDefinition,
    builtin_convention,
};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info};

use super::discovery::{DiscoveryDispatcher, DiscoveryRegistration};
use super::error::{DomainError, RecordedError};
use super::graph::{AddOutcome, TypeGraph};
use super::service_map::ServiceMap;
use super::validators::ValidatorRegistry;
use crate::config::MetadataStoreConfig;

/// Encodes the store as a metadata document and merges documents back in.
pub trait MetadataCodec: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the store cannot be represented as a document.
    fn encode(&self, store: &MetadataStore) -> Result<Value, DomainError>;

    /// Applies a document to `store`. Dangling complex references are left
    /// for the caller's second pass.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDocument` for malformed documents and propagates add failures.
    fn decode(&self, store: &MetadataStore, document: &Value) -> Result<(), DomainError>;
}

/// External collaborators the store delegates to.
#[derive(Clone)]
pub struct Collaborators {
    pub transport: Arc<dyn MetadataTransport>,
    pub discoverer: Arc<dyn TypeDiscoverer>,
    pub codec: Arc<dyn MetadataCodec>,
}

/// The metadata store context.
///
/// Each table has its own lock. The type graph lock is held for the whole
/// resolution cascade of an add; discovery callbacks run with no lock held.
pub struct MetadataStore {
    config: MetadataStoreConfig,
    collaborators: Collaborators,
    graph: RwLock<TypeGraph>,
    /// Resource name -> qualified entity type name.
    resources: RwLock<BTreeMap<String, String>>,
    services: ServiceMap,
    validators: ValidatorRegistry,
    discovery: DiscoveryDispatcher,
    naming: RwLock<Arc<dyn NamingConvention>>,
}

impl MetadataStore {
    /// Creates a store, registers the built-in discovery callbacks and probes
    /// the configured modules.
    ///
    /// # Errors
    ///
    /// - `UnknownNamingConvention` if the configured convention is not built in
    /// - `Discovery` if a callback fails while probing the configured modules
    pub fn new(
        config: MetadataStoreConfig,
        collaborators: Collaborators,
    ) -> Result<Self, DomainError> {
        let store = Self::unprobed(config, collaborators)?;
        store.register_builtin_discovery();

        let modules = store.config.probe_modules.clone();
        store.probe(&modules)?;

        info!(probed = modules.len(), "Metadata store created");
        Ok(store)
    }

    fn unprobed(
        config: MetadataStoreConfig,
        collaborators: Collaborators,
    ) -> Result<Self, DomainError> {
        let naming = builtin_convention(&config.naming_convention).ok_or_else(|| {
            DomainError::UnknownNamingConvention(config.naming_convention.clone())
        })?;
        Ok(Self {
            config,
            collaborators,
            graph: RwLock::new(TypeGraph::new()),
            resources: RwLock::new(BTreeMap::new()),
            services: ServiceMap::new(),
            validators: ValidatorRegistry::new(),
            discovery: DiscoveryDispatcher::new(),
            naming: RwLock::new(naming),
        })
    }

    fn register_builtin_discovery(&self) {
        for capability in [Capability::ENTITY, Capability::COMPLEX_OBJECT] {
            self.register_discovery(capability, false, |store, native| {
                store.bind_native_type(native)?;
                Ok(())
            });
        }
        self.register_discovery(
            Capability::VALIDATOR,
            self.config.include_own_module_for_validators,
            |store, native| {
                store.register_validator_type(native);
                Ok(())
            },
        );
    }

    /// Builds a fresh store with the same configuration, collaborators and
    /// discovery registrations, then replays every module probed so far.
    ///
    /// # Errors
    ///
    /// Propagates discovery failures from the replay.
    pub fn reset(&self) -> Result<Self, DomainError> {
        let fresh = Self::unprobed(self.config.clone(), self.collaborators.clone())?;
        for registration in self.discovery.registrations() {
            fresh.discovery.register(registration);
        }

        let modules = self.discovery.probed_modules();
        fresh.probe(&modules)?;

        info!(replayed = modules.len(), "Metadata store reset");
        Ok(fresh)
    }

    #[must_use]
    pub const fn config(&self) -> &MetadataStoreConfig {
        &self.config
    }

    #[must_use]
    pub fn metadata_version(&self) -> &str {
        &self.config.metadata_version
    }

    // ---- type graph ----

    /// Adds a structural type and returns the registered snapshot.
    ///
    /// A duplicate name is ignored and the already-registered type returned.
    /// An entity type carrying a default resource name maps that resource
    /// unless it is already mapped.
    ///
    /// # Errors
    ///
    /// Returns `MissingKey` for a concrete entity type without key properties.
    pub fn add_type(
        &self,
        structural_type: impl Into<StructuralType>,
    ) -> Result<StructuralType, DomainError> {
        let structural_type = structural_type.into();
        let resource_name = structural_type
            .as_entity_type()
            .and_then(|e| e.default_resource_name.clone());

        let (outcome, snapshot) = {
            let mut graph = self.graph.write();
            let (outcome, idx) = graph.add(structural_type)?;
            let snapshot = graph.type_at(idx).cloned().ok_or_else(|| {
                DomainError::Internal(anyhow::anyhow!("type slot {} vanished", idx.0))
            })?;
            (outcome, snapshot)
        };

        if outcome == AddOutcome::Registered
            && let Some(resource_name) = resource_name
        {
            self.resources
                .write()
                .entry(resource_name)
                .or_insert_with(|| snapshot.name());
        }

        Ok(snapshot)
    }

    /// Looks up a structural type of either kind.
    ///
    /// # Errors
    ///
    /// - `NotFound` unless `ok_if_not_found` is set
    /// - `AmbiguousShortName` if a short name matches several types
    pub fn get_structural_type(
        &self,
        name: &str,
        ok_if_not_found: bool,
    ) -> Result<Option<StructuralType>, DomainError> {
        Ok(self.graph.read().get(name, None, ok_if_not_found)?.cloned())
    }

    /// # Errors
    ///
    /// - `WrongKind` if the name denotes a complex type
    /// - `NotFound` unless `ok_if_not_found` is set
    pub fn get_entity_type(
        &self,
        name: &str,
        ok_if_not_found: bool,
    ) -> Result<Option<EntityType>, DomainError> {
        let graph = self.graph.read();
        let found = graph.get(name, Some(StructuralKind::Entity), ok_if_not_found)?;
        Ok(found.and_then(StructuralType::as_entity_type).cloned())
    }

    /// # Errors
    ///
    /// - `WrongKind` if the name denotes an entity type
    /// - `NotFound` unless `ok_if_not_found` is set
    pub fn get_complex_type(
        &self,
        name: &str,
        ok_if_not_found: bool,
    ) -> Result<Option<ComplexType>, DomainError> {
        let graph = self.graph.read();
        let found = graph.get(name, Some(StructuralKind::Complex), ok_if_not_found)?;
        Ok(found.and_then(StructuralType::as_complex_type).cloned())
    }

    #[must_use]
    pub fn structural_types(&self) -> Vec<StructuralType> {
        self.graph.read().structural_types()
    }

    #[must_use]
    pub fn entity_types(&self) -> Vec<EntityType> {
        self.graph.read().entity_types()
    }

    #[must_use]
    pub fn complex_types(&self) -> Vec<ComplexType> {
        self.graph.read().complex_types()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.read().is_empty()
    }

    #[must_use]
    pub fn pending_navigation_count(&self) -> usize {
        self.graph.read().pending_navigation_count()
    }

    #[must_use]
    pub fn pending_complex_count(&self) -> usize {
        self.graph.read().pending_complex_count()
    }

    /// Binds complex properties left dangling by declaration order.
    /// Returns how many were bound.
    pub fn resolve_dangling_complex_properties(&self) -> usize {
        self.graph.write().resolve_dangling_complex_properties()
    }

    // ---- native types ----

    /// Structural type name a native type corresponds to under the active convention.
    #[must_use]
    pub fn structural_type_name_for(&self, native: &NativeType) -> String {
        self.naming.read().structural_type_name(native)
    }

    /// Binds a native type to the structural type it corresponds to.
    ///
    /// The first time a native type is bound, its hosting module is probed.
    /// Returns the structural type name if that side is already known.
    ///
    /// # Errors
    ///
    /// Propagates discovery failures from probing the hosting module.
    pub fn bind_native_type(&self, native: &NativeType) -> Result<Option<String>, DomainError> {
        let name = self.structural_type_name_for(native);
        let bound = self.graph.write().bridge_mut().bind_native(&name, native);
        if bound.first_seen {
            self.probe(&[native.module.as_str()])?;
        }
        Ok(bound.structural)
    }

    #[must_use]
    pub fn native_type_for(&self, structural_name: &str) -> Option<NativeType> {
        self.graph.read().bridge().native_for(structural_name).cloned()
    }

    /// Entity type a native type corresponds to.
    ///
    /// If nothing is registered under the derived name and probing the
    /// native type's module finds new work, the lookup is retried once.
    ///
    /// # Errors
    ///
    /// - `WrongKind` if the derived name denotes a complex type
    /// - `Discovery` if probing fails
    pub fn entity_type_for_native(
        &self,
        native: &NativeType,
    ) -> Result<Option<EntityType>, DomainError> {
        let name = self.structural_type_name_for(native);
        self.graph.write().bridge_mut().bind_native(&name, native);

        if let Some(found) = self.get_entity_type(&name, true)? {
            return Ok(Some(found));
        }
        if self.probe(&[native.module.as_str()])? {
            debug!(type_name = %name, module = %native.module, "Retrying lookup after probe");
            return self.get_entity_type(&name, true);
        }
        Ok(None)
    }

    // ---- discovery ----

    /// Registers a callback invoked for each concrete native type implementing
    /// `capability` in modules probed from now on.
    pub fn register_discovery<F>(&self, capability: Capability, include_own_module: bool, callback: F)
    where
        F: Fn(&Self, &NativeType) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.discovery.register(DiscoveryRegistration {
            capability,
            callback: Arc::new(callback),
            include_own_module,
        });
    }

    /// Probes code modules, skipping those already probed and waiting for
    /// those another thread is still scanning. Returns `true` if any module
    /// was probed during the call.
    ///
    /// # Errors
    ///
    /// Returns the first `Discovery` error after every module has been scanned.
    pub fn probe<S: AsRef<str>>(&self, modules: &[S]) -> Result<bool, DomainError> {
        self.discovery
            .probe(self, self.collaborators.discoverer.as_ref(), modules)
    }

    #[must_use]
    pub fn probed_modules(&self) -> Vec<String> {
        self.discovery.probed_modules()
    }

    // ---- validators ----

    pub fn register_validator_type(&self, native: &NativeType) -> bool {
        self.validators.register_type(native)
    }

    pub fn find_or_create_validator(&self, definition: &ValidatorDefinition) -> Option<Arc<Validator>> {
        self.validators.find_or_create(definition)
    }

    pub fn intern_validator(&self, validator: Arc<Validator>) -> Arc<Validator> {
        self.validators.intern(validator)
    }

    /// Snapshot of the recoverable errors recorded so far.
    #[must_use]
    pub fn errors(&self) -> Vec<RecordedError> {
        self.validators.errors()
    }

    // ---- data services ----

    /// Fetches and merges a service's metadata, at most once per service name.
    ///
    /// # Errors
    ///
    /// - `Transport` if the transport fails
    /// - `InvalidDocument` or `MissingKey` if the document cannot be merged
    #[tracing::instrument(skip_all, fields(service = %service.service_name))]
    pub async fn fetch_metadata(&self, service: DataService) -> Result<DataService, DomainError> {
        self.services
            .get_or_fetch(service, |service| async move {
                let document = self
                    .collaborators
                    .transport
                    .fetch_raw(&service.service_name)
                    .await
                    .map_err(|e| DomainError::transport(&service.service_name, e))?;
                self.import_metadata(&document)?;
                info!("Fetched and merged service metadata");
                Ok(service)
            })
            .await
    }

    /// Records a data service. Returns `false` if one with that name exists.
    pub fn add_data_service(&self, service: DataService) -> bool {
        self.services.add(service)
    }

    #[must_use]
    pub fn data_services(&self) -> Vec<DataService> {
        self.services.list()
    }

    #[must_use]
    pub fn has_metadata_for(&self, service_name: &str) -> bool {
        self.services.contains(service_name)
    }

    // ---- resource names ----

    pub fn set_entity_type_for_resource_name(
        &self,
        resource_name: impl Into<String>,
        entity_type_name: impl Into<String>,
    ) {
        self.resources
            .write()
            .insert(resource_name.into(), entity_type_name.into());
    }

    #[must_use]
    pub fn entity_type_name_for_resource(&self, resource_name: &str) -> Option<String> {
        self.resources.read().get(resource_name).cloned()
    }

    #[must_use]
    pub fn resource_entity_type_map(&self) -> BTreeMap<String, String> {
        self.resources.read().clone()
    }

    // ---- naming ----

    #[must_use]
    pub fn naming_convention(&self) -> Arc<dyn NamingConvention> {
        self.naming.read().clone()
    }

    pub fn set_naming_convention(&self, convention: Arc<dyn NamingConvention>) {
        debug!(convention = convention.name(), "Naming convention changed");
        *self.naming.write() = convention;
    }

    /// # Errors
    ///
    /// Returns `UnknownNamingConvention` if `name` is not a built-in convention.
    pub fn set_naming_convention_by_name(&self, name: &str) -> Result<(), DomainError> {
        let convention = builtin_convention(name)
            .ok_or_else(|| DomainError::UnknownNamingConvention(name.to_owned()))?;
        self.set_naming_convention(convention);
        Ok(())
    }

    // ---- import / export ----

    /// # Errors
    ///
    /// Propagates codec failures.
    pub fn export_metadata(&self) -> Result<Value, DomainError> {
        self.collaborators.codec.encode(self)
    }

    /// # Errors
    ///
    /// Propagates codec failures.
    pub fn export_metadata_string(&self) -> Result<String, DomainError> {
        Ok(serde_json::to_string(&self.export_metadata()?)?)
    }

    /// Merges a document into the store, then binds complex properties left
    /// dangling by declaration order within it.
    ///
    /// # Errors
    ///
    /// - `InvalidDocument` for malformed documents
    /// - `UnknownNamingConvention` if the document names an unknown convention
    /// - `MissingKey` if the document declares a concrete entity type without keys
    pub fn import_metadata(&self, document: &Value) -> Result<(), DomainError> {
        self.collaborators.codec.decode(self, document)?;
        let bound = self.resolve_dangling_complex_properties();
        debug!(bound, "Imported metadata document");
        Ok(())
    }

    /// # Errors
    ///
    /// Same as [`Self::import_metadata`], plus `InvalidDocument` for invalid JSON.
    pub fn import_metadata_str(&self, document: &str) -> Result<(), DomainError> {
        let document: Value = serde_json::from_str(document)?;
        self.import_metadata(&document)
    }
}
