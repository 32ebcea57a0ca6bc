//! Process-wide store handle.
//!
//! Callers load the current store through `current()`; `reset()` swaps in a
//! fresh store built from the previous one, so handles obtained earlier keep
//! seeing the old store until they reload.

use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;
use tracing::info;

use crate::config::MetadataStoreConfig;
use crate::domain::error::DomainError;
use crate::domain::service::{Collaborators, MetadataStore};

pub struct MetadataStoreHost {
    current: ArcSwap<MetadataStore>,
}

static GLOBAL: OnceLock<MetadataStoreHost> = OnceLock::new();

impl MetadataStoreHost {
    #[must_use]
    pub fn new(store: MetadataStore) -> Self {
        Self {
            current: ArcSwap::from_pointee(store),
        }
    }

    /// Installs the process-wide host on first call; later calls return the
    /// installed host and ignore their arguments.
    ///
    /// # Errors
    ///
    /// Propagates store construction failures from the first call.
    pub fn init_global(
        config: MetadataStoreConfig,
        collaborators: Collaborators,
    ) -> Result<&'static Self, DomainError> {
        if let Some(host) = GLOBAL.get() {
            return Ok(host);
        }
        let store = MetadataStore::new(config, collaborators)?;
        Ok(GLOBAL.get_or_init(|| Self::new(store)))
    }

    /// The process-wide host, if installed.
    #[must_use]
    pub fn global() -> Option<&'static Self> {
        GLOBAL.get()
    }

    #[must_use]
    pub fn current(&self) -> Arc<MetadataStore> {
        self.current.load_full()
    }

    /// Replaces the current store with a fresh one that keeps the discovery
    /// registrations and has replayed every previously probed module.
    ///
    /// # Errors
    ///
    /// Propagates discovery failures from the replay; the current store is
    /// left in place in that case.
    pub fn reset(&self) -> Result<Arc<MetadataStore>, DomainError> {
        let fresh = Arc::new(self.current.load().reset()?);
        self.current.store(Arc::clone(&fresh));
        info!("Metadata store host swapped in a fresh store");
        Ok(fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{JsonDocumentCodec, StaticDiscoverer};
    use async_trait::async_trait;
    use metadata_store_sdk::{DataProperty, EntityType, MetadataTransport};

    struct NoTransport;

    #[async_trait]
    impl MetadataTransport for NoTransport {
        async fn fetch_raw(&self, _service_name: &str) -> anyhow::Result<serde_json::Value> {
            anyhow::bail!("offline")
        }
    }

    fn collaborators() -> Collaborators {
        Collaborators {
            transport: Arc::new(NoTransport),
            discoverer: Arc::new(StaticDiscoverer::new()),
            codec: Arc::new(JsonDocumentCodec),
        }
    }

    #[test]
    fn test_reset_swaps_store() {
        let host = MetadataStoreHost::new(
            MetadataStore::new(MetadataStoreConfig::default(), collaborators()).unwrap(),
        );
        let before = host.current();
        before
            .add_type(
                EntityType::new("Order", "Sales")
                    .with_data_property(DataProperty::new("Id").part_of_key()),
            )
            .unwrap();
        before.probe(&["sales-model"]).unwrap();

        let after = host.reset().unwrap();
        assert!(Arc::ptr_eq(&after, &host.current()));
        assert!(after.is_empty());
        assert!(!before.is_empty());
        assert_eq!(after.probed_modules(), vec!["sales-model"]);
    }

    #[test]
    fn test_init_global_is_idempotent() {
        let first = MetadataStoreHost::init_global(MetadataStoreConfig::default(), collaborators())
            .unwrap();
        let second = MetadataStoreHost::init_global(MetadataStoreConfig::default(), collaborators())
            .unwrap();
        assert!(std::ptr::eq(first, second));
        assert!(MetadataStoreHost::global().is_some());
    }
}
