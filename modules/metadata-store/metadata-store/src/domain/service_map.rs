//! Metadata service map.
//!
//! Tracks which data services have had their metadata fetched and merged.
//! Fetches go through one gate of capacity one per store, so concurrent
//! fetches of any services serialize and each service is fetched at most once.

use std::future::Future;

use metadata_store_sdk::DataService;
use parking_lot::RwLock;
use tokio::sync::Semaphore;
use tracing::debug;

use super::error::DomainError;

pub struct ServiceMap {
    services: RwLock<Vec<DataService>>,
    fetch_gate: Semaphore,
}

impl Default for ServiceMap {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceMap {
    #[must_use]
    pub fn new() -> Self {
        Self {
            services: RwLock::new(Vec::new()),
            fetch_gate: Semaphore::new(1),
        }
    }

    #[must_use]
    pub fn get(&self, service_name: &str) -> Option<DataService> {
        self.services
            .read()
            .iter()
            .find(|s| s.service_name == service_name)
            .cloned()
    }

    #[must_use]
    pub fn contains(&self, service_name: &str) -> bool {
        self.get(service_name).is_some()
    }

    /// Records a service. Returns `false` if one with that name already exists.
    pub fn add(&self, service: DataService) -> bool {
        let mut services = self.services.write();
        if services.iter().any(|s| s.service_name == service.service_name) {
            return false;
        }
        debug!(service = %service.service_name, "Registered data service");
        services.push(service);
        true
    }

    /// Snapshot of the known services, in registration order.
    #[must_use]
    pub fn list(&self) -> Vec<DataService> {
        self.services.read().clone()
    }

    /// Returns the known service, or runs `fetch` under the gate and records its result.
    ///
    /// Callers racing on the same service wait for the gate and observe the
    /// service recorded by whichever caller got there first.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `fetch`; nothing is recorded in that case.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        service: DataService,
        fetch: F,
    ) -> Result<DataService, DomainError>
    where
        F: FnOnce(DataService) -> Fut,
        Fut: Future<Output = Result<DataService, DomainError>>,
    {
        if let Some(existing) = self.get(&service.service_name) {
            return Ok(existing);
        }

        let _permit = self
            .fetch_gate
            .acquire()
            .await
            .map_err(|e| DomainError::Internal(e.into()))?;

        if let Some(existing) = self.get(&service.service_name) {
            debug!(service = %service.service_name, "Service fetched by a concurrent caller");
            return Ok(existing);
        }

        let fetched = fetch(service).await?;
        self.add(fetched.clone());
        Ok(fetched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_add_ignores_duplicate_names() {
        let map = ServiceMap::new();
        assert!(map.add(DataService::new("sales")));
        assert!(!map.add(DataService::new("sales").without_server_metadata()));
        assert_eq!(map.list().len(), 1);
        assert!(map.get("sales").unwrap().has_server_metadata);
    }

    #[tokio::test]
    async fn test_get_or_fetch_short_circuits_known_service() {
        let map = ServiceMap::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = calls.clone();
            map.get_or_fetch(DataService::new("sales"), |s| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(s)
            })
            .await
            .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(map.contains("sales"));
    }

    #[tokio::test]
    async fn test_failed_fetch_records_nothing() {
        let map = ServiceMap::new();
        let result = map
            .get_or_fetch(DataService::new("sales"), |s| async move {
                Err(DomainError::transport(s.service_name, anyhow::anyhow!("refused")))
            })
            .await;
        assert!(result.is_err());
        assert!(!map.contains("sales"));
    }
}
