//! Discovery dispatcher.
//!
//! Holds `(capability, callback, module filter)` registrations and, when code
//! modules are probed, feeds every concrete native type implementing a
//! registered capability to the matching callbacks. Each module is probed at
//! most once per store.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use metadata_store_sdk::{Capability, NativeType, TypeDiscoverer};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

use super::error::DomainError;
use super::service::MetadataStore;

/// Name of the code module hosting the store itself.
pub const OWN_MODULE: &str = env!("CARGO_PKG_NAME");

/// Invoked once per discovered native type.
pub type DiscoveryCallback =
    Arc<dyn Fn(&MetadataStore, &NativeType) -> anyhow::Result<()> + Send + Sync>;

#[derive(Clone)]
pub struct DiscoveryRegistration {
    pub capability: Capability,
    pub callback: DiscoveryCallback,
    /// Whether the store's own module is scanned for this capability.
    pub include_own_module: bool,
}

impl DiscoveryRegistration {
    #[must_use]
    pub fn accepts(&self, module: &str) -> bool {
        self.include_own_module || module != OWN_MODULE
    }
}

impl fmt::Debug for DiscoveryRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscoveryRegistration")
            .field("capability", &self.capability)
            .field("include_own_module", &self.include_own_module)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct DispatcherState {
    registrations: Vec<DiscoveryRegistration>,
    probed: HashSet<String>,
    /// Probed modules in probe order, replayed on reset.
    probe_order: Vec<String>,
    /// Modules whose callbacks are still running, with the scanning thread.
    in_progress: HashMap<String, ThreadId>,
}

#[derive(Default)]
struct ProbeClaim {
    claimed: Vec<String>,
    /// Modules another thread is still scanning.
    waiting: Vec<String>,
    registrations: Vec<DiscoveryRegistration>,
}

#[derive(Default)]
pub struct DiscoveryDispatcher {
    state: Mutex<DispatcherState>,
    finished: Condvar,
}

/// Clears a module's in-progress mark when its scan ends, even on unwind.
struct ScanGuard<'a> {
    dispatcher: &'a DiscoveryDispatcher,
    module: &'a str,
}

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.dispatcher.state.lock().in_progress.remove(self.module);
        self.dispatcher.finished.notify_all();
    }
}

impl DiscoveryDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, registration: DiscoveryRegistration) {
        debug!(capability = %registration.capability, include_own_module = registration.include_own_module, "Registered discovery callback");
        self.state.lock().registrations.push(registration);
    }

    #[must_use]
    pub fn registrations(&self) -> Vec<DiscoveryRegistration> {
        self.state.lock().registrations.clone()
    }

    #[must_use]
    pub fn probed_modules(&self) -> Vec<String> {
        self.state.lock().probe_order.clone()
    }

    /// Marks the not-yet-probed modules as in progress on this thread.
    ///
    /// Modules another thread is scanning are returned as `waiting`, unless
    /// this thread is itself inside a scan: a scanning thread never blocks,
    /// so two threads probing into each other's modules cannot deadlock.
    fn claim<S: AsRef<str>>(&self, modules: &[S]) -> ProbeClaim {
        let me = thread::current().id();
        let mut state = self.state.lock();
        let may_wait = !state.in_progress.values().any(|owner| *owner == me);

        let mut claim = ProbeClaim::default();
        for module in modules {
            let module = module.as_ref();
            if state.probed.insert(module.to_owned()) {
                state.probe_order.push(module.to_owned());
                state.in_progress.insert(module.to_owned(), me);
                claim.claimed.push(module.to_owned());
            } else if may_wait
                && state.in_progress.get(module).is_some_and(|owner| *owner != me)
                && !claim.waiting.iter().any(|m| m == module)
            {
                claim.waiting.push(module.to_owned());
            }
        }
        if !claim.claimed.is_empty() {
            claim.registrations = state.registrations.clone();
        }
        claim
    }

    fn wait_for(&self, modules: &[String]) {
        if modules.is_empty() {
            return;
        }
        let mut state = self.state.lock();
        while modules.iter().any(|m| state.in_progress.contains_key(m)) {
            self.finished.wait(&mut state);
        }
    }

    fn scan(
        store: &MetadataStore,
        discoverer: &dyn TypeDiscoverer,
        module: &str,
        registrations: &[DiscoveryRegistration],
    ) -> Option<DomainError> {
        debug!(module = %module, "Probing module");
        let mut first_error = None;
        for registration in registrations.iter().filter(|r| r.accepts(module)) {
            let found = discoverer.discover(registration.capability, module);
            for native in found
                .iter()
                .filter(|t| !t.is_abstract && t.implements(registration.capability))
            {
                if let Err(source) = (registration.callback)(store, native) {
                    warn!(module = %module, native_type = %native.full_name(), error = %source, "Discovery callback failed");
                    first_error.get_or_insert(DomainError::Discovery {
                        module: module.to_owned(),
                        native_type: native.full_name(),
                        source,
                    });
                }
            }
        }
        first_error
    }

    /// Probes the given modules, skipping those already probed.
    ///
    /// Callbacks run without the dispatcher lock held, so they may add types
    /// or probe further modules. A module another thread is still scanning is
    /// waited for. Returns `true` if at least one module was probed during
    /// this call, by this caller or a concurrent one.
    ///
    /// # Errors
    ///
    /// Returns the first `Discovery` error once every module and registration
    /// has run; failing modules stay marked as probed.
    pub fn probe<S: AsRef<str>>(
        &self,
        store: &MetadataStore,
        discoverer: &dyn TypeDiscoverer,
        modules: &[S],
    ) -> Result<bool, DomainError> {
        let claim = self.claim(modules);

        let mut first_error = None;
        for module in &claim.claimed {
            let _guard = ScanGuard {
                dispatcher: self,
                module,
            };
            if let Some(err) = Self::scan(store, discoverer, module, &claim.registrations) {
                first_error.get_or_insert(err);
            }
        }
        self.wait_for(&claim.waiting);

        match first_error {
            Some(err) => Err(err),
            None => Ok(!claim.claimed.is_empty() || !claim.waiting.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &MetadataStore, _: &NativeType) -> anyhow::Result<()> {
        Ok(())
    }

    #[test]
    fn test_accepts_own_module_only_when_included() {
        let callback: DiscoveryCallback = Arc::new(noop);
        let excluded = DiscoveryRegistration {
            capability: Capability::ENTITY,
            callback: callback.clone(),
            include_own_module: false,
        };
        let included = DiscoveryRegistration {
            capability: Capability::ENTITY,
            callback,
            include_own_module: true,
        };
        assert!(!excluded.accepts(OWN_MODULE));
        assert!(excluded.accepts("sales-model"));
        assert!(included.accepts(OWN_MODULE));
    }

    #[test]
    fn test_claim_deduplicates() {
        let dispatcher = DiscoveryDispatcher::new();
        let claim = dispatcher.claim(&["a", "b", "a"]);
        assert_eq!(claim.claimed, vec!["a", "b"]);

        // Same thread still owns both scans, so nothing is waited for.
        let again = dispatcher.claim(&["a"]);
        assert!(again.claimed.is_empty());
        assert!(again.waiting.is_empty());
        assert!(again.registrations.is_empty());
        assert_eq!(dispatcher.probed_modules(), vec!["a", "b"]);
    }

    #[test]
    fn test_claim_waits_for_other_thread_only_when_idle() {
        let dispatcher = Arc::new(DiscoveryDispatcher::new());
        let _ = dispatcher.claim(&["a"]);

        let other = dispatcher.clone();
        let waiting = std::thread::spawn(move || other.claim(&["a"]).waiting)
            .join()
            .unwrap();
        assert_eq!(waiting, vec!["a"]);

        let other = dispatcher.clone();
        let waiting = std::thread::spawn(move || {
            let _ = other.claim(&["b"]);
            other.claim(&["a"]).waiting
        })
        .join()
        .unwrap();
        assert!(waiting.is_empty(), "a scanning thread never waits");
    }
}
