//! The backend registry proper.

use std::sync::RwLock;

use tracing::{debug, warn};

use bridgelink_endpoint::Endpoint;

use crate::store::{PersistedBackends, RegistryStore, StoreError};

/// Ordered set of known backend endpoints plus the active selection.
///
/// Constructed once at startup and shared by reference (typically
/// `Arc`) with every consumer; it lives for the lifetime of the app.
/// All operations are synchronous and mirror their effect to the
/// [`RegistryStore`] before returning, so a read immediately after a
/// write observes the write. Endpoints are deduplicated by normalized
/// connection URL, first occurrence winning, and the first entry acts
/// as the implicit default when no explicit selection is active.
pub struct BackendRegistry {
    store: RegistryStore,
    default_secure: bool,
    inner: RwLock<Inner>,
}

struct Inner {
    endpoints: Vec<Endpoint>,
    current_url: String,
}

impl BackendRegistry {
    /// Creates an empty registry.
    ///
    /// `default_secure` selects the scheme for inputs without one and
    /// should match the security of the client's own origin. Persisted
    /// state is not loaded here; bootstrap reads it explicitly via
    /// [`persisted`](Self::persisted) and repopulates with
    /// [`set_all`](Self::set_all).
    pub fn new(store: RegistryStore, default_secure: bool) -> Self {
        Self {
            store,
            default_secure,
            inner: RwLock::new(Inner {
                endpoints: Vec::new(),
                current_url: String::new(),
            }),
        }
    }

    /// The security default applied to scheme-less inputs.
    pub fn default_secure(&self) -> bool {
        self.default_secure
    }

    /// Reads the durable state without touching the in-memory registry.
    pub fn persisted(&self) -> Result<PersistedBackends, StoreError> {
        self.store.load()
    }

    /// Known endpoints, insertion order preserved.
    pub fn list(&self) -> Vec<Endpoint> {
        self.inner.read().unwrap().endpoints.clone()
    }

    /// Looks up a known endpoint by its normalized connection URL.
    pub fn find(&self, url: &str) -> Option<Endpoint> {
        self.inner
            .read()
            .unwrap()
            .endpoints
            .iter()
            .find(|e| e.url() == url)
            .cloned()
    }

    /// Replaces the full endpoint list from raw inputs.
    ///
    /// Inputs are normalized and deduplicated by connection URL (first
    /// occurrence wins). An empty list is legal. A selection that no
    /// longer matches any entry is cleared, which makes entry 0 the
    /// effective current. The result is persisted before returning.
    pub fn set_all<I>(&self, raw_inputs: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut inner = self.inner.write().unwrap();

        let mut endpoints: Vec<Endpoint> = Vec::new();
        for raw in raw_inputs {
            let endpoint = Endpoint::new(raw.as_ref(), self.default_secure);
            if !endpoints.iter().any(|e| e.url() == endpoint.url()) {
                endpoints.push(endpoint);
            }
        }

        let current_still_known = endpoints.iter().any(|e| e.url() == inner.current_url);
        if !current_still_known {
            inner.current_url.clear();
        }
        inner.endpoints = endpoints;

        debug!("registry now holds {} backend(s)", inner.endpoints.len());
        self.persist(&inner);
    }

    /// The connection URL presently targeted.
    ///
    /// Falls back to entry 0 when no selection is active or the
    /// selection refers to an endpoint no longer present. `None` only
    /// when the registry is empty.
    pub fn current(&self) -> Option<String> {
        let inner = self.inner.read().unwrap();
        if !inner.current_url.is_empty()
            && inner.endpoints.iter().any(|e| e.url() == inner.current_url)
        {
            return Some(inner.current_url.clone());
        }
        inner.endpoints.first().map(|e| e.url().to_string())
    }

    /// Selects a known endpoint by connection URL and persists the
    /// choice. A URL that matches no entry is silently ignored; callers
    /// introducing a brand-new endpoint go through
    /// [`set_all`](Self::set_all) first.
    pub fn set_current(&self, url: &str) {
        let mut inner = self.inner.write().unwrap();
        if !inner.endpoints.iter().any(|e| e.url() == url) {
            debug!(url, "ignoring selection of unknown backend");
            return;
        }
        inner.current_url = url.to_string();
        self.persist(&inner);
    }

    /// Mirrors the in-memory state to the store. Write failures are
    /// logged and do not poison the session: memory stays authoritative.
    fn persist(&self, inner: &Inner) {
        let state = PersistedBackends {
            backends: inner.endpoints.iter().map(|e| e.raw_input().to_string()).collect(),
            current: inner.current_url.clone(),
        };
        if let Err(e) = self.store.save(&state) {
            warn!("failed to persist backend state: {e}");
        }
    }
}
