//! The bootstrap fallback chain.
//!
//! Three rungs, each an explicit attempt returning `Option<Resolution>`,
//! walked in order: persisted state, fetched configuration, same-origin
//! default. The last rung always succeeds, so startup never blocks on a
//! missing or broken configuration source.

use std::time::Duration;

use tracing::{debug, info, warn};

use bridgelink_endpoint::{Endpoint, Origin};
use bridgelink_registry::{BackendRegistry, PersistedBackends};

use crate::fetch::{FetchError, RemoteBackend, fetch_backends};

/// Default bound on the configuration fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Bootstrap tuning.
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    /// Where to fetch the backend document from. `None` skips the
    /// fetch rung entirely.
    pub config_url: Option<String>,
    /// Upper bound on the fetch; on expiry the chain falls through.
    pub fetch_timeout: Duration,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            config_url: None,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

/// Which rung of the chain produced the initial registry state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    Stored,
    Fetched,
    OriginDefault,
}

/// Outcome of bootstrap: the winning rung and the resulting selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub source: ResolutionSource,
    pub current: String,
}

/// Populates the registry from the first rung that yields a result.
///
/// The configuration fetch is the only suspension point. This must
/// complete before the transport's initial connect; callers own that
/// sequencing.
pub async fn resolve(
    registry: &BackendRegistry,
    origin: &Origin,
    config: &BootstrapConfig,
) -> Resolution {
    let persisted = match registry.persisted() {
        Ok(state) => state,
        Err(e) => {
            warn!("failed to read persisted backends: {e}");
            PersistedBackends::default()
        }
    };

    if let Some(resolution) = from_stored(registry, &persisted) {
        return resolution;
    }

    if let Some(config_url) = &config.config_url {
        let outcome = fetch_backends(config_url, config.fetch_timeout).await;
        if let Some(resolution) = from_fetched(registry, origin, &persisted, outcome) {
            return resolution;
        }
    }

    from_origin_default(registry, origin)
}

/// Rung 1: adopt the persisted list when it is non-empty.
pub fn from_stored(
    registry: &BackendRegistry,
    persisted: &PersistedBackends,
) -> Option<Resolution> {
    if persisted.backends.is_empty() {
        return None;
    }

    registry.set_all(&persisted.backends);
    // A stale persisted selection is ignored here; current() then
    // falls back to entry 0.
    registry.set_current(&persisted.current);

    let current = registry.current().unwrap_or_default();
    info!(%current, "adopted {} persisted backend(s)", registry.list().len());
    Some(Resolution {
        source: ResolutionSource::Stored,
        current,
    })
}

/// Rung 2: merge the same-origin default with fetched backends.
///
/// Takes the fetch outcome as a value so the chain stays free of
/// exception-shaped control flow and is testable without a server.
pub fn from_fetched(
    registry: &BackendRegistry,
    origin: &Origin,
    persisted: &PersistedBackends,
    outcome: Result<Vec<RemoteBackend>, FetchError>,
) -> Option<Resolution> {
    let fetched = match outcome {
        Ok(backends) if !backends.is_empty() => backends,
        Ok(_) => {
            debug!("config document listed no backends");
            return None;
        }
        Err(e) => {
            warn!("backend config fetch failed: {e}");
            return None;
        }
    };

    let origin_raw = origin.default_endpoint().url().to_string();
    let mut raw_inputs = vec![origin_raw];
    raw_inputs.extend(fetched.iter().map(RemoteBackend::raw_input));
    registry.set_all(&raw_inputs);

    // A previously persisted selection survives the merge when it still
    // matches an entry; otherwise the first fetched backend wins.
    if !persisted.current.is_empty() && registry.find(&persisted.current).is_some() {
        registry.set_current(&persisted.current);
    } else {
        let first =
            Endpoint::new(fetched[0].raw_input(), registry.default_secure());
        registry.set_current(first.url());
    }

    let current = registry.current().unwrap_or_default();
    info!(%current, "adopted {} fetched backend(s)", fetched.len());
    Some(Resolution {
        source: ResolutionSource::Fetched,
        current,
    })
}

/// Rung 3: single-entry registry from the client's own origin.
pub fn from_origin_default(registry: &BackendRegistry, origin: &Origin) -> Resolution {
    let default = origin.default_endpoint();
    registry.set_all([default.raw_input()]);
    registry.set_current(default.url());

    let current = registry.current().unwrap_or_default();
    info!(%current, "no stored or fetched backends, using origin default");
    Resolution {
        source: ResolutionSource::OriginDefault,
        current,
    }
}
