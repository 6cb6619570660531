//! Startup resolution of the initial backend list and selection.
//!
//! Runs once before the transport's first connect. Walks an ordered
//! fallback chain (persisted list, fetched configuration, same-origin
//! default) and populates the registry from the first rung that yields
//! a result. No rung failure is fatal: the chain always terminates in
//! the same-origin default.

pub mod fetch;
pub mod resolve;

pub use fetch::{BackendDocument, FetchError, RemoteBackend, fetch_backends};
pub use resolve::{BootstrapConfig, Resolution, ResolutionSource, resolve};
