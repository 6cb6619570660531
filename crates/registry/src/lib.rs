//! Persisted registry of known backend endpoints.
//!
//! Holds the ordered endpoint list and the active selection, and mirrors
//! every mutation to a JSON file so the state survives reloads. The
//! registry is the only writer of that file.

pub mod registry;
pub mod store;

pub use registry::BackendRegistry;
pub use store::{PersistedBackends, RegistryStore, StoreError, default_store_path};
