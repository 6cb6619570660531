//! Durable backend state.
//!
//! A small JSON file holding the two persisted keys: the raw endpoint
//! list and the currently selected connection URL.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Errors from persisting or loading backend state.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// On-disk schema of the persisted backend state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedBackends {
    /// Raw endpoint inputs, insertion order preserved.
    #[serde(default)]
    pub backends: Vec<String>,
    /// Connection URL of the selected endpoint, empty if none.
    #[serde(default)]
    pub current: String,
}

/// JSON file store for [`PersistedBackends`].
pub struct RegistryStore {
    path: PathBuf,
}

impl RegistryStore {
    /// Creates a store backed by the given file path. The file is not
    /// touched until the first [`save`](Self::save).
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loads the persisted state. A missing file is an empty state.
    pub fn load(&self) -> Result<PersistedBackends, StoreError> {
        if !self.path.exists() {
            return Ok(PersistedBackends::default());
        }
        let data = std::fs::read_to_string(&self.path)?;
        let state: PersistedBackends = serde_json::from_str(&data)?;
        debug!("loaded {} backend(s) from {:?}", state.backends.len(), self.path);
        Ok(state)
    }

    /// Writes the state to disk, creating parent directories as needed.
    pub fn save(&self, state: &PersistedBackends) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(state)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, json)?;
        debug!("persisted {} backend(s) to {:?}", state.backends.len(), self.path);
        Ok(())
    }
}

/// Returns the default backend state path under the platform config dir.
pub fn default_store_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("bridgelink").join("backends.json"))
}

fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    }

    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".config"))
            })
    }
}
