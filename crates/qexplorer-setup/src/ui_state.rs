//! Persisted window state.
//!
//! Geometry and dock-layout blobs are opaque to qexplorer; they are stored
//! with an integer layout version and only handed back when that version
//! matches the running program's.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::SetupResult;

/// Bump when the dock layout changes incompatibly.
pub const UI_STATE_VERSION: u32 = 1;

/// Application namespace under the user config directory.
pub const APP_NAMESPACE: &str = "qexplorer";

/// Environment variable overriding the config directory.
pub const CONFIG_DIR_ENV: &str = "QEXPLORER_CONFIG_DIR";

const FILE_NAME: &str = "ui_state.json";

/// Opaque window state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiState {
    pub version: u32,
    #[serde(default)]
    pub geometry: Vec<u8>,
    #[serde(default)]
    pub dock_layout: Vec<u8>,
}

impl UiState {
    /// State tagged with the current layout version.
    pub fn new(geometry: Vec<u8>, dock_layout: Vec<u8>) -> Self {
        Self {
            version: UI_STATE_VERSION,
            geometry,
            dock_layout,
        }
    }
}

/// Where [`UiState`] lives on disk.
#[derive(Debug, Clone)]
pub struct UiStateStore {
    path: PathBuf,
}

impl UiStateStore {
    /// Store under `$QEXPLORER_CONFIG_DIR`, or `<config dir>/qexplorer`.
    ///
    /// Returns `None` when no config directory can be determined.
    pub fn locate() -> Option<Self> {
        let dir = match env::var_os(CONFIG_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()?.join(APP_NAMESPACE),
        };
        Some(Self::in_dir(dir))
    }

    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, state: &UiState) -> SetupResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(state)?)?;
        debug!(path = %self.path.display(), "ui state saved");
        Ok(())
    }

    /// Saved state, if present and written by a matching layout version.
    pub fn restore(&self) -> SetupResult<Option<UiState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let state: UiState = serde_json::from_slice(&fs::read(&self.path)?)?;
        if state.version != UI_STATE_VERSION {
            warn!(
                found = state.version,
                expected = UI_STATE_VERSION,
                "ignoring ui state from another layout version"
            );
            return Ok(None);
        }
        Ok(Some(state))
    }
}
