use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use mission_core::TomlCatalog;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::editor::EditorError;

const DEFAULT_VALIDATION_DELAY_MS: u64 = 1000;

/// Editor settings as written in `editor.toml`. Every field is optional.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct EditorConfig {
    pub validation_delay_ms: Option<u64>,
    pub location_catalog: Option<PathBuf>,
    pub object_catalog: Option<PathBuf>,
}

impl EditorConfig {
    /// Reads `path`; a missing file gives the defaults.
    pub fn load_from(path: &Path) -> Result<Self, EditorError> {
        if !path.exists() {
            debug!(path = %path.display(), "no editor config, using defaults");
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Location of `editor.toml` in the platform config directory.
    pub fn default_path() -> PathBuf {
        ProjectDirs::from("com", "openhorizon", "mission_editor")
            .map(|dirs| dirs.config_dir().join("editor.toml"))
            .unwrap_or_else(|| PathBuf::from("editor.toml"))
    }

    pub fn resolve(&self) -> ResolvedConfig {
        let validation_delay = Duration::from_millis(
            self.validation_delay_ms
                .unwrap_or(DEFAULT_VALIDATION_DELAY_MS),
        );

        ResolvedConfig {
            validation_delay,
            location_catalog: self.location_catalog.clone(),
            object_catalog: self.object_catalog.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedConfig {
    pub validation_delay: Duration,
    pub location_catalog: Option<PathBuf>,
    pub object_catalog: Option<PathBuf>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        EditorConfig::default().resolve()
    }
}

impl ResolvedConfig {
    /// Merges the configured catalog files. Unset catalogs contribute nothing.
    pub fn load_catalog(&self) -> Result<TomlCatalog, EditorError> {
        let mut catalog = TomlCatalog::default();
        for path in [&self.location_catalog, &self.object_catalog]
            .into_iter()
            .flatten()
        {
            catalog.extend(TomlCatalog::load(path)?);
        }
        Ok(catalog)
    }
}
