//! Location and object-type catalogs.
//!
//! The core only consumes catalog ids: a location id picked for a new mission,
//! and type ids offered for placement. Unknown type ids found in a mission file
//! are kept verbatim.

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationEntry {
    pub id: String,
    /// Human readable name shown in pickers.
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEntry {
    pub id: String,
    #[serde(default)]
    pub group: String,
}

pub trait LocationCatalog {
    fn locations(&self) -> Vec<LocationEntry>;
}

pub trait ObjectCatalog {
    fn object_types(&self) -> Vec<ObjectEntry>;
}

/// Catalog read from a TOML file:
///
/// ```toml
/// [[location]]
/// id = "ocean01"
/// name = "Ocean"
///
/// [[object]]
/// id = "f14d"
/// group = "aircraft"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlCatalog {
    #[serde(default, rename = "location")]
    pub locations: Vec<LocationEntry>,
    #[serde(default, rename = "object")]
    pub objects: Vec<ObjectEntry>,
}

#[derive(Debug, Error, Diagnostic)]
pub enum CatalogError {
    #[error("catalog file not found at {}", .0.display())]
    #[diagnostic(code(catalog::not_found))]
    NotFound(PathBuf),

    #[error("failed to parse catalog: {0}")]
    #[diagnostic(code(catalog::parse_error))]
    ParseError(#[from] toml::de::Error),

    #[error("io error: {0}")]
    #[diagnostic(code(catalog::io_error))]
    IoError(#[from] std::io::Error),
}

impl TomlCatalog {
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        if !path.exists() {
            return Err(CatalogError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, CatalogError> {
        Ok(toml::from_str(content)?)
    }

    /// Merges another catalog's entries after this one's.
    pub fn extend(&mut self, other: TomlCatalog) {
        self.locations.extend(other.locations);
        self.objects.extend(other.objects);
    }
}

impl LocationCatalog for TomlCatalog {
    fn locations(&self) -> Vec<LocationEntry> {
        self.locations.clone()
    }
}

impl ObjectCatalog for TomlCatalog {
    fn object_types(&self) -> Vec<ObjectEntry> {
        self.objects.clone()
    }
}

/// Picker label, e.g. `Ocean [ocean01]`.
pub fn location_label(entry: &LocationEntry) -> String {
    format!("{} [{}]", entry.name, entry.id)
}

/// Maps a label produced by [`location_label`] back to its location id.
pub fn resolve_location_label<'a>(entries: &'a [LocationEntry], label: &str) -> Option<&'a str> {
    entries
        .iter()
        .find(|entry| location_label(entry) == label)
        .map(|entry| entry.id.as_str())
}

/// Object types arranged the way the placement list shows them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectGroups {
    /// Types without a group, listed at the top level.
    pub ungrouped: Vec<String>,
    /// Groups in order of first appearance.
    pub groups: Vec<(String, Vec<String>)>,
}

pub fn group_object_types(entries: &[ObjectEntry]) -> ObjectGroups {
    let mut grouped = ObjectGroups::default();
    for entry in entries {
        if entry.group.is_empty() {
            grouped.ungrouped.push(entry.id.clone());
            continue;
        }
        match grouped
            .groups
            .iter_mut()
            .find(|(name, _)| *name == entry.group)
        {
            Some((_, ids)) => ids.push(entry.id.clone()),
            None => grouped
                .groups
                .push((entry.group.clone(), vec![entry.id.clone()])),
        }
    }
    grouped
}
