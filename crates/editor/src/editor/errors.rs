//! Error types for the editor module.
//!
//! Uses thiserror for derive and miette for structured diagnostics.

use mission_core::{CatalogError, MissionError};

/// Errors that can occur in the editor.
#[derive(thiserror::Error, Debug, miette::Diagnostic)]
pub enum EditorError {
    /// Loading, saving or editing the mission failed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Mission(#[from] MissionError),

    /// A catalog file could not be read.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Catalog(#[from] CatalogError),

    /// File I/O operation failed.
    #[error("File operation failed: {0}")]
    #[diagnostic(code(editor::io_error))]
    IoError(#[from] std::io::Error),

    /// Editor config is not valid TOML.
    #[error("Config error: {0}")]
    #[diagnostic(code(editor::config_error))]
    ConfigError(#[from] toml::de::Error),
}
