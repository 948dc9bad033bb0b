//! Mission persistence and script tooling for the Open Horizon mission editor.
//!
//! A mission is stored as a zip container with two members: `objects.xml`
//! (location plus placed objects) and `script.lua`. The script side is
//! covered by an incremental highlighter and a debounced validator.

pub mod archive;
pub mod catalog;
mod compiler;
mod error;
mod highlight;
pub mod markup;
mod mission;
mod object;
mod validator;

pub use archive::{
    ArchiveReader, ArchiveWriter, FsStorage, MemoryStorage, Storage, OBJECTS_MEMBER, SCRIPT_MEMBER,
};
pub use catalog::{
    group_object_types, location_label, resolve_location_label, CatalogError, LocationCatalog,
    LocationEntry, ObjectCatalog, ObjectEntry, ObjectGroups, TomlCatalog,
};
#[cfg(feature = "lua")]
pub use compiler::LuaCompiler;
pub use compiler::{validate, Diagnostic, ScriptCompiler};
pub use error::{ArchiveOpenReason, MissionError, MissionResult};
pub use highlight::{
    BlockCommentState, ColorClass, HighlightRule, Highlighter, LineHighlight, ScriptDocument, Span,
};
pub use markup::ObjectData;
pub use mission::{
    read_mission, write_mission, Mission, MissionModel, PathPrompt, SaveOutcome, DEFAULT_SCRIPT,
};
pub use object::{Angle, PlacedObject, Position};
pub use validator::{ScriptValidator, ValidationTicket, DEFAULT_VALIDATION_DELAY};
