use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

pub type MissionResult<T> = Result<T, MissionError>;

/// Why an archive could not be opened for reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveOpenReason {
    NotFound,
    CorruptArchive,
}

impl std::fmt::Display for ArchiveOpenReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "file not found"),
            Self::CorruptArchive => write!(f, "not a valid mission archive"),
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum MissionError {
    #[error("unable to open mission {}: {reason}", path.display())]
    #[diagnostic(code("mission.archive_open"))]
    ArchiveOpenFailed {
        path: PathBuf,
        reason: ArchiveOpenReason,
        detail: String,
    },
    #[error("archive member '{name}' is missing")]
    #[diagnostic(code("mission.member_missing"))]
    MemberMissing { name: String },
    #[error("malformed mission: {0}")]
    #[diagnostic(
        code("mission.malformed"),
        help("the root element must carry a non-empty 'location' attribute")
    )]
    MalformedMission(String),
    #[error("unable to write mission {}: {source}", path.display())]
    #[diagnostic(code("mission.io_write"))]
    IoWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("mission has no location")]
    #[diagnostic(
        code("mission.no_location"),
        help("create a new mission for a location before adding objects or script")
    )]
    NoLocation,
    #[error("object index {index} out of range ({len} objects)")]
    #[diagnostic(code("mission.object_index"))]
    ObjectIndexOutOfRange { index: usize, len: usize },
}

impl MissionError {
    pub(crate) fn write_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoWriteFailed {
            path: path.into(),
            source,
        }
    }

    /// Returns true when the error came from a missing file rather than a bad one.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ArchiveOpenFailed {
                reason: ArchiveOpenReason::NotFound,
                ..
            }
        )
    }
}
