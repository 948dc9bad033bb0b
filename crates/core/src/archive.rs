//! Mission archive container.
//!
//! A mission file is a zip archive holding named members. Storage is always
//! reached through an explicit [`Storage`] handle passed by the caller.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tempfile::NamedTempFile;
use tracing::{debug, warn};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{ArchiveOpenReason, MissionError, MissionResult};

/// Member holding the object placement markup.
pub const OBJECTS_MEMBER: &str = "objects.xml";
/// Member holding the raw mission script.
pub const SCRIPT_MEMBER: &str = "script.lua";

pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// Destination of an archive being written.
///
/// Nothing becomes visible at the target path until [`ArchiveSink::commit`];
/// dropping an uncommitted sink discards the write.
pub trait ArchiveSink: Write + Seek {
    fn commit(self: Box<Self>) -> io::Result<()>;
}

/// Backend the archive codec reads from and writes to.
pub trait Storage {
    fn open(&self, path: &Path) -> io::Result<Box<dyn ReadSeek>>;
    fn create(&self, path: &Path) -> io::Result<Box<dyn ArchiveSink>>;
}

/// Local filesystem storage.
///
/// Writes go to a temporary file next to the target and are renamed over it on
/// commit, so a failed save never truncates an existing mission.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsStorage;

struct FsSink {
    file: NamedTempFile,
    target: PathBuf,
}

impl Write for FsSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl Seek for FsSink {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }
}

impl ArchiveSink for FsSink {
    fn commit(self: Box<Self>) -> io::Result<()> {
        let FsSink { file, target } = *self;
        file.as_file().sync_all()?;
        file.persist(&target).map_err(|err| err.error)?;
        Ok(())
    }
}

impl Storage for FsStorage {
    fn open(&self, path: &Path) -> io::Result<Box<dyn ReadSeek>> {
        Ok(Box::new(File::open(path)?))
    }

    fn create(&self, path: &Path) -> io::Result<Box<dyn ArchiveSink>> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let file = NamedTempFile::new_in(dir)?;
        Ok(Box::new(FsSink {
            file,
            target: path.to_path_buf(),
        }))
    }
}

/// In-memory storage keyed by path. Clones share the same files.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    files: Rc<RefCell<BTreeMap<PathBuf, Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, bytes: Vec<u8>) {
        self.files.borrow_mut().insert(path.into(), bytes);
    }

    pub fn get(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.borrow().get(path).cloned()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.borrow().contains_key(path)
    }
}

struct MemorySink {
    buffer: Cursor<Vec<u8>>,
    target: PathBuf,
    files: Rc<RefCell<BTreeMap<PathBuf, Vec<u8>>>>,
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for MemorySink {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.buffer.seek(pos)
    }
}

impl ArchiveSink for MemorySink {
    fn commit(self: Box<Self>) -> io::Result<()> {
        let MemorySink {
            buffer,
            target,
            files,
        } = *self;
        files.borrow_mut().insert(target, buffer.into_inner());
        Ok(())
    }
}

impl Storage for MemoryStorage {
    fn open(&self, path: &Path) -> io::Result<Box<dyn ReadSeek>> {
        let bytes = self.get(path).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not in memory storage", path.display()),
            )
        })?;
        Ok(Box::new(Cursor::new(bytes)))
    }

    fn create(&self, path: &Path) -> io::Result<Box<dyn ArchiveSink>> {
        Ok(Box::new(MemorySink {
            buffer: Cursor::new(Vec::new()),
            target: path.to_path_buf(),
            files: Rc::clone(&self.files),
        }))
    }
}

fn open_failed(path: &Path, reason: ArchiveOpenReason, detail: String) -> MissionError {
    MissionError::ArchiveOpenFailed {
        path: path.to_path_buf(),
        reason,
        detail,
    }
}

fn zip_io(err: ZipError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err)
}

/// Read side of a mission archive. Each member read is a complete, independent blob.
pub struct ArchiveReader {
    path: PathBuf,
    archive: ZipArchive<Box<dyn ReadSeek>>,
}

impl ArchiveReader {
    pub fn open(storage: &dyn Storage, path: &Path) -> MissionResult<Self> {
        let source = storage.open(path).map_err(|err| {
            let reason = if err.kind() == io::ErrorKind::NotFound {
                ArchiveOpenReason::NotFound
            } else {
                ArchiveOpenReason::CorruptArchive
            };
            open_failed(path, reason, err.to_string())
        })?;
        let archive = ZipArchive::new(source).map_err(|err| {
            open_failed(path, ArchiveOpenReason::CorruptArchive, err.to_string())
        })?;
        debug!(path = %path.display(), members = archive.len(), "opened mission archive");
        Ok(Self {
            path: path.to_path_buf(),
            archive,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Member names in sorted order, including ones the mission format does not use.
    pub fn member_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.archive.file_names().map(str::to_owned).collect();
        names.sort();
        names
    }

    pub fn read_member(&mut self, name: &str) -> MissionResult<Vec<u8>> {
        self.try_read_member(name)?
            .ok_or_else(|| MissionError::MemberMissing {
                name: name.to_string(),
            })
    }

    /// Like [`ArchiveReader::read_member`] but an absent member is `Ok(None)`.
    pub fn try_read_member(&mut self, name: &str) -> MissionResult<Option<Vec<u8>>> {
        let mut member = match self.archive.by_name(name) {
            Ok(member) => member,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(err) => {
                return Err(open_failed(
                    &self.path,
                    ArchiveOpenReason::CorruptArchive,
                    err.to_string(),
                ))
            }
        };
        let mut bytes = Vec::with_capacity(member.size() as usize);
        member.read_to_end(&mut bytes).map_err(|err| {
            open_failed(
                &self.path,
                ArchiveOpenReason::CorruptArchive,
                format!("{name}: {err}"),
            )
        })?;
        Ok(Some(bytes))
    }
}

/// Write side of a mission archive.
///
/// `close` consumes the writer, so it can only be called once. A writer dropped
/// without `close` (an early return mid-save, for instance) discards everything
/// it wrote and leaves the previous file at the target path untouched.
pub struct ArchiveWriter {
    path: PathBuf,
    zip: Option<ZipWriter<Box<dyn ArchiveSink>>>,
}

impl ArchiveWriter {
    pub fn create(storage: &dyn Storage, path: &Path) -> MissionResult<Self> {
        let sink = storage
            .create(path)
            .map_err(|err| MissionError::write_failed(path, err))?;
        Ok(Self {
            path: path.to_path_buf(),
            zip: Some(ZipWriter::new(sink)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes one member as a single deflated blob.
    pub fn write_member(&mut self, name: &str, bytes: &[u8]) -> MissionResult<()> {
        let Some(zip) = self.zip.as_mut() else {
            return Err(MissionError::write_failed(
                &self.path,
                io::Error::new(io::ErrorKind::Other, "archive already closed"),
            ));
        };
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        zip.start_file(name, options)
            .map_err(|err| MissionError::write_failed(&self.path, zip_io(err)))?;
        zip.write_all(bytes)
            .map_err(|err| MissionError::write_failed(&self.path, err))?;
        Ok(())
    }

    /// Finalizes the container and publishes it at the target path.
    pub fn close(mut self) -> MissionResult<()> {
        let Some(zip) = self.zip.take() else {
            return Ok(());
        };
        let sink = zip
            .finish()
            .map_err(|err| MissionError::write_failed(&self.path, zip_io(err)))?;
        sink.commit()
            .map_err(|err| MissionError::write_failed(&self.path, err))?;
        debug!(path = %self.path.display(), "mission archive written");
        Ok(())
    }
}

impl Drop for ArchiveWriter {
    fn drop(&mut self) {
        if self.zip.take().is_some() {
            warn!(
                path = %self.path.display(),
                "mission archive dropped before close, discarding partial write"
            );
        }
    }
}

#[cfg(test)]
#[path = "tests/archive_tests.rs"]
mod tests;
