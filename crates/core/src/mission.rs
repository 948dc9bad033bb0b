//! In-memory mission state and its persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::archive::{ArchiveReader, ArchiveWriter, Storage, OBJECTS_MEMBER, SCRIPT_MEMBER};
use crate::error::{MissionError, MissionResult};
use crate::markup;
use crate::object::PlacedObject;

/// Script a new mission starts with.
pub const DEFAULT_SCRIPT: &str = "--Open-Horizon mission script\n\n\
                                  function init()\n    \
                                  --do init here\n\
                                  end\n";

/// Persisted contents of a mission file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub location_id: String,
    pub objects: Vec<PlacedObject>,
    pub script_source: String,
}

impl Mission {
    pub fn new(location_id: impl Into<String>) -> Self {
        Self {
            location_id: location_id.into(),
            objects: Vec::new(),
            script_source: DEFAULT_SCRIPT.to_string(),
        }
    }

    pub fn object_labels(&self) -> Vec<String> {
        self.objects.iter().map(PlacedObject::label).collect()
    }
}

/// Reads a mission archive. The objects member is required, the script is optional.
pub fn read_mission(storage: &dyn Storage, path: &Path) -> MissionResult<Mission> {
    let mut reader = ArchiveReader::open(storage, path)?;
    let markup_bytes = reader.read_member(OBJECTS_MEMBER)?;
    let markup_text = String::from_utf8_lossy(&markup_bytes);
    let data = markup::decode(&markup_text)?;

    let script_source = match reader.try_read_member(SCRIPT_MEMBER)? {
        Some(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        None => {
            debug!(path = %path.display(), "mission has no script member");
            String::new()
        }
    };

    Ok(Mission {
        location_id: data.location_id,
        objects: data.objects,
        script_source,
    })
}

/// Writes a mission archive. The target is only replaced once every member is written.
pub fn write_mission(storage: &dyn Storage, path: &Path, mission: &Mission) -> MissionResult<()> {
    if mission.location_id.is_empty() {
        return Err(MissionError::NoLocation);
    }
    let markup_text = markup::encode(&mission.location_id, &mission.objects)?;

    let mut writer = ArchiveWriter::create(storage, path)?;
    writer.write_member(OBJECTS_MEMBER, markup_text.as_bytes())?;
    writer.write_member(SCRIPT_MEMBER, mission.script_source.as_bytes())?;
    writer.close()
}

/// Asks the user where to save a mission that has no backing file yet.
pub trait PathPrompt {
    /// `None` means the user declined.
    fn choose_save_path(&mut self) -> Option<PathBuf>;
}

impl<F> PathPrompt for F
where
    F: FnMut() -> Option<PathBuf>,
{
    fn choose_save_path(&mut self) -> Option<PathBuf> {
        self()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(PathBuf),
    Cancelled,
}

/// Source of truth for the mission being edited.
///
/// # Invariants
/// - Objects and script text only exist once a location is set.
/// - `is_dirty` is cleared only by a successful save or a fresh load/new.
/// - A failed load or save leaves the model exactly as it was.
#[derive(Clone, Debug, Default)]
pub struct MissionModel {
    mission: Mission,
    backing_path: Option<PathBuf>,
    dirty: bool,
}

impl MissionModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mission(&self) -> &Mission {
        &self.mission
    }

    pub fn location_id(&self) -> &str {
        &self.mission.location_id
    }

    pub fn has_location(&self) -> bool {
        !self.mission.location_id.is_empty()
    }

    pub fn objects(&self) -> &[PlacedObject] {
        &self.mission.objects
    }

    pub fn script_source(&self) -> &str {
        &self.mission.script_source
    }

    pub fn backing_path(&self) -> Option<&Path> {
        self.backing_path.as_deref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Starts an empty mission for `location_id` with the default script.
    pub fn new_mission(&mut self, location_id: impl Into<String>) -> MissionResult<()> {
        let location_id = location_id.into();
        if location_id.is_empty() {
            return Err(MissionError::NoLocation);
        }
        info!(location = %location_id, "new mission");
        self.mission = Mission::new(location_id);
        self.backing_path = None;
        self.dirty = false;
        Ok(())
    }

    /// Replaces the whole mission in one step.
    pub fn load(&mut self, mission: Mission, backing_path: Option<PathBuf>) -> MissionResult<()> {
        if mission.location_id.is_empty() {
            return Err(MissionError::NoLocation);
        }
        self.mission = mission;
        self.backing_path = backing_path;
        self.dirty = false;
        Ok(())
    }

    /// Reads `path` and, only if that fully succeeds, replaces the current mission.
    pub fn load_from(&mut self, storage: &dyn Storage, path: &Path) -> MissionResult<()> {
        let mission = read_mission(storage, path)?;
        info!(
            path = %path.display(),
            location = %mission.location_id,
            objects = mission.objects.len(),
            "mission loaded"
        );
        self.load(mission, Some(path.to_path_buf()))
    }

    /// Drops the current mission entirely.
    pub fn clear(&mut self) {
        self.mission = Mission::default();
        self.backing_path = None;
        self.dirty = false;
    }

    pub fn add_object(&mut self, object: PlacedObject) -> MissionResult<usize> {
        if !self.has_location() {
            return Err(MissionError::NoLocation);
        }
        self.mission.objects.push(object);
        self.dirty = true;
        Ok(self.mission.objects.len() - 1)
    }

    pub fn remove_object(&mut self, index: usize) -> MissionResult<PlacedObject> {
        let len = self.mission.objects.len();
        if index >= len {
            return Err(MissionError::ObjectIndexOutOfRange { index, len });
        }
        self.dirty = true;
        Ok(self.mission.objects.remove(index))
    }

    pub fn set_script_text(&mut self, text: impl Into<String>) -> MissionResult<()> {
        if !self.has_location() {
            return Err(MissionError::NoLocation);
        }
        let text = text.into();
        if text != self.mission.script_source {
            self.mission.script_source = text;
            self.dirty = true;
        }
        Ok(())
    }

    /// Saves to the backing file, asking `prompt` for one if there is none yet.
    pub fn save(
        &mut self,
        storage: &dyn Storage,
        prompt: &mut dyn PathPrompt,
    ) -> MissionResult<SaveOutcome> {
        let path = match self.backing_path.clone() {
            Some(path) => path,
            None => match prompt.choose_save_path() {
                Some(path) => path,
                None => return Ok(SaveOutcome::Cancelled),
            },
        };
        self.save_as(storage, &path)?;
        Ok(SaveOutcome::Saved(path))
    }

    /// Saves to `path`, which becomes the backing file on success.
    pub fn save_as(&mut self, storage: &dyn Storage, path: &Path) -> MissionResult<()> {
        write_mission(storage, path, &self.mission)?;
        info!(path = %path.display(), "mission saved");
        self.backing_path = Some(path.to_path_buf());
        self.dirty = false;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/mission_tests.rs"]
mod tests;
