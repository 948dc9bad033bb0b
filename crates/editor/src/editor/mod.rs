//! Headless mission editing session.
//!
//! [`MissionEditor`] drives the core the same way the editor window does:
//! - New/Open/Save go through [`MissionModel`] and the configured [`Storage`]
//! - Script edits recolor the affected lines and re-arm the validation debounce
//! - `tick` runs a due validation against the configured [`ScriptCompiler`]

use std::ops::Range;
use std::path::Path;
use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use mission_core::{
    Diagnostic, LineHighlight, Mission, MissionError, MissionModel, PathPrompt, PlacedObject,
    SaveOutcome, ScriptCompiler, ScriptDocument, ScriptValidator, Storage, ValidationTicket,
};

use crate::config::ResolvedConfig;

mod errors;
pub use errors::EditorError;

/// One open editor window: the mission, its script view and the validator.
pub struct MissionEditor {
    config: ResolvedConfig,
    storage: Box<dyn Storage>,
    compiler: Box<dyn ScriptCompiler>,
    model: MissionModel,
    document: ScriptDocument,
    validator: ScriptValidator,
    revision: u64,
}

impl MissionEditor {
    pub fn new(
        config: ResolvedConfig,
        storage: Box<dyn Storage>,
        compiler: Box<dyn ScriptCompiler>,
    ) -> Self {
        let validator = ScriptValidator::new(config.validation_delay);
        Self {
            config,
            storage,
            compiler,
            model: MissionModel::new(),
            document: ScriptDocument::default(),
            validator,
            revision: 0,
        }
    }

    /// Filesystem storage and the Lua compiler.
    #[cfg(feature = "lua")]
    pub fn with_defaults(config: ResolvedConfig) -> Self {
        Self::new(
            config,
            Box::new(mission_core::FsStorage),
            Box::new(mission_core::LuaCompiler::new()),
        )
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn model(&self) -> &MissionModel {
        &self.model
    }

    pub fn mission(&self) -> &Mission {
        self.model.mission()
    }

    pub fn document(&self) -> &ScriptDocument {
        &self.document
    }

    pub fn highlights(&self) -> &[LineHighlight] {
        self.document.highlights()
    }

    pub fn diagnostic(&self) -> &Diagnostic {
        self.validator.diagnostic()
    }

    pub fn validator(&self) -> &ScriptValidator {
        &self.validator
    }

    /// Bumped on every change to the script text.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_dirty(&self) -> bool {
        self.model.is_dirty()
    }

    /// Creates a new empty mission for `location_id`.
    #[instrument(skip(self))]
    pub fn new_mission(&mut self, location_id: &str, now: Instant) -> Result<(), EditorError> {
        self.model.new_mission(location_id)?;
        self.reload_document(now);
        Ok(())
    }

    /// Loads a mission file. On failure the current mission stays open.
    #[instrument(skip(self))]
    pub fn open(&mut self, path: &Path, now: Instant) -> Result<(), EditorError> {
        if let Err(err) = self.model.load_from(self.storage.as_ref(), path) {
            warn!("Failed to open mission: {err}");
            return Err(err.into());
        }
        self.reload_document(now);
        Ok(())
    }

    /// Closes the current mission without saving.
    pub fn close_mission(&mut self) {
        info!("Closing mission");
        self.model.clear();
        self.document.set_text("");
        self.validator.reset();
        self.revision += 1;
    }

    /// Saves to the backing file, asking `prompt` for a path if there is none.
    #[instrument(skip(self, prompt))]
    pub fn save(&mut self, prompt: &mut dyn PathPrompt) -> Result<SaveOutcome, EditorError> {
        let outcome = self.model.save(self.storage.as_ref(), prompt)?;
        if outcome == SaveOutcome::Cancelled {
            info!("Save cancelled");
        }
        Ok(outcome)
    }

    #[instrument(skip(self))]
    pub fn save_as(&mut self, path: &Path) -> Result<(), EditorError> {
        self.model.save_as(self.storage.as_ref(), path)?;
        Ok(())
    }

    pub fn add_object(&mut self, object: PlacedObject) -> Result<usize, EditorError> {
        Ok(self.model.add_object(object)?)
    }

    pub fn remove_object(&mut self, index: usize) -> Result<PlacedObject, EditorError> {
        Ok(self.model.remove_object(index)?)
    }

    /// Replaces the whole script text. Returns the lines that were recolored.
    pub fn edit_script(&mut self, text: &str, now: Instant) -> Result<Range<usize>, EditorError> {
        let changed = text != self.model.script_source();
        self.model.set_script_text(text)?;
        if !changed {
            let end = self.document.line_count();
            return Ok(end..end);
        }
        let recolored = self.document.update_text(text);
        self.text_changed(now);
        Ok(recolored)
    }

    /// Replaces the lines in `range`, the way a keystroke edits the text view.
    pub fn replace_script_lines(
        &mut self,
        range: Range<usize>,
        lines: &[&str],
        now: Instant,
    ) -> Result<Range<usize>, EditorError> {
        if !self.model.has_location() {
            return Err(MissionError::NoLocation.into());
        }
        let recolored = self.document.replace_lines(range, lines);
        self.model.set_script_text(self.document.text())?;
        self.text_changed(now);
        Ok(recolored)
    }

    fn text_changed(&mut self, now: Instant) {
        self.revision += 1;
        self.validator.text_changed(self.revision, now);
    }

    fn reload_document(&mut self, now: Instant) {
        self.document.set_text(self.model.script_source());
        self.text_changed(now);
    }

    /// Runs a due validation. Returns true if the diagnostic was replaced.
    pub fn tick(&mut self, now: Instant) -> bool {
        let replaced = self.validator.poll(
            now,
            self.revision,
            self.model.script_source(),
            self.compiler.as_ref(),
        );
        if replaced {
            debug!(revision = self.revision, clean = self.diagnostic().is_clean(), "script validated");
        }
        replaced
    }

    /// Hands out a due validation to run elsewhere, with the source it must check.
    pub fn take_validation(&mut self, now: Instant) -> Option<(ValidationTicket, String)> {
        self.validator
            .take_due(now)
            .map(|ticket| (ticket, self.model.script_source().to_string()))
    }

    /// Applies a result from [`Self::take_validation`] unless the text has changed since.
    pub fn complete_validation(&mut self, ticket: ValidationTicket, diagnostic: Diagnostic) -> bool {
        self.validator.complete(ticket, diagnostic, self.revision)
    }

    #[instrument(skip(self))]
    pub fn validate_now(&mut self) -> &Diagnostic {
        self.validator.validate_now(
            self.revision,
            self.model.script_source(),
            self.compiler.as_ref(),
        );
        self.validator.diagnostic()
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
