use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use mission_core::{BlockCommentState, ColorClass, MemoryStorage, Position};

use super::*;

fn config() -> ResolvedConfig {
    ResolvedConfig {
        validation_delay: Duration::from_millis(1000),
        ..ResolvedConfig::default()
    }
}

/// Editor over in-memory storage with a compiler that rejects `error` and counts calls.
fn editor_with(storage: MemoryStorage) -> (MissionEditor, Rc<Cell<usize>>) {
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let compiler = move |source: &str| -> Result<(), String> {
        counter.set(counter.get() + 1);
        if source.contains("error") {
            Err("script.lua:1: unexpected symbol".to_string())
        } else {
            Ok(())
        }
    };
    let editor = MissionEditor::new(config(), Box::new(storage), Box::new(compiler));
    (editor, calls)
}

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

#[test]
fn typing_burst_validates_once_after_quiet_period() {
    let (mut editor, calls) = editor_with(MemoryStorage::new());
    let start = Instant::now();
    editor.new_mission("ocean01", start).expect("new mission");
    assert!(editor.tick(start + ms(1000)));
    assert_eq!(calls.get(), 1);
    assert!(editor.diagnostic().is_clean());

    let mut text = editor.mission().script_source.clone();
    for step in 0..5u64 {
        text.push_str("\nerror");
        editor
            .edit_script(&text, start + ms(2000 + step * 100))
            .expect("edit");
        assert!(!editor.tick(start + ms(2000 + step * 100)));
    }
    assert_eq!(calls.get(), 1);
    assert!(editor.diagnostic().is_clean(), "old diagnostic stays until the next pass");

    assert!(editor.tick(start + ms(3400)));
    assert_eq!(calls.get(), 2);
    assert_eq!(editor.diagnostic().message, "script.lua:1: unexpected symbol");
}

#[test]
fn script_edits_need_a_mission() {
    let (mut editor, _) = editor_with(MemoryStorage::new());
    let now = Instant::now();
    let err = editor
        .edit_script("print(1)", now)
        .expect_err("no mission open");
    assert!(matches!(err, EditorError::Mission(MissionError::NoLocation)));
    assert!(editor
        .replace_script_lines(0..1, &["x"], now)
        .is_err());
    assert_eq!(editor.revision(), 0);
}

#[test]
fn unchanged_text_does_not_rearm_validation() {
    let (mut editor, _) = editor_with(MemoryStorage::new());
    let start = Instant::now();
    editor.new_mission("ocean01", start).expect("new mission");
    let revision = editor.revision();
    let text = editor.mission().script_source.clone();

    editor.edit_script(&text, start + ms(10)).expect("edit");
    assert_eq!(editor.revision(), revision);
    assert!(!editor.is_dirty());
}

#[test]
fn line_edits_keep_model_and_highlights_in_sync() {
    let (mut editor, _) = editor_with(MemoryStorage::new());
    let start = Instant::now();
    editor.new_mission("ocean01", start).expect("new mission");
    editor.edit_script("a = 1\nb = 2", start).expect("edit");

    let recolored = editor
        .replace_script_lines(0..1, &["a = 1 --[[ open"], start)
        .expect("line edit");
    assert_eq!(recolored, 0..2);
    assert_eq!(editor.mission().script_source, "a = 1 --[[ open\nb = 2");
    assert_eq!(
        editor.highlights()[1].end_state,
        BlockCommentState::InsideBlockComment
    );
    assert_eq!(editor.highlights()[1].class_at(0), Some(ColorClass::Comment));
    assert!(editor.is_dirty());
}

#[test]
fn save_then_open_restores_mission() {
    let storage = MemoryStorage::new();
    let (mut editor, _) = editor_with(storage.clone());
    let start = Instant::now();
    editor.new_mission("ocean01", start).expect("new mission");
    editor
        .add_object(PlacedObject::new("lead", "f14d", Position::new(1.0, 2.0, 3.0)))
        .expect("add object");

    let mut declined = || -> Option<PathBuf> { None };
    assert_eq!(editor.save(&mut declined).expect("save"), SaveOutcome::Cancelled);
    assert!(editor.is_dirty());

    let path = PathBuf::from("missions/m.zip");
    let mut prompt = || Some(PathBuf::from("missions/m.zip"));
    assert_eq!(
        editor.save(&mut prompt).expect("save"),
        SaveOutcome::Saved(path.clone())
    );
    assert!(storage.contains(&path));

    let (mut other, _) = editor_with(storage);
    other.open(&path, start).expect("open");
    assert_eq!(other.mission(), editor.mission());
    assert_eq!(other.document().text(), editor.mission().script_source);
}

#[test]
fn failed_open_keeps_current_mission() {
    let (mut editor, _) = editor_with(MemoryStorage::new());
    let start = Instant::now();
    editor.new_mission("ocean01", start).expect("new mission");
    editor.edit_script("x = 1", start).expect("edit");

    let err = editor
        .open(Path::new("missing.zip"), start)
        .expect_err("missing file");
    assert!(matches!(err, EditorError::Mission(ref inner) if inner.is_not_found()));
    assert_eq!(editor.mission().location_id, "ocean01");
    assert_eq!(editor.document().text(), "x = 1");
}

#[test]
fn stale_async_results_are_dropped() {
    let (mut editor, _) = editor_with(MemoryStorage::new());
    let start = Instant::now();
    editor.new_mission("ocean01", start).expect("new mission");

    let (ticket, source) = editor
        .take_validation(start + ms(1000))
        .expect("validation due");
    assert_eq!(source, mission_core::DEFAULT_SCRIPT);

    editor.edit_script("error", start + ms(1001)).expect("edit");
    assert!(!editor.complete_validation(ticket, Diagnostic::failed("late")));
    assert!(editor.diagnostic().is_clean());

    let (ticket, source) = editor
        .take_validation(start + ms(2001))
        .expect("validation due");
    assert_eq!(source, "error");
    assert!(editor.complete_validation(ticket, Diagnostic::failed("fresh")));
    assert_eq!(editor.diagnostic().message, "fresh");
}

#[test]
fn close_mission_clears_everything() {
    let (mut editor, calls) = editor_with(MemoryStorage::new());
    let start = Instant::now();
    editor.new_mission("ocean01", start).expect("new mission");
    editor.edit_script("error", start).expect("edit");
    assert!(!editor.validate_now().is_clean());
    editor.edit_script("error = 2", start + ms(10)).expect("edit");
    editor.close_mission();

    assert!(!editor.model().has_location());
    assert_eq!(editor.document().text(), "");
    assert!(editor.diagnostic().is_clean());
    assert!(!editor.tick(start + ms(5000)));
    assert_eq!(calls.get(), 1);
}
