use super::*;

fn class_of(highlight: &LineHighlight, line: &str, needle: &str) -> Option<ColorClass> {
    let offset = line.find(needle).expect("needle present");
    highlight.class_at(offset)
}

fn all_comment(highlight: &LineHighlight, range: Range<usize>) -> bool {
    range.into_iter().all(|offset| highlight.class_at(offset) == Some(ColorClass::Comment))
}

#[test]
fn keywords_numbers_and_calls() {
    let highlighter = Highlighter::lua();
    let line = "local x = spawn(42) if ended then";
    let highlight = highlighter.highlight_line(line, BlockCommentState::Normal);

    assert_eq!(class_of(&highlight, line, "local"), Some(ColorClass::Keyword));
    assert_eq!(class_of(&highlight, line, "x ="), None);
    assert_eq!(class_of(&highlight, line, "spawn"), Some(ColorClass::Call));
    assert_eq!(class_of(&highlight, line, "("), None);
    assert_eq!(class_of(&highlight, line, "42"), Some(ColorClass::Number));
    assert_eq!(class_of(&highlight, line, "if"), Some(ColorClass::Keyword));
    // `end` inside `ended` is not a whole word.
    assert_eq!(class_of(&highlight, line, "ended"), None);
    assert_eq!(highlight.end_state, BlockCommentState::Normal);
}

#[test]
fn later_rules_overwrite_earlier_ones() {
    let highlighter = Highlighter::lua();
    let line = r#"print("end 3") -- call(1) end"#;
    let highlight = highlighter.highlight_line(line, BlockCommentState::Normal);

    assert_eq!(class_of(&highlight, line, "print"), Some(ColorClass::Call));
    assert_eq!(class_of(&highlight, line, "end 3"), Some(ColorClass::String));
    assert_eq!(class_of(&highlight, line, "3"), Some(ColorClass::String));
    assert_eq!(class_of(&highlight, line, "call"), Some(ColorClass::Comment));
    assert_eq!(class_of(&highlight, line, "1)"), Some(ColorClass::Comment));
}

#[test]
fn spans_are_merged_runs() {
    let highlighter = Highlighter::lua();
    let highlight = highlighter.highlight_line("x = 123", BlockCommentState::Normal);
    assert_eq!(
        highlight.spans,
        vec![Span {
            range: 4..7,
            class: ColorClass::Number
        }]
    );
}

#[test]
fn block_comment_closes_and_reopens_on_one_line() {
    let highlighter = Highlighter::lua();
    let line = "note ]] b = 2 --[[ open";
    let highlight = highlighter.highlight_line(line, BlockCommentState::InsideBlockComment);

    let close = line.find("]]").expect("close") + 2;
    assert!(all_comment(&highlight, 0..close));
    assert_eq!(class_of(&highlight, line, "b ="), None);
    assert_eq!(class_of(&highlight, line, "2 "), Some(ColorClass::Number));
    let open = line.find("--[[").expect("open");
    assert!(all_comment(&highlight, open..line.len()));
    assert_eq!(highlight.end_state, BlockCommentState::InsideBlockComment);
}

#[test]
fn closed_block_comment_ends_normal() {
    let highlighter = Highlighter::lua();
    let highlight = highlighter.highlight_line("--[[ note ]]", BlockCommentState::Normal);
    assert!(all_comment(&highlight, 0..12));
    assert_eq!(highlight.end_state, BlockCommentState::Normal);
}

#[test]
fn incoming_block_comment_starts_at_column_zero() {
    let highlighter = Highlighter::lua();
    let line = "local still = 1";
    let highlight = highlighter.highlight_line(line, BlockCommentState::InsideBlockComment);
    assert!(all_comment(&highlight, 0..line.len()));
    assert_eq!(highlight.end_state, BlockCommentState::InsideBlockComment);

    let empty = highlighter.highlight_line("", BlockCommentState::InsideBlockComment);
    assert!(empty.spans.is_empty());
    assert_eq!(empty.end_state, BlockCommentState::InsideBlockComment);
}

#[test]
fn block_comment_state_propagates_and_retracts() {
    let mut document =
        ScriptDocument::with_text(Highlighter::lua(), "code --[[ comment\nstill comment ]] more_code");

    let first = document.line_highlight(0).expect("line 0").clone();
    let line0 = document.line(0).expect("line 0").to_string();
    let open = line0.find("--[[").expect("open");
    assert_eq!(first.class_at(0), None);
    assert!(all_comment(&first, open..line0.len()));
    assert_eq!(first.end_state, BlockCommentState::InsideBlockComment);

    let second = document.line_highlight(1).expect("line 1").clone();
    let line1 = document.line(1).expect("line 1").to_string();
    let close = line1.find("]]").expect("close") + 2;
    assert!(all_comment(&second, 0..close));
    assert_eq!(class_of(&second, &line1, "more_code"), None);
    assert_eq!(second.end_state, BlockCommentState::Normal);

    let recolored = document.replace_line(0, "code");
    assert_eq!(recolored, 0..2);
    let second = document.line_highlight(1).expect("line 1");
    assert!(second.spans.is_empty(), "spans: {:?}", second.spans);
    assert_eq!(document.text(), "code\nstill comment ]] more_code");
}

#[test]
fn propagation_stops_once_state_matches() {
    let text = "a = 1\nb = 2\nc = 3\nd = 4";
    let mut document = ScriptDocument::with_text(Highlighter::lua(), text);

    // Edit without touching comment state: only the edited line is recolored.
    assert_eq!(document.replace_line(1, "b = 20"), 1..2);

    // Opening a comment cascades to the end of the document.
    assert_eq!(document.replace_line(1, "b = 2 --[["), 1..4);
    assert_eq!(
        document.line_highlight(3).expect("line 3").end_state,
        BlockCommentState::InsideBlockComment
    );

    // Closing it on the next line stops the cascade there.
    assert_eq!(document.replace_line(2, "]] c = 3"), 2..4);
    assert_eq!(
        document.line_highlight(3).expect("line 3").end_state,
        BlockCommentState::Normal
    );
    assert_eq!(document.line_highlight(3).expect("line 3").class_at(4), Some(ColorClass::Number));
}

#[test]
fn incremental_matches_full_rebuild() {
    let edits = [
        "--[[ header\nfunction init()\nend\n]]\nx = 1",
        "--[[ header ]]\nfunction init()\nend\n]]\nx = 1",
        "--[[ header ]]\nfunction init()\n  --[[ nested\nend\n]]\nx = 1",
        "x = 1",
        "",
        "--[[\n\n\n",
    ];

    let mut incremental = ScriptDocument::default();
    for text in edits {
        incremental.update_text(text);
        let rebuilt = ScriptDocument::with_text(Highlighter::lua(), text);
        assert_eq!(incremental.text(), text);
        assert_eq!(incremental.highlights(), rebuilt.highlights(), "text: {text:?}");
    }
}

#[test]
fn update_text_only_touches_changed_lines() {
    let mut document = ScriptDocument::with_text(Highlighter::lua(), "a\nb\nc\nd");
    assert_eq!(document.update_text("a\nb\nc\nd"), 4..4);
    assert_eq!(document.update_text("a\nB\nc\nd"), 1..2);
    assert_eq!(document.update_text("a\nB\nx\ny\nc\nd"), 2..4);
    assert_eq!(document.line_count(), 6);
    assert_eq!(document.update_text("a\nd"), 1..1);
    assert_eq!(document.text(), "a\nd");
}

#[test]
fn removing_every_line_keeps_one_empty_line() {
    let mut document = ScriptDocument::with_text(Highlighter::lua(), "only");
    document.replace_lines(0..1, &[]);
    assert_eq!(document.line_count(), 1);
    assert_eq!(document.text(), "");
}
