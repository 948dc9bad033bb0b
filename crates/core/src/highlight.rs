//! Incremental syntax highlighting for mission scripts.
//!
//! Each line is colored in two passes:
//!
//! 1. Stateless rules, applied in order. Every rule paints all of its matches
//!    on the line and later rules overwrite earlier ones where they overlap.
//! 2. Block comments (`--[[ ... ]]`), painted last. This is the only pass
//!    that depends on the previous line: each line records whether it ends
//!    inside an open block comment, and the next line starts from that state.
//!
//! [`ScriptDocument`] keeps one [`LineHighlight`] per line. After an edit it
//! recolors the changed lines and then walks forward only while the carried
//! block comment state keeps differing from what was recorded before.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorClass {
    Keyword,
    Number,
    Call,
    String,
    Comment,
}

impl ColorClass {
    pub fn label(self) -> &'static str {
        match self {
            ColorClass::Keyword => "keyword",
            ColorClass::Number => "number",
            ColorClass::Call => "call",
            ColorClass::String => "string",
            ColorClass::Comment => "comment",
        }
    }

    /// Display color as `(r, g, b)`.
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            ColorClass::Keyword => (0xcc, 0x00, 0xa1),
            ColorClass::Number => (0x5c, 0x00, 0xdd),
            ColorClass::Call => (0x6f, 0x00, 0x8f),
            ColorClass::String => (0xe4, 0x00, 0x41),
            ColorClass::Comment => (0x00, 0x8e, 0x00),
        }
    }
}

/// Block comment state carried from the end of one line to the start of the next.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum BlockCommentState {
    #[default]
    Normal,
    InsideBlockComment,
}

/// A pattern and the color its matches get.
///
/// If the pattern has a first capture group, only that group is painted.
/// This stands in for look-ahead, e.g. coloring a name but not the `(` after it.
#[derive(Clone, Debug)]
pub struct HighlightRule {
    pattern: Regex,
    class: ColorClass,
}

impl HighlightRule {
    pub fn new(pattern: &str, class: ColorClass) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            class,
        })
    }

    pub fn class(&self) -> ColorClass {
        self.class
    }

    fn paint(&self, line: &str, paint: &mut [Option<ColorClass>]) {
        for captures in self.pattern.captures_iter(line) {
            let Some(span) = captures.get(1).or_else(|| captures.get(0)) else {
                continue;
            };
            fill(paint, span.range(), self.class);
        }
    }
}

fn fill(paint: &mut [Option<ColorClass>], range: Range<usize>, class: ColorClass) {
    let end = range.end.min(paint.len());
    let start = range.start.min(end);
    for slot in &mut paint[start..end] {
        *slot = Some(class);
    }
}

/// A colored byte range within one line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Span {
    pub range: Range<usize>,
    pub class: ColorClass,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LineHighlight {
    pub spans: Vec<Span>,
    pub end_state: BlockCommentState,
}

impl LineHighlight {
    /// Color at byte `offset`, if any.
    pub fn class_at(&self, offset: usize) -> Option<ColorClass> {
        self.spans
            .iter()
            .find(|span| span.range.contains(&offset))
            .map(|span| span.class)
    }
}

fn collect_spans(paint: &[Option<ColorClass>]) -> Vec<Span> {
    let mut spans: Vec<Span> = Vec::new();
    for (offset, slot) in paint.iter().enumerate() {
        let Some(class) = *slot else {
            continue;
        };
        match spans.last_mut() {
            Some(last) if last.class == class && last.range.end == offset => {
                last.range.end = offset + 1;
            }
            _ => spans.push(Span {
                range: offset..offset + 1,
                class,
            }),
        }
    }
    spans
}

const LUA_KEYWORDS: [&str; 21] = [
    "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "if", "in",
    "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
];

/// Rule set plus block comment markers.
#[derive(Clone, Debug)]
pub struct Highlighter {
    rules: Vec<HighlightRule>,
    block_open: Regex,
    block_close: Regex,
}

impl Highlighter {
    pub fn new(rules: Vec<HighlightRule>, block_open: Regex, block_close: Regex) -> Self {
        Self {
            rules,
            block_open,
            block_close,
        }
    }

    /// Lua rules, compiled once per process.
    pub fn lua() -> Self {
        static LUA: OnceLock<Highlighter> = OnceLock::new();
        LUA.get_or_init(build_lua).clone()
    }

    pub fn rules(&self) -> &[HighlightRule] {
        &self.rules
    }

    /// Colors one line given the state the previous line ended in.
    pub fn highlight_line(&self, line: &str, incoming: BlockCommentState) -> LineHighlight {
        let mut paint = vec![None; line.len()];
        for rule in &self.rules {
            rule.paint(line, &mut paint);
        }

        let mut end_state = BlockCommentState::Normal;
        let mut start = match incoming {
            BlockCommentState::InsideBlockComment => Some(0),
            BlockCommentState::Normal => self.block_open.find(line).map(|found| found.start()),
        };
        while let Some(from) = start {
            match self.block_close.find_at(line, from) {
                Some(close) => {
                    fill(&mut paint, from..close.end(), ColorClass::Comment);
                    start = self
                        .block_open
                        .find_at(line, close.end())
                        .map(|found| found.start());
                }
                None => {
                    fill(&mut paint, from..line.len(), ColorClass::Comment);
                    end_state = BlockCommentState::InsideBlockComment;
                    break;
                }
            }
        }

        LineHighlight {
            spans: collect_spans(&paint),
            end_state,
        }
    }
}

fn build_lua() -> Highlighter {
    let keywords = format!(r"\b(?:{})\b", LUA_KEYWORDS.join("|"));
    // Ordered from coarse to most specific: later rules win on overlap.
    let patterns: [(&str, ColorClass); 6] = [
        (keywords.as_str(), ColorClass::Keyword),
        (r"[0-9]", ColorClass::Number),
        (r"\b([A-Za-z0-9_]+)\(", ColorClass::Call),
        (r#"".*""#, ColorClass::String),
        (r"'.*'", ColorClass::String),
        (r"--[^\n]*", ColorClass::Comment),
    ];
    let rules = patterns
        .iter()
        .map(|(pattern, class)| {
            HighlightRule::new(pattern, *class).expect("built-in highlight pattern must compile")
        })
        .collect();
    Highlighter::new(
        rules,
        Regex::new(r"--\[\[").expect("block comment open pattern must compile"),
        Regex::new(r"\]\]").expect("block comment close pattern must compile"),
    )
}

/// Script text split into lines, each with its current highlight.
///
/// Lines are separated by `\n` only, so [`ScriptDocument::text`] gives back
/// exactly what was set. The document always has at least one line.
#[derive(Clone, Debug)]
pub struct ScriptDocument {
    highlighter: Highlighter,
    lines: Vec<String>,
    highlights: Vec<LineHighlight>,
}

impl Default for ScriptDocument {
    fn default() -> Self {
        Self::new(Highlighter::lua())
    }
}

impl ScriptDocument {
    pub fn new(highlighter: Highlighter) -> Self {
        Self {
            highlighter,
            lines: vec![String::new()],
            highlights: vec![LineHighlight::default()],
        }
    }

    pub fn with_text(highlighter: Highlighter, text: &str) -> Self {
        let mut document = Self::new(highlighter);
        document.set_text(text);
        document
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn line_highlight(&self, index: usize) -> Option<&LineHighlight> {
        self.highlights.get(index)
    }

    pub fn highlights(&self) -> &[LineHighlight] {
        &self.highlights
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    fn incoming_state(&self, index: usize) -> BlockCommentState {
        index
            .checked_sub(1)
            .and_then(|previous| self.highlights.get(previous))
            .map_or(BlockCommentState::Normal, |highlight| highlight.end_state)
    }

    /// Replaces all text and recolors every line.
    pub fn set_text(&mut self, text: &str) -> Range<usize> {
        self.lines = text.split('\n').map(str::to_string).collect();
        self.highlights.clear();
        let mut state = BlockCommentState::Normal;
        for line in &self.lines {
            let highlight = self.highlighter.highlight_line(line, state);
            state = highlight.end_state;
            self.highlights.push(highlight);
        }
        0..self.lines.len()
    }

    /// Replaces the lines in `range` with `replacement` and recolors what the edit
    /// affects. Returns the range of lines (in the new numbering) that were recolored.
    pub fn replace_lines(&mut self, range: Range<usize>, replacement: &[&str]) -> Range<usize> {
        let start = range.start.min(self.lines.len());
        let end = range.end.clamp(start, self.lines.len());

        let incoming = self.incoming_state(start);
        // State the first line after the edited block used to start in.
        let old_incoming_after = self.incoming_state(end);

        self.lines
            .splice(start..end, replacement.iter().map(|line| line.to_string()));
        self.highlights.splice(
            start..end,
            std::iter::repeat(LineHighlight::default()).take(replacement.len()),
        );
        let mut inserted = replacement.len();
        if self.lines.is_empty() {
            self.lines.push(String::new());
            self.highlights.push(LineHighlight::default());
            inserted = 1;
        }

        let mut state = incoming;
        for index in start..start + inserted {
            let highlight = self.highlighter.highlight_line(&self.lines[index], state);
            state = highlight.end_state;
            self.highlights[index] = highlight;
        }

        let mut index = start + inserted;
        let mut carried_changed = state != old_incoming_after;
        while carried_changed && index < self.lines.len() {
            let recorded = self.highlights[index].end_state;
            let highlight = self.highlighter.highlight_line(&self.lines[index], state);
            state = highlight.end_state;
            carried_changed = state != recorded;
            self.highlights[index] = highlight;
            index += 1;
        }

        start..index
    }

    pub fn replace_line(&mut self, index: usize, text: &str) -> Range<usize> {
        self.replace_lines(index..index + 1, &[text])
    }

    /// Updates to `text`, splicing only the lines between the common prefix and
    /// suffix of the old and new contents.
    pub fn update_text(&mut self, text: &str) -> Range<usize> {
        let new_lines: Vec<&str> = text.split('\n').collect();
        let old_len = self.lines.len();
        let new_len = new_lines.len();

        let prefix = self
            .lines
            .iter()
            .zip(&new_lines)
            .take_while(|(old, new)| old.as_str() == **new)
            .count();
        let max_suffix = old_len.min(new_len) - prefix;
        let suffix = self
            .lines
            .iter()
            .rev()
            .zip(new_lines.iter().rev())
            .take(max_suffix)
            .take_while(|(old, new)| old.as_str() == **new)
            .count();

        self.replace_lines(prefix..old_len - suffix, &new_lines[prefix..new_len - suffix])
    }
}

#[cfg(test)]
#[path = "tests/highlight_tests.rs"]
mod tests;
