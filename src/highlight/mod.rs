//! Rule-based syntax highlighting.
//!
//! Each line is tokenized on its own, given the state left behind by the
//! previous line (an open block comment or an unterminated multi-line
//! rule). [`Highlighter`] caches spans and outgoing states per line and,
//! after an edit, re-tokenizes only until the states line up again.

mod language;
mod registry;

pub use language::{
    LanguageDefinition, LanguageError, LanguageFile, LanguageResult, PLAIN_TEXT, RuleFile,
    StyleTag,
};
pub use registry::{
    LanguageStore, language_for_extension, language_for_path, resolve_language_name,
};

use std::ops::Range;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::buffer::{Change, TextBuffer};
use crate::perf;
use language::RuleKind;

static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d+(\.\d+)?([eE][+-]?\d+)?\b").expect("number pattern is valid")
});
static FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Za-z0-9_]+)\s*\(").expect("function pattern is valid")
});
static OPERATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[+\-*/%=<>!&|^~]|\b(and|or|not)\b").expect("operator pattern is valid")
});

/// A styled run of chars within one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Char offset from the start of the line.
    pub start: usize,
    /// Length in chars.
    pub len: usize,
    pub style: StyleTag,
}

impl Span {
    pub const fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Highlighting state carried from the end of one line into the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineState {
    #[default]
    Normal,
    /// Inside an unterminated block comment.
    BlockComment,
    /// Inside an unterminated multi-line rule (index into the rule list).
    Rule(usize),
}

/// Tokenize one line. Returns its spans (char offsets, sorted, merged) and
/// the state handed to the next line.
pub fn highlight_line(
    language: &LanguageDefinition,
    text: &str,
    state: LineState,
) -> (Vec<Span>, LineState) {
    if language.is_plain() {
        return (Vec::new(), LineState::Normal);
    }

    let mut styles: Vec<Option<StyleTag>> = vec![None; text.len()];
    let Some(mut pos) = resume(language, text, state, &mut styles) else {
        return (to_spans(text, &styles), state);
    };

    let state_out = loop {
        let Some(opener) = next_opener(language, text, pos) else {
            paint_code(language, text, pos..text.len(), &mut styles);
            break LineState::Normal;
        };
        paint_code(language, text, pos..opener.start, &mut styles);

        match opener.kind {
            Opener::LineComment => {
                paint(&mut styles, opener.start..text.len(), StyleTag::Comment);
                break LineState::Normal;
            }
            Opener::BlockComment(close) => match text[opener.end..].find(close) {
                Some(i) => {
                    pos = opener.end + i + close.len();
                    paint(&mut styles, opener.start..pos, StyleTag::Comment);
                }
                None => {
                    paint(&mut styles, opener.start..text.len(), StyleTag::Comment);
                    break LineState::BlockComment;
                }
            },
            Opener::Rule { index, end, style } => match end.find_at(text, opener.end) {
                Some(m) => {
                    pos = m.end();
                    paint(&mut styles, opener.start..pos, style);
                }
                None => {
                    paint(&mut styles, opener.start..text.len(), style);
                    break LineState::Rule(index);
                }
            },
        }
    };

    (to_spans(text, &styles), state_out)
}

/// Finish a construct left open by the previous line.
///
/// Returns the byte offset where ordinary processing resumes, or `None`
/// when the construct swallows the whole line.
fn resume(
    language: &LanguageDefinition,
    text: &str,
    state: LineState,
    styles: &mut [Option<StyleTag>],
) -> Option<usize> {
    let (end, style) = match state {
        LineState::Normal => return Some(0),
        LineState::BlockComment => {
            let Some((_, close)) = &language.block_comment else {
                return Some(0);
            };
            (text.find(close.as_str()).map(|i| i + close.len()), StyleTag::Comment)
        }
        LineState::Rule(index) => match language.rules.get(index) {
            Some(rule) => match &rule.kind {
                RuleKind::MultiLine { end, .. } => (end.find(text).map(|m| m.end()), rule.style),
                RuleKind::Inline(_) => return Some(0),
            },
            None => return Some(0),
        },
    };
    match end {
        Some(end) => {
            paint(styles, 0..end, style);
            Some(end)
        }
        None => {
            paint(styles, 0..text.len(), style);
            None
        }
    }
}

enum Opener<'a> {
    LineComment,
    BlockComment(&'a str),
    Rule {
        index: usize,
        end: &'a Regex,
        style: StyleTag,
    },
}

struct Found<'a> {
    start: usize,
    end: usize,
    kind: Opener<'a>,
}

/// The earliest comment token or multi-line rule start at or after `pos`.
fn next_opener<'a>(language: &'a LanguageDefinition, text: &str, pos: usize) -> Option<Found<'a>> {
    let mut candidates: Vec<Found<'a>> = Vec::new();
    let token = language.single_line_comment.as_str();
    if !token.is_empty() {
        if let Some(i) = text[pos..].find(token) {
            candidates.push(Found {
                start: pos + i,
                end: pos + i + token.len(),
                kind: Opener::LineComment,
            });
        }
    }
    if let Some((open, close)) = &language.block_comment {
        if let Some(i) = text[pos..].find(open.as_str()) {
            candidates.push(Found {
                start: pos + i,
                end: pos + i + open.len(),
                kind: Opener::BlockComment(close),
            });
        }
    }
    for (index, rule) in language.rules.iter().enumerate() {
        if let RuleKind::MultiLine { start, end } = &rule.kind {
            if let Some(m) = start.find_at(text, pos).filter(|m| !m.is_empty()) {
                candidates.push(Found {
                    start: m.start(),
                    end: m.end(),
                    kind: Opener::Rule {
                        index,
                        end,
                        style: rule.style,
                    },
                });
            }
        }
    }
    candidates.into_iter().min_by_key(|found| found.start)
}

/// Style a stretch of ordinary code. Later passes overwrite earlier ones.
fn paint_code(
    language: &LanguageDefinition,
    text: &str,
    range: Range<usize>,
    styles: &mut [Option<StyleTag>],
) {
    if range.is_empty() {
        return;
    }
    let segment = &text[range.clone()];
    let base = range.start;

    for rule in &language.rules {
        if let RuleKind::Inline(regex) = &rule.kind {
            paint_matches(regex, segment, base, rule.style, styles);
        }
    }
    paint_matches(&NUMBER, segment, base, StyleTag::Number, styles);
    for caps in FUNCTION.captures_iter(segment) {
        if let Some(name) = caps.get(1) {
            paint(
                styles,
                base + name.start()..base + name.end(),
                StyleTag::Function,
            );
        }
    }
    paint_matches(&OPERATOR, segment, base, StyleTag::Operator, styles);

    let word_lists = [
        (&language.keywords, StyleTag::Keyword),
        (&language.types, StyleTag::Type),
        (&language.literals, StyleTag::Literal),
        (&language.builtins, StyleTag::Builtin),
    ];
    for (regex, style) in word_lists {
        if let Some(regex) = regex {
            paint_matches(regex, segment, base, style, styles);
        }
    }
    paint_strings(language, segment, base, styles);
}

fn paint_matches(
    regex: &Regex,
    segment: &str,
    base: usize,
    style: StyleTag,
    styles: &mut [Option<StyleTag>],
) {
    for m in regex.find_iter(segment) {
        paint(styles, base + m.start()..base + m.end(), style);
    }
}

/// String and char literals, scanned left to right so a delimiter inside
/// one kind of literal does not open the other. Backslash escapes the
/// next char; an unterminated literal runs to the end of the segment.
fn paint_strings(
    language: &LanguageDefinition,
    segment: &str,
    base: usize,
    styles: &mut [Option<StyleTag>],
) {
    let delimiters: Vec<&str> = [
        language.string_delimiter.as_str(),
        language.char_delimiter.as_str(),
    ]
    .into_iter()
    .filter(|d| !d.is_empty())
    .collect();
    if delimiters.is_empty() {
        return;
    }

    let mut i = 0;
    while i < segment.len() {
        let rest = &segment[i..];
        if let Some(delim) = delimiters.iter().find(|d| rest.starts_with(**d)) {
            let end = closing_delimiter(segment, i + delim.len(), delim).unwrap_or(segment.len());
            paint(styles, base + i..base + end, StyleTag::String);
            i = end;
        } else {
            i += next_char_len(rest);
        }
    }
}

fn closing_delimiter(segment: &str, from: usize, delim: &str) -> Option<usize> {
    let mut i = from;
    while i < segment.len() {
        let rest = &segment[i..];
        if rest.starts_with(delim) {
            return Some(i + delim.len());
        }
        if rest.starts_with('\\') {
            i += 1 + next_char_len(&rest[1..]).min(rest.len() - 1);
        } else {
            i += next_char_len(rest);
        }
    }
    None
}

fn next_char_len(s: &str) -> usize {
    s.chars().next().map_or(1, char::len_utf8)
}

fn paint(styles: &mut [Option<StyleTag>], range: Range<usize>, style: StyleTag) {
    let end = range.end.min(styles.len());
    let start = range.start.min(end);
    for slot in &mut styles[start..end] {
        *slot = Some(style);
    }
}

/// Collapse per-byte styles into char-offset spans.
fn to_spans(text: &str, styles: &[Option<StyleTag>]) -> Vec<Span> {
    let mut spans: Vec<Span> = Vec::new();
    for (char_idx, (byte_idx, _)) in text.char_indices().enumerate() {
        let Some(style) = styles[byte_idx] else {
            continue;
        };
        match spans.last_mut() {
            Some(last) if last.style == style && last.end() == char_idx => last.len += 1,
            _ => spans.push(Span {
                start: char_idx,
                len: 1,
                style,
            }),
        }
    }
    spans
}

#[derive(Debug, Clone, Default)]
struct CachedLine {
    spans: Vec<Span>,
    /// `None` until the line has been tokenized.
    state_out: Option<LineState>,
}

/// Per-document highlight cache.
#[derive(Debug)]
pub struct Highlighter {
    language: Arc<LanguageDefinition>,
    lines: Vec<CachedLine>,
}

impl Highlighter {
    pub fn new(language: Arc<LanguageDefinition>) -> Self {
        Self {
            language,
            lines: Vec::new(),
        }
    }

    pub fn language(&self) -> &LanguageDefinition {
        &self.language
    }

    /// Switch languages and re-tokenize the whole buffer.
    pub fn set_language(
        &mut self,
        language: Arc<LanguageDefinition>,
        buffer: &TextBuffer,
    ) -> Range<usize> {
        self.language = language;
        self.rehighlight_all(buffer)
    }

    /// Re-tokenize every line. Returns the refreshed line range.
    pub fn rehighlight_all(&mut self, buffer: &TextBuffer) -> Range<usize> {
        let _scope = perf::scope("highlight.rehighlight_all");
        self.lines = vec![CachedLine::default(); buffer.line_count()];
        self.refresh(buffer, 0, self.lines.len())
    }

    /// Follow a buffer change. Lines from the first touched line are
    /// re-tokenized until past the change and the outgoing state matches
    /// the cached one. Returns the refreshed line range.
    pub fn apply_change(&mut self, buffer: &TextBuffer, change: &Change) -> Range<usize> {
        self.apply_changes(buffer, std::slice::from_ref(change))
    }

    /// Follow several changes already applied to `buffer`, in application
    /// order. The cache is spliced once per change and the touched lines,
    /// carried through the later changes, are re-tokenized in one pass.
    pub fn apply_changes(&mut self, buffer: &TextBuffer, changes: &[Change]) -> Range<usize> {
        // First and last touched line, in current line numbers.
        let mut touched: Option<(usize, usize)> = None;
        for change in changes {
            if change.old_end_line() >= self.lines.len() {
                return self.out_of_step(buffer);
            }
            // The last replacement line inherits the old end line's outgoing
            // state so the refresh can tell when the edit stopped mattering.
            let carried = self.lines[change.old_end_line()].state_out;
            let mut stale = vec![CachedLine::default(); change.inserted_lines + 1];
            if let Some(last) = stale.last_mut() {
                last.state_out = carried;
            }
            self.lines
                .splice(change.start_line..=change.old_end_line(), stale);

            touched = Some(match touched {
                Some((first, last)) => (
                    change.map_line(first).min(change.start_line),
                    change.map_line(last).max(change.new_end_line()),
                ),
                None => (change.start_line, change.new_end_line()),
            });
        }
        if self.lines.len() != buffer.line_count() {
            return self.out_of_step(buffer);
        }
        match touched {
            Some((first, last)) => self.refresh(buffer, first, last),
            None => 0..0,
        }
    }

    /// Spans of `line`; empty past the end.
    pub fn spans(&self, line: usize) -> &[Span] {
        self.lines.get(line).map_or(&[][..], |cached| cached.spans.as_slice())
    }

    /// State handed from `line` to the next one.
    pub fn state_after(&self, line: usize) -> LineState {
        self.lines
            .get(line)
            .and_then(|cached| cached.state_out)
            .unwrap_or_default()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn out_of_step(&mut self, buffer: &TextBuffer) -> Range<usize> {
        tracing::debug!(
            cached = self.lines.len(),
            lines = buffer.line_count(),
            "highlight cache out of step, rehighlighting"
        );
        self.rehighlight_all(buffer)
    }

    fn refresh(&mut self, buffer: &TextBuffer, first: usize, last_touched: usize) -> Range<usize> {
        let mut line = first;
        while line < self.lines.len() {
            let state_in = if line == 0 {
                LineState::Normal
            } else {
                self.lines[line - 1].state_out.unwrap_or_default()
            };
            let text = buffer.line_text(line).unwrap_or_default();
            let (spans, state_out) = highlight_line(&self.language, &text, state_in);
            let cached = &mut self.lines[line];
            let previous = cached.state_out.replace(state_out);
            cached.spans = spans;

            let settled = line >= last_touched && previous == Some(state_out);
            line += 1;
            if settled {
                break;
            }
        }
        tracing::debug!(first, last = line, "highlight cache refreshed");
        first..line
    }
}
