use regex::{Regex, RegexBuilder};
use ropey::{Rope, RopeSlice};

use super::types::{Change, FindFlags, Position, TextRange, is_word_char};

/// Result of a splice: the broadcast change plus the text it removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice {
    pub change: Change,
    pub removed: String,
}

/// The canonical document text, backed by a rope.
///
/// All mutation funnels through [`TextBuffer::splice`]; each call reports a
/// [`Change`] describing what moved so that cursors, history, folding and
/// highlighting can follow along. Every position argument is clamped to the
/// current buffer, out-of-range input is never an error.
pub struct TextBuffer {
    rope: Rope,
}

impl TextBuffer {
    /// Create a new buffer from a string.
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Create an empty buffer.
    pub fn empty() -> Self {
        Self::from_text("")
    }

    /// Total number of lines in the buffer. Always at least 1.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Get the content of a line (without trailing newline).
    pub fn line_text(&self, line_idx: usize) -> Option<String> {
        if line_idx >= self.rope.len_lines() {
            return None;
        }
        let line = self.rope.line(line_idx);
        let len = content_len(line);
        Some(line.slice(..len).to_string())
    }

    /// Length of a line in chars (without trailing newline).
    pub fn line_len(&self, line_idx: usize) -> usize {
        if line_idx >= self.rope.len_lines() {
            return 0;
        }
        content_len(self.rope.line(line_idx))
    }

    /// Total number of chars in the buffer.
    pub fn total_length(&self) -> usize {
        self.rope.len_chars()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// The full text content of the buffer.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Text covered by `range`, clamped to the buffer.
    pub fn slice(&self, range: TextRange) -> String {
        let end = self.clamp_offset(range.end);
        let start = self.clamp_offset(range.start).min(end);
        self.rope.slice(start..end).to_string()
    }

    pub fn char_at(&self, offset: usize) -> Option<char> {
        (offset < self.rope.len_chars()).then(|| self.rope.char(offset))
    }

    pub fn clamp_offset(&self, offset: usize) -> usize {
        offset.min(self.rope.len_chars())
    }

    /// Offset of the first char of `line`, clamped to the last line.
    pub fn line_start(&self, line: usize) -> usize {
        let line = line.min(self.line_count() - 1);
        self.rope.line_to_char(line)
    }

    /// Offset just past the last char of `line` (before its line break).
    pub fn line_end(&self, line: usize) -> usize {
        let line = line.min(self.line_count() - 1);
        self.line_start(line) + self.line_len(line)
    }

    pub fn line_of_offset(&self, offset: usize) -> usize {
        self.rope.char_to_line(self.clamp_offset(offset))
    }

    pub fn offset_to_position(&self, offset: usize) -> Position {
        let offset = self.clamp_offset(offset);
        let line = self.rope.char_to_line(offset);
        let col = (offset - self.rope.line_to_char(line)).min(self.line_len(line));
        Position::new(line, col)
    }

    pub fn position_to_offset(&self, position: Position) -> usize {
        let line = position.line.min(self.line_count() - 1);
        let col = position.col.min(self.line_len(line));
        self.rope.line_to_char(line) + col
    }

    /// Replace `removed_len` chars at `position` with `text`.
    ///
    /// Returns `None` when nothing was removed and nothing inserted; no change
    /// is reported in that case.
    pub fn splice(&mut self, position: usize, removed_len: usize, text: &str) -> Option<Splice> {
        let total = self.rope.len_chars();
        let start = position.min(total);
        let end = start.saturating_add(removed_len).min(total);
        if start == end && text.is_empty() {
            return None;
        }

        let start_line = self.rope.char_to_line(start);
        let old_end_line = self.rope.char_to_line(end);
        let removed = self.rope.slice(start..end).to_string();
        if end > start {
            self.rope.remove(start..end);
        }
        if !text.is_empty() {
            self.rope.insert(start, text);
        }
        let inserted_len = text.chars().count();
        let new_end_line = self.rope.char_to_line(start + inserted_len);

        Some(Splice {
            change: Change {
                position: start,
                removed_len: end - start,
                inserted_len,
                start_line,
                removed_lines: old_end_line - start_line,
                inserted_lines: new_end_line.saturating_sub(start_line),
            },
            removed,
        })
    }

    /// Insert `text` at `position`.
    pub fn insert(&mut self, position: usize, text: &str) -> Option<Change> {
        self.splice(position, 0, text).map(|s| s.change)
    }

    /// Delete `length` chars starting at `position`.
    pub fn delete(&mut self, position: usize, length: usize) -> Option<Change> {
        self.splice(position, length, "").map(|s| s.change)
    }

    /// Replace the whole content.
    pub fn set_text(&mut self, text: &str) -> Option<Splice> {
        self.splice(0, self.rope.len_chars(), text)
    }

    /// Find a literal `pattern` starting from `from`.
    ///
    /// Forward search returns the first match starting at or after `from`;
    /// backward search returns the last match ending at or before `from`.
    /// An empty pattern never matches.
    pub fn find_raw(&self, pattern: &str, from: usize, flags: FindFlags) -> Option<TextRange> {
        let regex = literal_regex(pattern, flags.case_sensitive)?;
        let haystack = self.rope.to_string();
        let from_byte = self.rope.char_to_byte(self.clamp_offset(from));

        let found = if flags.backward {
            Candidates::new(&regex, &haystack, 0, flags.whole_word, true)
                .take_while(|&(start, _)| start < from_byte)
                .filter(|&(_, end)| end <= from_byte)
                .last()
        } else {
            Candidates::new(&regex, &haystack, from_byte, flags.whole_word, false).next()
        }?;
        Some(self.byte_range_to_chars(found))
    }

    /// Every non-overlapping forward match of a literal `pattern`.
    pub fn find_all_raw(&self, pattern: &str, flags: FindFlags) -> Vec<TextRange> {
        let Some(regex) = literal_regex(pattern, flags.case_sensitive) else {
            return Vec::new();
        };
        let haystack = self.rope.to_string();
        Candidates::new(&regex, &haystack, 0, flags.whole_word, false)
            .map(|range| self.byte_range_to_chars(range))
            .collect()
    }

    /// The run of word chars touching `offset`, if any.
    ///
    /// A cursor sitting just after a word selects that word.
    pub fn word_range_at(&self, offset: usize) -> Option<TextRange> {
        let offset = self.clamp_offset(offset);
        let mut start = offset;
        while start > 0 && self.char_at(start - 1).is_some_and(is_word_char) {
            start -= 1;
        }
        let mut end = offset;
        while self.char_at(end).is_some_and(is_word_char) {
            end += 1;
        }
        (end > start).then_some(TextRange::new(start, end))
    }

    fn byte_range_to_chars(&self, (start, end): (usize, usize)) -> TextRange {
        TextRange::new(self.rope.byte_to_char(start), self.rope.byte_to_char(end))
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for TextBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextBuffer")
            .field(
                "rope",
                &format_args!(
                    "Rope({} lines, {} chars)",
                    self.rope.len_lines(),
                    self.rope.len_chars()
                ),
            )
            .finish()
    }
}

/// Length of a rope line in chars, excluding its trailing line break.
fn content_len(line: RopeSlice<'_>) -> usize {
    let mut len = line.len_chars();
    if len > 0 && line.char(len - 1) == '\n' {
        len -= 1;
    }
    if len > 0 && line.char(len - 1) == '\r' {
        len -= 1;
    }
    len
}

fn literal_regex(pattern: &str, case_sensitive: bool) -> Option<Regex> {
    if pattern.is_empty() {
        return None;
    }
    match RegexBuilder::new(&regex::escape(pattern))
        .case_insensitive(!case_sensitive)
        .build()
    {
        Ok(regex) => Some(regex),
        Err(err) => {
            tracing::warn!(%err, "search pattern rejected");
            None
        }
    }
}

fn is_whole_word(haystack: &str, start: usize, end: usize) -> bool {
    let before = haystack[..start].chars().next_back();
    let after = haystack[end..].chars().next();
    !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
}

/// Byte ranges of literal matches, filtered by the whole-word rule.
///
/// A candidate rejected by the whole-word test does not consume the text it
/// covered, so a qualifying match overlapping it is still found.
struct Candidates<'a> {
    regex: &'a Regex,
    haystack: &'a str,
    at: usize,
    whole_word: bool,
    overlapping: bool,
}

impl<'a> Candidates<'a> {
    const fn new(
        regex: &'a Regex,
        haystack: &'a str,
        at: usize,
        whole_word: bool,
        overlapping: bool,
    ) -> Self {
        Self {
            regex,
            haystack,
            at,
            whole_word,
            overlapping,
        }
    }

    fn step_past(&self, start: usize) -> usize {
        start
            + self.haystack[start..]
                .chars()
                .next()
                .map_or(1, char::len_utf8)
    }
}

impl Iterator for Candidates<'_> {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        while self.at <= self.haystack.len() {
            let m = self.regex.find_at(self.haystack, self.at)?;
            let accepted = !self.whole_word || is_whole_word(self.haystack, m.start(), m.end());
            self.at = if accepted && !self.overlapping && m.end() > m.start() {
                m.end()
            } else {
                self.step_past(m.start())
            };
            if accepted {
                return Some((m.start(), m.end()));
            }
        }
        None
    }
}
