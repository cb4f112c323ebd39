use crate::buffer::{Change, FindFlags, Position, TextBuffer, TextRange};

use super::motion;
use super::{Cursor, Motion};

/// The active cursors of one document.
///
/// Invariant after every public operation: cursors are sorted by start
/// offset, no two ranges overlap, and exactly one cursor is primary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorSet {
    cursors: Vec<Cursor>,
    column_origin: Option<Position>,
}

impl CursorSet {
    /// A single primary caret at the start of the buffer.
    pub fn new() -> Self {
        Self {
            cursors: vec![Cursor::caret(0).primary()],
            column_origin: None,
        }
    }

    pub fn cursors(&self) -> &[Cursor] {
        &self.cursors
    }

    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }

    pub fn primary(&self) -> &Cursor {
        &self.cursors[self.primary_index()]
    }

    pub fn primary_index(&self) -> usize {
        self.cursors.iter().position(|c| c.is_primary).unwrap_or(0)
    }

    pub const fn is_column_selecting(&self) -> bool {
        self.column_origin.is_some()
    }

    /// Replace all cursors with `(anchor, head)` pairs. The first pair
    /// becomes the primary; an empty list leaves a caret at offset 0.
    pub fn set_cursors(&mut self, buffer: &TextBuffer, pairs: &[(usize, usize)]) {
        self.column_origin = None;
        self.cursors = pairs
            .iter()
            .enumerate()
            .map(|(i, &(anchor, head))| {
                let mut cursor =
                    Cursor::selection(buffer.clamp_offset(anchor), buffer.clamp_offset(head));
                cursor.is_primary = i == 0;
                cursor
            })
            .collect();
        if self.cursors.is_empty() {
            self.cursors.push(Cursor::caret(0).primary());
        }
        self.normalize();
    }

    /// Collapse to a single primary caret at the primary's head.
    pub fn clear(&mut self) {
        let head = self.primary().head;
        self.cursors = vec![Cursor::caret(head).primary()];
        self.column_origin = None;
    }

    /// Add a secondary caret at `offset`.
    pub fn add_cursor_at(&mut self, buffer: &TextBuffer, offset: usize) {
        self.cursors.push(Cursor::caret(buffer.clamp_offset(offset)));
        self.normalize();
    }

    /// Add a caret one line above the top-most cursor.
    ///
    /// Returns `false` when there is no line above.
    pub fn add_cursor_above(&mut self, buffer: &TextBuffer) -> bool {
        let Some(top) = self.cursors.first() else {
            return false;
        };
        let pos = buffer.offset_to_position(top.head);
        if pos.line == 0 {
            return false;
        }
        let col = top.preferred_col.unwrap_or(pos.col);
        self.push_vertical(buffer, Position::new(pos.line - 1, col), col);
        true
    }

    /// Add a caret one line below the bottom-most cursor.
    pub fn add_cursor_below(&mut self, buffer: &TextBuffer) -> bool {
        let Some(bottom) = self.cursors.last() else {
            return false;
        };
        let pos = buffer.offset_to_position(bottom.head);
        if pos.line + 1 >= buffer.line_count() {
            return false;
        }
        let col = bottom.preferred_col.unwrap_or(pos.col);
        self.push_vertical(buffer, Position::new(pos.line + 1, col), col);
        true
    }

    /// Add a selecting cursor on every whole-word, case-sensitive occurrence
    /// of the primary's selected text.
    ///
    /// A primary without a selection first selects the word under it.
    /// Occurrences overlapping an existing cursor are skipped. Returns the
    /// number of cursors added.
    pub fn add_cursors_at_word_occurrences(&mut self, buffer: &TextBuffer) -> usize {
        if !self.primary().has_selection() && !self.select_word(buffer) {
            return 0;
        }
        let word = buffer.slice(self.primary().range());
        let flags = FindFlags {
            case_sensitive: true,
            whole_word: true,
            backward: false,
        };

        let mut added = 0;
        for found in buffer.find_all_raw(&word, flags) {
            if self.cursors.iter().any(|c| c.range().overlaps(&found)) {
                continue;
            }
            self.cursors.push(Cursor::selection(found.start, found.end));
            added += 1;
        }
        self.normalize();
        added
    }

    /// Start a column (box) selection at `origin`.
    pub fn begin_column_selection(&mut self, buffer: &TextBuffer, origin: Position) {
        self.column_origin = Some(origin);
        self.update_column_selection(buffer, origin);
    }

    /// Rebuild the box between the origin and `pointer`: one cursor per
    /// covered line, columns clipped to each line's length. The primary is
    /// the cursor on the pointer's line.
    pub fn update_column_selection(&mut self, buffer: &TextBuffer, pointer: Position) {
        let Some(origin) = self.column_origin else {
            return;
        };
        let last_line = buffer.line_count() - 1;
        let pointer_line = pointer.line.min(last_line);
        let first = origin.line.min(pointer_line);
        let last = origin.line.max(pointer_line).min(last_line);

        self.cursors = (first..=last)
            .map(|line| {
                let anchor = buffer.position_to_offset(Position::new(line, origin.col));
                let head = buffer.position_to_offset(Position::new(line, pointer.col));
                let mut cursor = Cursor::selection(anchor, head);
                cursor.is_column_mode = true;
                cursor.is_primary = line == pointer_line;
                cursor
            })
            .collect();
        self.normalize();
    }

    /// Leave column mode, keeping the cursors as ordinary selections.
    pub fn end_column_selection(&mut self) {
        self.column_origin = None;
        for cursor in &mut self.cursors {
            cursor.is_column_mode = false;
        }
    }

    /// Sort cursors and merge overlapping ones, leaving exactly one primary.
    pub fn normalize(&mut self) {
        if self.cursors.is_empty() {
            self.cursors.push(Cursor::caret(0).primary());
            return;
        }
        self.cursors.sort_by_key(|c| (c.start(), c.end()));

        let mut merged: Vec<Cursor> = Vec::with_capacity(self.cursors.len());
        for cursor in self.cursors.drain(..) {
            match merged.last_mut() {
                Some(last) if last.range().overlaps(&cursor.range()) => {
                    let start = last.start();
                    let end = last.end().max(cursor.end());
                    if last.is_reversed() {
                        last.set_range(end, start);
                    } else {
                        last.set_range(start, end);
                    }
                    last.is_primary |= cursor.is_primary;
                    last.is_column_mode &= cursor.is_column_mode;
                }
                _ => merged.push(cursor),
            }
        }

        let primary = merged.iter().position(|c| c.is_primary).unwrap_or(0);
        for (i, cursor) in merged.iter_mut().enumerate() {
            cursor.is_primary = i == primary;
        }
        self.cursors = merged;
    }

    /// Follow a buffer change made outside the cursor engine.
    pub fn map_through(&mut self, change: &Change) {
        for cursor in &mut self.cursors {
            let anchor = change.map_offset(cursor.anchor);
            let head = change.map_offset(cursor.head);
            cursor.set_range(anchor, head);
        }
        self.normalize();
    }

    /// Clamp every cursor into the buffer after it shrank.
    pub fn clamp(&mut self, buffer: &TextBuffer) {
        for cursor in &mut self.cursors {
            cursor.anchor = buffer.clamp_offset(cursor.anchor);
            cursor.head = buffer.clamp_offset(cursor.head);
        }
        self.normalize();
    }

    /// Move every cursor. With `extend` the anchor stays put; without it a
    /// horizontal move first collapses an existing selection to its edge.
    pub fn move_all(&mut self, buffer: &TextBuffer, motion: Motion, extend: bool) {
        self.column_origin = None;
        for cursor in &mut self.cursors {
            cursor.is_column_mode = false;
            if !extend && cursor.has_selection() {
                match motion {
                    Motion::Left => {
                        cursor.collapse_to(cursor.start());
                        continue;
                    }
                    Motion::Right => {
                        cursor.collapse_to(cursor.end());
                        continue;
                    }
                    _ => {}
                }
            }
            let (head, preferred_col) =
                motion::target(buffer, cursor.head, cursor.preferred_col, motion);
            if extend {
                cursor.head = head;
            } else {
                cursor.anchor = head;
                cursor.head = head;
            }
            cursor.preferred_col = preferred_col;
        }
        self.normalize();
    }

    /// Select the primary cursor's whole line, including its line break.
    pub fn select_line(&mut self, buffer: &TextBuffer) {
        let primary = *self.primary();
        let first = buffer.line_of_offset(primary.start());
        let last = buffer.line_of_offset(primary.end());
        let end = if last + 1 < buffer.line_count() {
            buffer.line_start(last + 1)
        } else {
            buffer.line_end(last)
        };
        self.set_primary_range(buffer.line_start(first), end);
    }

    /// Select the word under the primary cursor. Returns `false` when the
    /// cursor is not touching a word.
    pub fn select_word(&mut self, buffer: &TextBuffer) -> bool {
        let Some(word) = buffer.word_range_at(self.primary().head) else {
            return false;
        };
        self.set_primary_range(word.start, word.end);
        true
    }

    /// Grow the primary selection: caret to word, word to whole line.
    pub fn expand_selection(&mut self, buffer: &TextBuffer) {
        if self.primary().has_selection() || !self.select_word(buffer) {
            self.select_line(buffer);
        }
    }

    /// Shrink the primary selection to its first half, or to a caret once
    /// it is a single char.
    pub fn shrink_selection(&mut self) {
        let primary = *self.primary();
        let range = primary.range();
        if range.len() > 1 {
            self.set_primary_range(range.start, range.start + range.len() / 2);
        } else {
            self.set_primary_range(range.start, range.start);
        }
    }

    /// The primary cursor's selection, if any.
    pub fn primary_selection(&self) -> Option<TextRange> {
        let primary = self.primary();
        primary.has_selection().then(|| primary.range())
    }

    pub(super) fn cursors_mut(&mut self) -> &mut Vec<Cursor> {
        &mut self.cursors
    }

    /// Point the primary cursor at `anchor..head` and drop the secondaries.
    pub fn set_primary_range(&mut self, anchor: usize, head: usize) {
        self.cursors = vec![Cursor::selection(anchor, head).primary()];
        self.column_origin = None;
    }

    fn push_vertical(&mut self, buffer: &TextBuffer, target: Position, col: usize) {
        let mut cursor = Cursor::caret(buffer.position_to_offset(target));
        cursor.preferred_col = Some(col);
        self.cursors.push(cursor);
        self.normalize();
    }
}

impl Default for CursorSet {
    fn default() -> Self {
        Self::new()
    }
}
