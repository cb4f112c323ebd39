use crate::buffer::TextBuffer;
use crate::history::{AppliedEdit, EditCommand};

use super::{Cursor, CursorSet};

/// Where a cursor ends up after its own edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaretPlacement {
    /// Caret just past the inserted text.
    AfterInsert,
    /// Anchor and head follow the change like any other offset.
    Mapped,
}

/// One cursor's share of a broadcast edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedEdit {
    pub start: usize,
    pub remove: usize,
    pub text: String,
    pub caret: CaretPlacement,
}

impl PlannedEdit {
    pub fn replace(start: usize, remove: usize, text: impl Into<String>) -> Self {
        Self {
            start,
            remove,
            text: text.into(),
            caret: CaretPlacement::AfterInsert,
        }
    }

    #[must_use]
    pub const fn mapped(mut self) -> Self {
        self.caret = CaretPlacement::Mapped;
        self
    }

    const fn end(&self) -> usize {
        self.start + self.remove
    }

    fn conflicts(&self, other: &Self) -> bool {
        self.start == other.start || (self.start < other.end() && other.start < self.end())
    }
}

impl CursorSet {
    /// Plan one edit per cursor and apply them in descending offset order.
    ///
    /// A plan that collides with one already accepted (same start or an
    /// intersecting removal) is dropped. Every cursor is then moved to its
    /// post-edit place and the set is normalized. Returns the applied edits
    /// in application order.
    pub fn edit_with<F>(&mut self, buffer: &mut TextBuffer, mut plan: F) -> Vec<AppliedEdit>
    where
        F: FnMut(&TextBuffer, &Cursor) -> Option<PlannedEdit>,
    {
        self.normalize();
        let view: &TextBuffer = buffer;
        let mut plans: Vec<(usize, PlannedEdit)> = self
            .cursors()
            .iter()
            .enumerate()
            .filter_map(|(i, cursor)| plan(view, cursor).map(|p| (i, p)))
            .collect();
        plans.sort_by(|a, b| b.1.start.cmp(&a.1.start).then(b.1.end().cmp(&a.1.end())));

        let mut accepted: Vec<(usize, PlannedEdit)> = Vec::with_capacity(plans.len());
        for (owner, planned) in plans {
            if accepted.iter().any(|(_, p)| p.conflicts(&planned)) {
                continue;
            }
            accepted.push((owner, planned));
        }

        let mut applied = Vec::with_capacity(accepted.len());
        for (owner, planned) in accepted {
            let Some(splice) = buffer.splice(planned.start, planned.remove, &planned.text) else {
                continue;
            };
            let change = splice.change;
            for (i, cursor) in self.cursors_mut().iter_mut().enumerate() {
                if i == owner && planned.caret == CaretPlacement::AfterInsert {
                    cursor.collapse_to(change.position + change.inserted_len);
                } else {
                    let anchor = change.map_offset(cursor.anchor);
                    let head = change.map_offset(cursor.head);
                    cursor.set_range(anchor, head);
                }
            }
            applied.push(AppliedEdit {
                command: EditCommand::from_splice(&splice, &planned.text),
                change,
            });
        }
        self.normalize();
        applied
    }

    /// Type `text` at every cursor, replacing selections.
    pub fn insert_text(&mut self, buffer: &mut TextBuffer, text: &str) -> Vec<AppliedEdit> {
        self.edit_with(buffer, |_, cursor| {
            Some(PlannedEdit::replace(
                cursor.start(),
                cursor.range().len(),
                text,
            ))
        })
    }

    /// Delete each selection, or the char before each caret. A CRLF pair is
    /// removed as one unit.
    pub fn backspace(&mut self, buffer: &mut TextBuffer) -> Vec<AppliedEdit> {
        self.edit_with(buffer, |buf, cursor| {
            if cursor.has_selection() {
                return Some(PlannedEdit::replace(cursor.start(), cursor.range().len(), ""));
            }
            let head = cursor.head;
            if head == 0 {
                return None;
            }
            let crlf = head >= 2
                && buf.char_at(head - 1) == Some('\n')
                && buf.char_at(head - 2) == Some('\r');
            let width = if crlf { 2 } else { 1 };
            Some(PlannedEdit::replace(head - width, width, ""))
        })
    }

    /// Delete each selection, or the char after each caret.
    pub fn delete_forward(&mut self, buffer: &mut TextBuffer) -> Vec<AppliedEdit> {
        self.edit_with(buffer, |buf, cursor| {
            if cursor.has_selection() {
                return Some(PlannedEdit::replace(cursor.start(), cursor.range().len(), ""));
            }
            let head = cursor.head;
            let next = buf.char_at(head)?;
            let width = if next == '\r' && buf.char_at(head + 1) == Some('\n') {
                2
            } else {
                1
            };
            Some(PlannedEdit::replace(head, width, ""))
        })
    }

    /// Break the line at every cursor. With `auto_indent` the new line
    /// starts with the leading whitespace of the line it was split from.
    pub fn insert_newline(&mut self, buffer: &mut TextBuffer, auto_indent: bool) -> Vec<AppliedEdit> {
        self.edit_with(buffer, |buf, cursor| {
            let mut text = String::from("\n");
            if auto_indent {
                let pos = buf.offset_to_position(cursor.start());
                let line = buf.line_text(pos.line).unwrap_or_default();
                text.extend(
                    line.chars()
                        .take(pos.col)
                        .take_while(|c| *c == ' ' || *c == '\t'),
                );
            }
            Some(PlannedEdit::replace(cursor.start(), cursor.range().len(), text))
        })
    }

    /// Insert `width` spaces at every cursor. Selections are kept and grow
    /// to cover the inserted indentation.
    pub fn indent(&mut self, buffer: &mut TextBuffer, width: usize) -> Vec<AppliedEdit> {
        let spaces = " ".repeat(width.max(1));
        self.edit_with(buffer, |_, cursor| {
            let planned = PlannedEdit::replace(cursor.start(), 0, spaces.as_str());
            Some(if cursor.has_selection() {
                planned.mapped()
            } else {
                planned
            })
        })
    }

    /// Remove up to `width` leading spaces (or one leading tab) from each
    /// cursor's line. Several cursors on one line unindent it once.
    pub fn unindent(&mut self, buffer: &mut TextBuffer, width: usize) -> Vec<AppliedEdit> {
        self.edit_with(buffer, |buf, cursor| {
            let line = buf.line_of_offset(cursor.head);
            let text = buf.line_text(line)?;
            let remove = if text.starts_with('\t') {
                1
            } else {
                text.chars().take(width.max(1)).take_while(|c| *c == ' ').count()
            };
            (remove > 0).then(|| PlannedEdit::replace(buf.line_start(line), remove, "").mapped())
        })
    }
}
