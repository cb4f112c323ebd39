//! Cursor and selection engine.
//!
//! A [`CursorSet`] owns every active cursor of a document: exactly one
//! primary and any number of secondaries. Editing gestures are planned per
//! cursor and applied to the buffer in descending offset order so that
//! earlier offsets stay valid while later ones are rewritten.

mod edit;
mod motion;
mod set;

pub use edit::{CaretPlacement, PlannedEdit};
pub use set::CursorSet;

use crate::buffer::TextRange;

/// An edit point with an optional selection.
///
/// `anchor == head` means a plain caret; otherwise the selection spans the
/// two offsets and `head` is the end that moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub anchor: usize,
    pub head: usize,
    pub is_primary: bool,
    pub is_column_mode: bool,
    /// Column remembered across vertical moves.
    preferred_col: Option<usize>,
}

impl Cursor {
    /// A caret with no selection.
    pub const fn caret(offset: usize) -> Self {
        Self::selection(offset, offset)
    }

    pub const fn selection(anchor: usize, head: usize) -> Self {
        Self {
            anchor,
            head,
            is_primary: false,
            is_column_mode: false,
            preferred_col: None,
        }
    }

    #[must_use]
    pub const fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }

    pub const fn range(&self) -> TextRange {
        TextRange::new(self.anchor, self.head)
    }

    pub const fn start(&self) -> usize {
        if self.anchor < self.head {
            self.anchor
        } else {
            self.head
        }
    }

    pub const fn end(&self) -> usize {
        if self.anchor > self.head {
            self.anchor
        } else {
            self.head
        }
    }

    pub const fn has_selection(&self) -> bool {
        self.anchor != self.head
    }

    /// Whether the selection runs backwards (head before anchor).
    pub const fn is_reversed(&self) -> bool {
        self.head < self.anchor
    }

    /// Collapse the selection to a caret at `offset`.
    pub const fn collapse_to(&mut self, offset: usize) {
        self.anchor = offset;
        self.head = offset;
        self.preferred_col = None;
    }

    const fn set_range(&mut self, anchor: usize, head: usize) {
        self.anchor = anchor;
        self.head = head;
        self.preferred_col = None;
    }
}

/// Cursor movement applied to every cursor at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    LineStart,
    LineEnd,
    WordLeft,
    WordRight,
    DocumentStart,
    DocumentEnd,
}
