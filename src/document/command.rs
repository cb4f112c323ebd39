use crate::buffer::{Position, TextRange};
use crate::cursor::Motion;
use crate::search::SearchOptions;

use super::Document;

/// Presentation-to-core requests.
///
/// Every command maps onto one [`Document`] method; [`Document::execute`]
/// lets a front end or a split-view group drive a document from a queue of
/// these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // Editing
    /// Type text at every cursor
    InsertText(String),
    /// Delete selection or previous char
    Backspace,
    /// Delete selection or next char
    DeleteForward,
    /// Delete an explicit range
    DeleteRange(TextRange),
    /// Break the line at every cursor
    InsertNewline,
    /// Indent at every cursor
    Indent,
    /// Unindent every cursor's line
    Unindent,

    // Cursors
    /// Replace all cursors with (anchor, head) pairs
    SetCursors(Vec<(usize, usize)>),
    /// Add a caret at an offset
    AddCursorAt(usize),
    /// Add a caret above the top-most cursor
    AddCursorAbove,
    /// Add a caret below the bottom-most cursor
    AddCursorBelow,
    /// Add a cursor on every occurrence of the selected word
    AddCursorsAtWordOccurrences,
    /// Start a box selection
    BeginColumnSelection(Position),
    /// Drag a box selection
    UpdateColumnSelection(Position),
    /// Finish a box selection
    EndColumnSelection,
    /// Collapse to the primary cursor
    ClearCursors,
    /// Move every cursor
    Move { motion: Motion, extend: bool },
    SelectLine,
    SelectWord,
    ExpandSelection,
    ShrinkSelection,

    // Folding
    /// Toggle the fold starting at a line
    ToggleFold(usize),
    FoldAll,
    UnfoldAll,

    // Highlighting
    /// Switch language by name or extension
    SetLanguage(String),

    // Search
    Find {
        pattern: String,
        options: SearchOptions,
    },
    Replace {
        pattern: String,
        replacement: String,
        options: SearchOptions,
    },
    ReplaceAll {
        pattern: String,
        replacement: String,
        options: SearchOptions,
    },

    // History
    Undo,
    Redo,
}

impl Document {
    /// Run one command. Returns whether it had an effect.
    pub fn execute(&mut self, command: Command) -> bool {
        match command {
            Command::InsertText(text) => self.insert_text(&text),
            Command::Backspace => self.backspace(),
            Command::DeleteForward => self.delete_forward(),
            Command::DeleteRange(range) => self.delete_range(range),
            Command::InsertNewline => self.insert_newline(),
            Command::Indent => self.indent(),
            Command::Unindent => self.unindent(),

            Command::SetCursors(pairs) => {
                self.set_cursors(&pairs);
                true
            }
            Command::AddCursorAt(offset) => {
                self.add_cursor_at(offset);
                true
            }
            Command::AddCursorAbove => self.add_cursor_above(),
            Command::AddCursorBelow => self.add_cursor_below(),
            Command::AddCursorsAtWordOccurrences => self.add_cursors_at_word_occurrences() > 0,
            Command::BeginColumnSelection(origin) => {
                self.begin_column_selection(origin);
                true
            }
            Command::UpdateColumnSelection(pointer) => {
                self.update_column_selection(pointer);
                true
            }
            Command::EndColumnSelection => {
                self.end_column_selection();
                true
            }
            Command::ClearCursors => {
                self.clear_cursors();
                true
            }
            Command::Move { motion, extend } => {
                self.move_cursors(motion, extend);
                true
            }
            Command::SelectLine => {
                self.select_line();
                true
            }
            Command::SelectWord => self.select_word(),
            Command::ExpandSelection => {
                self.expand_selection();
                true
            }
            Command::ShrinkSelection => {
                self.shrink_selection();
                true
            }

            Command::ToggleFold(line) => self.toggle_fold(line).is_some(),
            Command::FoldAll => self.fold_all() > 0,
            Command::UnfoldAll => self.unfold_all() > 0,

            Command::SetLanguage(name) => self.set_language(&name),

            Command::Find { pattern, options } => self.find(&pattern, options).is_some(),
            Command::Replace {
                pattern,
                replacement,
                options,
            } => {
                let before = self.history.undo_count();
                let next = self.replace(&pattern, &replacement, options);
                next.is_some() || self.history.undo_count() != before
            }
            Command::ReplaceAll {
                pattern,
                replacement,
                options,
            } => self.replace_all(&pattern, &replacement, options) > 0,

            Command::Undo => self.undo(),
            Command::Redo => self.redo(),
        }
    }
}
