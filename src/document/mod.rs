//! The editing core behind one view.
//!
//! [`Document`] owns a buffer together with its cursors, history, fold
//! regions and highlight cache. Every mutation is handed to those
//! subsystems synchronously before the call returns; what the presentation
//! layer needs to redraw is queued as [`Notification`]s.

mod command;
pub mod sync;

pub use command::Command;
pub use sync::SyncGroup;

use std::ops::Range;
use std::sync::Arc;

use crate::buffer::{Change, Position, TextBuffer, TextRange};
use crate::config::EditorConfig;
use crate::cursor::{CursorSet, Motion};
use crate::folding::FoldingEngine;
use crate::highlight::{
    Highlighter, LanguageDefinition, LanguageError, LanguageStore, PLAIN_TEXT, Span,
    resolve_language_name,
};
use crate::history::{AppliedEdit, EditCommand, UndoLog};
use crate::search::{self, SearchOptions};

/// Core-to-presentation events, in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// The buffer was mutated.
    BufferChanged(Change),
    /// Cursors moved, were added or were removed.
    CursorSetChanged,
    /// A fold region was collapsed or expanded.
    FoldRegionToggled { start_line: usize, collapsed: bool },
    /// Fresh spans for a line.
    HighlightSpansReady { line: usize, spans: Vec<Span> },
}

#[derive(Debug)]
pub struct Document {
    buffer: TextBuffer,
    cursors: CursorSet,
    history: UndoLog,
    folding: FoldingEngine,
    highlighter: Highlighter,
    languages: LanguageStore,
    language_name: String,
    config: EditorConfig,
    notifications: Vec<Notification>,
    /// Commands applied locally since the last drain; only kept while the
    /// document belongs to a [`SyncGroup`].
    outgoing: Vec<EditCommand>,
    replicating: bool,
}

impl Document {
    pub fn new(config: EditorConfig) -> Self {
        Self::with_text("", config)
    }

    /// A document holding `text`, highlighted as plain text.
    pub fn with_text(text: &str, config: EditorConfig) -> Self {
        let buffer = TextBuffer::from_text(text);
        let mut folding = FoldingEngine::new(config.tab_width, config.fold_placeholder.clone());
        folding.rescan(&buffer);
        let mut highlighter = Highlighter::new(Arc::new(LanguageDefinition::plain_text()));
        highlighter.rehighlight_all(&buffer);
        Self {
            buffer,
            cursors: CursorSet::new(),
            history: UndoLog::new(config.undo_limit),
            folding,
            highlighter,
            languages: LanguageStore::new(config.syntax_dirs.clone()),
            language_name: PLAIN_TEXT.to_string(),
            config,
            notifications: Vec::new(),
            outgoing: Vec::new(),
            replicating: false,
        }
    }

    pub const fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub const fn cursors(&self) -> &CursorSet {
        &self.cursors
    }

    pub const fn history(&self) -> &UndoLog {
        &self.history
    }

    pub const fn folding(&self) -> &FoldingEngine {
        &self.folding
    }

    pub const fn highlighter(&self) -> &Highlighter {
        &self.highlighter
    }

    pub const fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn language_name(&self) -> &str {
        &self.language_name
    }

    pub fn text(&self) -> String {
        self.buffer.text()
    }

    /// Replace the whole content. History, cursors, folds and highlighting
    /// start over.
    pub fn set_text(&mut self, text: &str) {
        if let Some(splice) = self.buffer.set_text(text) {
            self.notifications
                .push(Notification::BufferChanged(splice.change));
        }
        self.history.clear();
        self.cursors = CursorSet::new();
        self.outgoing.clear();
        self.folding.clear();
        self.folding.rescan(&self.buffer);
        let refreshed = self.highlighter.rehighlight_all(&self.buffer);
        self.notify_highlights(refreshed);
        self.notifications.push(Notification::CursorSetChanged);
    }

    /// `(anchor, head)` of every cursor, in document order.
    pub fn cursor_offsets(&self) -> Vec<(usize, usize)> {
        self.cursors
            .cursors()
            .iter()
            .map(|cursor| (cursor.anchor, cursor.head))
            .collect()
    }

    /// Take the queued notifications.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Adopt a new settings record.
    pub fn apply_settings(&mut self, config: EditorConfig) {
        if config.tab_width != self.config.tab_width {
            self.folding.set_tab_width(&self.buffer, config.tab_width);
        }
        if config.fold_placeholder != self.config.fold_placeholder {
            self.folding.set_placeholder(&config.fold_placeholder);
        }
        self.history.set_limit(config.undo_limit);
        let dirs_changed = config.syntax_dirs != self.config.syntax_dirs;
        self.config = config;
        if dirs_changed {
            self.languages
                .set_search_dirs(self.config.syntax_dirs.clone());
            let name = self.language_name.clone();
            self.set_language(&name);
        }
    }

    // --- Highlighting ---

    /// Switch the highlighting language by name or file extension.
    ///
    /// Returns whether the requested definition is now in effect. A missing
    /// definition falls back to plain text; a malformed one leaves the
    /// current definition in place.
    pub fn set_language(&mut self, token: &str) -> bool {
        let name = resolve_language_name(token);
        let (definition, loaded) = match self.languages.load(&name) {
            Ok(definition) => (definition, true),
            Err(LanguageError::NotFound(_)) => {
                tracing::debug!(language = %name, "no language definition, using plain text");
                (Arc::new(LanguageDefinition::plain_text()), false)
            }
            Err(err) => {
                tracing::warn!(language = %name, %err, "language definition rejected");
                return false;
            }
        };
        self.language_name = definition.name().to_string();
        let refreshed = self.highlighter.set_language(definition, &self.buffer);
        self.notify_highlights(refreshed);
        loaded
    }

    // --- Editing ---

    /// Type `text` at every cursor, replacing selections.
    pub fn insert_text(&mut self, text: &str) -> bool {
        let applied = self.cursors.insert_text(&mut self.buffer, text);
        self.commit(applied, true)
    }

    pub fn backspace(&mut self) -> bool {
        let applied = self.cursors.backspace(&mut self.buffer);
        self.commit(applied, false)
    }

    pub fn delete_forward(&mut self) -> bool {
        let applied = self.cursors.delete_forward(&mut self.buffer);
        self.commit(applied, false)
    }

    /// Remove `range` regardless of where the cursors are.
    pub fn delete_range(&mut self, range: TextRange) -> bool {
        let start = self.buffer.clamp_offset(range.start);
        let end = self.buffer.clamp_offset(range.end);
        let Some(splice) = self.buffer.splice(start, end - start, "") else {
            return false;
        };
        let edit = AppliedEdit {
            command: EditCommand::from_splice(&splice, ""),
            change: splice.change,
        };
        self.cursors.map_through(&edit.change);
        self.commit(vec![edit], false)
    }

    pub fn insert_newline(&mut self) -> bool {
        let applied = self
            .cursors
            .insert_newline(&mut self.buffer, self.config.auto_indent);
        self.commit(applied, true)
    }

    pub fn indent(&mut self) -> bool {
        let applied = self.cursors.indent(&mut self.buffer, self.config.tab_width);
        self.commit(applied, false)
    }

    pub fn unindent(&mut self) -> bool {
        let applied = self
            .cursors
            .unindent(&mut self.buffer, self.config.tab_width);
        self.commit(applied, false)
    }

    // --- Cursors ---

    /// Replace the cursor set with `(anchor, head)` pairs; the first is the
    /// primary.
    pub fn set_cursors(&mut self, pairs: &[(usize, usize)]) {
        self.cursors.set_cursors(&self.buffer, pairs);
        self.cursors_changed();
    }

    pub fn add_cursor_at(&mut self, offset: usize) {
        self.cursors.add_cursor_at(&self.buffer, offset);
        self.cursors_changed();
    }

    pub fn add_cursor_above(&mut self) -> bool {
        let added = self.cursors.add_cursor_above(&self.buffer);
        if added {
            self.cursors_changed();
        }
        added
    }

    pub fn add_cursor_below(&mut self) -> bool {
        let added = self.cursors.add_cursor_below(&self.buffer);
        if added {
            self.cursors_changed();
        }
        added
    }

    /// Returns the number of cursors added.
    pub fn add_cursors_at_word_occurrences(&mut self) -> usize {
        let added = self.cursors.add_cursors_at_word_occurrences(&self.buffer);
        self.cursors_changed();
        added
    }

    pub fn begin_column_selection(&mut self, origin: Position) {
        self.cursors.begin_column_selection(&self.buffer, origin);
        self.cursors_changed();
    }

    pub fn update_column_selection(&mut self, pointer: Position) {
        self.cursors.update_column_selection(&self.buffer, pointer);
        self.cursors_changed();
    }

    pub fn end_column_selection(&mut self) {
        self.cursors.end_column_selection();
    }

    /// Back to a single primary caret.
    pub fn clear_cursors(&mut self) {
        self.cursors.clear();
        self.cursors_changed();
    }

    pub fn move_cursors(&mut self, motion: Motion, extend: bool) {
        self.cursors.move_all(&self.buffer, motion, extend);
        self.cursors_changed();
    }

    pub fn select_line(&mut self) {
        self.cursors.select_line(&self.buffer);
        self.cursors_changed();
    }

    pub fn select_word(&mut self) -> bool {
        let selected = self.cursors.select_word(&self.buffer);
        if selected {
            self.cursors_changed();
        }
        selected
    }

    pub fn expand_selection(&mut self) {
        self.cursors.expand_selection(&self.buffer);
        self.cursors_changed();
    }

    pub fn shrink_selection(&mut self) {
        self.cursors.shrink_selection();
        self.cursors_changed();
    }

    // --- Folding ---

    /// Flip the fold starting at `line`. Returns the new collapsed state.
    pub fn toggle_fold(&mut self, line: usize) -> Option<bool> {
        let collapsed = self.folding.toggle(line)?;
        self.notifications.push(Notification::FoldRegionToggled {
            start_line: line,
            collapsed,
        });
        Some(collapsed)
    }

    /// Returns the number of regions collapsed.
    pub fn fold_all(&mut self) -> usize {
        let toggled = self.folding.fold_all();
        self.notify_folds(&toggled, true);
        toggled.len()
    }

    /// Returns the number of regions expanded.
    pub fn unfold_all(&mut self) -> usize {
        let toggled = self.folding.unfold_all();
        self.notify_folds(&toggled, false);
        toggled.len()
    }

    pub fn visible_lines(&self) -> Vec<usize> {
        self.folding.visible_lines(self.buffer.line_count())
    }

    // --- Search ---

    /// Search from the primary cursor and select the hit.
    ///
    /// Forward searches start at the end of the primary selection, backward
    /// ones at its start. Folds hiding the hit are expanded.
    pub fn find(&mut self, pattern: &str, options: SearchOptions) -> Option<TextRange> {
        let primary = self.cursors.primary();
        let from = if options.backward {
            primary.start()
        } else {
            primary.end()
        };
        let hit = search::find(&self.buffer, pattern, from, options)?;
        self.select(hit);
        Some(hit)
    }

    /// Replace the primary selection if it matches, then select the next
    /// match. Returns that next match.
    pub fn replace(
        &mut self,
        pattern: &str,
        replacement: &str,
        options: SearchOptions,
    ) -> Option<TextRange> {
        let selection = self.cursors.primary().range();
        let replaced = search::replace(&mut self.buffer, selection, pattern, replacement, options);
        if let Some(edit) = replaced.edit {
            self.cursors.map_through(&edit.change);
            self.commit(vec![edit], false);
        }
        let next = replaced.next?;
        self.select(next);
        Some(next)
    }

    /// Replace every match as one undo step. Returns the count replaced.
    pub fn replace_all(&mut self, pattern: &str, replacement: &str, options: SearchOptions) -> usize {
        let applied = search::replace_all(&mut self.buffer, pattern, replacement, options);
        let count = applied.len();
        for edit in &applied {
            self.cursors.map_through(&edit.change);
        }
        self.cursors.clamp(&self.buffer);
        self.commit(applied, false);
        count
    }

    pub fn count_matches(&self, pattern: &str, options: SearchOptions) -> usize {
        search::count_matches(&self.buffer, pattern, options)
    }

    // --- History ---

    pub fn undo(&mut self) -> bool {
        let applied = self.history.undo(&mut self.buffer);
        self.replay(applied)
    }

    pub fn redo(&mut self) -> bool {
        let applied = self.history.redo(&mut self.buffer);
        self.replay(applied)
    }

    // --- Replication ---

    /// Apply commands committed by another view of the same file.
    ///
    /// Local cursors follow the changes; the commands become one ordinary
    /// undo step here.
    pub fn apply_remote(&mut self, commands: &[EditCommand]) -> bool {
        let mut recorded = Vec::with_capacity(commands.len());
        for command in commands {
            let Some(edit) = AppliedEdit::apply(command.clone(), &mut self.buffer) else {
                continue;
            };
            self.cursors.map_through(&edit.change);
            self.dispatch(std::slice::from_ref(&edit.change));
            recorded.push(edit.command);
        }
        if recorded.is_empty() {
            return false;
        }
        self.cursors.clamp(&self.buffer);
        self.history.commit_group(recorded);
        self.notifications.push(Notification::CursorSetChanged);
        true
    }

    fn set_replicating(&mut self, replicating: bool) {
        self.replicating = replicating;
        self.outgoing.clear();
    }

    fn take_outgoing(&mut self) -> Vec<EditCommand> {
        std::mem::take(&mut self.outgoing)
    }

    // --- Internals ---

    /// Hand applied edits to the other subsystems and record them.
    ///
    /// `typing` lets a lone single-char insert join the open typing run.
    fn commit(&mut self, applied: Vec<AppliedEdit>, typing: bool) -> bool {
        if applied.is_empty() {
            return false;
        }
        let changes: Vec<Change> = applied.iter().map(|edit| edit.change).collect();
        self.dispatch(&changes);
        let mut commands: Vec<EditCommand> = applied.into_iter().map(|edit| edit.command).collect();
        if self.replicating {
            self.outgoing.extend(commands.iter().cloned());
        }
        match commands.pop() {
            Some(command) if typing && commands.is_empty() => self.history.record(command),
            Some(command) => {
                commands.push(command);
                self.history.commit_group(commands);
            }
            None => {}
        }
        self.notifications.push(Notification::CursorSetChanged);
        true
    }

    /// Undo/redo output: dispatch it and leave a caret after the last edit.
    fn replay(&mut self, applied: Vec<AppliedEdit>) -> bool {
        let Some(last) = applied.last() else {
            return false;
        };
        let caret = last.change.position + last.change.inserted_len;
        let changes: Vec<Change> = applied.iter().map(|edit| edit.change).collect();
        self.dispatch(&changes);
        if self.replicating {
            self.outgoing
                .extend(applied.into_iter().map(|edit| edit.command));
        }
        self.cursors.set_cursors(&self.buffer, &[(caret, caret)]);
        self.reveal(caret);
        self.notifications.push(Notification::CursorSetChanged);
        true
    }

    /// Hand a batch of changes, in application order, to folding and
    /// highlighting. The buffer already holds all of them.
    fn dispatch(&mut self, changes: &[Change]) {
        self.folding.apply_changes(&self.buffer, changes);
        let refreshed = self.highlighter.apply_changes(&self.buffer, changes);
        self.notifications
            .extend(changes.iter().copied().map(Notification::BufferChanged));
        self.notify_highlights(refreshed);
    }

    fn notify_highlights(&mut self, lines: Range<usize>) {
        for line in lines {
            let spans = self.highlighter.spans(line).to_vec();
            self.notifications
                .push(Notification::HighlightSpansReady { line, spans });
        }
    }

    fn notify_folds(&mut self, start_lines: &[usize], collapsed: bool) {
        self.notifications
            .extend(start_lines.iter().map(|&start_line| {
                Notification::FoldRegionToggled {
                    start_line,
                    collapsed,
                }
            }));
    }

    fn select(&mut self, range: TextRange) {
        self.cursors
            .set_cursors(&self.buffer, &[(range.start, range.end)]);
        self.cursors_changed();
    }

    /// A cursor reposition ends the typing run and unhides the primary.
    fn cursors_changed(&mut self) {
        self.history.seal();
        let head = self.cursors.primary().head;
        self.reveal(head);
        self.notifications.push(Notification::CursorSetChanged);
    }

    fn reveal(&mut self, offset: usize) {
        let line = self.buffer.line_of_offset(offset);
        let expanded = self.folding.reveal_line(line);
        self.notify_folds(&expanded, false);
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}
