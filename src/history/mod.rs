//! Undo/redo history.
//!
//! A linear list of entries with a pointer: entries before the pointer can
//! be undone, entries from the pointer on can be redone. Each entry groups
//! the commands of one user action (a multi-cursor broadcast is a single
//! step). Replaying an entry writes straight to the buffer and is never
//! recorded again.

use std::collections::VecDeque;

use crate::buffer::{Change, Splice, TextBuffer};

/// Default number of undo steps kept before the oldest is evicted.
pub const DEFAULT_UNDO_LIMIT: usize = 1000;

/// A reversible record of one buffer mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditCommand {
    /// Char offset where the mutation happened.
    pub position: usize,
    /// Text that was removed at `position`.
    pub removed: String,
    /// Text that was inserted at `position`.
    pub inserted: String,
}

impl EditCommand {
    pub fn new(position: usize, removed: impl Into<String>, inserted: impl Into<String>) -> Self {
        Self {
            position,
            removed: removed.into(),
            inserted: inserted.into(),
        }
    }

    /// Build the command describing a splice that inserted `inserted`.
    pub fn from_splice(splice: &Splice, inserted: &str) -> Self {
        Self::new(splice.change.position, splice.removed.clone(), inserted)
    }

    /// The command that undoes this one.
    pub fn inverse(&self) -> Self {
        Self {
            position: self.position,
            removed: self.inserted.clone(),
            inserted: self.removed.clone(),
        }
    }

    /// Apply the command to `buffer`.
    pub fn apply(&self, buffer: &mut TextBuffer) -> Option<Change> {
        buffer
            .splice(self.position, self.removed.chars().count(), &self.inserted)
            .map(|splice| splice.change)
    }

    fn is_single_char_insert(&self) -> bool {
        self.removed.is_empty() && self.inserted.chars().count() == 1
    }

    /// Offset just past the inserted text.
    fn insert_end(&self) -> usize {
        self.position + self.inserted.chars().count()
    }
}

/// A command that has been applied, together with the change it caused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedEdit {
    pub command: EditCommand,
    pub change: Change,
}

impl AppliedEdit {
    /// Apply `command` to `buffer`, keeping the resulting change.
    pub fn apply(command: EditCommand, buffer: &mut TextBuffer) -> Option<Self> {
        let change = command.apply(buffer)?;
        Some(Self { command, change })
    }
}

/// One undo step.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    commands: Vec<EditCommand>,
}

/// Bounded undo/redo log.
#[derive(Debug)]
pub struct UndoLog {
    entries: VecDeque<Entry>,
    pointer: usize,
    limit: usize,
    typing: Option<EditCommand>,
}

impl UndoLog {
    pub const fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            pointer: 0,
            limit,
            typing: None,
        }
    }

    /// Commit a single command as its own undo step.
    ///
    /// Any redo entries above the pointer are discarded.
    pub fn commit(&mut self, command: EditCommand) {
        self.seal();
        self.push_entry(Entry {
            commands: vec![command],
        });
    }

    /// Commit several commands, applied in order, as one undo step.
    pub fn commit_group(&mut self, commands: Vec<EditCommand>) {
        if commands.is_empty() {
            return;
        }
        self.seal();
        self.push_entry(Entry { commands });
    }

    /// Record a command produced by ordinary typing.
    ///
    /// Single-character insertions are coalesced into the pending typing
    /// run while they stay contiguous; everything else commits directly.
    pub fn record(&mut self, command: EditCommand) {
        if !command.is_single_char_insert() {
            self.commit(command);
            return;
        }

        let ends_line = command.inserted == "\n";
        match self.typing.as_mut() {
            Some(run) if run.insert_end() == command.position => {
                run.inserted.push_str(&command.inserted);
            }
            _ => {
                self.seal();
                self.entries.truncate(self.pointer);
                self.typing = Some(command);
            }
        }
        if ends_line {
            self.seal();
        }
    }

    /// Close the pending typing run, turning it into a regular undo step.
    pub fn seal(&mut self) {
        if let Some(run) = self.typing.take() {
            self.push_entry(Entry {
                commands: vec![run],
            });
        }
    }

    /// Revert the newest undoable step. Returns the edits applied to `buffer`,
    /// empty when there was nothing to undo.
    pub fn undo(&mut self, buffer: &mut TextBuffer) -> Vec<AppliedEdit> {
        self.seal();
        if self.pointer == 0 {
            return Vec::new();
        }
        self.pointer -= 1;
        self.entries[self.pointer]
            .commands
            .iter()
            .rev()
            .filter_map(|command| AppliedEdit::apply(command.inverse(), buffer))
            .collect()
    }

    /// Re-apply the step just above the pointer.
    pub fn redo(&mut self, buffer: &mut TextBuffer) -> Vec<AppliedEdit> {
        self.seal();
        if self.pointer == self.entries.len() {
            return Vec::new();
        }
        let applied = self.entries[self.pointer]
            .commands
            .iter()
            .filter_map(|command| AppliedEdit::apply(command.clone(), buffer))
            .collect();
        self.pointer += 1;
        applied
    }

    pub fn can_undo(&self) -> bool {
        self.pointer > 0 || self.typing.is_some()
    }

    pub fn can_redo(&self) -> bool {
        self.typing.is_none() && self.pointer < self.entries.len()
    }

    /// Number of undo steps available, counting an open typing run.
    pub fn undo_count(&self) -> usize {
        self.pointer + usize::from(self.typing.is_some())
    }

    pub fn redo_count(&self) -> usize {
        if self.typing.is_some() {
            0
        } else {
            self.entries.len() - self.pointer
        }
    }

    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Change the capacity, evicting the oldest steps if needed.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
        self.evict();
    }

    /// Forget all history.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.pointer = 0;
        self.typing = None;
    }

    fn push_entry(&mut self, entry: Entry) {
        self.entries.truncate(self.pointer);
        self.entries.push_back(entry);
        self.pointer += 1;
        self.evict();
    }

    fn evict(&mut self) {
        while self.entries.len() > self.limit {
            self.entries.pop_front();
            self.pointer = self.pointer.saturating_sub(1);
        }
    }
}

impl Default for UndoLog {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(log: &mut UndoLog, buffer: &mut TextBuffer, command: EditCommand) {
        command.apply(buffer).unwrap();
        log.commit(command);
    }

    #[test]
    fn test_inverse_round_trip() {
        let mut buffer = TextBuffer::from_text("hello world");
        let command = EditCommand::new(6, "world", "there");
        command.apply(&mut buffer).unwrap();
        assert_eq!(buffer.text(), "hello there");
        command.inverse().apply(&mut buffer).unwrap();
        assert_eq!(buffer.text(), "hello world");
    }

    #[test]
    fn test_undo_on_empty_history_is_noop() {
        let mut buffer = TextBuffer::from_text("abc");
        let mut log = UndoLog::default();
        assert!(log.undo(&mut buffer).is_empty());
        assert!(log.redo(&mut buffer).is_empty());
        assert_eq!(buffer.text(), "abc");
    }

    #[test]
    fn test_undo_then_redo() {
        let mut buffer = TextBuffer::from_text("abc");
        let mut log = UndoLog::default();
        apply(&mut log, &mut buffer, EditCommand::new(3, "", "def"));
        apply(&mut log, &mut buffer, EditCommand::new(0, "a", ""));
        assert_eq!(buffer.text(), "bcdef");

        log.undo(&mut buffer);
        assert_eq!(buffer.text(), "abcdef");
        log.undo(&mut buffer);
        assert_eq!(buffer.text(), "abc");
        log.redo(&mut buffer);
        assert_eq!(buffer.text(), "abcdef");
    }

    #[test]
    fn test_commit_discards_redo_tail() {
        let mut buffer = TextBuffer::from_text("");
        let mut log = UndoLog::default();
        apply(&mut log, &mut buffer, EditCommand::new(0, "", "one"));
        log.undo(&mut buffer);
        assert!(log.can_redo());

        apply(&mut log, &mut buffer, EditCommand::new(0, "", "two"));
        assert!(!log.can_redo());
        assert!(log.redo(&mut buffer).is_empty());
        assert_eq!(buffer.text(), "two");
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut buffer = TextBuffer::from_text("");
        let mut log = UndoLog::new(2);
        for word in ["a", "b", "c"] {
            let end = buffer.total_length();
            apply(&mut log, &mut buffer, EditCommand::new(end, "", word));
        }
        assert_eq!(log.undo_count(), 2);
        log.undo(&mut buffer);
        log.undo(&mut buffer);
        assert!(log.undo(&mut buffer).is_empty());
        assert_eq!(buffer.text(), "a");
    }

    #[test]
    fn test_typing_run_coalesces_into_one_step() {
        let mut buffer = TextBuffer::from_text("");
        let mut log = UndoLog::default();
        for (i, ch) in ["h", "e", "y"].into_iter().enumerate() {
            let command = EditCommand::new(i, "", ch);
            command.apply(&mut buffer).unwrap();
            log.record(command);
        }
        assert_eq!(log.undo_count(), 1);
        log.undo(&mut buffer);
        assert_eq!(buffer.text(), "");
    }

    #[test]
    fn test_non_contiguous_typing_starts_new_run() {
        let mut buffer = TextBuffer::from_text("ab");
        let mut log = UndoLog::default();
        for command in [EditCommand::new(2, "", "x"), EditCommand::new(0, "", "y")] {
            command.apply(&mut buffer).unwrap();
            log.record(command);
        }
        assert_eq!(buffer.text(), "yabx");
        log.undo(&mut buffer);
        assert_eq!(buffer.text(), "abx");
    }

    #[test]
    fn test_group_reverts_in_reverse_order() {
        let mut buffer = TextBuffer::from_text("a b");
        let mut log = UndoLog::default();
        let commands = vec![EditCommand::new(2, "", "X"), EditCommand::new(0, "", "X")];
        for command in &commands {
            command.apply(&mut buffer).unwrap();
        }
        log.commit_group(commands);
        assert_eq!(buffer.text(), "Xa Xb");
        let undone = log.undo(&mut buffer);
        assert_eq!(undone.len(), 2);
        assert_eq!(buffer.text(), "a b");
    }

    #[test]
    fn test_set_limit_trims_history() {
        let mut buffer = TextBuffer::from_text("");
        let mut log = UndoLog::default();
        for i in 0..5 {
            apply(&mut log, &mut buffer, EditCommand::new(i, "", "x"));
        }
        log.set_limit(3);
        assert_eq!(log.undo_count(), 3);
        assert_eq!(log.limit(), 3);
    }
}
