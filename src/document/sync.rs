//! Split views over one file.
//!
//! Each view is a full [`Document`] with its own cursors and history.
//! Whatever a view applies to its buffer is replayed on every other view,
//! so the texts never diverge.

use crate::config::EditorConfig;

use super::{Command, Document};

#[derive(Debug)]
pub struct SyncGroup {
    views: Vec<Document>,
}

impl SyncGroup {
    /// Start a group with `document` as its only view.
    pub fn new(mut document: Document) -> Self {
        document.set_replicating(true);
        Self {
            views: vec![document],
        }
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn view(&self, index: usize) -> Option<&Document> {
        self.views.get(index)
    }

    /// Open another view of `index`'s text. The new view shares the
    /// language and settings but starts with its own caret and an empty
    /// history. Returns the new view's index.
    pub fn split(&mut self, index: usize) -> Option<usize> {
        let source = self.views.get(index)?;
        let config: EditorConfig = source.config().clone();
        let language = source.language_name().to_string();
        let mut view = Document::with_text(&source.text(), config);
        view.set_language(&language);
        view.set_replicating(true);
        view.drain_notifications();
        self.views.push(view);
        tracing::debug!(views = self.views.len(), "view split");
        Some(self.views.len() - 1)
    }

    /// Close a view. The last remaining view cannot be closed.
    pub fn close(&mut self, index: usize) -> Option<Document> {
        if self.views.len() <= 1 || index >= self.views.len() {
            return None;
        }
        let mut view = self.views.remove(index);
        view.set_replicating(false);
        Some(view)
    }

    /// Run `action` against one view, then replay its mutations on the
    /// others.
    pub fn edit<R>(&mut self, index: usize, action: impl FnOnce(&mut Document) -> R) -> Option<R> {
        let view = self.views.get_mut(index)?;
        let result = action(view);
        let commands = view.take_outgoing();
        if !commands.is_empty() {
            for (i, other) in self.views.iter_mut().enumerate() {
                if i != index {
                    other.apply_remote(&commands);
                }
            }
        }
        Some(result)
    }

    /// [`Document::execute`] on one view, replicated to the others.
    pub fn execute(&mut self, index: usize, command: Command) -> bool {
        self.edit(index, |view| view.execute(command))
            .unwrap_or(false)
    }

    /// Replace the text of every view.
    pub fn set_text(&mut self, text: &str) {
        for view in &mut self.views {
            view.set_text(text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::Motion;

    fn group(text: &str) -> SyncGroup {
        SyncGroup::new(Document::with_text(text, EditorConfig::default()))
    }

    #[test]
    fn test_edit_replicates_and_keeps_cursors() {
        let mut g = group("hello");
        let other = g.split(0).unwrap();
        g.edit(other, |view| view.set_cursors(&[(5, 5)]));

        g.execute(0, Command::InsertText("> ".to_string()));
        assert_eq!(g.view(0).unwrap().text(), "> hello");
        assert_eq!(g.view(other).unwrap().text(), "> hello");
        assert_eq!(g.view(0).unwrap().cursor_offsets(), vec![(2, 2)]);
        assert_eq!(g.view(other).unwrap().cursor_offsets(), vec![(7, 7)]);
    }

    #[test]
    fn test_undo_replicates() {
        let mut g = group("abc");
        g.split(0);
        g.execute(
            1,
            Command::Move {
                motion: Motion::DocumentEnd,
                extend: false,
            },
        );
        g.execute(1, Command::InsertText("d".to_string()));
        assert_eq!(g.view(0).unwrap().text(), "abcd");

        assert!(g.execute(1, Command::Undo));
        assert_eq!(g.view(0).unwrap().text(), "abc");
        assert_eq!(g.view(1).unwrap().text(), "abc");
    }

    #[test]
    fn test_each_view_has_own_history() {
        let mut g = group("x");
        g.split(0);
        g.execute(0, Command::InsertText("a".to_string()));
        // The replica recorded the edit as its own step.
        assert!(g.view(1).unwrap().history().can_undo());
        assert!(g.execute(1, Command::Undo));
        assert_eq!(g.view(0).unwrap().text(), "x");
    }

    #[test]
    fn test_split_copies_language() {
        let mut doc = Document::with_text("fn f() {}", EditorConfig::default());
        doc.set_language("Rust");
        let mut g = SyncGroup::new(doc);
        let other = g.split(0).unwrap();
        assert_eq!(g.view(other).unwrap().language_name(), "Rust");
    }

    #[test]
    fn test_last_view_cannot_close() {
        let mut g = group("x");
        assert!(g.close(0).is_none());
        g.split(0);
        assert!(g.close(1).is_some());
        assert_eq!(g.len(), 1);
        assert!(g.edit(3, |_| ()).is_none());
    }
}
