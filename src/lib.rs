// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. cursor::CursorSet)
    clippy::module_name_repetitions
)]

//! # editcore
//!
//! The text-editing core of a code editor, with no rendering attached.
//!
//! editcore provides:
//! - A rope-backed text buffer addressed by char offsets and lines
//! - Multiple cursors, column (box) selection and cursor motions
//! - Grouped undo/redo with typing-run coalescing
//! - Indentation-based code folding
//! - Incremental, rule-driven syntax highlighting
//! - Literal find/replace with case, whole-word, direction and wrap options
//!
//! ## Architecture
//!
//! A [`document::Document`] owns one buffer and every subsystem that
//! follows it. Each mutation is returned as a [`buffer::Change`] and handed
//! synchronously to the cursors, history, folding and highlighting before
//! the call returns; subsystems only read the buffer while reacting.
//! Presentation code drives a document with [`document::Command`]s and
//! reads back [`document::Notification`]s.
//!
//! ## Modules
//!
//! - [`buffer`]: Text storage, positions and change events
//! - [`cursor`]: Cursor set and multi-cursor editing
//! - [`history`]: Undo/redo log
//! - [`folding`]: Fold region detection and visibility
//! - [`highlight`]: Language definitions and line tokenizing
//! - [`search`]: Find and replace
//! - [`document`]: The façade tying it together, plus split views
//! - [`config`]: Settings record and flag files

pub mod buffer;
pub mod config;
pub mod cursor;
pub mod document;
pub mod folding;
pub mod highlight;
pub mod history;
pub mod perf;
pub mod search;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::buffer::{Change, Position, TextBuffer, TextRange};
    pub use crate::config::EditorConfig;
    pub use crate::cursor::{Cursor, CursorSet, Motion};
    pub use crate::document::{Command, Document, Notification, SyncGroup};
    pub use crate::highlight::{LineState, Span, StyleTag};
    pub use crate::search::SearchOptions;
}
