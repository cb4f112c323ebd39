//! Rope-backed text buffer.
//!
//! The buffer is line-addressable and reports every mutation as a
//! [`Change`]. It knows nothing about cursors, history or highlighting;
//! the [`crate::document::Document`] forwards each change to those
//! subsystems before control returns to the caller.

mod text_buffer;
mod types;

pub use text_buffer::{Splice, TextBuffer};
pub use types::{Change, FindFlags, Position, TextRange, is_word_char};
