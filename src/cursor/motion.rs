use crate::buffer::{Position, TextBuffer, is_word_char};

use super::Motion;

/// Where a head at `offset` lands after `motion`.
///
/// Returns the new offset and the column to remember for the next vertical
/// move (only vertical motions keep one).
pub(super) fn target(
    buffer: &TextBuffer,
    offset: usize,
    preferred_col: Option<usize>,
    motion: Motion,
) -> (usize, Option<usize>) {
    let pos = buffer.offset_to_position(offset);
    match motion {
        Motion::Left => (move_left(buffer, offset), None),
        Motion::Right => (move_right(buffer, offset), None),
        Motion::Up => move_vertical(buffer, pos, preferred_col, false),
        Motion::Down => move_vertical(buffer, pos, preferred_col, true),
        Motion::LineStart => (buffer.line_start(pos.line), None),
        Motion::LineEnd => (buffer.line_end(pos.line), None),
        Motion::WordLeft => (move_word_left(buffer, pos), None),
        Motion::WordRight => (move_word_right(buffer, pos), None),
        Motion::DocumentStart => (0, None),
        Motion::DocumentEnd => (buffer.total_length(), None),
    }
}

fn move_left(buffer: &TextBuffer, offset: usize) -> usize {
    let pos = buffer.offset_to_position(offset);
    if pos.col > 0 {
        offset - 1
    } else if pos.line > 0 {
        buffer.line_end(pos.line - 1)
    } else {
        0
    }
}

fn move_right(buffer: &TextBuffer, offset: usize) -> usize {
    let pos = buffer.offset_to_position(offset);
    if pos.col < buffer.line_len(pos.line) {
        offset + 1
    } else if pos.line + 1 < buffer.line_count() {
        buffer.line_start(pos.line + 1)
    } else {
        offset
    }
}

fn move_vertical(
    buffer: &TextBuffer,
    pos: Position,
    preferred_col: Option<usize>,
    down: bool,
) -> (usize, Option<usize>) {
    let col = preferred_col.unwrap_or(pos.col);
    let line = if down {
        if pos.line + 1 >= buffer.line_count() {
            return (buffer.position_to_offset(pos), Some(col));
        }
        pos.line + 1
    } else {
        if pos.line == 0 {
            return (buffer.position_to_offset(pos), Some(col));
        }
        pos.line - 1
    };
    (buffer.position_to_offset(Position::new(line, col)), Some(col))
}

fn move_word_left(buffer: &TextBuffer, pos: Position) -> usize {
    if pos.col == 0 {
        return if pos.line > 0 {
            buffer.line_end(pos.line - 1)
        } else {
            0
        };
    }

    let chars: Vec<char> = buffer
        .line_text(pos.line)
        .unwrap_or_default()
        .chars()
        .take(pos.col)
        .collect();
    let mut col = chars.len();
    while col > 0 && chars[col - 1].is_whitespace() {
        col -= 1;
    }
    if col > 0 && !is_word_char(chars[col - 1]) {
        col -= 1;
    } else {
        while col > 0 && is_word_char(chars[col - 1]) {
            col -= 1;
        }
    }
    buffer.line_start(pos.line) + col
}

fn move_word_right(buffer: &TextBuffer, pos: Position) -> usize {
    let line_len = buffer.line_len(pos.line);
    if pos.col >= line_len {
        return if pos.line + 1 < buffer.line_count() {
            buffer.line_start(pos.line + 1)
        } else {
            buffer.line_end(pos.line)
        };
    }

    let chars: Vec<char> = buffer.line_text(pos.line).unwrap_or_default().chars().collect();
    let mut col = pos.col;
    // Skip the current word, then the gap up to the next one.
    while col < chars.len() && is_word_char(chars[col]) {
        col += 1;
    }
    while col < chars.len() && !is_word_char(chars[col]) {
        col += 1;
    }
    buffer.line_start(pos.line) + col
}
