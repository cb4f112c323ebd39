/// A location in the buffer as (line, column), both zero-based.
///
/// Columns count chars, not bytes, matching the rope's native indexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

/// A half-open char range `[start, end)` in absolute buffer offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub const fn new(start: usize, end: usize) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Inclusive overlap test: touching ranges count as overlapping.
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.start <= other.end && self.end >= other.start
    }
}

/// One buffer mutation as seen by subscribers.
///
/// `position`, `removed_len` and `inserted_len` are char counts. The line
/// fields describe which lines the mutation touched: lines
/// `start_line..=start_line + removed_lines` before the change became lines
/// `start_line..=start_line + inserted_lines` after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Change {
    pub position: usize,
    pub removed_len: usize,
    pub inserted_len: usize,
    pub start_line: usize,
    pub removed_lines: usize,
    pub inserted_lines: usize,
}

impl Change {
    /// Net change in buffer length.
    pub const fn delta(&self) -> isize {
        self.inserted_len as isize - self.removed_len as isize
    }

    /// Net change in line count.
    pub const fn line_delta(&self) -> isize {
        self.inserted_lines as isize - self.removed_lines as isize
    }

    /// Last line touched, in pre-change line numbers.
    pub const fn old_end_line(&self) -> usize {
        self.start_line + self.removed_lines
    }

    /// Last line touched, in post-change line numbers.
    pub const fn new_end_line(&self) -> usize {
        self.start_line + self.inserted_lines
    }

    /// Translate a line number taken before this change into the
    /// post-change buffer. Lines inside the replaced span collapse to
    /// `start_line`.
    pub const fn map_line(&self, line: usize) -> usize {
        if line <= self.start_line {
            line
        } else if line > self.old_end_line() {
            line + self.inserted_lines - self.removed_lines
        } else {
            self.start_line
        }
    }

    /// Translate an offset taken before this change into the post-change buffer.
    ///
    /// Offsets inside the removed span collapse to the change position.
    pub const fn map_offset(&self, offset: usize) -> usize {
        if offset <= self.position {
            offset
        } else if offset >= self.position + self.removed_len {
            offset - self.removed_len + self.inserted_len
        } else {
            self.position
        }
    }
}

/// Options for raw literal search on the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FindFlags {
    pub case_sensitive: bool,
    pub whole_word: bool,
    pub backward: bool,
}

/// Word characters for whole-word matching and word motions.
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_normalizes_reversed_bounds() {
        let range = TextRange::new(7, 3);
        assert_eq!(range, TextRange { start: 3, end: 7 });
        assert_eq!(range.len(), 4);
    }

    #[test]
    fn test_touching_ranges_overlap() {
        assert!(TextRange::new(0, 3).overlaps(&TextRange::new(3, 5)));
        assert!(!TextRange::new(0, 3).overlaps(&TextRange::new(4, 5)));
    }

    #[test]
    fn test_map_offset_shifts_after_change() {
        let change = Change {
            position: 4,
            removed_len: 2,
            inserted_len: 5,
            start_line: 0,
            removed_lines: 0,
            inserted_lines: 0,
        };
        assert_eq!(change.map_offset(2), 2);
        assert_eq!(change.map_offset(4), 4);
        assert_eq!(change.map_offset(5), 4);
        assert_eq!(change.map_offset(6), 9);
        assert_eq!(change.delta(), 3);
    }

    #[test]
    fn test_map_line_shifts_lines_after_change() {
        let change = Change {
            position: 6,
            removed_len: 3,
            inserted_len: 1,
            start_line: 2,
            removed_lines: 2,
            inserted_lines: 0,
        };
        assert_eq!(change.map_line(1), 1);
        assert_eq!(change.map_line(3), 2);
        assert_eq!(change.map_line(4), 2);
        assert_eq!(change.map_line(7), 5);
    }
}
