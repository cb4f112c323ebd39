//! Literal search and replace over a [`TextBuffer`].
//!
//! Stateless: every call takes the buffer and a starting offset. Supports
//! case-insensitive and whole-word matching, backward search and wrapping
//! around the document boundary. An empty pattern never matches.

use crate::buffer::{FindFlags, TextBuffer, TextRange};
use crate::history::{AppliedEdit, EditCommand};
use crate::perf;

/// Options for a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchOptions {
    pub case_sensitive: bool,
    pub whole_word: bool,
    pub backward: bool,
    pub wrap: bool,
}

impl SearchOptions {
    const fn flags(self) -> FindFlags {
        FindFlags {
            case_sensitive: self.case_sensitive,
            whole_word: self.whole_word,
            backward: self.backward,
        }
    }

    const fn forward_flags(self) -> FindFlags {
        FindFlags {
            backward: false,
            ..self.flags()
        }
    }
}

/// Find the next match of `pattern` from `from` in the requested direction.
///
/// With `wrap`, a miss restarts once from the opposite end of the document.
pub fn find(
    buffer: &TextBuffer,
    pattern: &str,
    from: usize,
    options: SearchOptions,
) -> Option<TextRange> {
    if pattern.is_empty() {
        return None;
    }
    let flags = options.flags();
    buffer.find_raw(pattern, from, flags).or_else(|| {
        if !options.wrap {
            return None;
        }
        let restart = if options.backward {
            buffer.total_length()
        } else {
            0
        };
        buffer.find_raw(pattern, restart, flags)
    })
}

/// Whether `text` equals `pattern` under the case rule.
pub fn matches_pattern(text: &str, pattern: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        text == pattern
    } else {
        text.to_lowercase() == pattern.to_lowercase()
    }
}

/// Number of non-overlapping matches in the whole document.
pub fn count_matches(buffer: &TextBuffer, pattern: &str, options: SearchOptions) -> usize {
    buffer.find_all_raw(pattern, options.forward_flags()).len()
}

/// Outcome of a single [`replace`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replaced {
    /// The substitution, when the selection matched.
    pub edit: Option<AppliedEdit>,
    /// The following match, searched from just past the replacement.
    pub next: Option<TextRange>,
}

/// Substitute `selection` if its text equals `pattern`, then look for the
/// next match.
pub fn replace(
    buffer: &mut TextBuffer,
    selection: TextRange,
    pattern: &str,
    replacement: &str,
    options: SearchOptions,
) -> Replaced {
    let selected = buffer.slice(selection);
    let edit = if !pattern.is_empty()
        && !selection.is_empty()
        && matches_pattern(&selected, pattern, options.case_sensitive)
    {
        apply(buffer, selection, replacement)
    } else {
        None
    };

    let from = match (&edit, options.backward) {
        (_, true) => selection.start,
        (Some(edit), false) => selection.start + edit.change.inserted_len,
        (None, false) => selection.end,
    };
    Replaced {
        edit,
        next: find(buffer, pattern, from, options),
    }
}

/// Replace every match from the start of the document to the end.
///
/// Positions are re-derived after each substitution, so a replacement that
/// contains the pattern is not matched again. Returns the applied edits in
/// order; their count is the number of replacements.
pub fn replace_all(
    buffer: &mut TextBuffer,
    pattern: &str,
    replacement: &str,
    options: SearchOptions,
) -> Vec<AppliedEdit> {
    let _scope = perf::scope("search.replace_all");
    let mut applied = Vec::new();
    if pattern.is_empty() {
        return applied;
    }

    let flags = options.forward_flags();
    let inserted_len = replacement.chars().count();
    let mut from = 0;
    while let Some(found) = buffer.find_raw(pattern, from, flags) {
        let Some(edit) = apply(buffer, found, replacement) else {
            break;
        };
        from = found.start + inserted_len;
        applied.push(edit);
    }
    perf::log_event("search.replace_all", format!("{} replaced", applied.len()));
    applied
}

fn apply(buffer: &mut TextBuffer, range: TextRange, replacement: &str) -> Option<AppliedEdit> {
    let splice = buffer.splice(range.start, range.len(), replacement)?;
    Some(AppliedEdit {
        command: EditCommand::from_splice(&splice, replacement),
        change: splice.change,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(case_sensitive: bool, whole_word: bool, backward: bool, wrap: bool) -> SearchOptions {
        SearchOptions {
            case_sensitive,
            whole_word,
            backward,
            wrap,
        }
    }

    // --- find ---

    #[test]
    fn test_find_whole_word_case_insensitive() {
        let buf = TextBuffer::from_text("the teh cat");
        let options = opts(false, true, false, false);
        let hit = find(&buf, "teh", 0, options).unwrap();
        assert_eq!(hit, TextRange::new(4, 7));
        assert_eq!(find(&buf, "teh", hit.end, options), None);
    }

    #[test]
    fn test_find_wraps_forward() {
        let buf = TextBuffer::from_text("cat dog");
        let options = opts(true, false, false, true);
        assert_eq!(find(&buf, "cat", 3, options), Some(TextRange::new(0, 3)));
    }

    #[test]
    fn test_find_wraps_backward() {
        let buf = TextBuffer::from_text("cat dog cat");
        let options = opts(true, false, true, true);
        assert_eq!(find(&buf, "cat", 2, options), Some(TextRange::new(8, 11)));
        assert_eq!(find(&buf, "cat", 8, options), Some(TextRange::new(0, 3)));
    }

    #[test]
    fn test_find_empty_pattern_is_no_match() {
        let buf = TextBuffer::from_text("abc");
        assert_eq!(find(&buf, "", 0, opts(false, false, false, true)), None);
    }

    #[test]
    fn test_count_matches_ignores_direction() {
        let buf = TextBuffer::from_text("a A a");
        assert_eq!(count_matches(&buf, "a", opts(false, false, true, false)), 3);
        assert_eq!(count_matches(&buf, "a", opts(true, false, false, false)), 2);
    }

    // --- replace ---

    #[test]
    fn test_replace_requires_matching_selection() {
        let mut buf = TextBuffer::from_text("cat cat");
        let options = opts(true, false, false, false);
        let replaced = replace(&mut buf, TextRange::new(0, 2), "cat", "dog", options);
        assert!(replaced.edit.is_none());
        assert_eq!(buf.text(), "cat cat");
        assert_eq!(replaced.next, Some(TextRange::new(4, 7)));
    }

    #[test]
    fn test_replace_then_advance() {
        let mut buf = TextBuffer::from_text("Cat cat");
        let options = opts(false, false, false, false);
        let replaced = replace(&mut buf, TextRange::new(0, 3), "cat", "lion", options);
        assert_eq!(buf.text(), "lion cat");
        assert_eq!(replaced.edit.unwrap().command.removed, "Cat");
        assert_eq!(replaced.next, Some(TextRange::new(5, 8)));
    }

    // --- replace_all ---

    #[test]
    fn test_replace_all_case_insensitive() {
        let mut buf = TextBuffer::from_text("Cat sat cat");
        let applied = replace_all(&mut buf, "cat", "dog", opts(false, false, false, false));
        assert_eq!(buf.text(), "dog sat dog");
        assert_eq!(applied.len(), 2);
    }

    #[test]
    fn test_replace_all_does_not_rematch_replacement() {
        let mut buf = TextBuffer::from_text("a a");
        let applied = replace_all(&mut buf, "a", "aa", opts(true, false, false, false));
        assert_eq!(buf.text(), "aa aa");
        assert_eq!(applied.len(), 2);
    }

    #[test]
    fn test_replace_all_whole_word() {
        let mut buf = TextBuffer::from_text("foo food foo");
        let applied = replace_all(&mut buf, "foo", "x", opts(true, true, false, false));
        assert_eq!(buf.text(), "x food x");
        assert_eq!(applied.len(), 2);
    }

    #[test]
    fn test_replace_all_edits_replay_in_order() {
        let original = "one two one";
        let mut buf = TextBuffer::from_text(original);
        let applied = replace_all(&mut buf, "one", "1", opts(true, false, false, false));
        for edit in applied.iter().rev() {
            edit.command.inverse().apply(&mut buf);
        }
        assert_eq!(buf.text(), original);
    }
}
