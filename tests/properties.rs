use std::sync::Arc;

use editcore::buffer::TextBuffer;
use editcore::highlight::{Highlighter, LanguageStore};
use editcore::history::{EditCommand, UndoLog};
use editcore::prelude::*;
use proptest::prelude::*;

// Strategy for generating document text, including comment tokens and
// indentation so highlighting and folding have something to do
fn text_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "[a-z ]{0,30}",
        "[a-z /*{}\n]{0,120}",
        "( {0,8}[a-z]{1,5}\n){0,12}",
        "[a-z\u{e9}\u{4e2d} \n]{0,60}",
    ]
}

fn motion_strategy() -> impl Strategy<Value = Motion> {
    prop::sample::select(vec![
        Motion::Left,
        Motion::Right,
        Motion::Up,
        Motion::Down,
        Motion::LineStart,
        Motion::LineEnd,
        Motion::WordLeft,
        Motion::WordRight,
        Motion::DocumentStart,
        Motion::DocumentEnd,
    ])
}

fn edit_strategy() -> impl Strategy<Value = Command> {
    prop_oneof![
        "[a-z /*\n]{1,4}".prop_map(Command::InsertText),
        "[a-z]".prop_map(Command::InsertText),
        Just(Command::Backspace),
        Just(Command::DeleteForward),
        Just(Command::InsertNewline),
        Just(Command::Indent),
        Just(Command::Unindent),
        "[a-z]{1,2}".prop_map(|pattern| Command::ReplaceAll {
            pattern,
            replacement: "Q".to_string(),
            options: SearchOptions::default(),
        }),
    ]
}

fn cursor_strategy() -> impl Strategy<Value = Command> {
    prop_oneof![
        (0..150usize, 0..150usize).prop_map(|pair| Command::SetCursors(vec![pair])),
        (0..150usize).prop_map(Command::AddCursorAt),
        Just(Command::AddCursorAbove),
        Just(Command::AddCursorBelow),
        Just(Command::AddCursorsAtWordOccurrences),
        (motion_strategy(), any::<bool>())
            .prop_map(|(motion, extend)| Command::Move { motion, extend }),
        Just(Command::SelectWord),
        Just(Command::ExpandSelection),
        Just(Command::ShrinkSelection),
    ]
}

fn command_strategy() -> impl Strategy<Value = Command> {
    prop_oneof![
        3 => edit_strategy(),
        2 => cursor_strategy(),
    ]
}

// Edits interleaved with undo/redo, so grouped replays reach the caches too
fn history_strategy() -> impl Strategy<Value = Command> {
    prop_oneof![
        4 => command_strategy(),
        1 => Just(Command::Undo),
        1 => Just(Command::Redo),
    ]
}

fn assert_highlight_cache_fresh(doc: &Document) -> Result<(), TestCaseError> {
    let language = LanguageStore::default().load("C").unwrap();
    let mut full = Highlighter::new(language);
    full.rehighlight_all(doc.buffer());
    let cached = doc.highlighter();
    prop_assert_eq!(cached.line_count(), full.line_count());
    for line in 0..full.line_count() {
        prop_assert_eq!(cached.spans(line), full.spans(line), "line {}", line);
        prop_assert_eq!(cached.state_after(line), full.state_after(line), "line {}", line);
    }
    Ok(())
}

fn fold_snapshot(doc: &Document) -> Vec<(usize, usize, bool)> {
    doc.folding()
        .regions()
        .map(|r| (r.start_line, r.end_line, r.collapsed))
        .collect()
}

fn assert_cursor_invariants(doc: &Document) -> Result<(), TestCaseError> {
    let cursors = doc.cursors().cursors();
    prop_assert!(!cursors.is_empty());
    prop_assert_eq!(cursors.iter().filter(|c| c.is_primary).count(), 1);
    for pair in cursors.windows(2) {
        prop_assert!(pair[0].end() < pair[1].start(), "cursors overlap: {:?}", pair);
    }
    let len = doc.buffer().total_length();
    prop_assert!(cursors.iter().all(|c| c.anchor <= len && c.head <= len));
    Ok(())
}

proptest! {
    #[test]
    fn undo_everything_restores_initial_text(
        text in text_strategy(),
        commands in prop::collection::vec(command_strategy(), 0..40),
    ) {
        let mut doc = Document::with_text(&text, EditorConfig::default());
        for command in commands {
            doc.execute(command);
        }
        while doc.undo() {}
        prop_assert_eq!(doc.text(), text);
    }

    #[test]
    fn undo_then_redo_everything_reaches_final_text(
        text in text_strategy(),
        commands in prop::collection::vec(edit_strategy(), 0..20),
    ) {
        let mut doc = Document::with_text(&text, EditorConfig::default());
        doc.set_cursors(&[(text.chars().count() / 2, text.chars().count() / 2)]);
        for command in commands {
            doc.execute(command);
        }
        let edited = doc.text();
        while doc.undo() {}
        while doc.redo() {}
        prop_assert_eq!(doc.text(), edited);
    }

    #[test]
    fn edit_command_inverse_round_trips(
        text in text_strategy(),
        position in 0..200usize,
        removed_len in 0..20usize,
        inserted in "[a-z\n]{0,6}",
    ) {
        let mut buffer = TextBuffer::from_text(&text);
        let position = buffer.clamp_offset(position);
        let removed_len = removed_len.min(buffer.total_length() - position);
        let Some(splice) = buffer.splice(position, removed_len, &inserted) else {
            return Ok(());
        };
        let command = EditCommand::from_splice(&splice, &inserted);
        command.inverse().apply(&mut buffer);
        prop_assert_eq!(buffer.text(), text);
    }

    #[test]
    fn redo_is_noop_after_fresh_commit(
        first in "[a-z]{2,5}",
        second in "[a-z]{2,5}",
    ) {
        let mut buffer = TextBuffer::empty();
        let mut log = UndoLog::default();
        for inserted in [&first, &second] {
            let at = buffer.total_length();
            let command = EditCommand::new(at, "", inserted.as_str());
            command.apply(&mut buffer);
            log.commit(command);
        }
        log.undo(&mut buffer);
        let command = EditCommand::new(0, "", "z");
        command.apply(&mut buffer);
        log.commit(command);
        prop_assert!(!log.can_redo());
        prop_assert!(log.redo(&mut buffer).is_empty());
    }

    #[test]
    fn cursor_set_stays_normalized(
        text in text_strategy(),
        commands in prop::collection::vec(cursor_strategy(), 0..30),
    ) {
        let mut doc = Document::with_text(&text, EditorConfig::default());
        for command in commands {
            doc.execute(command);
            assert_cursor_invariants(&doc)?;
        }
    }

    #[test]
    fn cursors_stay_valid_through_edits(
        text in text_strategy(),
        commands in prop::collection::vec(command_strategy(), 0..30),
    ) {
        let mut doc = Document::with_text(&text, EditorConfig::default());
        for command in commands {
            doc.execute(command);
            assert_cursor_invariants(&doc)?;
        }
    }

    #[test]
    fn fold_all_then_unfold_all_restores_visibility(text in "( {0,8}[a-z]{1,5}\n){0,15}") {
        let mut doc = Document::with_text(&text, EditorConfig::default());
        let before = doc.visible_lines();
        doc.fold_all();
        doc.unfold_all();
        prop_assert_eq!(doc.visible_lines(), before);
    }

    #[test]
    fn fold_regions_are_well_formed(
        text in "( {0,8}[a-z]{1,5}\n){0,15}",
        commands in prop::collection::vec(edit_strategy(), 0..10),
    ) {
        let mut doc = Document::with_text(&text, EditorConfig::default());
        for command in commands {
            doc.execute(command);
        }
        let last_line = doc.buffer().line_count() - 1;
        for region in doc.folding().regions() {
            prop_assert!(region.start_line < region.end_line);
            prop_assert!(region.end_line <= last_line);
        }
    }

    #[test]
    fn incremental_highlighting_matches_full_pass(
        text in text_strategy(),
        edits in prop::collection::vec((0..200usize, 0..6usize, "[a-z /*\n]{0,4}"), 0..12),
    ) {
        let language = LanguageStore::default().load("C").unwrap();
        let mut buffer = TextBuffer::from_text(&text);
        let mut incremental = Highlighter::new(Arc::clone(&language));
        incremental.rehighlight_all(&buffer);

        for (position, removed_len, inserted) in edits {
            let position = buffer.clamp_offset(position);
            let removed_len = removed_len.min(buffer.total_length() - position);
            if let Some(splice) = buffer.splice(position, removed_len, &inserted) {
                incremental.apply_change(&buffer, &splice.change);
            }
        }

        let mut full = Highlighter::new(language);
        full.rehighlight_all(&buffer);
        prop_assert_eq!(incremental.line_count(), full.line_count());
        for line in 0..full.line_count() {
            prop_assert_eq!(incremental.spans(line), full.spans(line), "line {}", line);
            prop_assert_eq!(incremental.state_after(line), full.state_after(line));
        }
    }

    #[test]
    fn find_hits_match_the_pattern(
        text in "[a-cA-C \n]{0,60}",
        pattern in "[a-c]{1,2}",
        from in 0..80usize,
        backward in any::<bool>(),
    ) {
        let buffer = TextBuffer::from_text(&text);
        let options = SearchOptions {
            case_sensitive: false,
            whole_word: false,
            backward,
            wrap: true,
        };
        if let Some(hit) = editcore::search::find(&buffer, &pattern, from, options) {
            prop_assert!(editcore::search::matches_pattern(&buffer.slice(hit), &pattern, false));
        } else {
            prop_assert_eq!(editcore::search::count_matches(&buffer, &pattern, options), 0);
        }
    }

    #[test]
    fn document_highlight_cache_matches_full_pass(
        text in text_strategy(),
        commands in prop::collection::vec(history_strategy(), 0..30),
    ) {
        let mut doc = Document::with_text(&text, EditorConfig::default());
        prop_assert!(doc.set_language("c"));
        for command in commands {
            doc.execute(command);
            assert_highlight_cache_fresh(&doc)?;
        }
    }

    #[test]
    fn edits_above_collapsed_folds_only_shift_them(
        prefix in prop::collection::vec("[a-z]{1,5}", 1..6),
        body in "( {0,8}[a-z]{1,5}\n){0,12}",
        lines in prop::collection::vec(0..6usize, 1..4),
        inserted in prop::sample::select(vec!["\n", "q\nq", "\n\n"]),
    ) {
        let text = format!("{}\nblock\n{body}", prefix.join("\n"));
        let mut doc = Document::with_text(&text, EditorConfig::default());
        doc.fold_all();
        let before = fold_snapshot(&doc);

        let mut targets: Vec<usize> = lines.into_iter().map(|l| l % prefix.len()).collect();
        targets.sort_unstable();
        targets.dedup();
        let cursors: Vec<(usize, usize)> = targets
            .iter()
            .map(|&line| {
                let end = doc.buffer().line_end(line);
                (end, end)
            })
            .collect();
        doc.set_cursors(&cursors);
        doc.insert_text(inserted);

        let shift = targets.len() * inserted.matches('\n').count();
        let shifted: Vec<(usize, usize, bool)> = before
            .iter()
            .map(|&(start, end, collapsed)| (start + shift, end + shift, collapsed))
            .collect();
        prop_assert_eq!(fold_snapshot(&doc), shifted);

        prop_assert!(doc.undo());
        prop_assert_eq!(doc.text(), text);
        prop_assert_eq!(fold_snapshot(&doc), before);
    }
}
