use editcore::prelude::*;
use tempfile::TempDir;

fn styled(doc: &Document, line: usize, style: StyleTag) -> Vec<String> {
    let text: Vec<char> = doc
        .buffer()
        .line_text(line)
        .unwrap_or_default()
        .chars()
        .collect();
    doc.highlighter()
        .spans(line)
        .iter()
        .filter(|span| span.style == style)
        .map(|span| text[span.start..span.end()].iter().collect())
        .collect()
}

fn ready_lines(doc: &mut Document) -> Vec<usize> {
    doc.drain_notifications()
        .into_iter()
        .filter_map(|n| match n {
            Notification::HighlightSpansReady { line, .. } => Some(line),
            _ => None,
        })
        .collect()
}

#[test]
fn test_line_comment_suffix_in_c() {
    let mut doc = Document::with_text("int x = 1; // set x", EditorConfig::default());
    assert!(doc.set_language("c"));
    assert_eq!(doc.language_name(), "C");
    assert_eq!(styled(&doc, 0, StyleTag::Comment), vec!["// set x"]);
    assert_eq!(styled(&doc, 0, StyleTag::Type), vec!["int"]);
    assert_eq!(styled(&doc, 0, StyleTag::Number), vec!["1"]);
}

#[test]
fn test_unknown_extension_is_plain_text() {
    let mut doc = Document::with_text("int x = 1;", EditorConfig::default());
    assert!(!doc.set_language("xyz"));
    assert!(doc.highlighter().spans(0).is_empty());
}

#[test]
fn test_typing_comment_opener_refreshes_following_lines() {
    let mut doc = Document::with_text("a\nb\nc", EditorConfig::default());
    doc.set_language("C");
    doc.drain_notifications();

    doc.insert_text("/*");
    assert_eq!(ready_lines(&mut doc), vec![0, 1, 2]);
    assert_eq!(styled(&doc, 2, StyleTag::Comment), vec!["c"]);

    doc.undo();
    assert_eq!(ready_lines(&mut doc), vec![0, 1, 2]);
    assert!(styled(&doc, 2, StyleTag::Comment).is_empty());
}

#[test]
fn test_plain_edit_refreshes_one_line() {
    let mut doc = Document::with_text("int a;\nint b;\nint c;", EditorConfig::default());
    doc.set_language("C");
    doc.set_cursors(&[(7, 7)]);
    doc.drain_notifications();

    doc.insert_text("x");
    assert_eq!(ready_lines(&mut doc), vec![1]);
}

#[test]
fn test_rule_directory_overrides_builtin() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("toy.json5"), "{ keywords: ['beep'], }").unwrap();

    let mut doc = Document::with_text("beep boop", EditorConfig::default());
    assert!(!doc.set_language("toy"));
    doc.apply_settings(EditorConfig {
        syntax_dirs: vec![dir.path().to_path_buf()],
        ..EditorConfig::default()
    });
    assert!(doc.set_language("toy"));
    assert_eq!(styled(&doc, 0, StyleTag::Keyword), vec!["beep"]);
}

#[test]
fn test_malformed_definition_keeps_previous() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("rust.json"), "{ broken").unwrap();

    let mut doc = Document::with_text("fn main() {}", EditorConfig::default());
    assert!(doc.set_language("rs"));
    doc.apply_settings(EditorConfig {
        syntax_dirs: vec![dir.path().to_path_buf()],
        ..EditorConfig::default()
    });
    assert_eq!(doc.language_name(), "Rust");
    assert!(!doc.set_language("rs"));
    assert_eq!(styled(&doc, 0, StyleTag::Keyword), vec!["fn"]);
}

#[test]
fn test_python_triple_quote_spans_lines() {
    let text = "x = \"\"\"start\nif inside\nend\"\"\"\nif y:";
    let mut doc = Document::with_text(text, EditorConfig::default());
    doc.set_language("py");
    assert_eq!(styled(&doc, 1, StyleTag::String), vec!["if inside"]);
    assert!(styled(&doc, 1, StyleTag::Keyword).is_empty());
    assert_eq!(styled(&doc, 3, StyleTag::Keyword), vec!["if"]);
}
