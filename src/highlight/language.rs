//! Language definitions: the declarative rule set for one language.

use std::path::PathBuf;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

/// Name of the fallback language that highlights nothing.
pub const PLAIN_TEXT: &str = "Text";

/// Errors raised while loading a language definition.
#[derive(Debug, Error)]
pub enum LanguageError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON language file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid JSON5 language file: {0}")]
    Json5(#[from] json5::Error),

    #[error("invalid pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("multi-line rule {0:?} has no end pattern")]
    MissingEndPattern(String),

    #[error("no language definition named {0:?}")]
    NotFound(String),
}

pub type LanguageResult<T> = Result<T, LanguageError>;

/// Style assigned to a highlighted span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleTag {
    Keyword,
    Type,
    Literal,
    Builtin,
    Comment,
    String,
    Function,
    Operator,
    Number,
}

impl StyleTag {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Type => "type",
            Self::Literal => "literal",
            Self::Builtin => "builtin",
            Self::Comment => "comment",
            Self::String => "string",
            Self::Function => "function",
            Self::Operator => "operator",
            Self::Number => "number",
        }
    }
}

impl std::fmt::Display for StyleTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// On-disk shape of a language rule file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LanguageFile {
    pub keywords: Vec<String>,
    pub types: Vec<String>,
    pub literals: Vec<String>,
    pub builtins: Vec<String>,
    pub single_line_comment: String,
    pub multi_line_comment_start: String,
    pub multi_line_comment_end: String,
    pub string_delimiter: String,
    pub char_delimiter: String,
    pub rules: Vec<RuleFile>,
}

/// One entry of a rule file's `rules` list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleFile {
    #[serde(default)]
    pub pattern: String,
    #[serde(rename = "type")]
    pub style: StyleTag,
    #[serde(default)]
    pub multi_line: bool,
    pub start_pattern: Option<String>,
    pub end_pattern: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) enum RuleKind {
    Inline(Regex),
    MultiLine { start: Regex, end: Regex },
}

#[derive(Debug, Clone)]
pub(crate) struct Rule {
    pub(crate) kind: RuleKind,
    pub(crate) style: StyleTag,
}

/// A compiled, immutable language definition.
#[derive(Debug, Clone)]
pub struct LanguageDefinition {
    name: String,
    pub(crate) keywords: Option<Regex>,
    pub(crate) types: Option<Regex>,
    pub(crate) literals: Option<Regex>,
    pub(crate) builtins: Option<Regex>,
    pub(crate) single_line_comment: String,
    pub(crate) block_comment: Option<(String, String)>,
    pub(crate) string_delimiter: String,
    pub(crate) char_delimiter: String,
    pub(crate) rules: Vec<Rule>,
}

impl LanguageDefinition {
    /// The no-op language used for unknown file types.
    pub fn plain_text() -> Self {
        Self {
            name: PLAIN_TEXT.to_string(),
            keywords: None,
            types: None,
            literals: None,
            builtins: None,
            single_line_comment: String::new(),
            block_comment: None,
            string_delimiter: String::new(),
            char_delimiter: String::new(),
            rules: Vec::new(),
        }
    }

    /// Compile a parsed rule file.
    pub fn compile(name: &str, file: LanguageFile) -> LanguageResult<Self> {
        let rules = file
            .rules
            .iter()
            .filter_map(|rule| compile_rule(rule).transpose())
            .collect::<LanguageResult<Vec<_>>>()?;
        let block_comment = (!file.multi_line_comment_start.is_empty()
            && !file.multi_line_comment_end.is_empty())
        .then(|| (file.multi_line_comment_start, file.multi_line_comment_end));

        Ok(Self {
            name: name.to_string(),
            keywords: word_list(&file.keywords)?,
            types: word_list(&file.types)?,
            literals: word_list(&file.literals)?,
            builtins: word_list(&file.builtins)?,
            single_line_comment: file.single_line_comment,
            block_comment,
            string_delimiter: file.string_delimiter,
            char_delimiter: file.char_delimiter,
            rules,
        })
    }

    pub fn from_json(name: &str, source: &str) -> LanguageResult<Self> {
        Self::compile(name, serde_json::from_str(source)?)
    }

    pub fn from_json5(name: &str, source: &str) -> LanguageResult<Self> {
        Self::compile(name, json5::from_str(source)?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this definition highlights nothing at all.
    pub fn is_plain(&self) -> bool {
        self.keywords.is_none()
            && self.types.is_none()
            && self.literals.is_none()
            && self.builtins.is_none()
            && self.single_line_comment.is_empty()
            && self.block_comment.is_none()
            && self.string_delimiter.is_empty()
            && self.char_delimiter.is_empty()
            && self.rules.is_empty()
    }
}

impl Default for LanguageDefinition {
    fn default() -> Self {
        Self::plain_text()
    }
}

fn compile_pattern(pattern: &str) -> LanguageResult<Regex> {
    Regex::new(pattern).map_err(|source| LanguageError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Rules with nothing to match are skipped rather than rejected.
fn compile_rule(rule: &RuleFile) -> LanguageResult<Option<Rule>> {
    if !rule.multi_line {
        if rule.pattern.is_empty() {
            return Ok(None);
        }
        return Ok(Some(Rule {
            kind: RuleKind::Inline(compile_pattern(&rule.pattern)?),
            style: rule.style,
        }));
    }

    let start = rule
        .start_pattern
        .as_deref()
        .filter(|p| !p.is_empty())
        .unwrap_or(&rule.pattern);
    if start.is_empty() {
        return Ok(None);
    }
    let end = rule
        .end_pattern
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| LanguageError::MissingEndPattern(start.to_string()))?;
    Ok(Some(Rule {
        kind: RuleKind::MultiLine {
            start: compile_pattern(start)?,
            end: compile_pattern(end)?,
        },
        style: rule.style,
    }))
}

/// One whole-word alternation for a word list; longer words first.
fn word_list(words: &[String]) -> LanguageResult<Option<Regex>> {
    let mut words: Vec<&str> = words
        .iter()
        .map(String::as_str)
        .filter(|w| !w.is_empty())
        .collect();
    if words.is_empty() {
        return Ok(None);
    }
    words.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    words.dedup();
    let alternation = words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");
    compile_pattern(&format!(r"\b(?:{alternation})\b")).map(Some)
}
