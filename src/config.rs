//! Editor settings.
//!
//! Settings come from flag-token files (a global config plus a local
//! `.editcorerc`) and the command line, merged with [`ConfigFlags::union`]
//! and resolved into an [`EditorConfig`] record that the document applies
//! with `apply_settings`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::folding::DEFAULT_PLACEHOLDER;
use crate::history::DEFAULT_UNDO_LIMIT;

pub const DEFAULT_TAB_WIDTH: usize = 4;

/// Settings injected into a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    /// Width of a tab for indentation levels and indent/unindent.
    pub tab_width: usize,
    /// Number of undo steps kept.
    pub undo_limit: usize,
    /// Copy the current line's indentation on newline.
    pub auto_indent: bool,
    /// Text shown in place of a collapsed fold.
    pub fold_placeholder: String,
    /// Directories searched for language rule files, in order.
    pub syntax_dirs: Vec<PathBuf>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            tab_width: DEFAULT_TAB_WIDTH,
            undo_limit: DEFAULT_UNDO_LIMIT,
            auto_indent: true,
            fold_placeholder: DEFAULT_PLACEHOLDER.to_string(),
            syntax_dirs: Vec::new(),
        }
    }
}

impl EditorConfig {
    /// Resolve merged flags, falling back to defaults for anything unset.
    pub fn from_flags(flags: &ConfigFlags) -> Self {
        let defaults = Self::default();
        Self {
            tab_width: flags
                .tab_width
                .filter(|w| *w > 0)
                .unwrap_or(defaults.tab_width),
            undo_limit: flags.undo_limit.unwrap_or(defaults.undo_limit),
            auto_indent: !flags.no_auto_indent,
            fold_placeholder: flags
                .fold_placeholder
                .clone()
                .unwrap_or(defaults.fold_placeholder),
            syntax_dirs: flags.syntax_dirs.clone(),
        }
    }
}

/// Flags as read from a config file or the command line.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub tab_width: Option<usize>,
    pub undo_limit: Option<usize>,
    pub syntax_dirs: Vec<PathBuf>,
    pub fold_placeholder: Option<String>,
    pub no_auto_indent: bool,
    pub perf: bool,
    pub debug_log: Option<PathBuf>,
}

impl ConfigFlags {
    /// Merge `other` over `self`: `other` wins for valued options, switches
    /// are or-ed, and `other`'s syntax dirs are searched first.
    pub fn union(&self, other: &Self) -> Self {
        let mut syntax_dirs = other.syntax_dirs.clone();
        for dir in &self.syntax_dirs {
            if !syntax_dirs.contains(dir) {
                syntax_dirs.push(dir.clone());
            }
        }
        Self {
            tab_width: other.tab_width.or(self.tab_width),
            undo_limit: other.undo_limit.or(self.undo_limit),
            syntax_dirs,
            fold_placeholder: other
                .fold_placeholder
                .clone()
                .or_else(|| self.fold_placeholder.clone()),
            no_auto_indent: self.no_auto_indent || other.no_auto_indent,
            perf: self.perf || other.perf,
            debug_log: other.debug_log.clone().or_else(|| self.debug_log.clone()),
        }
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("editcore").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("editcore")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("editcore").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join(".config")
                .join("editcore")
                .join("config");
        }
    }

    local_override_path()
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".editcorerc")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(line_tokens)
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

/// A `--flag=value` line is one token so the value may contain spaces;
/// anything else splits on whitespace.
fn line_tokens(line: &str) -> Vec<String> {
    match line.split_once('=') {
        Some((name, _)) if name.starts_with("--") && !name.contains(char::is_whitespace) => {
            vec![line.to_string()]
        }
        _ => line.split_whitespace().map(ToOwned::to_owned).collect(),
    }
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# editcore defaults (saved with --save)".to_string()];
    if let Some(width) = flags.tab_width {
        lines.push(format!("--tab-width={width}"));
    }
    if let Some(limit) = flags.undo_limit {
        lines.push(format!("--undo-limit={limit}"));
    }
    for dir in &flags.syntax_dirs {
        lines.push(format!("--syntax-dir={}", dir.display()));
    }
    if let Some(placeholder) = &flags.fold_placeholder {
        lines.push(format!("--fold-placeholder={placeholder}"));
    }
    if flags.no_auto_indent {
        lines.push("--no-auto-indent".to_string());
    }
    if flags.perf {
        lines.push("--perf".to_string());
    }
    if let Some(path) = &flags.debug_log {
        lines.push(format!("--debug-log={}", path.display()));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pick the known flags out of a token list. Unknown tokens (the program
/// name, subcommands, file paths) are skipped.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let (name, inline) = match token.split_once('=') {
            Some((name, value)) if name.starts_with("--") => (name, Some(value)),
            _ => (token, None),
        };
        let takes_value = matches!(
            name,
            "--tab-width" | "--undo-limit" | "--syntax-dir" | "--fold-placeholder" | "--debug-log"
        );
        let value = if !takes_value {
            None
        } else if inline.is_some() {
            inline
        } else {
            i += 1;
            tokens.get(i).map(String::as_str)
        };

        match (name, value) {
            ("--no-auto-indent", _) => flags.no_auto_indent = true,
            ("--perf", _) => flags.perf = true,
            ("--tab-width", Some(value)) => flags.tab_width = parse_count(name, value),
            ("--undo-limit", Some(value)) => flags.undo_limit = parse_count(name, value),
            ("--syntax-dir", Some(value)) => flags.syntax_dirs.push(PathBuf::from(value)),
            ("--fold-placeholder", Some(value)) => {
                flags.fold_placeholder = Some(value.to_string());
            }
            ("--debug-log", Some(value)) => flags.debug_log = Some(PathBuf::from(value)),
            _ => {}
        }
        i += 1;
    }
    flags
}

fn parse_count(flag: &str, value: &str) -> Option<usize> {
    match value.parse() {
        Ok(count) => Some(count),
        Err(err) => {
            tracing::warn!(flag, value, %err, "ignoring invalid number");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tokens(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_flag_tokens_extracts_known_flags() {
        let flags = parse_flag_tokens(&tokens(&[
            "editcore",
            "highlight",
            "--tab-width",
            "2",
            "--undo-limit=50",
            "--syntax-dir",
            "rules",
            "--no-auto-indent",
            "--debug-log=core.log",
            "main.rs",
        ]));
        assert_eq!(flags.tab_width, Some(2));
        assert_eq!(flags.undo_limit, Some(50));
        assert_eq!(flags.syntax_dirs, vec![PathBuf::from("rules")]);
        assert!(flags.no_auto_indent);
        assert_eq!(flags.debug_log, Some(PathBuf::from("core.log")));
        assert!(!flags.perf);
    }

    #[test]
    fn test_invalid_number_is_ignored() {
        let flags = parse_flag_tokens(&tokens(&["--tab-width", "wide", "--perf"]));
        assert_eq!(flags.tab_width, None);
        assert!(flags.perf);
    }

    #[test]
    fn test_config_union_merges_cli_over_file_for_options() {
        let file = ConfigFlags {
            tab_width: Some(8),
            perf: true,
            syntax_dirs: vec![PathBuf::from("a")],
            ..ConfigFlags::default()
        };
        let cli = ConfigFlags {
            tab_width: Some(2),
            syntax_dirs: vec![PathBuf::from("b"), PathBuf::from("a")],
            ..ConfigFlags::default()
        };
        let merged = file.union(&cli);
        assert_eq!(merged.tab_width, Some(2));
        assert!(merged.perf);
        assert_eq!(
            merged.syntax_dirs,
            vec![PathBuf::from("b"), PathBuf::from("a")]
        );
    }

    #[test]
    fn test_editor_config_defaults() {
        let config = EditorConfig::from_flags(&ConfigFlags::default());
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.tab_width, 4);
        assert_eq!(config.undo_limit, 1000);
        assert!(config.auto_indent);
        assert_eq!(config.fold_placeholder, "...");
    }

    #[test]
    fn test_zero_tab_width_falls_back_to_default() {
        let flags = ConfigFlags {
            tab_width: Some(0),
            no_auto_indent: true,
            ..ConfigFlags::default()
        };
        let config = EditorConfig::from_flags(&flags);
        assert_eq!(config.tab_width, DEFAULT_TAB_WIDTH);
        assert!(!config.auto_indent);
    }

    #[test]
    fn test_save_load_and_clear_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(".editcorerc");
        let flags = ConfigFlags {
            tab_width: Some(3),
            undo_limit: Some(10),
            syntax_dirs: vec![PathBuf::from("syntax")],
            fold_placeholder: Some("[+]".to_string()),
            no_auto_indent: true,
            perf: true,
            debug_log: Some(PathBuf::from("core.log")),
        };

        save_config_flags(&path, &flags).unwrap();
        let loaded = load_config_flags(&path).unwrap();
        assert_eq!(loaded, flags);

        clear_config_flags(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_values_with_spaces_survive_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".editcorerc");
        let flags = ConfigFlags {
            fold_placeholder: Some("{ ... }".to_string()),
            syntax_dirs: vec![PathBuf::from("my rules")],
            tab_width: Some(2),
            ..ConfigFlags::default()
        };

        save_config_flags(&path, &flags).unwrap();
        assert_eq!(load_config_flags(&path).unwrap(), flags);
    }
}
