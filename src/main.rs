//! editcore - headless front end for the editing core.
//!
//! # Usage
//!
//! ```bash
//! editcore highlight src/main.rs
//! editcore folds --fold-all src/main.rs
//! editcore find -i TODO notes.txt
//! editcore replace --in-place colour color README.md
//! ```

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use editcore::config::{
    ConfigFlags, EditorConfig, clear_config_flags, global_config_path, load_config_flags,
    local_override_path, parse_flag_tokens, save_config_flags,
};
use editcore::highlight::language_for_path;
use editcore::perf;
use editcore::prelude::*;

/// Headless driver for the editcore text-editing engine
#[derive(Parser, Debug)]
#[command(name = "editcore", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Action>,

    /// Tab width used for indentation levels
    #[arg(long, global = true, value_name = "N")]
    tab_width: Option<usize>,

    /// Number of undo steps kept
    #[arg(long, global = true, value_name = "N")]
    undo_limit: Option<usize>,

    /// Directory with language rule files (repeatable)
    #[arg(long, global = true, value_name = "DIR")]
    syntax_dir: Vec<PathBuf>,

    /// Text shown for a collapsed fold
    #[arg(long, global = true, value_name = "TEXT")]
    fold_placeholder: Option<String>,

    /// Do not copy indentation on newline
    #[arg(long, global = true)]
    no_auto_indent: bool,

    /// Print timing for long-running operations
    #[arg(long, global = true)]
    perf: bool,

    /// Write debug events to a file
    #[arg(long, global = true, value_name = "PATH")]
    debug_log: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long, global = true)]
    save: bool,

    /// Clear saved defaults
    #[arg(long, global = true)]
    clear: bool,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Print the highlight spans of every line
    Highlight {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Language name or extension; defaults to the file's extension
        #[arg(short, long)]
        language: Option<String>,
    },
    /// Print fold regions and the folded view
    Folds {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Collapse every region before printing
        #[arg(long)]
        fold_all: bool,
    },
    /// List matches of a literal pattern
    Find {
        pattern: String,
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Replace every match of a literal pattern
    Replace {
        pattern: String,
        replacement: String,
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[command(flatten)]
        search: SearchArgs,
        /// Write the result back to FILE instead of stdout
        #[arg(long)]
        in_place: bool,
    },
}

#[derive(Args, Debug, Clone, Copy)]
struct SearchArgs {
    /// Match case-insensitively
    #[arg(short = 'i', long)]
    ignore_case: bool,
    /// Only match whole words
    #[arg(short, long)]
    whole_word: bool,
}

impl SearchArgs {
    const fn options(self) -> SearchOptions {
        SearchOptions {
            case_sensitive: !self.ignore_case,
            whole_word: self.whole_word,
            backward: false,
            wrap: false,
        }
    }
}

fn open(path: &Path, config: EditorConfig) -> Result<Document> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(Document::with_text(&text, config))
}

fn highlight(path: &Path, language: Option<&str>, config: EditorConfig) -> Result<String> {
    let mut doc = open(path, config)?;
    let language = language.unwrap_or_else(|| language_for_path(path));
    if !doc.set_language(language) {
        tracing::warn!(language, "highlighting as {}", doc.language_name());
    }
    let mut out = String::new();
    for line in 0..doc.buffer().line_count() {
        let spans = doc
            .highlighter()
            .spans(line)
            .iter()
            .map(|span| format!("{}..{} {}", span.start, span.end(), span.style))
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(out, "{:>5}: {spans}", line + 1)?;
    }
    Ok(out)
}

fn folds(path: &Path, fold_all: bool, config: EditorConfig) -> Result<String> {
    let mut doc = open(path, config)?;
    if fold_all {
        doc.fold_all();
    }
    let mut out = String::new();
    for region in doc.folding().regions() {
        writeln!(
            out,
            "{}-{}{}",
            region.start_line + 1,
            region.end_line + 1,
            if region.collapsed { " (collapsed)" } else { "" }
        )?;
    }
    writeln!(out, "---")?;
    let buffer = doc.buffer();
    for line in doc.visible_lines() {
        let text = buffer.line_text(line).unwrap_or_default();
        match doc.folding().region(line).filter(|region| region.collapsed) {
            Some(region) => writeln!(out, "{text} {}", region.placeholder)?,
            None => writeln!(out, "{text}")?,
        }
    }
    Ok(out)
}

fn find(path: &Path, pattern: &str, search: SearchArgs, config: EditorConfig) -> Result<String> {
    let doc = open(path, config)?;
    let buffer = doc.buffer();
    let options = search.options();
    let mut out = String::new();
    let mut from = 0;
    while let Some(hit) = editcore::search::find(buffer, pattern, from, options) {
        let pos = buffer.offset_to_position(hit.start);
        let line = buffer.line_text(pos.line).unwrap_or_default();
        writeln!(out, "{}:{}: {line}", pos.line + 1, pos.col + 1)?;
        from = hit.end;
    }
    writeln!(out, "{} matches", doc.count_matches(pattern, options))?;
    Ok(out)
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);
    tracing::debug!(?cli, ?effective, "settings resolved");

    perf::set_enabled(effective.perf);
    let debug_log_path = effective
        .debug_log
        .clone()
        .or_else(|| std::env::var_os("EDITCORE_DEBUG_LOG").map(PathBuf::from));
    if let Err(err) = perf::set_debug_log_path(debug_log_path.as_deref()) {
        eprintln!(
            "[warn] Failed to initialize debug log {}: {}",
            debug_log_path
                .as_ref()
                .map_or_else(|| "<unset>".to_string(), |p| p.display().to_string()),
            err
        );
    }

    let config = EditorConfig::from_flags(&effective);
    let Some(action) = cli.command else {
        if !cli.save && !cli.clear {
            anyhow::bail!("no command given; try --help");
        }
        return Ok(());
    };

    let output = match action {
        Action::Highlight { file, language } => highlight(&file, language.as_deref(), config)?,
        Action::Folds { file, fold_all } => folds(&file, fold_all, config)?,
        Action::Find {
            pattern,
            file,
            search,
        } => find(&file, &pattern, search, config)?,
        Action::Replace {
            pattern,
            replacement,
            file,
            search,
            in_place,
        } => {
            let mut doc = open(&file, config)?;
            let count = doc.replace_all(&pattern, &replacement, search.options());
            eprintln!("{count} replaced");
            if in_place {
                std::fs::write(&file, doc.text())
                    .with_context(|| format!("Failed to write {}", file.display()))?;
                String::new()
            } else {
                doc.text()
            }
        }
    };
    print!("{output}");
    Ok(())
}
