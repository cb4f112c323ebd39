//! Language lookup: file extensions, rule directories and built-in rules.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::language::{LanguageDefinition, LanguageError, LanguageResult, PLAIN_TEXT};

/// File extension to language name.
const EXTENSION_MAP: &[(&str, &str)] = &[
    ("cpp", "C++"),
    ("h", "C++"),
    ("hpp", "C++"),
    ("c", "C"),
    ("py", "Python"),
    ("js", "JavaScript"),
    ("ts", "TypeScript"),
    ("java", "Java"),
    ("rb", "Ruby"),
    ("php", "PHP"),
    ("cs", "CSharp"),
    ("go", "Go"),
    ("rs", "Rust"),
    ("swift", "Swift"),
    ("kt", "Kotlin"),
    ("scala", "Scala"),
    ("html", "HTML"),
    ("css", "CSS"),
    ("json", "JSON"),
    ("xml", "XML"),
    ("yaml", "YAML"),
    ("md", "Markdown"),
];

/// Rule files compiled into the binary, keyed by lowercase language name.
const BUILTIN: &[(&str, &str)] = &[
    ("c++", include_str!("../../syntax/c++.json")),
    ("c", include_str!("../../syntax/c.json")),
    ("rust", include_str!("../../syntax/rust.json")),
    ("python", include_str!("../../syntax/python.json")),
    ("javascript", include_str!("../../syntax/javascript.json")),
    ("json", include_str!("../../syntax/json.json")),
];

/// Language name for a file extension, `Text` when unknown.
pub fn language_for_extension(extension: &str) -> &'static str {
    let extension = extension.trim_start_matches('.').to_lowercase();
    EXTENSION_MAP
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map_or(PLAIN_TEXT, |(_, name)| *name)
}

/// Language name for a path, from its extension.
pub fn language_for_path(path: &Path) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(PLAIN_TEXT, language_for_extension)
}

/// Turn a `set_language` argument into a language name.
///
/// Accepts a file extension (`rs`, `.py`) or a language name in any case.
pub fn resolve_language_name(token: &str) -> String {
    let by_extension = language_for_extension(token);
    if by_extension != PLAIN_TEXT {
        return by_extension.to_string();
    }
    EXTENSION_MAP
        .iter()
        .map(|(_, name)| *name)
        .chain(std::iter::once(PLAIN_TEXT))
        .find(|name| name.eq_ignore_ascii_case(token))
        .map_or_else(|| token.to_string(), str::to_string)
}

/// Loads language definitions by name and caches them.
///
/// Lookup order: `<name>.json` then `<name>.json5` in each search directory
/// (lowercased name), then the built-in set.
#[derive(Debug, Default)]
pub struct LanguageStore {
    search_dirs: Vec<PathBuf>,
    cache: HashMap<String, Arc<LanguageDefinition>>,
}

impl LanguageStore {
    pub fn new(search_dirs: Vec<PathBuf>) -> Self {
        Self {
            search_dirs,
            cache: HashMap::new(),
        }
    }

    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    /// Replace the search directories; cached definitions are dropped.
    pub fn set_search_dirs(&mut self, search_dirs: Vec<PathBuf>) {
        if self.search_dirs != search_dirs {
            self.search_dirs = search_dirs;
            self.cache.clear();
        }
    }

    /// Names of the languages compiled into the binary.
    pub fn builtin_names() -> impl Iterator<Item = &'static str> {
        BUILTIN.iter().map(|(name, _)| *name)
    }

    /// Load (or fetch from cache) the definition called `name`.
    pub fn load(&mut self, name: &str) -> LanguageResult<Arc<LanguageDefinition>> {
        if name.eq_ignore_ascii_case(PLAIN_TEXT) {
            return Ok(Arc::new(LanguageDefinition::plain_text()));
        }
        let key = name.to_lowercase();
        if let Some(found) = self.cache.get(&key) {
            return Ok(Arc::clone(found));
        }

        let definition = Arc::new(self.read_definition(name, &key)?);
        tracing::debug!(language = name, "language definition loaded");
        self.cache.insert(key, Arc::clone(&definition));
        Ok(definition)
    }

    fn read_definition(&self, name: &str, key: &str) -> LanguageResult<LanguageDefinition> {
        for dir in &self.search_dirs {
            let json = dir.join(format!("{key}.json"));
            if json.is_file() {
                return LanguageDefinition::from_json(name, &read(&json)?);
            }
            let json5 = dir.join(format!("{key}.json5"));
            if json5.is_file() {
                return LanguageDefinition::from_json5(name, &read(&json5)?);
            }
        }
        BUILTIN
            .iter()
            .find(|(builtin, _)| *builtin == key)
            .map_or_else(
                || Err(LanguageError::NotFound(name.to_string())),
                |(_, source)| LanguageDefinition::from_json(name, source),
            )
    }
}

fn read(path: &Path) -> LanguageResult<String> {
    std::fs::read_to_string(path).map_err(|source| LanguageError::Io {
        path: path.to_path_buf(),
        source,
    })
}
