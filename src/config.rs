//! Configuration-file loading (spec §6.2): per-language extension,
//! ignore-pattern, and keyword lists, plus the shared stopword list.
//! Loaded once at startup and treated as immutable for the process
//! lifetime (§5), the way the teacher's `cli::config` loads
//! `.symgrep/config.toml` once into a `CliConfig`.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::IndexError;

/// Parse a config file in the shared one-token-per-line format: `#`
/// introduces a comment, blank lines are ignored, surrounding
/// whitespace on each token is trimmed.
fn load_lines(path: &Path) -> Result<Vec<String>, IndexError> {
    let raw = fs::read_to_string(path).map_err(|source| IndexError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(raw
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .collect())
}

/// Same as [`load_lines`] but missing files are not an error: a
/// language without a customized list simply gets an empty one, with
/// a warning so a typo'd path doesn't fail silently.
fn load_lines_optional(path: &Path) -> Vec<String> {
    if !path.exists() {
        warn!(path = %path.display(), "config file not found, using empty list");
        return Vec::new();
    }
    match load_lines(path) {
        Ok(lines) => lines,
        Err(err) => {
            warn!(%err, "failed to read config file, using empty list");
            Vec::new()
        }
    }
}

/// Per-language configuration: which extensions belong to the
/// language, which files/paths to ignore, and which identifiers are
/// keywords (and therefore rejected by the Symbol Filter under
/// identifier contexts).
#[derive(Debug, Clone, Default)]
pub struct LanguageConfig {
    pub extensions: Vec<String>,
    pub ignore_patterns: Vec<String>,
    pub keywords: HashSet<String>,
}

impl LanguageConfig {
    /// Load `file_extensions.txt`, `ignore_files.txt`, and
    /// `keywords.txt` from `dir`. Each file is optional; a language
    /// directory with none of the three yields an all-empty config
    /// rather than an error, since the Symbol Filter and file
    /// discovery both tolerate empty lists.
    pub fn load(dir: &Path) -> Self {
        LanguageConfig {
            extensions: load_lines_optional(&dir.join("file_extensions.txt")),
            ignore_patterns: load_lines_optional(&dir.join("ignore_files.txt")),
            keywords: load_lines_optional(&dir.join("keywords.txt"))
                .into_iter()
                .collect(),
        }
    }
}

/// The stopword list of spec §4.1, shared across every language.
/// Loaded from `stopwords.txt` next to the per-language config
/// directories; an absent file falls back to an empty set rather than
/// failing, since stopword filtering is an enrichment, not a
/// correctness requirement.
#[derive(Debug, Clone, Default)]
pub struct Stopwords(HashSet<String>);

impl Stopwords {
    pub fn load(path: &Path) -> Self {
        Stopwords(load_lines_optional(path).into_iter().collect())
    }

    pub fn contains(&self, word: &str) -> bool {
        self.0.contains(word)
    }
}

/// Resolves the on-disk layout config lives under: one directory per
/// language plus a shared `stopwords.txt`, both rooted at
/// `config_root` (defaults to `./config`).
pub struct ConfigRoot {
    root: PathBuf,
}

impl ConfigRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ConfigRoot { root: root.into() }
    }

    pub fn language_dir(&self, language: &str) -> PathBuf {
        self.root.join(language)
    }

    pub fn load_language(&self, language: &str) -> LanguageConfig {
        LanguageConfig::load(&self.language_dir(language))
    }

    pub fn load_stopwords(&self) -> Stopwords {
        Stopwords::load(&self.root.join("stopwords.txt"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_lines_strips_comments_and_blank_lines() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("keywords.txt");
        fs::write(&file, "if\nelse  # conditional\n\n# full line comment\nwhile\n").unwrap();

        let lines = load_lines(&file).unwrap();
        assert_eq!(lines, vec!["if", "else", "while"]);
    }

    #[test]
    fn language_config_tolerates_missing_files() {
        let dir = tempdir().unwrap();
        let cfg = LanguageConfig::load(dir.path());
        assert!(cfg.extensions.is_empty());
        assert!(cfg.keywords.is_empty());
    }

    #[test]
    fn stopwords_contains_loaded_tokens() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("stopwords.txt");
        fs::write(&file, "the\na\nan\n").unwrap();
        let stopwords = Stopwords::load(&file);
        assert!(stopwords.contains("the"));
        assert!(!stopwords.contains("banana"));
    }
}
