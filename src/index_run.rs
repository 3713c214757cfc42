//! Shared driver behind every `index-<language>` binary (spec §6.1):
//! walk a directory tree, parse each matching file, run the
//! language's walker, and flush the result into the Storage Engine.
//! One copy of this logic backs all six languages; each binary only
//! supplies its walker's `language()`/`node_kind_ids()`/`walk()` and
//! its config directory name.

use std::path::{Path, PathBuf};
use std::time::Duration;

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use tracing::{error, info, warn};
use tree_sitter::{Language, Node};

use crate::buffer::OccurrenceBuffer;
use crate::config::ConfigRoot;
use crate::error::IndexError;
use crate::filter::{FilterConfig, SymbolFilter};
use crate::parse::{self, NodeKindIds};
use crate::storage::StorageEngine;
use crate::walker::WalkerContext;

/// How often a non-`--once` run re-walks the tree looking for
/// changes. The teacher's dependency stack has no filesystem-watch
/// crate, so this polls on a timer rather than subscribing to OS
/// events.
const WATCH_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct LanguageWalker {
    pub name: &'static str,
    pub language: Language,
    pub node_kind_ids: NodeKindIds,
    pub walk: fn(&mut WalkerContext, Node),
    pub default_extensions: &'static [&'static str],
}

pub struct RunOptions {
    pub paths: Vec<PathBuf>,
    pub once: bool,
    pub db_file: PathBuf,
    pub config_root: PathBuf,
    pub debug: bool,
}

/// Run `index-<language>` to completion. Returns the total number of
/// files successfully indexed across every pass. A run with at least
/// one discovered file where every single one failed to parse is
/// fatal per §6.1 ("cannot parse any file"); individual per-file
/// failures otherwise are reported and skipped.
pub fn run(walker: &LanguageWalker, options: RunOptions) -> Result<u64, IndexError> {
    let config_root = ConfigRoot::new(options.config_root.clone());
    let language_config = config_root.load_language(walker.name);
    let stopwords = config_root.load_stopwords();

    let extensions: Vec<String> = if language_config.extensions.is_empty() {
        walker.default_extensions.iter().map(|s| s.to_string()).collect()
    } else {
        language_config.extensions.clone()
    };

    let include = build_extension_globset(&extensions);
    let exclude = build_ignore_globset(&language_config.ignore_patterns)
        .map_err(|source| IndexError::Io {
            path: options.config_root.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, source.to_string()),
        })?;

    let mut engine = StorageEngine::open(&options.db_file)?;

    loop {
        let filter = SymbolFilter::new(&language_config.keywords, &stopwords, FilterConfig::default());
        let total_indexed = index_pass(walker, &options, &include, exclude.as_ref(), &filter, &mut engine)?;

        if options.once {
            return Ok(total_indexed);
        }

        info!(files = total_indexed, "watch pass complete, sleeping");
        std::thread::sleep(WATCH_POLL_INTERVAL);
    }
}

fn index_pass(
    walker: &LanguageWalker,
    options: &RunOptions,
    include: &GlobSet,
    exclude: Option<&GlobSet>,
    filter: &SymbolFilter,
    engine: &mut StorageEngine,
) -> Result<u64, IndexError> {
    let mut builder = WalkBuilder::new(&options.paths[0]);
    for path in options.paths.iter().skip(1) {
        builder.add(path);
    }

    let mut discovered = 0u64;
    let mut indexed = 0u64;

    for entry in builder.build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(%err, "walk error, skipping entry");
                continue;
            }
        };

        if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
            continue;
        }

        let path = entry.path();
        if !include.is_match(path) {
            continue;
        }
        if exclude.map(|set| set.is_match(path)).unwrap_or(false) {
            continue;
        }

        discovered += 1;
        match index_one_file(walker, path, filter, options.debug, engine) {
            Ok(()) => indexed += 1,
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => error!(%err, path = %path.display(), "failed to index file, skipping"),
        }
    }

    if discovered > 0 && indexed == 0 {
        return Err(IndexError::Parse {
            path: options.paths[0].clone(),
        });
    }

    Ok(indexed)
}

fn index_one_file(
    walker: &LanguageWalker,
    path: &Path,
    filter: &SymbolFilter,
    debug: bool,
    engine: &mut StorageEngine,
) -> Result<(), IndexError> {
    let parsed = parse::parse(path, &walker.language)?;

    let (directory, filename) = split_directory_filename(path);
    let mut buffer = OccurrenceBuffer::with_default_max();
    {
        let mut ctx = WalkerContext::new(
            &parsed.source,
            directory.clone(),
            filename.clone(),
            &mut buffer,
            filter,
            &walker.node_kind_ids,
            debug,
        );
        (walker.walk)(&mut ctx, parsed.tree.root_node());

        if let Some(drift) = ctx.take_grammar_drift() {
            return Err(IndexError::GrammarDrift {
                path: path.to_path_buf(),
                line: drift.line,
                column: drift.column,
                node_kind: drift.node_kind,
            });
        }
    }

    let dropped = buffer.dropped();
    let occurrences = buffer.drain();
    engine.reindex_file(&directory, &filename, &occurrences)?;

    if dropped > 0 {
        warn!(path = %path.display(), dropped, "occurrence buffer overflow, excess occurrences dropped");
    }

    Ok(())
}

/// Split a walked path into the `(directory, filename)` pair
/// `code_index` keys on, with `directory` kept relative and
/// slash-terminated the way `-f go/%` boundary matching expects
/// (spec §4.6).
fn split_directory_filename(path: &Path) -> (String, String) {
    let filename = path
        .file_name()
        .and_then(|f| f.to_str())
        .unwrap_or_default()
        .to_owned();
    let parent = path.parent().map(|p| p.to_string_lossy().to_string()).unwrap_or_default();
    let directory = if parent.is_empty() {
        "./".to_owned()
    } else if parent.ends_with('/') {
        parent
    } else {
        format!("{parent}/")
    };
    (directory, filename)
}

fn build_extension_globset(extensions: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for ext in extensions {
        let ext = ext.trim_start_matches('.');
        if let Ok(glob) = Glob::new(&format!("*.{ext}")) {
            builder.add(glob);
        }
    }
    builder.build().unwrap_or_else(|_| GlobSetBuilder::new().build().unwrap())
}

fn build_ignore_globset(patterns: &[String]) -> Result<Option<GlobSet>, globset::Error> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(Some(builder.build()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_directory_filename_adds_trailing_slash() {
        let (dir, file) = split_directory_filename(Path::new("go/worker.go"));
        assert_eq!(dir, "go/");
        assert_eq!(file, "worker.go");
    }

    #[test]
    fn split_directory_filename_handles_bare_filename() {
        let (dir, file) = split_directory_filename(Path::new("a.c"));
        assert_eq!(dir, "./");
        assert_eq!(file, "a.c");
    }

    #[test]
    fn extension_globset_matches_only_listed_extensions() {
        let set = build_extension_globset(&["go".to_owned()]);
        assert!(set.is_match(Path::new("worker.go")));
        assert!(!set.is_match(Path::new("worker.py")));
    }
}
