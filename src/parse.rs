//! Parse Frontend (spec §4.3): wraps tree-sitter — reads a file,
//! parses it, and hands back the raw source bytes alongside the tree.
//! Per-language node-type -> integer symbol caching lives in
//! [`NodeKindIds`]; each walker module builds one of these once per
//! process for the node kinds its dispatch table needs.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;
use tree_sitter::{Language, Parser, Tree};

use crate::error::IndexError;

/// A parsed file: owned source bytes plus the tree that borrows
/// tree-sitter's arena-allocated node storage. Nodes are never
/// retained past the lifetime of this struct (spec §9 "Cyclic AST
/// references").
pub struct ParsedFile {
    pub path: PathBuf,
    pub source: Vec<u8>,
    pub tree: Tree,
}

impl ParsedFile {
    pub fn text(&self, start_byte: usize, end_byte: usize) -> &str {
        std::str::from_utf8(&self.source[start_byte..end_byte]).unwrap_or("")
    }
}

/// Read `path`, parse it with `language`, and return the result.
///
/// I/O failures and parse failures are both recoverable per §4.3/§7:
/// the caller reports the error and moves on to the next file rather
/// than aborting the run. A tree containing error nodes is still
/// returned (best-effort partial walk), matching "a partial tree, if
/// any, is not walked" only for the null-tree case — tree-sitter only
/// returns `None` on an internal failure (e.g. cancellation), not on
/// malformed source.
pub fn parse(path: &Path, language: &Language) -> Result<ParsedFile, IndexError> {
    let source = fs::read(path).map_err(|source_err| IndexError::Io {
        path: path.to_path_buf(),
        source: source_err,
    })?;

    let mut parser = Parser::new();
    parser
        .set_language(language)
        .expect("language grammar failed to load");

    let tree = parser
        .parse(&source, None)
        .ok_or_else(|| IndexError::Parse {
            path: path.to_path_buf(),
        })?;

    if tree.root_node().has_error() {
        warn!(path = %path.display(), "parse tree contains error nodes, walking best-effort");
    }

    Ok(ParsedFile {
        path: path.to_path_buf(),
        source,
        tree,
    })
}

/// A cached node-type-name -> integer symbol id table for one
/// language (spec §4.3): "a per-language lookup from node-type name
/// to an opaque integer identifier, computed once per process and
/// cached. Handlers compare against these integers rather than
/// strings — this is load-bearing for performance."
pub struct NodeKindIds {
    ids: HashMap<&'static str, u16>,
}

impl NodeKindIds {
    /// Resolve every name in `kinds` against `language` once at
    /// construction. Callers pass names taken directly from the
    /// grammar's own `node-types.json`, so every lookup is expected to
    /// succeed; an unresolvable name maps to `0`, which will simply
    /// never equal a real node's `kind_id()`.
    pub fn build(language: &Language, kinds: &[&'static str]) -> Self {
        let mut ids = HashMap::with_capacity(kinds.len());
        for &kind in kinds {
            ids.insert(kind, language.id_for_node_kind(kind, true));
        }
        NodeKindIds { ids }
    }

    pub fn get(&self, kind: &str) -> u16 {
        self.ids.get(kind).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn python_language() -> Language {
        tree_sitter_python::LANGUAGE.into()
    }

    #[test]
    fn node_kind_ids_resolve_known_kinds_to_nonzero_ids() {
        let language = python_language();
        let ids = NodeKindIds::build(&language, &["function_definition", "class_definition"]);
        assert_ne!(ids.get("function_definition"), 0);
        assert_ne!(ids.get("class_definition"), 0);
    }

    #[test]
    fn node_kind_ids_unknown_kind_resolves_to_zero() {
        let language = python_language();
        let ids = NodeKindIds::build(&language, &["function_definition"]);
        assert_eq!(ids.get("not_a_real_node_kind"), 0);
    }

    #[test]
    fn parse_reports_io_error_for_missing_file() {
        let language = python_language();
        let result = parse(Path::new("/nonexistent/path/does_not_exist.py"), &language);
        assert!(matches!(result, Err(IndexError::Io { .. })));
    }

    #[test]
    fn parse_returns_tree_for_valid_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.py");
        std::fs::write(&path, "def f():\n    pass\n").unwrap();

        let language = python_language();
        let parsed = parse(&path, &language).unwrap();
        assert!(!parsed.tree.root_node().has_error());
    }
}
