//! Language Walker framework (spec §4.4): the dispatch and handler
//! discipline shared by every per-language walker, plus the helpers
//! every language module builds its dispatch table and handlers from.
//!
//! The central invariant (§4.4.1): when `visit_node` invokes a
//! handler, it returns immediately after. The handler owns the entire
//! subtree rooted at the node — it must visit every child that needs
//! visiting, or explicitly choose not to. If no handler matches,
//! `visit_node` falls back to [`process_children`], which recurses
//! into every child. No handler may call both `process_children` and
//! manual per-child dispatch on the same node (§4.4.5).

pub mod c;
pub mod ecma;
pub mod go;
pub mod javascript;
pub mod php;
pub mod python;
pub mod typescript;

use std::path::Path;

use tree_sitter::Node;

use crate::buffer::OccurrenceBuffer;
use crate::filter::SymbolFilter;
use crate::model::{Occurrence, OccurrenceContext, SourceLocation};
use crate::parse::NodeKindIds;

/// Per-file state threaded through every handler: where the
/// occurrences being produced belong, the buffer they're appended to,
/// and the filter/symbol-id tables built once per process.
pub struct WalkerContext<'a> {
    pub source: &'a [u8],
    pub directory: String,
    pub filename: String,
    pub buffer: &'a mut OccurrenceBuffer,
    pub filter: &'a SymbolFilter<'a>,
    pub ids: &'a NodeKindIds,
    pub debug: bool,
    grammar_drift: std::cell::RefCell<Option<GrammarDrift>>,
}

impl<'a> WalkerContext<'a> {
    pub fn new(
        source: &'a [u8],
        directory: String,
        filename: String,
        buffer: &'a mut OccurrenceBuffer,
        filter: &'a SymbolFilter<'a>,
        ids: &'a NodeKindIds,
        debug: bool,
    ) -> Self {
        WalkerContext {
            source,
            directory,
            filename,
            buffer,
            filter,
            ids,
            debug,
            grammar_drift: std::cell::RefCell::new(None),
        }
    }

    /// Record a grammar-drift condition (§4.4.4/§4.4.6): the type
    /// classifier met a node kind it has no strategy for. First report
    /// wins; takes `&self` so type-extraction helpers that only hold a
    /// shared reference can still surface it without a signature
    /// change threaded through every recursive caller.
    pub fn report_grammar_drift(&self, node: Node, node_kind: &str) {
        let mut slot = self.grammar_drift.borrow_mut();
        if slot.is_some() {
            return;
        }
        let start = node.start_position();
        *slot = Some(GrammarDrift {
            line: start.row as u32 + 1,
            column: start.column as u32 + 1,
            node_kind: node_kind.to_owned(),
        });
    }

    /// Take the first grammar-drift condition reported during the
    /// walk, if any. Called once per file after `walk` returns.
    pub fn take_grammar_drift(&mut self) -> Option<GrammarDrift> {
        self.grammar_drift.borrow_mut().take()
    }

    pub fn text(&self, node: Node) -> &'a str {
        node.utf8_text(self.source).unwrap_or("")
    }

    /// 1-based line of a node's start position.
    pub fn line(&self, node: Node) -> u32 {
        node.start_position().row as u32 + 1
    }

    pub fn location(&self, node: Node) -> SourceLocation {
        let start = node.start_position();
        let end = node.end_position();
        SourceLocation {
            start_line: start.row as u32 + 1,
            start_col: start.column as u32 + 1,
            end_line: end.row as u32 + 1,
            end_col: end.column as u32 + 1,
        }
    }

    pub fn emit(&mut self, occurrence: Occurrence) {
        self.buffer.append(occurrence);
    }

    /// Emit the once-per-file `filename` occurrence (spec §4.4.3).
    pub fn emit_filename(&mut self) {
        let stem = Path::new(&self.filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.filename)
            .to_owned();
        let occurrence = Occurrence::new(
            stem,
            1,
            OccurrenceContext::Filename,
            self.directory.clone(),
            self.filename.clone(),
        );
        self.emit(occurrence);
    }

    /// Shared comments/strings handler (spec §4.4.3): split on
    /// whitespace, clean each word, emit non-empty ones.
    pub fn emit_cleaned_words(&mut self, node: Node, context: OccurrenceContext) {
        let line = self.line(node);
        let text = self.text(node).to_owned();
        for raw in text.split_whitespace() {
            let cleaned = crate::filter::clean_string_symbol(raw);
            if cleaned.is_empty() {
                continue;
            }
            let occurrence = Occurrence::new(
                cleaned,
                line,
                context,
                self.directory.clone(),
                self.filename.clone(),
            );
            self.emit(occurrence);
        }
    }
}

/// Fallback for unmatched node types (§4.4.1): recurse into every
/// child, routing each to `visit`.
pub fn process_children<'a, F>(node: Node<'a>, mut visit: F)
where
    F: FnMut(Node<'a>),
{
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        visit(child);
    }
}

/// Named children only — used by handlers that want to skip anonymous
/// tokens (punctuation, keywords) while iterating.
pub fn named_children<'a>(node: Node<'a>) -> Vec<Node<'a>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// The closed set of strategies `extract_type` dispatches through
/// (spec §4.4.4). A walker's `extract_type` returns `Err` only for
/// the `not-a-type` case, which is fatal per spec (grammar drift).
pub enum TypeExtraction {
    Text(String),
    Empty,
}

impl TypeExtraction {
    pub fn into_option(self) -> Option<String> {
        match self {
            TypeExtraction::Text(text) => Some(text),
            TypeExtraction::Empty => None,
        }
    }
}

/// Grammar-drift error: the type classifier met a node it has no
/// strategy for. Non-negotiable per §4.4.4 — never silently fall back.
#[derive(Debug)]
pub struct GrammarDrift {
    pub line: u32,
    pub column: u32,
    pub node_kind: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Stopwords;
    use crate::filter::FilterConfig;
    use std::collections::HashSet;

    #[test]
    fn emit_cleaned_words_splits_and_cleans() {
        let keywords = HashSet::new();
        let stopwords = Stopwords::default();
        let filter = SymbolFilter::new(&keywords, &stopwords, FilterConfig::default());
        let language = tree_sitter_python::LANGUAGE.into();
        let ids = NodeKindIds::build(&language, &[]);
        let mut buffer = OccurrenceBuffer::with_default_max();

        // Build a fake node via a minimal parse: use a python comment.
        let mut parser = tree_sitter::Parser::new();
        parser.set_language(&language).unwrap();
        let src = "# hello, world! see ./a.rs\n";
        let tree = parser.parse(src, None).unwrap();
        let comment = tree.root_node().child(0).unwrap();

        let mut ctx = WalkerContext::new(
            src.as_bytes(),
            "src/".to_owned(),
            "a.py".to_owned(),
            &mut buffer,
            &filter,
            &ids,
            false,
        );
        ctx.emit_cleaned_words(comment, OccurrenceContext::Comment);
        let symbols: Vec<&str> = buffer.iter().map(|o| o.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["hello", "world", "see", "./a.rs"]);
    }
}
