//! Symbol Filter (spec §4.1): decides whether a candidate textual
//! symbol is worth indexing, and normalizes words pulled out of
//! comments and string literals.

use crate::config::Stopwords;

/// Configurable knobs for [`SymbolFilter`]. Defaults match spec §4.1;
/// `min_length` is lowered to 1 by callers that index single-letter
/// contexts (e.g. C's `a`, `b` in macro parameter lists are still
/// filtered through the same predicate but with the relaxed bound).
#[derive(Debug, Clone, Copy)]
pub struct FilterConfig {
    pub min_length: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig { min_length: 2 }
    }
}

/// A per-language predicate over candidate symbols, backed by that
/// language's keyword list and the shared stopword list.
pub struct SymbolFilter<'a> {
    keywords: &'a std::collections::HashSet<String>,
    stopwords: &'a Stopwords,
    config: FilterConfig,
}

impl<'a> SymbolFilter<'a> {
    pub fn new(
        keywords: &'a std::collections::HashSet<String>,
        stopwords: &'a Stopwords,
        config: FilterConfig,
    ) -> Self {
        SymbolFilter {
            keywords,
            stopwords,
            config,
        }
    }

    /// Whether `symbol` should be retained as an indexable identifier.
    pub fn accept(&self, symbol: &str) -> bool {
        if symbol.is_empty() {
            return false;
        }
        if is_pure_integer(symbol) {
            return false;
        }
        if symbol.chars().count() < self.config.min_length {
            return false;
        }
        if self.keywords.contains(symbol) {
            return false;
        }
        if self.stopwords.contains(symbol) {
            return false;
        }
        true
    }
}

fn is_pure_integer(symbol: &str) -> bool {
    !symbol.is_empty() && symbol.bytes().all(|b| b.is_ascii_digit())
}

/// Normalizes a raw word extracted from a string or comment: trims
/// surrounding punctuation, preserves path-like characters (`/`, `.`,
/// `_`, `-`), and returns the empty string if nothing indexable
/// remains.
pub fn clean_string_symbol(raw: &str) -> String {
    let is_indexable = |c: char| c.is_alphanumeric() || matches!(c, '/' | '.' | '_' | '-');
    raw.trim_matches(|c: char| !is_indexable(c)).to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn filter(keywords: &[&str], min_length: usize) -> (HashSet<String>, Stopwords) {
        let kw: HashSet<String> = keywords.iter().map(|s| s.to_string()).collect();
        (kw, Stopwords::default())
    }

    #[test]
    fn rejects_pure_integers() {
        let (kw, sw) = filter(&[], 2);
        let f = SymbolFilter::new(&kw, &sw, FilterConfig::default());
        assert!(!f.accept("1234"));
        assert!(f.accept("v1"));
    }

    #[test]
    fn rejects_below_minimum_length() {
        let (kw, sw) = filter(&[], 2);
        let f = SymbolFilter::new(&kw, &sw, FilterConfig::default());
        assert!(!f.accept("x"));
        assert!(f.accept("xy"));

        let f1 = SymbolFilter::new(&kw, &sw, FilterConfig { min_length: 1 });
        assert!(f1.accept("x"));
    }

    #[test]
    fn rejects_keywords() {
        let (kw, sw) = filter(&["if", "while"], 2);
        let f = SymbolFilter::new(&kw, &sw, FilterConfig::default());
        assert!(!f.accept("if"));
        assert!(f.accept("ifExists"));
    }

    #[test]
    fn clean_string_symbol_trims_punctuation_but_keeps_path_chars() {
        assert_eq!(clean_string_symbol("\"hello,\""), "hello");
        assert_eq!(clean_string_symbol("(./src/main.rs)"), "./src/main.rs");
        assert_eq!(clean_string_symbol("!!!"), "");
        assert_eq!(clean_string_symbol("snake_case_name."), "snake_case_name");
    }
}
