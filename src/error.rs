//! The error taxonomy of spec §7, as typed enums callers can match on
//! instead of sniffing message text. Each `index-<language>` binary's
//! `main` matches on the returned `IndexError` directly and maps it to
//! an exit code; `qi` does the same for `QueryError`.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while indexing a tree of files.
///
/// Variants map directly onto the non-warning indexing-side
/// categories of §7: I/O, parse, grammar drift, and schema mismatch.
/// Buffer overflow is also in that taxonomy but is warning-only (the
/// file is still indexed with the occurrences that fit) so it never
/// reaches this type — it is logged directly from `index_run`. Grammar
/// drift and schema mismatch are fatal; the others are reported per
/// file and indexing continues.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: parse error")]
    Parse { path: PathBuf },

    #[error("{path}:{line}:{column}: grammar drift on unclassified node `{node_kind}`")]
    GrammarDrift {
        path: PathBuf,
        line: u32,
        column: u32,
        node_kind: String,
    },

    #[error(
        "schema mismatch: database has version {found}, this binary expects {expected}; re-index to upgrade"
    )]
    SchemaMismatch { found: i64, expected: i64 },

    #[error("cannot open database at {path}: {source}")]
    Database {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
}

impl IndexError {
    /// Whether this error aborts the whole run (DB-level) or is
    /// recovered locally and the run continues with the next file.
    pub fn is_fatal(&self) -> bool {
        matches!(self, IndexError::GrammarDrift { .. } | IndexError::SchemaMismatch { .. } | IndexError::Database { .. })
    }
}

/// Errors raised while compiling or running a `qi` query.
///
/// `qi`'s exit code (§6.1) is 2 for any [`QueryError`], 0/1 depending
/// on result count otherwise.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("unknown context kind `{0}`; expected one of function, variable, argument, type, property, call, import, enum, enum_case, label, goto, lambda, exception, namespace, comment, string, filename")]
    UnknownContext(String),

    #[error("unknown column `{0}`")]
    UnknownColumn(String),

    #[error("`--and` requires at least 2 patterns, got {0}")]
    TooFewCoOccurrencePatterns(usize),

    #[error("`--within {0}` matches no definition in the index")]
    UnknownWithinTarget(String),

    #[error("invalid value for {flag}: {value}")]
    InvalidFlagValue { flag: &'static str, value: String },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}
