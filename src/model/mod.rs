//! The Occurrence record and its extensible column schema.
//!
//! This is the single source of truth consumed by the storage DDL
//! (`storage::schema`), the prepared insert statement, and the
//! `--columns` whitelist (`query::compiler::QueryRequest::
//! validate_columns`). Adding a new extensible column means adding
//! one entry to [`EXTENSIBLE_COLUMNS`] plus one field on
//! [`Occurrence`] — no other module hard-codes the column list.

mod occurrence;
mod schema;

pub use occurrence::{Occurrence, OccurrenceContext, SourceLocation};
pub use schema::{ColumnKind, ExtensibleColumn, EXTENSIBLE_COLUMNS};
