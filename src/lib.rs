//! SourceMinder: a multi-language source-code indexer and query engine.
//!
//! The crate is organized leaf-first, mirroring the data flow from
//! parsed source down to stored rows:
//!
//! file bytes -> [`parse`] -> [`walker`] -> [`buffer`] -> [`storage`]
//!
//! and the query side:
//!
//! CLI predicate -> [`query`] -> [`storage`] -> formatted rows

pub mod buffer;
pub mod config;
pub mod error;
pub mod filter;
pub mod index_run;
pub mod logging;
pub mod model;
pub mod parse;
pub mod query;
pub mod storage;
pub mod walker;

pub use error::{IndexError, QueryError};
pub use model::{Occurrence, OccurrenceContext};
