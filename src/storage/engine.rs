//! Storage Engine (spec §4.5/§6.3): opens the embedded SQLite file,
//! tunes it for a developer tool's write pattern, checks the schema
//! version, and performs the delete-then-insert reindex of a single
//! file inside one transaction.

use std::path::{Path, PathBuf};

use rusqlite::{params_from_iter, Connection, ToSql};
use tracing::debug;

use crate::error::IndexError;
use crate::model::{Occurrence, EXTENSIBLE_COLUMNS};

use super::schema::{self, SCHEMA_VERSION};

/// Owns the single SQLite connection for a run. Per spec §5, callers
/// treat this as a mutex-protected resource — in practice, each
/// `index-<language>` run and each `qi` invocation opens its own
/// connection and exits, so no in-process locking is needed beyond
/// SQLite's own.
pub struct StorageEngine {
    conn: Connection,
}

impl StorageEngine {
    /// Open (creating if absent) the database at `path`, apply pragma
    /// tuning, ensure the schema exists, and verify its version.
    pub fn open(path: &Path) -> Result<Self, IndexError> {
        let conn = Connection::open(path).map_err(|source| IndexError::Database {
            path: path.to_path_buf(),
            source,
        })?;

        apply_pragmas(&conn, path)?;
        initialize_schema(&conn, path)?;
        check_schema_version(&conn, path)?;

        Ok(StorageEngine { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Replace a file's occurrences atomically: `DELETE` then bulk
    /// `INSERT`, in one transaction, per spec §4.5/§3.3.
    pub fn reindex_file(
        &mut self,
        directory: &str,
        filename: &str,
        occurrences: &[Occurrence],
    ) -> Result<(), IndexError> {
        let path = PathBuf::new();
        let tx = self.conn.transaction().map_err(|source| IndexError::Database {
            path: path.clone(),
            source,
        })?;

        tx.execute(
            "DELETE FROM code_index WHERE directory = ?1 AND filename = ?2",
            rusqlite::params![directory, filename],
        )
        .map_err(|source| IndexError::Database {
            path: path.clone(),
            source,
        })?;

        let columns = schema::all_columns();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
        let insert_sql = format!(
            "INSERT INTO code_index ({}) VALUES ({})",
            columns.join(", "),
            placeholders.join(", ")
        );

        {
            let mut stmt = tx.prepare(&insert_sql).map_err(|source| IndexError::Database {
                path: path.clone(),
                source,
            })?;

            for occurrence in occurrences {
                let values = row_values(occurrence);
                let params: Vec<&dyn ToSql> = values.iter().map(|v| v as &dyn ToSql).collect();
                stmt.execute(params_from_iter(params))
                    .map_err(|source| IndexError::Database {
                        path: path.clone(),
                        source,
                    })?;
            }
        }

        debug!(directory, filename, rows = occurrences.len(), "reindexed file");

        tx.commit().map_err(|source| IndexError::Database { path, source })
    }
}

/// Build one row's worth of bound values, in the column order
/// returned by [`schema::all_columns`]: key columns, source_location,
/// then every extensible column in `EXTENSIBLE_COLUMNS` order.
fn row_values(occurrence: &Occurrence) -> Vec<rusqlite::types::Value> {
    use rusqlite::types::Value;

    let mut values = vec![
        Value::Text(occurrence.directory.clone()),
        Value::Text(occurrence.filename.clone()),
        Value::Integer(occurrence.line as i64),
        Value::Text(occurrence.symbol.clone()),
        Value::Text(occurrence.context.as_str().to_owned()),
        occurrence
            .source_location
            .map(|loc| Value::Text(loc.encode()))
            .unwrap_or(Value::Null),
    ];

    for column in EXTENSIBLE_COLUMNS {
        let value = match column.name {
            "parent" => occurrence.parent.clone().map(Value::Text),
            "scope" => occurrence.scope.clone().map(Value::Text),
            "modifier" => occurrence.modifier.clone().map(Value::Text),
            "clue" => occurrence.clue.clone().map(Value::Text),
            "namespace" => occurrence.namespace.clone().map(Value::Text),
            "type" => occurrence.r#type.clone().map(Value::Text),
            "definition" => Some(Value::Integer(if occurrence.definition { 1 } else { 0 })),
            _ => None,
        };
        values.push(value.unwrap_or(Value::Null));
    }

    values
}

fn apply_pragmas(conn: &Connection, path: &Path) -> Result<(), IndexError> {
    let db_error = |source| IndexError::Database {
        path: path.to_path_buf(),
        source,
    };

    conn.pragma_update(None, "journal_mode", "WAL").map_err(db_error)?;
    conn.pragma_update(None, "synchronous", "NORMAL").map_err(db_error)?;
    conn.busy_timeout(std::time::Duration::from_millis(5_000))
        .map_err(db_error)?;
    conn.pragma_update(None, "cache_size", -20_000i64).map_err(db_error)?;
    Ok(())
}

fn initialize_schema(conn: &Connection, path: &Path) -> Result<(), IndexError> {
    let db_error = |source| IndexError::Database {
        path: path.to_path_buf(),
        source,
    };

    conn.execute(schema::CREATE_META_SQL, []).map_err(db_error)?;
    conn.execute(&schema::create_code_index_sql(), []).map_err(db_error)?;
    for stmt in schema::create_index_sql() {
        conn.execute(&stmt, []).map_err(db_error)?;
    }

    let existing: Option<String> = conn
        .query_row("SELECT value FROM meta WHERE key = 'schema_version'", [], |row| row.get(0))
        .ok();

    if existing.is_none() {
        conn.execute(
            "INSERT INTO meta (key, value) VALUES ('schema_version', ?1)",
            rusqlite::params![SCHEMA_VERSION.to_string()],
        )
        .map_err(db_error)?;
    }

    Ok(())
}

fn check_schema_version(conn: &Connection, path: &Path) -> Result<(), IndexError> {
    let found: String = conn
        .query_row("SELECT value FROM meta WHERE key = 'schema_version'", [], |row| row.get(0))
        .map_err(|source| IndexError::Database {
            path: path.to_path_buf(),
            source,
        })?;

    let found: i64 = found.parse().unwrap_or(-1);
    if found != SCHEMA_VERSION {
        return Err(IndexError::SchemaMismatch {
            found,
            expected: SCHEMA_VERSION,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OccurrenceContext;
    use tempfile::tempdir;

    #[test]
    fn open_creates_schema_and_accepts_reindex() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("code-index.db");
        let mut engine = StorageEngine::open(&db_path).unwrap();

        let occ = Occurrence::new("f", 1, OccurrenceContext::Function, "src/", "a.c")
            .with_type("int");
        engine.reindex_file("src/", "a.c", &[occ]).unwrap();

        let count: i64 = engine
            .connection()
            .query_row("SELECT COUNT(*) FROM code_index", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn reindex_replaces_prior_rows_for_the_same_file() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("code-index.db");
        let mut engine = StorageEngine::open(&db_path).unwrap();

        let first = Occurrence::new("a", 1, OccurrenceContext::Variable, "src/", "a.c");
        engine.reindex_file("src/", "a.c", &[first]).unwrap();

        let second = Occurrence::new("b", 2, OccurrenceContext::Variable, "src/", "a.c");
        engine.reindex_file("src/", "a.c", &[second]).unwrap();

        let count: i64 = engine
            .connection()
            .query_row("SELECT COUNT(*) FROM code_index", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);

        let symbol: String = engine
            .connection()
            .query_row("SELECT symbol FROM code_index", [], |row| row.get(0))
            .unwrap();
        assert_eq!(symbol, "b");
    }

    #[test]
    fn reopening_with_matching_schema_version_succeeds() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("code-index.db");
        {
            let _engine = StorageEngine::open(&db_path).unwrap();
        }
        let _engine = StorageEngine::open(&db_path).unwrap();
    }

    #[test]
    fn schema_mismatch_is_fatal() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("code-index.db");
        {
            let _engine = StorageEngine::open(&db_path).unwrap();
        }

        {
            let conn = Connection::open(&db_path).unwrap();
            conn.execute(
                "UPDATE meta SET value = '999' WHERE key = 'schema_version'",
                [],
            )
            .unwrap();
        }

        let result = StorageEngine::open(&db_path);
        assert!(matches!(result, Err(IndexError::SchemaMismatch { .. })));
    }
}
