//! DDL generation for `code_index`, driven entirely by
//! [`crate::model::EXTENSIBLE_COLUMNS`] so that adding a column never
//! requires touching this file's structure, only the table in
//! `model::schema` (spec §9 "Extensible column schema").

use crate::model::EXTENSIBLE_COLUMNS;

/// Bumped whenever the DDL below changes shape in a way that is not
/// backward-compatible with rows written by an older version. Checked
/// against the `meta` table's `schema_version` key on every open;
/// mismatch is fatal per spec §7 item 5.
pub const SCHEMA_VERSION: i64 = 1;

/// The fixed key columns of `code_index`, in the order they appear in
/// the composite primary key (spec §3.1, §4.5).
const KEY_COLUMNS: &[&str] = &["directory", "filename", "line", "symbol", "context"];

/// Build the full `CREATE TABLE` statement for `code_index`.
///
/// Stored `WITHOUT ROWID`: spec §4.5 requires the table be "stored
/// without a hidden monotonic row identifier (physical layout is
/// clustered on the primary key)", which is exactly SQLite's
/// `WITHOUT ROWID` table option.
pub fn create_code_index_sql() -> String {
    let mut sql = String::from(
        "CREATE TABLE IF NOT EXISTS code_index (\n\
         \x20   directory TEXT NOT NULL,\n\
         \x20   filename TEXT NOT NULL,\n\
         \x20   line INTEGER NOT NULL,\n\
         \x20   symbol TEXT NOT NULL,\n\
         \x20   context TEXT NOT NULL,\n\
         \x20   source_location TEXT,\n",
    );

    for column in EXTENSIBLE_COLUMNS {
        sql.push_str(&format!(
            "    {} {},\n",
            column.name,
            column.kind.sql_type()
        ));
    }

    sql.push_str(&format!(
        "    PRIMARY KEY ({})\n) WITHOUT ROWID;",
        KEY_COLUMNS.join(", ")
    ));
    sql
}

/// Secondary indexes per spec §4.5: `(symbol)`, `(symbol, context)`,
/// `(context, definition)`, `(directory, filename)`.
pub fn create_index_sql() -> Vec<String> {
    vec![
        "CREATE INDEX IF NOT EXISTS idx_code_index_symbol ON code_index (symbol);".to_owned(),
        "CREATE INDEX IF NOT EXISTS idx_code_index_symbol_context ON code_index (symbol, context);"
            .to_owned(),
        "CREATE INDEX IF NOT EXISTS idx_code_index_context_definition ON code_index (context, definition);"
            .to_owned(),
        "CREATE INDEX IF NOT EXISTS idx_code_index_dir_file ON code_index (directory, filename);"
            .to_owned(),
    ]
}

pub const CREATE_META_SQL: &str =
    "CREATE TABLE IF NOT EXISTS meta (key TEXT PRIMARY KEY, value TEXT NOT NULL);";

/// All column names in `code_index`, in insert order: key columns,
/// `source_location`, then every extensible column. The insert
/// statement builder and the query column whitelist both iterate this
/// instead of hard-coding names.
pub fn all_columns() -> Vec<&'static str> {
    let mut columns: Vec<&'static str> = KEY_COLUMNS.to_vec();
    columns.push("source_location");
    columns.extend(EXTENSIBLE_COLUMNS.iter().map(|c| c.name));
    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ddl_contains_every_extensible_column() {
        let sql = create_code_index_sql();
        for column in EXTENSIBLE_COLUMNS {
            assert!(sql.contains(column.name), "missing column {}", column.name);
        }
        assert!(sql.contains("WITHOUT ROWID"));
    }

    #[test]
    fn all_columns_starts_with_key_columns() {
        let columns = all_columns();
        assert_eq!(&columns[..5], KEY_COLUMNS);
        assert_eq!(columns[5], "source_location");
    }
}
