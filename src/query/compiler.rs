//! `qi` predicate compilation (spec §4.6): turns a parsed set of flags
//! into a parameterized SQL statement against `code_index` and runs
//! it. Each flag compiles to one `WHERE` conjunct; wildcards are SQL
//! `LIKE` patterns, passed straight through from the command line.

use rusqlite::types::Value;
use rusqlite::Connection;

use crate::error::QueryError;
use crate::model::OccurrenceContext;
use crate::storage::schema;

/// One resolved row from `code_index`, enough to drive every output
/// mode in `query::format`.
#[derive(Debug, Clone)]
pub struct QueryRow {
    pub directory: String,
    pub filename: String,
    pub line: u32,
    pub symbol: String,
    pub context: String,
    pub source_location: Option<String>,
    pub parent: Option<String>,
    pub scope: Option<String>,
    pub modifier: Option<String>,
    pub clue: Option<String>,
    pub namespace: Option<String>,
    pub r#type: Option<String>,
    pub definition: bool,
}

impl QueryRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(QueryRow {
            directory: row.get("directory")?,
            filename: row.get("filename")?,
            line: row.get::<_, i64>("line")? as u32,
            symbol: row.get("symbol")?,
            context: row.get("context")?,
            source_location: row.get("source_location")?,
            parent: row.get("parent")?,
            scope: row.get("scope")?,
            modifier: row.get("modifier")?,
            clue: row.get("clue")?,
            namespace: row.get("namespace")?,
            r#type: row.get("type")?,
            definition: row.get::<_, i64>("definition")? != 0,
        })
    }

    pub fn full_path(&self) -> String {
        format!("{}{}", self.directory, self.filename)
    }
}

/// The parsed, not-yet-compiled form of a `qi` invocation. `src/bin/
/// qi.rs` builds one of these from clap's derived CLI struct; this
/// module never touches clap.
#[derive(Debug, Clone, Default)]
pub struct QueryRequest {
    pub patterns: Vec<String>,
    pub include: Vec<OccurrenceContext>,
    pub exclude: Vec<OccurrenceContext>,
    pub modifier: Option<String>,
    pub scope: Option<String>,
    pub clue: Option<String>,
    pub parent: Option<String>,
    pub type_like: Option<String>,
    pub file: Option<String>,
    pub def_only: bool,
    pub usage_only: bool,
    pub and_distance: Option<u32>,
    pub within: Option<String>,
    pub limit: Option<u32>,
    pub limit_per_file: Option<u32>,
    pub columns: Option<Vec<String>>,
}

impl QueryRequest {
    /// Validate `--columns` names against the real column set before
    /// any SQL is built, so a typo surfaces as a query-compilation
    /// error (exit code 2) rather than a confusing empty result.
    pub fn validate_columns(&self) -> Result<(), QueryError> {
        let Some(columns) = &self.columns else {
            return Ok(());
        };
        let known = schema::all_columns();
        for column in columns {
            if !known.contains(&column.as_str()) {
                return Err(QueryError::UnknownColumn(column.clone()));
            }
        }
        Ok(())
    }
}

struct Conjunct {
    sql: String,
    params: Vec<Value>,
}

fn like_conjunct(prefix: &str, column: &str, pattern: &str) -> Conjunct {
    Conjunct {
        sql: format!("{prefix}{column} LIKE ?"),
        params: vec![Value::Text(pattern.to_owned())],
    }
}

/// `-f` path-boundary semantics (spec §4.6): a pattern without a
/// leading `/` or `./` must match at a directory boundary — `go/%`
/// matches `./go/foo.go` but not `./mygo/foo.go`. A leading-anchored
/// pattern matches literally from the start of the full path.
fn file_conjunct(prefix: &str, pattern: &str) -> Conjunct {
    let full_path = format!("({prefix}directory || {prefix}filename)");
    if pattern.starts_with('/') || pattern.starts_with("./") {
        Conjunct {
            sql: format!("{full_path} LIKE ?"),
            params: vec![Value::Text(pattern.to_owned())],
        }
    } else {
        Conjunct {
            sql: format!("({full_path} LIKE ? OR {full_path} LIKE ?)"),
            params: vec![
                Value::Text(pattern.to_owned()),
                Value::Text(format!("%/{pattern}")),
            ],
        }
    }
}

fn patterns_conjunct(prefix: &str, patterns: &[String]) -> Option<Conjunct> {
    if patterns.is_empty() {
        return None;
    }
    let clauses: Vec<String> = patterns.iter().map(|_| format!("{prefix}symbol LIKE ?")).collect();
    let params = patterns.iter().map(|p| Value::Text(p.clone())).collect();
    Some(Conjunct {
        sql: format!("({})", clauses.join(" OR ")),
        params,
    })
}

fn context_conjuncts(prefix: &str, request: &QueryRequest) -> Vec<Conjunct> {
    let mut conjuncts = Vec::new();
    if !request.include.is_empty() {
        let clauses: Vec<String> = request
            .include
            .iter()
            .map(|_| format!("{prefix}context = ?"))
            .collect();
        let params = request.include.iter().map(|c| Value::Text(c.as_str().to_owned())).collect();
        conjuncts.push(Conjunct {
            sql: format!("({})", clauses.join(" OR ")),
            params,
        });
    }
    if !request.exclude.is_empty() {
        let clauses: Vec<String> = request
            .exclude
            .iter()
            .map(|_| format!("{prefix}context != ?"))
            .collect();
        let params = request.exclude.iter().map(|c| Value::Text(c.as_str().to_owned())).collect();
        conjuncts.push(Conjunct {
            sql: format!("({})", clauses.join(" AND ")),
            params,
        });
    }
    conjuncts
}

/// Resolve `--within F` to a set of `(directory, filename, start_line,
/// end_line)` spans for every definition named `F`, per spec §4.6:
/// "Requires `source_location` on definitions ... for any matching
/// `def`." Errors if no such definition exists.
fn resolve_within(conn: &Connection, name: &str) -> Result<Vec<(String, String, u32, u32)>, QueryError> {
    let mut stmt = conn.prepare(
        "SELECT directory, filename, source_location FROM code_index \
         WHERE symbol = ?1 AND definition = 1 AND source_location IS NOT NULL",
    )?;

    let spans: Vec<(String, String, u32, u32)> = stmt
        .query_map([name], |row| {
            let directory: String = row.get(0)?;
            let filename: String = row.get(1)?;
            let location: String = row.get(2)?;
            Ok((directory, filename, location))
        })?
        .filter_map(|r| r.ok())
        .filter_map(|(directory, filename, location)| {
            crate::model::SourceLocation::parse(&location)
                .map(|loc| (directory, filename, loc.start_line, loc.end_line))
        })
        .collect();

    if spans.is_empty() {
        return Err(QueryError::UnknownWithinTarget(name.to_owned()));
    }
    Ok(spans)
}

fn within_conjunct(prefix: &str, spans: &[(String, String, u32, u32)]) -> Conjunct {
    let mut clauses = Vec::with_capacity(spans.len());
    let mut params = Vec::with_capacity(spans.len() * 4);
    for (directory, filename, start, end) in spans {
        clauses.push(format!(
            "({prefix}directory = ? AND {prefix}filename = ? AND {prefix}line BETWEEN ? AND ?)"
        ));
        params.push(Value::Text(directory.clone()));
        params.push(Value::Text(filename.clone()));
        params.push(Value::Integer(*start as i64));
        params.push(Value::Integer(*end as i64));
    }
    Conjunct {
        sql: format!("({})", clauses.join(" OR ")),
        params,
    }
}

/// Build the `WHERE` clause for `request`'s filters, qualifying every
/// column with `prefix` (e.g. `"t0."`) so the clause is safe to reuse
/// inside the `--and` self-join, where unqualified column names would
/// be ambiguous across joined aliases.
fn build_where_prefixed(
    conn: &Connection,
    request: &QueryRequest,
    prefix: &str,
) -> Result<(String, Vec<Value>), QueryError> {
    let mut conjuncts = Vec::new();

    if request.and_distance.is_none() {
        conjuncts.extend(patterns_conjunct(prefix, &request.patterns));
    }
    conjuncts.extend(context_conjuncts(prefix, request));

    if let Some(m) = &request.modifier {
        conjuncts.push(Conjunct {
            sql: format!("{prefix}modifier = ?"),
            params: vec![Value::Text(m.clone())],
        });
    }
    if let Some(s) = &request.scope {
        conjuncts.push(Conjunct {
            sql: format!("{prefix}scope = ?"),
            params: vec![Value::Text(s.clone())],
        });
    }
    if let Some(c) = &request.clue {
        conjuncts.push(like_conjunct(prefix, "clue", c));
    }
    if let Some(p) = &request.parent {
        conjuncts.push(like_conjunct(prefix, "parent", p));
    }
    if let Some(t) = &request.type_like {
        conjuncts.push(like_conjunct(prefix, "type", t));
    }
    if let Some(f) = &request.file {
        conjuncts.push(file_conjunct(prefix, f));
    }
    if request.def_only {
        conjuncts.push(Conjunct {
            sql: format!("{prefix}definition = 1"),
            params: vec![],
        });
    }
    if request.usage_only {
        conjuncts.push(Conjunct {
            sql: format!("{prefix}definition = 0"),
            params: vec![],
        });
    }
    if let Some(name) = &request.within {
        let spans = resolve_within(conn, name)?;
        conjuncts.push(within_conjunct(prefix, &spans));
    }

    if conjuncts.is_empty() {
        return Ok(("1=1".to_owned(), Vec::new()));
    }

    let sql = conjuncts
        .iter()
        .map(|c| c.sql.clone())
        .collect::<Vec<_>>()
        .join(" AND ");
    let params = conjuncts.into_iter().flat_map(|c| c.params).collect();
    Ok((sql, params))
}

fn build_where(conn: &Connection, request: &QueryRequest) -> Result<(String, Vec<Value>), QueryError> {
    build_where_prefixed(conn, request, "")
}

/// `--and N`: lines where every positional pattern appears within `N`
/// source lines of each other (N=0 means same line), via a self-join
/// chain on `(directory, filename)` with a line-distance constraint.
fn build_co_occurrence(
    conn: &Connection,
    request: &QueryRequest,
    distance: u32,
) -> Result<(String, Vec<Value>), QueryError> {
    if request.patterns.len() < 2 {
        return Err(QueryError::TooFewCoOccurrencePatterns(request.patterns.len()));
    }

    let (base_where, base_params) = build_where_prefixed(conn, request, "t0.")?;

    let mut sql = String::from("SELECT t0.* FROM code_index t0");
    let mut params = Vec::new();

    for (i, pattern) in request.patterns.iter().enumerate().skip(1) {
        sql.push_str(&format!(
            " JOIN code_index t{i} ON t{i}.directory = t0.directory AND t{i}.filename = t0.filename \
              AND ABS(t{i}.line - t0.line) <= ? AND t{i}.symbol LIKE ?"
        ));
        params.push(Value::Integer(distance as i64));
        params.push(Value::Text(pattern.clone()));
    }

    sql.push_str(&format!(" WHERE t0.symbol LIKE ? AND ({base_where})"));
    params.insert(0, Value::Text(request.patterns[0].clone()));
    params.extend(base_params);

    Ok((sql, params))
}

/// Compile and run `request` against `conn`, returning every matching
/// row with no implicit ordering (spec §5: "no guaranteed order
/// unless `ORDER BY` is requested").
pub fn run(conn: &Connection, request: &QueryRequest) -> Result<Vec<QueryRow>, QueryError> {
    request.validate_columns()?;

    let (where_sql, mut params) = match request.and_distance {
        Some(distance) => build_co_occurrence(conn, request, distance)?,
        None => {
            let (where_sql, params) = build_where(conn, request)?;
            (format!("SELECT * FROM code_index WHERE {where_sql}"), params)
        }
    };

    let sql = apply_limits(&where_sql, request, &mut params);

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(params.iter()), QueryRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn apply_limits(select_sql: &str, request: &QueryRequest, params: &mut Vec<Value>) -> String {
    let mut sql = select_sql.to_owned();

    if let Some(per_file) = request.limit_per_file {
        sql = format!(
            "SELECT * FROM (SELECT *, ROW_NUMBER() OVER (PARTITION BY directory, filename ORDER BY line) AS rn FROM ({sql})) WHERE rn <= ?"
        );
        params.push(Value::Integer(per_file as i64));
    }

    if let Some(limit) = request.limit {
        sql = format!("{sql} LIMIT ?");
        params.push(Value::Integer(limit as i64));
    }

    sql
}

/// Distinct file paths matching `request`'s predicates, for `--files`.
pub fn run_files(conn: &Connection, request: &QueryRequest) -> Result<Vec<String>, QueryError> {
    let (where_sql, params) = build_where(conn, request)?;
    let sql = format!("SELECT DISTINCT directory || filename FROM code_index WHERE {where_sql}");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(params.iter()), |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Per-file table of contents: functions and types defined in the
/// file, in definition order, for `--toc`.
pub fn run_toc(conn: &Connection, request: &QueryRequest) -> Result<Vec<QueryRow>, QueryError> {
    let (mut where_sql, mut params) = build_where(conn, request)?;
    where_sql.push_str(" AND definition = 1 AND context IN ('function', 'type', 'enum')");
    let sql = format!("SELECT * FROM code_index WHERE {where_sql} ORDER BY directory, filename, line");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(params.drain(..)), QueryRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Occurrence;
    use crate::storage::StorageEngine;
    use tempfile::tempdir;

    fn seeded_engine() -> (tempfile::TempDir, StorageEngine) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("code-index.db");
        let mut engine = StorageEngine::open(&db_path).unwrap();

        let occurrences = vec![
            Occurrence::new("f", 1, OccurrenceContext::Function, "./go/", "a.go")
                .as_definition(crate::model::SourceLocation {
                    start_line: 1,
                    start_col: 1,
                    end_line: 10,
                    end_col: 1,
                }),
            Occurrence::new("v", 4, OccurrenceContext::Variable, "./go/", "a.go").with_clue("select"),
            Occurrence::new("v", 2, OccurrenceContext::Variable, "./go/", "a.go"),
        ];
        engine.reindex_file("./go/", "a.go", &occurrences).unwrap();

        let other = vec![Occurrence::new("f", 1, OccurrenceContext::Function, "./mygo/", "b.go")];
        engine.reindex_file("./mygo/", "b.go", &other).unwrap();

        (dir, engine)
    }

    #[test]
    fn file_boundary_pattern_excludes_non_boundary_match() {
        let (_dir, engine) = seeded_engine();
        let request = QueryRequest {
            patterns: vec!["f".to_owned()],
            file: Some("go/%".to_owned()),
            ..Default::default()
        };
        let rows = run(engine.connection(), &request).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].directory, "./go/");
    }

    #[test]
    fn def_only_filters_to_definitions() {
        let (_dir, engine) = seeded_engine();
        let request = QueryRequest {
            patterns: vec!["%".to_owned()],
            def_only: true,
            file: Some("go/%".to_owned()),
            ..Default::default()
        };
        let rows = run(engine.connection(), &request).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].symbol, "f");
    }

    #[test]
    fn within_restricts_to_definitions_body_lines() {
        let (_dir, engine) = seeded_engine();
        let request = QueryRequest {
            patterns: vec!["v".to_owned()],
            within: Some("f".to_owned()),
            ..Default::default()
        };
        let rows = run(engine.connection(), &request).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn within_unknown_target_is_a_query_error() {
        let (_dir, engine) = seeded_engine();
        let request = QueryRequest {
            patterns: vec!["v".to_owned()],
            within: Some("nope".to_owned()),
            ..Default::default()
        };
        let err = run(engine.connection(), &request).unwrap_err();
        assert!(matches!(err, QueryError::UnknownWithinTarget(_)));
    }

    #[test]
    fn and_requires_at_least_two_patterns() {
        let (_dir, engine) = seeded_engine();
        let request = QueryRequest {
            patterns: vec!["f".to_owned()],
            and_distance: Some(0),
            ..Default::default()
        };
        let err = run(engine.connection(), &request).unwrap_err();
        assert!(matches!(err, QueryError::TooFewCoOccurrencePatterns(1)));
    }

    #[test]
    fn unknown_column_in_columns_flag_is_rejected() {
        let request = QueryRequest {
            columns: Some(vec!["bogus".to_owned()]),
            ..Default::default()
        };
        assert!(matches!(
            request.validate_columns(),
            Err(QueryError::UnknownColumn(_))
        ));
    }
}
