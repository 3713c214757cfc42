//! Result formatting and the post-fetch enrichments `qi` applies
//! after the SQL stage: `-e` literal-span splicing and `-C`/`-A`/`-B`
//! surrounding-line context (spec §4.6). Both read the original
//! source file, so they run after the query, not as part of it.

use std::fs;
use std::path::Path;

use crate::model::SourceLocation;
use crate::storage::schema;

use super::compiler::QueryRow;

/// Which columns to print and what post-fetch enrichment to apply.
/// Built by `src/bin/qi.rs` from the parsed CLI flags.
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub columns: Vec<&'static str>,
    pub splice: bool,
    pub context_before: u32,
    pub context_after: u32,
}

impl Default for OutputOptions {
    /// The default column set: enough to locate and identify a row
    /// without the noise of every nullable facet. `-v`/`--columns`
    /// override this.
    fn default() -> Self {
        OutputOptions {
            columns: vec!["directory", "filename", "line", "symbol", "context"],
            splice: false,
            context_before: 0,
            context_after: 0,
        }
    }
}

impl OutputOptions {
    pub fn all_columns() -> Vec<&'static str> {
        schema::all_columns()
    }

    pub fn wants_context(&self) -> bool {
        self.context_before > 0 || self.context_after > 0
    }
}

fn column_value(row: &QueryRow, column: &str) -> String {
    match column {
        "directory" => row.directory.clone(),
        "filename" => row.filename.clone(),
        "line" => row.line.to_string(),
        "symbol" => row.symbol.clone(),
        "context" => row.context.clone(),
        "source_location" => row.source_location.clone().unwrap_or_default(),
        "parent" => row.parent.clone().unwrap_or_default(),
        "scope" => row.scope.clone().unwrap_or_default(),
        "modifier" => row.modifier.clone().unwrap_or_default(),
        "clue" => row.clue.clone().unwrap_or_default(),
        "namespace" => row.namespace.clone().unwrap_or_default(),
        "type" => row.r#type.clone().unwrap_or_default(),
        "definition" => if row.definition { "1" } else { "0" }.to_owned(),
        _ => String::new(),
    }
}

/// Render one row as tab-separated selected-column values, the way a
/// script piping `qi`'s output would want to `cut -f` it.
pub fn format_row(row: &QueryRow, options: &OutputOptions) -> String {
    options
        .columns
        .iter()
        .map(|c| column_value(row, c))
        .collect::<Vec<_>>()
        .join("\t")
}

pub fn format_rows(rows: &[QueryRow], options: &OutputOptions) -> Vec<String> {
    let mut lines: Vec<String> = rows.iter().map(|row| format_row(row, options)).collect();

    if options.splice {
        for (row, line) in rows.iter().zip(lines.iter_mut()) {
            if let Some(spliced) = splice_literal_span(row) {
                line.push_str("\n");
                line.push_str(&spliced);
            }
        }
    }

    if options.wants_context() {
        for (row, line) in rows.iter().zip(lines.iter_mut()) {
            if let Some(context) = surrounding_lines(row, options.context_before, options.context_after) {
                line.push('\n');
                line.push_str(&context);
            }
        }
    }

    lines
}

fn read_source_lines(row: &QueryRow) -> Option<Vec<String>> {
    let path = Path::new(&row.directory).join(&row.filename);
    let contents = fs::read_to_string(&path).ok()?;
    Some(contents.lines().map(str::to_owned).collect())
}

/// `-e`: splice in the literal span of a definition's source, per
/// spec §4.6. No-op for rows without a `source_location`.
fn splice_literal_span(row: &QueryRow) -> Option<String> {
    let location = SourceLocation::parse(row.source_location.as_deref()?)?;
    let lines = read_source_lines(row)?;

    let start = (location.start_line as usize).saturating_sub(1);
    let end = (location.end_line as usize).saturating_sub(1);
    if start >= lines.len() || end >= lines.len() || start > end {
        return None;
    }

    let mut span: Vec<String> = lines[start..=end].to_vec();
    if let Some(first) = span.first_mut() {
        *first = char_slice_from(first, location.start_col as usize);
    }
    if span.len() == 1 {
        let truncate_at = (location.end_col as usize).min(span[0].chars().count());
        span[0] = span[0].chars().take(truncate_at).collect();
    } else if let Some(last) = span.last_mut() {
        let truncate_at = (location.end_col as usize).min(last.chars().count());
        *last = last.chars().take(truncate_at).collect();
    }

    Some(span.join("\n"))
}

fn char_slice_from(line: &str, start_col: usize) -> String {
    line.chars().skip(start_col.saturating_sub(1)).collect()
}

/// `-C`/`-A`/`-B`: render `before`/`after` lines of surrounding source
/// around `row.line`.
fn surrounding_lines(row: &QueryRow, before: u32, after: u32) -> Option<String> {
    let lines = read_source_lines(row)?;
    let center = (row.line as usize).saturating_sub(1);
    let start = center.saturating_sub(before as usize);
    let end = (center + after as usize).min(lines.len().saturating_sub(1));
    if start >= lines.len() {
        return None;
    }
    Some(lines[start..=end.min(lines.len() - 1)].join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(line: u32, location: Option<&str>) -> QueryRow {
        QueryRow {
            directory: "".to_owned(),
            filename: "".to_owned(),
            line,
            symbol: "f".to_owned(),
            context: "function".to_owned(),
            source_location: location.map(str::to_owned),
            parent: None,
            scope: None,
            modifier: None,
            clue: None,
            namespace: None,
            r#type: Some("int".to_owned()),
            definition: true,
        }
    }

    #[test]
    fn format_row_uses_default_columns() {
        let r = row(1, None);
        let out = format_row(&r, &OutputOptions::default());
        assert_eq!(out, "\t\t1\tf\tfunction");
    }

    #[test]
    fn format_row_with_explicit_columns() {
        let r = row(1, None);
        let options = OutputOptions {
            columns: vec!["symbol", "type"],
            ..OutputOptions::default()
        };
        assert_eq!(format_row(&r, &options), "f\tint");
    }
}
