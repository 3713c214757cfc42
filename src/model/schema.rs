//! The extensible column schema: the single table that the storage
//! DDL, the prepared insert statement, and the query column whitelist
//! all read from instead of hard-coding a column list.

/// The SQL storage type backing an extensible column. Every column in
/// [`EXTENSIBLE_COLUMNS`] is nullable text except where noted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Boolean,
}

impl ColumnKind {
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnKind::Text => "TEXT",
            ColumnKind::Boolean => "INTEGER",
        }
    }
}

/// One extensible (nullable, facet) column of the `code_index` table.
///
/// `name` is both the struct field name on [`crate::model::Occurrence`]
/// (via `r#type` for the `type` column) and the SQL column name. The
/// `--columns` whitelist in `query::compiler` iterates this array
/// rather than listing columns itself; the per-flag predicates
/// (`-m`/`-s`/`-c`/`-p`/`-t`/`--def`) in `build_where_prefixed` do not,
/// since each flag's match semantics differ (exact equality for
/// `modifier`/`scope`, `LIKE` wildcards for `clue`/`parent`/`type`, a
/// pair of boolean flags for `definition`) and `namespace` has no
/// dedicated query flag at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensibleColumn {
    pub name: &'static str,
    pub kind: ColumnKind,
}

/// Source of truth for every extensible column `spec.md` §3.1 defines:
/// `parent`, `scope`, `modifier`, `clue`, `namespace`, `type`, plus
/// `definition` which doubles as a boolean marker and a `qi --def`/
/// `--usage` filter.
pub const EXTENSIBLE_COLUMNS: &[ExtensibleColumn] = &[
    ExtensibleColumn { name: "parent", kind: ColumnKind::Text },
    ExtensibleColumn { name: "scope", kind: ColumnKind::Text },
    ExtensibleColumn { name: "modifier", kind: ColumnKind::Text },
    ExtensibleColumn { name: "clue", kind: ColumnKind::Text },
    ExtensibleColumn { name: "namespace", kind: ColumnKind::Text },
    ExtensibleColumn { name: "type", kind: ColumnKind::Text },
    ExtensibleColumn { name: "definition", kind: ColumnKind::Boolean },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_column_has_a_unique_name() {
        let mut names: Vec<&str> = EXTENSIBLE_COLUMNS.iter().map(|c| c.name).collect();
        names.sort_unstable();
        let mut deduped = names.clone();
        deduped.dedup();
        assert_eq!(names, deduped);
    }

    #[test]
    fn boolean_column_maps_to_integer_sql_type() {
        let def = EXTENSIBLE_COLUMNS
            .iter()
            .find(|c| c.name == "definition")
            .unwrap();
        assert_eq!(def.kind.sql_type(), "INTEGER");
    }
}
