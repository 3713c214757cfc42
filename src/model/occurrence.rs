use serde::{Deserialize, Serialize};

/// The kind of thing a single occurrence represents.
///
/// This is a closed enum: languages may emit only the subset of kinds
/// that make sense for their grammar. New kinds require a matching
/// migration of the `context` column's `CHECK` constraint in
/// `storage::schema`, which is why the set lives in exactly one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccurrenceContext {
    Function,
    Variable,
    Argument,
    Type,
    Property,
    Call,
    Import,
    Enum,
    EnumCase,
    Label,
    Goto,
    Lambda,
    Exception,
    Namespace,
    Comment,
    String,
    Filename,
}

impl OccurrenceContext {
    /// Stable lowercase wire form, used both for storage and for the
    /// `qi -i`/`-x` short forms.
    pub fn as_str(self) -> &'static str {
        match self {
            OccurrenceContext::Function => "function",
            OccurrenceContext::Variable => "variable",
            OccurrenceContext::Argument => "argument",
            OccurrenceContext::Type => "type",
            OccurrenceContext::Property => "property",
            OccurrenceContext::Call => "call",
            OccurrenceContext::Import => "import",
            OccurrenceContext::Enum => "enum",
            OccurrenceContext::EnumCase => "enum_case",
            OccurrenceContext::Label => "label",
            OccurrenceContext::Goto => "goto",
            OccurrenceContext::Lambda => "lambda",
            OccurrenceContext::Exception => "exception",
            OccurrenceContext::Namespace => "namespace",
            OccurrenceContext::Comment => "comment",
            OccurrenceContext::String => "string",
            OccurrenceContext::Filename => "filename",
        }
    }

    /// Parse a context, accepting both the canonical name and the
    /// short forms `qi -i`/`-x` document (`func`, `var`, `prop`, ...).
    pub fn parse(value: &str) -> Option<Self> {
        Some(match value.to_ascii_lowercase().as_str() {
            "function" | "func" | "fn" => OccurrenceContext::Function,
            "variable" | "var" => OccurrenceContext::Variable,
            "argument" | "arg" => OccurrenceContext::Argument,
            "type" | "ty" => OccurrenceContext::Type,
            "property" | "prop" => OccurrenceContext::Property,
            "call" => OccurrenceContext::Call,
            "import" | "imp" => OccurrenceContext::Import,
            "enum" => OccurrenceContext::Enum,
            "enum_case" | "enum-case" | "case" => OccurrenceContext::EnumCase,
            "label" => OccurrenceContext::Label,
            "goto" => OccurrenceContext::Goto,
            "lambda" => OccurrenceContext::Lambda,
            "exception" | "exc" => OccurrenceContext::Exception,
            "namespace" | "ns" => OccurrenceContext::Namespace,
            "comment" => OccurrenceContext::Comment,
            "string" | "str" => OccurrenceContext::String,
            "filename" | "file" => OccurrenceContext::Filename,
            _ => return None,
        })
    }
}

/// A byte/line-column span used to splice a definition's source back
/// in for `qi -e`.
///
/// Wire form is `startLine:startCol-endLine:endCol`, 1-based, matching
/// `spec.md` §3.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl SourceLocation {
    pub fn encode(&self) -> String {
        format!(
            "{}:{}-{}:{}",
            self.start_line, self.start_col, self.end_line, self.end_col
        )
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let (start, end) = raw.split_once('-')?;
        let (start_line, start_col) = start.split_once(':')?;
        let (end_line, end_col) = end.split_once(':')?;
        Some(SourceLocation {
            start_line: start_line.parse().ok()?,
            start_col: start_col.parse().ok()?,
            end_line: end_line.parse().ok()?,
            end_col: end_col.parse().ok()?,
        })
    }

    pub fn contains_line(&self, line: u32) -> bool {
        line >= self.start_line && line <= self.end_line
    }
}

/// A single indexed appearance of a symbol in source.
///
/// Fields split into key columns (required, part of the composite
/// primary key `(directory, filename, line, symbol, context)`) and
/// extensible columns (optional facets). The extensible columns here
/// must stay in lockstep with [`crate::model::EXTENSIBLE_COLUMNS`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    // -- key columns --
    pub symbol: String,
    pub line: u32,
    pub context: OccurrenceContext,
    pub directory: String,
    pub filename: String,

    // -- definition-only --
    pub source_location: Option<SourceLocation>,
    pub definition: bool,

    // -- extensible columns --
    pub parent: Option<String>,
    pub scope: Option<String>,
    pub modifier: Option<String>,
    pub clue: Option<String>,
    pub namespace: Option<String>,
    pub r#type: Option<String>,
}

impl Occurrence {
    /// Construct a reference (non-definition) occurrence with every
    /// extensible column empty. Callers fill in facets via the
    /// builder-style `with_*` methods.
    pub fn new(
        symbol: impl Into<String>,
        line: u32,
        context: OccurrenceContext,
        directory: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Occurrence {
            symbol: symbol.into(),
            line,
            context,
            directory: directory.into(),
            filename: filename.into(),
            source_location: None,
            definition: false,
            parent: None,
            scope: None,
            modifier: None,
            clue: None,
            namespace: None,
            r#type: None,
        }
    }

    pub fn as_definition(mut self, location: SourceLocation) -> Self {
        self.definition = true;
        self.source_location = Some(location);
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_modifier(mut self, modifier: impl Into<String>) -> Self {
        self.modifier = Some(modifier.into());
        self
    }

    pub fn with_clue(mut self, clue: impl Into<String>) -> Self {
        self.clue = Some(clue.into());
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_type(mut self, ty: impl Into<String>) -> Self {
        self.r#type = Some(ty.into());
        self
    }

    /// Identity tuple enforcing invariant 2 of `spec.md` §3.2:
    /// `(directory, filename, line, symbol, context)` is unique within
    /// a single indexing pass.
    pub fn identity(&self) -> (&str, &str, u32, &str, OccurrenceContext) {
        (&self.directory, &self.filename, self.line, &self.symbol, self.context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_location_round_trips_through_wire_form() {
        let loc = SourceLocation {
            start_line: 3,
            start_col: 5,
            end_line: 7,
            end_col: 2,
        };
        let encoded = loc.encode();
        assert_eq!(encoded, "3:5-7:2");
        assert_eq!(SourceLocation::parse(&encoded), Some(loc));
    }

    #[test]
    fn source_location_contains_line_is_inclusive() {
        let loc = SourceLocation {
            start_line: 10,
            start_col: 1,
            end_line: 20,
            end_col: 1,
        };
        assert!(loc.contains_line(10));
        assert!(loc.contains_line(20));
        assert!(!loc.contains_line(9));
        assert!(!loc.contains_line(21));
    }

    #[test]
    fn context_short_forms_parse_to_canonical_kind() {
        assert_eq!(OccurrenceContext::parse("func"), Some(OccurrenceContext::Function));
        assert_eq!(OccurrenceContext::parse("prop"), Some(OccurrenceContext::Property));
        assert_eq!(OccurrenceContext::parse("bogus"), None);
    }

    #[test]
    fn builder_chain_sets_definition_and_facets() {
        let loc = SourceLocation {
            start_line: 1,
            start_col: 1,
            end_line: 1,
            end_col: 10,
        };
        let occ = Occurrence::new("f", 1, OccurrenceContext::Function, "src/", "a.c")
            .as_definition(loc)
            .with_type("int")
            .with_scope("public");

        assert!(occ.definition);
        assert_eq!(occ.source_location, Some(loc));
        assert_eq!(occ.r#type.as_deref(), Some("int"));
        assert_eq!(occ.scope.as_deref(), Some("public"));
    }
}
