//! `qi` (spec §6.1, §4.6): the predicate-language query CLI over the
//! embedded code index. Parses flags with clap, builds a
//! [`QueryRequest`], and leaves compilation and execution to
//! `sourceminder::query`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use sourceminder::error::QueryError;
use sourceminder::model::OccurrenceContext;
use sourceminder::query::{self, OutputOptions, QueryRequest};
use sourceminder::storage::StorageEngine;

/// Query the code index built by the `index-<language>` tools.
#[derive(Parser, Debug)]
#[command(name = "qi")]
struct Cli {
    /// Symbol patterns, OR-joined. SQL `LIKE` wildcards (`%`, `_`).
    patterns: Vec<String>,

    #[arg(long, default_value = "code-index.db")]
    db_file: PathBuf,

    /// Include only these context kinds (repeatable).
    #[arg(short = 'i', long = "include")]
    include: Vec<String>,

    /// Exclude these context kinds (repeatable).
    #[arg(short = 'x', long = "exclude")]
    exclude: Vec<String>,

    #[arg(short = 'm', long)]
    modifier: Option<String>,

    #[arg(short = 's', long)]
    scope: Option<String>,

    #[arg(short = 'c', long)]
    clue: Option<String>,

    #[arg(short = 'p', long)]
    parent: Option<String>,

    #[arg(short = 't', long = "type")]
    type_like: Option<String>,

    #[arg(short = 'f', long)]
    file: Option<String>,

    #[arg(long)]
    def: bool,

    #[arg(long)]
    usage: bool,

    #[arg(long = "and")]
    and_distance: Option<u32>,

    #[arg(long)]
    within: Option<String>,

    #[arg(long)]
    limit: Option<u32>,

    #[arg(long)]
    limit_per_file: Option<u32>,

    /// Splice in the literal source span of each matching definition.
    #[arg(short = 'e', long)]
    splice: bool,

    /// Lines of context before and after each match.
    #[arg(short = 'C', long = "context")]
    context: Option<u32>,

    #[arg(short = 'A', long = "after-context")]
    after_context: Option<u32>,

    #[arg(short = 'B', long = "before-context")]
    before_context: Option<u32>,

    /// Per-file table of contents instead of raw matches.
    #[arg(long)]
    toc: bool,

    /// Distinct file paths only.
    #[arg(long)]
    files: bool,

    /// Explicit output columns. `-v` is shorthand for all of them.
    #[arg(long)]
    columns: Option<Vec<String>>,

    #[arg(short = 'v')]
    all_columns: bool,
}

fn parse_contexts(values: &[String]) -> Result<Vec<OccurrenceContext>, QueryError> {
    values
        .iter()
        .map(|v| OccurrenceContext::parse(v).ok_or_else(|| QueryError::UnknownContext(v.clone())))
        .collect()
}

fn build_request(cli: &Cli) -> Result<QueryRequest, QueryError> {
    Ok(QueryRequest {
        patterns: cli.patterns.clone(),
        include: parse_contexts(&cli.include)?,
        exclude: parse_contexts(&cli.exclude)?,
        modifier: cli.modifier.clone(),
        scope: cli.scope.clone(),
        clue: cli.clue.clone(),
        parent: cli.parent.clone(),
        type_like: cli.type_like.clone(),
        file: cli.file.clone(),
        def_only: cli.def,
        usage_only: cli.usage,
        and_distance: cli.and_distance,
        within: cli.within.clone(),
        limit: cli.limit,
        limit_per_file: cli.limit_per_file,
        columns: cli.columns.clone(),
    })
}

fn build_output_options(cli: &Cli) -> OutputOptions {
    let columns = if cli.all_columns {
        OutputOptions::all_columns()
    } else if let Some(names) = &cli.columns {
        names
            .iter()
            .filter_map(|name| OutputOptions::all_columns().into_iter().find(|c| *c == name))
            .collect()
    } else {
        OutputOptions::default().columns
    };

    OutputOptions {
        columns,
        splice: cli.splice,
        context_before: cli.before_context.or(cli.context).unwrap_or(0),
        context_after: cli.after_context.or(cli.context).unwrap_or(0),
    }
}

fn run(cli: &Cli) -> Result<bool, QueryError> {
    let request = build_request(cli)?;
    request.validate_columns()?;

    let engine = StorageEngine::open(&cli.db_file).map_err(|err| {
        QueryError::InvalidFlagValue {
            flag: "--db-file",
            value: err.to_string(),
        }
    })?;
    let conn = engine.connection();

    if cli.files {
        let paths = query::run_files(conn, &request)?;
        for path in &paths {
            println!("{path}");
        }
        return Ok(!paths.is_empty());
    }

    let rows = if cli.toc {
        query::run_toc(conn, &request)?
    } else {
        query::run(conn, &request)?
    };

    let options = build_output_options(cli);
    for line in query::format_rows(&rows, &options) {
        println!("{line}");
    }
    Ok(!rows.is_empty())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("qi: {err}");
            ExitCode::from(2)
        }
    }
}
