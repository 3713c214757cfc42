//! `index-c` binary (spec §6.1): thin clap wrapper around
//! [`sourceminder::index_run::run`] for the C walker.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use sourceminder::index_run::{self, LanguageWalker, RunOptions};
use sourceminder::logging::{self, Verbosity};
use sourceminder::walker::c;

/// Index C source files into the embedded code index.
#[derive(Parser, Debug)]
#[command(name = "index-c")]
struct Cli {
    /// Root paths to walk.
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Index, commit, and exit instead of watching for changes.
    #[arg(long)]
    once: bool,

    #[arg(long)]
    quiet: bool,

    #[arg(long)]
    verbose: bool,

    #[arg(long)]
    debug: bool,

    /// Path to the embedded SQLite database file.
    #[arg(long, default_value = "code-index.db")]
    db_file: PathBuf,

    /// Root directory holding per-language config subdirectories.
    #[arg(long, default_value = "config")]
    config_root: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(Verbosity::from_flags(cli.quiet, cli.verbose, cli.debug));

    let walker = LanguageWalker {
        name: "c",
        language: c::language(),
        node_kind_ids: c::node_kind_ids(),
        walk: c::walk,
        default_extensions: &["c", "h"],
    };

    let options = RunOptions {
        paths: cli.paths,
        once: cli.once,
        db_file: cli.db_file,
        config_root: cli.config_root,
        debug: cli.debug,
    };

    match index_run::run(&walker, options) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("index-c: {err}");
            ExitCode::FAILURE
        }
    }
}
