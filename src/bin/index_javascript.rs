//! `index-javascript` binary (spec §6.1): thin clap wrapper around
//! [`sourceminder::index_run::run`] for the JavaScript walker.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use sourceminder::index_run::{self, LanguageWalker, RunOptions};
use sourceminder::logging::{self, Verbosity};
use sourceminder::walker::javascript;

/// Index JavaScript source files into the embedded code index.
#[derive(Parser, Debug)]
#[command(name = "index-javascript")]
struct Cli {
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    #[arg(long)]
    once: bool,

    #[arg(long)]
    quiet: bool,

    #[arg(long)]
    verbose: bool,

    #[arg(long)]
    debug: bool,

    #[arg(long, default_value = "code-index.db")]
    db_file: PathBuf,

    #[arg(long, default_value = "config")]
    config_root: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(Verbosity::from_flags(cli.quiet, cli.verbose, cli.debug));

    let walker = LanguageWalker {
        name: "javascript",
        language: javascript::language(),
        node_kind_ids: javascript::node_kind_ids(),
        walk: javascript::walk,
        default_extensions: &["js", "jsx", "mjs"],
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
            eprintln!("index-javascript: {err}");
            ExitCode::FAILURE
        }
    }
}
