//! `index-python` binary (spec §6.1): thin clap wrapper around
//! [`sourceminder::index_run::run`] for the Python walker.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use sourceminder::index_run::{self, LanguageWalker, RunOptions};
use sourceminder::logging::{self, Verbosity};
use sourceminder::walker::python;

/// Index Python source files into the embedded code index.
#[derive(Parser, Debug)]
#[command(name = "index-python")]
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
        name: "python",
        language: python::language(),
        node_kind_ids: python::node_kind_ids(),
        walk: python::walk,
        default_extensions: &["py"],
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
            eprintln!("index-python: {err}");
            ExitCode::FAILURE
        }
    }
}
