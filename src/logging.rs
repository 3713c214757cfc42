//! Log-level wiring for `--quiet`/`--verbose`/`--debug` (spec §6.1),
//! built on `tracing` the way `pustynsky-search-index` wires its
//! subscriber.

use tracing_subscriber::EnvFilter;

/// The three log levels `index-<language>` accepts, plus the implicit
/// default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    Debug,
}

impl Verbosity {
    pub fn from_flags(quiet: bool, verbose: bool, debug: bool) -> Self {
        if debug {
            Verbosity::Debug
        } else if verbose {
            Verbosity::Verbose
        } else if quiet {
            Verbosity::Quiet
        } else {
            Verbosity::Normal
        }
    }

    fn filter_directive(self) -> &'static str {
        match self {
            Verbosity::Quiet => "sourceminder=error",
            Verbosity::Normal => "sourceminder=warn",
            Verbosity::Verbose => "sourceminder=info",
            Verbosity::Debug => "sourceminder=debug",
        }
    }
}

/// Install the global `tracing` subscriber. Must be called exactly
/// once, at binary startup, before any indexing or query work begins.
pub fn init(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Emit a per-handler debug trace carrying the handler's call site and
/// the source position it is handling, per spec §4.4.6/§9's
/// debug-trace requirement. A macro so `file!()`/`line!()` capture the
/// handler's own location, not `logging`'s.
#[macro_export]
macro_rules! handler_trace {
    ($node_kind:expr, $path:expr, $line:expr) => {
        ::tracing::debug!(
            handler_site = concat!(file!(), ":", line!()),
            node_kind = $node_kind,
            path = %$path,
            source_line = $line,
            "handler invoked",
        );
    };
}
