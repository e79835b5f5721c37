//! Logging init: structured logs to stderr, stdout stays clean for output.

use tracing_subscriber::EnvFilter;

/// Initialize structured logging to stderr.
///
/// `RUST_LOG` overrides the default filter. With `verbose` the batchform
/// crates log at debug level.
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "info,batchform=debug,batchform_cli=debug"
    } else {
        "info"
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}
