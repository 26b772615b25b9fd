//! Shared helpers for the timedhash command line tools

pub mod output;

/// Initialize logging.
///
/// Default: no logs (clean JSON output for parsing). Verbose: Info level.
/// `RUST_LOG` is still honoured for per-module filters.
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Off
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}
