use crate::args::{LOG_LEVEL, VERBOSITY};
use clap::ArgMatches;
use gcplog::logger::FallbackToStderr;
use slog::{o, Drain, Level, Logger};
use slog_async::Async;
use slog_term::{CompactFormat, TermDecorator};

/// The logger for gcplog's own diagnostics. It writes to stderr so it never mixes with what
/// is being forwarded.
pub fn create_logger(arg_matches: &ArgMatches) -> Result<Logger, String> {
    let min_log_level = match arg_matches.occurrences_of(VERBOSITY) {
        0 => Level::Warning,
        1 => Level::Info,
        2 => Level::Debug,
        _ => Level::Trace,
    };

    let min_log_level = match arg_matches.value_of(LOG_LEVEL) {
        Some(level) => gcplog::parse_level(level).map_err(|e| e.to_string())?,
        None => min_log_level,
    };

    let decorator = TermDecorator::new().stderr().build();
    let term_drain = CompactFormat::new(decorator)
        .build()
        .filter_level(min_log_level)
        .map(|drain| FallbackToStderr { drain })
        .fuse();

    let drain = Async::new(term_drain).build().fuse();
    Ok(Logger::root(drain, o!()))
}
