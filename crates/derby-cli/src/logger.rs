//! Logging setup for the CLI, on top of `derby_bundler::logging`.

use derby_bundler::{LogLevel, init_logging_exact, init_logging_with};

/// Install the global subscriber.
///
/// `--verbose` and `--quiet` pin the level. Without either, `RUST_LOG` is
/// honored and falls back to info for the derby crates.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    match level_for(verbose, quiet) {
        Some(level) => init_logging_exact(level, !no_color),
        None => init_logging_with(LogLevel::Info, !no_color),
    }
}

fn level_for(verbose: bool, quiet: bool) -> Option<LogLevel> {
    if verbose {
        Some(LogLevel::Debug)
    } else if quiet {
        Some(LogLevel::Error)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_wins_over_quiet() {
        assert_eq!(level_for(true, true), Some(LogLevel::Debug));
    }

    #[test]
    fn quiet_is_errors_only() {
        assert_eq!(level_for(false, true), Some(LogLevel::Error));
        assert_eq!(LogLevel::Error.directives(), "error");
    }

    #[test]
    fn no_flag_defers_to_the_environment() {
        assert_eq!(level_for(false, false), None);
    }
}
