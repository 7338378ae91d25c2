//! Logging setup for binaries embedding derby-bundler.
//!
//! Only available with the `logging` feature. Libraries should install
//! their own subscriber; derby-bundler only emits `tracing` events.

use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Log level for bundler output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Silent,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    /// Includes per-module events from Rolldown.
    Trace,
}

/// Crates whose events follow the chosen level; everything else, Rolldown
/// included, stays at warn below [`LogLevel::Trace`].
const DERBY_TARGETS: [&str; 3] = ["derby_bundler", "derby_config", "derby_cli"];

impl LogLevel {
    fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Silent => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// `EnvFilter` directives for this level.
    pub fn directives(&self) -> String {
        match self {
            LogLevel::Silent | LogLevel::Error | LogLevel::Trace => self.as_str().to_string(),
            level => {
                let mut directives = String::from("warn");
                for target in DERBY_TARGETS {
                    directives.push_str(&format!(",{target}={}", level.as_str()));
                }
                directives
            }
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "off" => Ok(LogLevel::Silent),
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!("Invalid log level: {}", other)),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Install a stderr subscriber at `level`; `RUST_LOG` still wins when set.
///
/// Only the first call per process takes effect.
///
/// ```rust,no_run
/// use derby_bundler::logging::{init_logging, LogLevel};
///
/// init_logging(LogLevel::Info);
/// ```
pub fn init_logging(level: LogLevel) {
    init_logging_with(level, true);
}

/// Like [`init_logging`], with control over ANSI colors.
pub fn init_logging_with(level: LogLevel, ansi: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.directives()));
    install(filter, ansi);
}

/// Install at exactly `level`, ignoring `RUST_LOG`. For explicit
/// verbosity flags.
pub fn init_logging_exact(level: LogLevel, ansi: bool) {
    install(EnvFilter::new(level.directives()), ansi);
}

/// Initialize logging from `RUST_LOG`, falling back to info.
pub fn init_logging_from_env() {
    init_logging_with(LogLevel::Info, true);
}

fn install(filter: EnvFilter, ansi: bool) {
    INIT.call_once(|| {
        // Another subscriber may already be installed by the host.
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_ansi(ansi)
                    .with_writer(std::io::stderr)
                    .without_time(),
            )
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_from_str() {
        assert_eq!("info".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("off".parse::<LogLevel>().unwrap(), LogLevel::Silent);
        assert_eq!("TRACE".parse::<LogLevel>().unwrap(), LogLevel::Trace);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn log_level_display() {
        assert_eq!(LogLevel::Debug.to_string(), "debug");
        assert_eq!(LogLevel::Silent.to_string(), "off");
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn derby_crates_follow_the_level() {
        assert_eq!(
            LogLevel::Debug.directives(),
            "warn,derby_bundler=debug,derby_config=debug,derby_cli=debug"
        );
        assert!(LogLevel::Info.directives().contains("derby_cli=info"));
    }

    #[test]
    fn extreme_levels_apply_everywhere() {
        assert_eq!(LogLevel::Silent.directives(), "off");
        assert_eq!(LogLevel::Error.directives(), "error");
        assert_eq!(LogLevel::Trace.directives(), "trace");
    }

    #[test]
    fn directives_parse_as_filters() {
        for level in [LogLevel::Warn, LogLevel::Info, LogLevel::Debug] {
            assert!(EnvFilter::try_new(level.directives()).is_ok(), "{level}");
        }
    }
}
