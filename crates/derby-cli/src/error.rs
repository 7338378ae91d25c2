//! CLI error type and its miette rendering.

use std::path::PathBuf;

use miette::Report;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] derby_config::ConfigError),

    /// Bundling or writing the scripts failed
    #[error(transparent)]
    Bundle(#[from] derby_bundler::Error),

    /// Invalid command-line arguments or options
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;

/// Convert a CLI error into a report; bundler errors keep their codes and
/// help text.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Bundle(e) => Report::new(e),
        CliError::FileNotFound(path) => miette::miette!(
            help = "Pass --entry or set app.filename in derby.toml",
            "File not found: {}",
            path.display()
        ),
        _ => miette::miette!("{}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundler_errors_keep_diagnostic_code() {
        let report = cli_error_to_miette(CliError::Bundle(derby_bundler::Error::NotBundled(
            "app".into(),
        )));
        let code = report.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("NOT_BUNDLED"));
    }

    #[test]
    fn config_errors_are_prefixed() {
        let err = CliError::Config(derby_config::ConfigError::NotFound("derby.toml".into()));
        assert!(err.to_string().starts_with("Configuration error:"));
    }
}
