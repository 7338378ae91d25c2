//! Command-line interface for the Derby app bundler.
//!
//! - [`cli`] - argument definitions
//! - [`commands`] - one module per subcommand
//! - [`error`] - CLI errors and their miette rendering
//! - [`logger`] - tracing subscriber setup
//! - [`ui`] - status messages on stderr

pub mod cli;
pub mod commands;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{CliError, Result};
