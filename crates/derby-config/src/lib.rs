//! Configuration for the Derby app bundler.
//!
//! Settings are layered with `figment`: built-in defaults, then a
//! `derby.toml` file, then `DERBY_`-prefixed environment variables, then
//! whatever the caller merges on top (usually CLI flags).

pub mod app;
pub mod bundle;
pub mod config;
pub mod error;

pub use app::{AppConfig, DEFAULT_FRAMEWORK, DEFAULT_VIEWS_MODULE};
pub use bundle::BundleOptions;
pub use config::{CONFIG_FILE_NAME, DerbyConfig, is_production_env};
pub use error::{ConfigError, Result};
