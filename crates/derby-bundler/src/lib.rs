#![cfg_attr(docsrs, feature(doc_cfg))]

//! # derby-bundler
//!
//! Bundles a Derby app's client code for the browser with Rolldown and
//! publishes the result as content-hashed files plus a `<script>` tag.
//!
//! The pieces, leaf first:
//!
//! - [`ByteSink`] buffers streamed output until the bundle is finished.
//! - [`RolldownBackend`] runs Rolldown and hands back code plus an external
//!   source map.
//! - [`App::bundle`] injects the generated views module, exposes the
//!   framework package, hashes the output and fills in build placeholders.
//! - [`App::write_scripts`] writes `{dir}/derby/{name}-{hash}.js` (and its
//!   `.map.json`) and records the resulting [`ScriptArtifact`].
//! - [`App::on_html_done`] appends the script tag to a rendered page.
//!
//! ## Quick Start
//!
//! ```no_run
//! use derby_bundler::{App, AppConfig, BundleOptions, RolldownBackend};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let app = App::new(AppConfig::new("blog", "./src/client.js"));
//! app.register_view("home", "<h1>{{title}}</h1>");
//!
//! let backend = RolldownBackend::new(false);
//! let artifact = app
//!     .write_scripts(&backend, "./public".as_ref(), &BundleOptions::new())
//!     .await?;
//! println!("serving {}", artifact.script_url);
//! # Ok(()) }
//! ```

pub mod app;
pub mod backend;
pub mod byte_sink;
pub mod diagnostics;
pub mod html;
pub mod plugins;
pub mod setup;
pub mod views;
pub mod watch;
pub mod writer;

// Logging utilities (optional, enabled with "logging" feature)
#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub mod logging;

#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub use logging::{
    LogLevel, init_logging, init_logging_exact, init_logging_from_env, init_logging_with,
};

pub use app::{App, AppBundle, BUNDLED_AT_TOKEN, SCRIPT_HASH_TOKEN, content_hash};
pub use backend::{BUNDLE_DEBUG_ENV, BundleBackend, BundleResult, RolldownBackend};
pub use byte_sink::ByteSink;
pub use derby_config::{AppConfig, BundleOptions, DerbyConfig};
pub use html::script_tag;
pub use setup::{BundleSetup, BundleStep, SharedBundleStep};
pub use views::{ViewOptions, ViewRegistry};
pub use watch::{BundleWatcher, FileChange, RefreshEvent, RefreshHub};
pub use writer::{ScriptArtifact, cleanup_stale_bundles};

use std::path::PathBuf;

/// Error types for derby-bundler operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The bundler rejected the build (missing entry, unresolvable import,
    /// transform failure).
    #[error("Bundle failed: {}", format_bundle_error(.0))]
    Bundle(Vec<diagnostics::BundleDiagnostic>),

    /// A package the bundle depends on could not be located.
    #[error("Cannot resolve '{specifier}' from {}: {reason}", .from.display())]
    Resolution {
        specifier: String,
        from: PathBuf,
        reason: String,
    },

    /// Filesystem operation failed.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The app has no written bundle to reference yet.
    #[error("App '{0}' has not written its scripts yet")]
    NotBundled(String),

    /// Appending to a rendered page failed.
    #[error("Failed to write page output")]
    Render(#[from] std::fmt::Error),

    /// File watching could not be set up.
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),
}

/// Result type alias for derby-bundler operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a bundle error from a Rolldown error.
    pub fn from_rolldown_batch(error: &dyn std::fmt::Debug) -> Self {
        Error::Bundle(diagnostics::extract_from_rolldown_error(error))
    }

    /// Wrap an I/O error with the path it happened at.
    pub fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Error::Io { path, source }
    }
}

impl From<derby_config::ConfigError> for Error {
    fn from(err: derby_config::ConfigError) -> Self {
        Error::InvalidConfig(err.to_string())
    }
}

fn format_bundle_error(diagnostics: &[diagnostics::BundleDiagnostic]) -> String {
    match diagnostics {
        [] => "Unknown bundler error".to_string(),
        [diag] => format!("{}: {}", diag.kind, diag.message),
        _ => format!(
            "{} errors: {}",
            diagnostics.len(),
            diagnostics
                .iter()
                .map(|d| format!("{}: {}", d.kind, d.message))
                .collect::<Vec<_>>()
                .join("; ")
        ),
    }
}

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::Bundle(_) => "BUNDLE_FAILED",
            Error::Resolution { .. } => "RESOLUTION_FAILED",
            Error::Io { .. } => "IO_ERROR",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::NotBundled(_) => "NOT_BUNDLED",
            Error::Render(_) => "RENDER_FAILED",
            Error::Watch(_) => "WATCH_ERROR",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::Bundle(diagnostics) => match diagnostics.as_slice() {
                [diag] => diag
                    .help
                    .as_ref()
                    .map(|h| Box::new(h.clone()) as Box<dyn std::fmt::Display>),
                _ => Some(Box::new(
                    "Multiple bundler errors occurred. See details above.".to_string(),
                )),
            },
            Error::Resolution { specifier, .. } => Some(Box::new(format!(
                "Install '{}' next to the app entry (node_modules) or change app.framework.",
                specifier
            ))),
            Error::Io { path, .. } => Some(Box::new(format!(
                "Check that the parent of '{}' exists and is writable.",
                path.display()
            ))),
            Error::NotBundled(_) => Some(Box::new(
                "Call App::write_scripts before rendering pages.".to_string(),
            )),
            _ => None,
        }
    }
}
