//! Identity and delivery settings for one Derby app.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Default specifier of the generated views module.
pub const DEFAULT_VIEWS_MODULE: &str = "derby-bundler/_views";

/// Default name the framework library is exposed under inside the bundle.
pub const DEFAULT_FRAMEWORK: &str = "derby";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// App name; prefixes every bundle filename.
    pub name: String,

    /// Entry file of the client bundle.
    pub filename: PathBuf,

    /// Public URL prefix for scripts, e.g. a CDN origin. Empty means same origin.
    #[serde(alias = "scriptBaseUrl")]
    pub script_base_url: String,

    /// Public URL prefix for source maps.
    #[serde(alias = "scriptMapBaseUrl")]
    pub script_map_base_url: String,

    /// Development mode: prune stale bundles, and let the watch loop rebuild
    /// on change.
    #[serde(alias = "watchFiles")]
    pub watch_files: bool,

    /// Emit `crossorigin` on the script tag.
    #[serde(alias = "scriptCrossOrigin")]
    pub script_cross_origin: bool,

    /// Package resolved from the entry's directory and exposed by name.
    pub framework: String,

    /// Specifier whose content is replaced with the generated views source.
    #[serde(alias = "viewsModule")]
    pub views_module: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            filename: PathBuf::new(),
            script_base_url: String::new(),
            script_map_base_url: String::new(),
            watch_files: false,
            script_cross_origin: false,
            framework: DEFAULT_FRAMEWORK.to_string(),
            views_module: DEFAULT_VIEWS_MODULE.to_string(),
        }
    }
}

impl AppConfig {
    pub fn new(name: impl Into<String>, filename: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            filename: filename.into(),
            ..Default::default()
        }
    }

    pub fn script_base_url(mut self, url: impl Into<String>) -> Self {
        self.script_base_url = url.into();
        self
    }

    pub fn script_map_base_url(mut self, url: impl Into<String>) -> Self {
        self.script_map_base_url = url.into();
        self
    }

    pub fn watch_files(mut self, watch: bool) -> Self {
        self.watch_files = watch;
        self
    }

    pub fn script_cross_origin(mut self, cross_origin: bool) -> Self {
        self.script_cross_origin = cross_origin;
        self
    }

    pub fn framework(mut self, framework: impl Into<String>) -> Self {
        self.framework = framework.into();
        self
    }

    pub fn views_module(mut self, specifier: impl Into<String>) -> Self {
        self.views_module = specifier.into();
        self
    }

    /// Check the fields bundle filenames and URLs are built from.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "app.name".to_string(),
                hint: "every app needs a name; it prefixes the bundle filenames".to_string(),
            });
        }
        if self.name.contains(['/', '\\']) {
            return Err(ConfigError::InvalidValue {
                field: "app.name".to_string(),
                hint: format!("'{}' must not contain path separators", self.name),
            });
        }
        if self.filename.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "app.filename".to_string(),
                hint: "set the client entry file".to_string(),
            });
        }
        Ok(())
    }
}
