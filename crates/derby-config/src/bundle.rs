//! Per-invocation bundle options.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Options for a single bundle invocation.
///
/// Created per call and merged with defaults; never mutated while a
/// bundle is running.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleOptions {
    /// Minify the bundle. `None` defers to the host's production flag.
    pub minify: Option<bool>,

    /// Debug mode. The backend always forces this on because source map
    /// extraction depends on it.
    pub debug: bool,

    /// Skip writing the `.map.json` file and the trailing map comment.
    #[serde(alias = "disableScriptMap")]
    pub disable_script_map: bool,

    /// Extra entry extensions tried during resolution, e.g. `.coffee`.
    pub extensions: Vec<String>,

    /// Compile-time replacements passed through to the bundler.
    pub define: BTreeMap<String, String>,

    /// Specifiers the bundler must leave external.
    pub external: Vec<String>,
}

impl BundleOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn minify(mut self, minify: bool) -> Self {
        self.minify = Some(minify);
        self
    }

    pub fn disable_script_map(mut self, disable: bool) -> Self {
        self.disable_script_map = disable;
        self
    }

    pub fn extension(mut self, ext: impl Into<String>) -> Self {
        self.extensions.push(ext.into());
        self
    }

    pub fn define(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.define.insert(key.into(), value.into());
        self
    }

    pub fn external(mut self, specifier: impl Into<String>) -> Self {
        self.external.push(specifier.into());
        self
    }

    /// Resolve the effective minify flag against the host's production mode.
    pub fn resolve_minify(&self, production: bool) -> bool {
        self.minify.unwrap_or(production)
    }
}
