//! Pre-bundle configuration steps.
//!
//! Collaborators that need to shape a bundle (expose a package, swap in a
//! generated module, add a Rolldown plugin, observe touched files) hand the
//! backend a list of [`BundleStep`]s. The backend applies them in order to a
//! fresh [`BundleSetup`] before the entry is added.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rolldown_plugin::{__inner::SharedPluginable, Plugin};
use rustc_hash::FxHashMap;

use crate::Result;

/// Callback invoked with every file id the bundler touches.
pub type FileObserver = Arc<dyn Fn(&str) + Send + Sync>;

/// Mutable configuration for one bundle pass.
pub struct BundleSetup {
    entry: PathBuf,
    exposed: Vec<(String, PathBuf)>,
    virtual_modules: FxHashMap<String, String>,
    plugins: Vec<SharedPluginable>,
    file_observers: Vec<FileObserver>,
}

impl BundleSetup {
    pub fn new(entry: impl Into<PathBuf>) -> Self {
        Self {
            entry: entry.into(),
            exposed: Vec::new(),
            virtual_modules: FxHashMap::default(),
            plugins: Vec::new(),
            file_observers: Vec::new(),
        }
    }

    /// Entry file this pass will bundle.
    pub fn entry(&self) -> &Path {
        &self.entry
    }

    /// Make `path` importable inside the bundle under the bare name `name`.
    ///
    /// The alias only applies to imports the bundler sees. The IIFE output
    /// defines no global `require`, so page scripts outside the bundle
    /// cannot reach `name`.
    ///
    /// ```
    /// use derby_bundler::BundleSetup;
    ///
    /// let mut setup = BundleSetup::new("app.js");
    /// setup.expose("derby", "node_modules/derby/index.js");
    /// assert_eq!(setup.exposed()[0].0, "derby");
    /// ```
    pub fn expose(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> &mut Self {
        let name = name.into();
        let path = path.into();
        self.exposed.retain(|(existing, _)| existing != &name);
        self.exposed.push((name, path));
        self
    }

    /// Serve `content` for `specifier` instead of anything on disk.
    ///
    /// `specifier` may be a bare module name or an absolute path of a
    /// placeholder file; either way the generated content wins.
    pub fn virtual_module(
        &mut self,
        specifier: impl Into<String>,
        content: impl Into<String>,
    ) -> &mut Self {
        self.virtual_modules.insert(specifier.into(), content.into());
        self
    }

    /// Add a Rolldown plugin that runs between virtual modules and file
    /// recording.
    pub fn plugin<P: Plugin + 'static>(&mut self, plugin: P) -> &mut Self {
        self.plugins.push(Arc::new(plugin));
        self
    }

    /// Get notified of every file id the bundler processes, in order.
    pub fn on_file<F>(&mut self, observer: F) -> &mut Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.file_observers.push(Arc::new(observer));
        self
    }

    pub fn exposed(&self) -> &[(String, PathBuf)] {
        &self.exposed
    }

    pub fn virtual_modules(&self) -> &FxHashMap<String, String> {
        &self.virtual_modules
    }

    pub fn virtual_module_content(&self, specifier: &str) -> Option<&str> {
        self.virtual_modules.get(specifier).map(String::as_str)
    }

    /// Report a touched file to every observer.
    pub fn notify_file(&self, id: &str) {
        for observer in &self.file_observers {
            observer(id);
        }
    }

    /// Apply `steps` in order, stopping at the first failure.
    pub fn apply(&mut self, steps: &[SharedBundleStep]) -> Result<()> {
        for step in steps {
            step.apply(self)?;
        }
        Ok(())
    }

    pub(crate) fn into_parts(self) -> SetupParts {
        SetupParts {
            exposed: self.exposed,
            virtual_modules: self.virtual_modules,
            plugins: self.plugins,
            file_observers: self.file_observers,
        }
    }
}

impl std::fmt::Debug for BundleSetup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BundleSetup")
            .field("entry", &self.entry)
            .field("exposed", &self.exposed)
            .field("virtual_modules", &self.virtual_modules.keys().collect::<Vec<_>>())
            .field("plugins", &self.plugins.len())
            .field("file_observers", &self.file_observers.len())
            .finish()
    }
}

pub(crate) struct SetupParts {
    pub exposed: Vec<(String, PathBuf)>,
    pub virtual_modules: FxHashMap<String, String>,
    pub plugins: Vec<SharedPluginable>,
    pub file_observers: Vec<FileObserver>,
}

/// One pre-bundle configuration step.
pub trait BundleStep: Send + Sync {
    fn apply(&self, setup: &mut BundleSetup) -> Result<()>;
}

impl<F> BundleStep for F
where
    F: Fn(&mut BundleSetup) -> Result<()> + Send + Sync,
{
    fn apply(&self, setup: &mut BundleSetup) -> Result<()> {
        self(setup)
    }
}

pub type SharedBundleStep = Arc<dyn BundleStep>;
