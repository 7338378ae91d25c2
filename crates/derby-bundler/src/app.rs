//! App bundler: wraps a backend with everything a Derby app adds.
//!
//! Before the backend runs, the app contributes one configuration step that
//! exposes the framework package under its bare name, replaces the views
//! placeholder module with the generated views source and records every file
//! the bundler touches. Afterwards the output is hashed and the build
//! placeholders baked into the framework's client code are filled in.

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::{Mutex, RwLock};
use regex::Regex;

use crate::backend::BundleBackend;
use crate::setup::{BundleSetup, SharedBundleStep};
use crate::views::{ViewOptions, ViewRegistry};
use crate::watch::{RefreshEvent, RefreshHub, WatchState};
use crate::writer::ScriptArtifact;
use crate::{AppConfig, BundleOptions, Error, Result};

/// Replaced with the bundle's content hash.
pub const SCRIPT_HASH_TOKEN: &str = "{{DERBY_SCRIPT_HASH}}";

/// Replaced, together with its surrounding quotes, by the build time in
/// epoch milliseconds.
pub const BUNDLED_AT_TOKEN: &str = "{{DERBY_BUNDLED_AT}}";

static BUNDLED_AT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"['"]\{\{DERBY_BUNDLED_AT\}\}['"]"#).ok());

/// Output of [`App::bundle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppBundle {
    /// Bundle source with placeholders filled in.
    pub source: String,
    pub source_map: String,
    /// Hex MD5 of the backend's output.
    pub script_hash: String,
    /// Every file id the bundler touched, in the order reported.
    pub files: Vec<String>,
}

/// A Derby app as seen by the bundler.
pub struct App {
    config: AppConfig,
    views: RwLock<ViewRegistry>,
    steps: RwLock<Vec<SharedBundleStep>>,
    artifact: RwLock<Option<Arc<ScriptArtifact>>>,
    pub(crate) refresh: RefreshHub,
    pub(crate) watch_state: WatchState,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            views: RwLock::new(ViewRegistry::new()),
            steps: RwLock::new(Vec::new()),
            artifact: RwLock::new(None),
            refresh: RefreshHub::new(),
            watch_state: WatchState::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn register_view(&self, name: impl Into<String>, source: impl Into<String>) {
        self.views
            .write()
            .register(name, source, ViewOptions::default());
    }

    pub fn register_view_with(
        &self,
        name: impl Into<String>,
        source: impl Into<String>,
        options: ViewOptions,
    ) {
        self.views.write().register(name, source, options);
    }

    /// Client views module for the currently registered views.
    pub fn views_source(&self, minify: bool) -> String {
        self.views.read().views_source(minify)
    }

    /// Add a step applied to every bundle of this app, after the app's own.
    pub fn on_bundle<F>(&self, step: F)
    where
        F: Fn(&mut BundleSetup) -> Result<()> + Send + Sync + 'static,
    {
        self.steps.write().push(Arc::new(step));
    }

    /// Latest written scripts, if any.
    pub fn artifact(&self) -> Option<Arc<ScriptArtifact>> {
        self.artifact.read().clone()
    }

    pub(crate) fn set_artifact(&self, artifact: Arc<ScriptArtifact>) {
        *self.artifact.write() = Some(artifact);
    }

    /// Receive an event after every successful rebuild in watch mode.
    pub fn subscribe_refresh(&self) -> tokio::sync::broadcast::Receiver<RefreshEvent> {
        self.refresh.subscribe()
    }

    /// Locate the framework package the way Node's `require.resolve` would
    /// from the entry file's directory.
    pub fn resolve_framework(&self) -> Result<Option<PathBuf>> {
        self.resolve_from_entry(&self.config.framework)
    }

    /// Locate the real views placeholder file, if one is installed. The
    /// generated views replace it under whatever path reaches it.
    pub fn resolve_views_module(&self) -> Option<PathBuf> {
        match self.resolve_from_entry(&self.config.views_module) {
            Ok(path) => path,
            Err(err) => {
                tracing::debug!(%err, "views placeholder not found on disk");
                None
            }
        }
    }

    fn resolve_from_entry(&self, specifier: &str) -> Result<Option<PathBuf>> {
        if specifier.is_empty() {
            return Ok(None);
        }

        let entry = std::path::absolute(&self.config.filename)
            .map_err(Error::io(&self.config.filename))?;
        let from = entry.parent().unwrap_or(Path::new("/")).to_path_buf();

        let resolver = oxc_resolver::Resolver::new(oxc_resolver::ResolveOptions::default());
        resolver
            .resolve(&from, specifier)
            .map(|res| Some(res.path().to_path_buf()))
            .map_err(|e| Error::Resolution {
                specifier: specifier.to_string(),
                from,
                reason: e.to_string(),
            })
    }

    /// Bundle the app's entry file through `backend`.
    pub async fn bundle(
        &self,
        backend: &dyn BundleBackend,
        options: &BundleOptions,
    ) -> Result<AppBundle> {
        let mut options = options.clone();
        let minify = options.resolve_minify(backend.is_production());
        options.minify = Some(minify);

        let views_source = self.views_source(minify);
        let framework = self.resolve_framework()?;
        let views_file = self.resolve_views_module();
        let files = Arc::new(Mutex::new(Vec::new()));

        let mut steps: Vec<SharedBundleStep> = vec![self.app_step(
            framework,
            views_file,
            views_source,
            Arc::clone(&files),
        )];
        let extra = self.steps.read().clone();
        steps.extend(extra);

        let result = backend
            .bundle(&self.config.filename, &options, &steps)
            .await?;

        let script_hash = content_hash(&result.source);
        let source = substitute_placeholders(&result.source, &script_hash, now_millis());
        let files = std::mem::take(&mut *files.lock());

        tracing::info!(
            app = %self.config.name,
            hash = %script_hash,
            files = files.len(),
            "bundled"
        );

        if self.config.watch_files {
            self.refresh.enable();
            self.watch_bundle(&files)?;
        }

        Ok(AppBundle {
            source,
            source_map: result.source_map,
            script_hash,
            files,
        })
    }

    fn app_step(
        &self,
        framework: Option<PathBuf>,
        views_file: Option<PathBuf>,
        views_source: String,
        files: Arc<Mutex<Vec<String>>>,
    ) -> SharedBundleStep {
        let framework_name = self.config.framework.clone();
        let views_module = self.config.views_module.clone();

        Arc::new(move |setup: &mut BundleSetup| -> Result<()> {
            if let Some(path) = &framework {
                setup.expose(framework_name.clone(), path.clone());
            }
            setup.virtual_module(views_module.clone(), views_source.clone());
            if let Some(path) = &views_file {
                setup.virtual_module(path.to_string_lossy(), views_source.clone());
            }
            let files = Arc::clone(&files);
            setup.on_file(move |id| files.lock().push(id.to_string()));
            Ok(())
        })
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("config", &self.config)
            .field("views", &self.views.read().len())
            .field("steps", &self.steps.read().len())
            .field("artifact", &self.artifact.read())
            .finish()
    }
}

/// Lowercase hex MD5 of `source`.
pub fn content_hash(source: &str) -> String {
    format!("{:x}", md5::compute(source.as_bytes()))
}

/// Fill the first hash token and the first quoted build-time token.
pub(crate) fn substitute_placeholders(source: &str, hash: &str, bundled_at: u128) -> String {
    let source = source.replacen(SCRIPT_HASH_TOKEN, hash, 1);
    match BUNDLED_AT.as_ref() {
        Some(re) => re
            .replacen(&source, 1, bundled_at.to_string().as_str())
            .into_owned(),
        None => source,
    }
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}
