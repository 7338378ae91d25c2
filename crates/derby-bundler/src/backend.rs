//! Backend bundler: runs Rolldown on one entry file.
//!
//! Output is collected in memory. Code and source map are streamed into two
//! [`ByteSink`]s, the map gets `/` as its source root, and the
//! `sourceMappingURL` comment Rolldown leaves behind is stripped so the
//! writer can add one pointing at the public map URL.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use async_trait::async_trait;
use path_clean::PathClean;
use regex::Regex;
use rolldown::{
    BundlerBuilder as RolldownBundlerBuilder, BundlerOptions, InputItem, IsExternal,
    OutputFormat, Platform, RawMinifyOptions, ResolveOptions, SourceMapType,
};
use rolldown_common::Output;

use crate::byte_sink::ByteSink;
use crate::plugins::{BundleFilesPlugin, PluginPhase, PluginRegistry, VirtualModulesPlugin};
use crate::setup::{BundleSetup, SetupParts, SharedBundleStep};
use crate::{BundleOptions, Error, Result};

/// When set, every file the bundler touches is logged.
pub const BUNDLE_DEBUG_ENV: &str = "BUNDLE_DEBUG";

/// Log a `FILE <id>` line for every touched file when [`BUNDLE_DEBUG_ENV`]
/// is set.
pub(crate) fn observe_bundle_debug(setup: &mut BundleSetup) {
    if std::env::var_os(BUNDLE_DEBUG_ENV).is_some() {
        setup.on_file(|id| tracing::info!("FILE {}", id));
    }
}

/// Code and external source map of one bundle pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleResult {
    pub source: String,
    pub source_map: String,
}

/// Anything that can turn an entry file into a browser bundle.
#[async_trait]
pub trait BundleBackend: Send + Sync {
    /// Production mode; the default for `minify`.
    fn is_production(&self) -> bool;

    /// Bundle `file`, applying `steps` before the entry is added.
    async fn bundle(
        &self,
        file: &Path,
        options: &BundleOptions,
        steps: &[SharedBundleStep],
    ) -> Result<BundleResult>;
}

/// Production backend built on Rolldown.
#[derive(Clone, Default)]
pub struct RolldownBackend {
    production: bool,
    cwd: Option<PathBuf>,
    steps: Vec<SharedBundleStep>,
}

impl RolldownBackend {
    pub fn new(production: bool) -> Self {
        Self {
            production,
            ..Default::default()
        }
    }

    /// Working directory used for resolution and source paths.
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Step applied to every bundle this backend produces, before the
    /// per-call steps.
    pub fn step(mut self, step: SharedBundleStep) -> Self {
        self.steps.push(step);
        self
    }
}

impl std::fmt::Debug for RolldownBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RolldownBackend")
            .field("production", &self.production)
            .field("cwd", &self.cwd)
            .field("steps", &self.steps.len())
            .finish()
    }
}

#[async_trait]
impl BundleBackend for RolldownBackend {
    fn is_production(&self) -> bool {
        self.production
    }

    async fn bundle(
        &self,
        file: &Path,
        options: &BundleOptions,
        steps: &[SharedBundleStep],
    ) -> Result<BundleResult> {
        let entry = absolute_entry(file)?;

        // Map extraction depends on debug output
        let mut options = options.clone();
        options.debug = true;
        let minify = options.resolve_minify(self.production);

        let mut setup = BundleSetup::new(&entry);
        setup.apply(&self.steps)?;
        setup.apply(steps)?;
        observe_bundle_debug(&mut setup);

        let SetupParts {
            exposed,
            virtual_modules,
            plugins,
            file_observers,
        } = setup.into_parts();

        let mut registry = PluginRegistry::new();
        registry.add(VirtualModulesPlugin::new(virtual_modules));
        for plugin in plugins {
            registry.add_with_phase(plugin, PluginPhase::Transform);
        }
        registry.add(BundleFilesPlugin::new(file_observers));

        let mut rolldown_options = configure_rolldown_options(&options, minify, &exposed);
        rolldown_options.input = Some(vec![InputItem {
            name: None,
            import: entry.to_string_lossy().into_owned(),
        }]);
        rolldown_options.cwd = self.cwd.clone().or_else(|| entry.parent().map(Path::to_path_buf));

        tracing::debug!(entry = %entry.display(), minify, "bundling");

        let mut bundler = RolldownBundlerBuilder::default()
            .with_options(rolldown_options)
            .with_plugins(registry.into_rolldown_plugins())
            .build()
            .map_err(|e| Error::from_rolldown_batch(&e))?;

        let output = bundler
            .generate()
            .await
            .map_err(|e| Error::from_rolldown_batch(&e))?;

        let mut source_sink = ByteSink::new();
        let mut map_sink = ByteSink::new();
        for item in &output.assets {
            match item {
                Output::Chunk(chunk) => {
                    source_sink.write_chunk(&chunk.code);
                    if let Some(map) = &chunk.map {
                        map_sink.write_chunk(map.to_json_string());
                    }
                }
                Output::Asset(asset) if map_sink.is_empty() && asset.filename.ends_with(".map") => {
                    map_sink.write_chunk(asset.source.as_bytes());
                }
                Output::Asset(_) => {}
            }
        }

        let source = strip_source_mapping_url(&source_sink.finish());
        let source_map = with_source_root(&map_sink.finish(), "/")?;

        tracing::debug!(bytes = source.len(), "bundle finished");

        Ok(BundleResult { source, source_map })
    }
}

fn absolute_entry(file: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(file).map_err(Error::io(file))?;
    Ok(absolute.clean())
}

/// Configure Rolldown options for a browser bundle.
fn configure_rolldown_options(
    options: &BundleOptions,
    minify: bool,
    exposed: &[(String, PathBuf)],
) -> BundlerOptions {
    let mut rolldown_options = BundlerOptions {
        format: Some(OutputFormat::Iife),
        platform: Some(Platform::Browser),
        sourcemap: Some(SourceMapType::File),
        ..Default::default()
    };

    // Rolldown always tree-shakes and hoists scopes; minify adds compression
    // and mangling on top.
    if minify {
        rolldown_options.minify = Some(RawMinifyOptions::from(true));
    }

    if !options.external.is_empty() {
        rolldown_options.external = Some(IsExternal::from(options.external.clone()));
    }

    if !options.define.is_empty() {
        rolldown_options.define = Some(
            options
                .define
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        );
    }

    let alias = exposed
        .iter()
        .map(|(name, path)| {
            (
                name.clone(),
                vec![Some(path.to_string_lossy().into_owned())],
            )
        })
        .collect::<Vec<_>>();

    let mut extensions = vec![".js".to_string(), ".json".to_string(), ".mjs".to_string()];
    for ext in &options.extensions {
        if !extensions.contains(ext) {
            extensions.push(ext.clone());
        }
    }

    rolldown_options.resolve = Some(ResolveOptions {
        alias: (!alias.is_empty()).then_some(alias),
        main_fields: Some(vec![
            "browser".to_string(),
            "module".to_string(),
            "main".to_string(),
        ]),
        condition_names: Some(vec![
            "browser".to_string(),
            "require".to_string(),
            "default".to_string(),
        ]),
        extensions: Some(extensions),
        symlinks: Some(true),
        ..Default::default()
    });

    rolldown_options
}

static SOURCE_MAPPING_URL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\n//# sourceMappingURL=.*").ok());

/// Remove the first trailing `//# sourceMappingURL=` line.
pub(crate) fn strip_source_mapping_url(source: &str) -> String {
    match SOURCE_MAPPING_URL.as_ref() {
        Some(re) => re.replacen(source, 1, "").into_owned(),
        None => source.to_string(),
    }
}

/// Set `sourceRoot` on a JSON source map. An empty map stays empty.
pub(crate) fn with_source_root(map: &str, root: &str) -> Result<String> {
    if map.trim().is_empty() {
        return Ok(String::new());
    }
    let mut value: serde_json::Value = serde_json::from_str(map)
        .map_err(|e| Error::InvalidConfig(format!("bundler produced an invalid source map: {e}")))?;
    if let Some(object) = value.as_object_mut() {
        object.insert(
            "sourceRoot".to_string(),
            serde_json::Value::String(root.to_string()),
        );
    }
    Ok(value.to_string())
}
