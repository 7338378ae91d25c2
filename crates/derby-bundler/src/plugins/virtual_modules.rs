//! Serves generated modules to Rolldown.
//!
//! Each entry maps a specifier (bare name or absolute path) to generated
//! source. Resolution is claimed before Rolldown's own resolver runs, and
//! `load` also answers for ids that resolved to a real placeholder file, so
//! the generated content is what ends up in the bundle no matter which path
//! reached it first.

use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;

use path_clean::PathClean;
use rolldown_common::{ModuleType, ResolvedExternal};
use rolldown_plugin::{
    HookLoadArgs, HookLoadOutput, HookLoadReturn, HookResolveIdArgs, HookResolveIdOutput,
    HookResolveIdReturn, HookUsage, Plugin, PluginContext,
};
use rustc_hash::FxHashMap;

use crate::plugins::{DerbyPlugin, PluginPhase};

#[derive(Debug, Clone)]
pub struct VirtualModulesPlugin {
    modules: Arc<FxHashMap<String, String>>,
}

impl VirtualModulesPlugin {
    pub fn new(modules: FxHashMap<String, String>) -> Self {
        Self {
            modules: Arc::new(modules),
        }
    }

    /// Find the registered key a specifier refers to, if any.
    fn lookup(&self, specifier: &str, importer: Option<&str>) -> Option<String> {
        let mut candidates = vec![specifier.to_string()];

        if specifier.starts_with('.') {
            if let Some(dir) = importer.and_then(|i| Path::new(i).parent()) {
                candidates.push(dir.join(specifier).clean().to_string_lossy().into_owned());
            }
        }

        candidates
            .into_iter()
            .flat_map(|c| [format!("{c}.js"), c])
            .find(|c| self.modules.contains_key(c))
    }
}

impl Plugin for VirtualModulesPlugin {
    fn name(&self) -> Cow<'static, str> {
        "derby-virtual-modules".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::ResolveId | HookUsage::Load
    }

    fn resolve_id(
        &self,
        _ctx: &PluginContext,
        args: &HookResolveIdArgs,
    ) -> impl std::future::Future<Output = HookResolveIdReturn> + Send {
        let importer = args.importer.as_ref().map(|i| i.to_string());
        let resolved = self.lookup(&*args.specifier, importer.as_deref());

        async move {
            Ok(resolved.map(|id| HookResolveIdOutput {
                id: id.into(),
                external: Some(ResolvedExternal::Bool(false)),
                ..Default::default()
            }))
        }
    }

    fn load(
        &self,
        _ctx: &PluginContext,
        args: &HookLoadArgs<'_>,
    ) -> impl std::future::Future<Output = HookLoadReturn> + Send {
        let content = self.modules.get(&*args.id).cloned();

        async move {
            Ok(content.map(|code| HookLoadOutput {
                code: code.into(),
                module_type: Some(ModuleType::Js),
                ..Default::default()
            }))
        }
    }
}

impl DerbyPlugin for VirtualModulesPlugin {
    fn phase(&self) -> PluginPhase {
        PluginPhase::Virtual
    }
}
