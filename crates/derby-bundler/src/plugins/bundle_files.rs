use rolldown_plugin::{
    HookTransformArgs, HookTransformReturn, HookUsage, Plugin, TransformPluginContext,
};
use std::sync::Arc;

use crate::plugins::{DerbyPlugin, PluginPhase};
use crate::setup::FileObserver;

/// Reports every module id the bundler transforms to the registered
/// observers, in the order Rolldown reports them.
pub struct BundleFilesPlugin {
    observers: Vec<FileObserver>,
}

impl BundleFilesPlugin {
    pub fn new(observers: Vec<FileObserver>) -> Self {
        Self { observers }
    }
}

impl std::fmt::Debug for BundleFilesPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BundleFilesPlugin")
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Plugin for BundleFilesPlugin {
    fn name(&self) -> std::borrow::Cow<'static, str> {
        "derby-bundle-files".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::Transform
    }

    fn transform(
        &self,
        _ctx: Arc<TransformPluginContext>,
        args: &HookTransformArgs,
    ) -> impl std::future::Future<Output = HookTransformReturn> + Send {
        for observer in &self.observers {
            observer(&*args.id);
        }

        // Don't modify the code
        async move { Ok(None) }
    }
}

impl DerbyPlugin for BundleFilesPlugin {
    fn phase(&self) -> PluginPhase {
        PluginPhase::Observe
    }
}
