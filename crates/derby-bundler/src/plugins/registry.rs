//! Plugin registry with execution phases.
//!
//! Rolldown runs plugin hooks in registration order, so the registry sorts
//! by phase before handing the list over. Virtual modules must resolve before
//! anything else can claim the same specifier.

use rolldown_plugin::__inner::SharedPluginable;
use rolldown_plugin::Plugin;
use std::sync::Arc;

/// Plugin execution phases, lower first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PluginPhase {
    /// Generated modules that replace or stand in for files on disk.
    Virtual = 0,

    /// Caller supplied plugins.
    Transform = 20,

    /// Observers that only record what the bundler did.
    Observe = 100,
}

/// A plugin that knows which phase it belongs to.
pub trait DerbyPlugin: Plugin {
    fn phase(&self) -> PluginPhase {
        PluginPhase::Transform
    }
}

/// Plugin registry that maintains plugins in phase order.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<(PluginPhase, SharedPluginable)>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plugin at the phase it declares.
    pub fn add<P: DerbyPlugin + 'static>(&mut self, plugin: P) {
        let phase = plugin.phase();
        self.plugins.push((phase, Arc::new(plugin)));
    }

    /// Add an already shared plugin at an explicit phase.
    pub fn add_with_phase(&mut self, plugin: SharedPluginable, phase: PluginPhase) {
        self.plugins.push((phase, plugin));
    }

    /// Plugins sorted by phase; the sort is stable, so registration order
    /// holds within a phase.
    pub fn into_rolldown_plugins(self) -> Vec<SharedPluginable> {
        self.into_ordered()
            .into_iter()
            .map(|(_, plugin)| plugin)
            .collect()
    }

    fn into_ordered(mut self) -> Vec<(PluginPhase, SharedPluginable)> {
        self.plugins.sort_by_key(|(phase, _)| *phase);
        self.plugins
    }

    pub fn phases(&self) -> Vec<PluginPhase> {
        self.plugins.iter().map(|(phase, _)| *phase).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
