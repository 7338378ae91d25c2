//! Rolldown plugins used by the backend.
//!
//! - [`VirtualModulesPlugin`] serves generated modules (the views module)
//! - [`BundleFilesPlugin`] records every file the bundler touches

pub mod bundle_files;
pub mod registry;
pub mod virtual_modules;

pub use bundle_files::BundleFilesPlugin;
pub use registry::{DerbyPlugin, PluginPhase, PluginRegistry};
pub use virtual_modules::VirtualModulesPlugin;
