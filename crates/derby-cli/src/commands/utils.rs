//! Config loading and checks shared by `write` and `watch`.

use derby_bundler::{App, RolldownBackend};
use derby_config::DerbyConfig;
use serde_json::{Map, Value, json};

use crate::cli::BundleArgs;
use crate::error::{CliError, Result};

/// CLI flags as a partial config; only flags that were given are present,
/// so they override file and environment values without resetting others.
pub(crate) fn overrides(args: &BundleArgs, watch: bool) -> Value {
    let mut app = Map::new();
    if let Some(entry) = &args.entry {
        app.insert("filename".into(), json!(entry));
    }
    if let Some(name) = &args.name {
        app.insert("name".into(), json!(name));
    }
    if let Some(url) = &args.base_url {
        app.insert("script_base_url".into(), json!(url));
    }
    if let Some(url) = &args.map_base_url {
        app.insert("script_map_base_url".into(), json!(url));
    }
    if args.crossorigin {
        app.insert("script_cross_origin".into(), json!(true));
    }
    if watch {
        app.insert("watch_files".into(), json!(true));
    }

    let mut bundle = Map::new();
    if args.minify {
        bundle.insert("minify".into(), json!(true));
    } else if args.no_minify {
        bundle.insert("minify".into(), json!(false));
    }
    if args.disable_script_map {
        bundle.insert("disable_script_map".into(), json!(true));
    }

    let mut root = Map::new();
    root.insert("app".into(), Value::Object(app));
    root.insert("bundle".into(), Value::Object(bundle));
    if args.production {
        root.insert("production".into(), json!(true));
    }
    Value::Object(root)
}

pub(crate) fn load_config(args: &BundleArgs, watch: bool) -> Result<DerbyConfig> {
    let config = DerbyConfig::load(args.config.as_deref(), Some(overrides(args, watch)))?;
    config.app.validate()?;

    if !config.app.filename.is_file() {
        return Err(CliError::FileNotFound(config.app.filename.clone()));
    }
    if !args.dir.is_dir() {
        return Err(CliError::InvalidArgument(format!(
            "output directory {} does not exist",
            args.dir.display()
        )));
    }
    Ok(config)
}

pub(crate) fn app_and_backend(config: &DerbyConfig) -> (App, RolldownBackend) {
    let production = config.is_production();
    tracing::debug!(app = %config.app.name, production, "configured");
    (
        App::new(config.app.clone()),
        RolldownBackend::new(production),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn unset_flags_are_left_out() {
        let value = overrides(&BundleArgs::default(), false);
        assert_eq!(value, json!({ "app": {}, "bundle": {} }));
    }

    #[test]
    fn flags_map_to_config_fields() {
        let args = BundleArgs {
            entry: Some(PathBuf::from("src/app.js")),
            name: Some("blog".into()),
            no_minify: true,
            disable_script_map: true,
            base_url: Some("https://cdn.test".into()),
            crossorigin: true,
            production: true,
            ..Default::default()
        };

        let value = overrides(&args, true);

        assert_eq!(value["app"]["filename"], "src/app.js");
        assert_eq!(value["app"]["name"], "blog");
        assert_eq!(value["app"]["script_base_url"], "https://cdn.test");
        assert_eq!(value["app"]["script_cross_origin"], true);
        assert_eq!(value["app"]["watch_files"], true);
        assert_eq!(value["bundle"]["minify"], false);
        assert_eq!(value["bundle"]["disable_script_map"], true);
        assert_eq!(value["production"], true);
    }
}
