//! Top-level configuration and layered loading.

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format as _, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::app::AppConfig;
use crate::bundle::BundleOptions;
use crate::error::{ConfigError, Result};

/// Conventional config file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "derby.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DerbyConfig {
    pub app: AppConfig,

    pub bundle: BundleOptions,

    /// Production mode. `None` reads `DERBY_ENV` / `NODE_ENV`.
    pub production: Option<bool>,
}

impl DerbyConfig {
    /// Load configuration from multiple sources.
    ///
    /// Priority: `overrides` > environment variables > config file > defaults.
    /// An explicit `config_path` must exist; the conventional `derby.toml` is
    /// only read when present.
    pub fn load<T: Serialize>(config_path: Option<&Path>, overrides: Option<T>) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        match config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                figment = figment.merge(Toml::file(path));
            }
            None => {
                let default_path = Path::new(CONFIG_FILE_NAME);
                if default_path.exists() {
                    tracing::debug!("loading {}", default_path.display());
                    figment = figment.merge(Toml::file(default_path));
                }
            }
        }

        // DERBY_APP__NAME, DERBY_BUNDLE__MINIFY, ...
        figment = figment.merge(Env::prefixed("DERBY_").split("__").ignore(&["env"]));

        if let Some(overrides) = overrides {
            figment = figment.merge(Serialized::defaults(overrides));
        }

        let config: Self = figment.extract()?;
        Ok(config)
    }

    /// Parse configuration from TOML text without consulting the environment.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ConfigError::InvalidValue {
            field: "toml".to_string(),
            hint: format!("Invalid TOML syntax: {}", e),
        })
    }

    /// Effective production flag.
    pub fn is_production(&self) -> bool {
        self.production.unwrap_or_else(is_production_env)
    }
}

/// `true` when `DERBY_ENV` (or, failing that, `NODE_ENV`) is `production`.
pub fn is_production_env() -> bool {
    std::env::var("DERBY_ENV")
        .or_else(|_| std::env::var("NODE_ENV"))
        .map(|v| v == "production")
        .unwrap_or(false)
}
