//! Script writer: publishes a bundle as content-hashed files.
//!
//! Layout under the target directory:
//!
//! ```text
//! {dir}/derby/{name}-{hash}.js
//! {dir}/derby/{name}-{hash}.map.json   (unless maps are disabled)
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app::App;
use crate::backend::BundleBackend;
use crate::{BundleOptions, Error, Result};

/// Name of the subdirectory bundles are written to.
pub const OUTPUT_SUBDIR: &str = "derby";

/// Everything known about one written bundle.
///
/// Produced by [`App::write_scripts`] and never mutated afterwards; the app
/// swaps in a new artifact after every write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptArtifact {
    pub script_hash: String,
    /// Public URL of the script, `{scriptBaseUrl}/derby/{name}-{hash}.js`.
    pub script_url: String,
    pub script_filename: PathBuf,
    pub script_map_url: Option<String>,
    pub script_map_filename: Option<PathBuf>,
}

impl App {
    /// Bundle the app and write the script (plus map) into `{dir}/derby`.
    ///
    /// `dir` must exist; only the `derby` subdirectory is created. In watch
    /// mode older bundles of this app are removed afterwards. Calling this
    /// alone never rebuilds on change; run [`App::watch`] for that.
    pub async fn write_scripts(
        &self,
        backend: &dyn BundleBackend,
        dir: &Path,
        options: &BundleOptions,
    ) -> Result<Arc<ScriptArtifact>> {
        let bundle = self.bundle(backend, options).await?;
        let config = self.config();

        let out_dir = dir.join(OUTPUT_SUBDIR);
        if !out_dir.exists() {
            fs::create_dir(&out_dir).map_err(Error::io(&out_dir))?;
        }

        let stem = format!("{}-{}", config.name, bundle.script_hash);
        let script_url = format!("{}/{}/{}.js", config.script_base_url, OUTPUT_SUBDIR, stem);
        let mut source = bundle.source;

        let (script_map_url, script_map_filename) = if options.disable_script_map {
            (None, None)
        } else {
            let map_url = format!(
                "{}/{}/{}.map.json",
                config.script_map_base_url, OUTPUT_SUBDIR, stem
            );
            source.push_str("\n//# sourceMappingURL=");
            source.push_str(&map_url);

            let map_path = out_dir.join(format!("{stem}.map.json"));
            fs::write(&map_path, &bundle.source_map).map_err(Error::io(&map_path))?;
            (Some(map_url), Some(map_path))
        };

        let script_filename = out_dir.join(format!("{stem}.js"));
        fs::write(&script_filename, &source).map_err(Error::io(&script_filename))?;

        tracing::debug!(
            app = %config.name,
            path = %script_filename.display(),
            "wrote script"
        );

        if config.watch_files {
            let removed = cleanup_stale_bundles(&out_dir, &config.name, &bundle.script_hash)?;
            if removed > 0 {
                tracing::debug!(app = %config.name, removed, "removed stale bundles");
            }
        }

        let artifact = Arc::new(ScriptArtifact {
            script_hash: bundle.script_hash,
            script_url,
            script_filename,
            script_map_url,
            script_map_filename,
        });
        self.set_artifact(Arc::clone(&artifact));
        Ok(artifact)
    }
}

/// Delete every file in `dir` that belongs to `app_name` but not to the
/// bundle with `script_hash`. Returns the number of files removed.
///
/// Ownership is decided by name prefix alone (`{app_name}-`), so an app
/// called `app` also claims files of an app called `app-admin` sharing the
/// directory.
pub fn cleanup_stale_bundles(dir: &Path, app_name: &str, script_hash: &str) -> Result<usize> {
    let app_prefix = format!("{app_name}-");
    let current_prefix = format!("{app_prefix}{script_hash}");
    let mut removed = 0;

    for entry in fs::read_dir(dir).map_err(Error::io(dir))? {
        let entry = entry.map_err(Error::io(dir))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !name.starts_with(&app_prefix) || name.starts_with(&current_prefix) {
            continue;
        }
        let path = entry.path();
        fs::remove_file(&path).map_err(Error::io(&path))?;
        removed += 1;
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), "x").unwrap();
    }

    fn listing(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn cleanup_keeps_current_and_foreign_files() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        touch(dir, "app-old.js");
        touch(dir, "app-old.map.json");
        touch(dir, "app-new.js");
        touch(dir, "app-new.map.json");
        touch(dir, "other-old.js");

        let removed = cleanup_stale_bundles(dir, "app", "new").unwrap();

        assert_eq!(removed, 2);
        assert_eq!(
            listing(dir),
            vec!["app-new.js", "app-new.map.json", "other-old.js"]
        );
    }

    #[test]
    fn cleanup_claims_files_of_prefixed_app_names() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "app-admin-123.js");

        assert_eq!(cleanup_stale_bundles(temp.path(), "app", "abc").unwrap(), 1);
        assert!(listing(temp.path()).is_empty());
    }

    #[test]
    fn cleanup_of_missing_dir_is_io_error() {
        let temp = TempDir::new().unwrap();
        let err = cleanup_stale_bundles(&temp.path().join("nope"), "app", "abc").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
