#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use derby_bundler::{BundleBackend, BundleOptions, BundleResult, BundleSetup, Error, Result,
    SharedBundleStep};
use derby_config::DEFAULT_VIEWS_MODULE;
use parking_lot::Mutex;
use tempfile::TempDir;

pub const STUB_MAP: &str = r#"{"version":3,"sources":[],"mappings":""}"#;

/// Backend that applies steps like the real one but fabricates its output.
///
/// The produced source is `body`, followed by the views module content and a
/// trailer naming the exposed packages and the minify flag.
pub struct StubBackend {
    production: bool,
    body: Mutex<String>,
    files: Mutex<Vec<PathBuf>>,
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl StubBackend {
    pub fn new(body: &str) -> Self {
        Self {
            production: false,
            body: Mutex::new(body.to_string()),
            files: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn production(mut self) -> Self {
        self.production = true;
        self
    }

    pub fn set_body(&self, body: &str) {
        *self.body.lock() = body.to_string();
    }

    /// Files reported to observers on every bundle.
    pub fn report_files(&self, files: Vec<PathBuf>) {
        *self.files.lock() = files;
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BundleBackend for StubBackend {
    fn is_production(&self) -> bool {
        self.production
    }

    async fn bundle(
        &self,
        file: &Path,
        options: &BundleOptions,
        steps: &[SharedBundleStep],
    ) -> Result<BundleResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Bundle(Vec::new()));
        }

        let mut setup = BundleSetup::new(file);
        setup.apply(steps)?;
        for path in self.files.lock().iter() {
            setup.notify_file(&path.to_string_lossy());
        }

        let views = setup
            .virtual_module_content(DEFAULT_VIEWS_MODULE)
            .unwrap_or_default()
            .to_string();
        let exposed = setup
            .exposed()
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(",");

        let source = format!(
            "{}\n{}\n/* exposed={} minify={:?} */",
            self.body.lock(),
            views,
            exposed,
            options.minify
        );
        Ok(BundleResult {
            source,
            source_map: STUB_MAP.to_string(),
        })
    }
}

/// Temp project with `app.js` and an installed `derby` package.
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("app.js"), "require('derby');\n").unwrap();
        let derby = root.join("node_modules").join("derby");
        fs::create_dir_all(&derby).unwrap();
        fs::write(
            derby.join("package.json"),
            r#"{"name":"derby","version":"0.0.0","main":"index.js"}"#,
        )
        .unwrap();
        fs::write(derby.join("index.js"), "module.exports = {};\n").unwrap();
        fs::create_dir(root.join("public")).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn entry(&self) -> PathBuf {
        self.root().join("app.js")
    }

    pub fn public(&self) -> PathBuf {
        self.root().join("public")
    }

    pub fn output(&self) -> PathBuf {
        self.public().join("derby")
    }

    /// Sorted file names in the output directory.
    pub fn outputs(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.output())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}
