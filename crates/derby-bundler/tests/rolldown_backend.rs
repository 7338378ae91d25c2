//! End-to-end bundles through Rolldown against a temp project.

mod common;

use std::fs;

use common::Fixture;
use derby_bundler::{App, AppConfig, BundleOptions, Error, RolldownBackend};

fn project() -> Fixture {
    let fixture = Fixture::new();
    fs::write(
        fixture.entry(),
        r#"var derby = require('derby');
var views = require('derby-bundler/_views');
window.app = { derby: derby, views: views };
"#,
    )
    .unwrap();
    fs::write(
        fixture.root().join("node_modules/derby/index.js"),
        r#"module.exports = {
  scriptHash: "{{DERBY_SCRIPT_HASH}}",
  bundledAt: "{{DERBY_BUNDLED_AT}}"
};
"#,
    )
    .unwrap();
    fixture
}

#[tokio::test]
async fn bundles_app_with_views_and_framework() {
    let fixture = project();
    let app = App::new(AppConfig::new("app", fixture.entry()));
    app.register_view("home", "<h1>Hi</h1>");
    let backend = RolldownBackend::new(false);

    let artifact = app
        .write_scripts(&backend, &fixture.public(), &BundleOptions::new())
        .await
        .unwrap();

    let script = fs::read_to_string(&artifact.script_filename).unwrap();
    assert!(script.contains("views.register("), "{script}");
    assert!(script.contains("home"));
    assert!(script.contains(&artifact.script_hash));
    assert!(!script.contains("{{DERBY_SCRIPT_HASH}}"));
    assert!(!script.contains("{{DERBY_BUNDLED_AT}}"));
    assert_eq!(
        script.matches("sourceMappingURL").count(),
        1,
        "only the public map comment remains"
    );

    let map_path = artifact.script_map_filename.as_ref().unwrap();
    let map: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(map_path).unwrap()).unwrap();
    assert_eq!(map["sourceRoot"], "/");
    assert_eq!(map["version"], 3);
}

#[tokio::test]
async fn real_views_placeholder_imported_relatively_is_replaced() {
    let fixture = Fixture::new();
    let package = fixture.root().join("node_modules/derby-bundler");
    fs::create_dir_all(&package).unwrap();
    fs::write(
        package.join("package.json"),
        r#"{"name":"derby-bundler","version":"0.0.0","main":"index.js"}"#,
    )
    .unwrap();
    fs::write(package.join("index.js"), "module.exports = require('./_views');\n").unwrap();
    fs::write(package.join("_views.js"), "").unwrap();
    fs::write(
        fixture.entry(),
        "var derby = require('derby');\nwindow.views = require('derby-bundler');\n",
    )
    .unwrap();

    let app = App::new(AppConfig::new("app", fixture.entry()));
    app.register_view("home", "<h1>Hi</h1>");
    let backend = RolldownBackend::new(false);

    let bundle = app
        .bundle(&backend, &BundleOptions::new().minify(false))
        .await
        .unwrap();

    assert!(bundle.source.contains("views.register("), "{}", bundle.source);
    assert!(bundle.source.contains("home"));
    assert!(
        bundle.files.iter().any(|f| f.ends_with("_views.js")),
        "{:?}",
        bundle.files
    );
}

#[tokio::test]
async fn unminified_bundles_are_deterministic() {
    let fixture = project();
    let app = App::new(AppConfig::new("app", fixture.entry()));
    let backend = RolldownBackend::new(false);
    let options = BundleOptions::new().minify(false);

    let first = app.bundle(&backend, &options).await.unwrap();
    let second = app.bundle(&backend, &options).await.unwrap();

    assert_eq!(first.script_hash, second.script_hash);
    assert!(first.files.iter().any(|f| f.ends_with("app.js")), "{:?}", first.files);
}

#[tokio::test]
async fn missing_entry_is_a_bundle_error() {
    let fixture = project();
    let app = App::new(AppConfig::new("app", fixture.root().join("missing.js")));
    let backend = RolldownBackend::new(false);

    let err = app
        .write_scripts(&backend, &fixture.public(), &BundleOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Bundle(_)), "{err}");
    assert!(!fixture.output().exists());
}
