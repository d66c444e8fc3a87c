//! Manifest discovery and end-to-end loading from disk

mod common;

use common::*;
use module_loader::module::registry::ManifestDiscovery;
use module_loader::{
    FileSystemFetcher, Loader, LoaderConfig, LoaderError, ModuleManifest, ModuleState,
    ReadySignal,
};

const JQUERY_MANIFEST: &str = r#"
[[module]]
id = "core.jquery"
scripts = ["~/js/jquery{min:.min}.js"]
ready = { global = "jQuery" }
"#;

const WIDGETS_MANIFEST: &str = r#"
[[module]]
id = "widgets.base"
dependencies = ["core.jquery"]
scripts = ["~/js/widgets.js"]
styles = ["~/css/widgets.css"]

[[module]]
id = "widgets.calendar"
dependencies = ["widgets.base"]
scripts = ["~/js/calendar.js"]
"#;

#[test]
fn test_discovery_finds_nested_manifests_in_order() {
    let fixture = LoaderTestFixture::new().unwrap();
    fixture
        .write_manifest("widgets/widgets.module.toml", WIDGETS_MANIFEST)
        .unwrap();
    fixture
        .write_manifest("core.module.toml", JQUERY_MANIFEST)
        .unwrap();
    fixture.write_manifest("notes.toml", "ignored").unwrap();

    let discovery = ManifestDiscovery::new(&fixture.manifests_dir);
    let paths = discovery.manifest_paths().unwrap();
    assert_eq!(paths.len(), 2);
    assert!(paths[0].ends_with("core.module.toml"));
    assert!(paths[1].ends_with("widgets/widgets.module.toml"));

    let manifests = discovery.discover_manifests().unwrap();
    assert_eq!(manifests.len(), 2);
    assert_eq!(manifests[0].manifest.modules[0].id, "core.jquery");
    assert_eq!(
        manifests[0].manifest.modules[0].ready,
        ReadySignal::Global("jQuery".to_string())
    );
}

#[test]
fn test_discovery_skips_invalid_manifests() {
    let fixture = LoaderTestFixture::new().unwrap();
    fixture
        .write_manifest("good.module.toml", JQUERY_MANIFEST)
        .unwrap();
    fixture
        .write_manifest("broken.module.toml", "[[module]\nid = ")
        .unwrap();
    fixture
        .write_manifest(
            "empty.module.toml",
            "[[module]]\nid = \"no.resources\"\n",
        )
        .unwrap();

    let manifests = ManifestDiscovery::new(&fixture.manifests_dir)
        .discover_manifests()
        .unwrap();
    assert_eq!(manifests.len(), 1);
    assert!(manifests[0].path.ends_with("good.module.toml"));
}

#[test]
fn test_missing_manifests_dir_is_empty() {
    let fixture = LoaderTestFixture::new().unwrap();
    let discovery = ManifestDiscovery::new(fixture.temp_dir.path().join("absent"));
    assert!(discovery.discover_manifests().unwrap().is_empty());
}

#[test]
fn test_declare_manifest_is_all_or_nothing() {
    let (mut loader, _) = test_loader();
    loader.declare("widgets.calendar", &[], ["~/cal.js"]).unwrap();

    let manifest = ModuleManifest::from_toml_str(WIDGETS_MANIFEST).unwrap();
    assert!(matches!(
        loader.declare_manifest(&manifest),
        Err(LoaderError::DuplicateModule(id)) if id == "widgets.calendar"
    ));
    assert!(loader.lookup("widgets.base").is_err());
}

#[test]
fn test_declare_manifest_sets_resources_and_signal() {
    let (mut loader, fetcher) = test_loader();
    let ids = loader
        .declare_manifest(&ModuleManifest::from_toml_str(JQUERY_MANIFEST).unwrap())
        .unwrap();
    loader
        .declare_manifest(&ModuleManifest::from_toml_str(WIDGETS_MANIFEST).unwrap())
        .unwrap();

    assert_eq!(
        loader.resolve("widgets.calendar").unwrap(),
        vec!["core.jquery", "widgets.base", "widgets.calendar"]
    );
    assert_eq!(
        loader.descriptor(ids[0]).ready_signal(),
        &ReadySignal::Global("jQuery".to_string())
    );

    let calendar = loader.lookup("widgets.calendar").unwrap();
    loader.load(calendar);
    fetcher.complete_defining("/static/js/jquery.js", &["jQuery"]);
    loader.pump();
    assert_eq!(
        fetcher.urls(),
        vec![
            "/static/js/jquery.js".to_string(),
            "/static/js/widgets.js".to_string(),
            "/static/css/widgets.css".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_load_from_disk() {
    let fixture = LoaderTestFixture::new().unwrap();
    fixture.write_static("js/jquery.min.js", "/* jquery */").unwrap();
    fixture.write_static("js/widgets.js", "/* widgets */").unwrap();
    fixture.write_static("css/widgets.css", "/* css */").unwrap();
    fixture.write_static("js/calendar.js", "/* calendar */").unwrap();
    fixture
        .write_manifest("core.module.toml", JQUERY_MANIFEST)
        .unwrap();
    fixture
        .write_manifest("widgets.module.toml", WIDGETS_MANIFEST)
        .unwrap();

    let config = LoaderConfig::from_toml_str(
        r#"
        wait_timeout_secs = 5

        [locator]
        minified = true
        "#,
    )
    .unwrap();
    let mut loader = Loader::from_config(
        &config,
        FileSystemFetcher::new(&fixture.static_dir, config.locator.base_path.clone()),
    );
    for discovered in ManifestDiscovery::new(&fixture.manifests_dir)
        .discover_manifests()
        .unwrap()
    {
        loader.declare_manifest(&discovered.manifest).unwrap();
    }
    loader.define_global("jQuery");

    let calendar = loader.lookup("widgets.calendar").unwrap();
    assert_eq!(loader.wait_for(calendar).await, Ok(()));
    for name in loader.resolve("widgets.calendar").unwrap() {
        let id = loader.lookup(&name).unwrap();
        assert_eq!(loader.state(id), ModuleState::Ready, "{}", name);
    }
}

#[tokio::test]
async fn test_missing_file_fails_module() {
    let fixture = LoaderTestFixture::new().unwrap();
    let mut loader = Loader::from_config(
        &LoaderConfig::default(),
        FileSystemFetcher::new(&fixture.static_dir, "/static"),
    );
    let id = loader.declare("ghost", &[], ["~/js/ghost.js"]).unwrap().id();

    match loader.wait_for(id).await {
        Err(LoaderError::ResourceLoad { url, .. }) => assert_eq!(url, "/static/js/ghost.js"),
        other => panic!("expected a resource failure, got {:?}", other),
    }
}
