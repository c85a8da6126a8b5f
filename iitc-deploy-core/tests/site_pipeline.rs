use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use iitc_deploy_core::builder::DEFAULT_VARIANTS;
use iitc_deploy_core::contract::{MockObjectStore, PutObject};
use iitc_deploy_core::publish::PublishOptions;
use iitc_deploy_core::site::{deploy_site, render_site, SiteError};
use iitc_deploy_core::workdir::ScopedWorkingDir;
use serial_test::serial;
use tempfile::tempdir;

fn write(base: &Path, rel: &str, content: &str) {
    let path = base.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn sample_build(base: &Path) {
    write(base, "local/plugins/foo.user.js", "// foo");
    write(
        base,
        "local/plugins/foo.meta.js",
        "// @id foo@x\n// @name Foo Plugin\n// @category Tools\n",
    );
    write(base, "mobile/plugins/foo.user.js", "// foo");
    write(base, "mobile/plugins/foo.meta.js", "// @id foo@x\n// @name Foo Plugin\n// @category Tools\n");
}

#[test]
fn render_writes_every_page_into_the_build_dir() {
    let tmp = tempdir().unwrap();
    sample_build(tmp.path());

    let written = render_site(tmp.path(), DEFAULT_VARIANTS, "Preview").unwrap();

    let names: Vec<String> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["local.html", "mobile.html", "index.html"]);

    let index = fs::read_to_string(tmp.path().join("index.html")).unwrap();
    assert!(index.contains("<title>Preview</title>"));
    let local = fs::read_to_string(tmp.path().join("local.html")).unwrap();
    assert!(local.contains(r#"href="local/plugins/foo.user.js""#));
}

#[test]
fn render_surfaces_missing_plugins() {
    let tmp = tempdir().unwrap();
    write(tmp.path(), "local/readme.txt", "x");

    let err = render_site(tmp.path(), &["local"], "Preview").unwrap_err();
    assert!(matches!(err, SiteError::Index(_)));
}

#[tokio::test]
#[serial]
async fn deploy_publishes_relative_keys_and_restores_cwd() {
    let tmp = tempdir().unwrap();
    sample_build(tmp.path());
    let before = std::env::current_dir().unwrap();

    let keys = Arc::new(Mutex::new(Vec::new()));
    let seen = keys.clone();
    let mut store = MockObjectStore::new();
    store.expect_get_object().returning(|_, _| Ok(None));
    store.expect_put_object().returning(move |req: PutObject<'_>| {
        seen.lock().unwrap().push(req.key.to_string());
        Ok(())
    });
    store.expect_make_public().returning(|_, _| Ok(()));

    let options = PublishOptions {
        retry_delay: Duration::from_millis(1),
        ..PublishOptions::new("iitc-test")
    };
    let report = deploy_site(&store, tmp.path(), DEFAULT_VARIANTS, "Site", &options)
        .await
        .expect("deploy succeeds");

    assert_eq!(std::env::current_dir().unwrap(), before);
    assert_eq!(report.uploaded.len(), 7);

    let mut keys = keys.lock().unwrap().clone();
    keys.sort();
    assert_eq!(
        keys,
        [
            "index.html",
            "local.html",
            "local/plugins/foo.meta.js",
            "local/plugins/foo.user.js",
            "mobile.html",
            "mobile/plugins/foo.meta.js",
            "mobile/plugins/foo.user.js",
        ]
    );
}

#[tokio::test]
#[serial]
async fn deploy_restores_cwd_after_failure() {
    let tmp = tempdir().unwrap();
    write(tmp.path(), "local/plugins/foo.user.js", "// no meta");
    let before = std::env::current_dir().unwrap();

    let store = MockObjectStore::new();
    let err = deploy_site(
        &store,
        tmp.path(),
        &["local"],
        "Site",
        &PublishOptions::new("iitc-test"),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, SiteError::Index(_)));
    assert_eq!(std::env::current_dir().unwrap(), before);
}

#[tokio::test]
#[serial]
async fn deploy_rejects_missing_build_dir() {
    let tmp = tempdir().unwrap();
    let store = MockObjectStore::new();

    let err = deploy_site(
        &store,
        &tmp.path().join("nope"),
        DEFAULT_VARIANTS,
        "Site",
        &PublishOptions::new("iitc-test"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, SiteError::BuildDir { .. }));
}

#[test]
#[serial]
fn scoped_working_dir_restores_on_drop() {
    let tmp = tempdir().unwrap();
    let before = std::env::current_dir().unwrap();
    {
        let guard = ScopedWorkingDir::enter(tmp.path()).unwrap();
        assert_eq!(
            std::env::current_dir().unwrap(),
            fs::canonicalize(tmp.path()).unwrap()
        );
        assert_eq!(guard.original(), before.as_path());
    }
    assert_eq!(std::env::current_dir().unwrap(), before);
}

#[test]
#[serial]
fn scoped_working_dir_restores_after_panic() {
    let tmp = tempdir().unwrap();
    let before = std::env::current_dir().unwrap();
    let path = tmp.path().to_path_buf();

    let result = std::panic::catch_unwind(move || {
        let _guard = ScopedWorkingDir::enter(&path).unwrap();
        panic!("build step blew up");
    });

    assert!(result.is_err());
    assert_eq!(std::env::current_dir().unwrap(), before);
}
