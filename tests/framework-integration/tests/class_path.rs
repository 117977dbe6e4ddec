//! 类路径目录与归档文件参与扫描

use example_app::controller::USER_CONTROLLER;
use example_app::store::UserStore;
use example_app::{builder, classes};
use infrastructure_common::{ClassId, ComponentError, InfrastructureError};
use infrastructure_composition::Application;
use infrastructure_mvc::{InboundRequest, Reply};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

fn touch(root: &Path, relative: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"").unwrap();
}

fn write_archive(path: &Path, entries: &[&str]) {
    let file = fs::File::create(path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    for entry in entries {
        writer
            .start_file(*entry, zip::write::FileOptions::default())
            .unwrap();
        writer.write_all(b"").unwrap();
    }
    writer.finish().unwrap();
}

#[tokio::test]
async fn test_directory_units_of_known_classes_are_merged() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "demo/controller/UserController.unit");
    touch(dir.path(), "demo/controller/README.txt");
    touch(dir.path(), "other/Ignored.unit");

    let app = builder(Arc::new(UserStore::seeded()))
        .add_class_path_directory(dir.path())
        .build()
        .await
        .unwrap();

    assert!(app
        .registry()
        .all_classes()
        .contains(&ClassId::new(USER_CONTROLLER)));
    assert!(matches!(
        app.dispatch(&InboundRequest::new("GET", "/userList"))
            .await
            .unwrap(),
        Some(Reply::Forward { .. })
    ));
}

#[tokio::test]
async fn test_unknown_unit_in_directory_fails_startup() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "demo/plugin/AuditLog.unit");

    let result = builder(Arc::new(UserStore::seeded()))
        .add_class_path_directory(dir.path())
        .build()
        .await;

    match result {
        Err(InfrastructureError::ComponentError {
            source: ComponentError::ClassNotFound { class_id },
        }) => assert_eq!(class_id, "demo::plugin::AuditLog"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_archive_units_are_scanned() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("plugins.zip");
    write_archive(
        &archive,
        &["demo/service/UserService.unit", "demo/plugin/AuditLog.unit"],
    );

    let result = builder(Arc::new(UserStore::seeded()))
        .add_class_path_archive(&archive)
        .build()
        .await;
    assert!(matches!(
        result,
        Err(InfrastructureError::ComponentError {
            source: ComponentError::ClassNotFound { .. }
        })
    ));

    let known = dir.path().join("known.zip");
    write_archive(&known, &["demo/service/UserService.unit"]);
    let app = builder(Arc::new(UserStore::seeded()))
        .add_class_path_archive(&known)
        .build()
        .await
        .unwrap();
    assert_eq!(app.registry().component_classes().len(), 2);
}

#[tokio::test]
async fn test_unreadable_class_path_is_a_scan_error() {
    let dir = tempfile::tempdir().unwrap();

    let result = Application::builder()
        .with_base_package("demo")
        .register_classes(classes(Arc::new(UserStore::seeded())))
        .add_class_path_directory(dir.path().join("missing"))
        .build()
        .await;

    assert!(matches!(
        result,
        Err(InfrastructureError::ComponentError {
            source: ComponentError::ScanError { .. }
        })
    ));
}
