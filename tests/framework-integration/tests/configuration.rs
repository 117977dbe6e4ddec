//! 配置文件与环境变量驱动的启动

use config_impl::EnvironmentConfigProvider;
use example_app::store::UserStore;
use example_app::classes;
use example_app::controller::USER_CONTROLLER;
use infrastructure_aop::{AspectFactory, AspectRegistration, AspectTarget, TimingAspect};
use infrastructure_common::{
    ClassId, ConfigError, DuplicateRoutePolicy, InfrastructureError, WeavingError, WeavingPolicy,
};
use infrastructure_composition::{Application, ApplicationBuilder};
use infrastructure_mvc::{InboundRequest, Reply};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

fn demo_builder() -> ApplicationBuilder {
    Application::builder().register_classes(classes(Arc::new(UserStore::seeded())))
}

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn missing_target() -> AspectRegistration {
    AspectRegistration::new(
        "audit",
        AspectTarget::Class(ClassId::new("demo::controller::AuditController")),
        AspectFactory::of::<TimingAspect>(),
    )
}

#[derive(Debug, Deserialize, PartialEq)]
struct Paging {
    page_size: u32,
    max_pages: u32,
}

#[tokio::test]
async fn test_toml_settings_and_custom_sections() {
    let dir = tempfile::tempdir().unwrap();
    let toml = write(
        dir.path(),
        "app.toml",
        r#"
[framework]
base_package = "demo"
context_path = "/app"
duplicate_routes = "overwrite"

[paging]
page_size = 20
max_pages = 5
"#,
    );

    let app = demo_builder()
        .add_config_toml(&toml)
        .unwrap()
        .build()
        .await
        .unwrap();

    assert_eq!(app.settings().context_path.as_deref(), Some("/app"));
    assert_eq!(
        app.settings().duplicate_routes,
        DuplicateRoutePolicy::Overwrite
    );
    assert_eq!(
        app.get_section::<Paging>("paging").await.unwrap(),
        Paging {
            page_size: 20,
            max_pages: 5
        }
    );
    assert!(matches!(
        app.dispatch(&InboundRequest::new("GET", "/app/userList"))
            .await
            .unwrap(),
        Some(Reply::Forward { .. })
    ));
}

#[tokio::test]
async fn test_environment_overrides_files() {
    let dir = tempfile::tempdir().unwrap();
    let toml = write(
        dir.path(),
        "app.toml",
        "[framework]\nbase_package = \"demo\"\ncontext_path = \"/toml\"\n",
    );
    let json = write(
        dir.path(),
        "app.json",
        r#"{ "framework": { "context_path": "/json", "view_path": "/views/" } }"#,
    );
    let env = EnvironmentConfigProvider::from_vars(
        "LORN",
        [("LORN__FRAMEWORK__CONTEXT_PATH", "/env")],
    );

    let app = demo_builder()
        .add_config_toml(&toml)
        .unwrap()
        .add_config_json(&json)
        .unwrap()
        .add_config_provider(env)
        .build()
        .await
        .unwrap();

    let settings = app.settings();
    assert_eq!(settings.base_package, "demo");
    assert_eq!(settings.context_path.as_deref(), Some("/env"));
    assert_eq!(settings.view_path, "/views/");
}

#[tokio::test]
async fn test_weaving_policy_from_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let lenient = write(
        dir.path(),
        "lenient.toml",
        "[framework]\nbase_package = \"demo\"\nweaving = \"lenient\"\n",
    );
    let strict = write(
        dir.path(),
        "strict.toml",
        "[framework]\nbase_package = \"demo\"\nweaving = \"strict\"\n",
    );

    let app = demo_builder()
        .add_config_toml(&lenient)
        .unwrap()
        .add_aspect(missing_target())
        .build()
        .await
        .unwrap();
    assert_eq!(app.settings().weaving, WeavingPolicy::Lenient);
    assert!(app.weave_report().is_degraded());
    assert!(app
        .weave_report()
        .aspects_of(&ClassId::new(USER_CONTROLLER))
        .is_empty());
    // 降级后请求仍按无代理方式处理
    assert!(app
        .dispatch(&InboundRequest::new("GET", "/userList"))
        .await
        .unwrap()
        .is_some());

    let result = demo_builder()
        .add_config_toml(&strict)
        .unwrap()
        .add_aspect(missing_target())
        .build()
        .await;
    assert!(matches!(
        result,
        Err(InfrastructureError::WeavingError {
            source: WeavingError::AspectTargetNotFound { .. }
        })
    ));
}

#[tokio::test]
async fn test_invalid_settings_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let toml = write(
        dir.path(),
        "app.toml",
        "[framework]\nbase_package = \"demo\"\ncontext_path = \"app\"\n",
    );

    let result = demo_builder()
        .add_config_toml(&toml)
        .unwrap()
        .build()
        .await;

    assert!(matches!(
        result,
        Err(InfrastructureError::ConfigError {
            source: ConfigError::ValidationError { .. }
        })
    ));
    assert!(demo_builder()
        .add_config_toml(dir.path().join("absent.toml"))
        .is_err());
}
