//! 应用构建与启动流程测试

use crate::{Application, ApplicationBuilder, LoggingConfig};
use async_trait::async_trait;
use di_abstractions::{BeanContainer, ComponentRegistry, ContainerPhase};
use infrastructure_aop::{AspectFactory, AspectRegistration, AspectTarget, TimingAspect};
use infrastructure_common::{
    Arguments, Autowired, ClassDefinition, ClassId, ClassMetadata, Component, ComponentError,
    FrameworkSettings, InfrastructureError, InvocationError, InvocationResult, MethodMetadata,
    Param, ReturnValue, WeavingError, WeavingPolicy,
};
use infrastructure_mvc::{InboundRequest, Reply};
use serde_json::json;
use std::any::Any;
use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// 初始化测试日志系统（只初始化一次）
fn init_test_logger() {
    INIT_LOGGER.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

const CONTROLLER: &str = "shop::controller::CartController";
const SERVICE: &str = "shop::service::CartService";
const SERVICE_API: &str = "shop::service::ICartService";

#[derive(Debug, Default)]
struct CartController {
    cart_service: Autowired,
}

#[async_trait]
impl Component for CartController {
    async fn invoke(&self, method: &str, args: &Arguments) -> InvocationResult {
        match method {
            "count" => {
                let count: u32 = self.cart_service.call("count", Arguments::new()).await?;
                Ok(ReturnValue::Value(json!({ "count": count })))
            }
            "add" => {
                let params: Param = args.get(0)?;
                let quantity = params.get_as::<u32>("quantity").unwrap_or(1);
                let total: u32 = self
                    .cart_service
                    .call("add", Arguments::new().with(json!(quantity)))
                    .await?;
                Ok(ReturnValue::Value(json!({ "total": total })))
            }
            _ => Err(InvocationError::no_such_method(CONTROLLER, method)),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Default)]
struct CartService;

#[async_trait]
impl Component for CartService {
    async fn invoke(&self, method: &str, args: &Arguments) -> InvocationResult {
        match method {
            "count" => Ok(ReturnValue::Value(json!(2))),
            "add" => {
                let quantity: u32 = args.get(0)?;
                Ok(ReturnValue::Value(json!(2 + quantity)))
            }
            _ => Err(InvocationError::no_such_method(SERVICE, method)),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn shop_classes() -> Vec<ClassDefinition> {
    vec![
        ClassDefinition::component::<CartController>(
            ClassMetadata::new(CONTROLLER)
                .controller()
                .with_method(MethodMetadata::new("count").get("/cart"))
                .with_method(MethodMetadata::new("add").post("/cart")),
        )
        .with_autowired::<CartController>("cart_service", SERVICE_API, |c| &c.cart_service),
        ClassDefinition::component::<CartService>(
            ClassMetadata::new(SERVICE)
                .service()
                .implements(SERVICE_API)
                .with_method(MethodMetadata::new("count"))
                .with_method(MethodMetadata::new("add").transactional()),
        ),
        ClassDefinition::new(ClassMetadata::new("shop::model::CartItem")),
    ]
}

fn shop_builder() -> ApplicationBuilder {
    Application::builder()
        .with_base_package("shop")
        .register_classes(shop_classes())
}

#[tokio::test]
async fn test_builds_and_dispatches() {
    init_test_logger();
    let app = shop_builder().build().await.unwrap();

    assert_eq!(app.container().phase(), ContainerPhase::Injected);
    assert_eq!(app.registry().component_classes().len(), 2);
    assert_eq!(app.routes().len(), 2);
    assert_eq!(
        app.weave_report().aspects_of(&ClassId::new(SERVICE)),
        ["transaction".to_string()]
    );

    let reply = app
        .dispatch(&InboundRequest::new("GET", "/cart"))
        .await
        .unwrap();
    assert_eq!(reply, Some(Reply::Data { model: json!({ "count": 2 }) }));

    let params: Param = [("quantity", json!("3"))].into_iter().collect();
    let reply = app
        .dispatch(&InboundRequest::new("POST", "/cart").with_params(params))
        .await
        .unwrap();
    assert_eq!(reply, Some(Reply::Data { model: json!({ "total": 5 }) }));
}

#[tokio::test]
async fn test_beans_are_reachable_through_proxies() {
    let app = shop_builder().build().await.unwrap();

    let service = app.get_bean(&ClassId::new(SERVICE)).unwrap();
    assert!(service.is_proxy());
    assert!(service.downcast_ref::<CartService>().is_some());

    let controller = app.get_bean(&ClassId::new(CONTROLLER)).unwrap();
    assert!(!controller.is_proxy());
    let controller = controller.downcast_ref::<CartController>().unwrap();
    assert!(controller.cart_service.is_injected());
}

#[tokio::test]
async fn test_settings_come_from_config_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.toml");
    std::fs::write(
        &path,
        r#"
[framework]
base_package = "shop"
context_path = "/store"

[shop]
currency = "EUR"
"#,
    )
    .unwrap();

    let app = Application::builder()
        .add_config_toml(&path)
        .unwrap()
        .register_classes(shop_classes())
        .build()
        .await
        .unwrap();

    assert_eq!(app.settings().context_path.as_deref(), Some("/store"));
    assert_eq!(
        app.get_config::<String>("shop.currency").await.unwrap(),
        "EUR"
    );
    assert!(app
        .dispatch(&InboundRequest::new("GET", "/store/cart"))
        .await
        .unwrap()
        .is_some());
    assert!(app
        .dispatch(&InboundRequest::new("GET", "/cart/extra"))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_missing_base_package_fails() {
    let result = Application::builder()
        .register_classes(shop_classes())
        .build()
        .await;

    assert!(matches!(
        result,
        Err(InfrastructureError::BootstrapFailed { .. })
    ));
}

#[tokio::test]
async fn test_duplicate_class_fails() {
    let result = shop_builder()
        .register_class(ClassDefinition::new(ClassMetadata::new("shop::model::CartItem")))
        .build()
        .await;

    assert!(matches!(
        result,
        Err(InfrastructureError::ComponentError {
            source: ComponentError::DuplicateClass { .. }
        })
    ));
}

#[tokio::test]
async fn test_unresolvable_aspect_target_follows_policy() {
    let missing = || {
        AspectRegistration::new(
            "timing",
            AspectTarget::Class(ClassId::new("shop::controller::Missing")),
            AspectFactory::of::<TimingAspect>(),
        )
    };

    let lenient = shop_builder().add_aspect(missing()).build().await.unwrap();
    assert!(lenient.weave_report().is_degraded());
    assert!(!lenient.get_bean(&ClassId::new(SERVICE)).unwrap().is_proxy());

    let strict = shop_builder()
        .with_settings(FrameworkSettings {
            base_package: "shop".to_string(),
            weaving: WeavingPolicy::Strict,
            ..FrameworkSettings::default()
        })
        .add_aspect(missing())
        .build()
        .await;
    assert!(matches!(
        strict,
        Err(InfrastructureError::WeavingError {
            source: WeavingError::AspectTargetNotFound { .. }
        })
    ));
}

#[test]
fn test_logging_presets() {
    let development = LoggingConfig::development();
    assert_eq!(development.level, tracing::Level::DEBUG);
    assert!(!development.json_format);

    let production = LoggingConfig::production().with_filter("infrastructure_aop=debug");
    assert!(production.json_format);
    assert_eq!(production.filter.as_deref(), Some("infrastructure_aop=debug"));
}
