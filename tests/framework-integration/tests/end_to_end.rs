//! 示例应用的端到端测试

use di_abstractions::{BeanContainer, ComponentRegistry, ContainerPhase};
use example_app::controller::{UserController, USER_CONTROLLER};
use example_app::service::{UserService, USER_SERVICE};
use example_app::store::{StoreError, UserStore};
use example_app::{builder, TIMING_ASPECT, USER_MODEL};
use infrastructure_aop::LoggingTransactionManager;
use infrastructure_common::{
    ClassId, DependencyError, FrameworkSettings, InvocationError, MarkerKind, Param, Stereotype,
};
use infrastructure_composition::Application;
use infrastructure_mvc::{DispatchError, InboundRequest, Reply};
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::{Arc, Once};

static INIT_LOGGER: Once = Once::new();

fn init_test_logger() {
    INIT_LOGGER.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

struct Fixture {
    app: Application,
    store: Arc<UserStore>,
    transactions: Arc<LoggingTransactionManager>,
}

async fn start() -> Fixture {
    init_test_logger();
    let store = Arc::new(UserStore::seeded());
    let transactions = Arc::new(LoggingTransactionManager::new());
    let app = builder(Arc::clone(&store))
        .with_transaction_manager(Arc::clone(&transactions) as _)
        .build()
        .await
        .unwrap();
    Fixture {
        app,
        store,
        transactions,
    }
}

fn params(pairs: &[(&str, &str)]) -> Param {
    pairs.iter().map(|(k, v)| (*k, json!(v))).collect()
}

#[tokio::test]
async fn test_startup_classifies_and_wires_everything() {
    let Fixture { app, .. } = start().await;
    let registry = app.registry();

    assert_eq!(
        registry.component_classes(),
        [ClassId::new(USER_CONTROLLER), ClassId::new(USER_SERVICE)]
            .into_iter()
            .collect::<BTreeSet<_>>()
    );
    assert!(registry.all_classes().contains(&ClassId::new(USER_MODEL)));
    assert_eq!(
        registry.classes_marked_with(&MarkerKind::Controller),
        registry.classes_with_stereotype(Stereotype::Controller)
    );
    assert!(queries_are_subsets(registry));

    assert_eq!(app.container().phase(), ContainerPhase::Injected);
    assert!(!app.container().contains(&ClassId::new(TIMING_ASPECT)));
    assert_eq!(
        app.weave_report().aspects_of(&ClassId::new(USER_CONTROLLER)),
        [TIMING_ASPECT.to_string()]
    );
    assert_eq!(
        app.weave_report().aspects_of(&ClassId::new(USER_SERVICE)),
        ["transaction".to_string()]
    );
}

/// 注册表查询结果都是全部类的子集
fn queries_are_subsets(registry: &dyn ComponentRegistry) -> bool {
    let all = registry.all_classes();
    registry.component_classes().is_subset(&all)
        && registry.service_classes().is_subset(&all)
        && registry.controller_classes().is_subset(&all)
        && registry.classes_marked_with(&MarkerKind::Aspect).is_subset(&all)
}

#[tokio::test]
async fn test_user_pages() {
    let Fixture { app, .. } = start().await;

    let list = app
        .dispatch(&InboundRequest::new("GET", "/userList"))
        .await
        .unwrap();
    match list {
        Some(Reply::Forward { template, model }) => {
            assert_eq!(template, "/WEB-INF/view/user_list.jsp");
            assert_eq!(model["users"].as_array().unwrap().len(), 3);
        }
        other => panic!("unexpected reply: {other:?}"),
    }

    let info = app
        .dispatch(&InboundRequest::new("GET", "/userInfo").with_params(params(&[("id", "1")])))
        .await
        .unwrap();
    assert_eq!(
        info,
        Some(Reply::Data {
            model: json!({ "id": 1, "name": "alice", "email": "alice@example.com" })
        })
    );

    assert_eq!(
        app.dispatch(&InboundRequest::new("POST", "/userList"))
            .await
            .unwrap(),
        None
    );
}

#[tokio::test]
async fn test_edit_commits_transaction_and_redirects() {
    let Fixture {
        app,
        store,
        transactions,
    } = start().await;

    let reply = app
        .dispatch(
            &InboundRequest::new("GET", "/userEdit")
                .with_params(params(&[("id", "2"), ("name", "robert")])),
        )
        .await
        .unwrap();

    assert_eq!(
        reply,
        Some(Reply::Redirect {
            location: "/userList".to_string()
        })
    );
    assert_eq!(store.get(2).unwrap().name, "robert");
    let stats = transactions.stats();
    assert_eq!((stats.begun, stats.committed, stats.rolled_back), (1, 1, 0));
}

#[tokio::test]
async fn test_failed_edit_rolls_back_and_keeps_error() {
    let Fixture {
        app, transactions, ..
    } = start().await;

    let result = app
        .dispatch(
            &InboundRequest::new("GET", "/userEdit")
                .with_params(params(&[("id", "9"), ("name", "nobody")])),
        )
        .await;

    match result {
        Err(DispatchError::Invocation { source }) => {
            assert_eq!(
                source.downcast_ref::<StoreError>(),
                Some(&StoreError::UserNotFound { id: 9 })
            );
        }
        other => panic!("unexpected result: {other:?}"),
    }
    let stats = transactions.stats();
    assert_eq!((stats.begun, stats.committed, stats.rolled_back), (1, 0, 1));

    // 非事务方法不经过事务管理器
    app.dispatch(&InboundRequest::new("GET", "/userInfo").with_params(params(&[("id", "2")])))
        .await
        .unwrap();
    assert_eq!(transactions.stats().begun, 1);
}

#[tokio::test]
async fn test_missing_parameter_is_an_invalid_argument() {
    let Fixture { app, .. } = start().await;

    let result = app.dispatch(&InboundRequest::new("GET", "/userInfo")).await;
    assert!(matches!(
        result,
        Err(DispatchError::Invocation {
            source: InvocationError::InvalidArgument { .. }
        })
    ));
}

#[tokio::test]
async fn test_beans_keep_identity_and_typed_access() {
    let Fixture { app, .. } = start().await;

    let first = app.get_bean(&ClassId::new(USER_SERVICE)).unwrap();
    let second = app.get_bean(&ClassId::new(USER_SERVICE)).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(first.is_proxy());
    assert_eq!(first.downcast_ref::<UserService>().unwrap().store().len(), 3);

    let controller = app.get_bean(&ClassId::new(USER_CONTROLLER)).unwrap();
    assert!(controller.is_proxy());
    assert!(controller.downcast_ref::<UserController>().is_some());

    assert!(matches!(
        app.get_bean(&ClassId::new(USER_MODEL)),
        Err(DependencyError::BeanNotFound { .. })
    ));
}

#[tokio::test]
async fn test_container_is_sealed_after_startup() {
    let Fixture { app, .. } = start().await;
    let container = app.container();
    let bean = container.get_bean(&ClassId::new(USER_SERVICE)).unwrap();

    assert!(matches!(
        container.set_bean(&ClassId::new(USER_SERVICE), bean),
        Err(DependencyError::PhaseViolation { .. })
    ));
    assert!(matches!(
        container.instantiate(&ClassId::new(USER_SERVICE)),
        Err(DependencyError::PhaseViolation { .. })
    ));
    assert!(matches!(
        container.inject_dependencies(),
        Err(DependencyError::PhaseViolation { .. })
    ));
}

#[tokio::test]
async fn test_concurrent_requests() {
    let Fixture { app, .. } = start().await;
    let app = Arc::new(app);

    let handles: Vec<_> = (0..16u64)
        .map(|i| {
            let app = Arc::clone(&app);
            tokio::spawn(async move {
                let id = i % 3 + 1;
                let request = InboundRequest::new("GET", "/userInfo")
                    .with_params([("id", json!(id))].into_iter().collect());
                (id, app.dispatch(&request).await)
            })
        })
        .collect();

    for handle in handles {
        let (id, reply) = handle.await.unwrap();
        match reply.unwrap() {
            Some(Reply::Data { model }) => assert_eq!(model["id"], json!(id)),
            other => panic!("unexpected reply: {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_context_path_and_view_path() {
    init_test_logger();
    let app = Application::builder()
        .with_settings(FrameworkSettings {
            base_package: "demo".to_string(),
            context_path: Some("/admin".to_string()),
            view_path: "/templates/".to_string(),
            ..FrameworkSettings::default()
        })
        .register_classes(example_app::classes(Arc::new(UserStore::seeded())))
        .build()
        .await
        .unwrap();

    match app
        .dispatch(&InboundRequest::new("GET", "/admin/userList"))
        .await
        .unwrap()
    {
        Some(Reply::Forward { template, .. }) => assert_eq!(template, "/templates/user_list.jsp"),
        other => panic!("unexpected reply: {other:?}"),
    }
    assert_eq!(
        app.dispatch(&InboundRequest::new("GET", "/userList"))
            .await
            .unwrap(),
        None
    );
}
