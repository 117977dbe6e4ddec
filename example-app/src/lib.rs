//! # 用户管理示例
//!
//! 一个控制器、一个服务、一个计时切面类，演示扫描、注入、织入和路由。

pub mod controller;
pub mod service;
pub mod store;

use controller::{UserController, USER_CONTROLLER};
use infrastructure_aop::{aspect_metadata, Aspect, AspectDefinitionExt, AspectFactory, TimingAspect};
use infrastructure_common::{
    AspectMarker, Bean, ClassDefinition, ClassMetadata, MethodMetadata,
};
use infrastructure_composition::{Application, ApplicationBuilder};
use service::{UserService, USER_SERVICE, USER_SERVICE_API};
use std::sync::Arc;
use std::time::Duration;
use store::UserStore;

/// 示例应用的基础命名空间
pub const BASE_PACKAGE: &str = "demo";
/// 计时切面类
pub const TIMING_ASPECT: &str = "demo::aspect::ControllerTimingAspect";
/// 用户实体类
pub const USER_MODEL: &str = "demo::model::User";

/// 计时切面的慢调用阈值
const SLOW_THRESHOLD: Duration = Duration::from_millis(200);

/// 示例应用的全部类定义
pub fn classes(store: Arc<UserStore>) -> Vec<ClassDefinition> {
    vec![
        ClassDefinition::component::<UserController>(
            ClassMetadata::new(USER_CONTROLLER)
                .controller()
                .with_method(MethodMetadata::new("user_list").get("/userList"))
                .with_method(MethodMetadata::new("user_info").get("/userInfo"))
                .with_method(MethodMetadata::new("user_edit").get("/userEdit")),
        )
        .with_autowired::<UserController>("user_service", USER_SERVICE_API, |c| {
            &c.user_service
        }),
        ClassDefinition::new(
            ClassMetadata::new(USER_SERVICE)
                .service()
                .implements(USER_SERVICE_API)
                .with_method(MethodMetadata::new("get_user_list"))
                .with_method(MethodMetadata::new("get_user_info"))
                .with_method(MethodMetadata::new("update_user").transactional()),
        )
        .with_constructor(move || Ok(Arc::new(UserService::new(Arc::clone(&store))) as Bean)),
        ClassDefinition::new(aspect_metadata(
            TIMING_ASPECT,
            AspectMarker::class("demo::controller", "UserController"),
        ))
        .with_aspect_factory(AspectFactory::new(|| {
            Ok(Arc::new(TimingAspect::new().with_slow_threshold(SLOW_THRESHOLD)) as Arc<dyn Aspect>)
        })),
        ClassDefinition::new(ClassMetadata::new(USER_MODEL)),
    ]
}

/// 注册了示例类的构建器
pub fn builder(store: Arc<UserStore>) -> ApplicationBuilder {
    Application::builder()
        .with_base_package(BASE_PACKAGE)
        .register_classes(classes(store))
}

