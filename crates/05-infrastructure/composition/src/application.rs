//! 应用主入口

use crate::builder::ApplicationBuilder;
use config_abstractions::ConfigManager;
use config_impl::ConfigManagerImpl;
use di_abstractions::{BeanContainer, ComponentRegistry};
use infrastructure_aop::WeaveReport;
use infrastructure_common::{
    Bean, ClassId, ConfigError, DependencyError, FrameworkSettings, InfrastructureError,
};
use infrastructure_mvc::{DispatchError, Dispatcher, InboundRequest, Reply, RouteTable};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// 已启动的应用
///
/// 启动完成后容器和路由表只读，可以在多个任务之间共享。
pub struct Application {
    settings: Arc<FrameworkSettings>,
    registry: Arc<dyn ComponentRegistry>,
    container: Arc<dyn BeanContainer>,
    dispatcher: Dispatcher,
    weave_report: WeaveReport,
    config: Arc<ConfigManagerImpl>,
}

impl Application {
    /// 创建应用构建器
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    pub(crate) fn new(
        settings: Arc<FrameworkSettings>,
        registry: Arc<dyn ComponentRegistry>,
        container: Arc<dyn BeanContainer>,
        routes: Arc<RouteTable>,
        weave_report: WeaveReport,
        config: Arc<ConfigManagerImpl>,
    ) -> Self {
        let dispatcher = Dispatcher::new(routes, Arc::clone(&container), Arc::clone(&settings));
        Self {
            settings,
            registry,
            container,
            dispatcher,
            weave_report,
            config,
        }
    }

    /// 分发请求
    pub async fn dispatch(&self, request: &InboundRequest) -> Result<Option<Reply>, DispatchError> {
        self.dispatcher.dispatch(request).await
    }

    /// 获取 Bean，织入后返回的是代理
    pub fn get_bean(&self, class_id: &ClassId) -> Result<Bean, DependencyError> {
        self.container.get_bean(class_id)
    }

    pub fn registry(&self) -> &dyn ComponentRegistry {
        self.registry.as_ref()
    }

    pub fn container(&self) -> &dyn BeanContainer {
        self.container.as_ref()
    }

    pub fn routes(&self) -> &RouteTable {
        self.dispatcher.routes()
    }

    pub fn settings(&self) -> &FrameworkSettings {
        &self.settings
    }

    pub fn weave_report(&self) -> &WeaveReport {
        &self.weave_report
    }

    /// 读取配置值
    pub async fn get_config<T>(&self, key: &str) -> Result<T, InfrastructureError>
    where
        T: DeserializeOwned,
    {
        let value = self.config.get_configuration(key).await?;
        serde_json::from_value(value)
            .map_err(|source| InfrastructureError::from(ConfigError::SerializationError { source }))
    }

    /// 读取并绑定配置节
    pub async fn get_section<T>(&self, section_name: &str) -> Result<T, InfrastructureError>
    where
        T: DeserializeOwned + Send,
    {
        Ok(self.config.bind_section(section_name).await?)
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("base_package", &self.settings.base_package)
            .field("beans", &self.container.len())
            .field("routes", &self.dispatcher.routes().len())
            .field("weave_report", &self.weave_report)
            .finish()
    }
}
