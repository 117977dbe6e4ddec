//! 配置管理器抽象接口

use crate::provider::ConfigProvider;
use async_trait::async_trait;
use infrastructure_common::{ConfigError, ConfigSection};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// 配置管理器 trait
///
/// 协调多个配置提供者：单个键取优先级最高的提供者，
/// 配置节按优先级从低到高逐层合并。
#[async_trait]
pub trait ConfigManager: Send + Sync {
    /// 注册配置提供者
    async fn register_provider(
        &mut self,
        provider: Box<dyn ConfigProvider>,
    ) -> Result<(), ConfigError>;

    /// 获取配置值
    async fn get_configuration(&self, key: &str) -> Result<Value, ConfigError>;

    /// 获取合并后的配置节
    async fn get_section(&self, section_name: &str) -> Result<ConfigSection, ConfigError>;

    /// 重新加载所有提供者
    async fn reload_all(&mut self) -> Result<(), ConfigError>;

    /// 已注册的提供者名称（优先级从高到低）
    fn provider_names(&self) -> Vec<String>;

    /// 将配置节绑定到具体类型
    async fn bind_section<T>(&self, section_name: &str) -> Result<T, ConfigError>
    where
        Self: Sized,
        T: DeserializeOwned + Send,
    {
        self.get_section(section_name).await?.bind()
    }
}
