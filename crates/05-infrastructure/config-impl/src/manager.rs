//! 配置管理器实现

use async_trait::async_trait;
use config_abstractions::{ConfigManager, ConfigProvider};
use infrastructure_common::{ConfigError, ConfigSection, FrameworkSettings};
use serde_json::Value;
use tracing::{debug, info};

/// 分层配置管理器
///
/// 提供者按优先级从高到低保存；优先级相同时先注册的在前。
#[derive(Default)]
pub struct ConfigManagerImpl {
    providers: Vec<Box<dyn ConfigProvider>>,
}

impl std::fmt::Debug for ConfigManagerImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigManagerImpl")
            .field("providers", &self.provider_names())
            .finish()
    }
}

impl ConfigManagerImpl {
    /// 创建新的配置管理器
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取配置提供者数量
    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// 读取框架配置
    ///
    /// 没有任何提供者包含 `framework` 节时使用默认值。
    pub async fn framework_settings(&self) -> Result<FrameworkSettings, ConfigError> {
        let settings = match self.bind_section::<FrameworkSettings>(FrameworkSettings::SECTION).await {
            Ok(settings) => settings,
            Err(ConfigError::KeyNotFound { .. }) => {
                debug!("未找到 {} 配置节，使用默认框架配置", FrameworkSettings::SECTION);
                FrameworkSettings::default()
            }
            Err(e) => return Err(e),
        };
        settings.validate()?;
        Ok(settings)
    }
}

#[async_trait]
impl ConfigManager for ConfigManagerImpl {
    async fn register_provider(
        &mut self,
        provider: Box<dyn ConfigProvider>,
    ) -> Result<(), ConfigError> {
        info!(
            "注册配置提供者: {} (优先级 {})",
            provider.name(),
            provider.priority()
        );

        self.providers.push(provider);
        // 稳定排序，优先级高的在前
        self.providers
            .sort_by(|a, b| b.priority().cmp(&a.priority()));

        Ok(())
    }

    async fn get_configuration(&self, key: &str) -> Result<Value, ConfigError> {
        for provider in &self.providers {
            match provider.get_configuration(key).await {
                Ok(value) => {
                    debug!("配置 {} 来自 {}", key, provider.name());
                    return Ok(value);
                }
                Err(ConfigError::KeyNotFound { .. }) => continue,
                Err(e) => return Err(e),
            }
        }

        Err(ConfigError::KeyNotFound {
            key: key.to_string(),
        })
    }

    async fn get_section(&self, section_name: &str) -> Result<ConfigSection, ConfigError> {
        let mut merged: Option<ConfigSection> = None;

        // 从低优先级到高优先级逐层覆盖
        for provider in self.providers.iter().rev() {
            match provider.get_section(section_name).await {
                Ok(section) => {
                    debug!("合并配置节 {} 来自 {}", section_name, provider.name());
                    merged.get_or_insert_with(ConfigSection::new).merge(&section);
                }
                Err(ConfigError::KeyNotFound { .. }) => continue,
                Err(e) => return Err(e),
            }
        }

        merged.ok_or_else(|| ConfigError::KeyNotFound {
            key: section_name.to_string(),
        })
    }

    async fn reload_all(&mut self) -> Result<(), ConfigError> {
        for provider in &mut self.providers {
            provider.reload().await?;
            debug!("已重新加载配置提供者: {}", provider.name());
        }
        info!("全部配置提供者已重新加载");
        Ok(())
    }

    fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{EnvironmentConfigProvider, JsonConfigProvider, TomlConfigProvider};
    use infrastructure_common::{ClassPathKind, DuplicateRoutePolicy, WeavingPolicy};
    use serde_json::json;
    use std::path::PathBuf;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    async fn layered_manager(dir: &tempfile::TempDir) -> ConfigManagerImpl {
        let toml_path = write(
            dir,
            "app.toml",
            r#"
[framework]
base_package = "demo"
context_path = "/demo"

[framework.extra]
a = 1
b = 2
"#,
        );
        let json_path = write(
            dir,
            "app.json",
            r#"{ "framework": { "base_package": "ignored", "view_path": "/views/", "extra": { "b": 20, "c": 30 } } }"#,
        );

        let mut manager = ConfigManagerImpl::new();
        manager
            .register_provider(Box::new(JsonConfigProvider::new(json_path).unwrap()))
            .await
            .unwrap();
        manager
            .register_provider(Box::new(TomlConfigProvider::new(toml_path).unwrap()))
            .await
            .unwrap();
        manager
            .register_provider(Box::new(EnvironmentConfigProvider::from_vars(
                "LORN",
                [("LORN__FRAMEWORK__WEAVING", "strict")],
            )))
            .await
            .unwrap();
        manager
    }

    #[tokio::test]
    async fn test_providers_are_ordered_by_priority() {
        let dir = tempfile::tempdir().unwrap();
        let manager = layered_manager(&dir).await;

        assert_eq!(
            manager.provider_names(),
            vec!["EnvironmentConfigProvider", "TomlConfigProvider", "JsonConfigProvider"]
        );
        assert_eq!(
            manager.get_configuration("framework.base_package").await.unwrap(),
            json!("demo")
        );
        assert_eq!(
            manager.get_configuration("framework.view_path").await.unwrap(),
            json!("/views/")
        );
        assert!(matches!(
            manager.get_configuration("framework.nothing").await,
            Err(ConfigError::KeyNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_sections_merge_with_higher_priority_winning() {
        let dir = tempfile::tempdir().unwrap();
        let manager = layered_manager(&dir).await;

        let section = manager.get_section("framework").await.unwrap();
        assert_eq!(section.get("base_package"), Some(&json!("demo")));
        assert_eq!(section.get("weaving"), Some(&json!("strict")));
        assert_eq!(section.get("view_path"), Some(&json!("/views/")));
        assert_eq!(section.get("extra"), Some(&json!({ "a": 1, "b": 2, "c": 30 })));
    }

    #[tokio::test]
    async fn test_framework_settings_binding() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = layered_manager(&dir).await;
        let archive = write(
            &dir,
            "classes.toml",
            r#"
[[framework.class_path]]
kind = "archive"
path = "lib/app.jar"
"#,
        );
        manager
            .register_provider(Box::new(
                TomlConfigProvider::new(archive).unwrap().with_priority(10),
            ))
            .await
            .unwrap();

        let settings = manager.framework_settings().await.unwrap();
        assert_eq!(settings.base_package, "demo");
        assert_eq!(settings.weaving, WeavingPolicy::Strict);
        assert_eq!(settings.duplicate_routes, DuplicateRoutePolicy::Reject);
        assert_eq!(settings.context_path.as_deref(), Some("/demo"));
        assert_eq!(settings.view_path, "/views/");
        assert_eq!(settings.asset_path, "/asset/");
        assert_eq!(settings.class_path.len(), 1);
        assert_eq!(settings.class_path[0].kind, ClassPathKind::Archive);
    }

    #[tokio::test]
    async fn test_missing_framework_section_uses_defaults() {
        let manager = ConfigManagerImpl::new();

        assert!(matches!(
            manager.get_section("framework").await,
            Err(ConfigError::KeyNotFound { .. })
        ));
        assert_eq!(
            manager.framework_settings().await.unwrap(),
            FrameworkSettings::default()
        );
    }

    #[tokio::test]
    async fn test_invalid_policy_is_rejected() {
        let mut manager = ConfigManagerImpl::new();
        manager
            .register_provider(Box::new(EnvironmentConfigProvider::from_vars(
                "LORN",
                [("LORN__FRAMEWORK__WEAVING", "sometimes")],
            )))
            .await
            .unwrap();

        assert!(matches!(
            manager.framework_settings().await,
            Err(ConfigError::SerializationError { .. })
        ));
    }

    #[tokio::test]
    async fn test_reload_all() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "app.toml", "[framework]\nbase_package = \"demo\"\n");
        let mut manager = ConfigManagerImpl::new();
        manager
            .register_provider(Box::new(TomlConfigProvider::new(&path).unwrap()))
            .await
            .unwrap();

        std::fs::write(&path, "[framework]\nbase_package = \"shop\"\n").unwrap();
        manager.reload_all().await.unwrap();

        assert_eq!(
            manager.framework_settings().await.unwrap().base_package,
            "shop"
        );
    }
}
