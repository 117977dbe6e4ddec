//! 配置相关的基础类型定义

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// 配置节
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigSection {
    /// 配置数据
    pub data: HashMap<String, serde_json::Value>,
}

impl ConfigSection {
    /// 创建新的配置节
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入配置项
    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.data.insert(key.into(), value);
    }

    /// 获取配置项
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// 合并另一个配置节，同名对象递归合并，其余以 `other` 为准
    pub fn merge(&mut self, other: &ConfigSection) {
        for (key, value) in &other.data {
            match self.data.get_mut(key) {
                Some(existing) => merge_value(existing, value),
                None => {
                    self.data.insert(key.clone(), value.clone());
                }
            }
        }
    }

    /// 绑定到具体类型
    pub fn bind<T>(&self) -> Result<T, ConfigError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let value = serde_json::Value::Object(
            self.data
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        );

        serde_json::from_value(value).map_err(|e| ConfigError::SerializationError { source: e })
    }
}

fn merge_value(target: &mut serde_json::Value, source: &serde_json::Value) {
    match (target, source) {
        (serde_json::Value::Object(target), serde_json::Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(key) {
                    Some(existing) => merge_value(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, source) => *target = source.clone(),
    }
}

/// 切面织入失败时的处理策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeavingPolicy {
    /// 记录错误，跳过所有代理安装，继续启动
    #[default]
    Lenient,
    /// 织入失败即启动失败
    Strict,
}

/// 路由重复时的处理策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateRoutePolicy {
    /// 启动失败
    #[default]
    Reject,
    /// 后声明的覆盖先声明的
    Overwrite,
}

/// 类路径条目类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassPathKind {
    Directory,
    Archive,
}

/// 类路径条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassPathEntry {
    pub kind: ClassPathKind,
    pub path: PathBuf,
}

/// 框架配置，对应配置中的 `framework` 节
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameworkSettings {
    /// 扫描的基础命名空间
    pub base_package: String,
    /// 织入失败策略
    pub weaving: WeavingPolicy,
    /// 路由重复策略
    pub duplicate_routes: DuplicateRoutePolicy,
    /// 应用上下文路径，分发前从请求路径中去掉
    pub context_path: Option<String>,
    /// 视图模板路径前缀
    pub view_path: String,
    /// 静态资源路径前缀，该前缀下的请求不经过路由，交给传输层处理
    pub asset_path: String,
    /// 类路径目录中类单元文件的扩展名
    pub unit_extension: String,
    /// 额外的类路径条目
    pub class_path: Vec<ClassPathEntry>,
}

impl FrameworkSettings {
    /// 配置节名称
    pub const SECTION: &'static str = "framework";

    /// 指定基础命名空间
    pub fn with_base_package(mut self, base_package: impl Into<String>) -> Self {
        self.base_package = base_package.into();
        self
    }

    /// 去掉上下文路径后的请求路径
    pub fn strip_context_path<'a>(&self, path: &'a str) -> &'a str {
        match self.context_path.as_deref().map(|p| p.trim_end_matches('/')) {
            Some(context) if !context.is_empty() => match path.strip_prefix(context) {
                Some("") => "/",
                Some(rest) if rest.starts_with('/') => rest,
                _ => path,
            },
            _ => path,
        }
    }

    /// 是否为静态资源路径（已去掉上下文路径）
    pub fn is_asset_path(&self, path: &str) -> bool {
        let prefix = self.asset_path.trim_end_matches('/');
        if prefix.is_empty() {
            return false;
        }
        match path.strip_prefix(prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    /// 校验配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.unit_extension.is_empty() || self.unit_extension.contains('.') {
            return Err(ConfigError::ValidationError {
                message: format!("无效的类单元扩展名: {:?}", self.unit_extension),
            });
        }
        if let Some(context) = &self.context_path {
            if !context.is_empty() && !context.starts_with('/') {
                return Err(ConfigError::ValidationError {
                    message: format!("上下文路径必须以 / 开头: {context}"),
                });
            }
        }
        Ok(())
    }
}

impl Default for FrameworkSettings {
    fn default() -> Self {
        Self {
            base_package: String::new(),
            weaving: WeavingPolicy::default(),
            duplicate_routes: DuplicateRoutePolicy::default(),
            context_path: None,
            view_path: "/WEB-INF/view/".to_string(),
            asset_path: "/asset/".to_string(),
            unit_extension: "unit".to_string(),
            class_path: Vec::new(),
        }
    }
}
