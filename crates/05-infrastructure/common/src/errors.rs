//! 错误类型定义

use crate::metadata::RequestMethod;
use thiserror::Error;

/// 通用的装箱错误
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置文件读取失败: {source}")]
    FileReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("配置解析失败: {source}")]
    ParseError { source: BoxError },

    #[error("配置验证失败: {message}")]
    ValidationError { message: String },

    #[error("配置序列化失败: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },

    #[error("配置键不存在: {key}")]
    KeyNotFound { key: String },

    #[error("配置类型转换失败: {message}")]
    TypeConversionError { message: String },
}

/// 组件错误类型
///
/// 类路径扫描与类加载阶段产生的错误。
#[derive(Error, Debug)]
pub enum ComponentError {
    #[error("组件扫描失败: {message}")]
    ScanError { message: String },

    #[error("类不存在: {class_id}")]
    ClassNotFound { class_id: String },

    #[error("类重复注册: {class_id}")]
    DuplicateClass { class_id: String },

    #[error("组件元数据无效: {message}")]
    InvalidMetadata { message: String },
}

impl ComponentError {
    /// 创建扫描错误
    pub fn scan_error(message: impl Into<String>) -> Self {
        Self::ScanError {
            message: message.into(),
        }
    }

    /// 创建类不存在错误
    pub fn class_not_found(class_id: impl Into<String>) -> Self {
        Self::ClassNotFound {
            class_id: class_id.into(),
        }
    }
}

/// 依赖注入错误类型
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("Bean 不存在: {class_id}")]
    BeanNotFound { class_id: String },

    #[error("组件创建失败: {class_id}, 原因: {source}")]
    ComponentCreationFailed { class_id: String, source: BoxError },

    #[error("依赖缺失: {class_id}.{field} 需要 {declared_type}, 但没有可用的 Bean")]
    MissingDependency {
        class_id: String,
        field: String,
        declared_type: String,
    },

    #[error("依赖不唯一: {class_id}.{field} 需要 {declared_type}, 候选: {candidates:?}")]
    AmbiguousDependency {
        class_id: String,
        field: String,
        declared_type: String,
        candidates: Vec<String>,
    },

    #[error("依赖尚未注入: {field}")]
    NotInjected { field: String },

    #[error("依赖已经注入过: {field}")]
    AlreadyInjected { field: String },

    #[error("容器阶段不允许该操作: {operation}, 当前阶段: {phase}")]
    PhaseViolation { operation: String, phase: String },

    #[error("类加载失败: {source}")]
    ClassLoad {
        #[from]
        source: ComponentError,
    },
}

/// 切面织入错误类型
#[derive(Error, Debug)]
pub enum WeavingError {
    #[error("切面目标不存在: 切面 {aspect}, 目标 {target}")]
    AspectTargetNotFound { aspect: String, target: String },

    #[error("切面实例创建失败: {aspect}, 原因: {message}")]
    AspectCreationFailed { aspect: String, message: String },

    #[error("切面目标扫描失败: 切面 {aspect}, 原因: {source}")]
    TargetScanFailed {
        aspect: String,
        source: ComponentError,
    },

    #[error("代理安装失败: {class_id}, 原因: {source}")]
    ProxyInstallFailed {
        class_id: String,
        source: DependencyError,
    },
}

/// 路由错误类型
#[derive(Error, Debug)]
pub enum RoutingError {
    #[error("路由重复: {method} {path}, 已有 {existing}, 重复声明于 {duplicate}")]
    DuplicateRoute {
        method: RequestMethod,
        path: String,
        existing: String,
        duplicate: String,
    },

    #[error("未知的请求方法: {method}")]
    UnknownRequestMethod { method: String },
}

/// 方法调用错误类型
#[derive(Error, Debug)]
pub enum InvocationError {
    #[error("方法不存在: {class_id}.{method}")]
    NoSuchMethod { class_id: String, method: String },

    #[error("参数无效: 第 {index} 个参数, {message}")]
    InvalidArgument { index: usize, message: String },

    #[error("返回值类型不匹配: {message}")]
    ReturnTypeMismatch { message: String },

    #[error("依赖错误: {source}")]
    Dependency {
        #[from]
        source: DependencyError,
    },

    #[error("{source}")]
    Failed { source: BoxError },
}

impl InvocationError {
    /// 包装业务方法抛出的错误
    pub fn failed(error: impl Into<BoxError>) -> Self {
        Self::Failed {
            source: error.into(),
        }
    }

    /// 创建方法不存在错误
    pub fn no_such_method(class_id: impl Into<String>, method: impl Into<String>) -> Self {
        Self::NoSuchMethod {
            class_id: class_id.into(),
            method: method.into(),
        }
    }

    /// 创建参数无效错误
    pub fn invalid_argument(index: usize, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            index,
            message: message.into(),
        }
    }

    /// 取出业务方法抛出的原始错误
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            Self::Failed { source } => source.downcast_ref::<E>(),
            _ => None,
        }
    }
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("配置错误: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },

    #[error("组件错误: {source}")]
    ComponentError {
        #[from]
        source: ComponentError,
    },

    #[error("依赖注入错误: {source}")]
    DependencyError {
        #[from]
        source: DependencyError,
    },

    #[error("切面织入错误: {source}")]
    WeavingError {
        #[from]
        source: WeavingError,
    },

    #[error("路由错误: {source}")]
    RoutingError {
        #[from]
        source: RoutingError,
    },

    #[error("基础设施启动失败: {message}")]
    BootstrapFailed { message: String },
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type ComponentResult<T> = Result<T, ComponentError>;
pub type DependencyResult<T> = Result<T, DependencyError>;
pub type WeavingResult<T> = Result<T, WeavingError>;
pub type RoutingResult<T> = Result<T, RoutingError>;
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;
