//! 组件基础接口定义
//!
//! 容器托管的每个实例（Bean）都实现 [`Component`]，方法通过名称动态调用。
//! 代理对象与原始实例实现同一接口，调用方无法区分两者。

use crate::class::ClassId;
use crate::errors::{BoxError, DependencyError, InvocationError};
use crate::invocation::{Arguments, ReturnValue};
use crate::metadata::{ClassMetadata, FieldMetadata};
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::Arc;

/// 方法调用结果
pub type InvocationResult = Result<ReturnValue, InvocationError>;

/// 容器托管的实例
pub type Bean = Arc<dyn Component>;

/// 无参构造函数
pub type Constructor = Arc<dyn Fn() -> Result<Bean, BoxError> + Send + Sync>;

/// 静态初始化代码，类第一次以初始化方式加载时执行
pub type StaticInitializer = Arc<dyn Fn() + Send + Sync>;

/// 组件基础 trait
///
/// 所有容器托管的组件都必须实现此 trait
#[async_trait]
pub trait Component: Send + Sync + Debug + 'static {
    /// 按名称调用方法
    async fn invoke(&self, method: &str, args: &Arguments) -> InvocationResult;

    /// 原始实例，用于字段注入和向下转型
    fn as_any(&self) -> &dyn Any;

    /// 被代理的目标，原始实例返回 `None`
    fn target(&self) -> Option<&Bean> {
        None
    }
}

impl dyn Component {
    /// 向下转型为具体类型（穿透代理）
    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// 是否为代理对象
    pub fn is_proxy(&self) -> bool {
        self.target().is_some()
    }
}

/// 自动注入字段
///
/// 启动阶段由容器写入一次，之后只读。
#[derive(Default)]
pub struct Autowired {
    bean: OnceCell<Bean>,
}

impl Autowired {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已注入的 Bean
    pub fn get(&self) -> Result<&Bean, DependencyError> {
        self.bean.get().ok_or_else(|| DependencyError::NotInjected {
            field: "autowired".to_string(),
        })
    }

    /// 写入依赖
    pub fn inject(&self, bean: Bean) -> Result<(), DependencyError> {
        self.bean
            .set(bean)
            .map_err(|_| DependencyError::AlreadyInjected {
                field: "autowired".to_string(),
            })
    }

    /// 是否已经注入
    pub fn is_injected(&self) -> bool {
        self.bean.get().is_some()
    }

    /// 调用依赖上的方法并转换返回值
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        args: Arguments,
    ) -> Result<T, InvocationError> {
        let bean = self.get()?;
        bean.invoke(method, &args).await?.into_typed()
    }
}

impl Debug for Autowired {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Autowired")
            .field("injected", &self.is_injected())
            .finish()
    }
}

/// 注入点：从实例中取出某个字段的注入槽位
pub trait InjectionPoint: Send + Sync {
    fn slot<'a>(&self, instance: &'a dyn Any) -> Option<&'a Autowired>;
}

/// 基于字段访问函数的注入点
pub struct FieldAccessor<T> {
    accessor: fn(&T) -> &Autowired,
}

impl<T> FieldAccessor<T> {
    pub fn new(accessor: fn(&T) -> &Autowired) -> Self {
        Self { accessor }
    }
}

impl<T: Send + Sync + 'static> InjectionPoint for FieldAccessor<T> {
    fn slot<'a>(&self, instance: &'a dyn Any) -> Option<&'a Autowired> {
        instance.downcast_ref::<T>().map(self.accessor)
    }
}

/// 类定义
///
/// 元数据 + 无参构造 + 静态初始化 + 注入点。
/// 扩展数据按类型存放，例如切面工厂。
#[derive(Clone)]
pub struct ClassDefinition {
    metadata: Arc<ClassMetadata>,
    constructor: Option<Constructor>,
    static_initializer: Option<StaticInitializer>,
    injection_points: HashMap<String, Arc<dyn InjectionPoint>>,
    extensions: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl ClassDefinition {
    /// 只有元数据的类定义
    pub fn new(metadata: ClassMetadata) -> Self {
        Self {
            metadata: Arc::new(metadata),
            constructor: None,
            static_initializer: None,
            injection_points: HashMap::new(),
            extensions: HashMap::new(),
        }
    }

    /// 使用 `Default` 作为无参构造的组件类
    pub fn component<T: Component + Default>(metadata: ClassMetadata) -> Self {
        Self::new(metadata).with_default_constructor::<T>()
    }

    /// 设置无参构造
    pub fn with_constructor<F>(mut self, constructor: F) -> Self
    where
        F: Fn() -> Result<Bean, BoxError> + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(constructor));
        self
    }

    /// 使用 `Default` 作为无参构造
    pub fn with_default_constructor<T: Component + Default>(self) -> Self {
        self.with_constructor(|| Ok(Arc::new(T::default()) as Bean))
    }

    /// 设置静态初始化代码
    pub fn with_static_initializer<F>(mut self, initializer: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.static_initializer = Some(Arc::new(initializer));
        self
    }

    /// 声明自动注入字段
    pub fn with_autowired<T: Send + Sync + 'static>(
        mut self,
        field: &str,
        declared_type: impl Into<ClassId>,
        accessor: fn(&T) -> &Autowired,
    ) -> Self {
        Arc::make_mut(&mut self.metadata)
            .fields
            .push(FieldMetadata::autowired(field, declared_type));
        self.injection_points
            .insert(field.to_string(), Arc::new(FieldAccessor::new(accessor)));
        self
    }

    /// 附加扩展数据
    pub fn with_extension<E: Any + Send + Sync>(mut self, extension: E) -> Self {
        self.extensions
            .insert(TypeId::of::<E>(), Arc::new(extension));
        self
    }

    /// 取出扩展数据
    pub fn extension<E: Any + Send + Sync>(&self) -> Option<&E> {
        self.extensions
            .get(&TypeId::of::<E>())
            .and_then(|e| (**e).downcast_ref::<E>())
    }

    pub fn id(&self) -> &ClassId {
        &self.metadata.id
    }

    pub fn metadata(&self) -> &Arc<ClassMetadata> {
        &self.metadata
    }

    pub fn has_constructor(&self) -> bool {
        self.constructor.is_some()
    }

    pub fn static_initializer(&self) -> Option<&StaticInitializer> {
        self.static_initializer.as_ref()
    }

    /// 字段的注入点
    pub fn injection_point(&self, field: &str) -> Option<&Arc<dyn InjectionPoint>> {
        self.injection_points.get(field)
    }

    /// 调用无参构造创建实例
    pub fn construct(&self) -> Result<Bean, DependencyError> {
        let constructor =
            self.constructor
                .as_ref()
                .ok_or_else(|| DependencyError::ComponentCreationFailed {
                    class_id: self.id().to_string(),
                    source: "没有可用的无参构造".into(),
                })?;

        constructor().map_err(|source| DependencyError::ComponentCreationFailed {
            class_id: self.id().to_string(),
            source,
        })
    }
}

impl Debug for ClassDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDefinition")
            .field("metadata", &self.metadata)
            .field("has_constructor", &self.constructor.is_some())
            .field("has_static_initializer", &self.static_initializer.is_some())
            .field(
                "injection_points",
                &self.injection_points.keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}
