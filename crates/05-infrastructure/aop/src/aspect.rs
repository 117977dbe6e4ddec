//! 切面接口定义

use async_trait::async_trait;
use infrastructure_common::{
    Arguments, AspectMarker, BoxError, ClassDefinition, ClassId, ClassMetadata, InvocationError,
    MethodMetadata, ReturnValue,
};
use std::fmt::{self, Debug};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 所有切面类都要声明实现的父类型
pub const ASPECT_SUPERTYPE: &str = "lorn::aop::Aspect";

/// 连接点
///
/// 单次调用的上下文。切面实例在多次调用之间共享，
/// 每次调用自己的状态（例如开始时间）只能放在这里。
#[derive(Debug, Clone)]
pub struct JoinPoint {
    /// 目标类
    pub class_id: ClassId,
    /// 目标方法
    pub method: MethodMetadata,
    /// 调用参数
    pub args: Arguments,
    /// 调用开始时间
    pub started_at: Instant,
}

impl JoinPoint {
    pub fn new(class_id: ClassId, method: MethodMetadata, args: Arguments) -> Self {
        Self {
            class_id,
            method,
            args,
            started_at: Instant::now(),
        }
    }

    /// 方法名
    pub fn method_name(&self) -> &str {
        &self.method.name
    }

    /// 从调用开始到现在的耗时
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// 切面 trait
///
/// 钩子执行顺序：`begin`，`intercept` 为真时依次 `before`、目标、`after`，
/// 任一步出错时调用 `error` 并原样抛出，最后总是 `end`。
/// 切面拿不到调用链，无法重复执行目标方法，也无法吞掉错误。
#[async_trait]
pub trait Aspect: Send + Sync + Debug {
    /// 切面名称
    fn name(&self) -> &str;

    fn begin(&self, _join_point: &JoinPoint) {}

    /// 是否拦截本次调用
    fn intercept(&self, _join_point: &JoinPoint) -> bool {
        true
    }

    async fn before(&self, _join_point: &JoinPoint) -> Result<(), InvocationError> {
        Ok(())
    }

    async fn after(
        &self,
        _join_point: &JoinPoint,
        _result: &ReturnValue,
    ) -> Result<(), InvocationError> {
        Ok(())
    }

    async fn error(&self, _join_point: &JoinPoint, _error: &InvocationError) {}

    fn end(&self, _join_point: &JoinPoint) {}
}

/// 切面工厂，每个目标类得到一个新的切面实例
#[derive(Clone)]
pub struct AspectFactory(Arc<dyn Fn() -> Result<Arc<dyn Aspect>, BoxError> + Send + Sync>);

impl AspectFactory {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn Aspect>, BoxError> + Send + Sync + 'static,
    {
        Self(Arc::new(factory))
    }

    /// 使用 `Default` 创建切面
    pub fn of<A: Aspect + Default + 'static>() -> Self {
        Self::new(|| Ok(Arc::new(A::default()) as Arc<dyn Aspect>))
    }

    /// 创建切面实例
    pub fn create(&self) -> Result<Arc<dyn Aspect>, BoxError> {
        (self.0)()
    }
}

impl Debug for AspectFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AspectFactory(..)")
    }
}

/// 切面类的元数据：声明切面父类型并带上切面标记
pub fn aspect_metadata(id: impl Into<ClassId>, marker: AspectMarker) -> ClassMetadata {
    ClassMetadata::new(id)
        .implements(ASPECT_SUPERTYPE)
        .aspect(marker)
}

/// 为类定义附加切面工厂
pub trait AspectDefinitionExt {
    /// 使用 `Default` 创建切面
    fn with_aspect<A: Aspect + Default + 'static>(self) -> Self;

    /// 使用自定义工厂创建切面
    fn with_aspect_factory(self, factory: AspectFactory) -> Self;

    /// 类上附加的切面工厂
    fn aspect_factory(&self) -> Option<&AspectFactory>;
}

impl AspectDefinitionExt for ClassDefinition {
    fn with_aspect<A: Aspect + Default + 'static>(self) -> Self {
        self.with_aspect_factory(AspectFactory::of::<A>())
    }

    fn with_aspect_factory(self, factory: AspectFactory) -> Self {
        self.with_extension(factory)
    }

    fn aspect_factory(&self) -> Option<&AspectFactory> {
        self.extension::<AspectFactory>()
    }
}
