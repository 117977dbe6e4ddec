//! 计时切面

use crate::aspect::{Aspect, JoinPoint};
use async_trait::async_trait;
use infrastructure_common::{InvocationError, ReturnValue};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 调用完成回调
pub type TimingObserver = Arc<dyn Fn(&JoinPoint, Duration) + Send + Sync>;

/// 计时切面
///
/// 开始时间取自连接点，同一个实例可以被并发调用共享。
#[derive(Clone, Default)]
pub struct TimingAspect {
    methods: Option<BTreeSet<String>>,
    slow_threshold: Option<Duration>,
    observer: Option<TimingObserver>,
}

impl TimingAspect {
    /// 切面名称
    pub const NAME: &'static str = "timing";

    /// 统计所有方法
    pub fn new() -> Self {
        Self::default()
    }

    /// 只统计指定的方法
    pub fn for_methods<I, S>(methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            methods: Some(methods.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// 超过阈值时输出警告
    pub fn with_slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = Some(threshold);
        self
    }

    /// 每次调用结束时回调耗时
    pub fn with_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(&JoinPoint, Duration) + Send + Sync + 'static,
    {
        self.observer = Some(Arc::new(observer));
        self
    }

    fn report(&self, join_point: &JoinPoint, outcome: &str) {
        let elapsed = join_point.elapsed();
        match self.slow_threshold {
            Some(threshold) if elapsed > threshold => warn!(
                "慢调用: {}.{} {} 耗时 {:?}",
                join_point.class_id,
                join_point.method_name(),
                outcome,
                elapsed
            ),
            _ => info!(
                "{}.{} {} 耗时 {:?}",
                join_point.class_id,
                join_point.method_name(),
                outcome,
                elapsed
            ),
        }
        if let Some(observer) = &self.observer {
            observer(join_point, elapsed);
        }
    }
}

#[async_trait]
impl Aspect for TimingAspect {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn intercept(&self, join_point: &JoinPoint) -> bool {
        self.methods
            .as_ref()
            .map_or(true, |methods| methods.contains(join_point.method_name()))
    }

    async fn before(&self, join_point: &JoinPoint) -> Result<(), InvocationError> {
        debug!("开始调用: {}.{}", join_point.class_id, join_point.method_name());
        Ok(())
    }

    async fn after(
        &self,
        join_point: &JoinPoint,
        _result: &ReturnValue,
    ) -> Result<(), InvocationError> {
        self.report(join_point, "完成");
        Ok(())
    }

    async fn error(&self, join_point: &JoinPoint, _error: &InvocationError) {
        self.report(join_point, "失败");
    }
}

impl fmt::Debug for TimingAspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimingAspect")
            .field("methods", &self.methods)
            .field("slow_threshold", &self.slow_threshold)
            .finish()
    }
}
