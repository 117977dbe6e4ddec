//! 组件代理

use crate::aspect::{Aspect, JoinPoint};
use crate::chain::ProxyChain;
use async_trait::async_trait;
use infrastructure_common::{
    Arguments, Bean, ClassMetadata, Component, InvocationResult, MethodMetadata,
};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 组件代理
///
/// 与原始实例实现同一接口；每次调用都构建新的连接点和代理链。
pub struct ComponentProxy {
    metadata: Arc<ClassMetadata>,
    target: Bean,
    aspects: Arc<[Arc<dyn Aspect>]>,
}

impl ComponentProxy {
    pub fn new(metadata: Arc<ClassMetadata>, target: Bean, aspects: Vec<Arc<dyn Aspect>>) -> Self {
        Self {
            metadata,
            target,
            aspects: aspects.into(),
        }
    }

    /// 按顺序排列的切面（外层在前）
    pub fn aspects(&self) -> &[Arc<dyn Aspect>] {
        &self.aspects
    }

    pub fn metadata(&self) -> &ClassMetadata {
        &self.metadata
    }

    /// 被代理的原始实例
    pub fn target_bean(&self) -> &Bean {
        &self.target
    }
}

#[async_trait]
impl Component for ComponentProxy {
    async fn invoke(&self, method: &str, args: &Arguments) -> InvocationResult {
        let method = self
            .metadata
            .method(method)
            .cloned()
            .unwrap_or_else(|| MethodMetadata::new(method));
        let join_point = JoinPoint::new(self.metadata.id.clone(), method, args.clone());

        ProxyChain::new(self.target.as_ref(), &join_point, &self.aspects)
            .proceed()
            .await
    }

    fn as_any(&self) -> &dyn Any {
        self.target.as_any()
    }

    fn target(&self) -> Option<&Bean> {
        Some(&self.target)
    }
}

impl fmt::Debug for ComponentProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentProxy")
            .field("class_id", &self.metadata.id)
            .field(
                "aspects",
                &self.aspects.iter().map(|a| a.name().to_string()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
