//! 代理链
//!
//! 每次调用创建一条新链；游标越过最后一个切面时执行目标方法。

use crate::aspect::{Aspect, JoinPoint};
use futures::future::BoxFuture;
use infrastructure_common::{Component, InvocationResult};
use std::sync::Arc;

/// 单次调用的代理链
pub struct ProxyChain<'a> {
    target: &'a dyn Component,
    join_point: &'a JoinPoint,
    aspects: &'a [Arc<dyn Aspect>],
    index: usize,
}

impl<'a> ProxyChain<'a> {
    /// 按顺序包裹目标，第一个切面在最外层
    pub fn new(
        target: &'a dyn Component,
        join_point: &'a JoinPoint,
        aspects: &'a [Arc<dyn Aspect>],
    ) -> Self {
        Self {
            target,
            join_point,
            aspects,
            index: 0,
        }
    }

    /// 执行下一个切面，没有剩余切面时调用目标方法
    pub fn proceed(&mut self) -> BoxFuture<'_, InvocationResult> {
        Box::pin(async move {
            let aspects = self.aspects;
            match aspects.get(self.index) {
                Some(aspect) => {
                    self.index += 1;
                    self.run_aspect(aspect.as_ref()).await
                }
                None => {
                    let join_point = self.join_point;
                    self.target
                        .invoke(&join_point.method.name, &join_point.args)
                        .await
                }
            }
        })
    }

    async fn run_aspect(&mut self, aspect: &dyn Aspect) -> InvocationResult {
        let join_point = self.join_point;

        aspect.begin(join_point);
        let result = if aspect.intercept(join_point) {
            self.around(aspect).await
        } else {
            self.proceed().await
        };
        aspect.end(join_point);

        result
    }

    async fn around(&mut self, aspect: &dyn Aspect) -> InvocationResult {
        let join_point = self.join_point;

        if let Err(error) = aspect.before(join_point).await {
            aspect.error(join_point, &error).await;
            return Err(error);
        }

        let value = match self.proceed().await {
            Ok(value) => value,
            Err(error) => {
                aspect.error(join_point, &error).await;
                return Err(error);
            }
        };

        if let Err(error) = aspect.after(join_point, &value).await {
            aspect.error(join_point, &error).await;
            return Err(error);
        }

        Ok(value)
    }
}
