//! 事务切面
//!
//! 服务类上带事务标记的方法：调用前开启事务，正常返回提交，出错回滚。

use crate::aspect::{Aspect, JoinPoint};
use async_trait::async_trait;
use infrastructure_common::{InvocationError, ReturnValue};
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error};

/// 事务管理器 trait
///
/// 持久化边界的协作者，具体的连接管理由实现方负责。
#[async_trait]
pub trait TransactionManager: Send + Sync + Debug {
    async fn begin(&self, join_point: &JoinPoint) -> Result<(), InvocationError>;

    async fn commit(&self, join_point: &JoinPoint) -> Result<(), InvocationError>;

    async fn rollback(&self, join_point: &JoinPoint) -> Result<(), InvocationError>;
}

/// 事务统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionStats {
    pub begun: u64,
    pub committed: u64,
    pub rolled_back: u64,
}

/// 只记录日志和计数的事务管理器
#[derive(Debug, Default)]
pub struct LoggingTransactionManager {
    begun: AtomicU64,
    committed: AtomicU64,
    rolled_back: AtomicU64,
}

impl LoggingTransactionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> TransactionStats {
        TransactionStats {
            begun: self.begun.load(Ordering::SeqCst),
            committed: self.committed.load(Ordering::SeqCst),
            rolled_back: self.rolled_back.load(Ordering::SeqCst),
        }
    }
}

#[async_trait]
impl TransactionManager for LoggingTransactionManager {
    async fn begin(&self, join_point: &JoinPoint) -> Result<(), InvocationError> {
        self.begun.fetch_add(1, Ordering::SeqCst);
        debug!("开启事务: {}.{}", join_point.class_id, join_point.method_name());
        Ok(())
    }

    async fn commit(&self, join_point: &JoinPoint) -> Result<(), InvocationError> {
        self.committed.fetch_add(1, Ordering::SeqCst);
        debug!("提交事务: {}.{}", join_point.class_id, join_point.method_name());
        Ok(())
    }

    async fn rollback(&self, join_point: &JoinPoint) -> Result<(), InvocationError> {
        self.rolled_back.fetch_add(1, Ordering::SeqCst);
        debug!("回滚事务: {}.{}", join_point.class_id, join_point.method_name());
        Ok(())
    }
}

/// 事务切面
#[derive(Debug)]
pub struct TransactionAspect {
    manager: Arc<dyn TransactionManager>,
}

impl TransactionAspect {
    /// 切面名称
    pub const NAME: &'static str = "transaction";

    pub fn new(manager: Arc<dyn TransactionManager>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl Aspect for TransactionAspect {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn intercept(&self, join_point: &JoinPoint) -> bool {
        join_point.method.transactional
    }

    async fn before(&self, join_point: &JoinPoint) -> Result<(), InvocationError> {
        self.manager.begin(join_point).await
    }

    async fn after(
        &self,
        join_point: &JoinPoint,
        _result: &ReturnValue,
    ) -> Result<(), InvocationError> {
        self.manager.commit(join_point).await
    }

    async fn error(&self, join_point: &JoinPoint, cause: &InvocationError) {
        debug!(
            "事务方法出错: {}.{}: {}",
            join_point.class_id,
            join_point.method_name(),
            cause
        );
        if let Err(e) = self.manager.rollback(join_point).await {
            error!(
                "事务回滚失败: {}.{}: {}",
                join_point.class_id,
                join_point.method_name(),
                e
            );
        }
    }
}
