//! Bean 容器抽象接口
//!
//! 容器按阶段推进：实例化、织入、注入。注入必须在织入之后，
//! 这样被注入的总是最终（可能是代理）实例。

use infrastructure_common::{Bean, ClassId, DependencyError};
use std::fmt;

/// 容器阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContainerPhase {
    /// 尚未创建任何实例
    Empty,
    /// 已创建实例，允许替换（织入窗口）
    Instantiated,
    /// 织入窗口已关闭，等待注入
    Woven,
    /// 依赖已注入，容器只读
    Injected,
}

impl fmt::Display for ContainerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Empty => "empty",
            Self::Instantiated => "instantiated",
            Self::Woven => "woven",
            Self::Injected => "injected",
        };
        f.write_str(name)
    }
}

/// Bean 容器 trait
///
/// 每个类标识最多对应一个存活实例。
pub trait BeanContainer: Send + Sync {
    /// 以初始化方式加载类并调用无参构造创建实例
    fn instantiate(&self, class_id: &ClassId) -> Result<Bean, DependencyError>;

    /// 获取实例
    fn get_bean(&self, class_id: &ClassId) -> Result<Bean, DependencyError>;

    /// 替换实例，仅在织入窗口内允许
    fn set_bean(&self, class_id: &ClassId, bean: Bean) -> Result<(), DependencyError>;

    /// 关闭织入窗口
    fn mark_woven(&self) -> Result<(), DependencyError>;

    /// 为所有实例的自动注入字段赋值
    fn inject_dependencies(&self) -> Result<(), DependencyError>;

    /// 是否存在实例
    fn contains(&self, class_id: &ClassId) -> bool;

    /// 全部实例的类标识（有序）
    fn class_ids(&self) -> Vec<ClassId>;

    /// 实例数量
    fn len(&self) -> usize;

    /// 当前阶段
    fn phase(&self) -> ContainerPhase;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 构造阶段违规错误
pub fn phase_violation(operation: &str, phase: ContainerPhase) -> DependencyError {
    DependencyError::PhaseViolation {
        operation: operation.to_string(),
        phase: phase.to_string(),
    }
}
