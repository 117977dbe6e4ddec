//! 组件扫描器抽象接口
//!
//! 提供按命名空间发现类的能力

use infrastructure_common::{ClassDefinition, ClassId, ComponentError};
use std::collections::BTreeSet;
use std::sync::Arc;

/// 类名来源 trait
///
/// 只负责列出某个命名空间（含子命名空间）下的类名，不负责定义类。
pub trait ClassSource: Send + Sync {
    /// 来源名称，用于日志
    fn name(&self) -> &str;

    /// 列出命名空间下的全部类
    fn list_classes(&self, namespace: &str) -> Result<Vec<ClassId>, ComponentError>;
}

/// 类加载器 trait
pub trait ClassLoader: Send + Sync {
    /// 加载类定义
    ///
    /// `initialize` 为真时，类的静态初始化代码在第一次加载时执行且只执行一次。
    fn load(&self, class_id: &ClassId, initialize: bool)
        -> Result<Arc<ClassDefinition>, ComponentError>;

    /// 类是否已定义
    fn contains(&self, class_id: &ClassId) -> bool;
}

/// 组件扫描器 trait
///
/// 调用方不关心类来自哪种来源；发现的每个类都以不初始化的方式加载。
pub trait ClassScanner: ClassLoader {
    /// 扫描命名空间，结果有序
    fn scan(&self, namespace: &str) -> Result<BTreeSet<ClassId>, ComponentError>;
}
