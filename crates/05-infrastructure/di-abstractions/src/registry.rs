//! 组件注册表抽象接口

use infrastructure_common::{
    ClassDefinition, ClassId, ClassMetadata, ComponentDescriptor, MarkerKind, Stereotype,
};
use std::collections::BTreeSet;
use std::sync::Arc;

/// 组件注册表 trait
///
/// 扫描结果上的只读派生视图，分类完全依据标记。
pub trait ComponentRegistry: Send + Sync {
    /// 扫描到的全部类
    fn all_classes(&self) -> BTreeSet<ClassId>;

    /// 带有可识别构造型的类
    fn component_classes(&self) -> BTreeSet<ClassId>;

    /// 声明实现了指定接口或继承了指定父类的类（不含其本身）
    fn classes_implementing(&self, supertype: &ClassId) -> BTreeSet<ClassId>;

    /// 带有指定标记的类
    fn classes_marked_with(&self, marker: &MarkerKind) -> BTreeSet<ClassId>;

    /// 组件描述符
    fn descriptor(&self, class_id: &ClassId) -> Option<&ComponentDescriptor>;

    /// 类定义
    fn definition(&self, class_id: &ClassId) -> Option<&Arc<ClassDefinition>>;

    /// 服务类
    fn service_classes(&self) -> BTreeSet<ClassId> {
        self.classes_with_stereotype(Stereotype::Service)
    }

    /// 控制器类
    fn controller_classes(&self) -> BTreeSet<ClassId> {
        self.classes_with_stereotype(Stereotype::Controller)
    }

    /// 指定构造型的类
    fn classes_with_stereotype(&self, stereotype: Stereotype) -> BTreeSet<ClassId> {
        self.classes_marked_with(&stereotype.marker())
    }

    /// 类元数据
    fn metadata(&self, class_id: &ClassId) -> Option<&ClassMetadata> {
        self.definition(class_id).map(|definition| &**definition.metadata())
    }

    /// 是否包含指定类
    fn contains(&self, class_id: &ClassId) -> bool {
        self.definition(class_id).is_some()
    }
}
