//! 组件注册表实现

use di_abstractions::{ClassLoader, ComponentRegistry};
use infrastructure_common::{
    ClassDefinition, ClassId, ComponentDescriptor, ComponentError, MarkerKind,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info};

/// 组件注册表
///
/// 启动时由扫描结果构建一次，之后只读。
#[derive(Debug, Default)]
pub struct ComponentRegistryImpl {
    definitions: BTreeMap<ClassId, Arc<ClassDefinition>>,
    descriptors: BTreeMap<ClassId, ComponentDescriptor>,
}

impl ComponentRegistryImpl {
    /// 由扫描到的类集合构建
    pub fn build(
        classes: &BTreeSet<ClassId>,
        loader: &dyn ClassLoader,
    ) -> Result<Self, ComponentError> {
        let mut registry = Self::default();

        for class_id in classes {
            let definition = loader.load(class_id, false)?;
            let descriptor = ComponentDescriptor::from_metadata(definition.metadata());
            if let Some(stereotype) = descriptor.stereotype {
                debug!("发现组件: {} ({:?})", class_id, stereotype);
            }
            registry.descriptors.insert(class_id.clone(), descriptor);
            registry.definitions.insert(class_id.clone(), definition);
        }

        info!(
            "组件分类完成: 共 {} 个类, 其中 {} 个组件",
            registry.definitions.len(),
            registry.component_classes().len()
        );
        Ok(registry)
    }

    fn select(&self, predicate: impl Fn(&ClassDefinition) -> bool) -> BTreeSet<ClassId> {
        self.definitions
            .iter()
            .filter(|(_, definition)| predicate(definition))
            .map(|(id, _)| id.clone())
            .collect()
    }
}

impl ComponentRegistry for ComponentRegistryImpl {
    fn all_classes(&self) -> BTreeSet<ClassId> {
        self.definitions.keys().cloned().collect()
    }

    fn component_classes(&self) -> BTreeSet<ClassId> {
        self.select(|definition| definition.metadata().is_component())
    }

    fn classes_implementing(&self, supertype: &ClassId) -> BTreeSet<ClassId> {
        self.select(|definition| definition.metadata().supertypes.contains(supertype))
    }

    fn classes_marked_with(&self, marker: &MarkerKind) -> BTreeSet<ClassId> {
        self.select(|definition| definition.metadata().has_marker(marker))
    }

    fn descriptor(&self, class_id: &ClassId) -> Option<&ComponentDescriptor> {
        self.descriptors.get(class_id)
    }

    fn definition(&self, class_id: &ClassId) -> Option<&Arc<ClassDefinition>> {
        self.definitions.get(class_id)
    }
}
