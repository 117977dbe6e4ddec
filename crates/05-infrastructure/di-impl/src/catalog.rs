//! 类目录
//!
//! 所有已知类定义的集合，充当运行时的类加载器。

use dashmap::DashSet;
use di_abstractions::ClassLoader;
use infrastructure_common::{ClassDefinition, ClassId, ComponentError};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// 类目录
#[derive(Debug, Default)]
pub struct ClassCatalog {
    definitions: BTreeMap<ClassId, Arc<ClassDefinition>>,
    initialized: DashSet<ClassId>,
}

impl ClassCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册类定义，同名类重复注册视为错误
    pub fn register(&mut self, definition: ClassDefinition) -> Result<(), ComponentError> {
        let class_id = definition.id().clone();
        if self.definitions.contains_key(&class_id) {
            return Err(ComponentError::DuplicateClass {
                class_id: class_id.to_string(),
            });
        }

        debug!("注册类定义: {}", class_id);
        self.definitions.insert(class_id, Arc::new(definition));
        Ok(())
    }

    /// 批量注册
    pub fn register_all(
        &mut self,
        definitions: impl IntoIterator<Item = ClassDefinition>,
    ) -> Result<(), ComponentError> {
        definitions
            .into_iter()
            .try_for_each(|definition| self.register(definition))
    }

    /// 按类标识查找定义，不触发初始化
    pub fn get(&self, class_id: &ClassId) -> Option<&Arc<ClassDefinition>> {
        self.definitions.get(class_id)
    }

    /// 命名空间下的类（有序）
    pub fn classes_in(&self, namespace: &str, recursive: bool) -> Vec<ClassId> {
        self.definitions
            .keys()
            .filter(|id| id.is_in(namespace, recursive))
            .cloned()
            .collect()
    }

    /// 类是否已经初始化
    pub fn is_initialized(&self, class_id: &ClassId) -> bool {
        self.initialized.contains(class_id)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl ClassLoader for ClassCatalog {
    fn load(
        &self,
        class_id: &ClassId,
        initialize: bool,
    ) -> Result<Arc<ClassDefinition>, ComponentError> {
        let definition = self
            .definitions
            .get(class_id)
            .cloned()
            .ok_or_else(|| ComponentError::class_not_found(class_id.as_str()))?;

        if initialize && self.initialized.insert(class_id.clone()) {
            if let Some(initializer) = definition.static_initializer() {
                debug!("执行类静态初始化: {}", class_id);
                initializer();
            }
        }

        Ok(definition)
    }

    fn contains(&self, class_id: &ClassId) -> bool {
        self.definitions.contains_key(class_id)
    }
}
