//! Bean 容器实现

use di_abstractions::{phase_violation, BeanContainer, ClassLoader, ContainerPhase};
use infrastructure_common::{Bean, ClassDefinition, ClassId, ComponentError, DependencyError};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// 容器条目
#[derive(Clone)]
struct BeanEntry {
    definition: Arc<ClassDefinition>,
    bean: Bean,
}

/// Bean 容器
///
/// 所有写操作只发生在启动阶段，之后只有读锁。
pub struct BeanContainerImpl {
    loader: Arc<dyn ClassLoader>,
    beans: RwLock<BTreeMap<ClassId, BeanEntry>>,
    phase: RwLock<ContainerPhase>,
}

impl BeanContainerImpl {
    /// 创建新的容器
    pub fn new(loader: Arc<dyn ClassLoader>) -> Self {
        Self {
            loader,
            beans: RwLock::new(BTreeMap::new()),
            phase: RwLock::new(ContainerPhase::Empty),
        }
    }

    /// 在容器中查找唯一可以赋值给声明类型的实例
    fn unique_provider(
        entries: &BTreeMap<ClassId, BeanEntry>,
        owner: &ClassId,
        field: &str,
        declared_type: &ClassId,
    ) -> Result<Bean, DependencyError> {
        let candidates: Vec<(&ClassId, &BeanEntry)> = entries
            .iter()
            .filter(|(_, entry)| entry.definition.metadata().is_assignable_to(declared_type))
            .collect();

        match candidates.as_slice() {
            [(_, entry)] => Ok(Arc::clone(&entry.bean)),
            [] => Err(DependencyError::MissingDependency {
                class_id: owner.to_string(),
                field: field.to_string(),
                declared_type: declared_type.to_string(),
            }),
            _ => Err(DependencyError::AmbiguousDependency {
                class_id: owner.to_string(),
                field: field.to_string(),
                declared_type: declared_type.to_string(),
                candidates: candidates.iter().map(|(id, _)| id.to_string()).collect(),
            }),
        }
    }
}

impl BeanContainer for BeanContainerImpl {
    fn instantiate(&self, class_id: &ClassId) -> Result<Bean, DependencyError> {
        let mut phase = self.phase.write();
        if *phase > ContainerPhase::Instantiated {
            return Err(phase_violation("instantiate", *phase));
        }

        if let Some(existing) = self.beans.read().get(class_id) {
            return Ok(Arc::clone(&existing.bean));
        }

        let definition = self.loader.load(class_id, true)?;
        let bean = definition.construct()?;
        debug!("创建 Bean: {}", class_id);

        self.beans.write().insert(
            class_id.clone(),
            BeanEntry {
                definition,
                bean: Arc::clone(&bean),
            },
        );
        *phase = ContainerPhase::Instantiated;
        Ok(bean)
    }

    fn get_bean(&self, class_id: &ClassId) -> Result<Bean, DependencyError> {
        self.beans
            .read()
            .get(class_id)
            .map(|entry| Arc::clone(&entry.bean))
            .ok_or_else(|| DependencyError::BeanNotFound {
                class_id: class_id.to_string(),
            })
    }

    fn set_bean(&self, class_id: &ClassId, bean: Bean) -> Result<(), DependencyError> {
        let phase = self.phase.read();
        if *phase != ContainerPhase::Instantiated {
            return Err(phase_violation("set_bean", *phase));
        }

        let mut beans = self.beans.write();
        let entry = beans
            .get_mut(class_id)
            .ok_or_else(|| DependencyError::BeanNotFound {
                class_id: class_id.to_string(),
            })?;
        entry.bean = bean;
        debug!("替换 Bean: {}", class_id);
        Ok(())
    }

    fn mark_woven(&self) -> Result<(), DependencyError> {
        let mut phase = self.phase.write();
        match *phase {
            ContainerPhase::Empty | ContainerPhase::Instantiated => {
                *phase = ContainerPhase::Woven;
                Ok(())
            }
            other => Err(phase_violation("mark_woven", other)),
        }
    }

    fn inject_dependencies(&self) -> Result<(), DependencyError> {
        let mut phase = self.phase.write();
        if *phase != ContainerPhase::Woven {
            return Err(phase_violation("inject_dependencies", *phase));
        }

        let beans = self.beans.read();
        let mut injected = 0usize;
        for (class_id, entry) in beans.iter() {
            for field in entry.definition.metadata().autowired_fields() {
                let provider =
                    Self::unique_provider(&beans, class_id, &field.name, &field.declared_type)?;

                let slot = entry
                    .definition
                    .injection_point(&field.name)
                    .and_then(|point| point.slot(entry.bean.as_any()))
                    .ok_or_else(|| ComponentError::InvalidMetadata {
                        message: format!("{}.{} 没有可用的注入点", class_id, field.name),
                    })?;

                slot.inject(provider)
                    .map_err(|_| DependencyError::AlreadyInjected {
                        field: format!("{}.{}", class_id, field.name),
                    })?;
                debug!("注入依赖: {}.{} <- {}", class_id, field.name, field.declared_type);
                injected += 1;
            }
        }

        *phase = ContainerPhase::Injected;
        info!("依赖注入完成，共注入 {} 个字段", injected);
        Ok(())
    }

    fn contains(&self, class_id: &ClassId) -> bool {
        self.beans.read().contains_key(class_id)
    }

    fn class_ids(&self) -> Vec<ClassId> {
        self.beans.read().keys().cloned().collect()
    }

    fn len(&self) -> usize {
        self.beans.read().len()
    }

    fn phase(&self) -> ContainerPhase {
        *self.phase.read()
    }
}

impl std::fmt::Debug for BeanContainerImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeanContainerImpl")
            .field("phase", &self.phase())
            .field("beans", &self.class_ids())
            .finish()
    }
}
