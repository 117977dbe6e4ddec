//! 切面织入
//!
//! 先计算 切面 -> 目标类 的映射，再反转为 目标类 -> 有序切面列表，
//! 最后为每个已实例化的目标安装代理。

use crate::aspect::{Aspect, AspectDefinitionExt, AspectFactory, ASPECT_SUPERTYPE};
use crate::proxy::ComponentProxy;
use crate::transaction::{LoggingTransactionManager, TransactionAspect, TransactionManager};
use di_abstractions::{BeanContainer, ClassLoader, ClassScanner, ComponentRegistry};
use infrastructure_common::{
    AspectMarker, Bean, ClassId, ClassMetadata, MarkerKind, Stereotype, WeavingError,
    WeavingPolicy,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, error, info};

/// 切面目标选择器
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AspectTarget {
    /// 单个类
    Class(ClassId),
    /// 命名空间（含子命名空间）下的全部类
    Namespace(String),
    /// 指定构造型的全部组件
    Stereotype(Stereotype),
}

impl AspectTarget {
    /// 由切面标记得到选择器；标记没有目标时返回 `None`
    pub fn from_marker(marker: &AspectMarker) -> Option<Self> {
        match (marker.namespace.as_deref(), marker.class_name.as_deref()) {
            (Some(namespace), Some(class_name)) if !class_name.is_empty() => {
                Some(Self::Class(ClassId::of(namespace, class_name)))
            }
            (Some(namespace), _) if !namespace.is_empty() => {
                Some(Self::Namespace(namespace.to_string()))
            }
            _ => None,
        }
    }
}

/// 以代码方式注册的切面
#[derive(Debug, Clone)]
pub struct AspectRegistration {
    pub name: String,
    pub target: AspectTarget,
    pub order: i32,
    pub factory: AspectFactory,
}

impl AspectRegistration {
    pub fn new(name: impl Into<String>, target: AspectTarget, factory: AspectFactory) -> Self {
        Self {
            name: name.into(),
            target,
            order: 0,
            factory,
        }
    }

    /// 设置织入顺序，数值小的在外层
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }
}

/// 织入结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeaveReport {
    /// 已安装代理的类及其切面（外层在前）
    pub woven: BTreeMap<ClassId, Vec<String>>,
    /// 宽松模式下织入失败的原因
    pub degraded: Option<String>,
}

impl WeaveReport {
    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }

    /// 某个类上的切面名称
    pub fn aspects_of(&self, class_id: &ClassId) -> &[String] {
        self.woven.get(class_id).map_or(&[], Vec::as_slice)
    }
}

/// 解析完目标的切面
struct ResolvedAspect {
    name: String,
    order: i32,
    targets: BTreeSet<ClassId>,
    factory: AspectFactory,
}

/// 切面织入器
pub struct AspectWeaver {
    policy: WeavingPolicy,
    registrations: Vec<AspectRegistration>,
    transaction_manager: Arc<dyn TransactionManager>,
}

impl AspectWeaver {
    pub fn new(policy: WeavingPolicy) -> Self {
        Self {
            policy,
            registrations: Vec::new(),
            transaction_manager: Arc::new(LoggingTransactionManager::new()),
        }
    }

    /// 指定事务管理器
    pub fn with_transaction_manager(mut self, manager: Arc<dyn TransactionManager>) -> Self {
        self.transaction_manager = manager;
        self
    }

    /// 注册切面
    pub fn register(&mut self, registration: AspectRegistration) {
        self.registrations.push(registration);
    }

    /// 织入
    ///
    /// 宽松模式下任何错误都只记录日志，不安装任何代理。
    pub fn weave(
        &self,
        registry: &dyn ComponentRegistry,
        scanner: &dyn ClassScanner,
        container: &dyn BeanContainer,
    ) -> Result<WeaveReport, WeavingError> {
        let proxies = match self.prepare(registry, scanner, container) {
            Ok(proxies) => proxies,
            Err(e) => return self.fail(e),
        };

        let mut report = WeaveReport::default();
        let mut installed: Vec<(ClassId, Bean)> = Vec::new();
        for (class_id, proxy) in proxies {
            let names: Vec<String> = proxy.aspects().iter().map(|a| a.name().to_string()).collect();
            let original = Arc::clone(proxy.target_bean());
            if let Err(source) = container.set_bean(&class_id, Arc::new(proxy)) {
                Self::restore(container, installed);
                return self.fail(WeavingError::ProxyInstallFailed {
                    class_id: class_id.to_string(),
                    source,
                });
            }
            installed.push((class_id.clone(), original));
            report.woven.insert(class_id, names);
        }

        info!("切面织入完成，共代理 {} 个类", report.woven.len());
        Ok(report)
    }

    /// 按织入策略处理错误
    fn fail(&self, e: WeavingError) -> Result<WeaveReport, WeavingError> {
        match self.policy {
            WeavingPolicy::Strict => Err(e),
            WeavingPolicy::Lenient => {
                error!("切面织入失败，跳过全部代理: {}", e);
                Ok(WeaveReport {
                    woven: BTreeMap::new(),
                    degraded: Some(e.to_string()),
                })
            }
        }
    }

    /// 撤销已安装的代理
    fn restore(container: &dyn BeanContainer, installed: Vec<(ClassId, Bean)>) {
        for (class_id, original) in installed.into_iter().rev() {
            if let Err(e) = container.set_bean(&class_id, original) {
                error!("撤销代理失败: {}: {}", class_id, e);
            }
        }
    }

    /// 计算全部代理，不修改容器
    fn prepare(
        &self,
        registry: &dyn ComponentRegistry,
        scanner: &dyn ClassScanner,
        container: &dyn BeanContainer,
    ) -> Result<Vec<(ClassId, ComponentProxy)>, WeavingError> {
        let mut resolved = self.resolve_aspects(registry, scanner)?;
        // 稳定排序：order 相同时保持声明顺序
        resolved.sort_by_key(|aspect| aspect.order);

        let mut target_aspects: BTreeMap<ClassId, Vec<Arc<dyn Aspect>>> = BTreeMap::new();
        for aspect in &resolved {
            for target in &aspect.targets {
                if !container.contains(target) {
                    debug!("切面 {} 的目标 {} 不是 Bean，跳过", aspect.name, target);
                    continue;
                }
                let instance =
                    aspect
                        .factory
                        .create()
                        .map_err(|e| WeavingError::AspectCreationFailed {
                            aspect: aspect.name.clone(),
                            message: e.to_string(),
                        })?;
                target_aspects
                    .entry(target.clone())
                    .or_default()
                    .push(instance);
            }
        }

        let mut proxies = Vec::with_capacity(target_aspects.len());
        for (class_id, aspects) in target_aspects {
            let metadata = self.target_metadata(&class_id, registry, scanner)?;
            let bean = container
                .get_bean(&class_id)
                .map_err(|source| WeavingError::ProxyInstallFailed {
                    class_id: class_id.to_string(),
                    source,
                })?;
            debug!(
                "为 {} 创建代理: {:?}",
                class_id,
                aspects.iter().map(|a| a.name()).collect::<Vec<_>>()
            );
            proxies.push((class_id, ComponentProxy::new(metadata, bean, aspects)));
        }

        Ok(proxies)
    }

    /// 切面类、代码注册的切面、事务切面，按此顺序
    fn resolve_aspects(
        &self,
        registry: &dyn ComponentRegistry,
        scanner: &dyn ClassScanner,
    ) -> Result<Vec<ResolvedAspect>, WeavingError> {
        let mut resolved = Vec::new();

        let aspect_classes: BTreeSet<ClassId> = registry
            .classes_implementing(&ClassId::new(ASPECT_SUPERTYPE))
            .intersection(&registry.classes_marked_with(&MarkerKind::Aspect))
            .cloned()
            .collect();

        for class_id in aspect_classes {
            let name = class_id.to_string();
            let Some(definition) = registry.definition(&class_id) else {
                continue;
            };
            let factory = definition.aspect_factory().cloned().ok_or_else(|| {
                WeavingError::AspectCreationFailed {
                    aspect: name.clone(),
                    message: "切面类没有切面工厂".to_string(),
                }
            })?;
            let marker = definition.metadata().aspect_marker().cloned().unwrap_or_default();
            let targets = match AspectTarget::from_marker(&marker) {
                Some(target) => Self::resolve_target(&name, &target, registry, scanner)?,
                None => BTreeSet::new(),
            };

            debug!("切面类 {} 命中 {} 个目标", name, targets.len());
            resolved.push(ResolvedAspect {
                name,
                order: marker.order,
                targets,
                factory,
            });
        }

        for registration in &self.registrations {
            let targets =
                Self::resolve_target(&registration.name, &registration.target, registry, scanner)?;
            debug!("切面 {} 命中 {} 个目标", registration.name, targets.len());
            resolved.push(ResolvedAspect {
                name: registration.name.clone(),
                order: registration.order,
                targets,
                factory: registration.factory.clone(),
            });
        }

        let manager = Arc::clone(&self.transaction_manager);
        resolved.push(ResolvedAspect {
            name: TransactionAspect::NAME.to_string(),
            order: i32::MAX,
            targets: registry.service_classes(),
            factory: AspectFactory::new(move || {
                Ok(Arc::new(TransactionAspect::new(Arc::clone(&manager))) as Arc<dyn Aspect>)
            }),
        });

        Ok(resolved)
    }

    fn resolve_target(
        aspect: &str,
        target: &AspectTarget,
        registry: &dyn ComponentRegistry,
        scanner: &dyn ClassScanner,
    ) -> Result<BTreeSet<ClassId>, WeavingError> {
        match target {
            AspectTarget::Class(class_id) => {
                if scanner.contains(class_id) {
                    Ok(BTreeSet::from([class_id.clone()]))
                } else {
                    Err(WeavingError::AspectTargetNotFound {
                        aspect: aspect.to_string(),
                        target: class_id.to_string(),
                    })
                }
            }
            AspectTarget::Namespace(namespace) => {
                scanner
                    .scan(namespace)
                    .map_err(|source| WeavingError::TargetScanFailed {
                        aspect: aspect.to_string(),
                        source,
                    })
            }
            AspectTarget::Stereotype(stereotype) => Ok(registry.classes_with_stereotype(*stereotype)),
        }
    }

    fn target_metadata(
        &self,
        class_id: &ClassId,
        registry: &dyn ComponentRegistry,
        scanner: &dyn ClassScanner,
    ) -> Result<Arc<ClassMetadata>, WeavingError> {
        if let Some(definition) = registry.definition(class_id) {
            return Ok(Arc::clone(definition.metadata()));
        }
        scanner
            .load(class_id, false)
            .map(|definition| Arc::clone(definition.metadata()))
            .map_err(|e| WeavingError::ProxyInstallFailed {
                class_id: class_id.to_string(),
                source: e.into(),
            })
    }
}

impl std::fmt::Debug for AspectWeaver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AspectWeaver")
            .field("policy", &self.policy)
            .field("registrations", &self.registrations)
            .field("transaction_manager", &self.transaction_manager)
            .finish()
    }
}
