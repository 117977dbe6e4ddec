//! 组件扫描器实现

use crate::catalog::ClassCatalog;
use crate::sources::CatalogSource;
use di_abstractions::{ClassLoader, ClassScanner, ClassSource};
use infrastructure_common::{ClassDefinition, ClassId, ComponentError};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

/// 组件扫描器
///
/// 汇总多个类名来源的结果，并通过类目录以不初始化的方式加载每个类。
pub struct ClassScannerImpl {
    catalog: Arc<ClassCatalog>,
    sources: Vec<Arc<dyn ClassSource>>,
}

impl ClassScannerImpl {
    /// 只使用类目录作为来源
    pub fn new(catalog: Arc<ClassCatalog>) -> Self {
        let source: Arc<dyn ClassSource> = Arc::new(CatalogSource::new(Arc::clone(&catalog)));
        Self {
            catalog,
            sources: vec![source],
        }
    }

    /// 使用指定的来源，不包含默认的类目录来源
    pub fn with_sources(catalog: Arc<ClassCatalog>, sources: Vec<Arc<dyn ClassSource>>) -> Self {
        Self { catalog, sources }
    }

    /// 追加来源
    pub fn add_source(&mut self, source: Arc<dyn ClassSource>) {
        self.sources.push(source);
    }

    pub fn catalog(&self) -> &Arc<ClassCatalog> {
        &self.catalog
    }
}

impl ClassLoader for ClassScannerImpl {
    fn load(
        &self,
        class_id: &ClassId,
        initialize: bool,
    ) -> Result<Arc<ClassDefinition>, ComponentError> {
        self.catalog.load(class_id, initialize)
    }

    fn contains(&self, class_id: &ClassId) -> bool {
        self.catalog.contains(class_id)
    }
}

impl ClassScanner for ClassScannerImpl {
    fn scan(&self, namespace: &str) -> Result<BTreeSet<ClassId>, ComponentError> {
        let mut classes = BTreeSet::new();

        for source in &self.sources {
            let found = source.list_classes(namespace)?;
            debug!("来源 {} 在命名空间 '{}' 中发现 {} 个类", source.name(), namespace, found.len());

            for class_id in found {
                self.catalog.load(&class_id, false)?;
                classes.insert(class_id);
            }
        }

        info!("扫描命名空间 '{}' 完成，共 {} 个类", namespace, classes.len());
        Ok(classes)
    }
}

impl std::fmt::Debug for ClassScannerImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassScannerImpl")
            .field("classes", &self.catalog.len())
            .field(
                "sources",
                &self.sources.iter().map(|s| s.name().to_string()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
