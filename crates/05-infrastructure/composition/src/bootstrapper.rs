//! 应用启动器

use crate::application::Application;
use config_impl::ConfigManagerImpl;
use di_abstractions::{BeanContainer, ClassLoader, ClassScanner, ClassSource, ComponentRegistry};
use di_impl::{
    ArchiveSource, BeanContainerImpl, CatalogSource, ClassCatalog, ClassScannerImpl,
    ComponentRegistryImpl, DirectorySource,
};
use infrastructure_aop::AspectWeaver;
use infrastructure_common::{ClassPathKind, FrameworkSettings, InfrastructureError};
use infrastructure_mvc::RouteTable;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 应用启动器
///
/// 按固定顺序执行启动流程：
/// 扫描 -> 分类 -> 实例化 -> 织入 -> 注入 -> 路由。
/// `bootstrap` 消耗自身，同一个启动器只能运行一次。
pub struct Bootstrapper {
    settings: FrameworkSettings,
    catalog: ClassCatalog,
    sources: Vec<Arc<dyn ClassSource>>,
    weaver: AspectWeaver,
    config: Arc<ConfigManagerImpl>,
}

impl Bootstrapper {
    pub fn new(settings: FrameworkSettings, catalog: ClassCatalog, weaver: AspectWeaver) -> Self {
        Self {
            settings,
            catalog,
            sources: Vec::new(),
            weaver,
            config: Arc::new(ConfigManagerImpl::new()),
        }
    }

    /// 追加类名来源
    pub fn with_source(mut self, source: Arc<dyn ClassSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// 启动完成后由应用持有的配置管理器
    pub fn with_config(mut self, config: Arc<ConfigManagerImpl>) -> Self {
        self.config = config;
        self
    }

    /// 启动应用
    pub fn bootstrap(self) -> Result<Application, InfrastructureError> {
        info!("开始启动应用");

        let Self {
            settings,
            catalog,
            sources,
            weaver,
            config,
        } = self;

        settings.validate()?;
        if settings.base_package.is_empty() {
            return Err(InfrastructureError::BootstrapFailed {
                message: "未配置扫描的基础命名空间".to_string(),
            });
        }

        // 第一步：扫描
        let scanner = Arc::new(build_scanner(&settings, catalog, sources));
        let classes = scanner.scan(&settings.base_package)?;
        info!(
            "扫描完成: 命名空间 '{}' 下共 {} 个类",
            settings.base_package,
            classes.len()
        );

        // 第二步：分类
        let registry = ComponentRegistryImpl::build(&classes, scanner.as_ref())?;

        // 第三步：实例化全部组件
        let loader: Arc<dyn ClassLoader> = Arc::clone(&scanner) as Arc<dyn ClassLoader>;
        let container = BeanContainerImpl::new(loader);
        for class_id in registry.component_classes() {
            container.instantiate(&class_id)?;
        }
        info!("实例化完成: 共 {} 个 Bean", container.len());

        // 第四步：织入切面
        let weave_report = weaver.weave(&registry, scanner.as_ref(), &container)?;
        if weave_report.is_degraded() {
            warn!("切面织入已降级，应用以无代理方式运行");
        }
        container.mark_woven()?;

        // 第五步：依赖注入
        container.inject_dependencies()?;

        // 第六步：路由
        let routes = RouteTable::build(&registry, settings.duplicate_routes)?;
        for (key, handler) in routes.routes() {
            debug!("路由: {} -> {}", key, handler);
        }

        info!("应用启动完成");
        Ok(Application::new(
            Arc::new(settings),
            Arc::new(registry),
            Arc::new(container),
            Arc::new(routes),
            weave_report,
            config,
        ))
    }
}

/// 类目录、配置中的类路径条目以及额外来源
fn build_scanner(
    settings: &FrameworkSettings,
    catalog: ClassCatalog,
    extra: Vec<Arc<dyn ClassSource>>,
) -> ClassScannerImpl {
    let catalog = Arc::new(catalog);
    let mut sources: Vec<Arc<dyn ClassSource>> =
        vec![Arc::new(CatalogSource::new(Arc::clone(&catalog)))];

    let extension = settings.unit_extension.as_str();
    for entry in &settings.class_path {
        let source: Arc<dyn ClassSource> = match entry.kind {
            ClassPathKind::Directory => {
                Arc::new(DirectorySource::new(&entry.path).with_extension(extension))
            }
            ClassPathKind::Archive => {
                Arc::new(ArchiveSource::new(&entry.path).with_extension(extension))
            }
        };
        debug!("添加类路径来源: {}", source.name());
        sources.push(source);
    }
    sources.extend(extra);

    ClassScannerImpl::with_sources(catalog, sources)
}

impl std::fmt::Debug for Bootstrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bootstrapper")
            .field("settings", &self.settings)
            .field("classes", &self.catalog.len())
            .field("sources", &self.sources.len())
            .field("weaver", &self.weaver)
            .finish()
    }
}
