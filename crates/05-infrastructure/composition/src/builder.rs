//! 应用构建器

use crate::application::Application;
use crate::bootstrapper::Bootstrapper;
use config_abstractions::{ConfigManager, ConfigProvider};
use config_impl::{ConfigManagerImpl, EnvironmentConfigProvider, JsonConfigProvider, TomlConfigProvider};
use di_abstractions::ClassSource;
use di_impl::ClassCatalog;
use infrastructure_aop::{AspectRegistration, AspectWeaver, TransactionManager};
use infrastructure_common::{
    ClassDefinition, ClassPathEntry, ClassPathKind, FrameworkSettings, InfrastructureError,
};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// 应用构建器
///
/// 收集配置、类定义、类路径和切面，`build` 时执行一次完整的启动流程。
pub struct ApplicationBuilder {
    /// 配置源列表
    config_sources: Vec<Box<dyn ConfigProvider>>,
    /// 直接指定的框架配置，优先于配置源
    settings: Option<FrameworkSettings>,
    /// 覆盖配置中的基础命名空间
    base_package: Option<String>,
    /// 类定义
    definitions: Vec<ClassDefinition>,
    /// 额外的类路径条目
    class_path: Vec<ClassPathEntry>,
    /// 额外的类名来源
    sources: Vec<Arc<dyn ClassSource>>,
    /// 代码注册的切面
    aspects: Vec<AspectRegistration>,
    /// 事务管理器
    transaction_manager: Option<Arc<dyn TransactionManager>>,
    /// 日志配置，为 `None` 时不初始化日志
    logging_config: Option<LoggingConfig>,
}

impl ApplicationBuilder {
    /// 创建新的应用构建器
    pub fn new() -> Self {
        Self {
            config_sources: Vec::new(),
            settings: None,
            base_package: None,
            definitions: Vec::new(),
            class_path: Vec::new(),
            sources: Vec::new(),
            aspects: Vec::new(),
            transaction_manager: None,
            logging_config: None,
        }
    }

    /// 添加 TOML 配置文件
    pub fn add_config_toml<P: AsRef<Path>>(mut self, path: P) -> Result<Self, InfrastructureError> {
        let path = path.as_ref();
        info!("添加 TOML 配置文件: {}", path.display());
        let provider = TomlConfigProvider::new(path)?;
        self.config_sources.push(Box::new(provider));
        Ok(self)
    }

    /// 添加 JSON 配置文件
    pub fn add_config_json<P: AsRef<Path>>(mut self, path: P) -> Result<Self, InfrastructureError> {
        let path = path.as_ref();
        info!("添加 JSON 配置文件: {}", path.display());
        let provider = JsonConfigProvider::new(path)?;
        self.config_sources.push(Box::new(provider));
        Ok(self)
    }

    /// 添加环境变量配置源
    pub fn add_config_env_vars<S: Into<String>>(mut self, prefix: S) -> Self {
        let prefix = prefix.into();
        info!("添加环境变量配置源，前缀: {}", prefix);
        self.config_sources
            .push(Box::new(EnvironmentConfigProvider::new(prefix)));
        self
    }

    /// 添加自定义配置提供者
    pub fn add_config_provider<T: ConfigProvider + 'static>(mut self, provider: T) -> Self {
        info!("添加自定义配置提供者: {}", provider.name());
        self.config_sources.push(Box::new(provider));
        self
    }

    /// 直接指定框架配置，不再从配置源读取 `framework` 节
    pub fn with_settings(mut self, settings: FrameworkSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// 指定扫描的基础命名空间
    pub fn with_base_package<S: Into<String>>(mut self, base_package: S) -> Self {
        self.base_package = Some(base_package.into());
        self
    }

    /// 注册类定义
    pub fn register_class(mut self, definition: ClassDefinition) -> Self {
        debug!("注册类: {}", definition.id());
        self.definitions.push(definition);
        self
    }

    /// 批量注册类定义
    pub fn register_classes<I>(mut self, definitions: I) -> Self
    where
        I: IntoIterator<Item = ClassDefinition>,
    {
        self.definitions.extend(definitions);
        self
    }

    /// 添加类路径目录
    pub fn add_class_path_directory<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.class_path.push(ClassPathEntry {
            kind: ClassPathKind::Directory,
            path: path.into(),
        });
        self
    }

    /// 添加类路径归档文件
    pub fn add_class_path_archive<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.class_path.push(ClassPathEntry {
            kind: ClassPathKind::Archive,
            path: path.into(),
        });
        self
    }

    /// 添加自定义类名来源
    pub fn add_class_source(mut self, source: Arc<dyn ClassSource>) -> Self {
        debug!("添加类名来源: {}", source.name());
        self.sources.push(source);
        self
    }

    /// 注册切面
    pub fn add_aspect(mut self, registration: AspectRegistration) -> Self {
        info!("注册切面: {}", registration.name);
        self.aspects.push(registration);
        self
    }

    /// 指定事务管理器
    pub fn with_transaction_manager(mut self, manager: Arc<dyn TransactionManager>) -> Self {
        self.transaction_manager = Some(manager);
        self
    }

    /// 配置日志
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging_config = Some(config);
        self
    }

    /// 构建并启动应用
    pub async fn build(self) -> Result<Application, InfrastructureError> {
        // 只有在明确配置了日志时才初始化日志
        if let Some(logging) = &self.logging_config {
            logging.init()?;
        }
        info!("开始构建应用");

        // 创建配置管理器
        let mut config_manager = ConfigManagerImpl::new();
        for provider in self.config_sources {
            config_manager.register_provider(provider).await?;
        }

        let mut settings = match self.settings {
            Some(settings) => settings,
            None => config_manager.framework_settings().await?,
        };
        if let Some(base_package) = self.base_package {
            settings.base_package = base_package;
        }
        settings.class_path.extend(self.class_path);

        let mut catalog = ClassCatalog::new();
        catalog.register_all(self.definitions)?;

        let mut weaver = AspectWeaver::new(settings.weaving);
        if let Some(manager) = self.transaction_manager {
            weaver = weaver.with_transaction_manager(manager);
        }
        for registration in self.aspects {
            weaver.register(registration);
        }

        let bootstrapper = self
            .sources
            .into_iter()
            .fold(Bootstrapper::new(settings, catalog, weaver), Bootstrapper::with_source)
            .with_config(Arc::new(config_manager));

        bootstrapper.bootstrap()
    }
}

impl Default for ApplicationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ApplicationBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationBuilder")
            .field("config_sources", &self.config_sources.len())
            .field("settings", &self.settings)
            .field("base_package", &self.base_package)
            .field("definitions", &self.definitions.len())
            .field("class_path", &self.class_path)
            .field("aspects", &self.aspects)
            .field("logging_config", &self.logging_config)
            .finish()
    }
}

static LOGGING_INITIALIZED: OnceCell<()> = OnceCell::new();

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: tracing::Level,
    /// 过滤指令，例如 `infrastructure_aop=debug`；设置了 `RUST_LOG` 时以环境变量为准
    pub filter: Option<String>,
    /// 是否显示目标
    pub show_target: bool,
    /// 是否显示线程ID
    pub show_thread_ids: bool,
    /// 是否显示文件名
    pub show_file: bool,
    /// 是否显示行号
    pub show_line_number: bool,
    /// 是否使用 JSON 格式
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: tracing::Level::INFO,
            filter: None,
            show_target: true,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// 创建开发环境日志配置
    pub fn development() -> Self {
        Self {
            level: tracing::Level::DEBUG,
            filter: None,
            show_target: true,
            show_thread_ids: true,
            show_file: true,
            show_line_number: true,
            json_format: false,
        }
    }

    /// 创建生产环境日志配置
    pub fn production() -> Self {
        Self {
            level: tracing::Level::INFO,
            filter: None,
            show_target: false,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: true,
        }
    }

    /// 设置过滤指令
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let directives = self
                .filter
                .clone()
                .unwrap_or_else(|| self.level.to_string().to_lowercase());
            EnvFilter::new(directives)
        })
    }

    /// 初始化日志系统，进程内只生效一次
    pub fn init(&self) -> Result<(), InfrastructureError> {
        if LOGGING_INITIALIZED.get().is_some() {
            debug!("日志系统已初始化，跳过");
            return Ok(());
        }

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(self.env_filter())
            .with_target(self.show_target)
            .with_thread_ids(self.show_thread_ids)
            .with_file(self.show_file)
            .with_line_number(self.show_line_number);

        if self.json_format {
            subscriber.json().try_init()
        } else {
            subscriber.try_init()
        }
        .map_err(|e| InfrastructureError::BootstrapFailed {
            message: format!("日志初始化失败: {}", e),
        })?;

        let _ = LOGGING_INITIALIZED.set(());
        info!("日志系统初始化完成");
        Ok(())
    }
}
