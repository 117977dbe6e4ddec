//! # 依赖注入具体实现
//!
//! 提供类目录（类加载器）、类路径扫描、组件注册表和 Bean 容器的具体实现

pub mod catalog;
pub mod container;
pub mod registry;
pub mod scanner;
pub mod sources;

pub use catalog::ClassCatalog;
pub use container::BeanContainerImpl;
pub use registry::ComponentRegistryImpl;
pub use scanner::ClassScannerImpl;
pub use sources::{ArchiveSource, CatalogSource, DirectorySource};
