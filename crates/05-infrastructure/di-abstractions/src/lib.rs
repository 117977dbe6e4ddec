//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义类扫描、组件分类和 Bean 容器的核心接口。
//!
//! ## 核心接口
//!
//! - [`ClassSource`] - 类名来源（静态目录、类路径目录、归档文件）
//! - [`ClassLoader`] - 按类标识加载类定义
//! - [`ClassScanner`] - 组件扫描器接口
//! - [`ComponentRegistry`] - 组件注册表接口
//! - [`BeanContainer`] - Bean 容器接口

pub mod container;
pub mod registry;
pub mod scanner;

pub use container::*;
pub use registry::*;
pub use scanner::*;
