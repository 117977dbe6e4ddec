//! # Infrastructure Common
//!
//! 这个 crate 提供了 Lorn MVC 运行时各层共享的组件模型、调用值和错误类型。
//!
//! ## 核心概念
//!
//! - [`ClassId`] - 类的稳定标识（全限定名），注册表和容器唯一的键类型
//! - [`ClassMetadata`] - 类上声明的标记：构造型、注入字段、路由方法、事务方法、切面
//! - [`ClassDefinition`] - 元数据 + 无参构造 + 静态初始化，相当于一个“已编译的类”
//! - [`Component`] - 容器托管实例（Bean）的调用接口，代理与原始实例实现同一接口
//! - [`Autowired`] - 字段注入槽位，启动阶段写入一次
//!
//! ## 设计原则
//!
//! - 类的发现基于显式注册的定义，而不是运行时反射
//! - 调用参数与返回值使用 `serde_json::Value` 作为统一的数据表示
//! - 错误类型按启动阶段划分，启动期错误全部为致命错误

pub mod class;
pub mod component;
pub mod configuration;
pub mod errors;
pub mod invocation;
pub mod metadata;

pub use class::*;
pub use component::*;
pub use configuration::*;
pub use errors::*;
pub use invocation::*;
pub use metadata::*;
