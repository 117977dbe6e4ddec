//! # Configuration Abstractions
//!
//! 配置管理抽象层，定义配置来源与分层管理的接口。
//!
//! ## 核心接口
//!
//! - [`ConfigProvider`] - 配置提供者接口
//! - [`ConfigManager`] - 配置管理器接口

pub mod manager;
pub mod provider;

pub use manager::*;
pub use provider::*;
