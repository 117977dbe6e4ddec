//! # 应用组合层
//!
//! 将扫描、注册、容器、切面织入和路由组合成一个可运行的应用。
//!
//! ## 主要功能
//!
//! - **应用构建器**: 使用构建者模式收集配置、类定义和切面
//! - **启动器**: 按固定顺序执行 扫描 -> 分类 -> 实例化 -> 织入 -> 注入 -> 路由
//! - **日志初始化**: 开发与生产环境的预设
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use infrastructure_composition::{Application, LoggingConfig};
//! use infrastructure_mvc::InboundRequest;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let app = Application::builder()
//!         .add_config_toml("config/app.toml")?
//!         .add_config_env_vars("LORN")
//!         .with_logging(LoggingConfig::development())
//!         .build()
//!         .await?;
//!
//!     let reply = app.dispatch(&InboundRequest::new("GET", "/userList")).await?;
//!     println!("{:?}", reply);
//!     Ok(())
//! }
//! ```

pub mod application;
pub mod bootstrapper;
pub mod builder;

pub use application::Application;
pub use bootstrapper::Bootstrapper;
pub use builder::{ApplicationBuilder, LoggingConfig};

// 重新导出错误类型
pub use infrastructure_common::InfrastructureError;

#[cfg(test)]
mod tests;
