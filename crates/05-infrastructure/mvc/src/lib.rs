//! # Infrastructure MVC
//!
//! 请求路由层：启动时从控制器的路由标记构建路由表，
//! 运行时按 (请求方法, 路径) 精确匹配找到处理方法并分发调用。

pub mod dispatcher;
pub mod route;

pub use dispatcher::*;
pub use route::*;
