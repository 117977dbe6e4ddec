//! # Infrastructure AOP
//!
//! 切面织入层：把横切行为（计时、事务边界）以代理链的形式包裹在组件方法外面。
//!
//! ## 核心概念
//!
//! - [`Aspect`] - 切面钩子：begin / intercept / before / after / error / end
//! - [`JoinPoint`] - 单次调用的上下文（类、方法、参数、开始时间）
//! - [`ProxyChain`] - 单次调用的切面链，目标方法只在链尾执行一次
//! - [`ComponentProxy`] - 替换容器中原始 Bean 的代理对象
//! - [`AspectWeaver`] - 计算切面与目标类的映射并安装代理
//!
//! 内置切面：[`TransactionAspect`]（服务上的事务方法）、[`TimingAspect`]（耗时统计）。

pub mod aspect;
pub mod chain;
pub mod proxy;
pub mod timing;
pub mod transaction;
pub mod weaver;

pub use aspect::*;
pub use chain::*;
pub use proxy::*;
pub use timing::*;
pub use transaction::*;
pub use weaver::*;
