//! 路由表

use di_abstractions::ComponentRegistry;
use infrastructure_common::{ClassId, DuplicateRoutePolicy, RequestMethod, RoutingError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, warn};

/// 请求键：请求方法 + 路径，按值比较
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RequestKey {
    pub method: RequestMethod,
    pub path: String,
}

impl RequestKey {
    pub fn new(method: RequestMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// 处理方法：控制器类 + 方法名
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Handler {
    pub class_id: ClassId,
    pub method: String,
}

impl Handler {
    pub fn new(class_id: ClassId, method: impl Into<String>) -> Self {
        Self {
            class_id,
            method: method.into(),
        }
    }
}

impl fmt::Display for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.class_id, self.method)
    }
}

/// 路由表
///
/// 启动时构建一次，之后只读。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
    routes: BTreeMap<RequestKey, Handler>,
}

impl RouteTable {
    /// 从全部控制器类的路由标记构建
    ///
    /// 控制器按类标识排序，方法按声明顺序；重复的请求键按策略处理。
    pub fn build(
        registry: &dyn ComponentRegistry,
        policy: DuplicateRoutePolicy,
    ) -> Result<Self, RoutingError> {
        let mut table = Self::default();

        for class_id in registry.controller_classes() {
            let Some(metadata) = registry.metadata(&class_id) else {
                continue;
            };
            for (method, route) in metadata.routed_methods() {
                let key = RequestKey::new(route.method, route.path.clone());
                let handler = Handler::new(class_id.clone(), method.name.clone());
                table.insert(key, handler, policy)?;
            }
        }

        info!("路由表构建完成，共 {} 条路由", table.len());
        Ok(table)
    }

    /// 添加路由
    pub fn insert(
        &mut self,
        key: RequestKey,
        handler: Handler,
        policy: DuplicateRoutePolicy,
    ) -> Result<(), RoutingError> {
        if let Some(existing) = self.routes.get(&key) {
            match policy {
                DuplicateRoutePolicy::Reject => {
                    return Err(RoutingError::DuplicateRoute {
                        method: key.method,
                        path: key.path,
                        existing: existing.to_string(),
                        duplicate: handler.to_string(),
                    });
                }
                DuplicateRoutePolicy::Overwrite => {
                    warn!("路由 {} 被覆盖: {} -> {}", key, existing, handler);
                }
            }
        }

        debug!("注册路由: {} -> {}", key, handler);
        self.routes.insert(key, handler);
        Ok(())
    }

    /// 精确匹配
    pub fn resolve(&self, method: RequestMethod, path: &str) -> Option<&Handler> {
        self.routes.get(&RequestKey::new(method, path))
    }

    /// 按字符串形式的请求方法匹配，未知方法视为未命中
    pub fn resolve_str(&self, verb: &str, path: &str) -> Option<&Handler> {
        let method = verb.parse::<RequestMethod>().ok()?;
        self.resolve(method, path)
    }

    /// 全部路由（有序）
    pub fn routes(&self) -> Vec<(&RequestKey, &Handler)> {
        self.routes.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
