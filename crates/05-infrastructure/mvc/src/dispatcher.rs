//! 请求分发
//!
//! 传输层之外的前端控制器：匹配路由、取出 Bean、调用处理方法并转换返回值。

use crate::route::{Handler, RouteTable};
use di_abstractions::BeanContainer;
use infrastructure_common::{
    Arguments, DependencyError, FrameworkSettings, InvocationError, Param, ReturnValue,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// 入站请求
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InboundRequest {
    /// 请求方法，大小写不敏感
    pub verb: String,
    /// 请求路径
    pub path: String,
    /// 请求参数
    pub params: Option<Param>,
}

impl InboundRequest {
    pub fn new(verb: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            verb: verb.into(),
            path: path.into(),
            params: None,
        }
    }

    /// 设置请求参数
    pub fn with_params(mut self, params: Param) -> Self {
        self.params = Some(params);
        self
    }
}

/// 分发结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Reply {
    /// 转发到视图模板
    Forward {
        template: String,
        model: BTreeMap<String, Value>,
    },
    /// 重定向
    Redirect { location: String },
    /// 直接返回数据
    Data { model: Value },
    /// 无内容
    Empty,
}

/// 分发错误类型
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("处理方法对应的 Bean 不可用: {handler}, 原因: {source}")]
    BeanUnavailable {
        handler: String,
        source: DependencyError,
    },

    #[error("{source}")]
    Invocation {
        #[from]
        source: InvocationError,
    },
}

/// 请求分发器
pub struct Dispatcher {
    routes: Arc<RouteTable>,
    container: Arc<dyn BeanContainer>,
    settings: Arc<FrameworkSettings>,
}

impl Dispatcher {
    pub fn new(
        routes: Arc<RouteTable>,
        container: Arc<dyn BeanContainer>,
        settings: Arc<FrameworkSettings>,
    ) -> Self {
        Self {
            routes,
            container,
            settings,
        }
    }

    /// 分发请求，没有匹配的路由或请求静态资源时返回 `None`
    pub async fn dispatch(&self, request: &InboundRequest) -> Result<Option<Reply>, DispatchError> {
        let path = self.settings.strip_context_path(&request.path);
        if self.settings.is_asset_path(path) {
            debug!("静态资源请求，不经过路由: {}", path);
            return Ok(None);
        }
        let Some(handler) = self.routes.resolve_str(&request.verb, path) else {
            debug!("没有匹配的路由: {} {}", request.verb, path);
            return Ok(None);
        };

        let value = self.invoke(handler, request.params.as_ref()).await?;
        Ok(Some(self.reply(value)))
    }

    async fn invoke(
        &self,
        handler: &Handler,
        params: Option<&Param>,
    ) -> Result<ReturnValue, DispatchError> {
        let bean = self
            .container
            .get_bean(&handler.class_id)
            .map_err(|source| DispatchError::BeanUnavailable {
                handler: handler.to_string(),
                source,
            })?;

        let args = match params {
            Some(params) if !params.is_empty() => Arguments::new().try_with(params)?,
            _ => Arguments::new(),
        };

        debug!("分发到 {}", handler);
        Ok(bean.invoke(&handler.method, &args).await?)
    }

    fn reply(&self, value: ReturnValue) -> Reply {
        match value {
            ReturnValue::View(view) if view.is_redirect() => Reply::Redirect {
                location: view.path,
            },
            ReturnValue::View(view) => Reply::Forward {
                template: format!("{}{}", self.settings.view_path, view.path),
                model: view.model,
            },
            ReturnValue::Data(data) => Reply::Data { model: data.model },
            ReturnValue::Value(model) => Reply::Data { model },
            ReturnValue::Unit => Reply::Empty,
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.routes.len())
            .field("context_path", &self.settings.context_path)
            .finish()
    }
}
