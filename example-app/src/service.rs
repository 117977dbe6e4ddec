//! 用户服务

use crate::store::UserStore;
use async_trait::async_trait;
use infrastructure_common::{
    Arguments, Component, InvocationError, InvocationResult, ReturnValue,
};
use std::any::Any;
use std::sync::Arc;

/// 用户服务类
pub const USER_SERVICE: &str = "demo::service::UserService";
/// 用户服务接口，控制器按此类型注入
pub const USER_SERVICE_API: &str = "demo::service::IUserService";

/// 用户服务
#[derive(Debug)]
pub struct UserService {
    store: Arc<UserStore>,
}

impl UserService {
    pub fn new(store: Arc<UserStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &UserStore {
        &self.store
    }
}

#[async_trait]
impl Component for UserService {
    async fn invoke(&self, method: &str, args: &Arguments) -> InvocationResult {
        match method {
            "get_user_list" => ReturnValue::value(&self.store.list()),
            "get_user_info" => {
                let id: u64 = args.get(0)?;
                let user = self.store.get(id).map_err(InvocationError::failed)?;
                ReturnValue::value(&user)
            }
            "update_user" => {
                let id: u64 = args.get(0)?;
                let name: String = args.get(1)?;
                let user = self.store.rename(id, &name).map_err(InvocationError::failed)?;
                ReturnValue::value(&user)
            }
            _ => Err(InvocationError::no_such_method(USER_SERVICE, method)),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
