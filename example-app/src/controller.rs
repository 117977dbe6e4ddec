//! 用户控制器

use crate::store::User;
use async_trait::async_trait;
use infrastructure_common::{
    Arguments, Autowired, Component, Data, InvocationError, InvocationResult, Param, View,
};
use serde_json::Value;
use std::any::Any;

/// 用户控制器类
pub const USER_CONTROLLER: &str = "demo::controller::UserController";

/// 用户控制器
#[derive(Debug, Default)]
pub struct UserController {
    pub(crate) user_service: Autowired,
}

impl UserController {
    /// 请求参数中的用户编号
    fn user_id(params: &Param) -> Result<u64, InvocationError> {
        params
            .get_as::<u64>("id")
            .ok_or_else(|| InvocationError::invalid_argument(0, "缺少参数 id"))
    }

    async fn user_list(&self) -> InvocationResult {
        let users: Value = self
            .user_service
            .call("get_user_list", Arguments::new())
            .await?;
        Ok(View::new("user_list.jsp").add_model("users", users).into())
    }

    async fn user_info(&self, params: &Param) -> InvocationResult {
        let id = Self::user_id(params)?;
        let user: User = self
            .user_service
            .call("get_user_info", Arguments::new().with(id))
            .await?;
        Ok(Data::from_serialize(&user)?.into())
    }

    async fn user_edit(&self, params: &Param) -> InvocationResult {
        let id = Self::user_id(params)?;
        let name = params
            .get_str("name")
            .ok_or_else(|| InvocationError::invalid_argument(0, "缺少参数 name"))?;
        let _: User = self
            .user_service
            .call("update_user", Arguments::new().with(id).with(name))
            .await?;
        Ok(View::new("/userList").into())
    }
}

#[async_trait]
impl Component for UserController {
    async fn invoke(&self, method: &str, args: &Arguments) -> InvocationResult {
        let params = || -> Result<Param, InvocationError> {
            if args.is_empty() {
                Ok(Param::new())
            } else {
                args.get(0)
            }
        };

        match method {
            "user_list" => self.user_list().await,
            "user_info" => self.user_info(&params()?).await,
            "user_edit" => self.user_edit(&params()?).await,
            _ => Err(InvocationError::no_such_method(USER_CONTROLLER, method)),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
