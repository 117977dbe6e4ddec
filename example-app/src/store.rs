//! 内存用户存储

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// 用户
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
}

impl User {
    pub fn new(id: u64, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
        }
    }
}

/// 存储错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("用户不存在: {id}")]
    UserNotFound { id: u64 },

    #[error("用户名不能为空")]
    EmptyName,
}

/// 内存用户存储
#[derive(Debug, Default)]
pub struct UserStore {
    users: RwLock<BTreeMap<u64, User>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 带演示数据的存储
    pub fn seeded() -> Self {
        let store = Self::new();
        for user in [
            User::new(1, "alice", "alice@example.com"),
            User::new(2, "bob", "bob@example.com"),
            User::new(3, "carol", "carol@example.com"),
        ] {
            store.insert(user);
        }
        store
    }

    pub fn insert(&self, user: User) {
        self.users.write().insert(user.id, user);
    }

    /// 按编号排序的全部用户
    pub fn list(&self) -> Vec<User> {
        self.users.read().values().cloned().collect()
    }

    pub fn get(&self, id: u64) -> Result<User, StoreError> {
        self.users
            .read()
            .get(&id)
            .cloned()
            .ok_or(StoreError::UserNotFound { id })
    }

    /// 修改用户名
    pub fn rename(&self, id: u64, name: &str) -> Result<User, StoreError> {
        if name.trim().is_empty() {
            return Err(StoreError::EmptyName);
        }
        let mut users = self.users.write();
        let user = users.get_mut(&id).ok_or(StoreError::UserNotFound { id })?;
        user.name = name.trim().to_string();
        Ok(user.clone())
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}
