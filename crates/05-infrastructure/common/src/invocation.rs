//! 调用参数与返回值
//!
//! 组件方法通过名称动态调用，参数和返回值统一使用 `serde_json::Value` 表示。

use crate::errors::InvocationError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// 方法调用参数（按位置）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Arguments(Vec<Value>);

impl Arguments {
    /// 空参数列表
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// 追加一个参数
    pub fn with(mut self, value: impl Into<Value>) -> Self {
        self.0.push(value.into());
        self
    }

    /// 追加一个可序列化的参数
    pub fn try_with<T: Serialize>(mut self, value: &T) -> Result<Self, InvocationError> {
        let index = self.0.len();
        let value = serde_json::to_value(value)
            .map_err(|e| InvocationError::invalid_argument(index, e.to_string()))?;
        self.0.push(value);
        Ok(self)
    }

    /// 追加参数
    pub fn push(&mut self, value: impl Into<Value>) {
        self.0.push(value.into());
    }

    /// 按位置取出参数并反序列化
    pub fn get<T: DeserializeOwned>(&self, index: usize) -> Result<T, InvocationError> {
        let value = self.0.get(index).ok_or_else(|| {
            InvocationError::invalid_argument(index, format!("参数个数不足, 共 {} 个", self.0.len()))
        })?;
        serde_json::from_value(value.clone())
            .map_err(|e| InvocationError::invalid_argument(index, e.to_string()))
    }

    /// 按位置取出原始参数值
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// 参数个数
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 是否没有参数
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 遍历参数
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.0.iter()
    }
}

impl From<Vec<Value>> for Arguments {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

/// 请求参数集合
///
/// 路由分发时作为控制器方法的唯一参数传入。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Param {
    params: BTreeMap<String, Value>,
}

impl Param {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加参数
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.params.insert(name.into(), value.into());
    }

    /// 获取参数
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// 获取字符串参数
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.params.get(name).and_then(Value::as_str)
    }

    /// 获取参数并转换为指定类型
    ///
    /// 字符串形式的数字或布尔值会先尝试按 JSON 解析。
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let value = self.params.get(name)?;
        if let Ok(typed) = serde_json::from_value::<T>(value.clone()) {
            return Some(typed);
        }
        value
            .as_str()
            .and_then(|raw| serde_json::from_str::<T>(raw).ok())
    }

    /// 是否没有参数
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Param {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            params: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// 视图结果：路径 + 模型
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct View {
    /// 视图路径，以 `/` 开头表示重定向
    pub path: String,
    /// 视图模型
    pub model: BTreeMap<String, Value>,
}

impl View {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            model: BTreeMap::new(),
        }
    }

    /// 添加模型数据
    pub fn add_model(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.model.insert(key.into(), value.into());
        self
    }

    /// 是否为重定向
    pub fn is_redirect(&self) -> bool {
        self.path.starts_with('/')
    }
}

/// 数据结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Data {
    pub model: Value,
}

impl Data {
    pub fn new(model: impl Into<Value>) -> Self {
        Self {
            model: model.into(),
        }
    }

    /// 从可序列化对象构建
    pub fn from_serialize<T: Serialize>(model: &T) -> Result<Self, InvocationError> {
        serde_json::to_value(model)
            .map(|model| Self { model })
            .map_err(|e| InvocationError::ReturnTypeMismatch {
                message: e.to_string(),
            })
    }
}

/// 方法返回值
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ReturnValue {
    /// 无返回值
    #[default]
    Unit,
    /// 普通数据
    Value(Value),
    /// 视图
    View(View),
    /// 数据（直接写回响应）
    Data(Data),
}

impl ReturnValue {
    /// 从可序列化对象构建普通返回值
    pub fn value<T: Serialize>(value: &T) -> Result<Self, InvocationError> {
        serde_json::to_value(value)
            .map(Self::Value)
            .map_err(|e| InvocationError::ReturnTypeMismatch {
                message: e.to_string(),
            })
    }

    /// 转换为调用方期望的类型
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T, InvocationError> {
        let value = match self {
            Self::Unit => Value::Null,
            Self::Value(value) => value,
            Self::Data(data) => data.model,
            Self::View(view) => serde_json::to_value(view).map_err(|e| {
                InvocationError::ReturnTypeMismatch {
                    message: e.to_string(),
                }
            })?,
        };
        serde_json::from_value(value).map_err(|e| InvocationError::ReturnTypeMismatch {
            message: e.to_string(),
        })
    }
}

impl From<View> for ReturnValue {
    fn from(view: View) -> Self {
        Self::View(view)
    }
}

impl From<Data> for ReturnValue {
    fn from(data: Data) -> Self {
        Self::Data(data)
    }
}

impl From<Value> for ReturnValue {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<()> for ReturnValue {
    fn from((): ()) -> Self {
        Self::Unit
    }
}
