//! 类标识与命名空间

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// 命名空间分隔符
pub const NAMESPACE_SEPARATOR: &str = "::";

/// 类标识
///
/// 全限定名形式的不透明标识，例如 `demo::controller::UserController`。
/// 克隆开销很小，可以作为各类映射表的键。
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(Arc<str>);

impl ClassId {
    /// 从全限定名创建类标识
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref().trim_matches(':')))
    }

    /// 由命名空间和类名拼接类标识
    pub fn of(namespace: &str, simple_name: &str) -> Self {
        let namespace = normalize_namespace(namespace);
        if namespace.is_empty() {
            Self::new(simple_name)
        } else {
            Self::new(format!("{namespace}{NAMESPACE_SEPARATOR}{simple_name}"))
        }
    }

    /// 全限定名
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 所在命名空间，根命名空间下的类返回空字符串
    pub fn namespace(&self) -> &str {
        let name: &str = &self.0;
        name.rsplit_once(NAMESPACE_SEPARATOR)
            .map_or("", |(namespace, _)| namespace)
    }

    /// 不含命名空间的类名
    pub fn simple_name(&self) -> &str {
        let name: &str = &self.0;
        name.rsplit_once(NAMESPACE_SEPARATOR)
            .map_or(name, |(_, simple)| simple)
    }

    /// 判断类是否位于指定命名空间中
    ///
    /// `recursive` 为真时子命名空间中的类同样算作命中。
    pub fn is_in(&self, namespace: &str, recursive: bool) -> bool {
        let namespace = normalize_namespace(namespace);
        let own = self.namespace();

        if namespace.is_empty() {
            return recursive || own.is_empty();
        }
        if own == namespace {
            return true;
        }
        recursive
            && own.len() > namespace.len()
            && own.starts_with(namespace)
            && own[namespace.len()..].starts_with(NAMESPACE_SEPARATOR)
    }
}

/// 去掉命名空间首尾多余的分隔符
pub fn normalize_namespace(namespace: &str) -> &str {
    namespace.trim().trim_matches(':')
}

/// 拼接子命名空间
pub fn join_namespace(parent: &str, child: &str) -> String {
    let parent = normalize_namespace(parent);
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{parent}{NAMESPACE_SEPARATOR}{child}")
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassId({})", self.0)
    }
}

impl From<&str> for ClassId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ClassId {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<&ClassId> for ClassId {
    fn from(id: &ClassId) -> Self {
        id.clone()
    }
}

impl Borrow<str> for ClassId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ClassId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
