//! 元数据定义
//!
//! 描述类上声明的各种标记：构造型、字段注入、路由映射、事务、切面。
//! 元数据在注册时确定，之后不可变；分类完全依赖标记，而不是运行时行为。

use crate::class::ClassId;
use crate::errors::RoutingError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// 组件构造型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stereotype {
    /// 控制器：方法可以声明路由
    Controller,
    /// 服务：默认被事务切面代理
    Service,
}

impl Stereotype {
    /// 构造型对应的标记
    pub fn marker(self) -> MarkerKind {
        match self {
            Self::Controller => MarkerKind::Controller,
            Self::Service => MarkerKind::Service,
        }
    }
}

/// 类标记类型
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MarkerKind {
    /// 控制器标记
    Controller,
    /// 服务标记
    Service,
    /// 切面标记
    Aspect,
    /// 用户自定义标记
    Named(String),
}

/// 请求方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestMethod {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Trace,
}

impl RequestMethod {
    /// 全部请求方法
    pub const ALL: [Self; 8] = [
        Self::Get,
        Self::Head,
        Self::Post,
        Self::Put,
        Self::Patch,
        Self::Delete,
        Self::Options,
        Self::Trace,
    ];

    /// 大写名称
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Trace => "TRACE",
        }
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestMethod {
    type Err = RoutingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == upper)
            .ok_or_else(|| RoutingError::UnknownRequestMethod {
                method: s.to_string(),
            })
    }
}

/// 路由标记：方法上的 (请求方法, 路径)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteMarker {
    /// 请求方法
    pub method: RequestMethod,
    /// 请求路径
    pub path: String,
}

impl RouteMarker {
    /// 创建路由标记
    pub fn new(method: RequestMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }
}

/// 切面标记
///
/// 命名空间与类名同时给出时只织入该类；只给命名空间时织入该命名空间下所有类；
/// 两者都为空时没有目标。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AspectMarker {
    /// 目标命名空间
    pub namespace: Option<String>,
    /// 目标类名（不含命名空间）
    pub class_name: Option<String>,
    /// 织入顺序，数值小的在外层
    pub order: i32,
}

impl AspectMarker {
    /// 织入单个类
    pub fn class(namespace: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            class_name: Some(class_name.into()),
            order: 0,
        }
    }

    /// 织入整个命名空间
    pub fn namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            class_name: None,
            order: 0,
        }
    }

    /// 设置织入顺序
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }
}

/// 字段元数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMetadata {
    /// 字段名
    pub name: String,
    /// 声明类型（具体类或其实现的接口）
    pub declared_type: ClassId,
    /// 是否需要自动注入
    pub autowired: bool,
}

impl FieldMetadata {
    /// 创建需要自动注入的字段
    pub fn autowired(name: impl Into<String>, declared_type: impl Into<ClassId>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            autowired: true,
        }
    }
}

/// 方法元数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodMetadata {
    /// 方法名
    pub name: String,
    /// 路由标记
    pub route: Option<RouteMarker>,
    /// 是否带事务标记
    pub transactional: bool,
    /// 其他自定义标记
    pub markers: BTreeSet<String>,
}

impl MethodMetadata {
    /// 创建没有任何标记的方法
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            route: None,
            transactional: false,
            markers: BTreeSet::new(),
        }
    }

    /// 添加路由标记
    pub fn route(mut self, method: RequestMethod, path: impl Into<String>) -> Self {
        self.route = Some(RouteMarker::new(method, path));
        self
    }

    /// GET 路由
    pub fn get(self, path: impl Into<String>) -> Self {
        self.route(RequestMethod::Get, path)
    }

    /// POST 路由
    pub fn post(self, path: impl Into<String>) -> Self {
        self.route(RequestMethod::Post, path)
    }

    /// 添加事务标记
    pub fn transactional(mut self) -> Self {
        self.transactional = true;
        self
    }

    /// 添加自定义标记
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.markers.insert(marker.into());
        self
    }

    /// 是否带指定自定义标记
    pub fn has_marker(&self, marker: &str) -> bool {
        self.markers.contains(marker)
    }
}

/// 类元数据
///
/// 构造型、切面标记与标记集合只能通过构建方法修改，三者始终一致。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMetadata {
    /// 类标识
    pub id: ClassId,
    stereotype: Option<Stereotype>,
    markers: BTreeSet<MarkerKind>,
    /// 实现的接口或继承的父类
    pub supertypes: Vec<ClassId>,
    /// 字段
    pub fields: Vec<FieldMetadata>,
    /// 方法（按声明顺序）
    pub methods: Vec<MethodMetadata>,
    aspect: Option<AspectMarker>,
}

impl ClassMetadata {
    /// 创建没有任何标记的类
    pub fn new(id: impl Into<ClassId>) -> Self {
        Self {
            id: id.into(),
            stereotype: None,
            markers: BTreeSet::new(),
            supertypes: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            aspect: None,
        }
    }

    /// 标记为控制器
    pub fn controller(self) -> Self {
        self.with_stereotype(Stereotype::Controller)
    }

    /// 标记为服务
    pub fn service(self) -> Self {
        self.with_stereotype(Stereotype::Service)
    }

    /// 设置构造型
    pub fn with_stereotype(mut self, stereotype: Stereotype) -> Self {
        if let Some(previous) = self.stereotype.replace(stereotype) {
            self.markers.remove(&previous.marker());
        }
        self.markers.insert(stereotype.marker());
        self
    }

    /// 添加切面标记
    pub fn aspect(mut self, marker: AspectMarker) -> Self {
        self.aspect = Some(marker);
        self.markers.insert(MarkerKind::Aspect);
        self
    }

    /// 添加自定义标记
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.markers.insert(MarkerKind::Named(marker.into()));
        self
    }

    /// 声明实现的接口或父类
    pub fn implements(mut self, supertype: impl Into<ClassId>) -> Self {
        let supertype = supertype.into();
        if !self.supertypes.contains(&supertype) {
            self.supertypes.push(supertype);
        }
        self
    }

    /// 添加字段
    pub fn with_field(mut self, field: FieldMetadata) -> Self {
        self.fields.push(field);
        self
    }

    /// 添加方法
    pub fn with_method(mut self, method: MethodMetadata) -> Self {
        self.methods.push(method);
        self
    }

    /// 构造型
    pub fn stereotype(&self) -> Option<Stereotype> {
        self.stereotype
    }

    /// 类上的全部标记（包含构造型和切面对应的标记）
    pub fn markers(&self) -> &BTreeSet<MarkerKind> {
        &self.markers
    }

    /// 切面标记
    pub fn aspect_marker(&self) -> Option<&AspectMarker> {
        self.aspect.as_ref()
    }

    /// 是否为组件类（带有可识别的构造型）
    pub fn is_component(&self) -> bool {
        self.stereotype.is_some()
    }

    /// 是否带指定标记
    pub fn has_marker(&self, marker: &MarkerKind) -> bool {
        self.markers.contains(marker)
    }

    /// 是否是指定类型本身或其子类型
    pub fn is_assignable_to(&self, declared_type: &ClassId) -> bool {
        &self.id == declared_type || self.supertypes.contains(declared_type)
    }

    /// 按名称查找方法
    pub fn method(&self, name: &str) -> Option<&MethodMetadata> {
        self.methods.iter().find(|method| method.name == name)
    }

    /// 需要自动注入的字段
    pub fn autowired_fields(&self) -> impl Iterator<Item = &FieldMetadata> {
        self.fields.iter().filter(|field| field.autowired)
    }

    /// 是否存在带事务标记的方法
    pub fn has_transactional_method(&self) -> bool {
        self.methods.iter().any(|method| method.transactional)
    }

    /// 带路由标记的方法
    pub fn routed_methods(&self) -> impl Iterator<Item = (&MethodMetadata, &RouteMarker)> {
        self.methods
            .iter()
            .filter_map(|method| method.route.as_ref().map(|route| (method, route)))
    }
}

/// 组件描述符
///
/// 扫描分类阶段从元数据计算得到，之后不可变。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentDescriptor {
    /// 类标识
    pub class_id: ClassId,
    /// 构造型
    pub stereotype: Option<Stereotype>,
    /// 是否存在事务方法（仅对服务有意义）
    pub has_transactional_method: bool,
}

impl ComponentDescriptor {
    /// 从类元数据计算描述符
    pub fn from_metadata(metadata: &ClassMetadata) -> Self {
        Self {
            class_id: metadata.id.clone(),
            stereotype: metadata.stereotype(),
            has_transactional_method: metadata.stereotype() == Some(Stereotype::Service)
                && metadata.has_transactional_method(),
        }
    }
}
