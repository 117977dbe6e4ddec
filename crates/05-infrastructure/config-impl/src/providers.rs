//! 配置提供者实现
//!
//! 三种来源加载后都转换为 JSON 树，按 `.` 分隔的路径查找。

use async_trait::async_trait;
use config_abstractions::{ConfigProvider, FileConfigProvider};
use infrastructure_common::{ConfigError, ConfigSection};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// TOML 文件默认优先级
pub const TOML_PRIORITY: i32 = 100;
/// JSON 文件默认优先级
pub const JSON_PRIORITY: i32 = 90;
/// 环境变量默认优先级
pub const ENVIRONMENT_PRIORITY: i32 = 200;

/// 将 TOML 值转换为 JSON 值
fn toml_to_json(value: &toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s.clone()),
        toml::Value::Integer(i) => Value::Number((*i).into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(*f).map_or(Value::Null, Value::Number),
        toml::Value::Boolean(b) => Value::Bool(*b),
        toml::Value::Array(arr) => Value::Array(arr.iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .iter()
                .map(|(k, v)| (k.clone(), toml_to_json(v)))
                .collect(),
        ),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
    }
}

/// 从嵌套路径获取值
fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(root, |current, part| current.as_object()?.get(part))
}

fn section_of(root: &Value, section_name: &str) -> Result<ConfigSection, ConfigError> {
    match lookup(root, section_name) {
        Some(Value::Object(table)) => {
            let mut section = ConfigSection::new();
            for (key, value) in table {
                section.insert(key.clone(), value.clone());
            }
            Ok(section)
        }
        Some(_) => Err(ConfigError::TypeConversionError {
            message: format!("配置节 {} 不是表类型", section_name),
        }),
        None => Err(ConfigError::KeyNotFound {
            key: section_name.to_string(),
        }),
    }
}

/// 递归收集所有键
fn collect_keys(table: &Map<String, Value>, prefix: &str, keys: &mut Vec<String>) {
    for (key, value) in table {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        if let Value::Object(nested) = value {
            collect_keys(nested, &full_key, keys);
        }
        keys.push(full_key);
    }
}

fn all_keys(root: &Value) -> Vec<String> {
    let mut keys = Vec::new();
    if let Value::Object(table) = root {
        collect_keys(table, "", &mut keys);
    }
    keys.sort();
    keys
}

/// 已加载的配置文件
#[derive(Debug)]
struct FileDocument {
    path: PathBuf,
    root: Value,
}

impl FileDocument {
    fn load(
        path: PathBuf,
        parse: fn(&str) -> Result<Value, ConfigError>,
    ) -> Result<Self, ConfigError> {
        debug!("加载配置文件: {}", path.display());

        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(&path)?;
        let root = parse(&content)?;

        Ok(Self { path, root })
    }

    fn reload(&mut self, parse: fn(&str) -> Result<Value, ConfigError>) -> Result<(), ConfigError> {
        *self = Self::load(self.path.clone(), parse)?;
        Ok(())
    }
}

fn parse_toml(content: &str) -> Result<Value, ConfigError> {
    let value: toml::Value = toml::from_str(content).map_err(|e| ConfigError::ParseError {
        source: Box::new(e),
    })?;
    Ok(toml_to_json(&value))
}

fn parse_json(content: &str) -> Result<Value, ConfigError> {
    let value: Value = serde_json::from_str(content).map_err(|e| ConfigError::ParseError {
        source: Box::new(e),
    })?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(ConfigError::TypeConversionError {
            message: "JSON 配置文件的根节点必须是对象".to_string(),
        })
    }
}

/// TOML 配置提供者
#[derive(Debug)]
pub struct TomlConfigProvider {
    document: FileDocument,
    priority: i32,
}

impl TomlConfigProvider {
    /// 创建新的 TOML 配置提供者，文件立即加载
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Ok(Self {
            document: FileDocument::load(path.as_ref().to_path_buf(), parse_toml)?,
            priority: TOML_PRIORITY,
        })
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

#[async_trait]
impl ConfigProvider for TomlConfigProvider {
    async fn get_configuration(&self, key: &str) -> Result<Value, ConfigError> {
        lookup(&self.document.root, key)
            .cloned()
            .ok_or_else(|| ConfigError::KeyNotFound { key: key.to_string() })
    }

    async fn get_section(&self, section_name: &str) -> Result<ConfigSection, ConfigError> {
        section_of(&self.document.root, section_name)
    }

    async fn reload(&mut self) -> Result<(), ConfigError> {
        self.document.reload(parse_toml)
    }

    async fn contains_key(&self, key: &str) -> Result<bool, ConfigError> {
        Ok(lookup(&self.document.root, key).is_some())
    }

    async fn get_all_keys(&self) -> Result<Vec<String>, ConfigError> {
        Ok(all_keys(&self.document.root))
    }

    fn name(&self) -> &str {
        "TomlConfigProvider"
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

impl FileConfigProvider for TomlConfigProvider {
    fn file_path(&self) -> &Path {
        &self.document.path
    }
}

/// JSON 配置提供者
#[derive(Debug)]
pub struct JsonConfigProvider {
    document: FileDocument,
    priority: i32,
}

impl JsonConfigProvider {
    /// 创建新的 JSON 配置提供者，文件立即加载
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Ok(Self {
            document: FileDocument::load(path.as_ref().to_path_buf(), parse_json)?,
            priority: JSON_PRIORITY,
        })
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

#[async_trait]
impl ConfigProvider for JsonConfigProvider {
    async fn get_configuration(&self, key: &str) -> Result<Value, ConfigError> {
        lookup(&self.document.root, key)
            .cloned()
            .ok_or_else(|| ConfigError::KeyNotFound { key: key.to_string() })
    }

    async fn get_section(&self, section_name: &str) -> Result<ConfigSection, ConfigError> {
        section_of(&self.document.root, section_name)
    }

    async fn reload(&mut self) -> Result<(), ConfigError> {
        self.document.reload(parse_json)
    }

    async fn contains_key(&self, key: &str) -> Result<bool, ConfigError> {
        Ok(lookup(&self.document.root, key).is_some())
    }

    async fn get_all_keys(&self) -> Result<Vec<String>, ConfigError> {
        Ok(all_keys(&self.document.root))
    }

    fn name(&self) -> &str {
        "JsonConfigProvider"
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

impl FileConfigProvider for JsonConfigProvider {
    fn file_path(&self) -> &Path {
        &self.document.path
    }
}

/// 环境变量配置提供者
///
/// `LORN__FRAMEWORK__BASE_PACKAGE=demo` 在前缀为 `LORN` 时对应
/// `framework.base_package`。布尔值和数字按类型解析，其余保持字符串。
#[derive(Debug)]
pub struct EnvironmentConfigProvider {
    prefix: String,
    separator: String,
    priority: i32,
    /// 固定的变量集合，为 `None` 时从进程环境读取
    fixed: Option<Vec<(String, String)>>,
    root: Value,
}

impl EnvironmentConfigProvider {
    /// 默认的层级分隔符
    pub const DEFAULT_SEPARATOR: &'static str = "__";

    /// 从进程环境变量创建
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::build(prefix.into(), None)
    }

    /// 从给定的变量集合创建
    pub fn from_vars<I, K, V>(prefix: impl Into<String>, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars = vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Self::build(prefix.into(), Some(vars))
    }

    fn build(prefix: String, fixed: Option<Vec<(String, String)>>) -> Self {
        let mut provider = Self {
            prefix,
            separator: Self::DEFAULT_SEPARATOR.to_string(),
            priority: ENVIRONMENT_PRIORITY,
            fixed,
            root: Value::Object(Map::new()),
        };
        provider.load_env_vars();
        provider
    }

    /// 设置分隔符
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self.load_env_vars();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    fn load_env_vars(&mut self) {
        debug!("加载环境变量，前缀: {}", self.prefix);

        let mut vars: Vec<(String, String)> = match &self.fixed {
            Some(vars) => vars.clone(),
            None => std::env::vars().collect(),
        };
        vars.sort();

        let mut root = Map::new();
        let mut count = 0;
        for (key, raw) in vars {
            let Some(path) = self.config_path(&key) else {
                continue;
            };
            insert_path(&mut root, &path, parse_env_value(&raw));
            count += 1;
        }

        debug!("加载了 {} 个环境变量", count);
        self.root = Value::Object(root);
    }

    /// 将环境变量名转换为配置路径，不匹配前缀时返回 `None`
    fn config_path(&self, env_key: &str) -> Option<Vec<String>> {
        let rest = env_key
            .strip_prefix(self.prefix.as_str())?
            .strip_prefix(self.separator.as_str())?;
        let path: Vec<String> = rest
            .split(self.separator.as_str())
            .map(str::to_lowercase)
            .collect();
        if path.iter().any(String::is_empty) {
            return None;
        }
        Some(path)
    }
}

fn parse_env_value(raw: &str) -> Value {
    if let Ok(b) = raw.parse::<bool>() {
        Value::Bool(b)
    } else if let Ok(i) = raw.parse::<i64>() {
        Value::Number(i.into())
    } else if let Some(n) = raw
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
    {
        Value::Number(n)
    } else {
        Value::String(raw.to_string())
    }
}

/// 按路径插入，途中遇到非对象节点时以对象替换
fn insert_path(root: &mut Map<String, Value>, path: &[String], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };
    let mut current = root;
    for part in parents {
        let entry = current
            .entry(part.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        let Value::Object(next) = entry else {
            return;
        };
        current = next;
    }
    current.insert(last.clone(), value);
}

#[async_trait]
impl ConfigProvider for EnvironmentConfigProvider {
    async fn get_configuration(&self, key: &str) -> Result<Value, ConfigError> {
        lookup(&self.root, key)
            .cloned()
            .ok_or_else(|| ConfigError::KeyNotFound { key: key.to_string() })
    }

    async fn get_section(&self, section_name: &str) -> Result<ConfigSection, ConfigError> {
        section_of(&self.root, section_name)
    }

    async fn reload(&mut self) -> Result<(), ConfigError> {
        self.load_env_vars();
        Ok(())
    }

    async fn contains_key(&self, key: &str) -> Result<bool, ConfigError> {
        Ok(lookup(&self.root, key).is_some())
    }

    async fn get_all_keys(&self) -> Result<Vec<String>, ConfigError> {
        Ok(all_keys(&self.root))
    }

    fn name(&self) -> &str {
        "EnvironmentConfigProvider"
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_file(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_toml_provider() {
        let file = temp_file(
            ".toml",
            r#"
[framework]
base_package = "demo"
weaving = "strict"

[[framework.class_path]]
kind = "directory"
path = "classes"
"#,
        );
        let provider = TomlConfigProvider::new(file.path()).unwrap();

        assert_eq!(
            provider.get_configuration("framework.base_package").await.unwrap(),
            json!("demo")
        );
        assert!(provider.contains_key("framework.weaving").await.unwrap());
        assert!(!provider.contains_key("framework.missing").await.unwrap());

        let section = provider.get_section("framework").await.unwrap();
        assert_eq!(section.get("weaving"), Some(&json!("strict")));
        assert_eq!(
            section.get("class_path"),
            Some(&json!([{ "kind": "directory", "path": "classes" }]))
        );
        assert!(matches!(
            provider.get_section("framework.base_package").await,
            Err(ConfigError::TypeConversionError { .. })
        ));
        assert_eq!(provider.file_path(), file.path());
    }

    #[tokio::test]
    async fn test_reload_picks_up_changes() {
        let file = temp_file(".toml", "[framework]\nbase_package = \"demo\"\n");
        let mut provider = TomlConfigProvider::new(file.path()).unwrap();

        std::fs::write(file.path(), "[framework]\nbase_package = \"shop\"\n").unwrap();
        provider.reload().await.unwrap();

        assert_eq!(
            provider.get_configuration("framework.base_package").await.unwrap(),
            json!("shop")
        );
    }

    #[tokio::test]
    async fn test_json_provider_and_errors() {
        let file = temp_file(".json", r#"{ "framework": { "context_path": "/shop" } }"#);
        let provider = JsonConfigProvider::new(file.path()).unwrap();

        assert_eq!(
            provider.get_all_keys().await.unwrap(),
            vec!["framework", "framework.context_path"]
        );
        assert_eq!(provider.priority(), JSON_PRIORITY);

        let not_object = temp_file(".json", "[1, 2]");
        assert!(matches!(
            JsonConfigProvider::new(not_object.path()),
            Err(ConfigError::TypeConversionError { .. })
        ));

        let broken = temp_file(".toml", "[framework");
        assert!(matches!(
            TomlConfigProvider::new(broken.path()),
            Err(ConfigError::ParseError { .. })
        ));
        assert!(matches!(
            TomlConfigProvider::new("/nonexistent/app.toml"),
            Err(ConfigError::FileNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_environment_provider() {
        let provider = EnvironmentConfigProvider::from_vars(
            "LORN",
            [
                ("LORN__FRAMEWORK__BASE_PACKAGE", "demo"),
                ("LORN__FRAMEWORK__WEAVING", "strict"),
                ("LORN__SERVER__PORT", "8080"),
                ("LORN__SERVER__DEBUG", "true"),
                ("LORNX__IGNORED", "x"),
                ("PATH", "/usr/bin"),
            ],
        );

        assert_eq!(
            provider.get_configuration("framework.base_package").await.unwrap(),
            json!("demo")
        );
        assert_eq!(provider.get_configuration("server.port").await.unwrap(), json!(8080));
        assert_eq!(provider.get_configuration("server.debug").await.unwrap(), json!(true));
        assert!(!provider.contains_key("ignored").await.unwrap());

        let section = provider.get_section("framework").await.unwrap();
        assert_eq!(section.data.len(), 2);
        assert!(matches!(
            provider.get_section("database").await,
            Err(ConfigError::KeyNotFound { .. })
        ));
    }

    #[test]
    fn test_custom_separator() {
        let provider =
            EnvironmentConfigProvider::from_vars("APP", [("APP_FRAMEWORK_VIEW", "/views/")])
                .with_separator("_");

        assert_eq!(
            lookup(&provider.root, "framework.view"),
            Some(&json!("/views/"))
        );
    }
}
