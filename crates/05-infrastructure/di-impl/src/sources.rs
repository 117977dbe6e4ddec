//! 类名来源实现
//!
//! 目录与归档文件只提供类名，类的定义始终来自类目录。
//! 两者的布局相同：`<根>/<命名空间各段>/<类名>.<扩展名>`。

use crate::catalog::ClassCatalog;
use di_abstractions::ClassSource;
use infrastructure_common::{ClassId, ComponentError, NAMESPACE_SEPARATOR};
use std::fs::File;
use std::path::{Component as PathComponent, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// 默认的类单元文件扩展名
pub const DEFAULT_UNIT_EXTENSION: &str = "unit";

/// 类目录来源，列出静态注册的全部类
#[derive(Debug, Clone)]
pub struct CatalogSource {
    catalog: Arc<ClassCatalog>,
}

impl CatalogSource {
    pub fn new(catalog: Arc<ClassCatalog>) -> Self {
        Self { catalog }
    }
}

impl ClassSource for CatalogSource {
    fn name(&self) -> &str {
        "catalog"
    }

    fn list_classes(&self, namespace: &str) -> Result<Vec<ClassId>, ComponentError> {
        Ok(self.catalog.classes_in(namespace, true))
    }
}

/// 类路径目录来源
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    extension: String,
    name: String,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            name: format!("directory:{}", root.display()),
            root,
            extension: DEFAULT_UNIT_EXTENSION.to_string(),
        }
    }

    /// 指定类单元文件扩展名
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }
}

impl ClassSource for DirectorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_classes(&self, namespace: &str) -> Result<Vec<ClassId>, ComponentError> {
        if !self.root.is_dir() {
            return Err(ComponentError::scan_error(format!(
                "类路径目录不可读: {}",
                self.root.display()
            )));
        }

        let start = namespace_path(&self.root, namespace);
        if !start.exists() {
            debug!("命名空间目录不存在，跳过: {}", start.display());
            return Ok(Vec::new());
        }

        let mut classes = Vec::new();
        for entry in WalkDir::new(&start).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                ComponentError::scan_error(format!("读取命名空间目录失败: {}: {e}", start.display()))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            match unit_class_id(relative, &self.extension) {
                Some(class_id) => classes.push(class_id),
                None => debug!("忽略非类单元文件: {}", entry.path().display()),
            }
        }

        Ok(classes)
    }
}

/// 归档文件来源（zip 格式）
#[derive(Debug, Clone)]
pub struct ArchiveSource {
    path: PathBuf,
    extension: String,
    name: String,
}

impl ArchiveSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: format!("archive:{}", path.display()),
            path,
            extension: DEFAULT_UNIT_EXTENSION.to_string(),
        }
    }

    /// 指定类单元文件扩展名
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }
}

impl ClassSource for ArchiveSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_classes(&self, namespace: &str) -> Result<Vec<ClassId>, ComponentError> {
        let file = File::open(&self.path).map_err(|e| {
            ComponentError::scan_error(format!("归档文件不可读: {}: {e}", self.path.display()))
        })?;
        let mut archive = zip::ZipArchive::new(file).map_err(|e| {
            ComponentError::scan_error(format!("归档文件格式无效: {}: {e}", self.path.display()))
        })?;

        let prefix = namespace
            .split(NAMESPACE_SEPARATOR)
            .filter(|segment| !segment.is_empty())
            .fold(String::new(), |mut prefix, segment| {
                prefix.push_str(segment);
                prefix.push('/');
                prefix
            });

        let mut classes = Vec::new();
        for index in 0..archive.len() {
            let entry = match archive.by_index(index) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("跳过无法读取的归档条目: {}#{}: {}", self.path.display(), index, e);
                    continue;
                }
            };
            if entry.is_dir() || !entry.name().starts_with(&prefix) {
                continue;
            }
            if let Some(class_id) = unit_class_id(Path::new(entry.name()), &self.extension) {
                classes.push(class_id);
            }
        }

        classes.sort();
        Ok(classes)
    }
}

/// 命名空间在类路径根下对应的目录
fn namespace_path(root: &Path, namespace: &str) -> PathBuf {
    namespace
        .split(NAMESPACE_SEPARATOR)
        .filter(|segment| !segment.is_empty())
        .fold(root.to_path_buf(), |path, segment| path.join(segment))
}

/// 由相对路径得到类标识，扩展名不匹配时返回 `None`
fn unit_class_id(relative: &Path, extension: &str) -> Option<ClassId> {
    if relative.extension()?.to_str()? != extension {
        return None;
    }

    let mut segments = Vec::new();
    let parent = relative.parent().unwrap_or_else(|| Path::new(""));
    for component in parent.components() {
        match component {
            PathComponent::Normal(segment) => segments.push(segment.to_str()?),
            PathComponent::CurDir => {}
            _ => return None,
        }
    }
    segments.push(relative.file_stem()?.to_str()?);

    Some(ClassId::new(segments.join(NAMESPACE_SEPARATOR)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;

    #[test]
    fn test_unit_class_id() {
        assert_eq!(
            unit_class_id(Path::new("demo/service/UserService.unit"), "unit")
                .unwrap()
                .as_str(),
            "demo::service::UserService"
        );
        assert_eq!(
            unit_class_id(Path::new("Root.unit"), "unit").unwrap().as_str(),
            "Root"
        );
        assert!(unit_class_id(Path::new("demo/readme.txt"), "unit").is_none());
        assert!(unit_class_id(Path::new("../escape/A.unit"), "unit").is_none());
    }

    #[test]
    fn test_directory_source_lists_nested_namespaces() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("demo/controller")).unwrap();
        fs::create_dir_all(root.path().join("demo/service/impl_")).unwrap();
        fs::write(root.path().join("demo/controller/UserController.unit"), "").unwrap();
        fs::write(root.path().join("demo/service/impl_/UserService.unit"), "").unwrap();
        fs::write(root.path().join("demo/service/notes.md"), "").unwrap();

        let source = DirectorySource::new(root.path());
        let classes: Vec<_> = source
            .list_classes("demo")
            .unwrap()
            .into_iter()
            .map(|id| id.to_string())
            .collect();

        assert_eq!(
            classes,
            vec!["demo::controller::UserController", "demo::service::impl_::UserService"]
        );
        assert!(source.list_classes("missing").unwrap().is_empty());
    }

    #[test]
    fn test_directory_source_requires_root() {
        let root = tempfile::tempdir().unwrap();
        let source = DirectorySource::new(root.path().join("nope"));

        assert!(matches!(
            source.list_classes("demo"),
            Err(ComponentError::ScanError { .. })
        ));
    }

    #[test]
    fn test_archive_source_rejects_unreadable_archive() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("broken.zip");
        fs::write(&path, b"not a zip").unwrap();

        assert!(matches!(
            ArchiveSource::new(&path).list_classes("demo"),
            Err(ComponentError::ScanError { .. })
        ));
        assert!(matches!(
            ArchiveSource::new(root.path().join("absent.zip")).list_classes("demo"),
            Err(ComponentError::ScanError { .. })
        ));
    }

    /// 把中央目录中指定条目的压缩方式改为不支持的值
    fn corrupt_compression_method(bytes: &mut [u8], entry: &str) {
        const CENTRAL_HEADER: &[u8] = b"PK\x01\x02";
        let positions: Vec<usize> = bytes
            .windows(CENTRAL_HEADER.len())
            .enumerate()
            .filter(|(_, window)| *window == CENTRAL_HEADER)
            .map(|(pos, _)| pos)
            .collect();

        for pos in positions {
            let name_len = u16::from_le_bytes([bytes[pos + 28], bytes[pos + 29]]) as usize;
            if &bytes[pos + 46..pos + 46 + name_len] == entry.as_bytes() {
                bytes[pos + 10..pos + 12].copy_from_slice(&77u16.to_le_bytes());
                return;
            }
        }
        panic!("central directory entry not found: {entry}");
    }

    #[test]
    fn test_archive_source_skips_unreadable_entries() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("classes.zip");

        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options =
            zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for entry in ["demo/Good.unit", "demo/Bad.unit"] {
            writer.start_file(entry, options).unwrap();
            writer.write_all(b"unit").unwrap();
        }
        let mut bytes = writer.finish().unwrap().into_inner();
        corrupt_compression_method(&mut bytes, "demo/Bad.unit");
        fs::write(&path, bytes).unwrap();

        let classes = ArchiveSource::new(&path).list_classes("demo").unwrap();
        assert_eq!(classes, vec![ClassId::new("demo::Good")]);
    }
}
