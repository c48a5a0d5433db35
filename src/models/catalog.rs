use crate::utils::error::FundusError;
use crate::Result;
use serde::Deserialize;
use std::fs::File;
use std::path::Path;

/// 类别映射文件的JSON结构
///
/// 模型导出时与ONNX文件一同生成，字段缺失视为启动失败。
#[derive(Debug, Deserialize)]
struct ClassMapping {
    classes: Vec<String>,
    model_name: String,
    test_accuracy: f32,
}

/// 疾病类别目录
///
/// 类别顺序与模型输出向量对齐，进程生命周期内不可变。
#[derive(Debug, Clone)]
pub struct ClassCatalog {
    classes: Vec<String>,
    model_name: String,
    test_accuracy: f32,
}

impl ClassCatalog {
    /// 从JSON侧车文件加载类别目录
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(FundusError::Metadata(
                format!("Class mapping file not found: {}", path.display())
            ));
        }

        let file = File::open(path)?;
        let mapping: ClassMapping = serde_json::from_reader(file)
            .map_err(|e| FundusError::Metadata(
                format!("Failed to parse class mapping {}: {}", path.display(), e)
            ))?;

        if mapping.classes.is_empty() {
            return Err(FundusError::Metadata(
                format!("Class mapping {} declares no classes", path.display())
            ));
        }

        tracing::info!(
            "Loaded class catalog: model={}, accuracy={:.2}%, classes={:?}",
            mapping.model_name,
            mapping.test_accuracy,
            mapping.classes
        );

        Ok(Self {
            classes: mapping.classes,
            model_name: mapping.model_name,
            test_accuracy: mapping.test_accuracy,
        })
    }

    /// 类别数量
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// 按索引查找类别名称
    pub fn class_name(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }

    /// 所有类别名称（与模型输出顺序一致）
    pub fn class_names(&self) -> &[String] {
        &self.classes
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn test_accuracy(&self) -> f32 {
        self.test_accuracy
    }

    /// 类别名称转为展示名称：下划线替换为空格并首字母大写
    pub fn display_name(class_name: &str) -> String {
        class_name
            .split('_')
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}
