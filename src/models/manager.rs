use crate::models::{Classifier, ClassCatalog};
use crate::utils::error::FundusError;
use crate::{Config, Result};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::sync::Arc;

/// 全局模型管理器单例
///
/// 进程启动时加载一次，之后所有请求只读复用。
pub struct ModelManager {
    classifier: Arc<Classifier>,
    catalog: Arc<ClassCatalog>,
    config: Config,
}

static MODEL_MANAGER: OnceCell<Arc<Mutex<ModelManager>>> = OnceCell::new();

impl ModelManager {
    /// 初始化全局模型管理器
    ///
    /// 模型或类别文件缺失/损坏时返回错误，服务不可启动。
    pub fn init(config: Config) -> Result<()> {
        tracing::info!("Initializing model manager...");

        let catalog = Arc::new(ClassCatalog::load(&config.class_mapping_path())?);
        let classifier = Arc::new(Classifier::new(&config, catalog.len())?);

        let manager = ModelManager {
            classifier,
            catalog,
            config,
        };

        MODEL_MANAGER.set(Arc::new(Mutex::new(manager)))
            .map_err(|_| FundusError::Internal("Failed to initialize model manager".to_string()))?;

        tracing::info!("Model manager initialized successfully");
        Ok(())
    }

    /// 获取全局模型管理器实例
    pub fn instance() -> Result<Arc<Mutex<ModelManager>>> {
        MODEL_MANAGER.get()
            .cloned()
            .ok_or_else(|| FundusError::Internal("Model manager not initialized".to_string()))
    }

    /// 获取分类器引用
    pub fn classifier(&self) -> Arc<Classifier> {
        Arc::clone(&self.classifier)
    }

    /// 获取类别目录引用
    pub fn catalog(&self) -> Arc<ClassCatalog> {
        Arc::clone(&self.catalog)
    }

    /// 获取配置引用
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 模型健康检查
    pub fn health_check(&self) -> Result<()> {
        tracing::debug!("Performing model health check...");

        if self.catalog.is_empty() {
            return Err(FundusError::Metadata("Class catalog is empty".to_string()));
        }

        if self.classifier.num_classes() != self.catalog.len() {
            return Err(FundusError::Internal(format!(
                "Classifier expects {} classes but catalog has {}",
                self.classifier.num_classes(),
                self.catalog.len()
            )));
        }

        tracing::debug!("Model health check passed");
        Ok(())
    }

    /// 获取模型统计信息
    pub fn get_stats(&self) -> ModelStats {
        ModelStats {
            model_name: self.catalog.model_name().to_string(),
            test_accuracy: self.catalog.test_accuracy(),
            num_classes: self.catalog.len(),
            classes: self.catalog.class_names().to_vec(),
            intra_threads: self.config.onnx_config.intra_threads,
            optimization_level: self.config.onnx_config.optimization_level,
        }
    }
}

/// 模型统计信息
#[derive(Debug, Clone, serde::Serialize)]
pub struct ModelStats {
    pub model_name: String,
    pub test_accuracy: f32,
    pub num_classes: usize,
    pub classes: Vec<String>,
    pub intra_threads: usize,
    pub optimization_level: i32,
}

/// 便捷函数：获取分类器
pub fn get_classifier() -> Result<Arc<Classifier>> {
    let manager = ModelManager::instance()?;
    let guard = manager.lock();
    Ok(guard.classifier())
}

/// 便捷函数：获取类别目录
pub fn get_catalog() -> Result<Arc<ClassCatalog>> {
    let manager = ModelManager::instance()?;
    let guard = manager.lock();
    Ok(guard.catalog())
}

/// 便捷函数：检查模型健康状态
pub fn health_check() -> Result<()> {
    let manager = ModelManager::instance()?;
    let guard = manager.lock();
    guard.health_check()
}

/// 便捷函数：获取模型统计信息
pub fn get_model_stats() -> Result<ModelStats> {
    let manager = ModelManager::instance()?;
    let guard = manager.lock();
    Ok(guard.get_stats())
}
