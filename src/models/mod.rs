pub mod catalog;
pub mod classifier;
pub mod manager;

pub use catalog::ClassCatalog;
pub use classifier::Classifier;
pub use manager::{ModelManager, ModelStats};

// Re-export convenience functions from manager
pub use manager::{get_catalog, get_classifier, get_model_stats, health_check};
