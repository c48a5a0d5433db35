pub mod config;
pub mod models;
pub mod image;
pub mod analysis;
pub mod web;
pub mod utils;

// 重新导出主要类型
pub use analysis::AnalysisResult;
pub use config::Config;
pub use utils::error::FundusError;

pub type Result<T> = std::result::Result<T, FundusError>;
