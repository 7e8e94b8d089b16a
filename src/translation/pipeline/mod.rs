//! 翻译管道模块
//!
//! 提供文本处理管道，包括收集、过滤和批次切分

pub mod batch;
pub mod filters;
pub mod harvester;

// 重新导出主要类型
pub use batch::{Batch, BatchManager, BatchManagerConfig, BatchStats};
pub use filters::TextFilter;
pub use harvester::{PageHarvester, TranslatableUnit};
