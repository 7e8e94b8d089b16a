//! 翻译批次管理器模块
//!
//! 将收集到的单元按文档顺序切分为大小受限的批次。批次按顺序覆盖全部
//! 单元，每个批次记录其在单元序列中的起始位置，翻译结果据此写回到
//! 绝对序号上。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use dom_translate::translation::pipeline::{BatchManager, BatchManagerConfig};
//!
//! let mut manager = BatchManager::new(BatchManagerConfig::default());
//! let batches = manager.create_batches(&units);
//! println!("处理了 {} 个单元，生成 {} 个批次",
//!          manager.get_stats().input_items, manager.get_stats().output_batches);
//! ```

use crate::translation::config::{constants, TranslationConfig};

use super::harvester::TranslatableUnit;

/// 翻译批次
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// 批次序号（从 0 开始）
    pub index: usize,
    /// 第一个单元在整个单元序列中的位置
    pub start: usize,
    /// 待翻译文本，顺序与单元一致
    pub texts: Vec<String>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// 批次覆盖的绝对序号范围
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.start + self.texts.len()
    }

    /// 预估字符总数
    pub fn total_chars(&self) -> usize {
        self.texts.iter().map(|t| t.chars().count()).sum()
    }
}

/// 批次管理器配置
#[derive(Debug, Clone)]
pub struct BatchManagerConfig {
    /// 每批最多文本数
    pub max_batch_size: usize,
    /// 每隔多少个批次刷新一次文档
    pub flush_interval: usize,
}

impl Default for BatchManagerConfig {
    fn default() -> Self {
        Self {
            max_batch_size: constants::DEFAULT_BATCH_SIZE,
            flush_interval: constants::FLUSH_INTERVAL,
        }
    }
}

impl From<&TranslationConfig> for BatchManagerConfig {
    fn from(config: &TranslationConfig) -> Self {
        Self {
            max_batch_size: config.batch_size.max(1),
            flush_interval: config.flush_interval.max(1),
        }
    }
}

/// 批次统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub input_items: usize,
    pub output_batches: usize,
    pub total_chars: usize,
}

/// 批次管理器
#[derive(Debug, Default)]
pub struct BatchManager {
    config: BatchManagerConfig,
    stats: BatchStats,
}

impl BatchManager {
    /// 创建新的批次管理器
    pub fn new(config: BatchManagerConfig) -> Self {
        Self {
            config,
            stats: BatchStats::default(),
        }
    }

    /// 按顺序切分批次
    pub fn create_batches(&mut self, units: &[TranslatableUnit]) -> Vec<Batch> {
        let size = self.config.max_batch_size.max(1);

        let batches: Vec<Batch> = units
            .chunks(size)
            .enumerate()
            .map(|(index, chunk)| Batch {
                index,
                start: index * size,
                texts: chunk.iter().map(|u| u.source_text.clone()).collect(),
            })
            .collect();

        self.stats.input_items += units.len();
        self.stats.output_batches += batches.len();
        self.stats.total_chars += batches.iter().map(Batch::total_chars).sum::<usize>();

        tracing::debug!(
            "创建 {} 个批次（{} 个单元，每批最多 {}）",
            batches.len(),
            units.len(),
            size
        );

        batches
    }

    /// 处理完第 `batch_index` 个批次后是否需要刷新文档
    pub fn should_flush(&self, batch_index: usize, total_batches: usize) -> bool {
        batch_index % self.config.flush_interval.max(1) == 0 || batch_index + 1 == total_batches
    }

    pub fn get_stats(&self) -> &BatchStats {
        &self.stats
    }

    pub fn config(&self) -> &BatchManagerConfig {
        &self.config
    }
}
