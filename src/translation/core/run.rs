//! 单次翻译运行
//!
//! 一次运行拥有本轮收集到的单元、等长的稀疏结果缓冲区和批次游标。
//! 批次严格顺序提交；每次 await 之后都检查运行令牌，过期的运行不会
//! 修改结果、状态或文档。

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::counter;

use super::adapter::{Origin, TranslationAdapter};
use super::events::{EventBus, RunStatus, TranslationEvent};
use crate::translation::config::TranslationConfig;
use crate::translation::error::{ErrorStats, TranslationError};
use crate::translation::pipeline::{
    Batch, BatchManager, BatchManagerConfig, PageHarvester, TranslatableUnit,
};

/// 编排器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Harvesting,
    Translating(usize),
    Flushing,
    Done,
    Cancelled,
}

/// 单元的翻译结果
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationOutcome {
    pub index: usize,
    pub translated_text: String,
    pub origin: Origin,
}

/// 运行报告
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: u64,
    pub language: String,
    pub status: RunStatus,
    pub total_units: usize,
    pub total_batches: usize,
    pub failed_batches: Vec<usize>,
    pub outcomes: Vec<TranslationOutcome>,
    pub written: usize,
    pub errors: ErrorStats,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub(crate) fn immediate(run_id: u64, language: &str, status: RunStatus) -> Self {
        let now = Utc::now();
        Self {
            run_id,
            language: language.to_string(),
            status,
            total_units: 0,
            total_batches: 0,
            failed_batches: Vec::new(),
            outcomes: Vec::new(),
            written: 0,
            errors: ErrorStats::default(),
            started_at: now,
            finished_at: now,
        }
    }

    /// 运行耗时
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// 各来源的结果数量
    pub fn count_origin(&self, origin: Origin) -> usize {
        self.outcomes.iter().filter(|o| o.origin == origin).count()
    }
}

/// 编排器与运行任务共享的状态
#[derive(Debug)]
pub(crate) struct RunContext {
    pub state: Cell<RunState>,
    pub active_run: Cell<u64>,
    pub events: EventBus,
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            state: Cell::new(RunState::Idle),
            active_run: Cell::new(0),
            events: EventBus::default(),
        }
    }

    pub fn is_active(&self, run_id: u64) -> bool {
        self.active_run.get() == run_id
    }
}

/// 运行参数
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub target_lang: String,
    pub source_lang: String,
    pub batch_timeout: Duration,
    pub batch_delay: Duration,
    pub batching: BatchManagerConfig,
}

impl RunSettings {
    pub fn from_config(config: &TranslationConfig, target_lang: &str) -> Self {
        Self {
            target_lang: target_lang.to_string(),
            source_lang: config.source_lang.clone(),
            batch_timeout: config.batch_timeout(),
            batch_delay: config.batch_delay(),
            batching: BatchManagerConfig::from(config),
        }
    }
}

/// 一次翻译运行
pub(crate) struct PipelineRun {
    id: u64,
    settings: RunSettings,
    units: Vec<TranslatableUnit>,
    batches: Vec<Batch>,
    batch_manager: BatchManager,
    results: Vec<Option<TranslationOutcome>>,
    pending: Vec<usize>,
    failed_batches: Vec<usize>,
    errors: ErrorStats,
    written: usize,
    started_at: DateTime<Utc>,
}

impl PipelineRun {
    pub fn new(id: u64, settings: RunSettings, units: Vec<TranslatableUnit>) -> Self {
        let mut batch_manager = BatchManager::new(settings.batching.clone());
        let batches = batch_manager.create_batches(&units);
        let results = vec![None; units.len()];

        Self {
            id,
            settings,
            units,
            batches,
            batch_manager,
            results,
            pending: Vec::new(),
            failed_batches: Vec::new(),
            errors: ErrorStats::default(),
            written: 0,
            started_at: Utc::now(),
        }
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    /// 依次翻译所有批次；运行过期时返回 `None`
    pub async fn execute(
        mut self,
        adapter: Arc<TranslationAdapter>,
        harvester: PageHarvester,
        ctx: Rc<RunContext>,
    ) -> Option<RunReport> {
        let total = self.batches.len();
        let target = self.settings.target_lang.clone();
        let source = self.settings.source_lang.clone();

        for i in 0..total {
            if !ctx.is_active(self.id) {
                return None;
            }
            ctx.state.set(RunState::Translating(i));

            let texts = self.batches[i].texts.clone();
            tracing::debug!("提交第 {}/{} 批（{} 条）", i + 1, total, texts.len());
            counter!("dom_translate_batches_total").increment(1);

            let result = tokio::time::timeout(
                self.settings.batch_timeout,
                adapter.try_translate_batch(&texts, &target, &source),
            )
            .await;

            if !ctx.is_active(self.id) {
                tracing::debug!("运行 {} 已过期，丢弃第 {} 批结果", self.id, i);
                return None;
            }

            let output = match result.map_err(TranslationError::from).and_then(|r| r) {
                Ok(output) => output,
                Err(e) => {
                    tracing::warn!("第 {} 批翻译失败，使用离线词典: {}", i, e);
                    counter!("dom_translate_batch_fallbacks_total").increment(1);
                    self.errors.record_error(&e);
                    self.failed_batches.push(i);
                    adapter.offline_translate_all(&texts, &target)
                }
            };

            let start = self.batches[i].start;
            for (offset, (text, origin)) in output.texts.into_iter().zip(output.origins).enumerate() {
                let index = start + offset;
                self.results[index] = Some(TranslationOutcome {
                    index,
                    translated_text: text,
                    origin,
                });
                self.pending.push(index);
            }

            ctx.events.emit(TranslationEvent::BatchCompleted {
                run_id: self.id,
                batch_index: i,
                fell_back: self.failed_batches.last() == Some(&i),
            });

            if self.batch_manager.should_flush(i, total) {
                self.flush(&harvester);
            }

            if i + 1 < total && !self.settings.batch_delay.is_zero() {
                tokio::time::sleep(self.settings.batch_delay).await;
            }
        }

        if !ctx.is_active(self.id) {
            return None;
        }

        ctx.state.set(RunState::Flushing);
        self.flush(&harvester);
        ctx.state.set(RunState::Done);

        let report = self.into_report(&target);
        tracing::info!(
            "翻译完成: {} 个单元，{} 个批次，{} 个批次回退",
            report.total_units,
            report.total_batches,
            report.failed_batches.len()
        );
        ctx.events.emit(TranslationEvent::RunFinished {
            run_id: report.run_id,
            language: report.language.clone(),
            status: report.status,
        });
        Some(report)
    }

    /// 将缓冲区中尚未写入的结果写回文档
    fn flush(&mut self, harvester: &PageHarvester) {
        let mut written = 0;
        for index in self.pending.drain(..) {
            if let Some(outcome) = &self.results[index] {
                if harvester.write_back(&self.units[index], &outcome.translated_text) {
                    written += 1;
                }
            }
        }
        self.written += written;
        tracing::debug!("刷新写入 {} 个元素", written);
    }

    fn into_report(self, language: &str) -> RunReport {
        let status = if self.failed_batches.is_empty() {
            RunStatus::Completed
        } else {
            RunStatus::CompletedWithErrors
        };

        RunReport {
            run_id: self.id,
            language: language.to_string(),
            status,
            total_units: self.units.len(),
            total_batches: self.batches.len(),
            failed_batches: self.failed_batches,
            outcomes: self.results.into_iter().flatten().collect(),
            written: self.written,
            errors: self.errors,
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }
}
