//! 翻译事件
//!
//! 编排器通过 `tokio::sync::broadcast` 发布事件，逐元素翻译器和调用方
//! 可以订阅。没有订阅者时事件被丢弃。

use tokio::sync::broadcast;

/// 运行结果状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// 所有批次都由首选后端完成
    Completed,
    /// 至少一个批次回退到了离线词典
    CompletedWithErrors,
    /// 目标为默认语言，已恢复原文
    Restored,
}

/// 翻译事件
#[derive(Debug, Clone, PartialEq)]
pub enum TranslationEvent {
    LanguageChanged {
        language: String,
    },
    RunStarted {
        run_id: u64,
        language: String,
        units: usize,
        batches: usize,
    },
    BatchCompleted {
        run_id: u64,
        batch_index: usize,
        fell_back: bool,
    },
    RunFinished {
        run_id: u64,
        language: String,
        status: RunStatus,
    },
    RunCancelled {
        run_id: u64,
    },
}

const EVENT_CAPACITY: usize = 64;

/// 事件发布器
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<TranslationEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }
}

impl EventBus {
    pub fn subscribe(&self) -> broadcast::Receiver<TranslationEvent> {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: TranslationEvent) {
        tracing::trace!("事件: {:?}", event);
        // 没有订阅者时发送失败，忽略即可
        let _ = self.sender.send(event);
    }
}
