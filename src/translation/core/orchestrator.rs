//! 批量翻译编排器
//!
//! 状态机：`Idle → Harvesting → Translating(i) → Flushing → Done`，
//! 任何非 `Idle` 状态都可能进入 `Cancelled`。
//!
//! 文档树基于 `Rc`，因此运行任务通过 `tokio::task::spawn_local` 启动，
//! 必须在 `LocalSet` 中使用。同一时刻最多只有一个活动运行：切换语言时
//! 先中止旧任务并使其令牌失效，再接触文档。
//!
//! 文档已带有原文标记（例如处理过一次的输出）时，当前显示的语言未知，
//! 任何语言切换都会执行，切换到默认语言时走恢复路径。

use std::rc::Rc;
use std::sync::Arc;

use markup5ever_rcdom::Handle;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;

use super::adapter::TranslationAdapter;
use super::events::{RunStatus, TranslationEvent};
use super::languages;
use super::run::{PipelineRun, RunContext, RunReport, RunSettings, RunState};
use crate::parsers::html::dom::find_elements_with_attr;
use crate::translation::config::{constants, TranslationConfig};
use crate::translation::pipeline::PageHarvester;
use crate::translation::storage::LanguageStore;

/// 一次运行的句柄
#[derive(Debug)]
pub struct RunHandle {
    run_id: u64,
    receiver: oneshot::Receiver<RunReport>,
}

impl RunHandle {
    fn ready(report: RunReport) -> Self {
        let (sender, receiver) = oneshot::channel();
        let run_id = report.run_id;
        let _ = sender.send(report);
        Self { run_id, receiver }
    }

    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    /// 等待运行结束；运行被取消时返回 `None`
    pub async fn wait(self) -> Option<RunReport> {
        self.receiver.await.ok()
    }
}

/// 页面翻译编排器
pub struct PageTranslator {
    document: Handle,
    adapter: Arc<TranslationAdapter>,
    store: Rc<dyn LanguageStore>,
    harvester: PageHarvester,
    config: TranslationConfig,
    ctx: Rc<RunContext>,
    current_lang: Option<String>,
    active: Option<JoinHandle<()>>,
    next_run_id: u64,
}

impl PageTranslator {
    /// 创建编排器
    ///
    /// 文档没有原文标记时初始语言为默认语言，否则未知。
    pub fn new(
        document: Handle,
        adapter: Arc<TranslationAdapter>,
        store: Rc<dyn LanguageStore>,
        config: TranslationConfig,
    ) -> Self {
        let tagged = !find_elements_with_attr(&document, constants::ORIGINAL_TEXT_ATTR).is_empty();
        let current_lang = if tagged {
            tracing::debug!("文档已带有原文标记，当前语言未知");
            None
        } else {
            Some(config.default_lang.clone())
        };

        Self {
            document,
            adapter,
            store,
            harvester: PageHarvester::new(config.excluded_class.clone()),
            current_lang,
            config,
            ctx: Rc::new(RunContext::new()),
            active: None,
            next_run_id: 0,
        }
    }

    /// 应用持久化的语言，没有保存（或不受支持）时使用默认语言
    ///
    /// 目标语言与当前语言相同时返回 `None`。
    pub fn initialize(&mut self) -> Option<RunHandle> {
        let stored = match self.store.load() {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!("读取已保存的语言失败: {}", e);
                None
            }
        };

        let target = match stored {
            Some(code) if languages::is_supported(&code) => code,
            Some(code) => {
                tracing::warn!("忽略不支持的已保存语言: {}", code);
                self.config.default_lang.clone()
            }
            None => self.config.default_lang.clone(),
        };

        if self.current_lang.as_deref() == Some(target.as_str()) {
            return None;
        }
        if target != self.config.default_lang {
            tracing::info!("恢复已保存的语言: {}", target);
        }
        self.change_language(&target)
    }

    /// 切换语言
    ///
    /// 与当前语言相同时不做任何事并返回 `None`。
    pub fn change_language(&mut self, code: &str) -> Option<RunHandle> {
        if self.current_lang.as_deref() == Some(code) {
            tracing::debug!("语言未变化: {}", code);
            return None;
        }

        self.cancel();

        self.current_lang = Some(code.to_string());
        if let Err(e) = self.store.save(code) {
            tracing::warn!("保存语言选择失败: {}", e);
        }
        self.ctx.events.emit(TranslationEvent::LanguageChanged {
            language: code.to_string(),
        });

        self.next_run_id += 1;
        let run_id = self.next_run_id;
        self.ctx.active_run.set(run_id);

        if code == self.config.default_lang || !self.config.enabled {
            return Some(self.restore(run_id, code));
        }

        self.ctx.state.set(RunState::Harvesting);
        let units = self.harvester.harvest(&self.document);

        if units.is_empty() {
            tracing::info!("没有可翻译的文本");
            return Some(self.finish_immediately(run_id, code, RunStatus::Completed));
        }

        let settings = RunSettings::from_config(&self.config, code);
        let run = PipelineRun::new(run_id, settings, units);
        tracing::info!(
            "开始翻译为 {}: {} 个单元，{} 个批次",
            code,
            run.unit_count(),
            run.batch_count()
        );
        self.ctx.events.emit(TranslationEvent::RunStarted {
            run_id,
            language: code.to_string(),
            units: run.unit_count(),
            batches: run.batch_count(),
        });

        let (sender, receiver) = oneshot::channel();
        let adapter = Arc::clone(&self.adapter);
        let harvester = self.harvester.clone();
        let ctx = Rc::clone(&self.ctx);

        self.active = Some(tokio::task::spawn_local(async move {
            if let Some(report) = run.execute(adapter, harvester, ctx).await {
                let _ = sender.send(report);
            }
        }));

        Some(RunHandle { run_id, receiver })
    }

    /// 取消当前运行，返回是否确实取消了一个运行
    pub fn cancel(&mut self) -> bool {
        let Some(handle) = self.active.take() else {
            return false;
        };

        if handle.is_finished() {
            return false;
        }

        handle.abort();
        let run_id = self.ctx.active_run.replace(0);
        self.ctx.state.set(RunState::Cancelled);
        self.ctx.events.emit(TranslationEvent::RunCancelled { run_id });
        tracing::info!("已取消翻译运行 {}", run_id);
        true
    }

    fn restore(&mut self, run_id: u64, code: &str) -> RunHandle {
        self.harvester.restore_original_texts(&self.document);
        self.finish_immediately(run_id, code, RunStatus::Restored)
    }

    fn finish_immediately(&mut self, run_id: u64, code: &str, status: RunStatus) -> RunHandle {
        self.ctx.state.set(RunState::Done);
        self.ctx.events.emit(TranslationEvent::RunFinished {
            run_id,
            language: code.to_string(),
            status,
        });
        RunHandle::ready(RunReport::immediate(run_id, code, status))
    }

    /// 当前状态
    pub fn state(&self) -> RunState {
        self.ctx.state.get()
    }

    /// 当前选择的语言，未知时为 `None`
    pub fn current_language(&self) -> Option<&str> {
        self.current_lang.as_deref()
    }

    pub fn default_language(&self) -> &str {
        &self.config.default_lang
    }

    /// 订阅翻译事件
    pub fn subscribe(&self) -> broadcast::Receiver<TranslationEvent> {
        self.ctx.events.subscribe()
    }

    pub fn adapter(&self) -> &Arc<TranslationAdapter> {
        &self.adapter
    }

    pub fn document(&self) -> &Handle {
        &self.document
    }
}

impl Drop for PageTranslator {
    fn drop(&mut self) {
        if let Some(handle) = self.active.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::dom::{html_to_dom, text_content};
    use crate::translation::core::dictionary::OfflineDictionary;
    use crate::translation::core::adapter::AdapterOptions;
    use crate::translation::storage::MemoryLanguageStore;
    use tokio::task::LocalSet;

    fn offline_translator(html: &str, store: MemoryLanguageStore) -> (PageTranslator, Handle) {
        let dom = html_to_dom(html.as_bytes(), "utf-8");
        let adapter = Arc::new(TranslationAdapter::new(
            None,
            OfflineDictionary::builtin(),
            AdapterOptions::default(),
        ));
        let config = TranslationConfig {
            batch_delay_ms: 0,
            ..TranslationConfig::default()
        };
        let document = dom.document.clone();
        (
            PageTranslator::new(dom.document, adapter, Rc::new(store), config),
            document,
        )
    }

    #[tokio::test]
    async fn test_same_language_is_noop() {
        LocalSet::new()
            .run_until(async {
                let (mut translator, _) =
                    offline_translator("<p>Buscar</p>", MemoryLanguageStore::new());

                assert!(translator.change_language("es").is_none());
                assert_eq!(translator.state(), RunState::Idle);
            })
            .await;
    }

    #[tokio::test]
    async fn test_offline_run_and_restore() {
        LocalSet::new()
            .run_until(async {
                let store = MemoryLanguageStore::new();
                let (mut translator, document) =
                    offline_translator("<h1>Catálogo</h1><p>xyz123</p>", store.clone());
                let mut events = translator.subscribe();

                let report = translator
                    .change_language("en")
                    .unwrap()
                    .wait()
                    .await
                    .unwrap();

                assert_eq!(report.status, RunStatus::Completed);
                assert_eq!(report.total_units, 2);
                assert_eq!(text_content(&document), "Catalogxyz123");
                assert_eq!(translator.state(), RunState::Done);
                assert_eq!(store.load().unwrap().as_deref(), Some("en"));
                assert_eq!(
                    events.recv().await.unwrap(),
                    TranslationEvent::LanguageChanged {
                        language: "en".to_string()
                    }
                );

                let restored = translator.change_language("es").unwrap().wait().await.unwrap();
                assert_eq!(restored.status, RunStatus::Restored);
                assert_eq!(text_content(&document), "Catálogoxyz123");
            })
            .await;
    }

    #[tokio::test]
    async fn test_initialize_uses_stored_language() {
        LocalSet::new()
            .run_until(async {
                let (mut translator, document) = offline_translator(
                    "<button>Guardar</button>",
                    MemoryLanguageStore::with_language("de"),
                );

                let report = translator.initialize().unwrap().wait().await.unwrap();
                assert_eq!(report.language, "de");
                assert_eq!(translator.current_language(), Some("de"));
                assert_eq!(text_content(&document), "Speichern");
            })
            .await;
    }

    #[tokio::test]
    async fn test_initialize_ignores_unsupported_language() {
        LocalSet::new()
            .run_until(async {
                let (mut translator, _) = offline_translator(
                    "<p>Buscar</p>",
                    MemoryLanguageStore::with_language("tlh"),
                );
                assert!(translator.initialize().is_none());
                assert_eq!(translator.current_language(), Some("es"));
            })
            .await;
    }

    #[tokio::test]
    async fn test_tagged_document_starts_in_unknown_language() {
        LocalSet::new()
            .run_until(async {
                let (mut translator, document) = offline_translator(
                    "<h1 data-original-text=\"Catálogo\">Catalog</h1>",
                    MemoryLanguageStore::new(),
                );
                assert_eq!(translator.current_language(), None);

                let report = translator.initialize().unwrap().wait().await.unwrap();
                assert_eq!(report.status, RunStatus::Restored);
                assert_eq!(translator.current_language(), Some("es"));
                assert_eq!(text_content(&document), "Catálogo");
                assert!(translator.initialize().is_none());
            })
            .await;
    }

    #[tokio::test]
    async fn test_empty_page_finishes_immediately() {
        LocalSet::new()
            .run_until(async {
                let (mut translator, _) =
                    offline_translator("<p>123</p>", MemoryLanguageStore::new());

                let report = translator.change_language("fr").unwrap().wait().await.unwrap();
                assert_eq!(report.status, RunStatus::Completed);
                assert_eq!(report.total_units, 0);
                assert_eq!(translator.state(), RunState::Done);
            })
            .await;
    }
}
