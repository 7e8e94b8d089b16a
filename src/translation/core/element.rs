//! 逐元素翻译
//!
//! 带有 `data-self-translate` 的元素自行管理文本，不参与批量收集。
//! 每次语言变化时逐个处理：保存原文，默认语言时恢复原文，其他语言
//! 单独请求翻译（带超时）。远程失败时使用离线词典，超时则显示原文。

use std::sync::Arc;
use std::time::Duration;

use markup5ever_rcdom::Handle;
use tokio::sync::broadcast::{self, error::RecvError};

use super::adapter::TranslationAdapter;
use super::events::TranslationEvent;
use crate::parsers::html::dom::{
    find_elements_with_attr, get_node_attr, set_node_attr, set_text_content, text_content,
};
use crate::translation::config::{constants, TranslationConfig};
use crate::translation::pipeline::TextFilter;

/// 一次逐元素处理的统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementReport {
    pub translated: usize,
    pub restored: usize,
    pub fell_back: usize,
    pub skipped: usize,
}

impl ElementReport {
    fn merge(&mut self, other: &ElementReport) {
        self.translated += other.translated;
        self.restored += other.restored;
        self.fell_back += other.fell_back;
        self.skipped += other.skipped;
    }
}

/// 逐元素翻译器
pub struct ElementTranslator {
    document: Handle,
    adapter: Arc<TranslationAdapter>,
    default_lang: String,
    source_lang: String,
    timeout: Duration,
    filter: TextFilter,
}

impl ElementTranslator {
    pub fn new(
        document: Handle,
        adapter: Arc<TranslationAdapter>,
        config: &TranslationConfig,
    ) -> Self {
        Self {
            document,
            adapter,
            default_lang: config.default_lang.clone(),
            source_lang: config.source_lang.clone(),
            timeout: config.element_timeout(),
            filter: TextFilter::new(),
        }
    }

    /// 将所有自管理元素切换到指定语言
    pub async fn apply(&self, language: &str) -> ElementReport {
        let mut report = ElementReport::default();
        let elements = find_elements_with_attr(&self.document, constants::SELF_TRANSLATE_ATTR);

        for element in elements {
            let original = match get_node_attr(&element, constants::ORIGINAL_TEXT_ATTR) {
                Some(original) => original,
                None => {
                    let original = text_content(&element).trim().to_string();
                    set_node_attr(
                        &element,
                        constants::ORIGINAL_TEXT_ATTR,
                        Some(original.clone()),
                    );
                    original
                }
            };

            if language == self.default_lang {
                if text_content(&element).trim() != original {
                    set_text_content(&element, &original);
                    report.restored += 1;
                }
                continue;
            }

            if !self.filter.meets_min_length(&original) {
                report.skipped += 1;
                continue;
            }

            let texts = [original.clone()];
            let result = tokio::time::timeout(
                self.timeout,
                self.adapter.try_translate_batch(&texts, language, &self.source_lang),
            )
            .await;

            match result {
                Ok(Ok(output)) => {
                    let translated = output
                        .texts
                        .into_iter()
                        .next()
                        .unwrap_or_else(|| original.clone());
                    set_text_content(&element, &translated);
                    report.translated += 1;
                }
                Ok(Err(e)) => {
                    tracing::warn!("元素翻译失败，使用离线词典: {}", e);
                    let output = self.adapter.offline_translate_all(&texts, language);
                    let translated = output
                        .texts
                        .into_iter()
                        .next()
                        .unwrap_or_else(|| original.clone());
                    set_text_content(&element, &translated);
                    report.fell_back += 1;
                }
                Err(_) => {
                    tracing::warn!("元素翻译超时（{:?}），显示原文", self.timeout);
                    set_text_content(&element, &original);
                    report.fell_back += 1;
                }
            }
        }

        tracing::debug!("逐元素翻译完成: {:?}", report);
        report
    }

    /// 监听语言变化事件，直到事件通道关闭；返回累计统计
    pub async fn listen(self, mut events: broadcast::Receiver<TranslationEvent>) -> ElementReport {
        let mut total = ElementReport::default();
        loop {
            match events.recv().await {
                Ok(TranslationEvent::LanguageChanged { language }) => {
                    let report = self.apply(&language).await;
                    total.merge(&report);
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("逐元素翻译器落后 {} 个事件", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
        total
    }
}
