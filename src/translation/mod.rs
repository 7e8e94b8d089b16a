//! 翻译模块
//!
//! - **core**: 后端适配器、编排器和逐元素翻译
//! - **pipeline**: 文本收集、过滤和批次切分
//! - **storage**: 翻译缓存和语言选择持久化
//! - **config**: 配置管理
//! - **error**: 错误处理
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use std::rc::Rc;
//! use std::sync::Arc;
//!
//! use dom_translate::parsers::html_to_dom;
//! use dom_translate::translation::{
//!     MemoryLanguageStore, PageTranslator, TranslationAdapter, TranslationConfig,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TranslationConfig::default();
//! let adapter = Arc::new(TranslationAdapter::from_config(&config)?);
//! let dom = html_to_dom(b"<p>Buscar</p>", "utf-8");
//!
//! let mut translator = PageTranslator::new(
//!     dom.document.clone(),
//!     adapter,
//!     Rc::new(MemoryLanguageStore::new()),
//!     config,
//! );
//! if let Some(handle) = translator.change_language("en") {
//!     let report = handle.wait().await;
//!     println!("{:?}", report.map(|r| r.status));
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod pipeline;
pub mod storage;

pub use config::{constants, load_translation_config, ConfigManager, TranslationConfig};
pub use core::{
    ElementReport, ElementTranslator, Origin, PageTranslator, RunHandle, RunReport, RunState,
    RunStatus, TranslationAdapter, TranslationEvent, TranslationOutcome,
};
pub use error::{ErrorCategory, ErrorSeverity, TranslationError, TranslationResult};
pub use pipeline::{Batch, BatchManager, PageHarvester, TextFilter, TranslatableUnit};
pub use storage::{LanguageStore, MemoryLanguageStore, RedbLanguageStore, TranslationCache};

/// 检查文本是否应该翻译
pub fn should_translate(text: &str) -> bool {
    TextFilter::new().should_translate(text)
}
