//! 存储模块
//!
//! 提供翻译缓存和语言选择的持久化存储。

pub mod cache;
pub mod language_store;

pub use cache::{cache_key, CacheEntry, CacheStats, TranslationCache};
pub use language_store::{LanguageStore, MemoryLanguageStore, RedbLanguageStore};
