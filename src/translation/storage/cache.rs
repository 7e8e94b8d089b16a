//! 翻译缓存模块
//!
//! 按 `(源语言, 目标语言, 原文)` 缓存远程翻译结果，容量受限（LRU 驱逐），
//! 条目带有 TTL。只缓存远程翻译成功的结果。

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use lru::LruCache;

use crate::translation::config::{constants, TranslationConfig};

/// 缓存条目
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub translated_text: String,
    pub created_at: Instant,
    pub access_count: u64,
}

impl CacheEntry {
    fn new(translated_text: String) -> Self {
        Self {
            translated_text,
            created_at: Instant::now(),
            access_count: 0,
        }
    }

    /// 检查条目是否过期
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() > ttl
    }
}

/// 缓存统计信息
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub total_requests: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub total_entries: usize,
    pub evictions: u64,
}

impl CacheStats {
    /// 计算缓存命中率
    pub fn hit_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.total_requests as f64
        }
    }
}

struct CacheState {
    entries: LruCache<String, CacheEntry>,
    stats: CacheStats,
}

impl fmt::Debug for CacheState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheState")
            .field("len", &self.entries.len())
            .field("cap", &self.entries.cap())
            .field("stats", &self.stats)
            .finish()
    }
}

/// 翻译缓存
#[derive(Debug, Clone)]
pub struct TranslationCache {
    state: Arc<RwLock<CacheState>>,
    ttl: Duration,
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::with_config(constants::DEFAULT_LOCAL_CACHE_SIZE, constants::DEFAULT_CACHE_TTL)
    }
}

impl TranslationCache {
    /// 使用指定配置创建缓存
    pub fn with_config(max_size: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(max_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            state: Arc::new(RwLock::new(CacheState {
                entries: LruCache::new(capacity),
                stats: CacheStats::default(),
            })),
            ttl,
        }
    }

    /// 根据翻译配置创建缓存，未启用时返回 `None`
    pub fn from_config(config: &TranslationConfig) -> Option<Self> {
        config
            .cache_enabled
            .then(|| Self::with_config(config.local_cache_size, config.cache_ttl()))
    }

    /// 获取缓存的译文
    pub fn get(&self, text: &str, source_lang: &str, target_lang: &str) -> Option<String> {
        let key = cache_key(text, source_lang, target_lang);
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let state = &mut *guard;
        state.stats.total_requests += 1;

        match state.entries.peek(&key).map(|entry| entry.is_expired(self.ttl)) {
            Some(false) => {
                if let Some(entry) = state.entries.get_mut(&key) {
                    entry.access_count += 1;
                    state.stats.cache_hits += 1;
                    return Some(entry.translated_text.clone());
                }
            }
            Some(true) => {
                state.entries.pop(&key);
                state.stats.evictions += 1;
            }
            None => {}
        }

        state.stats.cache_misses += 1;
        None
    }

    /// 插入缓存条目
    pub fn insert(&self, text: &str, translated: String, source_lang: &str, target_lang: &str) {
        let key = cache_key(text, source_lang, target_lang);
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

        // `push` 在容量已满时返回被驱逐的条目，键相同时返回旧值
        if let Some((evicted, _)) = state.entries.push(key.clone(), CacheEntry::new(translated)) {
            if evicted != key {
                state.stats.evictions += 1;
            }
        }
        state.stats.total_entries = state.entries.len();
    }

    /// 清空缓存
    pub fn clear(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.entries.clear();
        state.stats.total_entries = 0;
    }

    /// 清理过期条目
    pub fn cleanup_expired(&self) -> usize {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let ttl = self.ttl;

        let expired_keys: Vec<String> = state
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(ttl))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            state.entries.pop(key);
        }

        state.stats.total_entries = state.entries.len();
        state.stats.evictions += expired_keys.len() as u64;
        expired_keys.len()
    }

    /// 获取统计信息
    pub fn get_stats(&self) -> CacheStats {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let mut stats = state.stats.clone();
        stats.total_entries = state.entries.len();
        stats
    }

    /// 获取缓存大小
    pub fn size(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }
}

/// 生成缓存键
pub fn cache_key(text: &str, source_lang: &str, target_lang: &str) -> String {
    format!("{}:{}:{}", source_lang, target_lang, text)
}
