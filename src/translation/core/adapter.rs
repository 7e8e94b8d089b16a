//! 翻译后端适配器
//!
//! 在远程 API 和离线词典之间提供统一的批量翻译接口。适配器在整个会话
//! 内共享，认证失败计数器和离线状态都保存在这里：连续 `auth_failure_threshold`
//! 次 401/403 之后自动降级为离线词典，直到调用 [`TranslationAdapter::try_online_mode`]。

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use metrics::counter;

use super::dictionary::OfflineDictionary;
use super::languages::{language_name, Language};
use super::remote::{GoogleTranslateClient, RemoteTranslator};
use crate::translation::config::{constants, TranslationConfig};
use crate::translation::error::{helpers, TranslationError, TranslationResult};
use crate::translation::storage::TranslationCache;

/// 译文来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    Remote,
    OfflineDictionary,
    Unchanged,
}

/// 后端模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    Remote,
    OfflineDictionary,
}

/// 一个批次的翻译输出，`texts` 与 `origins` 与输入等长
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutput {
    pub texts: Vec<String>,
    pub origins: Vec<Origin>,
    pub backend: BackendMode,
}

impl BatchOutput {
    fn unchanged(texts: &[String], backend: BackendMode) -> Self {
        Self {
            texts: texts.to_vec(),
            origins: vec![Origin::Unchanged; texts.len()],
            backend,
        }
    }
}

/// 适配器选项
#[derive(Debug, Clone)]
pub struct AdapterOptions {
    pub default_lang: String,
    pub max_retry_attempts: usize,
    pub auth_failure_threshold: u32,
    pub start_offline: bool,
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            default_lang: constants::DEFAULT_LANGUAGE.to_string(),
            max_retry_attempts: constants::DEFAULT_MAX_RETRY_ATTEMPTS,
            auth_failure_threshold: constants::AUTH_FAILURE_THRESHOLD,
            start_offline: false,
        }
    }
}

impl From<&TranslationConfig> for AdapterOptions {
    fn from(config: &TranslationConfig) -> Self {
        Self {
            default_lang: config.default_lang.clone(),
            max_retry_attempts: config.max_retry_attempts,
            auth_failure_threshold: config.auth_failure_threshold.max(1),
            start_offline: config.start_offline,
        }
    }
}

/// 翻译后端适配器
pub struct TranslationAdapter {
    remote: Option<Arc<dyn RemoteTranslator>>,
    dictionary: OfflineDictionary,
    cache: Option<TranslationCache>,
    options: AdapterOptions,
    offline: AtomicBool,
    auth_failures: AtomicU32,
}

impl std::fmt::Debug for TranslationAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationAdapter")
            .field("remote", &self.remote.as_ref().map(|r| r.name().to_string()))
            .field("offline", &self.is_offline())
            .field("auth_failures", &self.auth_failures())
            .finish()
    }
}

impl TranslationAdapter {
    /// 创建适配器；没有远程后端或 `start_offline` 时以离线模式启动
    pub fn new(
        remote: Option<Arc<dyn RemoteTranslator>>,
        dictionary: OfflineDictionary,
        options: AdapterOptions,
    ) -> Self {
        let offline = remote.is_none() || options.start_offline;
        if offline {
            tracing::info!("翻译适配器以离线词典模式启动");
        }

        Self {
            remote,
            dictionary,
            cache: None,
            options,
            offline: AtomicBool::new(offline),
            auth_failures: AtomicU32::new(0),
        }
    }

    /// 根据配置创建适配器
    ///
    /// API 密钥缺失或为占位符时没有远程后端，适配器永久离线。
    pub fn from_config(config: &TranslationConfig) -> TranslationResult<Self> {
        let remote: Option<Arc<dyn RemoteTranslator>> = match config.usable_api_key() {
            Some(key) => {
                let client =
                    GoogleTranslateClient::new(&config.api_url, key, config.batch_timeout())?;
                Some(Arc::new(client) as Arc<dyn RemoteTranslator>)
            }
            None => {
                tracing::warn!("未配置有效的 API 密钥，仅使用离线词典");
                None
            }
        };

        let mut dictionary = OfflineDictionary::builtin();
        if let Some(path) = &config.dictionary_path {
            dictionary.load_extension(path)?;
        }

        Ok(Self::new(remote, dictionary, AdapterOptions::from(config))
            .with_cache(TranslationCache::from_config(config)))
    }

    /// 设置远程结果缓存
    pub fn with_cache(mut self, cache: Option<TranslationCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn default_lang(&self) -> &str {
        &self.options.default_lang
    }

    pub fn dictionary(&self) -> &OfflineDictionary {
        &self.dictionary
    }

    pub fn cache(&self) -> Option<&TranslationCache> {
        self.cache.as_ref()
    }

    /// 是否处于离线模式
    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }

    /// 当前连续认证失败次数
    pub fn auth_failures(&self) -> u32 {
        self.auth_failures.load(Ordering::SeqCst)
    }

    pub fn mode(&self) -> BackendMode {
        if self.is_offline() {
            BackendMode::OfflineDictionary
        } else {
            BackendMode::Remote
        }
    }

    /// 强制切换为离线模式
    pub fn enable_offline_mode(&self) {
        if !self.offline.swap(true, Ordering::SeqCst) {
            tracing::info!("已切换到离线词典模式");
        }
    }

    /// 尝试恢复在线模式，返回是否处于在线模式
    pub fn try_online_mode(&self) -> bool {
        if self.remote.is_none() {
            tracing::warn!("没有可用的远程后端，保持离线模式");
            return false;
        }

        self.auth_failures.store(0, Ordering::SeqCst);
        self.offline.store(false, Ordering::SeqCst);
        tracing::info!("已恢复在线翻译模式");
        true
    }

    /// 批量翻译，失败时回退到离线词典
    ///
    /// 输出与输入等长、同序。
    pub async fn translate_batch(
        &self,
        texts: &[String],
        target_lang: &str,
        source_lang: &str,
    ) -> Vec<String> {
        match self.try_translate_batch(texts, target_lang, source_lang).await {
            Ok(output) => output.texts,
            Err(e) => {
                helpers::log_error(&e);
                self.offline_translate_all(texts, target_lang).texts
            }
        }
    }

    /// 翻译单个文本
    pub async fn translate_text(&self, text: &str, target_lang: &str, source_lang: &str) -> String {
        let texts = [text.to_string()];
        self.translate_batch(&texts, target_lang, source_lang)
            .await
            .into_iter()
            .next()
            .unwrap_or_else(|| text.to_string())
    }

    /// 批量翻译，远程失败时返回错误（调用方决定如何回退）
    ///
    /// 空输入返回空输出；目标语言等于源语言时原样返回；离线模式下直接
    /// 使用词典。远程调用对可重试错误最多重试 `max_retry_attempts` 次，
    /// 认证失败和响应格式错误不重试。
    pub async fn try_translate_batch(
        &self,
        texts: &[String],
        target_lang: &str,
        source_lang: &str,
    ) -> TranslationResult<BatchOutput> {
        if texts.is_empty() {
            return Ok(BatchOutput::unchanged(texts, self.mode()));
        }

        if target_lang == source_lang {
            return Ok(BatchOutput::unchanged(texts, self.mode()));
        }

        let remote = match (&self.remote, self.is_offline()) {
            (Some(remote), false) => remote,
            _ => return Ok(self.offline_translate_all(texts, target_lang)),
        };

        let mut output = BatchOutput::unchanged(texts, BackendMode::Remote);

        // 过滤空白文本并查询缓存
        let mut pending: Vec<usize> = Vec::new();
        for (i, text) in texts.iter().enumerate() {
            if text.trim().is_empty() {
                output.texts[i] = String::new();
                continue;
            }

            match self
                .cache
                .as_ref()
                .and_then(|c| c.get(text, source_lang, target_lang))
            {
                Some(hit) => {
                    output.texts[i] = hit;
                    output.origins[i] = Origin::Remote;
                }
                None => pending.push(i),
            }
        }

        if pending.is_empty() {
            return Ok(output);
        }

        let request: Vec<String> = pending.iter().map(|&i| texts[i].clone()).collect();
        let translated = self
            .call_remote(remote.as_ref(), &request, target_lang, source_lang)
            .await?;

        for (&i, text) in pending.iter().zip(translated) {
            if let Some(cache) = &self.cache {
                cache.insert(&texts[i], text.clone(), source_lang, target_lang);
            }
            output.texts[i] = text;
            output.origins[i] = Origin::Remote;
        }

        Ok(output)
    }

    async fn call_remote(
        &self,
        remote: &dyn RemoteTranslator,
        texts: &[String],
        target_lang: &str,
        source_lang: &str,
    ) -> TranslationResult<Vec<String>> {
        let attempts = 1 + self.options.max_retry_attempts;
        let mut attempt = 0;

        loop {
            attempt += 1;
            counter!("dom_translate_remote_calls_total").increment(1);

            match remote.translate(texts, target_lang, Some(source_lang)).await {
                Ok(translated) if translated.len() == texts.len() => {
                    self.auth_failures.store(0, Ordering::SeqCst);
                    return Ok(translated);
                }
                Ok(translated) => {
                    return Err(TranslationError::MalformedResponse(format!(
                        "期望 {} 条译文，实际 {} 条",
                        texts.len(),
                        translated.len()
                    )));
                }
                Err(e) if e.is_auth_failure() => {
                    self.record_auth_failure();
                    return Err(e);
                }
                Err(e) if e.is_retryable() && attempt < attempts => {
                    tracing::warn!("远程翻译失败，第 {} 次重试: {}", attempt, e);
                    counter!("dom_translate_remote_retries_total").increment(1);
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn record_auth_failure(&self) {
        let failures = self.auth_failures.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::warn!(
            "远程翻译认证失败 ({}/{})",
            failures,
            self.options.auth_failure_threshold
        );

        if failures >= self.options.auth_failure_threshold && !self.offline.swap(true, Ordering::SeqCst)
        {
            counter!("dom_translate_breaker_trips_total").increment(1);
            tracing::warn!("认证失败次数过多，切换到离线词典模式");
        }
    }

    /// 使用离线词典翻译全部文本，找不到的保持原文
    pub fn offline_translate_all(&self, texts: &[String], target_lang: &str) -> BatchOutput {
        let mut output = BatchOutput::unchanged(texts, BackendMode::OfflineDictionary);
        for (i, text) in texts.iter().enumerate() {
            if let Some(translated) = self.dictionary.lookup(text, target_lang) {
                output.texts[i] = translated;
                output.origins[i] = Origin::OfflineDictionary;
            }
        }
        output
    }

    /// 检测语言；离线或失败时返回默认语言
    pub async fn detect_language(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return String::new();
        }

        let remote = match (&self.remote, self.is_offline()) {
            (Some(remote), false) => remote,
            _ => return self.options.default_lang.clone(),
        };

        match remote.detect_language(text).await {
            Ok(language) => {
                self.auth_failures.store(0, Ordering::SeqCst);
                language
            }
            Err(e) => {
                if e.is_auth_failure() {
                    self.record_auth_failure();
                }
                helpers::log_error(&e);
                self.options.default_lang.clone()
            }
        }
    }

    /// 支持的语言；离线或失败时返回离线词典覆盖的目标语言
    pub async fn supported_languages(&self) -> Vec<Language> {
        let remote = match (&self.remote, self.is_offline()) {
            (Some(remote), false) => remote,
            _ => return self.dictionary_languages(),
        };

        match remote.supported_languages(&self.options.default_lang).await {
            Ok(languages) if !languages.is_empty() => {
                self.auth_failures.store(0, Ordering::SeqCst);
                languages
            }
            Ok(_) => self.dictionary_languages(),
            Err(e) => {
                if e.is_auth_failure() {
                    self.record_auth_failure();
                }
                helpers::log_error(&e);
                self.dictionary_languages()
            }
        }
    }

    fn dictionary_languages(&self) -> Vec<Language> {
        self.dictionary
            .languages()
            .into_iter()
            .map(|code| {
                let name = language_name(&code).to_string();
                Language::new(code, name)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    /// 按脚本依次返回结果的远程后端
    struct ScriptedRemote {
        calls: AtomicUsize,
        script: Vec<Result<(), TranslationError>>,
    }

    impl ScriptedRemote {
        fn new(script: Vec<Result<(), TranslationError>>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                script,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RemoteTranslator for ScriptedRemote {
        async fn translate(
            &self,
            texts: &[String],
            target_lang: &str,
            _source_lang: Option<&str>,
        ) -> TranslationResult<Vec<String>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            match self.script.get(n).cloned().unwrap_or(Ok(())) {
                Ok(()) => Ok(texts
                    .iter()
                    .map(|t| format!("[{}] {}", target_lang, t))
                    .collect()),
                Err(e) => Err(e),
            }
        }

        async fn detect_language(&self, _text: &str) -> TranslationResult<String> {
            Ok("fr".to_string())
        }

        async fn supported_languages(&self, _display: &str) -> TranslationResult<Vec<Language>> {
            Err(TranslationError::NetworkError("down".into()))
        }
    }

    fn adapter(remote: Arc<ScriptedRemote>) -> TranslationAdapter {
        TranslationAdapter::new(
            Some(remote as Arc<dyn RemoteTranslator>),
            OfflineDictionary::builtin(),
            AdapterOptions::default(),
        )
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_empty_and_same_language() {
        let remote = ScriptedRemote::new(vec![]);
        let adapter = adapter(remote.clone());

        assert!(adapter.translate_batch(&[], "en", "es").await.is_empty());
        let texts = strings(&["Hola"]);
        assert_eq!(adapter.translate_batch(&texts, "es", "es").await, texts);
        assert_eq!(remote.calls(), 0);
    }

    #[tokio::test]
    async fn test_blank_strings_are_not_sent() {
        let remote = ScriptedRemote::new(vec![]);
        let adapter = adapter(remote.clone());

        let out = adapter
            .try_translate_batch(&strings(&["Hola", "  ", "Buscar"]), "en", "es")
            .await
            .unwrap();

        assert_eq!(out.texts, vec!["[en] Hola", "", "[en] Buscar"]);
        assert_eq!(
            out.origins,
            vec![Origin::Remote, Origin::Unchanged, Origin::Remote]
        );
        assert_eq!(remote.calls(), 1);
    }

    #[tokio::test]
    async fn test_retry_once_on_network_error() {
        let remote = ScriptedRemote::new(vec![
            Err(TranslationError::NetworkError("reset".into())),
            Ok(()),
        ]);
        let adapter = adapter(remote.clone());

        let out = adapter.translate_batch(&strings(&["Precio"]), "en", "es").await;
        assert_eq!(out, vec!["[en] Precio"]);
        assert_eq!(remote.calls(), 2);
    }

    #[tokio::test]
    async fn test_malformed_is_not_retried_and_falls_back() {
        let remote = ScriptedRemote::new(vec![Err(TranslationError::MalformedResponse(
            "html".into(),
        ))]);
        let adapter = adapter(remote.clone());

        let out = adapter
            .translate_batch(&strings(&["Catálogo", "xyz123"]), "en", "es")
            .await;
        assert_eq!(out, vec!["Catalog", "xyz123"]);
        assert_eq!(remote.calls(), 1);
        assert!(!adapter.is_offline());
    }

    #[tokio::test]
    async fn test_success_resets_auth_counter() {
        let remote = ScriptedRemote::new(vec![
            Err(TranslationError::AuthFailure(401)),
            Err(TranslationError::AuthFailure(403)),
            Ok(()),
            Err(TranslationError::AuthFailure(401)),
        ]);
        let adapter = adapter(remote.clone());
        let texts = strings(&["Ayuda"]);

        adapter.translate_batch(&texts, "en", "es").await;
        adapter.translate_batch(&texts, "en", "es").await;
        assert_eq!(adapter.auth_failures(), 2);

        adapter.translate_batch(&texts, "en", "es").await;
        assert_eq!(adapter.auth_failures(), 0);

        adapter.translate_batch(&texts, "en", "es").await;
        assert_eq!(adapter.auth_failures(), 1);
        assert!(!adapter.is_offline());
    }

    #[tokio::test]
    async fn test_cache_avoids_second_request() {
        let remote = ScriptedRemote::new(vec![]);
        let adapter = adapter(remote.clone()).with_cache(Some(TranslationCache::default()));
        let texts = strings(&["Hola", "Buscar"]);

        adapter.translate_batch(&texts, "en", "es").await;
        let again = adapter.translate_batch(&texts, "en", "es").await;

        assert_eq!(again, vec!["[en] Hola", "[en] Buscar"]);
        assert_eq!(remote.calls(), 1);
    }

    #[tokio::test]
    async fn test_offline_helpers() {
        let adapter = TranslationAdapter::new(None, OfflineDictionary::builtin(), AdapterOptions::default());

        assert!(adapter.is_offline());
        assert!(!adapter.try_online_mode(), "No remote means permanently offline");
        assert_eq!(adapter.detect_language("Bonjour").await, "es");
        let codes: Vec<String> = adapter
            .supported_languages()
            .await
            .into_iter()
            .map(|l| l.code)
            .collect();
        assert_eq!(codes, vec!["de", "en", "fr", "it", "pt"], "Dictionary targets only");
        assert_eq!(adapter.translate_text("Favoritos", "it", "es").await, "Preferiti");
    }

    #[tokio::test]
    async fn test_online_detect_and_language_fallback() {
        let remote = ScriptedRemote::new(vec![]);
        let adapter = adapter(remote);

        assert_eq!(adapter.detect_language("Bonjour").await, "fr");
        let languages = adapter.supported_languages().await;
        assert_eq!(languages.len(), 5);
        assert!(!languages.iter().any(|l| l.code == "es"));
        assert!(languages.contains(&Language::new("fr", "Français")));

        adapter.enable_offline_mode();
        assert_eq!(adapter.detect_language("Bonjour").await, "es");
        assert!(adapter.try_online_mode());
        assert!(!adapter.is_offline());
    }
}
