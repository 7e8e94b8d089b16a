//! 简化的配置管理器
//!
//! 提供统一的配置接口，支持文件配置、环境变量和默认值

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants;
use crate::translation::error::{TranslationError, TranslationResult};

/// 翻译配置
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TranslationConfig {
    // 基础配置
    pub enabled: bool,
    pub default_lang: String,
    pub source_lang: String,
    pub api_url: String,
    pub api_key: Option<String>,
    pub start_offline: bool,

    // 批次配置
    pub batch_size: usize,
    pub batch_timeout_secs: u64,
    pub element_timeout_secs: u64,
    pub flush_interval: usize,
    pub batch_delay_ms: u64,

    // 重试与断路器
    pub max_retry_attempts: usize,
    pub auth_failure_threshold: u32,

    // 文档
    pub excluded_class: String,

    // 缓存配置
    pub cache_enabled: bool,
    pub cache_ttl_secs: u64,
    pub local_cache_size: usize,

    // 外部文件
    pub dictionary_path: Option<PathBuf>,
    pub state_path: Option<PathBuf>,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_lang: constants::DEFAULT_LANGUAGE.to_string(),
            source_lang: constants::DEFAULT_LANGUAGE.to_string(),
            api_url: constants::DEFAULT_API_URL.to_string(),
            api_key: None,
            start_offline: false,

            batch_size: constants::DEFAULT_BATCH_SIZE,
            batch_timeout_secs: constants::DEFAULT_BATCH_TIMEOUT.as_secs(),
            element_timeout_secs: constants::DEFAULT_ELEMENT_TIMEOUT.as_secs(),
            flush_interval: constants::FLUSH_INTERVAL,
            batch_delay_ms: constants::BATCH_DELAY_MS,

            max_retry_attempts: constants::DEFAULT_MAX_RETRY_ATTEMPTS,
            auth_failure_threshold: constants::AUTH_FAILURE_THRESHOLD,

            excluded_class: constants::EXCLUDED_CLASS.to_string(),

            cache_enabled: true,
            cache_ttl_secs: constants::DEFAULT_CACHE_TTL.as_secs(),
            local_cache_size: constants::DEFAULT_LOCAL_CACHE_SIZE,

            dictionary_path: None,
            state_path: None,
        }
    }
}

impl TranslationConfig {
    /// 验证配置
    pub fn validate(&self) -> TranslationResult<()> {
        if self.batch_size == 0 {
            return Err(TranslationError::ConfigError("批次大小不能为0".to_string()));
        }

        if self.batch_timeout_secs == 0 || self.element_timeout_secs == 0 {
            return Err(TranslationError::ConfigError("超时时间必须大于0".to_string()));
        }

        if self.flush_interval == 0 {
            return Err(TranslationError::ConfigError("刷新间隔不能为0".to_string()));
        }

        if self.auth_failure_threshold == 0 {
            return Err(TranslationError::ConfigError("认证失败阈值不能为0".to_string()));
        }

        if self.default_lang.trim().is_empty() || self.source_lang.trim().is_empty() {
            return Err(TranslationError::ConfigError("语言代码不能为空".to_string()));
        }

        if url::Url::parse(&self.api_url).is_err() {
            return Err(TranslationError::ConfigError(format!(
                "无效的 API URL: {}",
                self.api_url
            )));
        }

        if self.cache_enabled && self.local_cache_size == 0 {
            return Err(TranslationError::ConfigError("启用缓存时缓存大小不能为0".to_string()));
        }

        Ok(())
    }

    /// 可用的 API 密钥（缺失或占位符视为无密钥）
    pub fn usable_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && *key != constants::PLACEHOLDER_API_KEY)
    }

    /// 应用环境变量覆盖，只覆盖显式设置的变量
    pub fn apply_env_overrides(&mut self) {
        use crate::env::{cache, storage, translation, EnvResult, EnvVar};

        fn apply<T>(name: &str, value: Option<EnvResult<T>>, target: &mut T) {
            match value {
                Some(Ok(v)) => *target = v,
                Some(Err(e)) => tracing::warn!("忽略无效的环境变量 {}: {}", name, e),
                None => {}
            }
        }

        apply(
            translation::Enabled::NAME,
            translation::Enabled::get_set(),
            &mut self.enabled,
        );
        apply(
            translation::DefaultLang::NAME,
            translation::DefaultLang::get_set(),
            &mut self.default_lang,
        );
        apply(
            translation::SourceLang::NAME,
            translation::SourceLang::get_set(),
            &mut self.source_lang,
        );
        apply(
            translation::Offline::NAME,
            translation::Offline::get_set(),
            &mut self.start_offline,
        );
        apply(
            translation::BatchSize::NAME,
            translation::BatchSize::get_set(),
            &mut self.batch_size,
        );

        if let Some(url) = translation::ApiUrl::get_set() {
            match url {
                Ok(url) => {
                    self.api_url = url;
                    tracing::info!("环境变量覆盖 API URL: {}", self.api_url);
                }
                Err(e) => tracing::warn!("忽略无效的环境变量 {}: {}", translation::ApiUrl::NAME, e),
            }
        }

        if let Some(key) = translation::ApiKey::get_set() {
            match key {
                Ok(key) => self.api_key = Some(key),
                Err(e) => tracing::warn!("忽略无效的环境变量 {}: {}", translation::ApiKey::NAME, e),
            }
        }

        if let Some(timeout) = translation::BatchTimeout::get_set() {
            match timeout {
                Ok(timeout) => self.batch_timeout_secs = timeout.as_secs(),
                Err(e) => {
                    tracing::warn!("忽略无效的环境变量 {}: {}", translation::BatchTimeout::NAME, e)
                }
            }
        }

        // 缓存相关环境变量
        apply(
            cache::Enabled::NAME,
            cache::Enabled::get_set(),
            &mut self.cache_enabled,
        );
        apply(
            cache::LocalCacheSize::NAME,
            cache::LocalCacheSize::get_set(),
            &mut self.local_cache_size,
        );

        if let Some(path) = storage::StatePath::get_set() {
            match path {
                Ok(path) => self.state_path = Some(PathBuf::from(path)),
                Err(e) => tracing::warn!("忽略无效的环境变量 {}: {}", storage::StatePath::NAME, e),
            }
        }
    }

    /// 转换为Duration类型
    pub fn batch_timeout(&self) -> Duration {
        Duration::from_secs(self.batch_timeout_secs)
    }

    pub fn element_timeout(&self) -> Duration {
        Duration::from_secs(self.element_timeout_secs)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// 简化的配置管理器
#[derive(Debug)]
pub struct ConfigManager {
    config: TranslationConfig,
}

impl ConfigManager {
    /// 创建新的配置管理器（搜索默认路径）
    pub fn new() -> TranslationResult<Self> {
        Self::load_dotenv();
        let config = Self::load_config()?;
        Self::finish(config)
    }

    /// 从指定配置文件创建
    pub fn from_path<P: AsRef<Path>>(path: P) -> TranslationResult<Self> {
        Self::load_dotenv();
        let expanded = shellexpand::tilde(&path.as_ref().to_string_lossy()).into_owned();
        tracing::info!("加载配置文件: {}", expanded);
        let config = Self::load_from_file(&expanded)?;
        Self::finish(config)
    }

    fn finish(mut config: TranslationConfig) -> TranslationResult<Self> {
        config.apply_env_overrides();
        config.validate()?;
        Ok(Self { config })
    }

    /// 获取配置
    pub fn get_config(&self) -> &TranslationConfig {
        &self.config
    }

    /// 取出配置
    pub fn into_config(self) -> TranslationConfig {
        self.config
    }

    /// 从搜索路径加载配置
    fn load_config() -> TranslationResult<TranslationConfig> {
        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            if Path::new(expanded_path.as_ref()).exists() {
                tracing::info!("加载配置文件: {}", expanded_path);
                return Self::load_from_file(&expanded_path);
            }
        }

        tracing::info!("未找到配置文件，使用默认配置");
        Ok(TranslationConfig::default())
    }

    /// 从指定文件加载配置
    fn load_from_file(path: &str) -> TranslationResult<TranslationConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TranslationError::ConfigError(format!("读取配置文件失败: {}", e)))?;

        if path.ends_with(".json") {
            serde_json::from_str(&content)
                .map_err(|e| TranslationError::ConfigError(format!("解析JSON配置失败: {}", e)))
        } else {
            toml::from_str(&content)
                .map_err(|e| TranslationError::ConfigError(format!("解析TOML配置失败: {}", e)))
        }
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        let env_files = [".env.local", ".env"];

        for env_file in &env_files {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::info!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config<P: AsRef<Path>>(path: P) -> TranslationResult<()> {
        let config = TranslationConfig {
            api_key: Some(constants::PLACEHOLDER_API_KEY.to_string()),
            ..TranslationConfig::default()
        };
        let content = toml::to_string_pretty(&config)
            .map_err(|e| TranslationError::ConfigError(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TranslationError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}
