//! 翻译配置管理模块
//!
//! 提供简化的配置管理，支持环境变量、配置文件和默认值

pub mod manager;

// 重新导出主要类型
pub use manager::{ConfigManager, TranslationConfig};

/// 配置常量
pub mod constants {
    use std::time::Duration;

    // 批次处理相关
    pub const DEFAULT_BATCH_SIZE: usize = 30;
    pub const BATCH_DELAY_MS: u64 = 100;
    pub const FLUSH_INTERVAL: usize = 2;

    // 超时
    pub const DEFAULT_BATCH_TIMEOUT: Duration = Duration::from_secs(15);
    pub const DEFAULT_ELEMENT_TIMEOUT: Duration = Duration::from_secs(10);

    // 重试与断路器
    pub const DEFAULT_MAX_RETRY_ATTEMPTS: usize = 1;
    pub const AUTH_FAILURE_THRESHOLD: u32 = 3;

    // 语言
    pub const DEFAULT_LANGUAGE: &str = "es";

    // 默认API设置
    pub const DEFAULT_API_URL: &str = "https://translation.googleapis.com/language/translate/v2";
    pub const PLACEHOLDER_API_KEY: &str = "YOUR_API_KEY_HERE";

    // 缓存设置
    pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600); // 1小时
    pub const DEFAULT_LOCAL_CACHE_SIZE: usize = 1000;

    // 文本过滤相关
    pub const MIN_TEXT_LENGTH: usize = 2;
    pub const MIN_PARTIAL_MATCH_CHARS: usize = 3;

    // DOM 属性与类名
    pub const ORIGINAL_TEXT_ATTR: &str = "data-original-text";
    pub const TRANSLATE_INDEX_ATTR: &str = "data-translate-index";
    pub const NO_TRANSLATE_ATTR: &str = "data-no-translate";
    pub const SELF_TRANSLATE_ATTR: &str = "data-self-translate";
    pub const EXCLUDED_CLASS: &str = "language-selector";

    // 候选元素
    pub const CANDIDATE_TAGS: &[&str] = &[
        "h1", "h2", "h3", "h4", "h5", "h6", "p", "a", "button", "span", "label", "li", "td", "th",
    ];

    // 跳过的元素（不进入其子树）
    pub const SKIP_ELEMENTS: &[&str] = &[
        "script", "style", "code", "pre", "noscript", "svg", "math", "template", "textarea",
    ];

    // 持久化键
    pub const LANGUAGE_STORAGE_KEY: &str = "selectedLanguage";

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "dom-translate.toml",
        ".dom-translate.toml",
        "dom-translate.json",
        "~/.config/dom-translate/config.toml",
        "/etc/dom-translate/config.toml",
    ];
}

/// 加载配置，失败时回退到默认值
pub fn load_translation_config() -> TranslationConfig {
    match ConfigManager::new() {
        Ok(manager) => manager.into_config(),
        Err(e) => {
            tracing::warn!("配置加载失败，使用默认配置: {}", e);
            TranslationConfig::default()
        }
    }
}
