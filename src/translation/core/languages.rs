//! 支持的语言列表

use serde::{Deserialize, Serialize};

/// 语言信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub code: String,
    pub name: String,
}

impl Language {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

/// 内置支持的语言（代码，本地名称）
pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    ("es", "Español"),
    ("en", "English"),
    ("fr", "Français"),
    ("de", "Deutsch"),
    ("it", "Italiano"),
    ("pt", "Português"),
];

/// 是否为内置支持的语言
pub fn is_supported(code: &str) -> bool {
    SUPPORTED_LANGUAGES.iter().any(|(c, _)| *c == code)
}

/// 语言的本地名称，未知代码原样返回
pub fn language_name(code: &str) -> &str {
    SUPPORTED_LANGUAGES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
        .unwrap_or(code)
}

/// 内置语言列表
pub fn builtin_languages() -> Vec<Language> {
    SUPPORTED_LANGUAGES
        .iter()
        .map(|(code, name)| Language::new(*code, *name))
        .collect()
}
