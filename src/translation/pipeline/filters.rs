//! 文本过滤器模块
//!
//! 判断元素文本是否值得翻译：去除首尾空白后，必须包含至少两个连续的
//! Unicode 字母。

use std::sync::OnceLock;

use regex::Regex;

use crate::translation::config::constants;

const LETTER_RUN_PATTERN: &str = r"\p{L}{2,}";

static LETTER_RUN: OnceLock<Option<Regex>> = OnceLock::new();

/// 文本过滤器
#[derive(Debug, Default, Clone, Copy)]
pub struct TextFilter;

impl TextFilter {
    /// 创建新的文本过滤器
    pub fn new() -> Self {
        Self
    }

    /// 判断文本是否需要翻译
    pub fn should_translate(&self, text: &str) -> bool {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return false;
        }

        has_letter_run(trimmed)
    }

    /// 文本是否足够长，可以单独翻译（按字符计）
    pub fn meets_min_length(&self, text: &str) -> bool {
        text.trim().chars().count() >= constants::MIN_TEXT_LENGTH
    }
}

/// 是否包含两个以上连续字母
pub fn has_letter_run(text: &str) -> bool {
    match LETTER_RUN.get_or_init(|| Regex::new(LETTER_RUN_PATTERN).ok()) {
        Some(re) => re.is_match(text),
        None => {
            let mut run = 0;
            for c in text.chars() {
                run = if c.is_alphabetic() { run + 1 } else { 0 };
                if run >= 2 {
                    return true;
                }
            }
            false
        }
    }
}
