//! 远程翻译 API
//!
//! `RemoteTranslator` 是远程后端的抽象；`GoogleTranslateClient` 实现
//! Google Cloud Translation v2 REST 协议：
//!
//! - `POST <endpoint>?key=` `{ q, target, format, source? }`
//! - `POST <endpoint>/detect?key=` `{ q }`
//! - `GET <endpoint>/languages?key=&target=`

use std::sync::OnceLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use regex::{Captures, Regex};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use super::languages::Language;
use crate::translation::error::{helpers, TranslationError, TranslationResult};

/// 远程翻译后端
#[async_trait]
pub trait RemoteTranslator: Send + Sync {
    /// 翻译一组文本，返回的译文数量和顺序与输入一致
    async fn translate(
        &self,
        texts: &[String],
        target_lang: &str,
        source_lang: Option<&str>,
    ) -> TranslationResult<Vec<String>>;

    /// 检测文本语言
    async fn detect_language(&self, text: &str) -> TranslationResult<String>;

    /// 支持的语言，名称使用 `display_lang` 表示
    async fn supported_languages(&self, display_lang: &str) -> TranslationResult<Vec<Language>>;

    fn name(&self) -> &str {
        "remote"
    }
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a [String],
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct DetectRequest<'a> {
    q: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct TranslationsData {
    translations: Vec<TranslatedItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslatedItem {
    translated_text: String,
}

#[derive(Debug, Deserialize)]
struct DetectionsData {
    detections: Vec<Vec<Detection>>,
}

#[derive(Debug, Deserialize)]
struct Detection {
    language: String,
}

#[derive(Debug, Deserialize)]
struct LanguagesData {
    languages: Vec<LanguageItem>,
}

#[derive(Debug, Deserialize)]
struct LanguageItem {
    language: String,
    name: Option<String>,
}

/// Google Translate v2 客户端
#[derive(Debug, Clone)]
pub struct GoogleTranslateClient {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl GoogleTranslateClient {
    /// 创建客户端
    pub fn new(endpoint: &str, api_key: &str, timeout: Duration) -> TranslationResult<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            TranslationError::ConfigError(format!("无效的 API URL {}: {}", endpoint, e))
        })?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TranslationError::ConfigError(format!("创建 HTTP 客户端失败: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.to_string(),
        })
    }

    fn url(&self, suffix: Option<&str>, extra: &[(&str, &str)]) -> Url {
        let mut url = self.endpoint.clone();
        if let Some(suffix) = suffix {
            let path = format!("{}/{}", url.path().trim_end_matches('/'), suffix);
            url.set_path(&path);
        }
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("key", &self.api_key);
            for (k, v) in extra {
                query.append_pair(k, v);
            }
        }
        url
    }

    async fn read_body(response: reqwest::Response) -> TranslationResult<String> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(helpers::status_error(status.as_u16(), body));
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl RemoteTranslator for GoogleTranslateClient {
    async fn translate(
        &self,
        texts: &[String],
        target_lang: &str,
        source_lang: Option<&str>,
    ) -> TranslationResult<Vec<String>> {
        let request = TranslateRequest {
            q: texts,
            target: target_lang,
            format: "html",
            source: source_lang,
        };

        let start = Instant::now();
        let response = self
            .client
            .post(self.url(None, &[]))
            .json(&request)
            .send()
            .await?;
        let body = Self::read_body(response).await?;

        let translated = parse_translate_response(&body, texts.len())?;
        tracing::debug!(
            "远程翻译 {} 条文本耗时 {}ms ({:?} -> {})",
            texts.len(),
            start.elapsed().as_millis(),
            source_lang,
            target_lang
        );
        Ok(translated)
    }

    async fn detect_language(&self, text: &str) -> TranslationResult<String> {
        let response = self
            .client
            .post(self.url(Some("detect"), &[]))
            .json(&DetectRequest { q: text })
            .send()
            .await?;
        let body = Self::read_body(response).await?;
        parse_detect_response(&body)
    }

    async fn supported_languages(&self, display_lang: &str) -> TranslationResult<Vec<Language>> {
        let response = self
            .client
            .get(self.url(Some("languages"), &[("target", display_lang)]))
            .send()
            .await?;
        let body = Self::read_body(response).await?;
        parse_languages_response(&body)
    }

    fn name(&self) -> &str {
        "google"
    }
}

fn malformed(e: impl std::fmt::Display) -> TranslationError {
    TranslationError::MalformedResponse(e.to_string())
}

/// 解析翻译响应，数量不符视为格式错误
pub fn parse_translate_response(body: &str, expected: usize) -> TranslationResult<Vec<String>> {
    let parsed: ApiResponse<TranslationsData> = serde_json::from_str(body).map_err(malformed)?;
    let translations = parsed.data.translations;

    if translations.len() != expected {
        return Err(TranslationError::MalformedResponse(format!(
            "期望 {} 条译文，实际 {} 条",
            expected,
            translations.len()
        )));
    }

    Ok(translations
        .into_iter()
        .map(|item| decode_entities(&item.translated_text))
        .collect())
}

/// 解析语言检测响应
pub fn parse_detect_response(body: &str) -> TranslationResult<String> {
    let parsed: ApiResponse<DetectionsData> = serde_json::from_str(body).map_err(malformed)?;
    parsed
        .data
        .detections
        .into_iter()
        .next()
        .and_then(|group| group.into_iter().next())
        .map(|d| d.language)
        .ok_or_else(|| TranslationError::MalformedResponse("检测结果为空".to_string()))
}

/// 解析语言列表响应
pub fn parse_languages_response(body: &str) -> TranslationResult<Vec<Language>> {
    let parsed: ApiResponse<LanguagesData> = serde_json::from_str(body).map_err(malformed)?;
    Ok(parsed
        .data
        .languages
        .into_iter()
        .map(|item| {
            let name = item.name.unwrap_or_else(|| item.language.clone());
            Language::new(item.language, name)
        })
        .collect())
}

const ENTITY_PATTERN: &str = r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]+);";

static ENTITY: OnceLock<Option<Regex>> = OnceLock::new();

/// 解码 `format=html` 响应中的字符引用（数字形式和常见命名实体）
fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let Some(re) = ENTITY.get_or_init(|| Regex::new(ENTITY_PATTERN).ok()) else {
        return text.to_string();
    };

    re.replace_all(text, |caps: &Captures| {
        decode_reference(&caps[1]).unwrap_or_else(|| caps[0].to_string())
    })
    .into_owned()
}

fn decode_reference(reference: &str) -> Option<String> {
    let code = if let Some(hex) = reference
        .strip_prefix("#x")
        .or_else(|| reference.strip_prefix("#X"))
    {
        u32::from_str_radix(hex, 16).ok()?
    } else if let Some(dec) = reference.strip_prefix('#') {
        dec.parse::<u32>().ok()?
    } else {
        let c = match reference {
            "quot" => '"',
            "apos" => '\'',
            "lt" => '<',
            "gt" => '>',
            "nbsp" => '\u{a0}',
            "amp" => '&',
            _ => return None,
        };
        return Some(c.to_string());
    };

    char::from_u32(code).map(String::from)
}
