use std::fs;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use encoding_rs::Encoding;
use markup5ever_rcdom::{Handle, RcDom};

use crate::parsers::html::{
    get_node_attr, get_node_name, html_to_dom, serialize_document, text_content, walk_elements,
};
use crate::translation::core::languages;
use crate::translation::{
    ElementReport, ElementTranslator, LanguageStore, PageTranslator, RunReport,
    TranslationAdapter, TranslationConfig, TranslationError, TranslationResult,
};

/// Options controlling how a single document is processed
#[derive(Debug, Default, Clone)]
pub struct DocumentOptions {
    /// Target language; `None` applies the persisted selection
    pub language: Option<String>,
    /// Input charset label; detected from `<meta>` when absent
    pub encoding: Option<String>,
}

/// Result of processing one document
#[derive(Debug, Clone)]
pub struct DocumentReport {
    /// Language the document is displayed in after processing
    pub language: String,
    /// Batch run report, `None` when the language did not change
    pub run: Option<RunReport>,
    /// Per-element translation statistics
    pub elements: ElementReport,
    /// Charset the document was decoded and re-encoded with
    pub encoding: String,
    /// Document title after translation
    pub title: Option<String>,
}

const DEFAULT_ENCODING: &str = "utf-8";

/// Translates an HTML document held in memory
///
/// Must be awaited inside a `tokio::task::LocalSet`: the document tree is
/// `Rc`-based and runs are spawned with `spawn_local`.
///
/// # Examples
///
/// ```no_run
/// use std::rc::Rc;
/// use dom_translate::core::{translate_document_from_data, DocumentOptions};
/// use dom_translate::translation::{MemoryLanguageStore, TranslationConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let options = DocumentOptions {
///     language: Some("en".to_string()),
///     ..DocumentOptions::default()
/// };
/// let local = tokio::task::LocalSet::new();
/// let (html, report) = local
///     .run_until(translate_document_from_data(
///         b"<p>Buscar</p>".to_vec(),
///         &options,
///         TranslationConfig::default(),
///         Rc::new(MemoryLanguageStore::new()),
///     ))
///     .await?;
/// # Ok(())
/// # }
/// ```
pub async fn translate_document_from_data(
    input_data: Vec<u8>,
    options: &DocumentOptions,
    config: TranslationConfig,
    store: Rc<dyn LanguageStore>,
) -> TranslationResult<(Vec<u8>, DocumentReport)> {
    if let Some(language) = &options.language {
        if !languages::is_supported(language) {
            return Err(TranslationError::InvalidInput(format!(
                "不支持的语言: {language}"
            )));
        }
    }

    let (dom, encoding) = parse_document(&input_data, options.encoding.as_deref())?;

    let adapter = Arc::new(TranslationAdapter::from_config(&config)?);
    let elements = ElementTranslator::new(dom.document.clone(), Arc::clone(&adapter), &config);
    let mut translator = PageTranslator::new(dom.document.clone(), adapter, store, config);

    let listener = tokio::task::spawn_local(elements.listen(translator.subscribe()));

    let handle = match &options.language {
        Some(language) => translator.change_language(language),
        None => translator.initialize(),
    };
    let run = match handle {
        Some(handle) => handle.wait().await,
        None => None,
    };
    let language = translator
        .current_language()
        .unwrap_or(translator.default_language())
        .to_string();

    // 关闭事件通道，让逐元素翻译器处理完剩余事件后退出
    drop(translator);
    let elements = listener
        .await
        .map_err(|e| TranslationError::InternalError(format!("逐元素翻译任务失败: {e}")))?;

    let output = serialize_document(&dom, &encoding)?;
    Ok((
        output,
        DocumentReport {
            language,
            run,
            elements,
            encoding,
            title: get_title(&dom.document),
        },
    ))
}

/// Translates an HTML file on disk
pub async fn translate_document(
    path: &Path,
    options: &DocumentOptions,
    config: TranslationConfig,
    store: Rc<dyn LanguageStore>,
) -> TranslationResult<(Vec<u8>, DocumentReport)> {
    if !path.exists() {
        return Err(TranslationError::InvalidInput(format!(
            "File not found: {}",
            path.display()
        )));
    }

    let input_data = fs::read(path)?;
    translate_document_from_data(input_data, options, config, store).await
}

/// Parses the input, re-parsing once when `<meta>` declares another charset
fn parse_document(data: &[u8], encoding: Option<&str>) -> TranslationResult<(RcDom, String)> {
    if let Some(label) = encoding {
        let Some(encoding) = Encoding::for_label_no_replacement(label.as_bytes()) else {
            return Err(TranslationError::InvalidInput(format!(
                "Unknown encoding: {label}"
            )));
        };
        let name = encoding.name().to_lowercase();
        return Ok((html_to_dom(data, &name), name));
    }

    let dom = html_to_dom(data, DEFAULT_ENCODING);
    if let Some(charset) = get_charset(&dom.document) {
        if let Some(encoding) = Encoding::for_label_no_replacement(charset.as_bytes()) {
            let name = encoding.name().to_lowercase();
            if name != DEFAULT_ENCODING {
                tracing::debug!("文档声明的字符集为 {}，重新解析", name);
                return Ok((html_to_dom(data, &name), name));
            }
        }
    }

    Ok((dom, DEFAULT_ENCODING.to_string()))
}

/// Reads the charset declared by `<meta charset>` or `<meta http-equiv>`
pub fn get_charset(document: &Handle) -> Option<String> {
    let mut charset = None;

    walk_elements(document, &mut |node| {
        if charset.is_some() || get_node_name(node) != Some("meta") {
            return;
        }

        if let Some(value) = get_node_attr(node, "charset") {
            charset = Some(value.trim().to_string());
        } else if get_node_attr(node, "http-equiv")
            .is_some_and(|v| v.eq_ignore_ascii_case("content-type"))
        {
            if let Some(content) = get_node_attr(node, "content") {
                let (_, value) = parse_content_type(&content);
                if !value.is_empty() {
                    charset = Some(value);
                }
            }
        }
    });

    charset
}

/// Parses a Content-Type value into media type and charset
pub fn parse_content_type(content_type: &str) -> (String, String) {
    let mut parts = content_type.split(';');
    let media_type = parts.next().unwrap_or("").trim().to_lowercase();
    let mut charset = String::new();

    for part in parts {
        let part = part.trim();
        if let Some(value) = part
            .get(..8)
            .filter(|prefix| prefix.eq_ignore_ascii_case("charset="))
            .and_then(|_| part.get(8..))
        {
            charset = value.trim_matches('"').to_string();
        }
    }

    (media_type, charset)
}

/// Reads the text of the first `<title>` element
pub fn get_title(document: &Handle) -> Option<String> {
    let mut title = None;

    walk_elements(document, &mut |node| {
        if title.is_none() && get_node_name(node) == Some("title") {
            title = Some(text_content(node).trim().to_string());
        }
    });

    title
}

/// Formats output path with title, language and timestamp substitution
pub fn format_output_path(path: &str, document_title: Option<&str>, language: &str) -> String {
    let datetime: &str = &Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let title = document_title.unwrap_or("");

    path.replace("%timestamp%", &datetime.replace(':', "_"))
        .replace(
            "%title%",
            title
                .replace(['/', '\\'], "_")
                .replace('<', "[")
                .replace('>', "]")
                .replace(':', " - ")
                .replace('\"', "")
                .replace('|', "-")
                .replace('?', "")
                .trim_start_matches('.'),
        )
        .replace("%lang%", language)
}
