// 集成测试公共模块
//
// 提供模拟远程后端、测试页面生成和文档检查工具

use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use markup5ever_rcdom::{Handle, RcDom};

use dom_translate::parsers::html::{get_node_attr, get_node_name, html_to_dom, text_content, walk_elements};
use dom_translate::translation::core::{
    AdapterOptions, Language, OfflineDictionary, RemoteTranslator,
};
use dom_translate::translation::{
    LanguageStore, MemoryLanguageStore, PageTranslator, TranslationAdapter, TranslationConfig,
    TranslationError, TranslationResult,
};

/// 模拟远程后端的行为
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// 返回 `[目标语言] 原文`
    Echo,
    /// 始终返回指定状态码的认证失败
    AuthFailure(u16),
    /// 等待指定时间后按 `Echo` 返回
    Slow(Duration),
    /// 返回比请求少一条的译文
    Malformed,
    /// 前 n 次返回网络错误，之后按 `Echo` 返回
    FailTimes(usize),
}

/// 记录请求的模拟远程后端
pub struct MockRemote {
    behavior: MockBehavior,
    calls: AtomicUsize,
    requests: Mutex<Vec<Vec<String>>>,
}

impl MockRemote {
    pub fn new(behavior: MockBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// 每次调用收到的文本
    pub fn requests(&self) -> Vec<Vec<String>> {
        self.requests.lock().unwrap().clone()
    }

    fn echo(texts: &[String], target_lang: &str) -> Vec<String> {
        texts
            .iter()
            .map(|t| format!("[{}] {}", target_lang, t))
            .collect()
    }
}

#[async_trait]
impl RemoteTranslator for MockRemote {
    async fn translate(
        &self,
        texts: &[String],
        target_lang: &str,
        _source_lang: Option<&str>,
    ) -> TranslationResult<Vec<String>> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(texts.to_vec());

        match &self.behavior {
            MockBehavior::Echo => Ok(Self::echo(texts, target_lang)),
            MockBehavior::AuthFailure(status) => Err(TranslationError::AuthFailure(*status)),
            MockBehavior::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(Self::echo(texts, target_lang))
            }
            MockBehavior::Malformed => {
                let mut out = Self::echo(texts, target_lang);
                out.pop();
                Ok(out)
            }
            MockBehavior::FailTimes(times) if n < *times => {
                Err(TranslationError::NetworkError("connection reset".to_string()))
            }
            MockBehavior::FailTimes(_) => Ok(Self::echo(texts, target_lang)),
        }
    }

    async fn detect_language(&self, _text: &str) -> TranslationResult<String> {
        Ok("es".to_string())
    }

    async fn supported_languages(&self, _display_lang: &str) -> TranslationResult<Vec<Language>> {
        Ok(vec![Language {
            code: "en".to_string(),
            name: "English".to_string(),
        }])
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// 测试用配置：无批次间隔
pub fn test_config() -> TranslationConfig {
    TranslationConfig {
        batch_delay_ms: 0,
        ..TranslationConfig::default()
    }
}

/// 使用模拟后端创建适配器
pub fn mock_adapter(remote: &Arc<MockRemote>, config: &TranslationConfig) -> Arc<TranslationAdapter> {
    Arc::new(TranslationAdapter::new(
        Some(Arc::clone(remote) as Arc<dyn RemoteTranslator>),
        OfflineDictionary::builtin(),
        AdapterOptions::from(config),
    ))
}

/// 创建编排器，返回编排器、文档和语言存储
pub fn page_translator(
    html: &str,
    adapter: Arc<TranslationAdapter>,
    config: TranslationConfig,
) -> (PageTranslator, RcDom, MemoryLanguageStore) {
    let dom = html_to_dom(html.as_bytes(), "utf-8");
    let store = MemoryLanguageStore::new();
    let translator = PageTranslator::new(
        dom.document.clone(),
        adapter,
        Rc::new(store.clone()) as Rc<dyn LanguageStore>,
        config,
    );
    (translator, dom, store)
}

/// HTML 测试辅助工具
pub struct HtmlTestHelper;

impl HtmlTestHelper {
    /// 包含 n 个段落的页面
    pub fn numbered_page(n: usize) -> String {
        let body: String = (0..n)
            .map(|i| format!("<p>Elemento número {i}</p>"))
            .collect();
        format!("<html><head><title>Prueba</title></head><body>{body}</body></html>")
    }

    /// 带有各种排除规则的市场页面
    pub fn marketplace_page() -> String {
        r#"<html><head><title>Mercado</title><script>var t = "Hola";</script></head>
<body>
<nav><a href="/">Catálogo</a><a href="/fav">Favoritos</a></nav>
<div class="language-selector"><button>Español</button><button>English</button></div>
<h1>Bienvenido</h1>
<p data-no-translate>Marca Registrada</p>
<ul><li>Precio</li><li>Fecha</li><li>2024</li></ul>
<button data-self-translate>Compartir</button>
<footer><span>Todos los derechos reservados</span></footer>
</body></html>"#
            .to_string()
    }

    /// 按文档顺序返回指定标签的文本
    pub fn texts_of(document: &Handle, tag: &str) -> Vec<String> {
        let mut texts = Vec::new();
        walk_elements(document, &mut |node| {
            if get_node_name(node) == Some(tag) {
                texts.push(text_content(node));
            }
        });
        texts
    }

    /// 返回所有带有指定属性的元素的属性值
    pub fn attr_values(document: &Handle, attr: &str) -> Vec<String> {
        let mut values = Vec::new();
        walk_elements(document, &mut |node| {
            if let Some(value) = get_node_attr(node, attr) {
                values.push(value);
            }
        });
        values
    }
}
