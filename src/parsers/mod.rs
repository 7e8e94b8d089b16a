//! # 解析器模块
//!
//! HTML 文档的解析、DOM 操作与序列化。翻译流程只通过这里的辅助函数
//! 读取和改写文档树。

pub mod html;

pub use html::{html_to_dom, serialize_document};
