//! # dom-translate
//!
//! 就地翻译 HTML 文档的可见文本：分批请求远程翻译 API，失败时回退到
//! 离线词典，并逐步改写文档树。
//!
//! ## 模块组织
//!
//! - `core` - 文档级处理入口（解析、翻译、序列化）
//! - `env` - 类型安全的环境变量
//! - `parsers` - HTML 解析、DOM 操作与序列化
//! - `translation` - 翻译管道（适配器、收集器、编排器、存储、配置）

pub mod core;
pub mod env;
pub mod parsers;
pub mod translation;

// Re-export commonly used items for convenience
pub use core::*;
pub use parsers::*;
