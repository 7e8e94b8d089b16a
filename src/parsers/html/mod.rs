//! HTML解析和处理模块
//!
//! - `dom`: 基础DOM操作（属性、文本内容、遍历）
//! - `serializer`: 序列化功能

pub mod dom;
pub mod serializer;

pub use dom::{
    find_elements_with_attr, get_node_attr, get_node_name, get_parent_node, has_class,
    has_node_attr, html_to_dom, set_node_attr, set_text_content, text_content, walk_elements,
};
pub use serializer::serialize_document;
