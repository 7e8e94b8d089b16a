//! 页面文本收集器
//!
//! 扫描文档树，找出可翻译的元素并为其打上标记：
//! `data-original-text` 保存原文（只写一次），`data-translate-index`
//! 记录本轮运行中的单元序号。
//!
//! 候选元素内部如果还有会成为单元的候选元素（或带文本的排除子树），
//! 则只收集内层元素，这样回写文本时不会覆盖它们。空的图标元素等
//! 不会阻止外层元素被收集。

use std::rc::{Rc, Weak};

use markup5ever_rcdom::{Handle, Node};

use crate::parsers::html::dom::{
    get_node_attr, get_node_name, has_class, has_node_attr, set_node_attr, set_text_content,
    text_content, walk_elements,
};
use crate::translation::config::constants;

use super::filters::TextFilter;

/// 可翻译单元
#[derive(Debug, Clone)]
pub struct TranslatableUnit {
    /// 本轮运行内唯一且稳定的序号
    pub index: usize,
    /// 原文
    pub source_text: String,
    /// 指向元素的弱引用，仅用于回写
    pub dom_ref: Weak<Node>,
}

impl TranslatableUnit {
    /// 元素是否仍然存在
    pub fn is_alive(&self) -> bool {
        self.dom_ref.strong_count() > 0
    }
}

/// 页面文本收集器
#[derive(Debug, Clone)]
pub struct PageHarvester {
    excluded_class: String,
    filter: TextFilter,
}

impl Default for PageHarvester {
    fn default() -> Self {
        Self::new(constants::EXCLUDED_CLASS)
    }
}

impl PageHarvester {
    /// 创建收集器，`excluded_class` 所在子树整体跳过
    pub fn new(excluded_class: impl Into<String>) -> Self {
        Self {
            excluded_class: excluded_class.into(),
            filter: TextFilter::new(),
        }
    }

    /// 清除所有残留的序号标记
    pub fn clear_tags(&self, document: &Handle) {
        walk_elements(document, &mut |node| {
            if has_node_attr(node, constants::TRANSLATE_INDEX_ATTR) {
                set_node_attr(node, constants::TRANSLATE_INDEX_ATTR, None);
            }
        });
    }

    /// 收集可翻译单元（文档顺序）
    pub fn harvest(&self, document: &Handle) -> Vec<TranslatableUnit> {
        self.clear_tags(document);

        let mut elements = Vec::new();
        self.collect_candidates(document, &mut elements);

        let mut units = Vec::with_capacity(elements.len());
        for element in elements {
            let stored = get_node_attr(&element, constants::ORIGINAL_TEXT_ATTR);
            let source_text = source_text_of(&element, stored.as_deref());

            if !self.filter.should_translate(&source_text) {
                continue;
            }

            if stored.is_none() {
                set_node_attr(
                    &element,
                    constants::ORIGINAL_TEXT_ATTR,
                    Some(source_text.clone()),
                );
            }

            let index = units.len();
            set_node_attr(
                &element,
                constants::TRANSLATE_INDEX_ATTR,
                Some(index.to_string()),
            );

            units.push(TranslatableUnit {
                index,
                source_text,
                dom_ref: Rc::downgrade(&element),
            });
        }

        tracing::debug!("收集到 {} 个可翻译元素", units.len());
        units
    }

    /// 将译文写回单元对应的元素
    ///
    /// 元素已被移除或序号标记不再匹配时返回 `false`，不做任何修改。
    pub fn write_back(&self, unit: &TranslatableUnit, text: &str) -> bool {
        let Some(element) = unit.dom_ref.upgrade() else {
            return false;
        };

        let tagged = get_node_attr(&element, constants::TRANSLATE_INDEX_ATTR);
        if tagged.as_deref() != Some(unit.index.to_string().as_str()) {
            return false;
        }

        if text_content(&element) != text {
            set_text_content(&element, text);
        }
        true
    }

    /// 恢复所有元素的原文并清除序号标记，返回恢复的元素数
    pub fn restore_original_texts(&self, document: &Handle) -> usize {
        let mut restored = 0;

        walk_elements(document, &mut |node| {
            if has_node_attr(node, constants::TRANSLATE_INDEX_ATTR) {
                set_node_attr(node, constants::TRANSLATE_INDEX_ATTR, None);
            }

            if has_node_attr(node, constants::SELF_TRANSLATE_ATTR) {
                return;
            }

            if let Some(original) = get_node_attr(node, constants::ORIGINAL_TEXT_ATTR) {
                if text_content(node).trim() != original {
                    set_text_content(node, &original);
                    restored += 1;
                }
            }
        });

        tracing::debug!("恢复了 {} 个元素的原文", restored);
        restored
    }

    fn collect_candidates(&self, node: &Handle, out: &mut Vec<Handle>) {
        for child in node.children.borrow().iter() {
            let Some(name) = get_node_name(child) else {
                continue;
            };

            if self.is_opted_out(child, name) {
                continue;
            }

            if is_candidate(name) && !self.has_blocking_descendant(child) {
                out.push(child.clone());
                continue;
            }

            self.collect_candidates(child, out);
        }
    }

    fn is_opted_out(&self, node: &Handle, name: &str) -> bool {
        constants::SKIP_ELEMENTS.contains(&name)
            || has_class(node, &self.excluded_class)
            || has_node_attr(node, constants::NO_TRANSLATE_ATTR)
            || has_node_attr(node, constants::SELF_TRANSLATE_ATTR)
    }

    /// 子树中是否有元素会成为独立单元，或属于带文本的排除子树
    fn has_blocking_descendant(&self, node: &Handle) -> bool {
        node.children.borrow().iter().any(|child| {
            let Some(name) = get_node_name(child) else {
                return false;
            };

            if self.is_opted_out(child, name) {
                return !text_content(child).trim().is_empty();
            }

            if is_candidate(name) {
                let stored = get_node_attr(child, constants::ORIGINAL_TEXT_ATTR);
                if self
                    .filter
                    .should_translate(&source_text_of(child, stored.as_deref()))
                {
                    return true;
                }
            }

            self.has_blocking_descendant(child)
        })
    }
}

fn is_candidate(name: &str) -> bool {
    constants::CANDIDATE_TAGS.contains(&name)
}

fn source_text_of(element: &Handle, stored: Option<&str>) -> String {
    match stored {
        Some(original) => original.to_string(),
        None => text_content(element).trim().to_string(),
    }
}
