//! Rule table mapping tags and classes to normalization actions

use std::collections::HashMap;

use crate::dom::{Document, Node};
use crate::error::{DomTextError, Result};

/// What the normalizer does with a matched node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DnmAction {
    /// Drop the node and its whole subtree (the tail still belongs to
    /// the parent and is kept)
    Skip,
    /// Emit the node's text and recurse into children (the default)
    Extract,
    /// Stand in a synthetic token for the whole subtree
    Replace {
        /// Registry category the token is filed under
        category: String,
        /// Append a per-category running number to the token text
        numbered: bool,
        /// Token text; the category name when absent
        marker: Option<String>,
    },
}

/// Static tag/class dispatch table.
///
/// Lookup is tag-first, then class tokens in document order; the first
/// match wins and unmatched nodes default to [`DnmAction::Extract`].
#[derive(Debug, Default)]
pub struct DnmRules {
    by_tag: HashMap<String, DnmAction>,
    by_class: HashMap<String, DnmAction>,
}

impl DnmRules {
    pub fn new() -> Self {
        DnmRules::default()
    }

    /// Register an action for a tag name.
    ///
    /// The same name registered as both a tag and a class is rejected
    /// eagerly as a [`DomTextError::RuleConflict`].
    pub fn tag(mut self, name: &str, action: DnmAction) -> Result<Self> {
        if self.by_class.contains_key(name) {
            return Err(DomTextError::RuleConflict(name.to_string()));
        }
        self.by_tag.insert(name.to_string(), action);
        Ok(self)
    }

    /// Register an action for a class token
    pub fn class(mut self, name: &str, action: DnmAction) -> Result<Self> {
        if self.by_tag.contains_key(name) {
            return Err(DomTextError::RuleConflict(name.to_string()));
        }
        self.by_class.insert(name.to_string(), action);
        Ok(self)
    }

    pub(crate) fn action_for<'a>(&'a self, doc: &Document, node: &Node) -> &'a DnmAction {
        if let Some(tag) = doc.strings.get(node.tag_id) {
            if let Some(action) = self.by_tag.get(tag) {
                return action;
            }
        }
        for &class_id in &node.class_ids {
            if let Some(class) = doc.strings.get(class_id) {
                if let Some(action) = self.by_class.get(class) {
                    return action;
                }
            }
        }
        &DnmAction::Extract
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_beats_class() {
        let rules = DnmRules::new()
            .tag("math", DnmAction::Skip)
            .unwrap()
            .class("ltx_equation", DnmAction::Extract)
            .unwrap();

        let doc = Document::parse(r#"<math class="ltx_equation">x</math>"#);
        let root = doc.root_element_id().unwrap();
        let node = doc.get_node(root).unwrap();
        assert_eq!(rules.action_for(&doc, node), &DnmAction::Skip);
    }

    #[test]
    fn test_class_order_first_match() {
        let rules = DnmRules::new()
            .class("b", DnmAction::Skip)
            .unwrap()
            .class("a", DnmAction::Extract)
            .unwrap();

        // "a" comes first in the attribute, so it wins over "b"
        let doc = Document::parse(r#"<span class="a b">x</span>"#);
        let root = doc.root_element_id().unwrap();
        let node = doc.get_node(root).unwrap();
        assert_eq!(rules.action_for(&doc, node), &DnmAction::Extract);
    }

    #[test]
    fn test_conflict_detected_eagerly() {
        let err = DnmRules::new()
            .tag("math", DnmAction::Skip)
            .unwrap()
            .class("math", DnmAction::Extract)
            .unwrap_err();
        assert_eq!(err, DomTextError::RuleConflict("math".to_string()));
    }

    #[test]
    fn test_default_is_extract() {
        let rules = DnmRules::new();
        let doc = Document::parse("<p>x</p>");
        let root = doc.root_element_id().unwrap();
        let node = doc.get_node(root).unwrap();
        assert_eq!(rules.action_for(&doc, node), &DnmAction::Extract);
    }
}
