//! Tree node representation
//!
//! Uses NodeId (u32) for compact, cache-friendly node references.
//! Text content follows the content-stream model: a node owns the text
//! before its first child (`text`) and the text after its own closing
//! boundary (`tail`), which belongs to the parent's content stream.

/// Compact node identifier (index into arena)
pub type NodeId = u32;

/// Type of tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Document root
    Document,
    /// Element node
    Element,
    /// Comment (skipped by offset counting, covered by the parent span)
    Comment,
}

/// A node in the arena
#[derive(Debug, Clone)]
pub struct Node {
    /// Type of this node
    pub kind: NodeKind,
    /// Parent node (None for document root)
    pub parent: Option<NodeId>,
    /// First child node
    pub first_child: Option<NodeId>,
    /// Last child node
    pub last_child: Option<NodeId>,
    /// Previous sibling
    pub prev_sibling: Option<NodeId>,
    /// Next sibling
    pub next_sibling: Option<NodeId>,
    /// Index into string pool for the tag name (elements) or comment text
    pub tag_id: u32,
    /// Interned class tokens, in attribute order
    pub class_ids: Vec<u32>,
    /// Direct text content, before the first child
    pub text: Option<String>,
    /// Text following this node's closing boundary (never set on the root)
    pub tail: Option<String>,
    /// Depth in document tree
    pub depth: u16,
}

impl Node {
    /// Create a new document root node
    pub fn document() -> Self {
        Node {
            kind: NodeKind::Document,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            tag_id: 0,
            class_ids: Vec::new(),
            text: None,
            tail: None,
            depth: 0,
        }
    }

    /// Create a new element node
    pub fn element(tag_id: u32, parent: Option<NodeId>, depth: u16) -> Self {
        Node {
            kind: NodeKind::Element,
            parent,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            tag_id,
            class_ids: Vec::new(),
            text: None,
            tail: None,
            depth,
        }
    }

    /// Create a new comment node
    pub fn comment(tag_id: u32, parent: Option<NodeId>, depth: u16) -> Self {
        Node {
            kind: NodeKind::Comment,
            parent,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            tag_id,
            class_ids: Vec::new(),
            text: None,
            tail: None,
            depth,
        }
    }

    /// Check if this is an element node
    #[inline]
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    /// Check if this is a comment node
    #[inline]
    pub fn is_comment(&self) -> bool {
        self.kind == NodeKind::Comment
    }

    /// Check if this node has children
    #[inline]
    pub fn has_children(&self) -> bool {
        self.first_child.is_some()
    }

    /// Direct text content length in characters
    #[inline]
    pub fn text_chars(&self) -> usize {
        self.text.as_deref().map_or(0, |t| t.chars().count())
    }

    /// Tail text length in characters
    #[inline]
    pub fn tail_chars(&self) -> usize {
        self.tail.as_deref().map_or(0, |t| t.chars().count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_creation() {
        let doc = Node::document();
        assert_eq!(doc.kind, NodeKind::Document);
        assert!(doc.parent.is_none());
        assert_eq!(doc.depth, 0);
    }

    #[test]
    fn test_element_node() {
        let elem = Node::element(1, Some(0), 1);
        assert_eq!(elem.kind, NodeKind::Element);
        assert_eq!(elem.parent, Some(0));
        assert_eq!(elem.tag_id, 1);
        assert_eq!(elem.depth, 1);
    }

    #[test]
    fn test_char_counts() {
        let mut elem = Node::element(1, Some(0), 1);
        elem.text = Some("héllo".to_string());
        elem.tail = Some("ab".to_string());
        assert_eq!(elem.text_chars(), 5);
        assert_eq!(elem.tail_chars(), 2);
    }
}
