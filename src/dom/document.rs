//! Document - arena-based tree representation
//!
//! Efficient tree storage with:
//! - Arena allocation for nodes
//! - NodeId indices for traversal
//! - String interning for tag names and class tokens
//!
//! A Document is an immutable snapshot: nothing mutates it after parsing,
//! so offset indexes built over it stay valid for its whole lifetime.

use super::node::{Node, NodeId, NodeKind};
use super::strings::StringPool;
use crate::error::{DomTextError, Result};

/// A tree document stored in arena format
pub struct Document {
    /// Arena of nodes; index 0 is the document node
    nodes: Vec<Node>,
    /// Interned tag names and class tokens
    pub strings: StringPool,
    /// Root element node ID (not the document node)
    root_element: Option<NodeId>,
}

impl Document {
    /// Create an empty document (document node only)
    pub(crate) fn empty() -> Self {
        let mut doc = Document {
            nodes: Vec::with_capacity(64),
            strings: StringPool::new(),
            root_element: None,
        };
        doc.nodes.push(Node::document());
        doc
    }

    /// Parse a markup string into a document (lenient, never fails)
    pub fn parse(input: &str) -> Self {
        super::reader::parse(input)
    }

    /// Append a node to the arena and link it under its parent
    pub(crate) fn push_node(&mut self, node: Node) -> NodeId {
        let parent = node.parent;
        let id = self.nodes.len() as NodeId;
        self.nodes.push(node);
        if let Some(parent_id) = parent {
            self.link_child(parent_id, id);
        }
        if self.root_element.is_none()
            && parent == Some(0)
            && self.nodes[id as usize].is_element()
        {
            self.root_element = Some(id);
        }
        id
    }

    /// Link a child node to its parent
    fn link_child(&mut self, parent_id: NodeId, child_id: NodeId) {
        let last_child_opt = self.nodes[parent_id as usize].last_child;

        if let Some(last_child_id) = last_child_opt {
            self.nodes[child_id as usize].prev_sibling = Some(last_child_id);
            self.nodes[last_child_id as usize].next_sibling = Some(child_id);
        } else {
            self.nodes[parent_id as usize].first_child = Some(child_id);
        }
        self.nodes[parent_id as usize].last_child = Some(child_id);
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id as usize]
    }

    /// Get the root element ID
    pub fn root_element_id(&self) -> Option<NodeId> {
        self.root_element
    }

    /// Get a node by ID
    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id as usize)
    }

    /// Get a node by ID, failing with StaleNode for foreign ids
    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(id as usize)
            .ok_or(DomTextError::StaleNode(id))
    }

    /// Get the tag name of an element (or comment text)
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        self.strings.get(node.tag_id)
    }

    /// Get the class tokens of an element, in attribute order
    pub fn classes(&self, id: NodeId) -> Vec<&str> {
        match self.get_node(id) {
            Some(node) => node
                .class_ids
                .iter()
                .filter_map(|&cid| self.strings.get(cid))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Get the direct text content of a node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.get_node(id)?.text.as_deref()
    }

    /// Get the tail text of a node
    pub fn tail(&self, id: NodeId) -> Option<&str> {
        self.get_node(id)?.tail.as_deref()
    }

    /// Get the parent of a node
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id)?.parent
    }

    /// Iterate over children of a node
    pub fn children(&self, id: NodeId) -> ChildIter<'_> {
        let first = self.get_node(id).and_then(|n| n.first_child);
        ChildIter { doc: self, next: first }
    }

    /// Iterate over all descendants of a node (depth-first, document order)
    pub fn descendants(&self, id: NodeId) -> DescendantIter<'_> {
        let mut stack = Vec::new();
        if let Some(node) = self.get_node(id) {
            let mut child_id = node.last_child;
            while let Some(cid) = child_id {
                stack.push(cid);
                child_id = self.get_node(cid).and_then(|n| n.prev_sibling);
            }
        }
        DescendantIter { doc: self, stack }
    }

    /// Get total number of nodes (including the document node)
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Iterator over child nodes
pub struct ChildIter<'d> {
    doc: &'d Document,
    next: Option<NodeId>,
}

impl<'d> Iterator for ChildIter<'d> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.get_node(current).and_then(|n| n.next_sibling);
        Some(current)
    }
}

/// Iterator over descendant nodes (depth-first)
pub struct DescendantIter<'d> {
    doc: &'d Document,
    stack: Vec<NodeId>,
}

impl<'d> Iterator for DescendantIter<'d> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;

        // Push children in reverse so the first child is processed first
        if let Some(node) = self.doc.get_node(current) {
            let mut child_id = node.last_child;
            while let Some(id) = child_id {
                self.stack.push(id);
                child_id = self.doc.get_node(id).and_then(|n| n.prev_sibling);
            }
        }

        Some(current)
    }
}
