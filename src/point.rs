//! DomPoint / DomRange - position vocabulary
//!
//! Plain value types shared by the offset converter, the DNM builders and
//! the selector converter. A DomPoint pins a position to a node: its
//! opening boundary, its closing boundary (`after`), a character of its
//! direct text (`text_offset`) or a character of its tail (`tail_offset`).
//! At most one of the two character offsets is set.
//!
//! Equality is structural and intentionally incomplete: `after == true` on
//! a node denotes the same linear position as `tail_offset == 0` on that
//! node, but the two representations compare unequal. Callers that need
//! positional comparison should compare converter offsets instead.

use crate::dom::{Document, NodeId};

/// A position in a tree document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomPoint {
    /// The node this point is anchored to
    pub node: NodeId,
    /// Character offset into the node's direct text
    pub text_offset: Option<usize>,
    /// Character offset into the node's tail
    pub tail_offset: Option<usize>,
    /// Closing boundary instead of opening boundary (plain points);
    /// "position after this character" for text/tail points
    pub after: bool,
}

impl DomPoint {
    /// Point at a node's opening boundary
    pub fn node(node: NodeId) -> Self {
        DomPoint { node, text_offset: None, tail_offset: None, after: false }
    }

    /// Point at a node's closing boundary
    pub fn after(node: NodeId) -> Self {
        DomPoint { node, text_offset: None, tail_offset: None, after: true }
    }

    /// Point at character `offset` of a node's direct text
    pub fn text(node: NodeId, offset: usize) -> Self {
        DomPoint { node, text_offset: Some(offset), tail_offset: None, after: false }
    }

    /// Point at character `offset` of a node's tail
    pub fn tail(node: NodeId, offset: usize) -> Self {
        DomPoint { node, text_offset: None, tail_offset: Some(offset), after: false }
    }

    /// The node whose content stream owns this position: tail points
    /// belong to the parent of their anchor node.
    pub fn effective_owner(&self, doc: &Document) -> NodeId {
        if self.tail_offset.is_some() {
            doc.parent_of(self.node).unwrap_or(self.node)
        } else {
            self.node
        }
    }

    /// Degenerate range from this point to its immediate successor
    pub fn as_range(&self, doc: &Document) -> DomRange {
        DomRange { start: self.clone(), end: self.succeeding_point(doc) }
    }

    /// The next addressable point in document order.
    ///
    /// Zero-width comment boundaries are stepped over; a comment's tail is
    /// still visited since it belongs to the parent's content stream.
    pub fn succeeding_point(&self, doc: &Document) -> DomPoint {
        let node = match doc.get_node(self.node) {
            Some(n) => n,
            None => return self.clone(),
        };

        if let Some(t) = self.text_offset {
            let chars = node.text_chars();
            if t + 1 < chars {
                return DomPoint::text(self.node, t + 1);
            }
            if t >= chars {
                // End-of-content boundary: this point aliases whatever
                // opens here, so step past that instead of skipping to
                // the closing boundary.
                if let Some(entry) = child_entry_point(doc, self.node) {
                    return entry.succeeding_point(doc);
                }
                return DomPoint::after(self.node);
            }
            // t + 1 == chars: boundary after the last text character
            return child_entry_point(doc, self.node)
                .unwrap_or_else(|| DomPoint::text(self.node, chars));
        }

        if let Some(t) = self.tail_offset {
            let chars = node.tail_chars();
            if t + 1 < chars {
                return DomPoint::tail(self.node, t + 1);
            }
            if t >= chars {
                // End-of-tail boundary: aliases the following sibling
                if let Some(entry) = sibling_entry_point(doc, self.node) {
                    return entry.succeeding_point(doc);
                }
                return match node.parent {
                    Some(p) => DomPoint::after(p),
                    None => self.clone(),
                };
            }
            return sibling_entry_point(doc, self.node)
                .unwrap_or_else(|| DomPoint::tail(self.node, chars));
        }

        if self.after {
            if node.tail_chars() > 0 {
                return DomPoint::tail(self.node, 1);
            }
            if let Some(entry) = sibling_entry_point(doc, self.node) {
                return entry.succeeding_point(doc);
            }
            return match node.parent {
                Some(p) if p != 0 => DomPoint::after(p),
                _ => self.clone(),
            };
        }

        // Opening boundary: one node-unit forward
        if node.text_chars() > 0 {
            DomPoint::text(self.node, 0)
        } else {
            child_entry_point(doc, self.node)
                .unwrap_or_else(|| DomPoint::text(self.node, 0))
        }
    }
}

/// First addressable point inside a node's child list: the opening
/// boundary of the first element, or the closing boundary of a leading
/// comment whose tail carries text. Empty-tailed comments are zero-width
/// and stepped over.
fn child_entry_point(doc: &Document, id: NodeId) -> Option<DomPoint> {
    for child in doc.children(id) {
        let Some(n) = doc.get_node(child) else {
            continue;
        };
        if n.is_element() {
            return Some(DomPoint::node(child));
        }
        if n.is_comment() && n.tail_chars() > 0 {
            return Some(DomPoint::after(child));
        }
    }
    None
}

/// Same, over the siblings following a node
fn sibling_entry_point(doc: &Document, id: NodeId) -> Option<DomPoint> {
    let mut next = doc.get_node(id).and_then(|n| n.next_sibling);
    while let Some(s) = next {
        if let Some(n) = doc.get_node(s) {
            if n.is_element() {
                return Some(DomPoint::node(s));
            }
            if n.is_comment() && n.tail_chars() > 0 {
                return Some(DomPoint::after(s));
            }
        }
        next = doc.get_node(s).and_then(|n| n.next_sibling);
    }
    None
}

/// An ordered pair of same-tree points, `start <= end`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomRange {
    pub start: DomPoint,
    pub end: DomPoint,
}

impl DomRange {
    pub fn new(start: DomPoint, end: DomPoint) -> Self {
        DomRange { start, end }
    }

    /// Lowest common ancestor of the endpoint owners. A tail endpoint's
    /// effective owner is the anchor node's parent.
    pub fn containing_node(&self, doc: &Document) -> NodeId {
        let mut a = self.start.effective_owner(doc);
        let mut b = self.end.effective_owner(doc);

        let depth = |id: NodeId| doc.get_node(id).map_or(0, |n| n.depth);
        while depth(a) > depth(b) {
            a = doc.parent_of(a).unwrap_or(0);
        }
        while depth(b) > depth(a) {
            b = doc.parent_of(b).unwrap_or(0);
        }
        while a != b {
            a = doc.parent_of(a).unwrap_or(0);
            b = doc.parent_of(b).unwrap_or(0);
        }
        a
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use crate::offset::{OffsetConverter, OffsetKind};

    fn nth_child(doc: &Document, id: NodeId, n: usize) -> NodeId {
        doc.children(id).nth(n).unwrap()
    }

    fn node_text_offset(doc: &Document, point: &DomPoint) -> usize {
        let conv = OffsetConverter::build(doc);
        conv.offset_of(point, OffsetKind::NodeText).unwrap()
    }

    #[test]
    fn test_point_equality_incomplete() {
        // after == true and tail_offset == 0 denote the same position
        // but compare unequal; documented non-canonicalization.
        assert_ne!(DomPoint::after(3), DomPoint::tail(3, 0));
    }

    #[test]
    fn test_succeeding_through_text() {
        let doc = Document::parse("<p>ab</p>");
        let p = doc.root_element_id().unwrap();
        let start = DomPoint::node(p);
        let s1 = start.succeeding_point(&doc);
        assert_eq!(s1, DomPoint::text(p, 0));
        let s2 = s1.succeeding_point(&doc);
        assert_eq!(s2, DomPoint::text(p, 1));
        let s3 = s2.succeeding_point(&doc);
        assert_eq!(s3, DomPoint::text(p, 2)); // end-of-content boundary
        assert_eq!(s3.succeeding_point(&doc), DomPoint::after(p));
    }

    #[test]
    fn test_succeeding_into_child() {
        let doc = Document::parse("<p><b>y</b></p>");
        let p = doc.root_element_id().unwrap();
        let b = nth_child(&doc, p, 0);
        assert_eq!(DomPoint::node(p).succeeding_point(&doc), DomPoint::node(b));
    }

    #[test]
    fn test_succeeding_after_into_tail() {
        let doc = Document::parse("<p><b>y</b>za</p>");
        let p = doc.root_element_id().unwrap();
        let b = nth_child(&doc, p, 0);
        assert_eq!(DomPoint::after(b).succeeding_point(&doc), DomPoint::tail(b, 1));
        assert_eq!(
            DomPoint::tail(b, 1).succeeding_point(&doc),
            DomPoint::tail(b, 2)
        );
        assert_eq!(
            DomPoint::tail(b, 2).succeeding_point(&doc),
            DomPoint::after(p)
        );
    }

    #[test]
    fn test_succeeding_visits_leading_comment_tail() {
        // The comment is zero-width but its tail belongs to the parent's
        // content stream, so the successor of node(p) lands on it
        let doc = Document::parse("<p><!--c-->b<d/></p>");
        let p = doc.root_element_id().unwrap();
        let comment = nth_child(&doc, p, 0);

        let succ = DomPoint::node(p).succeeding_point(&doc);
        assert_eq!(succ, DomPoint::after(comment));
        assert_eq!(node_text_offset(&doc, &succ), 1);
        assert_eq!(
            succ.succeeding_point(&doc),
            DomPoint::tail(comment, 1)
        );
    }

    #[test]
    fn test_succeeding_text_boundary_enters_children() {
        // text(p, 1) aliases node(b); its successor must not skip <b>
        let doc = Document::parse("<p>a<b/>c</p>");
        let p = doc.root_element_id().unwrap();
        let b = nth_child(&doc, p, 0);

        let boundary = DomPoint::text(p, 1);
        assert_eq!(boundary.succeeding_point(&doc), DomPoint::text(b, 0));

        let range = boundary.as_range(&doc);
        let start = node_text_offset(&doc, &range.start);
        let end = node_text_offset(&doc, &range.end);
        assert_eq!((start, end), (2, 3), "as_range stays degenerate");
    }

    #[test]
    fn test_succeeding_tail_boundary_enters_sibling() {
        let doc = Document::parse("<p>a<b/>c<d/>e</p>");
        let p = doc.root_element_id().unwrap();
        let b = nth_child(&doc, p, 0);
        let d = nth_child(&doc, p, 1);

        // tail(b, 1) aliases node(d); the successor steps into <d>
        let boundary = DomPoint::tail(b, 1);
        assert_eq!(boundary.succeeding_point(&doc), DomPoint::text(d, 0));
        assert_eq!(
            node_text_offset(&doc, &boundary) + 1,
            node_text_offset(&doc, &boundary.succeeding_point(&doc))
        );
    }

    #[test]
    fn test_succeeding_after_visits_comment_sibling_tail() {
        let doc = Document::parse("<p><b/><!--c-->t</p>");
        let p = doc.root_element_id().unwrap();
        let b = nth_child(&doc, p, 0);
        let comment = nth_child(&doc, p, 1);

        assert_eq!(
            DomPoint::after(b).succeeding_point(&doc),
            DomPoint::tail(comment, 1)
        );
    }

    #[test]
    fn test_as_range_degenerate() {
        let doc = Document::parse("<p>x</p>");
        let p = doc.root_element_id().unwrap();
        let range = DomPoint::text(p, 0).as_range(&doc);
        assert_eq!(range.start, DomPoint::text(p, 0));
        assert_eq!(range.end, DomPoint::text(p, 1));
    }

    #[test]
    fn test_containing_node_lca() {
        let doc = Document::parse("<a><b><c>x</c></b><d>y</d></a>");
        let a = doc.root_element_id().unwrap();
        let b = nth_child(&doc, a, 0);
        let c = nth_child(&doc, b, 0);
        let d = nth_child(&doc, a, 1);

        let range = DomRange::new(DomPoint::text(c, 0), DomPoint::text(d, 0));
        assert_eq!(range.containing_node(&doc), a);

        let inner = DomRange::new(DomPoint::node(c), DomPoint::after(c));
        assert_eq!(inner.containing_node(&doc), c);
    }

    #[test]
    fn test_containing_node_tail_owner() {
        // A tail endpoint is owned by the anchor's parent
        let doc = Document::parse("<a><b/>xyz</a>");
        let a = doc.root_element_id().unwrap();
        let b = nth_child(&doc, a, 0);
        let range = DomRange::new(DomPoint::node(b), DomPoint::tail(b, 1));
        assert_eq!(range.containing_node(&doc), a);
    }
}
