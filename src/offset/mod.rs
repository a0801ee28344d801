//! Offset Converter - bidirectional node/offset index
//!
//! One pass over a document snapshot precomputes, per node, the four
//! boundary offsets (`NodeOffsetData`) in the two counting schemes:
//! - Text: only text/tail characters count
//! - NodeText: additionally one unit per node boundary (open and close),
//!   so empty elements still occupy positions
//!
//! Alongside the per-node table the build keeps a pre-order array (sorted
//! by opening offsets) and a post-order array (sorted by closing offsets)
//! for O(log n) inverse lookups. The index is immutable after build and
//! valid for the lifetime of the snapshot; rebuild it if the tree changes.
//!
//! Construction never fails for a well-formed tree. Query failures are
//! caller errors (stale ids, out-of-range offsets) and are never retried.

use tracing::debug;

use crate::dom::{Document, NodeId};
use crate::error::{DomTextError, Result};
use crate::point::DomPoint;

/// Which offset counting scheme a query in is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetKind {
    /// Count only text/tail characters
    Text,
    /// Count characters plus one unit per node boundary
    NodeText,
}

/// Boundary offsets of one node, in both counting schemes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeOffsetData {
    /// Text offset at the node's opening boundary
    pub text_before: usize,
    /// Text offset just past the node's closing boundary (tail excluded)
    pub text_after: usize,
    /// Node-text offset at the node's opening boundary
    pub node_before: usize,
    /// Node-text offset just past the node's closing boundary
    pub node_after: usize,
}

/// Cached per-node character lengths (avoids re-counting chars per query)
#[derive(Debug, Clone, Copy, Default)]
struct NodeLens {
    text: u32,
    tail: u32,
    has_children: bool,
}

/// Immutable offset index over one document snapshot
pub struct OffsetConverter {
    /// Per-node offsets, indexed by NodeId
    data: Vec<NodeOffsetData>,
    /// Per-node text/tail lengths, indexed by NodeId
    lens: Vec<NodeLens>,
    /// Elements in document order (sorted by `node_before`/`text_before`)
    pre_order: Vec<NodeId>,
    /// Elements and comments in closing order (sorted by `*_after`)
    post_order: Vec<NodeId>,
    /// Total document length in text characters
    text_len: usize,
    /// Total document length in node-text units
    node_text_len: usize,
}

enum Walk {
    Enter(NodeId),
    Exit(NodeId),
}

impl OffsetConverter {
    /// Build the index over a document snapshot (single traversal)
    pub fn build(doc: &Document) -> Self {
        let mut conv = OffsetConverter {
            data: vec![NodeOffsetData::default(); doc.node_count()],
            lens: vec![NodeLens::default(); doc.node_count()],
            pre_order: Vec::with_capacity(doc.node_count()),
            post_order: Vec::with_capacity(doc.node_count()),
            text_len: 0,
            node_text_len: 0,
        };

        let root = match doc.root_element_id() {
            Some(r) => r,
            None => return conv,
        };

        let mut text: usize = 0;
        let mut node: usize = 0;
        let mut stack = vec![Walk::Enter(root)];

        while let Some(step) = stack.pop() {
            match step {
                Walk::Enter(id) => {
                    let n = match doc.get_node(id) {
                        Some(n) => n,
                        None => continue,
                    };
                    let tail_chars = n.tail_chars();
                    if n.is_comment() {
                        // Zero-width: skipped but covered by the parent
                        // span; its tail is still parent content.
                        conv.data[id as usize] = NodeOffsetData {
                            text_before: text,
                            text_after: text,
                            node_before: node,
                            node_after: node,
                        };
                        conv.lens[id as usize] = NodeLens {
                            text: 0,
                            tail: tail_chars as u32,
                            has_children: false,
                        };
                        conv.post_order.push(id);
                        text += tail_chars;
                        node += tail_chars;
                        continue;
                    }

                    let text_chars = n.text_chars();
                    conv.data[id as usize].text_before = text;
                    conv.data[id as usize].node_before = node;
                    conv.lens[id as usize] = NodeLens {
                        text: text_chars as u32,
                        tail: tail_chars as u32,
                        has_children: n.has_children(),
                    };
                    conv.pre_order.push(id);

                    node += 1; // opening boundary unit
                    text += text_chars;
                    node += text_chars;

                    stack.push(Walk::Exit(id));
                    // Children in reverse so the first child is entered first
                    let mut child = n.last_child;
                    while let Some(c) = child {
                        stack.push(Walk::Enter(c));
                        child = doc.get_node(c).and_then(|x| x.prev_sibling);
                    }
                }
                Walk::Exit(id) => {
                    node += 1; // closing boundary unit
                    conv.data[id as usize].text_after = text;
                    conv.data[id as usize].node_after = node;
                    conv.post_order.push(id);
                    // The tail follows the closing boundary and belongs to
                    // the parent's content stream.
                    let tail_chars = conv.lens[id as usize].tail as usize;
                    text += tail_chars;
                    node += tail_chars;
                }
            }
        }

        // Root carries no tail, so the counters are the document lengths
        conv.text_len = text;
        conv.node_text_len = node;

        debug!(
            nodes = conv.pre_order.len(),
            text_len = conv.text_len,
            node_text_len = conv.node_text_len,
            "built offset index"
        );
        conv
    }

    /// Total document length for the given kind
    pub fn len(&self, kind: OffsetKind) -> usize {
        match kind {
            OffsetKind::Text => self.text_len,
            OffsetKind::NodeText => self.node_text_len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pre_order.is_empty()
    }

    /// Boundary offsets of a plain node
    pub fn offsets_of(&self, node: NodeId) -> Result<&NodeOffsetData> {
        self.data
            .get(node as usize)
            .ok_or(DomTextError::StaleNode(node))
    }

    /// Resolve a DomPoint to an integer offset.
    ///
    /// Only node-text-kind queries are unconditionally supported; for the
    /// text kind one integer can denote two boundaries, so the caller must
    /// state a side via [`offset_of_with_hint`](Self::offset_of_with_hint).
    pub fn offset_of(&self, point: &DomPoint, kind: OffsetKind) -> Result<usize> {
        match kind {
            OffsetKind::NodeText => self.node_text_offset(point),
            OffsetKind::Text => Err(DomTextError::UnsupportedQuery(
                "text-kind point queries require an is_start hint",
            )),
        }
    }

    /// Resolve a DomPoint to an integer offset, disambiguating text-kind
    /// boundary positions with `is_start`.
    pub fn offset_of_with_hint(
        &self,
        point: &DomPoint,
        kind: OffsetKind,
        is_start: bool,
    ) -> Result<usize> {
        match kind {
            OffsetKind::NodeText => self.node_text_offset(point),
            OffsetKind::Text => self.text_offset(point, is_start),
        }
    }

    fn node_text_offset(&self, point: &DomPoint) -> Result<usize> {
        let d = *self.offsets_of(point.node)?;
        let lens = self.lens[point.node as usize];
        let after = usize::from(point.after);

        if let Some(t) = point.text_offset {
            if t > lens.text as usize {
                return Err(DomTextError::OffsetOutOfRange {
                    offset: t,
                    len: lens.text as usize,
                });
            }
            Ok(d.node_before + 1 + t + after)
        } else if let Some(t) = point.tail_offset {
            if t > lens.tail as usize {
                return Err(DomTextError::OffsetOutOfRange {
                    offset: t,
                    len: lens.tail as usize,
                });
            }
            Ok(d.node_after + t + after)
        } else if point.after {
            Ok(d.node_after)
        } else {
            Ok(d.node_before)
        }
    }

    fn text_offset(&self, point: &DomPoint, is_start: bool) -> Result<usize> {
        let d = *self.offsets_of(point.node)?;
        let lens = self.lens[point.node as usize];
        let after = usize::from(point.after);

        if let Some(t) = point.text_offset {
            if t > lens.text as usize {
                return Err(DomTextError::OffsetOutOfRange {
                    offset: t,
                    len: lens.text as usize,
                });
            }
            Ok(d.text_before + t + after)
        } else if let Some(t) = point.tail_offset {
            if t > lens.tail as usize {
                return Err(DomTextError::OffsetOutOfRange {
                    offset: t,
                    len: lens.tail as usize,
                });
            }
            Ok(d.text_after + t + after)
        } else if point.after || !is_start {
            Ok(d.text_after)
        } else {
            Ok(d.text_before)
        }
    }

    /// Resolve an integer offset to a DomPoint.
    ///
    /// Node-text offsets are unambiguous. For the text kind one integer can
    /// denote the end of a run or the start of the next, so the caller must
    /// state a side via [`point_at_with_hint`](Self::point_at_with_hint).
    pub fn point_at(&self, offset: usize, kind: OffsetKind) -> Result<DomPoint> {
        match kind {
            OffsetKind::NodeText => self.point_at_node_text(offset),
            OffsetKind::Text => Err(DomTextError::UnsupportedQuery(
                "text-kind offset lookups require an is_start hint",
            )),
        }
    }

    /// Resolve an integer offset to a DomPoint, disambiguating text-kind
    /// boundary positions with `is_start` (ignored for the node-text kind).
    pub fn point_at_with_hint(
        &self,
        offset: usize,
        kind: OffsetKind,
        is_start: bool,
    ) -> Result<DomPoint> {
        match kind {
            OffsetKind::NodeText => self.point_at_node_text(offset),
            OffsetKind::Text => self.point_at_text(offset, is_start),
        }
    }

    fn point_at_node_text(&self, offset: usize) -> Result<DomPoint> {
        if offset > self.node_text_len || self.pre_order.is_empty() {
            return Err(DomTextError::OffsetOutOfRange {
                offset,
                len: self.node_text_len,
            });
        }

        // Opening-boundary side: own opening unit or own text characters
        let i = self
            .pre_order
            .partition_point(|&n| self.data[n as usize].node_before <= offset);
        if i > 0 {
            let n = self.pre_order[i - 1];
            let d = &self.data[n as usize];
            let lens = self.lens[n as usize];
            if d.node_before == offset {
                return Ok(DomPoint::node(n));
            }
            let text_start = d.node_before + 1;
            let text_end = text_start + lens.text as usize;
            if offset >= text_start && offset < text_end {
                return Ok(DomPoint::text(n, offset - text_start));
            }
            // End-of-text boundary inside a childless element
            if offset == text_end && !lens.has_children {
                return Ok(DomPoint::text(n, lens.text as usize));
            }
        }

        // Closing-boundary side: after-point or tail characters
        let j = self
            .post_order
            .partition_point(|&m| self.data[m as usize].node_after <= offset);
        if j > 0 {
            let m = self.post_order[j - 1];
            let d = &self.data[m as usize];
            let tail = self.lens[m as usize].tail as usize;
            if d.node_after == offset {
                return Ok(DomPoint::after(m));
            }
            if offset > d.node_after && offset <= d.node_after + tail {
                return Ok(DomPoint::tail(m, offset - d.node_after));
            }
        }

        // Every offset within the document falls in one of the cases above
        Err(DomTextError::OffsetOutOfRange {
            offset,
            len: self.node_text_len,
        })
    }

    fn point_at_text(&self, offset: usize, is_start: bool) -> Result<DomPoint> {
        if offset > self.text_len || self.pre_order.is_empty() {
            return Err(DomTextError::OffsetOutOfRange {
                offset,
                len: self.text_len,
            });
        }

        if is_start {
            // A run starting exactly here: earliest node (in closing order)
            // whose after-boundary equals the offset. This may land in an
            // empty tail; the position is the same.
            let i = self
                .post_order
                .partition_point(|&m| self.data[m as usize].text_after < offset);
            if i < self.post_order.len() {
                let m = self.post_order[i];
                if self.data[m as usize].text_after == offset {
                    return Ok(DomPoint::tail(m, 0));
                }
            }
            // Strictly inside a tail
            if i > 0 {
                let m = self.post_order[i - 1];
                let d = &self.data[m as usize];
                let tail = self.lens[m as usize].tail as usize;
                if offset < d.text_after + tail {
                    return Ok(DomPoint::tail(m, offset - d.text_after));
                }
            }
            // Inside a node's own text
            let p = self
                .pre_order
                .partition_point(|&n| self.data[n as usize].text_before <= offset);
            if p > 0 {
                let n = self.pre_order[p - 1];
                let d = &self.data[n as usize];
                let text = self.lens[n as usize].text as usize;
                if offset < d.text_before + text {
                    return Ok(DomPoint::text(n, offset - d.text_before));
                }
            }
        } else {
            // End side: prefer closing a text run over opening a tail
            let p = self
                .pre_order
                .partition_point(|&n| self.data[n as usize].text_before < offset);
            if p > 0 {
                let n = self.pre_order[p - 1];
                let d = &self.data[n as usize];
                let text = self.lens[n as usize].text as usize;
                if text > 0 && offset <= d.text_before + text {
                    return Ok(DomPoint::text(n, offset - d.text_before));
                }
            }
            let q = self
                .post_order
                .partition_point(|&m| self.data[m as usize].text_after < offset);
            if q > 0 {
                let m = self.post_order[q - 1];
                let d = &self.data[m as usize];
                let tail = self.lens[m as usize].tail as usize;
                if tail > 0 && offset <= d.text_after + tail {
                    return Ok(DomPoint::tail(m, offset - d.text_after));
                }
            }
            // Degenerate end at the very start of the document
            if offset == 0 {
                return Ok(DomPoint::text(self.pre_order[0], 0));
            }
        }

        Err(DomTextError::OffsetOutOfRange {
            offset,
            len: self.text_len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use pretty_assertions::assert_eq;

    fn nth_child(doc: &Document, id: NodeId, n: usize) -> NodeId {
        doc.children(id).nth(n).unwrap()
    }

    /// The worked example: <p>x<emph><b>y</b></emph>za</p>
    fn example() -> (Document, NodeId, NodeId, NodeId) {
        let doc = Document::parse("<p>x<emph><b>y</b></emph>za</p>");
        let p = doc.root_element_id().unwrap();
        let emph = nth_child(&doc, p, 0);
        let b = nth_child(&doc, emph, 0);
        (doc, p, emph, b)
    }

    #[test]
    fn test_node_text_spans() {
        let (doc, p, emph, b) = example();
        let conv = OffsetConverter::build(&doc);

        let dp = conv.offsets_of(p).unwrap();
        assert_eq!((dp.node_before, dp.node_after), (0, 10));
        let de = conv.offsets_of(emph).unwrap();
        assert_eq!((de.node_before, de.node_after), (2, 7));
        let db = conv.offsets_of(b).unwrap();
        assert_eq!((db.node_before, db.node_after), (3, 6));

        assert_eq!(conv.len(OffsetKind::NodeText), 10);
        assert_eq!(conv.len(OffsetKind::Text), 4);
    }

    #[test]
    fn test_text_spans() {
        let (doc, p, emph, b) = example();
        let conv = OffsetConverter::build(&doc);

        let dp = conv.offsets_of(p).unwrap();
        assert_eq!((dp.text_before, dp.text_after), (0, 4));
        let de = conv.offsets_of(emph).unwrap();
        assert_eq!((de.text_before, de.text_after), (1, 2));
        let db = conv.offsets_of(b).unwrap();
        assert_eq!((db.text_before, db.text_after), (1, 2));
    }

    #[test]
    fn test_point_at_node_text_after() {
        let (doc, _, emph, _) = example();
        let conv = OffsetConverter::build(&doc);
        assert_eq!(
            conv.point_at(7, OffsetKind::NodeText).unwrap(),
            DomPoint::after(emph)
        );
    }

    #[test]
    fn test_point_at_text_start_in_tail() {
        // Linear text "xyza": offset 2 as a start lands in b's (empty)
        // tail at relative index 0, the position of 'z'.
        let (doc, _, _, b) = example();
        let conv = OffsetConverter::build(&doc);
        assert_eq!(
            conv.point_at_with_hint(2, OffsetKind::Text, true).unwrap(),
            DomPoint::tail(b, 0)
        );
    }

    #[test]
    fn test_point_at_text_end_of_run() {
        let (doc, _, _, b) = example();
        let conv = OffsetConverter::build(&doc);
        // The same integer as an end closes the "y" run inside <b>
        assert_eq!(
            conv.point_at_with_hint(2, OffsetKind::Text, false).unwrap(),
            DomPoint::text(b, 1)
        );
    }

    #[test]
    fn test_point_at_text_inside_tail() {
        let (doc, _, emph, _) = example();
        let conv = OffsetConverter::build(&doc);
        assert_eq!(
            conv.point_at_with_hint(3, OffsetKind::Text, true).unwrap(),
            DomPoint::tail(emph, 1)
        );
        assert_eq!(
            conv.point_at_with_hint(4, OffsetKind::Text, false).unwrap(),
            DomPoint::tail(emph, 2)
        );
    }

    #[test]
    fn test_round_trip_all_nodes() {
        let (doc, _, _, _) = example();
        let conv = OffsetConverter::build(&doc);
        for id in 0..doc.node_count() as NodeId {
            let node = doc.get_node(id).unwrap();
            if !node.is_element() {
                continue;
            }
            let point = DomPoint::node(id);
            let off = conv.offset_of(&point, OffsetKind::NodeText).unwrap();
            assert_eq!(
                conv.point_at(off, OffsetKind::NodeText).unwrap(),
                point,
                "node-text round trip for node {id}"
            );
        }
    }

    #[test]
    fn test_monotonicity() {
        let doc = Document::parse("<a>t1<b>t2<c/>t3</b>t4<d>t5</d></a>");
        let conv = OffsetConverter::build(&doc);
        let root = doc.root_element_id().unwrap();
        let mut order = vec![root];
        order.extend(doc.descendants(root));

        for kind in [OffsetKind::Text, OffsetKind::NodeText] {
            let mut prev = 0;
            for &id in &order {
                let off = match kind {
                    OffsetKind::Text => conv.offsets_of(id).unwrap().text_before,
                    OffsetKind::NodeText => conv.offsets_of(id).unwrap().node_before,
                };
                assert!(off >= prev, "document order is offset order");
                prev = off;
            }
        }
    }

    #[test]
    fn test_before_not_after_after() {
        let doc = Document::parse("<a><b>x</b><c/>y</a>");
        let conv = OffsetConverter::build(&doc);
        let root = doc.root_element_id().unwrap();
        for id in std::iter::once(root).chain(doc.descendants(root)) {
            let d = conv.offsets_of(id).unwrap();
            assert!(d.text_before <= d.text_after);
            assert!(d.node_before <= d.node_after);
        }
    }

    #[test]
    fn test_sibling_chaining() {
        let doc = Document::parse("<a><b/><c/><d/></a>");
        let conv = OffsetConverter::build(&doc);
        let root = doc.root_element_id().unwrap();
        let kids: Vec<_> = doc.children(root).collect();
        for pair in kids.windows(2) {
            let prev = conv.offsets_of(pair[0]).unwrap();
            let next = conv.offsets_of(pair[1]).unwrap();
            assert_eq!(prev.node_after, next.node_before);
            assert_eq!(prev.text_after, next.text_before);
        }
    }

    #[test]
    fn test_comment_zero_width_with_tail() {
        let doc = Document::parse("<p>a<!--note-->b</p>");
        let conv = OffsetConverter::build(&doc);
        let p = doc.root_element_id().unwrap();
        let comment = doc.children(p).next().unwrap();

        let dc = conv.offsets_of(comment).unwrap();
        assert_eq!(dc.node_before, dc.node_after);
        // 'b' is the comment's tail, still addressable
        assert_eq!(
            conv.point_at(dc.node_after + 1, OffsetKind::NodeText).unwrap(),
            DomPoint::tail(comment, 1)
        );
        // <p> covers the comment: open p, 'a', 'b', close p
        let dp = conv.offsets_of(p).unwrap();
        assert_eq!((dp.node_before, dp.node_after), (0, 4));
    }

    #[test]
    fn test_out_of_range() {
        let (doc, _, _, _) = example();
        let conv = OffsetConverter::build(&doc);
        assert!(matches!(
            conv.point_at(11, OffsetKind::NodeText),
            Err(DomTextError::OffsetOutOfRange { offset: 11, len: 10 })
        ));
        assert!(matches!(
            conv.point_at_with_hint(5, OffsetKind::Text, true),
            Err(DomTextError::OffsetOutOfRange { .. })
        ));
    }

    #[test]
    fn test_text_kind_requires_hint() {
        let (doc, p, _, _) = example();
        let conv = OffsetConverter::build(&doc);
        assert!(matches!(
            conv.offset_of(&DomPoint::node(p), OffsetKind::Text),
            Err(DomTextError::UnsupportedQuery(_))
        ));
        assert!(matches!(
            conv.point_at(2, OffsetKind::Text),
            Err(DomTextError::UnsupportedQuery(_))
        ));
    }

    #[test]
    fn test_stale_node() {
        let (doc, _, _, _) = example();
        let conv = OffsetConverter::build(&doc);
        let stale = doc.node_count() as NodeId + 7;
        assert_eq!(
            conv.offsets_of(stale).unwrap_err(),
            DomTextError::StaleNode(stale)
        );
    }

    #[test]
    fn test_point_offsets_with_char_positions() {
        let (doc, p, emph, b) = example();
        let conv = OffsetConverter::build(&doc);

        // 'x' is text(p, 0); node-text offset 1 (after p's opening unit)
        assert_eq!(
            conv.offset_of(&DomPoint::text(p, 0), OffsetKind::NodeText).unwrap(),
            1
        );
        // 'y' is text(b, 0)
        assert_eq!(
            conv.offset_of(&DomPoint::text(b, 0), OffsetKind::NodeText).unwrap(),
            4
        );
        // 'z' is tail(emph, 0), node-text offset 7
        assert_eq!(
            conv.offset_of(&DomPoint::tail(emph, 0), OffsetKind::NodeText).unwrap(),
            7
        );
        // and text offset 2
        assert_eq!(
            conv.offset_of_with_hint(&DomPoint::tail(emph, 0), OffsetKind::Text, true)
                .unwrap(),
            2
        );
    }
}
