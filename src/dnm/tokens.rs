//! Token-stream DNM variant
//!
//! Builds a flat token sequence (text run, tail run, replaced node)
//! without touching offsets, then derives positions on demand. Forward
//! references are memoized per character in an interior cache: each cell
//! is computed once via the converter, later reads are O(1).
//!
//! The cache is not shareable across threads while it fills; hand the
//! value to one owner during population.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ops::Range;

use tracing::debug;

use crate::dom::{Document, NodeId};
use crate::error::{DomTextError, Result};
use crate::linked::LinkedString;
use crate::offset::{OffsetConverter, OffsetKind};
use crate::point::DomRange;

use super::{DnmAction, DnmRules};

/// What a token stands for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// A node's own text run
    Text,
    /// A node's tail run
    Tail,
    /// A synthetic stand-in for a replaced subtree
    Replaced {
        category: String,
        number: Option<usize>,
    },
}

/// One run of normalized text traceable to a single node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnmToken {
    pub node: NodeId,
    pub content: String,
    pub kind: TokenKind,
}

/// How a requested boundary related to the nearest token boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryAdjust {
    /// The boundary fell exactly on a character boundary
    Exact,
    /// Snapped n node-text units earlier than requested
    Earlier(usize),
    /// Snapped n node-text units later than requested
    Later(usize),
}

/// Diagnostics for a reverse lookup; a non-exact side is a data-quality
/// report, not a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchIssues {
    pub start: BoundaryAdjust,
    pub end: BoundaryAdjust,
}

impl MatchIssues {
    pub fn is_exact(&self) -> bool {
        self.start == BoundaryAdjust::Exact && self.end == BoundaryAdjust::Exact
    }
}

/// Normalized token stream with lazily memoized back-references
pub struct TokenDnm {
    tokens: Vec<DnmToken>,
    content: String,
    /// Character offset of each token in `content`
    token_starts: Vec<usize>,
    len: usize,
    start_cache: RefCell<Vec<Option<usize>>>,
    end_cache: RefCell<Vec<Option<usize>>>,
}

impl TokenDnm {
    /// Tokenize the document under the given rules (no offsets involved)
    pub fn build(doc: &Document, rules: &DnmRules) -> TokenDnm {
        let mut tokens = Vec::new();
        let mut counters: HashMap<String, usize> = HashMap::new();
        if let Some(root) = doc.root_element_id() {
            collect(doc, rules, root, &mut tokens, &mut counters);
        }

        let mut content = String::new();
        let mut token_starts = Vec::with_capacity(tokens.len());
        let mut len = 0;
        for t in &tokens {
            token_starts.push(len);
            len += t.content.chars().count();
            content.push_str(&t.content);
        }
        debug!(tokens = tokens.len(), chars = len, "built token dnm");
        TokenDnm {
            tokens,
            content,
            token_starts,
            len,
            start_cache: RefCell::new(vec![None; len]),
            end_cache: RefCell::new(vec![None; len]),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn tokens(&self) -> &[DnmToken] {
        &self.tokens
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Token covering a character position, with the offset inside it
    pub fn token_at(&self, index: usize) -> Option<(&DnmToken, usize)> {
        if index >= self.len {
            return None;
        }
        let i = self.token_starts.partition_point(|&s| s <= index) - 1;
        Some((&self.tokens[i], index - self.token_starts[i]))
    }

    /// Node-text offset at the start of character `i` (memoized)
    fn start_ref(&self, i: usize, conv: &OffsetConverter) -> Result<usize> {
        let (token, k) = self
            .token_at(i)
            .ok_or(DomTextError::OffsetOutOfRange {
                offset: i,
                len: self.len,
            })?;
        if let Some(v) = self.start_cache.borrow()[i] {
            return Ok(v);
        }
        let d = conv.offsets_of(token.node)?;
        let v = match token.kind {
            TokenKind::Text => d.node_before + 1 + k,
            TokenKind::Tail => d.node_after + k,
            TokenKind::Replaced { .. } => d.node_before,
        };
        self.start_cache.borrow_mut()[i] = Some(v);
        Ok(v)
    }

    /// Node-text offset just past character `i` (memoized)
    fn end_ref(&self, i: usize, conv: &OffsetConverter) -> Result<usize> {
        let (token, k) = self
            .token_at(i)
            .ok_or(DomTextError::OffsetOutOfRange {
                offset: i,
                len: self.len,
            })?;
        if let Some(v) = self.end_cache.borrow()[i] {
            return Ok(v);
        }
        let d = conv.offsets_of(token.node)?;
        let v = match token.kind {
            TokenKind::Text => d.node_before + 2 + k,
            TokenKind::Tail => d.node_after + k + 1,
            TokenKind::Replaced { .. } => d.node_after,
        };
        self.end_cache.borrow_mut()[i] = Some(v);
        Ok(v)
    }

    /// Materialize the full [`LinkedString`] (fills the whole cache)
    pub fn linked(&self, conv: &OffsetConverter) -> Result<LinkedString> {
        let mut start_refs = Vec::with_capacity(self.len);
        let mut end_refs = Vec::with_capacity(self.len);
        for i in 0..self.len {
            start_refs.push(self.start_ref(i, conv)?);
            end_refs.push(self.end_ref(i, conv)?);
        }
        Ok(LinkedString::new(self.content.clone(), start_refs, end_refs))
    }

    /// Map a character range to the DOM range it covers
    pub fn range_of(&self, range: Range<usize>, conv: &OffsetConverter) -> Result<DomRange> {
        if range.start >= range.end || range.end > self.len {
            return Err(DomTextError::OffsetOutOfRange {
                offset: range.end,
                len: self.len,
            });
        }
        Ok(DomRange::new(
            conv.point_at(self.start_ref(range.start, conv)?, OffsetKind::NodeText)?,
            conv.point_at(self.end_ref(range.end - 1, conv)?, OffsetKind::NodeText)?,
        ))
    }

    /// Reverse lookup: the smallest character range covering a DOM range.
    ///
    /// Boundaries snap outward to token-character boundaries; the
    /// [`MatchIssues`] report how far each side moved, letting the caller
    /// accept, widen, or reject the match.
    pub fn dom_range_to_text(
        &self,
        range: &DomRange,
        conv: &OffsetConverter,
    ) -> Result<(Range<usize>, MatchIssues)> {
        if self.len == 0 {
            return Err(DomTextError::OffsetOutOfRange { offset: 0, len: 0 });
        }
        let s = conv.offset_of(&range.start, OffsetKind::NodeText)?;
        let e = conv.offset_of(&range.end, OffsetKind::NodeText)?;

        // Two bisections over the monotone memoized tables
        let i0 = self.lower_bound(s, |i| self.start_ref(i, conv))?;
        let (start, start_adjust) = if i0 < self.len && self.start_ref(i0, conv)? == s {
            (i0, BoundaryAdjust::Exact)
        } else if i0 > 0 {
            // Snap left to the first character sharing the earlier ref
            // (replaced-token characters all carry the same one)
            let target = self.start_ref(i0 - 1, conv)?;
            let first = self.lower_bound(target, |i| self.start_ref(i, conv))?;
            (first, BoundaryAdjust::Earlier(s - target))
        } else {
            (0, BoundaryAdjust::Later(self.start_ref(0, conv)? - s))
        };

        let k = self.lower_bound(e, |i| self.end_ref(i, conv))?;
        let (end, end_adjust) = if k < self.len {
            let chosen = self.end_ref(k, conv)?;
            // Snap right past the last character sharing the chosen ref
            let past = self.lower_bound(chosen + 1, |i| self.end_ref(i, conv))?;
            let adjust = if chosen == e {
                BoundaryAdjust::Exact
            } else {
                BoundaryAdjust::Later(chosen - e)
            };
            (past, adjust)
        } else {
            let last = self.end_ref(self.len - 1, conv)?;
            (self.len, BoundaryAdjust::Earlier(e - last))
        };

        let end = end.max(start);
        Ok((
            start..end,
            MatchIssues {
                start: start_adjust,
                end: end_adjust,
            },
        ))
    }

    // First index whose ref is >= target; refs are non-decreasing in
    // document order, so plain bisection applies even though cells fill
    // lazily.
    fn lower_bound<F: Fn(usize) -> Result<usize>>(&self, target: usize, f: F) -> Result<usize> {
        let (mut lo, mut hi) = (0, self.len);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if f(mid)? < target {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        Ok(lo)
    }
}

fn collect(
    doc: &Document,
    rules: &DnmRules,
    id: NodeId,
    tokens: &mut Vec<DnmToken>,
    counters: &mut HashMap<String, usize>,
) {
    let node = match doc.get_node(id) {
        Some(n) => n,
        None => return,
    };
    let action = if node.is_comment() {
        &DnmAction::Skip
    } else {
        rules.action_for(doc, node)
    };

    match action {
        DnmAction::Skip => {}
        DnmAction::Replace {
            category,
            numbered,
            marker,
        } => {
            let number = numbered.then(|| {
                let n = counters.entry(category.clone()).or_insert(0);
                *n += 1;
                *n
            });
            let base = marker.as_deref().unwrap_or(category);
            let content = match number {
                Some(n) => format!("{base}{n}"),
                None => base.to_string(),
            };
            tokens.push(DnmToken {
                node: id,
                content,
                kind: TokenKind::Replaced {
                    category: category.clone(),
                    number,
                },
            });
        }
        DnmAction::Extract => {
            if let Some(text) = doc.text(id) {
                tokens.push(DnmToken {
                    node: id,
                    content: text.to_string(),
                    kind: TokenKind::Text,
                });
            }
            let children: Vec<NodeId> = doc.children(id).collect();
            for child in children {
                collect(doc, rules, child, tokens, counters);
                if let Some(tail) = doc.tail(child) {
                    tokens.push(DnmToken {
                        node: child,
                        content: tail.to_string(),
                        kind: TokenKind::Tail,
                    });
                }
            }
        }
    }
}
