//! DNM - derived normalized text views of a document
//!
//! A DNM ("document normalized model") is the document's text flattened
//! into one [`LinkedString`] under a [`DnmRules`] table: skipped subtrees
//! vanish, replaced subtrees become synthetic tokens, everything else is
//! extracted verbatim. Every character keeps node-text back-references,
//! so any match over the normalized text maps back to a [`DomRange`].
//!
//! Two builders share the vocabulary:
//! - [`Dnm`]: recursive node processor, refs materialized during the walk
//! - [`tokens::TokenDnm`]: flat token sequence with lazily computed refs
//!   and reverse (DOM range to text range) lookup

mod rules;
pub mod tokens;

pub use rules::{DnmAction, DnmRules};

use std::collections::HashMap;
use std::ops::Range;

use tracing::debug;

use crate::dom::{Document, NodeId};
use crate::error::Result;
use crate::linked::LinkedString;
use crate::offset::{OffsetConverter, OffsetKind};
use crate::point::DomRange;

/// One substituted subtree in the normalized text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    /// The replaced node
    pub node: NodeId,
    /// Category the rule filed it under
    pub category: String,
    /// Per-category running number, absent in unnumbered mode
    pub number: Option<usize>,
    /// Character range of the synthetic token in the normalized text
    pub range: Range<usize>,
}

/// Normalized text view with back-references and a replacement registry
pub struct Dnm {
    text: LinkedString,
    replacements: Vec<Replacement>,
}

impl Dnm {
    /// Normalize the document under the given rules.
    ///
    /// Never fails for a well-formed tree; rule conflicts were already
    /// rejected at registration time.
    pub fn build(doc: &Document, conv: &OffsetConverter, rules: &DnmRules) -> Dnm {
        let mut build = DnmBuild {
            doc,
            conv,
            rules,
            content: String::new(),
            start_refs: Vec::new(),
            end_refs: Vec::new(),
            replacements: Vec::new(),
            counters: HashMap::new(),
        };
        if let Some(root) = doc.root_element_id() {
            build.process(root);
        }
        debug!(
            chars = build.start_refs.len(),
            replacements = build.replacements.len(),
            "built dnm"
        );
        Dnm {
            text: LinkedString::new(build.content, build.start_refs, build.end_refs),
            replacements: build.replacements,
        }
    }

    pub fn text(&self) -> &LinkedString {
        &self.text
    }

    pub fn replacements(&self) -> &[Replacement] {
        &self.replacements
    }

    /// The replacement token covering a normalized-text position, if any
    pub fn replacement_at(&self, index: usize) -> Option<&Replacement> {
        let i = self
            .replacements
            .partition_point(|r| r.range.start <= index);
        let r = self.replacements.get(i.checked_sub(1)?)?;
        (index < r.range.end).then_some(r)
    }

    /// Map a normalized-text character range back to a DOM range
    pub fn range_of(&self, range: Range<usize>, conv: &OffsetConverter) -> Result<DomRange> {
        let (start_ref, end_ref) = self.text.refs_of(range)?;
        Ok(DomRange::new(
            conv.point_at(start_ref, OffsetKind::NodeText)?,
            conv.point_at(end_ref, OffsetKind::NodeText)?,
        ))
    }
}

struct DnmBuild<'a> {
    doc: &'a Document,
    conv: &'a OffsetConverter,
    rules: &'a DnmRules,
    content: String,
    start_refs: Vec<usize>,
    end_refs: Vec<usize>,
    replacements: Vec<Replacement>,
    counters: HashMap<String, usize>,
}

impl<'a> DnmBuild<'a> {
    fn push_char(&mut self, c: char, start: usize, end: usize) {
        self.content.push(c);
        self.start_refs.push(start);
        self.end_refs.push(end);
    }

    fn process(&mut self, id: NodeId) {
        let node = match self.doc.get_node(id) {
            Some(n) => n,
            None => return,
        };
        // Comments carry no action; their subtree is empty and the tail
        // is handled by the parent below.
        let action = if node.is_comment() {
            &DnmAction::Skip
        } else {
            self.rules.action_for(self.doc, node)
        };

        match action {
            DnmAction::Skip => {}
            DnmAction::Replace {
                category,
                numbered,
                marker,
            } => self.replace(id, category, *numbered, marker.as_deref()),
            DnmAction::Extract => {
                let d = self.conv.offsets_of(id).copied().unwrap_or_default();
                if let Some(text) = self.doc.text(id) {
                    // Refs start one past the opening unit so the first
                    // character is distinguishable from the boundary.
                    for (i, c) in text.chars().enumerate() {
                        self.push_char(c, d.node_before + 1 + i, d.node_before + 2 + i);
                    }
                }
                let children: Vec<NodeId> = self.doc.children(id).collect();
                for child in children {
                    self.process(child);
                    self.tail_of(child);
                }
            }
        }
    }

    fn tail_of(&mut self, id: NodeId) {
        let Some(tail) = self.doc.tail(id) else {
            return;
        };
        let after = match self.conv.offsets_of(id) {
            Ok(d) => d.node_after,
            Err(_) => return,
        };
        for (i, c) in tail.chars().enumerate() {
            self.push_char(c, after + i, after + i + 1);
        }
    }

    fn replace(&mut self, id: NodeId, category: &str, numbered: bool, marker: Option<&str>) {
        let d = match self.conv.offsets_of(id) {
            Ok(d) => *d,
            Err(_) => return,
        };
        let number = numbered.then(|| {
            let n = self.counters.entry(category.to_string()).or_insert(0);
            *n += 1;
            *n
        });
        let base = marker.unwrap_or(category);
        let token = match number {
            Some(n) => format!("{base}{n}"),
            None => base.to_string(),
        };
        let start = self.start_refs.len();
        // Every character of the token shares the node's bounds, so a
        // match on any of them recovers the whole node.
        for c in token.chars() {
            self.push_char(c, d.node_before, d.node_after);
        }
        self.replacements.push(Replacement {
            node: id,
            category: category.to_string(),
            number,
            range: start..self.start_refs.len(),
        });
    }
}
