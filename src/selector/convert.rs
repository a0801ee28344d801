//! Conversion between DomRange values and serializable selectors

use std::cell::RefCell;
use std::num::NonZeroUsize;
use std::rc::Rc;

use lru::LruCache;
use tracing::trace;

use crate::dom::{Document, NodeId};
use crate::error::{DomTextError, Result};
use crate::offset::{OffsetConverter, OffsetKind};
use crate::point::{DomPoint, DomRange};

use super::position::Position;
use super::xpath::{self, CompiledPath};
use super::Selector;

/// Compiled location paths kept per converter; selectors over the same
/// document tend to repeat paths.
const PATH_CACHE_SIZE: usize = 64;

/// Converts between in-memory ranges and document-external selectors
pub struct SelectorConverter<'a> {
    doc: &'a Document,
    conv: &'a OffsetConverter,
    paths: RefCell<LruCache<String, Rc<CompiledPath>>>,
}

impl<'a> SelectorConverter<'a> {
    pub fn new(doc: &'a Document, conv: &'a OffsetConverter) -> Self {
        SelectorConverter {
            doc,
            conv,
            paths: RefCell::new(LruCache::new(
                NonZeroUsize::new(PATH_CACHE_SIZE).expect("nonzero cache size"),
            )),
        }
    }

    /// Resolve a location path to exactly one node
    pub fn resolve(&self, path: &str) -> Result<NodeId> {
        let compiled = self.compiled(path)?;
        let hits = xpath::eval(self.doc, &compiled);
        match hits.len() {
            0 => Err(DomTextError::NodeNotFound(path.to_string())),
            1 => Ok(hits[0]),
            n => {
                trace!(path, matches = n, "ambiguous selector path");
                Err(DomTextError::AmbiguousPath(path.to_string()))
            }
        }
    }

    fn compiled(&self, path: &str) -> Result<Rc<CompiledPath>> {
        if let Some(hit) = self.paths.borrow_mut().get(path) {
            return Ok(Rc::clone(hit));
        }
        let compiled = Rc::new(xpath::compile(path)?);
        self.paths
            .borrow_mut()
            .put(path.to_string(), Rc::clone(&compiled));
        Ok(compiled)
    }

    /// Resolve a selector to its DOM range, plus one range per
    /// refinement part when a `refinedBy` list is present
    pub fn to_dom(&self, selector: &Selector) -> Result<(DomRange, Option<Vec<DomRange>>)> {
        match selector {
            Selector::PathSelector {
                start_path,
                end_path,
                refined_by,
            } => {
                let start = self.position_to_point(&Position::parse(start_path)?, true)?;
                let end = self.position_to_point(&Position::parse(end_path)?, false)?;
                let parts = self.refinement_ranges(refined_by.as_deref())?;
                Ok((DomRange::new(start, end), parts))
            }
            Selector::OffsetSelector {
                start,
                end,
                refined_by,
            } => {
                let range = DomRange::new(
                    self.conv.point_at(*start, OffsetKind::NodeText)?,
                    self.conv.point_at(*end, OffsetKind::NodeText)?,
                );
                let parts = self.refinement_ranges(refined_by.as_deref())?;
                Ok((range, parts))
            }
            Selector::ListSelector { .. } => Err(DomTextError::MalformedSelector(
                "ListSelector is refinement-only".to_string(),
            )),
        }
    }

    fn refinement_ranges(&self, refined_by: Option<&Selector>) -> Result<Option<Vec<DomRange>>> {
        let Some(refinement) = refined_by else {
            return Ok(None);
        };
        let Selector::ListSelector { parts } = refinement else {
            return Err(DomTextError::MalformedSelector(
                "refinedBy must be a ListSelector".to_string(),
            ));
        };
        if parts.is_empty() {
            return Err(DomTextError::MalformedSelector(
                "empty refinement list".to_string(),
            ));
        }
        let mut ranges = Vec::with_capacity(parts.len());
        for part in parts {
            ranges.push(self.to_dom(part)?.0);
        }
        Ok(Some(ranges))
    }

    /// Express a range as a PathSelector
    pub fn to_selector(&self, range: &DomRange) -> Result<Selector> {
        Ok(Selector::PathSelector {
            start_path: self.point_to_position(&range.start)?.to_string(),
            end_path: self.point_to_position(&range.end)?.to_string(),
            refined_by: None,
        })
    }

    /// Express a range with externally supplied discontinuous sub-ranges.
    ///
    /// Detecting the discontinuity is the caller's business; the parts
    /// are converted in the order given.
    pub fn to_selector_refined(&self, range: &DomRange, parts: &[DomRange]) -> Result<Selector> {
        if parts.is_empty() {
            return Err(DomTextError::MalformedSelector(
                "empty refinement list".to_string(),
            ));
        }
        let mut converted = Vec::with_capacity(parts.len());
        for part in parts {
            converted.push(self.to_selector(part)?);
        }
        let Selector::PathSelector {
            start_path,
            end_path,
            ..
        } = self.to_selector(range)?
        else {
            unreachable!("to_selector produces a PathSelector");
        };
        Ok(Selector::PathSelector {
            start_path,
            end_path,
            refined_by: Some(Box::new(Selector::ListSelector { parts: converted })),
        })
    }

    /// Express a range as absolute node-text integers
    pub fn to_offset_selector(&self, range: &DomRange) -> Result<Selector> {
        Ok(Selector::OffsetSelector {
            start: self.conv.offset_of(&range.start, OffsetKind::NodeText)?,
            end: self.conv.offset_of(&range.end, OffsetKind::NodeText)?,
            refined_by: None,
        })
    }

    fn position_to_point(&self, position: &Position, is_start: bool) -> Result<DomPoint> {
        match position {
            Position::Node(path) => Ok(DomPoint::node(self.resolve(path)?)),
            Position::AfterNode(path) => Ok(DomPoint::after(self.resolve(path)?)),
            Position::Char(path, offset) => {
                let node = self.resolve(path)?;
                let d = self.conv.offsets_of(node)?;
                let span = d.text_after - d.text_before;
                if *offset > span {
                    return Err(DomTextError::OffsetOutOfRange {
                        offset: *offset,
                        len: span,
                    });
                }
                self.conv
                    .point_at_with_hint(d.text_before + offset, OffsetKind::Text, is_start)
            }
        }
    }

    fn point_to_position(&self, point: &DomPoint) -> Result<Position> {
        let node = self.doc.node(point.node)?;
        let d = self.conv.offsets_of(point.node)?;
        let after = usize::from(point.after);

        if let Some(t) = point.text_offset {
            // Subtree-scoped by construction: the node's own text starts
            // its subtree span
            return Ok(Position::Char(
                xpath::path_of(self.doc, point.node)?,
                t + after,
            ));
        }
        if let Some(t) = point.tail_offset {
            return self.char_in_parent(point.node, d.text_after + t + after);
        }
        if node.is_comment() {
            // Comments have no path; both boundaries are zero-width in
            // text space, so a parent char position is equivalent.
            return self.char_in_parent(point.node, d.text_after);
        }
        let path = xpath::path_of(self.doc, point.node)?;
        Ok(if point.after {
            Position::AfterNode(path)
        } else {
            Position::Node(path)
        })
    }

    fn char_in_parent(&self, node: NodeId, abs: usize) -> Result<Position> {
        let parent = self
            .doc
            .parent_of(node)
            .ok_or(DomTextError::StaleNode(node))?;
        let pd = self.conv.offsets_of(parent)?;
        Ok(Position::Char(
            xpath::path_of(self.doc, parent)?,
            abs - pd.text_before,
        ))
    }
}
