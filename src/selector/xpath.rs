//! Compact location paths for selector positions
//!
//! Selectors address nodes with absolute child paths in a small XPath
//! subset: `/step/step/...` where a step is a tag name or `*`, optionally
//! followed by a 1-based positional predicate `[k]`. That is exactly the
//! shape the generator emits, so every produced path parses back.

use crate::dom::{Document, NodeId, NodeKind};
use crate::error::{DomTextError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PathStep {
    /// Tag name to match; `None` is the `*` wildcard
    name: Option<String>,
    /// 1-based position among the name-matching siblings
    index: Option<usize>,
}

/// A parsed absolute location path
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CompiledPath {
    steps: Vec<PathStep>,
}

pub(crate) fn compile(path: &str) -> Result<CompiledPath> {
    let rest = path
        .strip_prefix('/')
        .ok_or_else(|| DomTextError::MalformedSelector(format!("path must be absolute: {path}")))?;
    if rest.is_empty() {
        return Err(DomTextError::MalformedSelector(format!(
            "empty path: {path}"
        )));
    }
    let mut steps = Vec::new();
    for segment in rest.split('/') {
        steps.push(parse_step(segment, path)?);
    }
    Ok(CompiledPath { steps })
}

fn parse_step(segment: &str, path: &str) -> Result<PathStep> {
    let malformed = || DomTextError::MalformedSelector(format!("bad step {segment:?} in {path}"));
    let (name_part, index) = match segment.find('[') {
        Some(open) => {
            let close = segment.strip_suffix(']').ok_or_else(malformed)?;
            let digits = &close[open + 1..];
            let index: usize = digits.parse().map_err(|_| malformed())?;
            if index == 0 {
                return Err(malformed());
            }
            (&segment[..open], Some(index))
        }
        None => (segment, None),
    };
    if name_part.is_empty() || name_part.contains(']') {
        return Err(malformed());
    }
    let name = match name_part {
        "*" => None,
        n => Some(n.to_string()),
    };
    Ok(PathStep { name, index })
}

/// All nodes the path selects, starting from the document root
pub(crate) fn eval(doc: &Document, path: &CompiledPath) -> Vec<NodeId> {
    let Some(root) = doc.root_element_id() else {
        return Vec::new();
    };

    // The first step matches against the root element itself
    let first = &path.steps[0];
    let mut frontier = Vec::new();
    if step_matches(doc, root, first) && first.index.unwrap_or(1) == 1 {
        frontier.push(root);
    }

    for step in &path.steps[1..] {
        let mut next = Vec::new();
        for &node in &frontier {
            let mut position = 0;
            for child in doc.children(node) {
                if !step_matches(doc, child, step) {
                    continue;
                }
                position += 1;
                match step.index {
                    Some(k) if k != position => {}
                    _ => next.push(child),
                }
            }
        }
        frontier = next;
    }
    frontier
}

fn step_matches(doc: &Document, node: NodeId, step: &PathStep) -> bool {
    let Some(n) = doc.get_node(node) else {
        return false;
    };
    if !n.is_element() {
        return false;
    }
    match &step.name {
        None => true,
        Some(name) => doc.strings.get(n.tag_id) == Some(name.as_str()),
    }
}

/// The unique absolute path addressing `node`.
///
/// Positional predicates appear only where a tag repeats among siblings,
/// so paths stay short and still resolve to exactly one node.
pub(crate) fn path_of(doc: &Document, node: NodeId) -> Result<String> {
    let n = doc.node(node)?;
    if !n.is_element() {
        return Err(DomTextError::UnsupportedQuery(
            "only elements are addressable by path",
        ));
    }

    let mut steps = Vec::new();
    let mut current = node;
    loop {
        let cn = doc.node(current)?;
        let tag = doc.strings.get(cn.tag_id).unwrap_or("");
        let step = match cn.parent {
            Some(parent) => {
                let mut position = 0;
                let mut total = 0;
                for sibling in doc.children(parent) {
                    let s = doc.node(sibling)?;
                    if s.is_element() && s.tag_id == cn.tag_id {
                        total += 1;
                        if sibling == current {
                            position = total;
                        }
                    }
                }
                if total > 1 {
                    format!("{tag}[{position}]")
                } else {
                    tag.to_string()
                }
            }
            None => tag.to_string(),
        };
        steps.push(step);

        match cn.parent {
            Some(parent) if doc.node(parent)?.kind != NodeKind::Document => current = parent,
            _ => break,
        }
    }

    steps.reverse();
    Ok(format!("/{}", steps.join("/")))
}
