//! Path-selector position grammar
//!
//! `node(<path>)` | `after-node(<path>)` | `char(<path>, <offset>)`

use std::fmt;

use crate::error::{DomTextError, Result};

/// One side of a PathSelector
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Position {
    /// A node's opening boundary
    Node(String),
    /// A node's closing boundary
    AfterNode(String),
    /// Subtree-scoped text-kind character offset below a node
    Char(String, usize),
}

impl Position {
    pub(crate) fn parse(input: &str) -> Result<Position> {
        let s = input.trim();
        let malformed = || DomTextError::MalformedSelector(input.to_string());

        if let Some(inner) = enclosed(s, "after-node(") {
            return Ok(Position::AfterNode(inner.trim().to_string()));
        }
        if let Some(inner) = enclosed(s, "node(") {
            return Ok(Position::Node(inner.trim().to_string()));
        }
        if let Some(inner) = enclosed(s, "char(") {
            let comma = inner.rfind(',').ok_or_else(malformed)?;
            let path = inner[..comma].trim();
            let offset: usize = inner[comma + 1..].trim().parse().map_err(|_| malformed())?;
            if path.is_empty() {
                return Err(malformed());
            }
            return Ok(Position::Char(path.to_string(), offset));
        }
        Err(malformed())
    }
}

fn enclosed<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    s.strip_prefix(prefix)?.strip_suffix(')')
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Node(path) => write!(f, "node({path})"),
            Position::AfterNode(path) => write!(f, "after-node({path})"),
            Position::Char(path, offset) => write!(f, "char({path},{offset})"),
        }
    }
}
