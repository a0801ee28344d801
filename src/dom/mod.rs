//! DOM module - arena-based tree document
//!
//! Implements the tree snapshot the addressing engine runs over:
//! - Arena allocation for nodes
//! - NodeId (u32) indices for cache-friendly traversal
//! - String interning for tag names and class tokens
//! - lxml-style text/tail content streams

pub mod document;
pub mod node;
mod reader;
pub mod strings;

pub use document::Document;
pub use node::{Node, NodeId, NodeKind};
pub use strings::StringPool;
