//! Error types
//!
//! Every failure is deterministic for the same tree and inputs: either a
//! caller/configuration error (fail fast, never retried) or an
//! out-of-range query. Data-quality conditions such as unaligned ranges
//! are reported as match-issue diagnostics instead, not as errors.

use thiserror::Error;

use crate::dom::NodeId;

/// All errors produced by this crate
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomTextError {
    /// The query needs information the caller did not supply
    #[error("unsupported query: {0}")]
    UnsupportedQuery(&'static str),

    /// An offset beyond the addressed length
    #[error("offset {offset} out of range (length {len})")]
    OffsetOutOfRange { offset: usize, len: usize },

    /// A node id that does not belong to this document snapshot
    #[error("stale or foreign node id {0}")]
    StaleNode(NodeId),

    /// A selector or position string the grammar rejects
    #[error("malformed selector: {0}")]
    MalformedSelector(String),

    /// A selector path matching more than one node
    #[error("ambiguous path (multiple matches): {0}")]
    AmbiguousPath(String),

    /// A selector path matching no node
    #[error("no node matches path: {0}")]
    NodeNotFound(String),

    /// The same name registered as both a tag rule and a class rule
    #[error("conflicting rule for name: {0}")]
    RuleConflict(String),
}

pub type Result<T> = std::result::Result<T, DomTextError>;
