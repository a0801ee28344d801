//! domtext - document addressing over markup trees
//!
//! Maps between tree positions and linear integer offsets in a parsed
//! document, and builds everything the surrounding tooling needs on top
//! of that mapping:
//!
//! - `dom`: arena-allocated document tree with interned strings and a
//!   lenient markup reader (text before children, tails after)
//! - `offset`: the offset converter, a single-pass index answering
//!   node-to-offset and offset-to-point queries in both counting schemes
//! - `point`: `DomPoint`/`DomRange`, the position vocabulary shared by
//!   all components
//! - `linked`: strings whose characters carry source back-references
//!   through slicing, case and whitespace transformations
//! - `dnm`: normalized text views (recursive and token-stream builders)
//!   with a replacement registry for substituted subtrees
//! - `selector`: serializable, document-external range references and
//!   their conversion to and from ranges
//!
//! Everything is a pure, synchronous computation over one immutable
//! document snapshot; rebuild the indexes if the tree changes.

pub mod dnm;
pub mod dom;
pub mod error;
pub mod linked;
pub mod offset;
pub mod point;
pub mod selector;

pub use dnm::{Dnm, DnmAction, DnmRules, Replacement};
pub use dom::{Document, Node, NodeId, NodeKind};
pub use error::{DomTextError, Result};
pub use linked::LinkedString;
pub use offset::{NodeOffsetData, OffsetConverter, OffsetKind};
pub use point::{DomPoint, DomRange};
pub use selector::{Selector, SelectorConverter};
