//! Selectors - serializable, document-external range references
//!
//! A selector pins down a range without holding node ids, so it survives
//! serialization and re-parsing of the same document. Two forms exist:
//! `PathSelector` (location-path positions, robust against documents
//! re-parsed from the same markup) and `OffsetSelector` (absolute
//! node-text integers, compact and tree-query free). `ListSelector`
//! never stands alone; it refines another selector with an ordered list
//! of discontinuous sub-ranges.

mod convert;
mod position;
mod xpath;

pub use convert::SelectorConverter;

use serde::{Deserialize, Serialize};

/// Serializable range reference, tagged as `{"type": "..."}` in JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Selector {
    PathSelector {
        #[serde(rename = "startPath")]
        start_path: String,
        #[serde(rename = "endPath")]
        end_path: String,
        #[serde(rename = "refinedBy", skip_serializing_if = "Option::is_none", default)]
        refined_by: Option<Box<Selector>>,
    },
    OffsetSelector {
        start: usize,
        end: usize,
        #[serde(rename = "refinedBy", skip_serializing_if = "Option::is_none", default)]
        refined_by: Option<Box<Selector>>,
    },
    ListSelector {
        parts: Vec<Selector>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_json_shape() {
        let sel = Selector::PathSelector {
            start_path: "node(/a/b)".to_string(),
            end_path: "char(/a,3)".to_string(),
            refined_by: None,
        };
        let json = serde_json::to_value(&sel).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "PathSelector",
                "startPath": "node(/a/b)",
                "endPath": "char(/a,3)",
            })
        );
    }

    #[test]
    fn test_json_round_trip_with_refinement() {
        let sel = Selector::OffsetSelector {
            start: 2,
            end: 9,
            refined_by: Some(Box::new(Selector::ListSelector {
                parts: vec![
                    Selector::OffsetSelector {
                        start: 2,
                        end: 4,
                        refined_by: None,
                    },
                    Selector::OffsetSelector {
                        start: 6,
                        end: 9,
                        refined_by: None,
                    },
                ],
            })),
        };
        let json = serde_json::to_string(&sel).unwrap();
        let back: Selector = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sel);
    }
}
