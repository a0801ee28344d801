//! Linked strings - text with per-character source back-references
//!
//! A `LinkedString` pairs an immutable string with two parallel arrays
//! giving, for every character, the start and end offsets of the source
//! region it came from (node-text offsets from the converter). All
//! transformations recompute content and both arrays in lock-step, so
//! `char count == start_refs.len() == end_refs.len()` always holds.

use std::ops::Range;

use crate::error::{DomTextError, Result};

/// Immutable string whose characters remember where they came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedString {
    content: String,
    start_refs: Vec<usize>,
    end_refs: Vec<usize>,
}

impl LinkedString {
    /// Wrap content with its back-reference arrays.
    ///
    /// Panics if the arrays do not match the character count; mismatched
    /// inputs are a construction bug, not a runtime condition.
    pub fn new(content: String, start_refs: Vec<usize>, end_refs: Vec<usize>) -> Self {
        let chars = content.chars().count();
        assert_eq!(chars, start_refs.len(), "start_refs length mismatch");
        assert_eq!(chars, end_refs.len(), "end_refs length mismatch");
        LinkedString {
            content,
            start_refs,
            end_refs,
        }
    }

    pub fn empty() -> Self {
        LinkedString {
            content: String::new(),
            start_refs: Vec::new(),
            end_refs: Vec::new(),
        }
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.start_refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.start_refs.is_empty()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn start_refs(&self) -> &[usize] {
        &self.start_refs
    }

    pub fn end_refs(&self) -> &[usize] {
        &self.end_refs
    }

    pub fn char_at(&self, index: usize) -> Option<char> {
        self.content.chars().nth(index)
    }

    /// Source span covered by the character range `[i, j)`
    pub fn refs_of(&self, range: Range<usize>) -> Result<(usize, usize)> {
        if range.start >= range.end || range.end > self.len() {
            return Err(DomTextError::OffsetOutOfRange {
                offset: range.end,
                len: self.len(),
            });
        }
        Ok((self.start_refs[range.start], self.end_refs[range.end - 1]))
    }

    /// Character-indexed sub-string, refs carried along
    pub fn slice(&self, range: Range<usize>) -> Result<LinkedString> {
        if range.start > range.end || range.end > self.len() {
            return Err(DomTextError::OffsetOutOfRange {
                offset: range.end,
                len: self.len(),
            });
        }
        let content: String = self
            .content
            .chars()
            .skip(range.start)
            .take(range.end - range.start)
            .collect();
        Ok(LinkedString {
            content,
            start_refs: self.start_refs[range.clone()].to_vec(),
            end_refs: self.end_refs[range].to_vec(),
        })
    }

    /// Trim leading/trailing whitespace, keeping inner refs untouched
    pub fn strip(&self) -> LinkedString {
        let mut start = 0;
        let mut end = self.len();
        let chars: Vec<char> = self.content.chars().collect();
        while start < end && chars[start].is_whitespace() {
            start += 1;
        }
        while end > start && chars[end - 1].is_whitespace() {
            end -= 1;
        }
        // Bounds were just computed, slice cannot fail
        self.slice(start..end).unwrap_or_else(|_| LinkedString::empty())
    }

    pub fn to_lowercase(&self) -> LinkedString {
        self.map_chars(|c| c.to_lowercase().collect())
    }

    pub fn to_uppercase(&self) -> LinkedString {
        self.map_chars(|c| c.to_uppercase().collect())
    }

    // Case mapping may expand one char to several ('ß' to "SS"); every
    // produced char inherits the source char's ref pair.
    fn map_chars<F: Fn(char) -> Vec<char>>(&self, f: F) -> LinkedString {
        let mut content = String::with_capacity(self.content.len());
        let mut start_refs = Vec::with_capacity(self.start_refs.len());
        let mut end_refs = Vec::with_capacity(self.end_refs.len());
        for (i, c) in self.content.chars().enumerate() {
            for mapped in f(c) {
                content.push(mapped);
                start_refs.push(self.start_refs[i]);
                end_refs.push(self.end_refs[i]);
            }
        }
        LinkedString {
            content,
            start_refs,
            end_refs,
        }
    }

    /// Collapse every whitespace run to a single space carrying the run's
    /// first character's refs
    pub fn normalize_spaces(&self) -> LinkedString {
        let mut content = String::with_capacity(self.content.len());
        let mut start_refs = Vec::with_capacity(self.start_refs.len());
        let mut end_refs = Vec::with_capacity(self.end_refs.len());
        let mut in_run = false;
        for (i, c) in self.content.chars().enumerate() {
            if c.is_whitespace() {
                if !in_run {
                    content.push(' ');
                    start_refs.push(self.start_refs[i]);
                    end_refs.push(self.end_refs[i]);
                    in_run = true;
                }
            } else {
                content.push(c);
                start_refs.push(self.start_refs[i]);
                end_refs.push(self.end_refs[i]);
                in_run = false;
            }
        }
        LinkedString {
            content,
            start_refs,
            end_refs,
        }
    }

    /// Simultaneous substitution at sorted, non-overlapping character
    /// ranges. Every inserted character carries the replaced range's
    /// source bounds, so matching any of them recovers the whole region.
    pub fn replace_at(&self, edits: &[(Range<usize>, &str)]) -> Result<LinkedString> {
        let mut prev_end = 0;
        for (range, _) in edits {
            if range.start < prev_end || range.start >= range.end {
                return Err(DomTextError::UnsupportedQuery(
                    "replacement ranges must be sorted and non-overlapping",
                ));
            }
            if range.end > self.len() {
                return Err(DomTextError::OffsetOutOfRange {
                    offset: range.end,
                    len: self.len(),
                });
            }
            prev_end = range.end;
        }

        let chars: Vec<char> = self.content.chars().collect();
        let mut content = String::with_capacity(self.content.len());
        let mut start_refs = Vec::with_capacity(self.start_refs.len());
        let mut end_refs = Vec::with_capacity(self.end_refs.len());
        let mut cursor = 0;
        for (range, text) in edits {
            for i in cursor..range.start {
                content.push(chars[i]);
                start_refs.push(self.start_refs[i]);
                end_refs.push(self.end_refs[i]);
            }
            let s = self.start_refs[range.start];
            let e = self.end_refs[range.end - 1];
            for c in text.chars() {
                content.push(c);
                start_refs.push(s);
                end_refs.push(e);
            }
            cursor = range.end;
        }
        for i in cursor..chars.len() {
            content.push(chars[i]);
            start_refs.push(self.start_refs[i]);
            end_refs.push(self.end_refs[i]);
        }
        Ok(LinkedString {
            content,
            start_refs,
            end_refs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> LinkedString {
        // "ab cd" with synthetic refs 10..15 / 11..16
        LinkedString::new(
            "ab cd".to_string(),
            vec![10, 11, 12, 13, 14],
            vec![11, 12, 13, 14, 15],
        )
    }

    fn invariant(s: &LinkedString) {
        assert_eq!(s.content().chars().count(), s.start_refs().len());
        assert_eq!(s.start_refs().len(), s.end_refs().len());
    }

    #[test]
    fn test_slice_keeps_refs() {
        let s = sample();
        let sub = s.slice(1..4).unwrap();
        assert_eq!(sub.content(), "b c");
        assert_eq!(sub.start_refs(), &[11, 12, 13]);
        assert_eq!(sub.end_refs(), &[12, 13, 14]);
        invariant(&sub);
    }

    #[test]
    fn test_slice_out_of_range() {
        let s = sample();
        assert!(matches!(
            s.slice(2..9),
            Err(DomTextError::OffsetOutOfRange { offset: 9, len: 5 })
        ));
    }

    #[test]
    fn test_strip() {
        let s = LinkedString::new(
            "  hi \n".to_string(),
            vec![0, 1, 2, 3, 4, 5],
            vec![1, 2, 3, 4, 5, 6],
        );
        let t = s.strip();
        assert_eq!(t.content(), "hi");
        assert_eq!(t.start_refs(), &[2, 3]);
        invariant(&t);
    }

    #[test]
    fn test_case_expansion_keeps_invariant() {
        let s = LinkedString::new("straße".to_string(), vec![0, 1, 2, 3, 4, 5], vec![1, 2, 3, 4, 5, 6]);
        let up = s.to_uppercase();
        assert_eq!(up.content(), "STRASSE");
        // Both chars of the expanded "SS" point back at 'ß'
        assert_eq!(up.start_refs()[4], 4);
        assert_eq!(up.start_refs()[5], 4);
        invariant(&up);
    }

    #[test]
    fn test_normalize_spaces() {
        let s = LinkedString::new(
            "a \t\nb".to_string(),
            vec![0, 1, 2, 3, 4],
            vec![1, 2, 3, 4, 5],
        );
        let n = s.normalize_spaces();
        assert_eq!(n.content(), "a b");
        // The collapsed space keeps the run's first refs
        assert_eq!(n.start_refs(), &[0, 1, 4]);
        assert_eq!(n.end_refs(), &[1, 2, 5]);
        invariant(&n);
    }

    #[test]
    fn test_replace_at_shared_refs() {
        let s = sample();
        let r = s.replace_at(&[(0..2, "X"), (3..5, "YZW")]).unwrap();
        assert_eq!(r.content(), "X YZW");
        assert_eq!(r.start_refs(), &[10, 12, 13, 13, 13]);
        assert_eq!(r.end_refs(), &[12, 13, 15, 15, 15]);
        invariant(&r);
    }

    #[test]
    fn test_replace_at_rejects_overlap() {
        let s = sample();
        assert!(matches!(
            s.replace_at(&[(0..3, "X"), (2..5, "Y")]),
            Err(DomTextError::UnsupportedQuery(_))
        ));
    }

    #[test]
    fn test_refs_of() {
        let s = sample();
        assert_eq!(s.refs_of(1..4).unwrap(), (11, 14));
        assert!(s.refs_of(3..3).is_err());
    }
}
