//! String interning pool
//!
//! Deduplicated storage for tag names and class tokens. Node text and
//! tails are owned by the nodes themselves (they are rarely repeated);
//! interning only pays off for the small closed vocabulary of names.
//!
//! Uses hash-based lookup to avoid storing duplicate string data.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// Entry for one interned string: (offset_in_pool_data, length)
#[derive(Debug, Clone, Copy)]
struct StringEntry(u32, u16);

/// String interning pool
///
/// Memory layout:
/// - `entries`: (offset, len) for each interned string ID
/// - `data`: one shared buffer holding the string bytes
/// - `hash_index`: hash -> list of IDs (handles rare collisions)
#[derive(Debug, Default)]
pub struct StringPool {
    /// Entries indexed by string ID
    entries: Vec<StringEntry>,
    /// Buffer for string bytes
    data: Vec<u8>,
    /// Hash of string content -> list of IDs with that hash
    hash_index: HashMap<u64, Vec<u32>>,
}

impl StringPool {
    /// Create a new empty string pool
    pub fn new() -> Self {
        let mut pool = StringPool {
            entries: Vec::with_capacity(64),
            data: Vec::with_capacity(1024),
            hash_index: HashMap::new(),
        };
        // Entry 0 is reserved for "no string"
        pool.entries.push(StringEntry(0, 0));
        pool
    }

    /// Compute hash of a string
    #[inline]
    fn compute_hash(s: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        s.hash(&mut hasher);
        hasher.finish()
    }

    /// Intern a string, returning its ID (deduplicated)
    pub fn intern(&mut self, s: &str) -> u32 {
        if s.is_empty() {
            return 0;
        }

        let hash = Self::compute_hash(s);

        if let Some(ids) = self.hash_index.get(&hash) {
            for &id in ids {
                if self.get(id) == Some(s) {
                    return id;
                }
            }
        }

        let offset = self.data.len() as u32;
        let len = s.len().min(u16::MAX as usize) as u16;
        self.data.extend_from_slice(s.as_bytes());

        let id = self.entries.len() as u32;
        self.entries.push(StringEntry(offset, len));
        self.hash_index.entry(hash).or_default().push(id);

        id
    }

    /// Get a string by ID
    pub fn get(&self, id: u32) -> Option<&str> {
        if id == 0 {
            return Some("");
        }
        let StringEntry(offset, len) = *self.entries.get(id as usize)?;
        let start = offset as usize;
        let end = start + len as usize;
        if end <= self.data.len() {
            std::str::from_utf8(&self.data[start..end]).ok()
        } else {
            None
        }
    }

    /// Get the number of unique strings stored
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the pool is empty
    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1 // Entry 0 is reserved
    }
}
