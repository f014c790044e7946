//! Per-session record of what was last pushed to each tray element.
//!
//! A table answers one question: does this value tuple differ from the one
//! last rendered for the key? A `true` answer also stores the new tuple, so
//! the caller must apply the mutation whenever it gets one. Tables are plain
//! maps with no locking of their own; the controller only touches them while
//! holding its session lock.

use std::collections::HashMap;

use crate::render::ElementKey;

/// One positional element of a scalar tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffValue {
    Str(String),
    Bool(bool),
}

impl From<&str> for DiffValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for DiffValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<bool> for DiffValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Scalar tuples compared with structural, ordered, typed equality.
#[derive(Debug, Default)]
pub struct ScalarDiff {
    prev: HashMap<ElementKey, Vec<DiffValue>>,
}

impl ScalarDiff {
    pub fn dirty(&mut self, key: ElementKey, vals: Vec<DiffValue>) -> bool {
        if self.prev.get(&key) == Some(&vals) {
            return false;
        }

        self.prev.insert(key, vals);
        true
    }

    pub fn contains(&self, key: ElementKey) -> bool {
        self.prev.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.prev.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prev.is_empty()
    }
}

/// Binary tuples compared position by position on exact bytes.
#[derive(Debug, Default)]
pub struct ByteDiff {
    prev: HashMap<ElementKey, Vec<Vec<u8>>>,
}

impl ByteDiff {
    pub fn dirty(&mut self, key: ElementKey, vals: &[&[u8]]) -> bool {
        let unchanged = match self.prev.get(&key) {
            Some(prev) => {
                prev.len() == vals.len()
                    && prev
                        .iter()
                        .zip(vals)
                        .all(|(old, new)| old.as_slice() == *new)
            }
            None => false,
        };
        if unchanged {
            return false;
        }

        self.prev
            .insert(key, vals.iter().map(|bytes| bytes.to_vec()).collect());
        true
    }

    pub fn contains(&self, key: ElementKey) -> bool {
        self.prev.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.prev.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prev.is_empty()
    }
}

/// Both diff tables of one session.
#[derive(Debug, Default)]
pub struct DiffCache {
    pub scalars: ScalarDiff,
    pub bytes: ByteDiff,
}

impl DiffCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `key` has been rendered at least once in this session.
    pub fn is_tracked(&self, key: ElementKey) -> bool {
        self.scalars.contains(key) || self.bytes.contains(key)
    }

    pub fn tracked_count(&self) -> usize {
        self.scalars.len() + self.bytes.len()
    }
}
