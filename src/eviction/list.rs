//! Key List Module
//!
//! Slab-backed doubly linked list of keys with a key → node map.
//! Front = most recently pushed/moved, back = oldest.

use std::collections::HashMap;

#[derive(Debug, Clone)]
struct Node {
    key: String,
    prev: Option<usize>,
    next: Option<usize>,
}

// == Key List ==
/// Ordered set of keys with O(1) push, move-to-front, removal and end lookups.
#[derive(Debug, Clone, Default)]
pub struct KeyList {
    nodes: Vec<Node>,
    free: Vec<usize>,
    map: HashMap<String, usize>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl KeyList {
    pub fn new() -> Self {
        Self::default()
    }

    // == Push Front ==
    /// Inserts `key` at the front. Returns false if it is already present.
    pub fn push_front(&mut self, key: &str) -> bool {
        if self.map.contains_key(key) {
            return false;
        }
        let node = Node {
            key: key.to_string(),
            prev: None,
            next: None,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        };
        self.link_front(idx);
        self.map.insert(key.to_string(), idx);
        true
    }

    // == Move To Front ==
    /// Moves an existing key to the front. Returns false for unknown keys.
    pub fn move_to_front(&mut self, key: &str) -> bool {
        let Some(&idx) = self.map.get(key) else {
            return false;
        };
        if self.head != Some(idx) {
            self.unlink(idx);
            self.link_front(idx);
        }
        true
    }

    // == Remove ==
    /// Unlinks `key`. Returns false for unknown keys.
    pub fn remove(&mut self, key: &str) -> bool {
        let Some(idx) = self.map.remove(key) else {
            return false;
        };
        self.unlink(idx);
        self.nodes[idx].key.clear();
        self.free.push(idx);
        true
    }

    pub fn front(&self) -> Option<&str> {
        self.head.map(|idx| self.nodes[idx].key.as_str())
    }

    pub fn back(&self) -> Option<&str> {
        self.tail.map(|idx| self.nodes[idx].key.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.map.clear();
        self.head = None;
        self.tail = None;
    }

    /// Keys from front (newest) to back (oldest).
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            let idx = cursor?;
            cursor = self.nodes[idx].next;
            Some(self.nodes[idx].key.as_str())
        })
    }

    fn link_front(&mut self, idx: usize) {
        self.nodes[idx].prev = None;
        self.nodes[idx].next = self.head;
        match self.head {
            Some(head) => self.nodes[head].prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.tail = prev,
        }
        self.nodes[idx].prev = None;
        self.nodes[idx].next = None;
    }
}
