//! Min-Heap Module
//!
//! Array-backed binary min-heap with a reverse index from data to position.
//! Used as the expiration queue: priority is the expiry timestamp, data is the key.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

// == Heap Node ==
/// A heap element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapNode<T> {
    pub priority: u64,
    pub data: T,
}

// == Min Heap ==
/// Priority queue with O(log n) removal and priority update of arbitrary data.
///
/// Each data item appears at most once. Order among equal priorities is unspecified.
#[derive(Debug, Clone)]
pub struct MinHeap<T> {
    nodes: Vec<HeapNode<T>>,
    index: HashMap<T, usize>,
}

impl<T> Default for MinHeap<T> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Eq + Hash + Clone> MinHeap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    // == Insert ==
    /// Adds `data` with `priority`. Data already in the heap has its priority updated instead.
    pub fn insert(&mut self, priority: u64, data: T) {
        if self.update_priority(&data, priority) {
            return;
        }
        let pos = self.nodes.len();
        self.index.insert(data.clone(), pos);
        self.nodes.push(HeapNode { priority, data });
        self.sift_up(pos);
    }

    // == Peek ==
    /// Returns the minimum-priority node without removing it.
    pub fn peek(&self) -> Option<&HeapNode<T>> {
        self.nodes.first()
    }

    // == Extract Min ==
    /// Removes and returns the minimum-priority node.
    pub fn extract_min(&mut self) -> Option<HeapNode<T>> {
        self.remove_at(0)
    }

    // == Remove ==
    /// Removes `data` wherever it sits. Returns None for unknown data.
    pub fn remove<Q>(&mut self, data: &Q) -> Option<HeapNode<T>>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let pos = *self.index.get(data)?;
        self.remove_at(pos)
    }

    // == Update Priority ==
    /// Changes the priority of `data` in place. Returns false if `data` is not queued.
    pub fn update_priority<Q>(&mut self, data: &Q, priority: u64) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(&pos) = self.index.get(data) else {
            return false;
        };
        let old = self.nodes[pos].priority;
        self.nodes[pos].priority = priority;
        if priority < old {
            self.sift_up(pos);
        } else if priority > old {
            self.sift_down(pos);
        }
        true
    }

    pub fn has<Q>(&self, data: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(data)
    }

    /// Priority currently attached to `data`.
    pub fn priority_of<Q>(&self, data: &Q) -> Option<u64>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.get(data).map(|&pos| self.nodes[pos].priority)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.index.clear();
    }

    fn remove_at(&mut self, pos: usize) -> Option<HeapNode<T>> {
        if pos >= self.nodes.len() {
            return None;
        }
        let last = self.nodes.len() - 1;
        self.swap(pos, last);
        let node = self.nodes.pop()?;
        self.index.remove(&node.data);

        if pos < self.nodes.len() {
            // The moved element may belong above or below its new slot.
            if pos > 0 && self.nodes[pos].priority < self.nodes[(pos - 1) / 2].priority {
                self.sift_up(pos);
            } else {
                self.sift_down(pos);
            }
        }
        Some(node)
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.nodes[pos].priority >= self.nodes[parent].priority {
                break;
            }
            self.swap(pos, parent);
            pos = parent;
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        let len = self.nodes.len();
        loop {
            let left = 2 * pos + 1;
            let right = left + 1;
            let mut smallest = pos;
            if left < len && self.nodes[left].priority < self.nodes[smallest].priority {
                smallest = left;
            }
            if right < len && self.nodes[right].priority < self.nodes[smallest].priority {
                smallest = right;
            }
            if smallest == pos {
                break;
            }
            self.swap(pos, smallest);
            pos = smallest;
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.nodes.swap(a, b);
        if let Some(slot) = self.index.get_mut(&self.nodes[a].data) {
            *slot = a;
        }
        if let Some(slot) = self.index.get_mut(&self.nodes[b].data) {
            *slot = b;
        }
    }
}
