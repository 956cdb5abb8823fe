use crate::error::{HeapError, Result};
use log::{debug, trace};
use slotmap::{SecondaryMap, SlotMap, new_key_type};
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of unique heap identities, so handles from one heap are rejected by another
static NEXT_HEAP_ID: AtomicU64 = AtomicU64::new(0);

fn next_heap_id() -> u64 {
    NEXT_HEAP_ID.fetch_add(1, Ordering::Relaxed)
}

new_key_type! {
    /// A versioned key into the node arena
    struct NodeId;
}

/// A Fibonacci heap implementing a mergeable min-priority queue
///
/// Nodes live in an arena owned by the heap; tree and ring links are slotmap keys.
/// Among equal keys the extraction order is deterministic: during consolidation the root
/// already waiting in the degree table stays on top, and the new root ring is scanned in
/// ascending degree order when picking the minimum.
#[derive(Debug)]
pub struct FibHeap<K: Ord, V> {
    /// Storage for every node of the heap
    nodes: SlotMap<NodeId, Node<K, V>>,

    /// The root with the smallest key
    min: Option<NodeId>,

    /// The number of nodes in the heap
    len: usize,

    /// Identity stamped into every handle this heap gives out
    id: u64,
}

/// A non-owning reference to a node, returned by [`FibHeap::insert`]
///
/// A handle stays valid until its node is extracted or deleted. Stale handles, and handles
/// given out by another heap, are reported as [`HeapError::InvalidHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    heap: u64,
    key: NodeId,
}

/// Translates handles of a heap consumed by [`FibHeap::merge`] into handles of the merged heap
#[derive(Debug, Clone)]
pub struct HandleMap {
    from: u64,
    to: u64,
    keys: SecondaryMap<NodeId, NodeId>,
}

impl HandleMap {
    /// The handle that now refers to the same node, or `None` if `handle` was not issued by
    /// the merged-in heap or its node was already gone before the merge
    pub fn translate(&self, handle: Handle) -> Option<Handle> {
        if handle.heap != self.from {
            return None;
        }
        self.keys.get(handle.key).map(|&key| Handle { heap: self.to, key })
    }
}

impl<K: Ord, V> FibHeap<K, V> {
    /// Create an empty heap
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty heap with room for `capacity` nodes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: SlotMap::with_capacity_and_key(capacity),
            min: None,
            len: 0,
            id: next_heap_id(),
        }
    }

    /// The number of nodes the heap can hold without reallocating
    pub fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    /// Reserve room for at least `additional` more nodes
    pub fn reserve(&mut self, additional: usize) {
        self.nodes.reserve(additional);
    }

    /// Clear the heap, dropping all the nodes
    ///
    /// Every outstanding handle becomes invalid.
    pub fn clear(&mut self) {
        debug!("clearing heap {} of {} nodes", self.id, self.len);
        *self = Self::new();
    }

    /// Check if the heap is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Return the number of nodes in the heap
    pub fn len(&self) -> usize {
        self.len
    }

    /// Return the minimum key and its value, if the heap is not empty
    pub fn peek(&self) -> Option<(&K, &V)> {
        self.min.map(|min| {
            let node = &self.nodes[min];
            (&node.key, &node.value)
        })
    }

    /// Return the minimum key and its value
    ///
    /// # Errors
    /// [`HeapError::EmptyHeap`] if the heap holds no nodes.
    pub fn find_min(&self) -> Result<(&K, &V)> {
        self.peek().ok_or(HeapError::EmptyHeap)
    }

    /// Return the key and value of the node behind `handle`
    pub fn get(&self, handle: Handle) -> Result<(&K, &V)> {
        let node = &self.nodes[self.resolve(handle)?];
        Ok((&node.key, &node.value))
    }

    /// Check whether `handle` refers to a node still held by this heap
    pub fn contains(&self, handle: Handle) -> bool {
        self.resolve(handle).is_ok()
    }

    /// Insert a new node in the heap, returning a handle to it
    pub fn insert(&mut self, key: K, value: V) -> Handle {
        let id = self
            .nodes
            .insert_with_key(|id| Node::new(key, value, id));
        self.add_root(id);
        self.len += 1;
        Handle {
            heap: self.id,
            key: id,
        }
    }

    /// Remove and return the minimum key and its value
    ///
    /// # Errors
    /// [`HeapError::EmptyHeap`] if the heap holds no nodes.
    pub fn extract_min(&mut self) -> Result<(K, V)> {
        let min = self.min.ok_or(HeapError::EmptyHeap)?;
        let node = self.remove_root(min);
        Ok((node.key, node.value))
    }

    /// Lower the key of the node behind `handle` to `new_key`
    ///
    /// # Errors
    /// [`HeapError::InvalidHandle`] if the node is no longer in this heap, and
    /// [`HeapError::InvalidDecrease`] if `new_key` is greater than the current key. The heap
    /// is left untouched in both cases.
    pub fn decrease_key(&mut self, handle: Handle, new_key: K) -> Result<()> {
        let x = self.resolve(handle)?;
        if new_key > self.nodes[x].key {
            return Err(HeapError::InvalidDecrease);
        }
        self.nodes[x].key = new_key;

        let parent = self.nodes[x].parent;
        if let Some(parent) = parent {
            if self.nodes[x].key < self.nodes[parent].key {
                self.cut(x, parent);
                self.cascading_cut(parent);
            }
        }
        if let Some(min) = self.min {
            if self.nodes[x].key < self.nodes[min].key {
                self.min = Some(x);
            }
        }
        Ok(())
    }

    /// Remove the node behind `handle`, returning its key and value
    ///
    /// # Errors
    /// [`HeapError::InvalidHandle`] if the node is no longer in this heap.
    pub fn delete(&mut self, handle: Handle) -> Result<(K, V)> {
        let x = self.resolve(handle)?;
        let parent = self.nodes[x].parent;
        if let Some(parent) = parent {
            self.cut(x, parent);
            self.cascading_cut(parent);
        }
        let node = self.remove_root(x);
        Ok((node.key, node.value))
    }

    /// Move every node of `other` into this heap
    ///
    /// Handles of this heap stay valid; handles of `other` must go through the returned
    /// [`HandleMap`].
    pub fn merge(&mut self, other: Self) -> HandleMap {
        let FibHeap {
            nodes,
            min,
            len,
            id,
        } = other;

        self.nodes.reserve(nodes.len());
        let mut keys = SecondaryMap::with_capacity(nodes.len());
        for (old, node) in nodes {
            keys.insert(old, self.nodes.insert(node));
        }
        for &new in keys.values() {
            self.nodes[new].relabel(&keys);
        }
        if let Some(other_min) = min {
            self.add_root(keys[other_min]);
        }
        self.len += len;

        debug!("merged heap {id} of {len} nodes into heap {}", self.id);
        HandleMap {
            from: id,
            to: self.id,
            keys,
        }
    }

    /// Consume the heap, yielding its entries in ascending key order
    pub fn into_sorted_iter(self) -> IntoSorted<K, V> {
        IntoSorted { heap: self }
    }

    fn resolve(&self, handle: Handle) -> Result<NodeId> {
        if handle.heap == self.id && self.nodes.contains_key(handle.key) {
            Ok(handle.key)
        } else {
            Err(HeapError::InvalidHandle)
        }
    }

    /// Iterate over the ring containing `start`, beginning with `start`
    fn ring(&self, start: NodeId) -> RingIter<'_, K, V> {
        RingIter {
            nodes: &self.nodes,
            start,
            curr: Some(start),
        }
    }

    /// Splice the ring containing `b` into the ring containing `a`, right after `a`
    fn splice(&mut self, a: NodeId, b: NodeId) {
        let a_right = self.nodes[a].right;
        let b_left = self.nodes[b].left;
        self.nodes[a].right = b;
        self.nodes[b].left = a;
        self.nodes[b_left].right = a_right;
        self.nodes[a_right].left = b_left;
    }

    /// Take `x` out of its ring, leaving it a singleton
    fn unlink(&mut self, x: NodeId) {
        let (left, right) = (self.nodes[x].left, self.nodes[x].right);
        self.nodes[left].right = right;
        self.nodes[right].left = left;
        self.nodes[x].left = x;
        self.nodes[x].right = x;
    }

    /// Splice the ring containing `x` into the root ring; `x` must be the smallest of its ring
    fn add_root(&mut self, x: NodeId) {
        match self.min {
            None => self.min = Some(x),
            Some(min) => {
                self.splice(min, x);
                if self.nodes[x].key < self.nodes[min].key {
                    self.min = Some(x);
                }
            }
        }
    }

    /// Remove the root `x` from the heap, promoting its children to roots
    fn remove_root(&mut self, x: NodeId) -> Node<K, V> {
        if let Some(child) = self.nodes[x].child.take() {
            let mut curr = child;
            loop {
                let node = &mut self.nodes[curr];
                node.parent = None;
                node.is_marked = false;
                curr = node.right;
                if curr == child {
                    break;
                }
            }
            self.splice(x, child);
            self.nodes[x].degree = 0;
        }

        self.len -= 1;
        let right = self.nodes[x].right;
        if right == x {
            self.min = None;
        } else {
            self.unlink(x);
            if self.min == Some(x) {
                self.min = Some(right);
                self.consolidate();
            }
        }
        match self.nodes.remove(x) {
            Some(node) => node,
            None => unreachable!("root {x:?} is not in the arena"),
        }
    }

    /// Link roots of equal degree until every root has a distinct degree, then rebuild the
    /// root ring and recompute the minimum
    fn consolidate(&mut self) {
        let Some(start) = self.min else {
            return;
        };
        let roots: Vec<NodeId> = self.ring(start).collect();

        // degrees up to floor(log2(len)) + 1
        let max_degree = (usize::BITS - self.len.leading_zeros()) as usize + 1;
        let mut table: Vec<Option<NodeId>> = vec![None; max_degree + 1];

        for &root in &roots {
            let mut x = root;
            let mut degree = self.nodes[x].degree;
            loop {
                if degree >= table.len() {
                    table.resize(degree + 1, None);
                }
                let Some(y) = table[degree].take() else {
                    break;
                };
                // on equal keys the root already in the table stays on top
                let (parent, child) = if self.nodes[y].key <= self.nodes[x].key {
                    (y, x)
                } else {
                    (x, y)
                };
                self.link(child, parent);
                x = parent;
                degree += 1;
            }
            table[degree] = Some(x);
        }

        self.min = None;
        let mut survivors = 0;
        for x in table.into_iter().flatten() {
            self.nodes[x].left = x;
            self.nodes[x].right = x;
            self.add_root(x);
            survivors += 1;
        }
        trace!(
            "consolidated {} roots into {survivors} ({} nodes)",
            roots.len(),
            self.len
        );
    }

    /// Make the root `child` a child of the root `parent`
    fn link(&mut self, child: NodeId, parent: NodeId) {
        self.unlink(child);
        let node = &mut self.nodes[child];
        node.parent = Some(parent);
        node.is_marked = false;

        let first_child = self.nodes[parent].child;
        match first_child {
            None => self.nodes[parent].child = Some(child),
            Some(first) => self.splice(first, child),
        }
        self.nodes[parent].degree += 1;
    }

    /// Detach `x` from `parent` and make it a root
    fn cut(&mut self, x: NodeId, parent: NodeId) {
        let right = self.nodes[x].right;
        if right == x {
            self.nodes[parent].child = None;
        } else {
            if self.nodes[parent].child == Some(x) {
                self.nodes[parent].child = Some(right);
            }
            self.unlink(x);
        }
        self.nodes[parent].degree -= 1;

        let node = &mut self.nodes[x];
        node.parent = None;
        node.is_marked = false;
        self.add_root(x);
    }

    /// Mark `x` for its first lost child, cut it for the second, and continue upwards
    fn cascading_cut(&mut self, mut x: NodeId) {
        loop {
            let Some(parent) = self.nodes[x].parent else {
                return;
            };
            if !self.nodes[x].is_marked {
                self.nodes[x].is_marked = true;
                return;
            }
            trace!("cascading cut of node {x:?} from {parent:?}");
            self.cut(x, parent);
            x = parent;
        }
    }
}

#[cfg(test)]
impl<K: Ord, V> FibHeap<K, V> {
    /// Panic unless every structural invariant of the heap holds
    pub(crate) fn assert_well_formed(&self) {
        let mut reachable = 0;
        match self.min {
            None => assert_eq!(self.len, 0, "empty root ring with nonzero len"),
            Some(min) => {
                for root in self.assert_ring(min) {
                    let node = &self.nodes[root];
                    assert!(node.parent.is_none(), "root {root:?} has a parent");
                    assert!(!node.is_marked, "root {root:?} is marked");
                    assert!(self.nodes[min].key <= node.key, "min is not the smallest root");
                    reachable += self.assert_subtree(root);
                }
            }
        }
        assert_eq!(reachable, self.len, "len does not match reachable nodes");
        assert_eq!(self.nodes.len(), self.len, "unreachable nodes in the arena");
    }

    /// The key of the parent of the node behind `handle`, if it is not a root
    pub(crate) fn parent_key(&self, handle: Handle) -> Option<&K> {
        let x = self.resolve(handle).expect("live handle");
        self.nodes[x].parent.map(|p| &self.nodes[p].key)
    }

    pub(crate) fn is_marked(&self, handle: Handle) -> bool {
        let x = self.resolve(handle).expect("live handle");
        self.nodes[x].is_marked
    }

    /// The number of trees in the root ring
    pub(crate) fn root_count(&self) -> usize {
        self.min.map_or(0, |min| self.ring(min).count())
    }

    /// The degrees of the roots, in ring order starting from the minimum
    pub(crate) fn root_degrees(&self) -> Vec<usize> {
        self.min.map_or_else(Vec::new, |min| {
            self.ring(min).map(|x| self.nodes[x].degree).collect()
        })
    }

    fn assert_ring(&self, start: NodeId) -> Vec<NodeId> {
        let mut members = Vec::new();
        let mut curr = start;
        loop {
            assert!(members.len() <= self.len, "ring through {start:?} does not close");
            let right = self.nodes[curr].right;
            assert_eq!(self.nodes[right].left, curr, "left/right not inverse at {curr:?}");
            members.push(curr);
            curr = right;
            if curr == start {
                return members;
            }
        }
    }

    fn assert_subtree(&self, x: NodeId) -> usize {
        let node = &self.nodes[x];
        let Some(child) = node.child else {
            assert_eq!(node.degree, 0, "childless node {x:?} has nonzero degree");
            return 1;
        };
        let children = self.assert_ring(child);
        assert_eq!(children.len(), node.degree, "degree of {x:?} is off");

        let mut count = 1;
        for c in children {
            assert_eq!(self.nodes[c].parent, Some(x), "child {c:?} has wrong parent");
            assert!(node.key <= self.nodes[c].key, "heap order violated at {x:?} -> {c:?}");
            count += self.assert_subtree(c);
        }
        count
    }
}

impl<K: Ord, V> Default for FibHeap<K, V> {
    fn default() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            min: None,
            len: 0,
            id: next_heap_id(),
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for FibHeap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut heap = Self::new();
        heap.extend(iter);
        heap
    }
}

impl<K: Ord, V> Extend<(K, V)> for FibHeap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

/// An iterator draining a heap in ascending key order
#[derive(Debug)]
pub struct IntoSorted<K: Ord, V> {
    heap: FibHeap<K, V>,
}

impl<K: Ord, V> Iterator for IntoSorted<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.heap.extract_min().ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.heap.len(), Some(self.heap.len()))
    }
}

impl<K: Ord, V> ExactSizeIterator for IntoSorted<K, V> {}

// A node in the heap
#[derive(Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    degree: usize,
    is_marked: bool,
    parent: Option<NodeId>,
    child: Option<NodeId>,
    left: NodeId,
    right: NodeId,
}

impl<K, V> Node<K, V> {
    // a singleton ring of its own
    fn new(key: K, value: V, id: NodeId) -> Self {
        Node {
            key,
            value,
            degree: 0,
            is_marked: false,
            parent: None,
            child: None,
            left: id,
            right: id,
        }
    }

    /// Rewrite every link through `keys` after moving to another arena
    fn relabel(&mut self, keys: &SecondaryMap<NodeId, NodeId>) {
        self.parent = self.parent.map(|p| keys[p]);
        self.child = self.child.map(|c| keys[c]);
        self.left = keys[self.left];
        self.right = keys[self.right];
    }
}

// An iterator over the members of a sibling ring
struct RingIter<'a, K, V> {
    nodes: &'a SlotMap<NodeId, Node<K, V>>,
    start: NodeId,
    curr: Option<NodeId>,
}

impl<K, V> Iterator for RingIter<'_, K, V> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let curr = self.curr?;
        let next = self.nodes[curr].right;
        self.curr = (next != self.start).then_some(next);
        Some(curr)
    }
}
