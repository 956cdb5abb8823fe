//! # Fibheap
//!
//! A Fibonacci heap: a mergeable min-priority queue with O(1) amortized `insert` and
//! `decrease_key`, and O(log n) amortized `extract_min` and `delete`.
//!
//! Nodes are stored in a `slotmap` arena owned by the heap, and callers address them
//! through copyable [`Handle`]s. The heap is meant to be embedded as a subroutine of a larger
//! algorithm such as Dijkstra's shortest paths or Prim's spanning tree.
//!
//! ```
//! use fibheap::FibHeap;
//!
//! let mut heap = FibHeap::new();
//! heap.insert(5, "A");
//! let b = heap.insert(1, "B");
//! let c = heap.insert(9, "C");
//! heap.insert(3, "D");
//!
//! heap.decrease_key(c, 2).unwrap();
//! heap.delete(b).unwrap();
//!
//! let keys: Vec<_> = heap.into_sorted_iter().map(|(key, _)| key).collect();
//! assert_eq!(keys, [2, 3, 5]);
//! ```
//!
//! The library logs through the [`log`] facade: consolidation and cascading cuts at `trace`,
//! merges and clears at `debug`.

#![warn(missing_debug_implementations)]

/// Error type shared by the fallible heap operations
pub mod error;
/// Module containing the heap implementation
pub mod fibheap;

pub use error::{HeapError, Result};
pub use fibheap::{FibHeap, Handle, HandleMap, IntoSorted};
