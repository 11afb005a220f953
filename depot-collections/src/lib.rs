//! Collections with external storage for multi-index bookkeeping.
//!
//! The key insight: separate storage from structure. A slab owns the data
//! and hands out stable keys; lists and trees only coordinate those keys.
//!
//! ```text
//! Storage (Slab)   - owns nodes, provides stable keys
//! List / AvlTree   - link keys, don't own data
//! ```
//!
//! Benefits:
//! - **Stable keys**: remove from the middle without invalidating other keys
//! - **Move without copying**: a node can leave one list and join another
//!   by relinking, so its key (and anything pointing at it) stays valid
//! - **Shared storage**: several trees or lists can draw from one slab,
//!   which is how a single set of entities is indexed several ways at once
//!
//! # Quick Start
//!
//! ```
//! use depot_collections::{AvlTree, List, ListNode, SlabAvlStorage, SlabListStorage};
//!
//! // FIFO queue over shared storage
//! let mut nodes: SlabListStorage<u64> = slab::Slab::new();
//! let mut queue: List<u64, SlabListStorage<u64>, usize> = List::new();
//! let first = nodes.insert(ListNode::new(1));
//! queue.link_back(&mut nodes, first);
//! let second = nodes.insert(ListNode::new(2));
//! queue.link_back(&mut nodes, second);
//! assert_eq!(queue.unlink_front(&mut nodes), Some(first));
//! assert_eq!(nodes[first].data(), &1);
//!
//! // Ordered index with nearest-key lookup
//! let mut tree_nodes: SlabAvlStorage<i64, ()> = slab::Slab::new();
//! let mut index: AvlTree<i64, (), SlabAvlStorage<i64, ()>> = AvlTree::new();
//! index.insert(&mut tree_nodes, 10, ());
//! index.insert(&mut tree_nodes, 20, ());
//! assert_eq!(index.nearest_above(&tree_nodes, &10).map(|(k, _)| *k), Some(20));
//! ```
//!
//! # Critical Invariant: Same Storage Instance
//!
//! All operations on a list or tree must use the same storage instance it
//! was built with. This is the caller's responsibility (same discipline as
//! the `slab` crate). A foreign storage makes lookups panic on the first
//! dangling key.
//!
//! # Data Structures
//!
//! | Structure | Use Case | Key Operations |
//! |-----------|----------|----------------|
//! | [`List`] | FIFO queues | O(1) link/unlink |
//! | [`AvlTree`] | Ordered indices | O(log n) insert/remove/nearest |

#![warn(missing_docs)]

pub mod avl;
pub mod key;
pub mod list;
pub mod storage;

pub use avl::{AvlNode, AvlTree, SlabAvlStorage};
pub use key::Key;
pub use list::{List, ListNode, SlabListStorage};
pub use storage::{Storage, UnboundedStorage};
