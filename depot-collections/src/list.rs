//! Doubly-linked FIFO queue over shared node storage.
//!
//! The caller allocates a [`ListNode`] in storage and links its key onto a
//! list with [`List::link_back`]. [`List::unlink_front`] detaches the head
//! without freeing it, so a node can leave one queue and join another
//! sharing the same storage while its key stays valid throughout.
//!
//! # Storage Invariant
//!
//! A list instance must always be used with the same storage instance.
//! Passing a different storage corrupts the links (it panics on the first
//! dangling key rather than reading garbage, but the list is unusable
//! afterwards). This is the caller's responsibility to enforce (same
//! discipline as the `slab` crate).
//!
//! # Example
//!
//! ```
//! use depot_collections::{List, ListNode, SlabListStorage};
//!
//! let mut storage: SlabListStorage<u64> = slab::Slab::with_capacity(16);
//! let mut awaiting: List<u64, SlabListStorage<u64>, usize> = List::new();
//! let mut ready: List<u64, SlabListStorage<u64>, usize> = List::new();
//!
//! let a = storage.insert(ListNode::new(1));
//! let b = storage.insert(ListNode::new(2));
//! awaiting.link_back(&mut storage, a);
//! awaiting.link_back(&mut storage, b);
//!
//! // Relink the head onto the other queue; its key stays valid
//! let front = awaiting.unlink_front(&mut storage).unwrap();
//! ready.link_back(&mut storage, front);
//!
//! assert_eq!(front, a);
//! assert_eq!(awaiting.iter(&storage).copied().collect::<Vec<_>>(), vec![2]);
//! assert_eq!(ready.iter(&storage).copied().collect::<Vec<_>>(), vec![1]);
//! ```

use std::marker::PhantomData;

use crate::{Key, Storage};

/// Type alias for list storage backed by `slab::Slab`.
pub type SlabListStorage<T> = slab::Slab<ListNode<T, usize>>;

/// A value plus its prev/next links.
///
/// A freshly created node is unlinked and can be handed to
/// [`List::link_back`] once it is in storage.
#[derive(Debug)]
pub struct ListNode<T, K: Key = usize> {
    data: T,
    prev: K,
    next: K,
}

impl<T, K: Key> ListNode<T, K> {
    /// Creates a new unlinked node.
    #[inline]
    pub fn new(data: T) -> Self {
        Self {
            data,
            prev: K::NONE,
            next: K::NONE,
        }
    }

    /// Returns the wrapped value.
    #[inline]
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Returns the wrapped value mutably.
    #[inline]
    pub fn data_mut(&mut self) -> &mut T {
        &mut self.data
    }
}

/// A doubly-linked FIFO list over external storage.
///
/// The list tracks head, tail, and length. Nodes live in user-provided
/// storage, wrapped in [`ListNode`].
///
/// # Type Parameters
///
/// - `T`: Element type
/// - `S`: Storage type (e.g., [`SlabListStorage<T>`])
/// - `K`: Key type (default `usize`)
#[derive(Debug)]
pub struct List<T, S, K: Key = usize>
where
    S: Storage<ListNode<T, K>, Key = K>,
{
    head: K,
    tail: K,
    len: usize,
    _marker: PhantomData<(T, S)>,
}

impl<T, S, K: Key> Default for List<T, S, K>
where
    S: Storage<ListNode<T, K>, Key = K>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S, K: Key> List<T, S, K>
where
    S: Storage<ListNode<T, K>, Key = K>,
{
    /// Creates an empty list.
    #[inline]
    pub const fn new() -> Self {
        Self {
            head: K::NONE,
            tail: K::NONE,
            len: 0,
            _marker: PhantomData,
        }
    }

    /// Returns the number of linked nodes.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if nothing is linked.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    // ========================================================================
    // Link operations (just relink, no alloc/dealloc)
    // ========================================================================

    /// Links an existing node to the back of the list.
    ///
    /// The node must already exist in storage but not be in any list.
    ///
    /// # Panics
    ///
    /// Panics if `key` is not valid in storage.
    #[inline]
    pub fn link_back(&mut self, storage: &mut S, key: K) {
        let node = storage.get_mut(key).expect("invalid key");
        node.prev = self.tail;
        node.next = K::NONE;

        if self.tail.is_some() {
            storage.get_mut(self.tail).expect("invalid tail").next = key;
        } else {
            self.head = key;
        }

        self.tail = key;
        self.len += 1;
    }

    /// Unlinks the front node without deallocating it.
    ///
    /// The returned key stays valid in storage and can be linked into
    /// another list sharing the same storage.
    #[inline]
    pub fn unlink_front(&mut self, storage: &mut S) -> Option<K> {
        let key = self.head.into_option()?;
        self.unlink(storage, key);
        Some(key)
    }

    /// Unlinks a node from the list without removing it from storage.
    ///
    /// Returns `true` if the node was in the list.
    ///
    /// # Panics
    ///
    /// Panics if `key` is not valid in storage.
    pub fn unlink(&mut self, storage: &mut S, key: K) -> bool {
        let node = storage.get(key).expect("invalid key");
        let prev = node.prev;
        let next = node.next;

        // Linked nodes have a neighbour or are the sole head
        if prev.is_none() && next.is_none() && self.head != key {
            return false;
        }

        if prev.is_some() {
            storage.get_mut(prev).expect("invalid prev").next = next;
        } else {
            self.head = next;
        }

        if next.is_some() {
            storage.get_mut(next).expect("invalid next").prev = prev;
        } else {
            self.tail = prev;
        }

        let node = storage.get_mut(key).expect("invalid key");
        node.prev = K::NONE;
        node.next = K::NONE;

        self.len -= 1;
        true
    }

    /// Unlinks every node and frees it from storage.
    pub fn clear(&mut self, storage: &mut S) {
        let mut key = self.head;
        while key.is_some() {
            let next = storage.get(key).expect("invalid key").next;
            storage.remove(key);
            key = next;
        }

        self.head = K::NONE;
        self.tail = K::NONE;
        self.len = 0;
    }

    // ========================================================================
    // Iteration
    // ========================================================================

    /// Returns an iterator over references to elements, front to back.
    #[inline]
    pub fn iter<'a>(&self, storage: &'a S) -> Iter<'a, T, S, K>
    where
        T: 'a,
        K: 'a,
    {
        Iter {
            storage,
            current: self.head,
            remaining: self.len,
            _marker: PhantomData,
        }
    }

    /// Returns an iterator over keys, front to back.
    ///
    /// Collect the keys first when the list is modified during iteration.
    #[inline]
    pub fn keys<'a>(&self, storage: &'a S) -> Keys<'a, T, S, K>
    where
        T: 'a,
        K: 'a,
    {
        Keys {
            inner: self.iter(storage),
        }
    }
}

// =============================================================================
// Iterators
// =============================================================================

/// Iterator over references to list elements.
pub struct Iter<'a, T, S, K: Key> {
    storage: &'a S,
    current: K,
    remaining: usize,
    _marker: PhantomData<T>,
}

impl<'a, T: 'a, S, K: Key + 'a> Iter<'a, T, S, K>
where
    S: Storage<ListNode<T, K>, Key = K>,
{
    #[inline]
    fn next_node(&mut self) -> Option<(K, &'a ListNode<T, K>)> {
        let key = self.current.into_option()?;
        let node = self.storage.get(key).expect("invalid key");
        self.current = node.next;
        self.remaining -= 1;
        Some((key, node))
    }
}

impl<'a, T: 'a, S, K: Key + 'a> Iterator for Iter<'a, T, S, K>
where
    S: Storage<ListNode<T, K>, Key = K>,
{
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.next_node().map(|(_, node)| &node.data)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T: 'a, S, K: Key + 'a> ExactSizeIterator for Iter<'a, T, S, K> where
    S: Storage<ListNode<T, K>, Key = K>
{
}

/// Iterator over list keys.
pub struct Keys<'a, T, S, K: Key> {
    inner: Iter<'a, T, S, K>,
}

impl<'a, T: 'a, S, K: Key + 'a> Iterator for Keys<'a, T, S, K>
where
    S: Storage<ListNode<T, K>, Key = K>,
{
    type Item = K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next_node().map(|(key, _)| key)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
