//! AVL tree - a height-balanced sorted map backed by external storage.
//!
//! Every insert and remove keeps the height difference between sibling
//! subtrees within ±1, so lookups, mutations, and nearest-key queries are
//! O(log n) for any interleaving of operations.
//!
//! # Design
//!
//! Like [`List`](crate::List), the tree does not own its nodes. The external
//! storage owns [`AvlNode`]s, which hold the key, the value, child links, and
//! the cached subtree height. Child links are storage keys, so rotations are
//! plain key reassignments and several trees can share one storage.
//!
//! ```text
//!              30 (h=3)
//!            /          \
//!       10 (h=2)      50 (h=1)
//!       /     \
//!   5 (h=1)  20 (h=1)
//! ```
//!
//! # Nearest-key queries
//!
//! [`AvlTree::nearest_below`] and [`AvlTree::nearest_above`] are strict: an
//! entry whose key equals the query key is never returned.
//!
//! # Example
//!
//! ```rust
//! use depot_collections::{AvlTree, SlabAvlStorage};
//!
//! let mut storage: SlabAvlStorage<i64, &str> = slab::Slab::with_capacity(16);
//! let mut tree: AvlTree<i64, &str, SlabAvlStorage<i64, &str>> = AvlTree::new();
//!
//! tree.insert(&mut storage, 10, "ten");
//! tree.insert(&mut storage, 5, "five");
//! tree.insert(&mut storage, 20, "twenty");
//!
//! assert_eq!(tree.get(&storage, &10), Some(&"ten"));
//! assert_eq!(tree.nearest_below(&storage, &10), Some((&5, &"five")));
//! assert_eq!(tree.nearest_above(&storage, &10), Some((&20, &"twenty")));
//! assert_eq!(tree.nearest_above(&storage, &20), None);
//! ```

use core::cmp::Ordering;
use core::marker::PhantomData;

use crate::{Key, Storage, UnboundedStorage};

/// Type alias for AVL node storage backed by `slab::Slab`.
pub type SlabAvlStorage<K, V> = slab::Slab<AvlNode<K, V, usize>>;

// ============================================================================
// AvlNode
// ============================================================================

/// A node in the AVL tree.
///
/// `height` is the height of the subtree rooted here, with a leaf at 1 and
/// an empty link counting as 0.
#[derive(Debug, Clone)]
pub struct AvlNode<K, V, Idx: Key = usize> {
    /// The key used for ordering.
    pub key: K,
    /// The value associated with this key.
    pub value: V,
    left: Idx,
    right: Idx,
    height: u8,
}

impl<K, V, Idx: Key> AvlNode<K, V, Idx> {
    #[inline]
    fn leaf(key: K, value: V) -> Self {
        Self {
            key,
            value,
            left: Idx::NONE,
            right: Idx::NONE,
            height: 1,
        }
    }
}

// ============================================================================
// AvlTree
// ============================================================================

/// A height-balanced sorted map over external storage.
///
/// # Type Parameters
///
/// - `K`: Key type, must implement `Ord`
/// - `V`: Value type
/// - `S`: Storage type holding [`AvlNode`]s
/// - `Idx`: Storage key type, defaults to `usize`
#[derive(Debug)]
pub struct AvlTree<K, V, S, Idx: Key = usize> {
    root: Idx,
    len: usize,
    _marker: PhantomData<(K, V, S)>,
}

impl<K, V, S, Idx: Key> Default for AvlTree<K, V, S, Idx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S, Idx: Key> AvlTree<K, V, S, Idx> {
    /// Creates an empty tree.
    #[inline]
    pub const fn new() -> Self {
        Self {
            root: Idx::NONE,
            len: 0,
            _marker: PhantomData,
        }
    }

    /// Returns the number of entries in the tree.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the tree has no entries.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<K, V, S, Idx> AvlTree<K, V, S, Idx>
where
    K: Ord,
    Idx: Key,
    S: Storage<AvlNode<K, V, Idx>, Key = Idx>,
{
    /// Returns the height of the tree (0 when empty, 1 for a single entry).
    #[inline]
    pub fn height(&self, storage: &S) -> usize {
        Self::height_of(storage, self.root) as usize
    }

    /// Returns `true` if the tree contains `key`.
    #[inline]
    pub fn contains_key(&self, storage: &S, key: &K) -> bool {
        self.find(storage, key).is_some()
    }

    /// Returns the value stored under exactly `key`.
    #[inline]
    pub fn get<'a>(&self, storage: &'a S, key: &K) -> Option<&'a V>
    where
        K: 'a,
        V: 'a,
        Idx: 'a,
    {
        self.get_key_value(storage, key).map(|(_, v)| v)
    }

    /// Returns the entry stored under exactly `key`.
    #[inline]
    pub fn get_key_value<'a>(&self, storage: &'a S, key: &K) -> Option<(&'a K, &'a V)>
    where
        K: 'a,
        V: 'a,
        Idx: 'a,
    {
        let idx = self.find(storage, key)?;
        let node = Self::node(storage, idx);
        Some((&node.key, &node.value))
    }

    /// Returns the entry with the greatest key strictly less than `key`.
    pub fn nearest_below<'a>(&self, storage: &'a S, key: &K) -> Option<(&'a K, &'a V)>
    where
        K: 'a,
        V: 'a,
        Idx: 'a,
    {
        let mut current = self.root;
        let mut best = Idx::NONE;

        while current.is_some() {
            let n = Self::node(storage, current);
            if n.key < *key {
                best = current;
                current = n.right;
            } else {
                current = n.left;
            }
        }

        best.into_option().map(|idx| {
            let n = Self::node(storage, idx);
            (&n.key, &n.value)
        })
    }

    /// Returns the entry with the smallest key strictly greater than `key`.
    pub fn nearest_above<'a>(&self, storage: &'a S, key: &K) -> Option<(&'a K, &'a V)>
    where
        K: 'a,
        V: 'a,
        Idx: 'a,
    {
        let mut current = self.root;
        let mut best = Idx::NONE;

        while current.is_some() {
            let n = Self::node(storage, current);
            if n.key > *key {
                best = current;
                current = n.left;
            } else {
                current = n.right;
            }
        }

        best.into_option().map(|idx| {
            let n = Self::node(storage, idx);
            (&n.key, &n.value)
        })
    }

    /// Removes the entry for `key` and returns its value.
    ///
    /// Returns `None` and leaves the tree untouched if `key` is absent.
    pub fn remove(&mut self, storage: &mut S, key: &K) -> Option<V> {
        let mut removed = None;
        self.root = Self::remove_at(storage, self.root, key, &mut removed);
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    /// Removes every entry, releasing the nodes back to storage.
    pub fn clear(&mut self, storage: &mut S) {
        let mut stack = Vec::new();
        if self.root.is_some() {
            stack.push(self.root);
        }
        while let Some(idx) = stack.pop() {
            if let Some(n) = storage.remove(idx) {
                if n.left.is_some() {
                    stack.push(n.left);
                }
                if n.right.is_some() {
                    stack.push(n.right);
                }
            }
        }

        self.root = Idx::NONE;
        self.len = 0;
    }

    /// Returns an iterator over entries in ascending key order.
    pub fn iter<'a>(&self, storage: &'a S) -> Iter<'a, K, V, S, Idx>
    where
        K: 'a,
        V: 'a,
        Idx: 'a,
    {
        let mut iter = Iter {
            storage,
            stack: Vec::with_capacity(Self::height_of(storage, self.root) as usize),
            remaining: self.len,
            _marker: PhantomData,
        };
        iter.push_left_spine(self.root);
        iter
    }

    /// Returns an iterator over keys in ascending order.
    #[inline]
    pub fn keys<'a>(&self, storage: &'a S) -> Keys<'a, K, V, S, Idx>
    where
        K: 'a,
        V: 'a,
        Idx: 'a,
    {
        Keys {
            inner: self.iter(storage),
        }
    }

    /// Walks the entries with keys strictly greater than `key`, ascending.
    ///
    /// Each step is a fresh [`nearest_above`](Self::nearest_above) query from
    /// the previous key, so the walk costs O(log n) per entry and holds no
    /// node keys between steps.
    #[inline]
    pub fn above<'a>(&'a self, storage: &'a S, key: K) -> Above<'a, K, V, S, Idx>
    where
        K: Clone + 'a,
        V: 'a,
        Idx: 'a,
    {
        Above {
            tree: self,
            storage,
            cursor: key,
        }
    }

    /// Finds the storage key holding `key`.
    #[inline]
    fn find(&self, storage: &S, key: &K) -> Option<Idx> {
        let mut current = self.root;
        while current.is_some() {
            let n = Self::node(storage, current);
            current = match key.cmp(&n.key) {
                Ordering::Less => n.left,
                Ordering::Greater => n.right,
                Ordering::Equal => return Some(current),
            };
        }
        None
    }
}

// ============================================================================
// Unbounded storage impl
// ============================================================================

impl<K, V, S, Idx> AvlTree<K, V, S, Idx>
where
    K: Ord,
    Idx: Key,
    S: UnboundedStorage<AvlNode<K, V, Idx>, Key = Idx>,
{
    /// Inserts `key` with `value`.
    ///
    /// Returns `false` if `key` is already present. The existing entry is
    /// kept and `value` is dropped, so a duplicate insert is a no-op.
    pub fn insert(&mut self, storage: &mut S, key: K, value: V) -> bool {
        let mut inserted = false;
        self.root = Self::insert_at(storage, self.root, key, value, &mut inserted);
        if inserted {
            self.len += 1;
        }
        inserted
    }

    fn insert_at(storage: &mut S, idx: Idx, key: K, value: V, inserted: &mut bool) -> Idx {
        if idx.is_none() {
            *inserted = true;
            return storage.insert(AvlNode::leaf(key, value));
        }

        match key.cmp(&Self::node(storage, idx).key) {
            Ordering::Less => {
                let left = Self::node(storage, idx).left;
                let new_left = Self::insert_at(storage, left, key, value, inserted);
                Self::node_mut(storage, idx).left = new_left;
            }
            Ordering::Greater => {
                let right = Self::node(storage, idx).right;
                let new_right = Self::insert_at(storage, right, key, value, inserted);
                Self::node_mut(storage, idx).right = new_right;
            }
            Ordering::Equal => return idx,
        }

        if *inserted { Self::rebalance(storage, idx) } else { idx }
    }
}

// ============================================================================
// Recursive mutation helpers
//
// Each returns the (possibly new) root of the subtree it was handed, and the
// caller relinks it. Rebalancing happens on the way back up the recursion.
// ============================================================================

impl<K, V, S, Idx> AvlTree<K, V, S, Idx>
where
    K: Ord,
    Idx: Key,
    S: Storage<AvlNode<K, V, Idx>, Key = Idx>,
{
    #[inline]
    fn node(storage: &S, idx: Idx) -> &AvlNode<K, V, Idx> {
        storage.get(idx).expect("invalid node")
    }

    #[inline]
    fn node_mut(storage: &mut S, idx: Idx) -> &mut AvlNode<K, V, Idx> {
        storage.get_mut(idx).expect("invalid node")
    }

    #[inline]
    fn height_of(storage: &S, idx: Idx) -> u8 {
        if idx.is_none() {
            0
        } else {
            Self::node(storage, idx).height
        }
    }

    /// Left height minus right height.
    #[inline]
    fn balance_factor(storage: &S, idx: Idx) -> i16 {
        if idx.is_none() {
            return 0;
        }
        let n = Self::node(storage, idx);
        Self::height_of(storage, n.left) as i16 - Self::height_of(storage, n.right) as i16
    }

    #[inline]
    fn update_height(storage: &mut S, idx: Idx) {
        let n = Self::node(storage, idx);
        let height = 1 + Self::height_of(storage, n.left).max(Self::height_of(storage, n.right));
        Self::node_mut(storage, idx).height = height;
    }

    fn rotate_right(storage: &mut S, y: Idx) -> Idx {
        let x = Self::node(storage, y).left;
        let t2 = Self::node(storage, x).right;

        Self::node_mut(storage, x).right = y;
        Self::node_mut(storage, y).left = t2;

        Self::update_height(storage, y);
        Self::update_height(storage, x);
        x
    }

    fn rotate_left(storage: &mut S, x: Idx) -> Idx {
        let y = Self::node(storage, x).right;
        let t2 = Self::node(storage, y).left;

        Self::node_mut(storage, y).left = x;
        Self::node_mut(storage, x).right = t2;

        Self::update_height(storage, x);
        Self::update_height(storage, y);
        y
    }

    /// Refreshes the height of `idx` and rotates if it is out of balance.
    ///
    /// The rotation is picked by the sign of the heavy child's own balance:
    /// a child leaning the other way takes a double rotation.
    fn rebalance(storage: &mut S, idx: Idx) -> Idx {
        Self::update_height(storage, idx);
        let balance = Self::balance_factor(storage, idx);

        if balance > 1 {
            let left = Self::node(storage, idx).left;
            if Self::balance_factor(storage, left) < 0 {
                let new_left = Self::rotate_left(storage, left);
                Self::node_mut(storage, idx).left = new_left;
            }
            return Self::rotate_right(storage, idx);
        }

        if balance < -1 {
            let right = Self::node(storage, idx).right;
            if Self::balance_factor(storage, right) > 0 {
                let new_right = Self::rotate_right(storage, right);
                Self::node_mut(storage, idx).right = new_right;
            }
            return Self::rotate_left(storage, idx);
        }

        idx
    }

    fn remove_at(storage: &mut S, idx: Idx, key: &K, removed: &mut Option<V>) -> Idx {
        if idx.is_none() {
            return idx;
        }

        match key.cmp(&Self::node(storage, idx).key) {
            Ordering::Less => {
                let left = Self::node(storage, idx).left;
                let new_left = Self::remove_at(storage, left, key, removed);
                Self::node_mut(storage, idx).left = new_left;
            }
            Ordering::Greater => {
                let right = Self::node(storage, idx).right;
                let new_right = Self::remove_at(storage, right, key, removed);
                Self::node_mut(storage, idx).right = new_right;
            }
            Ordering::Equal => {
                let (left, right) = {
                    let n = Self::node(storage, idx);
                    (n.left, n.right)
                };

                if left.is_none() || right.is_none() {
                    // Zero or one child: the child (already balanced) takes our place
                    let n = storage.remove(idx).expect("invalid node");
                    *removed = Some(n.value);
                    return if left.is_some() { left } else { right };
                }

                // Two children: splice in the in-order successor, then drop its old slot
                let mut successor = None;
                let new_right = Self::remove_min(storage, right, &mut successor);
                let (succ_key, succ_value) = successor.expect("right subtree is non-empty");

                let n = Self::node_mut(storage, idx);
                n.right = new_right;
                n.key = succ_key;
                *removed = Some(core::mem::replace(&mut n.value, succ_value));
            }
        }

        if removed.is_some() { Self::rebalance(storage, idx) } else { idx }
    }

    /// Detaches the minimum node of the subtree at `idx`, handing back its entry.
    fn remove_min(storage: &mut S, idx: Idx, out: &mut Option<(K, V)>) -> Idx {
        let left = Self::node(storage, idx).left;
        if left.is_none() {
            let n = storage.remove(idx).expect("invalid node");
            *out = Some((n.key, n.value));
            return n.right;
        }

        let new_left = Self::remove_min(storage, left, out);
        Self::node_mut(storage, idx).left = new_left;
        Self::rebalance(storage, idx)
    }
}

// ============================================================================
// Iterators
// ============================================================================

/// In-order iterator over tree entries.
pub struct Iter<'a, K, V, S, Idx: Key> {
    storage: &'a S,
    stack: Vec<Idx>,
    remaining: usize,
    _marker: PhantomData<(K, V)>,
}

impl<'a, K: 'a, V: 'a, S, Idx: Key + 'a> Iter<'a, K, V, S, Idx>
where
    S: Storage<AvlNode<K, V, Idx>, Key = Idx>,
{
    fn push_left_spine(&mut self, mut idx: Idx) {
        while idx.is_some() {
            self.stack.push(idx);
            idx = self.storage.get(idx).expect("invalid node").left;
        }
    }
}

impl<'a, K: 'a, V: 'a, S, Idx: Key + 'a> Iterator for Iter<'a, K, V, S, Idx>
where
    S: Storage<AvlNode<K, V, Idx>, Key = Idx>,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.stack.pop()?;
        let storage: &'a S = self.storage;
        let n = storage.get(idx).expect("invalid node");
        self.push_left_spine(n.right);
        self.remaining -= 1;
        Some((&n.key, &n.value))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K: 'a, V: 'a, S, Idx: Key + 'a> ExactSizeIterator for Iter<'a, K, V, S, Idx> where
    S: Storage<AvlNode<K, V, Idx>, Key = Idx>
{
}

/// In-order iterator over tree keys.
pub struct Keys<'a, K, V, S, Idx: Key> {
    inner: Iter<'a, K, V, S, Idx>,
}

impl<'a, K: 'a, V: 'a, S, Idx: Key + 'a> Iterator for Keys<'a, K, V, S, Idx>
where
    S: Storage<AvlNode<K, V, Idx>, Key = Idx>,
{
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Ascending walk over entries above a key, built on nearest-above queries.
pub struct Above<'a, K, V, S, Idx: Key> {
    tree: &'a AvlTree<K, V, S, Idx>,
    storage: &'a S,
    cursor: K,
}

impl<'a, K, V: 'a, S, Idx: Key + 'a> Iterator for Above<'a, K, V, S, Idx>
where
    K: Ord + Clone + 'a,
    S: Storage<AvlNode<K, V, Idx>, Key = Idx>,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let (key, value) = self.tree.nearest_above(self.storage, &self.cursor)?;
        self.cursor = key.clone();
        Some((key, value))
    }
}
