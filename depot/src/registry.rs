//! The pool registry: one pool store, four ordered indices.
//!
//! Every live pool is reachable through [`IndexKind::All`]. Three filtered
//! indices track the pools the hot operations search:
//!
//! | Index | Holds a pool iff |
//! |-------|------------------|
//! | `NotFull` | it can admit another unit |
//! | `HasWaiting` | its awaiting queue is non-empty |
//! | `HasReady` | its ready queue is non-empty |
//!
//! All four trees draw nodes from one shared slab and store only a
//! [`PoolId`] handle into the pool slab, so a pool is owned exactly once no
//! matter how many indices reference it. Every mutating operation updates
//! the affected memberships before it returns.

use std::collections::HashSet;
use std::fmt;

use depot_collections::{AvlTree, ListNode, SlabAvlStorage};
use slab::Slab;
use tracing::{debug, trace};

use crate::config::RegistryConfig;
use crate::error::ConsistencyError;
use crate::pool::{Pool, UnitKey, UnitStorage};
use crate::unit::{Unit, UnitId};

/// Handle of a pool inside the registry's pool slab.
pub type PoolId = usize;

type IndexStorage = SlabAvlStorage<i64, PoolId>;
type PoolIndex = AvlTree<i64, PoolId, IndexStorage>;

/// Names one of the registry's four indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    All,
    NotFull,
    HasWaiting,
    HasReady,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "all-pools",
            Self::NotFull => "not-full",
            Self::HasWaiting => "has-waiting",
            Self::HasReady => "has-ready",
        })
    }
}

/// A unit moved from awaiting to ready by [`PoolRegistry::mark_ready`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Promotion {
    pub unit_id: UnitId,
    /// Capacity constraint of the pool the unit belongs to.
    pub pool: i64,
}

/// Where one unit ended up during [`PoolRegistry::redistribute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub unit_id: UnitId,
    /// Pool that re-admitted the unit, or `None` if no pool took it and
    /// the unit was discarded.
    pub pool: Option<i64>,
}

/// Read-only view of one pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub capacity_constraint: i64,
    pub unit_limit: usize,
    /// Awaiting unit ids, front to back.
    pub awaiting: Vec<UnitId>,
    /// Ready unit ids, front to back.
    pub ready: Vec<UnitId>,
}

/// Capacity-bounded pools indexed four ways by capacity constraint.
///
/// # Example
///
/// ```
/// use depot::{PoolRegistry, Promotion, Unit};
///
/// let mut registry = PoolRegistry::new();
/// registry.create(10, 2);
/// registry.create(5, 3);
///
/// // No pool keyed exactly 7, so the unit joins the largest pool below it
/// assert_eq!(registry.admit(Unit::new(1, 7)), Some(5));
/// assert_eq!(registry.mark_ready(5), Some(Promotion { unit_id: 1, pool: 5 }));
/// assert_eq!(registry.count(4), 1);
/// ```
pub struct PoolRegistry {
    pools: Slab<Pool>,
    units: UnitStorage,
    nodes: IndexStorage,
    all: PoolIndex,
    not_full: PoolIndex,
    has_waiting: PoolIndex,
    has_ready: PoolIndex,
}

impl Default for PoolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PoolRegistry {
    /// Creates an empty registry with default pre-allocation.
    pub fn new() -> Self {
        Self::with_config(&RegistryConfig::default())
    }

    /// Creates an empty registry, reserving storage per `config`.
    pub fn with_config(config: &RegistryConfig) -> Self {
        Self {
            pools: Slab::with_capacity(config.pool_capacity),
            units: UnitStorage::with_capacity(config.unit_capacity),
            nodes: IndexStorage::with_capacity(config.index_node_capacity()),
            all: AvlTree::new(),
            not_full: AvlTree::new(),
            has_waiting: AvlTree::new(),
            has_ready: AvlTree::new(),
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Returns the number of live pools.
    #[inline]
    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    /// Returns the number of units held across all pools.
    #[inline]
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Returns `true` if a pool with this capacity constraint exists.
    #[inline]
    pub fn contains_pool(&self, capacity_constraint: i64) -> bool {
        self.all.contains_key(&self.nodes, &capacity_constraint)
    }

    /// Returns a snapshot of the pool keyed `capacity_constraint`.
    pub fn pool(&self, capacity_constraint: i64) -> Option<PoolSnapshot> {
        let id = *self.all.get(&self.nodes, &capacity_constraint)?;
        let pool = &self.pools[id];
        Some(PoolSnapshot {
            capacity_constraint: pool.capacity_constraint(),
            unit_limit: pool.unit_limit(),
            awaiting: pool.awaiting_ids(&self.units),
            ready: pool.ready_ids(&self.units),
        })
    }

    /// Returns `true` if the pool keyed `capacity_constraint` is a member of
    /// `index`.
    pub fn is_indexed(&self, index: IndexKind, capacity_constraint: i64) -> bool {
        self.index(index).contains_key(&self.nodes, &capacity_constraint)
    }

    /// Counts units held by pools keyed strictly above `capacity_constraint`.
    pub fn count(&self, capacity_constraint: i64) -> usize {
        let total: usize = self
            .all
            .above(&self.nodes, capacity_constraint)
            .map(|(_, &id)| self.pools[id].total_count())
            .sum();
        debug!(capacity_constraint, total, "count");
        total
    }

    // ========================================================================
    // Pool lifecycle
    // ========================================================================

    /// Creates a pool. Returns `false` without changes if the key is taken.
    ///
    /// A pool with a unit limit of zero is registered but never has space.
    pub fn create(&mut self, capacity_constraint: i64, unit_limit: usize) -> bool {
        if self.contains_pool(capacity_constraint) {
            debug!(capacity_constraint, "create: pool already exists");
            return false;
        }

        let pool = Pool::new(capacity_constraint, unit_limit);
        let has_space = pool.has_space();
        let id = self.pools.insert(pool);
        self.all.insert(&mut self.nodes, capacity_constraint, id);
        if has_space {
            self.index_insert(IndexKind::NotFull, capacity_constraint, id);
        }

        debug!(capacity_constraint, unit_limit, "create");
        true
    }

    /// Deletes a pool and every unit it holds. Returns `false` if absent.
    pub fn delete(&mut self, capacity_constraint: i64) -> bool {
        let Some(id) = self.all.remove(&mut self.nodes, &capacity_constraint) else {
            debug!(capacity_constraint, "delete: no such pool");
            return false;
        };

        for index in [IndexKind::NotFull, IndexKind::HasWaiting, IndexKind::HasReady] {
            self.index_remove(index, capacity_constraint);
        }

        let mut pool = self.pools.remove(id);
        let released = pool.total_count();
        pool.release(&mut self.units);

        debug!(capacity_constraint, released, "delete");
        true
    }

    // ========================================================================
    // Unit flow
    // ========================================================================

    /// Admits a unit into the best-fitting pool with space.
    ///
    /// The target is the pool keyed exactly at the unit's remaining capacity,
    /// else the largest key below it. Returns the target's key, or `None` if
    /// no pool qualifies, in which case the unit is dropped.
    pub fn admit(&mut self, unit: Unit) -> Option<i64> {
        let unit_id = unit.id();
        let key = self.units.insert(ListNode::new(unit));
        let placed = self.place(key);
        if placed.is_none() {
            self.units.remove(key);
        }
        debug!(unit_id, pool = ?placed, "admit");
        placed
    }

    /// Promotes the front awaiting unit of the pool keyed exactly at
    /// `capacity_constraint`, else of the nearest pool above it with
    /// awaiting units.
    pub fn mark_ready(&mut self, capacity_constraint: i64) -> Option<Promotion> {
        let Some((key, id)) = exact_or_above(&self.has_waiting, &self.nodes, capacity_constraint)
        else {
            debug!(capacity_constraint, "ready: no pool with awaiting units");
            return None;
        };

        let pool = &mut self.pools[id];
        let unit = pool.promote_front_to_ready(&mut self.units)?;
        let ready_len = pool.ready_len();
        let awaiting_empty = pool.awaiting_empty();
        let unit_id = self.units[unit].data().id();

        if ready_len == 1 {
            self.index_insert(IndexKind::HasReady, key, id);
        }
        if awaiting_empty {
            self.index_remove(IndexKind::HasWaiting, key);
        }

        debug!(unit_id, pool = key, "ready");
        Some(Promotion { unit_id, pool: key })
    }

    /// Loads ready units with `amount`, starting at the pool keyed exactly at
    /// `capacity_constraint` (else the nearest ready pool above it) and
    /// moving upward through ready pools until the amount is spent.
    ///
    /// Each unit takes at most its pool's capacity constraint and at most its
    /// own remaining capacity. A unit filled to capacity is emptied. Every
    /// loaded unit is then re-admitted as if newly arrived; the returned
    /// placements record where each one went, in processing order.
    pub fn redistribute(&mut self, capacity_constraint: i64, mut amount: i64) -> Vec<Placement> {
        let mut placements = Vec::new();
        let mut cursor = exact_or_above(&self.has_ready, &self.nodes, capacity_constraint);

        while amount > 0 {
            let Some((key, id)) = cursor else { break };

            while amount > 0 {
                let Some(unit_key) = self.pools[id].take_ready_front(&mut self.units) else {
                    break;
                };
                self.index_insert(IndexKind::NotFull, key, id);

                let unit = self.units[unit_key].data_mut();
                let give = amount.min(key).min(unit.remaining_capacity()).max(0);
                unit.set_load(unit.current_load() + give);
                if unit.is_full() {
                    unit.set_load(0);
                }
                let unit_id = unit.id();
                amount -= give;

                let pool = self.place(unit_key);
                if pool.is_none() {
                    self.units.remove(unit_key);
                }
                trace!(unit_id, give, ?pool, "loaded unit");
                placements.push(Placement { unit_id, pool });
            }

            if self.pools[id].ready_empty() {
                self.index_remove(IndexKind::HasReady, key);
            }
            // Admissions only touch awaiting queues, so no pool at or below
            // `key` regains ready units during this call.
            cursor = self
                .has_ready
                .nearest_above(&self.nodes, &key)
                .map(|(&k, &v)| (k, v));
        }

        debug!(capacity_constraint, loaded = placements.len(), remaining = amount, "load");
        placements
    }

    /// Links an allocated, unlinked unit into the best-fitting pool.
    fn place(&mut self, unit: UnitKey) -> Option<i64> {
        let remaining = self.units[unit].data().remaining_capacity();
        let (key, id) = exact_or_below(&self.not_full, &self.nodes, remaining)?;

        let pool = &mut self.pools[id];
        let was_awaiting_empty = pool.awaiting_empty();
        pool.admit_to_awaiting(&mut self.units, unit);
        let has_space = pool.has_space();

        if was_awaiting_empty {
            self.index_insert(IndexKind::HasWaiting, key, id);
        }
        if !has_space {
            self.index_remove(IndexKind::NotFull, key);
        }
        Some(key)
    }

    // ========================================================================
    // Index maintenance
    // ========================================================================

    fn index(&self, kind: IndexKind) -> &PoolIndex {
        match kind {
            IndexKind::All => &self.all,
            IndexKind::NotFull => &self.not_full,
            IndexKind::HasWaiting => &self.has_waiting,
            IndexKind::HasReady => &self.has_ready,
        }
    }

    fn index_mut(&mut self, kind: IndexKind) -> (&mut PoolIndex, &mut IndexStorage) {
        let tree = match kind {
            IndexKind::All => &mut self.all,
            IndexKind::NotFull => &mut self.not_full,
            IndexKind::HasWaiting => &mut self.has_waiting,
            IndexKind::HasReady => &mut self.has_ready,
        };
        (tree, &mut self.nodes)
    }

    fn index_insert(&mut self, kind: IndexKind, key: i64, id: PoolId) {
        let (tree, nodes) = self.index_mut(kind);
        if tree.insert(nodes, key, id) {
            trace!(index = %kind, pool = key, "joined index");
        }
    }

    fn index_remove(&mut self, kind: IndexKind, key: i64) {
        let (tree, nodes) = self.index_mut(kind);
        if tree.remove(nodes, &key).is_some() {
            trace!(index = %kind, pool = key, "left index");
        }
    }

    // ========================================================================
    // Consistency
    // ========================================================================

    /// Checks every cross-index invariant with a full sweep.
    ///
    /// Verifies that each index is ordered and points only at live pools
    /// under their own keys, that each pool's membership in the filtered
    /// indices matches its queues, that no pool exceeds its unit limit, and
    /// that every stored unit is linked into exactly one queue with a load
    /// in range.
    pub fn validate(&self) -> Result<(), ConsistencyError> {
        for kind in [
            IndexKind::All,
            IndexKind::NotFull,
            IndexKind::HasWaiting,
            IndexKind::HasReady,
        ] {
            let mut previous: Option<i64> = None;
            for (&key, &id) in self.index(kind).iter(&self.nodes) {
                if previous.is_some_and(|p| p >= key) {
                    return Err(ConsistencyError::Unordered { index: kind, key });
                }
                previous = Some(key);

                let pool = self
                    .pools
                    .get(id)
                    .ok_or(ConsistencyError::DanglingHandle { index: kind, key })?;
                if pool.capacity_constraint() != key {
                    return Err(ConsistencyError::KeyMismatch {
                        index: kind,
                        key,
                        actual: pool.capacity_constraint(),
                    });
                }
            }
        }

        let mut linked = HashSet::with_capacity(self.units.len());
        for (id, pool) in &self.pools {
            let key = pool.capacity_constraint();

            let registered = self.all.get(&self.nodes, &key) == Some(&id);
            check_membership(IndexKind::All, key, registered, true)?;
            check_membership(
                IndexKind::NotFull,
                key,
                self.is_indexed(IndexKind::NotFull, key),
                pool.has_space(),
            )?;
            check_membership(
                IndexKind::HasWaiting,
                key,
                self.is_indexed(IndexKind::HasWaiting, key),
                !pool.awaiting_empty(),
            )?;
            check_membership(
                IndexKind::HasReady,
                key,
                self.is_indexed(IndexKind::HasReady, key),
                !pool.ready_empty(),
            )?;

            if pool.total_count() > pool.unit_limit() {
                return Err(ConsistencyError::OverLimit {
                    key,
                    held: pool.total_count(),
                    limit: pool.unit_limit(),
                });
            }

            for unit_key in pool.unit_keys(&self.units) {
                let unit = self.units[unit_key].data();
                if !linked.insert(unit_key) {
                    return Err(ConsistencyError::DuplicateUnit { unit_id: unit.id() });
                }
                if !(0..=unit.max_capacity()).contains(&unit.current_load()) {
                    return Err(ConsistencyError::LoadOutOfRange {
                        unit_id: unit.id(),
                        load: unit.current_load(),
                        max: unit.max_capacity(),
                    });
                }
            }
        }

        if linked.len() != self.units.len() {
            return Err(ConsistencyError::LeakedUnits {
                stored: self.units.len(),
                linked: linked.len(),
            });
        }
        Ok(())
    }
}

fn check_membership(
    index: IndexKind,
    key: i64,
    present: bool,
    expected: bool,
) -> Result<(), ConsistencyError> {
    if present == expected {
        Ok(())
    } else {
        Err(ConsistencyError::Membership {
            index,
            key,
            present,
            expected,
        })
    }
}

fn exact_or_below(index: &PoolIndex, nodes: &IndexStorage, key: i64) -> Option<(i64, PoolId)> {
    index
        .get_key_value(nodes, &key)
        .or_else(|| index.nearest_below(nodes, &key))
        .map(|(&k, &v)| (k, v))
}

fn exact_or_above(index: &PoolIndex, nodes: &IndexStorage, key: i64) -> Option<(i64, PoolId)> {
    index
        .get_key_value(nodes, &key)
        .or_else(|| index.nearest_above(nodes, &key))
        .map(|(&k, &v)| (k, v))
}
