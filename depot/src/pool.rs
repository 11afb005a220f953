//! Capacity-bounded pools with two unit queues.
//!
//! A pool owns no unit storage of its own. Every unit lives in one registry
//! wide [`UnitStorage`] slab and the pool's queues only link slab keys, so
//! moving a unit from the awaiting queue to the ready queue (or to another
//! pool entirely) is a relink with no copy and no reallocation.
//!
//! ```text
//! awaiting: [u3] <-> [u7] <-> [u9]    admission order
//! ready:    [u1] <-> [u4]             promotion order
//! ```

use depot_collections::{List, SlabListStorage};

use crate::unit::{Unit, UnitId};

/// Shared node storage for every unit queue in a registry.
pub type UnitStorage = SlabListStorage<Unit>;

/// Stable handle of a unit inside [`UnitStorage`].
pub type UnitKey = usize;

/// FIFO queue of units over shared storage.
pub type UnitQueue = List<Unit, UnitStorage, UnitKey>;

/// A container with a capacity constraint and a limit on how many units it
/// holds across its awaiting and ready queues.
#[derive(Debug)]
pub struct Pool {
    capacity_constraint: i64,
    unit_limit: usize,
    awaiting: UnitQueue,
    ready: UnitQueue,
}

impl Pool {
    /// Creates an empty pool.
    pub const fn new(capacity_constraint: i64, unit_limit: usize) -> Self {
        Self {
            capacity_constraint,
            unit_limit,
            awaiting: List::new(),
            ready: List::new(),
        }
    }

    /// Returns the pool's capacity constraint, which is also its index key.
    #[inline]
    pub const fn capacity_constraint(&self) -> i64 {
        self.capacity_constraint
    }

    /// Returns the maximum number of units held across both queues.
    #[inline]
    pub const fn unit_limit(&self) -> usize {
        self.unit_limit
    }

    #[inline]
    pub const fn ready_len(&self) -> usize {
        self.ready.len()
    }

    /// Returns the number of units held across both queues.
    #[inline]
    pub const fn total_count(&self) -> usize {
        self.awaiting.len() + self.ready.len()
    }

    /// Returns `true` while another unit can be admitted.
    #[inline]
    pub const fn has_space(&self) -> bool {
        self.total_count() < self.unit_limit
    }

    #[inline]
    pub const fn awaiting_empty(&self) -> bool {
        self.awaiting.is_empty()
    }

    #[inline]
    pub const fn ready_empty(&self) -> bool {
        self.ready.is_empty()
    }

    /// Links an allocated, unlinked unit onto the back of the awaiting queue.
    ///
    /// The caller checks [`has_space`](Self::has_space) first.
    #[inline]
    pub fn admit_to_awaiting(&mut self, units: &mut UnitStorage, unit: UnitKey) {
        debug_assert!(self.has_space(), "admission past unit limit");
        self.awaiting.link_back(units, unit);
    }

    /// Moves the front awaiting unit to the back of the ready queue.
    ///
    /// Returns the moved unit's key, or `None` if nothing is awaiting.
    #[inline]
    pub fn promote_front_to_ready(&mut self, units: &mut UnitStorage) -> Option<UnitKey> {
        let unit = self.awaiting.unlink_front(units)?;
        self.ready.link_back(units, unit);
        Some(unit)
    }

    /// Unlinks the front ready unit. Its node stays allocated in `units`.
    #[inline]
    pub fn take_ready_front(&mut self, units: &mut UnitStorage) -> Option<UnitKey> {
        self.ready.unlink_front(units)
    }

    /// Ids of awaiting units, front to back.
    pub fn awaiting_ids(&self, units: &UnitStorage) -> Vec<UnitId> {
        self.awaiting.iter(units).map(Unit::id).collect()
    }

    /// Ids of ready units, front to back.
    pub fn ready_ids(&self, units: &UnitStorage) -> Vec<UnitId> {
        self.ready.iter(units).map(Unit::id).collect()
    }

    /// Keys of every unit held, awaiting queue first.
    pub fn unit_keys<'a>(&self, units: &'a UnitStorage) -> impl Iterator<Item = UnitKey> + 'a {
        self.awaiting.keys(units).chain(self.ready.keys(units))
    }

    /// Drops every unit held by the pool and frees their storage.
    pub fn release(&mut self, units: &mut UnitStorage) {
        self.awaiting.clear(units);
        self.ready.clear(units);
    }
}
