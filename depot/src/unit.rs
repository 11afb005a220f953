//! Load-carrying units.

/// Identifier carried by a unit, as given by the caller on admission.
pub type UnitId = i64;

/// A load-carrying entity with a fixed capacity and a mutable current load.
///
/// The load always stays within `0..=max_capacity`.
///
/// # Example
///
/// ```
/// use depot::Unit;
///
/// let mut unit = Unit::new(7, 10);
/// assert_eq!(unit.remaining_capacity(), 10);
///
/// unit.set_load(25);
/// assert_eq!(unit.current_load(), 10);
/// assert!(unit.is_full());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    id: UnitId,
    max_capacity: i64,
    current_load: i64,
}

impl Unit {
    /// Creates an empty unit.
    #[inline]
    pub const fn new(id: UnitId, max_capacity: i64) -> Self {
        Self {
            id,
            max_capacity,
            current_load: 0,
        }
    }

    /// Returns the unit's identifier.
    #[inline]
    pub const fn id(&self) -> UnitId {
        self.id
    }

    /// Returns the largest load the unit can carry.
    #[inline]
    pub const fn max_capacity(&self) -> i64 {
        self.max_capacity
    }

    /// Returns the load currently carried.
    #[inline]
    pub const fn current_load(&self) -> i64 {
        self.current_load
    }

    /// Returns how much more load the unit can take.
    #[inline]
    pub const fn remaining_capacity(&self) -> i64 {
        self.max_capacity - self.current_load
    }

    /// Sets the current load, clamped to `0..=max_capacity`.
    #[inline]
    pub fn set_load(&mut self, new_load: i64) {
        self.current_load = new_load.min(self.max_capacity).max(0);
    }

    /// Returns `true` once the load has reached capacity.
    #[inline]
    pub const fn is_full(&self) -> bool {
        self.current_load >= self.max_capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_unit_is_empty() {
        let unit = Unit::new(1, 8);
        assert_eq!(unit.id(), 1);
        assert_eq!(unit.current_load(), 0);
        assert_eq!(unit.remaining_capacity(), 8);
        assert!(!unit.is_full());
    }

    #[test]
    fn set_load_clamps_to_capacity() {
        let mut unit = Unit::new(1, 8);

        unit.set_load(5);
        assert_eq!(unit.current_load(), 5);
        assert_eq!(unit.remaining_capacity(), 3);

        unit.set_load(100);
        assert_eq!(unit.current_load(), 8);
        assert_eq!(unit.remaining_capacity(), 0);
        assert!(unit.is_full());
    }

    #[test]
    fn set_load_never_negative() {
        let mut unit = Unit::new(1, 8);
        unit.set_load(-3);
        assert_eq!(unit.current_load(), 0);
    }
}
