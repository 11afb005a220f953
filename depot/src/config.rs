//! Registry sizing configuration.

/// Pre-allocation hints for a [`PoolRegistry`](crate::PoolRegistry).
///
/// All storage grows on demand; these sizes only decide how much is reserved
/// up front so a warmed-up registry does not reallocate on the hot path.
///
/// # Example
///
/// ```
/// use depot::{PoolRegistry, RegistryConfig};
///
/// let config = RegistryConfig::default()
///     .with_unit_capacity(100_000)
///     .with_pool_capacity(1_000);
/// let registry = PoolRegistry::with_config(&config);
/// assert_eq!(registry.pool_count(), 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Units reserved in the shared unit storage.
    pub unit_capacity: usize,
    /// Pools reserved in pool storage. Index nodes are reserved for four
    /// times this many entries, one per index.
    pub pool_capacity: usize,
}

impl RegistryConfig {
    pub const DEFAULT_UNIT_CAPACITY: usize = 1024;
    pub const DEFAULT_POOL_CAPACITY: usize = 64;

    #[must_use]
    pub const fn with_unit_capacity(mut self, unit_capacity: usize) -> Self {
        self.unit_capacity = unit_capacity;
        self
    }

    #[must_use]
    pub const fn with_pool_capacity(mut self, pool_capacity: usize) -> Self {
        self.pool_capacity = pool_capacity;
        self
    }

    /// Index nodes reserved across all four indices.
    #[inline]
    pub const fn index_node_capacity(&self) -> usize {
        self.pool_capacity.saturating_mul(4)
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            unit_capacity: Self::DEFAULT_UNIT_CAPACITY,
            pool_capacity: Self::DEFAULT_POOL_CAPACITY,
        }
    }
}
