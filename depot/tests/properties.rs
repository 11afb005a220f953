// Test code is allowed to panic on failure
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

//! Property-based tests for the pool registry.
//!
//! Uses proptest to drive random operation sequences and checks the
//! registry against a brute-force reading of its own pools after every step,
//! and against a plain-collections model of the same command semantics.

use std::collections::{BTreeMap, VecDeque};

use proptest::prelude::*;

use depot::{IndexKind, Placement, PoolRegistry, Unit};

/// Keys are drawn from a small range so operations collide often.
const KEY_RANGE: i64 = 20;

#[derive(Debug, Clone)]
enum Op {
    Create { key: i64, limit: usize },
    Delete { key: i64 },
    Admit { capacity: i64 },
    Ready { key: i64 },
    Load { key: i64, amount: i64 },
    Count { key: i64 },
}

fn any_key() -> impl Strategy<Value = i64> {
    0..KEY_RANGE
}

/// Strategy for generating random registry operations.
fn any_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        2 => (any_key(), 1..4usize).prop_map(|(key, limit)| Op::Create { key, limit }),
        1 => any_key().prop_map(|key| Op::Delete { key }),
        4 => (1..KEY_RANGE + 10).prop_map(|capacity| Op::Admit { capacity }),
        3 => any_key().prop_map(|key| Op::Ready { key }),
        2 => (any_key(), 0..60i64).prop_map(|(key, amount)| Op::Load { key, amount }),
        1 => (-1..KEY_RANGE).prop_map(|key| Op::Count { key }),
    ]
}

fn held(registry: &PoolRegistry, key: i64) -> Option<(usize, usize, usize)> {
    registry
        .pool(key)
        .map(|p| (p.awaiting.len(), p.ready.len(), p.unit_limit))
}

fn brute_count(registry: &PoolRegistry, key: i64) -> usize {
    (key + 1..KEY_RANGE)
        .filter_map(|k| held(registry, k))
        .map(|(awaiting, ready, _)| awaiting + ready)
        .sum()
}

/// Largest key at or below `remaining` whose pool has space.
fn expected_admission(registry: &PoolRegistry, remaining: i64) -> Option<i64> {
    (0..KEY_RANGE.min(remaining + 1))
        .rev()
        .find(|&k| held(registry, k).is_some_and(|(a, r, limit)| a + r < limit))
}

/// Smallest key at or above `key` whose pool has awaiting units.
fn expected_promotion(registry: &PoolRegistry, key: i64) -> Option<(i64, i64)> {
    (key.max(0)..KEY_RANGE).find_map(|k| {
        let pool = registry.pool(k)?;
        pool.awaiting.first().map(|&id| (id, k))
    })
}

fn apply(registry: &mut PoolRegistry, op: &Op, next_id: &mut i64) -> Result<(), TestCaseError> {
    match *op {
        Op::Create { key, limit } => {
            let existed = registry.contains_pool(key);
            prop_assert_eq!(registry.create(key, limit), !existed);
        }
        Op::Delete { key } => {
            let before = registry.pool_count();
            let existed = registry.contains_pool(key);
            prop_assert_eq!(registry.delete(key), existed);
            let expected = if existed { before - 1 } else { before };
            prop_assert_eq!(registry.pool_count(), expected);
        }
        Op::Admit { capacity } => {
            let expected = expected_admission(registry, capacity);
            *next_id += 1;
            prop_assert_eq!(registry.admit(Unit::new(*next_id, capacity)), expected);
        }
        Op::Ready { key } => {
            let expected = expected_promotion(registry, key);
            let promoted = registry.mark_ready(key).map(|p| (p.unit_id, p.pool));
            prop_assert_eq!(promoted, expected);
        }
        Op::Load { key, amount } => {
            let units_before = registry.unit_count();
            let ready_before: usize = (key..KEY_RANGE)
                .filter_map(|k| held(registry, k))
                .map(|(_, ready, _)| ready)
                .sum();

            let placements = registry.redistribute(key, amount);
            prop_assert!(placements.len() <= ready_before);
            if amount == 0 {
                prop_assert!(placements.is_empty());
            }

            let dropped = placements.iter().filter(|p| p.pool.is_none()).count();
            prop_assert_eq!(registry.unit_count(), units_before - dropped);
        }
        Op::Count { key } => {
            prop_assert_eq!(registry.count(key), brute_count(registry, key));
        }
    }
    Ok(())
}

// ============================================================================
// Queue model
// ============================================================================

/// A unit as the model sees it: id, max capacity, current load.
#[derive(Debug, Clone, Copy)]
struct ModelUnit {
    id: i64,
    max: i64,
    load: i64,
}

#[derive(Debug, Default)]
struct ModelPool {
    limit: usize,
    awaiting: VecDeque<ModelUnit>,
    ready: VecDeque<ModelUnit>,
}

impl ModelPool {
    fn has_space(&self) -> bool {
        self.awaiting.len() + self.ready.len() < self.limit
    }
}

/// The registry's command semantics over a `BTreeMap` of pools, with every
/// filtered view computed by scanning instead of maintained incrementally.
#[derive(Debug, Default)]
struct Model {
    pools: BTreeMap<i64, ModelPool>,
}

impl Model {
    fn create(&mut self, key: i64, limit: usize) -> bool {
        if self.pools.contains_key(&key) {
            return false;
        }
        self.pools.insert(
            key,
            ModelPool {
                limit,
                ..ModelPool::default()
            },
        );
        true
    }

    fn delete(&mut self, key: i64) -> bool {
        self.pools.remove(&key).is_some()
    }

    fn admit(&mut self, unit: ModelUnit) -> Option<i64> {
        let remaining = unit.max - unit.load;
        let (&key, pool) = self
            .pools
            .range_mut(..=remaining)
            .rev()
            .find(|(_, pool)| pool.has_space())?;
        pool.awaiting.push_back(unit);
        Some(key)
    }

    fn mark_ready(&mut self, key: i64) -> Option<(i64, i64)> {
        let (&found, pool) = self
            .pools
            .range_mut(key..)
            .find(|(_, pool)| !pool.awaiting.is_empty())?;
        let unit = pool.awaiting.pop_front()?;
        pool.ready.push_back(unit);
        Some((unit.id, found))
    }

    /// Starts at the first pool at or above `key` with ready units, and after
    /// each drained pool looks again for the first pool strictly above `key`.
    fn redistribute(&mut self, key: i64, mut amount: i64) -> Vec<Placement> {
        let mut placements = Vec::new();
        let mut current = self.first_ready(key..);

        while amount > 0 {
            let Some(lot) = current else { break };
            while amount > 0 {
                let pool = self.pools.get_mut(&lot);
                let Some(mut unit) = pool.and_then(|p| p.ready.pop_front()) else {
                    break;
                };
                let give = amount.min(lot).min(unit.max - unit.load);
                unit.load += give;
                amount -= give;
                if unit.load >= unit.max {
                    unit.load = 0;
                }
                placements.push(Placement {
                    unit_id: unit.id,
                    pool: self.admit(unit),
                });
            }
            current = self.first_ready((key + 1)..);
        }
        placements
    }

    fn first_ready(&self, range: impl std::ops::RangeBounds<i64>) -> Option<i64> {
        self.pools
            .range(range)
            .find(|(_, pool)| !pool.ready.is_empty())
            .map(|(&key, _)| key)
    }

    fn count(&self, key: i64) -> usize {
        self.pools
            .range((key + 1)..)
            .map(|(_, pool)| pool.awaiting.len() + pool.ready.len())
            .sum()
    }
}

fn apply_both(
    registry: &mut PoolRegistry,
    model: &mut Model,
    op: &Op,
    next_id: &mut i64,
) -> Result<(), TestCaseError> {
    match *op {
        Op::Create { key, limit } => {
            prop_assert_eq!(registry.create(key, limit), model.create(key, limit));
        }
        Op::Delete { key } => {
            prop_assert_eq!(registry.delete(key), model.delete(key));
        }
        Op::Admit { capacity } => {
            *next_id += 1;
            let unit = ModelUnit {
                id: *next_id,
                max: capacity,
                load: 0,
            };
            prop_assert_eq!(
                registry.admit(Unit::new(*next_id, capacity)),
                model.admit(unit)
            );
        }
        Op::Ready { key } => {
            let promoted = registry.mark_ready(key).map(|p| (p.unit_id, p.pool));
            prop_assert_eq!(promoted, model.mark_ready(key));
        }
        Op::Load { key, amount } => {
            prop_assert_eq!(
                registry.redistribute(key, amount),
                model.redistribute(key, amount)
            );
        }
        Op::Count { key } => {
            prop_assert_eq!(registry.count(key), model.count(key));
        }
    }
    Ok(())
}

proptest! {
    /// Property: every index stays consistent with the pools after every step,
    /// and each operation picks the pool a linear scan would pick.
    #[test]
    fn random_sequences_stay_consistent(ops in prop::collection::vec(any_op(), 1..200)) {
        let mut registry = PoolRegistry::new();
        let mut next_id = 0;

        for op in &ops {
            apply(&mut registry, op, &mut next_id)?;
            if let Err(e) = registry.validate() {
                prop_assert!(false, "after {:?}: {}", op, e);
            }
        }
    }

    /// Property: count matches a brute-force sum for every key.
    #[test]
    fn count_matches_brute_force(ops in prop::collection::vec(any_op(), 1..120)) {
        let mut registry = PoolRegistry::new();
        let mut next_id = 0;
        for op in &ops {
            apply(&mut registry, op, &mut next_id)?;
        }

        for key in -1..KEY_RANGE {
            prop_assert_eq!(registry.count(key), brute_count(&registry, key));
        }
    }

    /// Property: deleting an absent key changes nothing.
    #[test]
    fn delete_absent_is_noop(
        ops in prop::collection::vec(any_op(), 1..80),
        absent in KEY_RANGE..KEY_RANGE + 10
    ) {
        let mut registry = PoolRegistry::new();
        let mut next_id = 0;
        for op in &ops {
            apply(&mut registry, op, &mut next_id)?;
        }

        let before: Vec<_> = (0..KEY_RANGE).map(|k| registry.pool(k)).collect();
        let pools = registry.pool_count();
        prop_assert!(!registry.delete(absent));
        let after: Vec<_> = (0..KEY_RANGE).map(|k| registry.pool(k)).collect();
        prop_assert_eq!(before, after);
        prop_assert_eq!(registry.pool_count(), pools);
    }

    /// Property: membership in the filtered indices tracks pool state.
    #[test]
    fn filtered_membership_tracks_queues(ops in prop::collection::vec(any_op(), 1..120)) {
        let mut registry = PoolRegistry::new();
        let mut next_id = 0;
        for op in &ops {
            apply(&mut registry, op, &mut next_id)?;
        }

        for key in 0..KEY_RANGE {
            match held(&registry, key) {
                Some((awaiting, ready, limit)) => {
                    prop_assert!(registry.is_indexed(IndexKind::All, key));
                    prop_assert_eq!(registry.is_indexed(IndexKind::NotFull, key), awaiting + ready < limit);
                    prop_assert_eq!(registry.is_indexed(IndexKind::HasWaiting, key), awaiting > 0);
                    prop_assert_eq!(registry.is_indexed(IndexKind::HasReady, key), ready > 0);
                }
                None => {
                    for kind in [IndexKind::All, IndexKind::NotFull, IndexKind::HasWaiting, IndexKind::HasReady] {
                        prop_assert!(!registry.is_indexed(kind, key));
                    }
                }
            }
        }
    }

    /// Property: admit, ready, load and count answer exactly as the queue
    /// model does, including the order and targets of every load placement.
    #[test]
    fn commands_match_queue_model(ops in prop::collection::vec(any_op(), 1..300)) {
        let mut registry = PoolRegistry::new();
        let mut model = Model::default();
        let mut next_id = 0;

        for op in &ops {
            apply_both(&mut registry, &mut model, op, &mut next_id)?;
        }

        for key in 0..KEY_RANGE {
            let pool = registry.pool(key);
            let expected = model.pools.get(&key).map(|p| {
                let ids = |q: &VecDeque<ModelUnit>| q.iter().map(|u| u.id).collect::<Vec<_>>();
                (ids(&p.awaiting), ids(&p.ready))
            });
            prop_assert_eq!(pool.map(|p| (p.awaiting, p.ready)), expected);
        }
    }
}
