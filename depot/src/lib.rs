//! Capacity-bounded pools of load-carrying units.
//!
//! A [`PoolRegistry`] holds pools keyed by a unique integer capacity
//! constraint. Units are admitted into the best-fitting pool, promoted from
//! awaiting to ready in FIFO order, loaded in bulk across ready pools, and
//! re-admitted by their remaining capacity.
//!
//! ```
//! use depot::{Placement, PoolRegistry, Unit};
//!
//! let mut registry = PoolRegistry::new();
//! registry.create(10, 2);
//! registry.create(4, 2);
//!
//! registry.admit(Unit::new(1, 10));
//! registry.mark_ready(10);
//!
//! // 6 of 10 loaded, so the unit's remaining 4 sends it to pool 4
//! assert_eq!(
//!     registry.redistribute(10, 6),
//!     vec![Placement { unit_id: 1, pool: Some(4) }]
//! );
//! ```
//!
//! The [`command`] module drives a registry from a text command stream.

pub mod command;
pub mod config;
pub mod error;
pub mod logging;
pub mod pool;
pub mod registry;
pub mod unit;

pub use command::{Command, Outcome, RunSummary};
pub use config::RegistryConfig;
pub use error::{ConsistencyError, ParseError};
pub use registry::{IndexKind, Placement, PoolId, PoolRegistry, PoolSnapshot, Promotion};
pub use unit::{Unit, UnitId};
