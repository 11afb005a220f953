//! Error types for command parsing and index consistency checks.

use std::num::ParseIntError;

use thiserror::Error;

use crate::registry::IndexKind;

/// A command line that could not be turned into a [`Command`](crate::Command).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("{command}: missing argument <{argument}>")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("{command}: invalid integer for <{argument}>: {value:?}")]
    InvalidInteger {
        command: &'static str,
        argument: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("{command}: unexpected argument {value:?}")]
    UnexpectedArgument { command: &'static str, value: String },

    #[error("{command}: unit limit must be at least 1")]
    ZeroUnitLimit { command: &'static str },

    #[error("{command}: unit capacity must be positive, got {capacity}")]
    NonPositiveCapacity { command: &'static str, capacity: i64 },
}

/// A broken invariant found by [`PoolRegistry::validate`](crate::PoolRegistry::validate).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConsistencyError {
    #[error("{index} index is not in ascending key order at key {key}")]
    Unordered { index: IndexKind, key: i64 },

    #[error("{index} index entry {key} points at a missing pool")]
    DanglingHandle { index: IndexKind, key: i64 },

    #[error("{index} index entry {key} points at a pool keyed {actual}")]
    KeyMismatch {
        index: IndexKind,
        key: i64,
        actual: i64,
    },

    #[error("pool {key}: membership in {index} index is {present}, expected {expected}")]
    Membership {
        index: IndexKind,
        key: i64,
        present: bool,
        expected: bool,
    },

    #[error("pool {key} holds {held} units over its limit of {limit}")]
    OverLimit { key: i64, held: usize, limit: usize },

    #[error("unit {unit_id} is linked into more than one queue")]
    DuplicateUnit { unit_id: i64 },

    #[error("{stored} units are stored but {linked} are linked into pool queues")]
    LeakedUnits { stored: usize, linked: usize },

    #[error("unit {unit_id} carries load {load} outside 0..={max}")]
    LoadOutOfRange { unit_id: i64, load: i64, max: i64 },
}
