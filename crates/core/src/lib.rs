//! Pure domain rules for the conveyor job system.
//!
//! This crate has zero internal dependencies so that the store, engine, and
//! any future CLI tooling can all share the same constants and state machine
//! without pulling in sqlx or the runtime.

pub mod backoff;
pub mod scheduling;
pub mod types;
