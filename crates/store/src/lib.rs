//! Durable job storage: the record model, the pluggable store contract, and
//! the in-memory and Postgres backends.
//!
//! The store is the single source of truth and the only shared mutable
//! resource in the system. All cross-worker coordination (claim exclusivity,
//! status transitions) is delegated to it, so workers can run in separate
//! processes without any in-memory locking between them.

pub mod error;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use store::JobStore;
