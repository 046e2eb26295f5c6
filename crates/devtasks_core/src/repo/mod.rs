//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the load/save contract the task controller depends on.
//! - Isolate SQLite and serialization details from tree algorithms.
//!
//! # Invariants
//! - Repositories persist whole forests; there is no per-task storage.

pub mod task_store;
