//! Task tree domain model.
//!
//! # Responsibility
//! - Define the task node, the forest that owns it, and partial updates.
//! - Keep one persisted shape shared by tree, board and template views.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId`, unique across the forest.
//! - Children are owned by exactly one parent; there are no cross references.
//!
//! # See also
//! - crate::tree for the algorithms that operate on this model.

pub mod task;
