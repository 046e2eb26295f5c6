//! Recursive task tree algorithms.
//!
//! # Responsibility
//! - Mutate a forest by producing a new forest value (`mutate`).
//! - Derive read-only values: lookup, progress, counts.
//! - Mint identifiers for new tasks.
//!
//! # Invariants
//! - Every function here is total over well-formed input and never logs.
//! - Search order is root order, then depth-first into each root's children
//!   before the next root's sibling.

pub mod count;
pub mod id;
pub mod locate;
pub mod mutate;
pub mod progress;
