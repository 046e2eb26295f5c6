//! Flutter-facing bindings for DevTasks core.

pub mod api;
