//! Core domain logic for DevTasks.
//! This crate is the single source of truth for task tree invariants.

pub mod board;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod template;
pub mod tree;

pub use board::{board, classify, filtered_board, search_roots, Board, BoardColumn};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::task::{Forest, ForestValidationError, Task, TaskId, TaskPatch};
pub use repo::task_store::{
    MemoryTaskStore, SqliteTaskStore, StoreError, StoreResult, TaskStore, DEFAULT_SLOT,
};
pub use service::task_service::{
    MutationPolicy, TaskService, TaskServiceConfig, TaskServiceError,
};
pub use template::{apply_template, find_template, TaskTemplate, TEMPLATES};
pub use tree::count::{count, TaskCounts};
pub use tree::id::new_id;
pub use tree::locate::{contains, find};
pub use tree::mutate::{
    delete, delete_with_outcome, insert, insert_with_outcome, toggle_completion,
    toggle_completion_with_outcome, update_fields, update_fields_with_outcome, MutationOutcome,
};
pub use tree::progress::calculate_progress;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
