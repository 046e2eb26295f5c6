//! Aggregate task statistics.

use crate::model::task::Forest;
use serde::Serialize;

/// Total and completed task counts over a forest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskCounts {
    pub total: usize,
    pub completed: usize,
}

/// Counts every task in the forest exactly once.
///
/// `completed` counts any node whose own flag is set, groups included. This
/// differs from `calculate_progress`, which ignores group flags.
pub fn count(forest: &Forest) -> TaskCounts {
    forest
        .iter()
        .fold(TaskCounts::default(), |mut counts, task| {
            counts.total += 1;
            if task.completed {
                counts.completed += 1;
            }
            counts
        })
}
