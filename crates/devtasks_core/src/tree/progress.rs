//! Bottom-up progress aggregation.

use crate::model::task::Task;

/// Returns completion percentage of `task` in `[0, 100]`.
///
/// - Leaf: `100` when completed, else `0`.
/// - Group: unweighted mean of its direct children's progress. A child group
///   of ten leaves weighs the same as a single sibling leaf.
///
/// A group's own `completed` flag is ignored; only leaf flags contribute.
pub fn calculate_progress(task: &Task) -> f64 {
    if task.children.is_empty() {
        return if task.completed { 100.0 } else { 0.0 };
    }

    let sum: f64 = task
        .children
        .iter()
        .map(|child| calculate_progress(child))
        .sum();
    sum / task.children.len() as f64
}
