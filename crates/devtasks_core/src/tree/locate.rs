//! Depth-first task lookup.

use crate::model::task::{Forest, Task};
use std::sync::Arc;

/// Finds the first task with `task_id` in search order.
///
/// Returns a read-only view into the forest; changes go through `mutate`.
pub fn find<'a>(forest: &'a Forest, task_id: &str) -> Option<&'a Task> {
    forest.iter().find(|task| task.id == task_id)
}

/// Returns whether any task in the forest has `task_id`.
pub fn contains(forest: &Forest, task_id: &str) -> bool {
    find(forest, task_id).is_some()
}

/// Returns sibling indices leading from the root list to `task_id`.
///
/// Follows the same search order as `find`, so both agree on which node is
/// the target when ids are duplicated.
pub(crate) fn path_to(nodes: &[Arc<Task>], task_id: &str) -> Option<Vec<usize>> {
    for (index, node) in nodes.iter().enumerate() {
        if node.id == task_id {
            return Some(vec![index]);
        }
        if let Some(mut path) = path_to(&node.children, task_id) {
            path.insert(0, index);
            return Some(path);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::{contains, find, path_to};
    use crate::model::task::{Forest, Task};
    use std::sync::Arc;

    fn sample() -> Forest {
        let mut a = Task::with_id("a", "A");
        let mut dup = Task::with_id("dup", "nested");
        dup.parent_id = Some("a".to_string());
        a.children.push(Arc::new(dup));
        Forest::from(vec![a, Task::with_id("dup", "root level")])
    }

    #[test]
    fn find_prefers_depth_first_match_over_later_root() {
        let forest = sample();
        assert_eq!(find(&forest, "dup").map(|t| t.title.as_str()), Some("nested"));
        assert_eq!(path_to(forest.roots(), "dup"), Some(vec![0, 0]));
    }

    #[test]
    fn missing_id_is_not_found() {
        let forest = sample();
        assert!(find(&forest, "nope").is_none());
        assert!(!contains(&forest, "nope"));
        assert!(contains(&forest, "a"));
    }
}
