//! Copy-on-write structural mutations.
//!
//! # Responsibility
//! - Apply insert, delete, toggle and field updates at any depth.
//! - Return a new forest and leave the input forest untouched.
//!
//! # Invariants
//! - Only nodes on the path from a root to the target are reallocated; every
//!   other subtree is shared with the input through its `Arc` handle.
//! - A missing target is a silent no-op: the returned forest shares every
//!   root with the input and `MutationOutcome::applied` is `false`.

use crate::model::task::{Forest, Task, TaskPatch};
use crate::tree::locate::path_to;
use std::sync::Arc;

/// Result of one mutation, reporting whether the target was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationOutcome {
    pub forest: Forest,
    pub applied: bool,
}

impl MutationOutcome {
    fn applied(forest: Forest) -> Self {
        Self {
            forest,
            applied: true,
        }
    }

    fn unchanged(forest: &Forest) -> Self {
        Self {
            forest: forest.clone(),
            applied: false,
        }
    }
}

/// Appends `new_task` as a root (`parent_id = None`) or as the last child of
/// the task with `parent_id`.
///
/// `new_task.parent_id` is overwritten with `parent_id` before placement.
pub fn insert(forest: &Forest, parent_id: Option<&str>, new_task: Task) -> Forest {
    insert_with_outcome(forest, parent_id, new_task).forest
}

/// Removes the task with `task_id` together with its whole subtree.
pub fn delete(forest: &Forest, task_id: &str) -> Forest {
    delete_with_outcome(forest, task_id).forest
}

/// Flips `completed` on the task with `task_id`; children are untouched.
pub fn toggle_completion(forest: &Forest, task_id: &str) -> Forest {
    toggle_completion_with_outcome(forest, task_id).forest
}

/// Merges `patch` into the task with `task_id`.
pub fn update_fields(forest: &Forest, task_id: &str, patch: &TaskPatch) -> Forest {
    update_fields_with_outcome(forest, task_id, patch).forest
}

/// Same as [`insert`], also reporting whether the parent was found.
pub fn insert_with_outcome(
    forest: &Forest,
    parent_id: Option<&str>,
    mut new_task: Task,
) -> MutationOutcome {
    new_task.parent_id = parent_id.map(str::to_owned);

    let Some(parent_id) = parent_id else {
        let mut roots = forest.roots().to_vec();
        roots.push(Arc::new(new_task));
        return MutationOutcome::applied(Forest::from_roots(roots));
    };

    edit_target(forest, parent_id, move |parent| {
        let mut parent = parent.clone();
        parent.children.push(Arc::new(new_task));
        Some(parent)
    })
}

/// Same as [`delete`], also reporting whether the task was found.
pub fn delete_with_outcome(forest: &Forest, task_id: &str) -> MutationOutcome {
    edit_target(forest, task_id, |_| None)
}

/// Same as [`toggle_completion`], also reporting whether the task was found.
pub fn toggle_completion_with_outcome(forest: &Forest, task_id: &str) -> MutationOutcome {
    edit_target(forest, task_id, |task| {
        let mut task = task.clone();
        task.completed = !task.completed;
        Some(task)
    })
}

/// Same as [`update_fields`], also reporting whether the task was found.
pub fn update_fields_with_outcome(
    forest: &Forest,
    task_id: &str,
    patch: &TaskPatch,
) -> MutationOutcome {
    edit_target(forest, task_id, |task| Some(patch.apply_to(task)))
}

/// Locates `task_id` and rebuilds the path to it with `edit`'s replacement.
///
/// `edit` returning `None` removes the target.
fn edit_target<F>(forest: &Forest, task_id: &str, edit: F) -> MutationOutcome
where
    F: FnOnce(&Task) -> Option<Task>,
{
    match path_to(forest.roots(), task_id) {
        Some(path) => {
            MutationOutcome::applied(Forest::from_roots(rebuild(forest.roots(), &path, edit)))
        }
        None => MutationOutcome::unchanged(forest),
    }
}

fn rebuild<F>(nodes: &[Arc<Task>], path: &[usize], edit: F) -> Vec<Arc<Task>>
where
    F: FnOnce(&Task) -> Option<Task>,
{
    let Some((&index, rest)) = path.split_first() else {
        return nodes.to_vec();
    };
    let Some(node) = nodes.get(index) else {
        return nodes.to_vec();
    };

    let replacement = if rest.is_empty() {
        edit(node)
    } else {
        Some(with_children(node, rebuild(&node.children, rest, edit)))
    };

    let mut rebuilt = Vec::with_capacity(nodes.len());
    rebuilt.extend_from_slice(&nodes[..index]);
    rebuilt.extend(replacement.map(Arc::new));
    rebuilt.extend_from_slice(&nodes[index + 1..]);
    rebuilt
}

fn with_children(node: &Task, children: Vec<Arc<Task>>) -> Task {
    Task {
        id: node.id.clone(),
        title: node.title.clone(),
        description: node.description.clone(),
        completed: node.completed,
        children,
        parent_id: node.parent_id.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::{delete, delete_with_outcome, insert, insert_with_outcome, toggle_completion};
    use crate::model::task::{Forest, Task};
    use std::sync::Arc;

    fn two_branches() -> Forest {
        let forest = Forest::from(vec![Task::with_id("a", "A"), Task::with_id("b", "B")]);
        let forest = insert(&forest, Some("a"), Task::with_id("a1", "A1"));
        insert(&forest, Some("b"), Task::with_id("b1", "B1"))
    }

    #[test]
    fn untouched_branches_are_shared() {
        let before = two_branches();
        let after = toggle_completion(&before, "a1");

        assert!(!Arc::ptr_eq(&before.roots()[0], &after.roots()[0]));
        assert!(Arc::ptr_eq(&before.roots()[1], &after.roots()[1]));
        assert!(!before.roots()[0].children[0].completed);
        assert!(after.roots()[0].children[0].completed);
    }

    #[test]
    fn missing_target_shares_every_root() {
        let before = two_branches();
        let outcome = delete_with_outcome(&before, "ghost");

        assert!(!outcome.applied);
        for (old, new) in before.roots().iter().zip(outcome.forest.roots()) {
            assert!(Arc::ptr_eq(old, new));
        }
    }

    #[test]
    fn insert_overwrites_caller_parent_id() {
        let mut orphan = Task::with_id("x", "X");
        orphan.parent_id = Some("bogus".to_string());

        let outcome = insert_with_outcome(&two_branches(), Some("b1"), orphan.clone());
        assert!(outcome.applied);
        let placed = &outcome.forest.roots()[1].children[0].children[0];
        assert_eq!(placed.parent_id.as_deref(), Some("b1"));

        let rooted = insert(&Forest::new(), None, orphan);
        assert_eq!(rooted.roots()[0].parent_id, None);
    }

    #[test]
    fn insert_appends_after_existing_children() {
        let forest = insert(&two_branches(), Some("a"), Task::with_id("a2", "A2"));
        let ids = forest.roots()[0]
            .children
            .iter()
            .map(|t| t.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["a1", "a2"]);
    }

    #[test]
    fn delete_root_keeps_sibling_order() {
        let forest = Forest::from(vec![
            Task::with_id("1", "one"),
            Task::with_id("2", "two"),
            Task::with_id("3", "three"),
        ]);
        let forest = delete(&forest, "2");
        let ids = forest
            .roots()
            .iter()
            .map(|t| t.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["1", "3"]);
    }
}
