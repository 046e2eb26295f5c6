//! Task and forest domain model.
//!
//! # Responsibility
//! - Define the canonical task node and its JSON wire shape.
//! - Provide the immutable `Forest` value every tree operation consumes.
//! - Validate forests that arrive from outside the process.
//!
//! # Invariants
//! - `id` is assigned once and never changed by any operation.
//! - `parent_id` equals the id of the structural parent, or `None` at root.
//! - Subtrees are held behind `Arc` and never mutated in place; a changed
//!   node is always a new allocation.

use crate::tree::id::new_id;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Opaque task identifier.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
/// Stored data may carry ids minted by older clients, so no format is assumed.
pub type TaskId = String;

/// One node of the task forest.
///
/// A task without children is a leaf; a task with children is a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Stable id, unique across the forest.
    pub id: TaskId,
    /// Display title. Blank titles are rejected by callers, not here.
    pub title: String,
    /// Optional free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Completion flag. Only leaf flags feed progress aggregation.
    pub completed: bool,
    /// Ordered children; insertion order is display order.
    #[serde(default)]
    pub children: Vec<Arc<Task>>,
    /// Cached parent id. `None` means root-level task.
    ///
    /// Must be present on the wire, as `null` for roots.
    #[serde(deserialize_with = "required_nullable")]
    pub parent_id: Option<TaskId>,
}

/// Reads a nullable field without the implicit `None` serde gives a missing
/// `Option` field.
fn required_nullable<'de, D>(deserializer: D) -> Result<Option<TaskId>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::deserialize(deserializer)
}

impl Task {
    /// Creates a new incomplete leaf task with a generated id.
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_id(new_id(), title)
    }

    /// Creates a new incomplete leaf task with a caller-provided id.
    ///
    /// Used by import paths and tests where identity already exists.
    pub fn with_id(id: impl Into<TaskId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            completed: false,
            children: Vec::new(),
            parent_id: None,
        }
    }

    /// Sets description while building a task.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns whether this task has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns whether this task has at least one child.
    pub fn is_group(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Partial update for one task.
///
/// Every field is present-or-absent. An absent field leaves the target value
/// untouched; `description: Some(None)` explicitly clears the description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
}

impl TaskPatch {
    /// Creates an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets or clears (`None`) the description.
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    /// Returns whether the patch carries no field at all.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.completed.is_none()
    }

    /// Returns a copy of `task` with patched fields merged in.
    ///
    /// `id`, `children` and `parent_id` are never touched.
    pub(crate) fn apply_to(&self, task: &Task) -> Task {
        let mut patched = task.clone();
        if let Some(title) = &self.title {
            patched.title = title.clone();
        }
        if let Some(description) = &self.description {
            patched.description = description.clone();
        }
        if let Some(completed) = self.completed {
            patched.completed = completed;
        }
        patched
    }
}

/// Ordered sequence of independent task trees.
///
/// Serialized as a bare JSON array of root tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Forest {
    roots: Vec<Arc<Task>>,
}

impl Forest {
    /// Creates an empty forest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a forest from already shared root handles.
    pub fn from_roots(roots: Vec<Arc<Task>>) -> Self {
        Self { roots }
    }

    /// Root tasks in display order.
    pub fn roots(&self) -> &[Arc<Task>] {
        &self.roots
    }

    /// Returns whether the forest has no root task.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Iterates every task depth-first: root order, then each root's
    /// children before the next root.
    pub fn iter(&self) -> DepthFirst<'_> {
        DepthFirst {
            stack: vec![self.roots.iter()],
        }
    }

    /// Checks id uniqueness and `parent_id` agreement with placement.
    ///
    /// # Errors
    /// - `DuplicateId` when two nodes share one id.
    /// - `ParentMismatch` when a cached `parent_id` disagrees with the tree.
    pub fn validate(&self) -> Result<(), ForestValidationError> {
        let mut seen = HashSet::new();
        validate_level(&self.roots, None, &mut seen)
    }
}

impl From<Vec<Task>> for Forest {
    fn from(roots: Vec<Task>) -> Self {
        Self::from_roots(roots.into_iter().map(Arc::new).collect())
    }
}

impl<'a> IntoIterator for &'a Forest {
    type Item = &'a Task;
    type IntoIter = DepthFirst<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Pre-order depth-first iterator over a forest.
pub struct DepthFirst<'a> {
    stack: Vec<std::slice::Iter<'a, Arc<Task>>>,
}

impl<'a> Iterator for DepthFirst<'a> {
    type Item = &'a Task;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let level = self.stack.last_mut()?;
            match level.next() {
                Some(task) => {
                    self.stack.push(task.children.iter());
                    return Some(task);
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// Structural corruption found in a forest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForestValidationError {
    /// The same id appears on more than one node.
    DuplicateId(TaskId),
    /// Cached parent id does not match tree placement.
    ParentMismatch {
        id: TaskId,
        expected: Option<TaskId>,
        actual: Option<TaskId>,
    },
}

impl Display for ForestValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateId(id) => write!(f, "duplicate task id: {id}"),
            Self::ParentMismatch {
                id,
                expected,
                actual,
            } => write!(
                f,
                "task {id} has parentId {} but is placed under {}",
                actual.as_deref().unwrap_or("<root>"),
                expected.as_deref().unwrap_or("<root>")
            ),
        }
    }
}

impl Error for ForestValidationError {}

fn validate_level(
    nodes: &[Arc<Task>],
    parent_id: Option<&str>,
    seen: &mut HashSet<TaskId>,
) -> Result<(), ForestValidationError> {
    for node in nodes {
        if !seen.insert(node.id.clone()) {
            return Err(ForestValidationError::DuplicateId(node.id.clone()));
        }
        if node.parent_id.as_deref() != parent_id {
            return Err(ForestValidationError::ParentMismatch {
                id: node.id.clone(),
                expected: parent_id.map(str::to_owned),
                actual: node.parent_id.clone(),
            });
        }
        validate_level(&node.children, Some(node.id.as_str()), seen)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Forest, ForestValidationError, Task, TaskPatch};
    use std::sync::Arc;

    fn child_of(parent: &str, id: &str) -> Task {
        let mut task = Task::with_id(id, id);
        task.parent_id = Some(parent.to_string());
        task
    }

    #[test]
    fn iter_visits_depth_first_in_root_order() {
        let mut a = Task::with_id("a", "A");
        let mut a1 = child_of("a", "a1");
        a1.children.push(Arc::new(child_of("a1", "a1x")));
        a.children = vec![Arc::new(a1), Arc::new(child_of("a", "a2"))];
        let forest = Forest::from(vec![a, Task::with_id("b", "B")]);

        let order = forest.iter().map(|task| task.id.as_str()).collect::<Vec<_>>();
        assert_eq!(order, vec!["a", "a1", "a1x", "a2", "b"]);
        let groups = forest.iter().filter(|task| task.is_group()).count();
        assert_eq!(groups, 2);
    }

    #[test]
    fn validate_rejects_duplicate_ids() {
        let forest = Forest::from(vec![Task::with_id("x", "one"), Task::with_id("x", "two")]);
        assert_eq!(
            forest.validate().unwrap_err(),
            ForestValidationError::DuplicateId("x".to_string())
        );
    }

    #[test]
    fn validate_rejects_stale_parent_id() {
        let mut root = Task::with_id("root", "Root");
        root.children.push(Arc::new(child_of("elsewhere", "child")));
        let forest = Forest::from(vec![root]);

        let err = forest.validate().unwrap_err();
        assert!(matches!(
            err,
            ForestValidationError::ParentMismatch { ref id, .. } if id == "child"
        ));
    }

    #[test]
    fn patch_leaves_absent_fields_untouched() {
        let task = Task::with_id("t", "Title").with_description("keep me");
        let patched = TaskPatch::new().title("Renamed").apply_to(&task);
        assert_eq!(patched.title, "Renamed");
        assert_eq!(patched.description.as_deref(), Some("keep me"));
        assert!(!patched.completed);

        let cleared = TaskPatch::new().description(None).apply_to(&task);
        assert_eq!(cleared.title, "Title");
        assert_eq!(cleared.description, None);
        assert!(TaskPatch::new().is_empty());
    }
}
