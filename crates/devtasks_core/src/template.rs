//! Built-in task breakdown templates.
//!
//! # Responsibility
//! - Provide stable starter breakdowns for common development work.
//! - Materialize one template as a group task with one leaf per step.

use crate::model::task::{Forest, Task, TaskId};
use crate::tree::mutate::{insert_with_outcome, MutationOutcome};
use std::sync::Arc;

/// One starter breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskTemplate {
    /// Stable template id.
    pub id: &'static str,
    /// Title given to the created group task.
    pub name: &'static str,
    /// Ordered step titles, one child task each.
    pub steps: &'static [&'static str],
}

pub const TEMPLATES: &[TaskTemplate] = &[
    TaskTemplate {
        id: "api-setup",
        name: "API Setup",
        steps: &[
            "Set up project structure",
            "Configure database connection",
            "Create models/schemas",
            "Set up routing",
            "Add authentication middleware",
            "Write API endpoints",
            "Add validation",
            "Write tests",
            "Add documentation",
        ],
    },
    TaskTemplate {
        id: "ui-component",
        name: "UI Component",
        steps: &[
            "Design component interface",
            "Create base component structure",
            "Add styling with CSS/Tailwind",
            "Implement props and state",
            "Add accessibility features",
            "Handle edge cases",
            "Write unit tests",
            "Create Storybook stories",
            "Update documentation",
        ],
    },
    TaskTemplate {
        id: "web-app",
        name: "Web Application",
        steps: &[
            "Set up project and dependencies",
            "Configure build tools",
            "Create routing structure",
            "Design database schema",
            "Implement authentication",
            "Build core features",
            "Add responsive design",
            "Implement state management",
            "Add error handling",
            "Write tests",
            "Deploy to production",
        ],
    },
    TaskTemplate {
        id: "mobile-app",
        name: "Mobile App",
        steps: &[
            "Set up development environment",
            "Create app structure",
            "Design UI/UX mockups",
            "Implement navigation",
            "Add core functionality",
            "Integrate with APIs",
            "Handle permissions",
            "Add offline support",
            "Implement push notifications",
            "Test on devices",
            "Submit to app stores",
        ],
    },
    TaskTemplate {
        id: "testing-suite",
        name: "Testing Suite",
        steps: &[
            "Set up testing framework",
            "Write unit tests",
            "Create integration tests",
            "Add end-to-end tests",
            "Set up test coverage",
            "Configure CI/CD pipeline",
            "Add performance tests",
            "Create test documentation",
        ],
    },
];

/// Looks up a built-in template by id.
pub fn find_template(id: &str) -> Option<&'static TaskTemplate> {
    TEMPLATES.iter().find(|template| template.id == id)
}

impl TaskTemplate {
    /// Builds a detached group task for this template.
    ///
    /// Children already carry the group id as `parent_id`; the group's own
    /// `parent_id` is assigned on insert.
    pub fn instantiate(&self) -> Task {
        let mut group = Task::new(self.name);
        let group_id: TaskId = group.id.clone();
        group.children = self
            .steps
            .iter()
            .map(|step| {
                let mut child = Task::new(*step);
                child.parent_id = Some(group_id.clone());
                Arc::new(child)
            })
            .collect();
        group
    }
}

/// Inserts a fresh instance of `template` under `parent_id` (or as a root).
///
/// Returns the new group id with the outcome. Follows insert semantics: a
/// missing parent leaves the forest unchanged and the id is never placed.
pub fn apply_template(
    forest: &Forest,
    template: &TaskTemplate,
    parent_id: Option<&str>,
) -> (TaskId, MutationOutcome) {
    let group = template.instantiate();
    let group_id = group.id.clone();
    (group_id, insert_with_outcome(forest, parent_id, group))
}
