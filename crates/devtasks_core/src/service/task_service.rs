//! Task board controller.
//!
//! # Responsibility
//! - Hold the current forest and swap it for each mutation result.
//! - Normalize caller input (titles) at the boundary above tree algorithms.
//! - Persist after every applied mutation through an injected `TaskStore`.
//!
//! # Invariants
//! - The held forest is never mutated in place; it is replaced whole.
//! - A corrupt stored document yields an empty forest; a store that cannot
//!   be read fails `open`, so nothing is ever saved over unread data.
//! - Save failures are logged and do not roll back the in-memory forest.
//! - `Strict` policy reports missing targets; `Lenient` treats them as no-ops.

use crate::board::{self, Board};
use crate::model::task::{Forest, Task, TaskId, TaskPatch};
use crate::repo::task_store::{StoreError, TaskStore};
use crate::template::{apply_template, find_template};
use crate::tree::count::{count, TaskCounts};
use crate::tree::locate::find;
use crate::tree::mutate::{
    delete_with_outcome, insert_with_outcome, toggle_completion_with_outcome,
    update_fields_with_outcome, MutationOutcome,
};
use crate::tree::progress::calculate_progress;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// How mutations react to a target id that is not in the forest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MutationPolicy {
    /// Silent no-op; suits UI races where the target was just deleted.
    #[default]
    Lenient,
    /// Return `TaskNotFound` / `ParentNotFound` and save nothing.
    Strict,
}

/// Controller configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskServiceConfig {
    pub policy: MutationPolicy,
    /// Reject loaded forests with duplicate ids or stale parent ids.
    pub validate_on_load: bool,
}

impl Default for TaskServiceConfig {
    fn default() -> Self {
        Self {
            policy: MutationPolicy::Lenient,
            validate_on_load: true,
        }
    }
}

/// Errors from task service operations.
#[derive(Debug)]
pub enum TaskServiceError {
    /// Title is blank after trim.
    InvalidTitle,
    /// Target task does not exist (strict policy only).
    TaskNotFound(TaskId),
    /// Requested parent does not exist (strict policy only).
    ParentNotFound(TaskId),
    /// No built-in template has this id.
    UnknownTemplate(String),
    /// Store-level failure.
    Store(StoreError),
}

impl Display for TaskServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTitle => write!(f, "task title must not be blank"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "parent task not found: {id}"),
            Self::UnknownTemplate(id) => write!(f, "unknown task template: {id}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TaskServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for TaskServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Task board controller over one store.
pub struct TaskService<S: TaskStore> {
    store: S,
    config: TaskServiceConfig,
    forest: Forest,
}

impl<S: TaskStore> TaskService<S> {
    /// Loads the stored forest and creates the controller.
    ///
    /// Falls back to an empty forest when the stored document does not decode
    /// or, with `validate_on_load`, when it is structurally corrupt. Any other
    /// store failure is returned so a later save cannot clobber real data.
    pub fn open(store: S, config: TaskServiceConfig) -> Result<Self, TaskServiceError> {
        let forest = load_or_empty(&store, &config)?;
        Ok(Self {
            store,
            config,
            forest,
        })
    }

    /// Current forest value.
    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &TaskServiceConfig {
        &self.config
    }

    /// Creates a task under optional parent.
    ///
    /// Returns the new id, or `None` when the parent is missing under the
    /// lenient policy.
    pub fn add_task(
        &mut self,
        parent_id: Option<&str>,
        title: impl Into<String>,
        description: Option<String>,
    ) -> Result<Option<TaskId>, TaskServiceError> {
        let mut task = Task::new(normalize_title(title.into())?);
        task.description = description;
        let task_id = task.id.clone();

        let outcome = insert_with_outcome(&self.forest, parent_id, task);
        let applied = self.commit("add", outcome, || {
            TaskServiceError::ParentNotFound(parent_id.unwrap_or_default().to_string())
        })?;
        Ok(applied.then_some(task_id))
    }

    /// Deletes a task and its whole subtree.
    pub fn delete_task(&mut self, task_id: &str) -> Result<bool, TaskServiceError> {
        let outcome = delete_with_outcome(&self.forest, task_id);
        self.commit("delete", outcome, || {
            TaskServiceError::TaskNotFound(task_id.to_string())
        })
    }

    /// Flips completion of one task.
    pub fn toggle_task(&mut self, task_id: &str) -> Result<bool, TaskServiceError> {
        let outcome = toggle_completion_with_outcome(&self.forest, task_id);
        self.commit("toggle", outcome, || {
            TaskServiceError::TaskNotFound(task_id.to_string())
        })
    }

    /// Merges present patch fields into one task.
    ///
    /// A patched title is trimmed and must not be blank.
    pub fn update_task(
        &mut self,
        task_id: &str,
        mut patch: TaskPatch,
    ) -> Result<bool, TaskServiceError> {
        if let Some(title) = patch.title.take() {
            patch.title = Some(normalize_title(title)?);
        }
        let outcome = update_fields_with_outcome(&self.forest, task_id, &patch);
        self.commit("update", outcome, || {
            TaskServiceError::TaskNotFound(task_id.to_string())
        })
    }

    /// Inserts a built-in template as a new group task.
    pub fn apply_template(
        &mut self,
        template_id: &str,
        parent_id: Option<&str>,
    ) -> Result<Option<TaskId>, TaskServiceError> {
        let template = find_template(template_id)
            .ok_or_else(|| TaskServiceError::UnknownTemplate(template_id.to_string()))?;
        let (group_id, outcome) = apply_template(&self.forest, template, parent_id);
        let applied = self.commit("template", outcome, || {
            TaskServiceError::ParentNotFound(parent_id.unwrap_or_default().to_string())
        })?;
        Ok(applied.then_some(group_id))
    }

    /// Finds one task by id.
    pub fn find(&self, task_id: &str) -> Option<&Task> {
        find(&self.forest, task_id)
    }

    /// Returns aggregated progress of one task, if present.
    pub fn progress(&self, task_id: &str) -> Option<f64> {
        self.find(task_id).map(calculate_progress)
    }

    pub fn counts(&self) -> TaskCounts {
        count(&self.forest)
    }

    pub fn board(&self) -> Board {
        board::board(&self.forest)
    }

    /// Root tasks whose title matches `query`.
    pub fn search(&self, query: &str) -> Vec<Arc<Task>> {
        board::search_roots(&self.forest, query)
    }

    /// Board restricted to roots whose title matches `query`.
    pub fn filtered_board(&self, query: &str) -> Board {
        board::filtered_board(&self.forest, query)
    }

    fn commit(
        &mut self,
        op: &'static str,
        outcome: MutationOutcome,
        missing: impl FnOnce() -> TaskServiceError,
    ) -> Result<bool, TaskServiceError> {
        if !outcome.applied {
            return match self.config.policy {
                MutationPolicy::Lenient => {
                    info!("event=task_mutation module=service op={op} status=noop reason=target_missing");
                    Ok(false)
                }
                MutationPolicy::Strict => {
                    let err = missing();
                    warn!("event=task_mutation module=service op={op} status=error error={err}");
                    Err(err)
                }
            };
        }

        self.forest = outcome.forest;
        info!("event=task_mutation module=service op={op} status=ok");
        if let Err(err) = self.store.save(&self.forest) {
            error!(
                "event=task_save module=service op={op} status=error error_code=save_failed error={err}"
            );
        }
        Ok(true)
    }
}

fn load_or_empty<S: TaskStore>(
    store: &S,
    config: &TaskServiceConfig,
) -> Result<Forest, TaskServiceError> {
    let forest = match store.load() {
        Ok(forest) => forest,
        Err(StoreError::InvalidData(reason)) => {
            warn!(
                "event=task_load module=service status=error error_code=undecodable_forest fallback=empty error={reason}"
            );
            return Ok(Forest::new());
        }
        Err(err) => {
            let retryable = matches!(&err, StoreError::Db(db) if db.is_busy());
            error!(
                "event=task_load module=service status=error error_code=load_failed retryable={retryable} error={err}"
            );
            return Err(err.into());
        }
    };

    if config.validate_on_load {
        if let Err(err) = forest.validate() {
            warn!(
                "event=task_load module=service status=error error_code=corrupt_forest fallback=empty error={err}"
            );
            return Ok(Forest::new());
        }
    }

    info!(
        "event=task_load module=service status=ok roots={}",
        forest.roots().len()
    );
    Ok(forest)
}

fn normalize_title(value: String) -> Result<String, TaskServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TaskServiceError::InvalidTitle);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::{normalize_title, TaskServiceError};

    #[test]
    fn normalize_title_trims_and_rejects_blank() {
        assert_eq!(normalize_title("  Ship it \n".to_string()).unwrap(), "Ship it");
        assert!(matches!(
            normalize_title("   ".to_string()),
            Err(TaskServiceError::InvalidTitle)
        ));
    }
}
