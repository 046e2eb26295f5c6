//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the task board operations to Dart via FRB.
//! - Keep error semantics simple: envelopes with `ok` + message.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every mutating call loads, mutates and saves within one DB connection.
//! - Missing targets are reported as `changed=false`, not as failures.

use devtasks_core::db::open_db;
use devtasks_core::{
    calculate_progress, core_version as core_version_inner, init_logging as init_logging_inner,
    ping as ping_inner, Board, SqliteTaskStore, Task, TaskPatch, TaskService, TaskServiceConfig,
    TEMPLATES,
};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

const DB_FILE_NAME: &str = "devtasks.sqlite3";
static DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Task node projected for rendering, with derived progress.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskView {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub parent_id: Option<String>,
    /// Aggregated progress in `[0, 100]`.
    pub progress: f64,
    pub children: Vec<TaskView>,
}

/// Whole-forest response for the tree view.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskTreeResponse {
    pub items: Vec<TaskView>,
    pub total: u32,
    pub completed: u32,
    pub message: String,
}

/// Board response for the kanban view.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskBoardResponse {
    pub todo: Vec<TaskView>,
    pub in_progress: Vec<TaskView>,
    pub done: Vec<TaskView>,
    pub message: String,
}

/// Generic action response envelope for mutating calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskActionResponse {
    /// Whether the call completed without error.
    pub ok: bool,
    /// Whether the forest changed (false when the target was missing).
    pub changed: bool,
    /// Created or targeted task id.
    pub task_id: Option<String>,
    pub message: String,
}

impl TaskActionResponse {
    fn changed(message: impl Into<String>, task_id: Option<String>) -> Self {
        Self {
            ok: true,
            changed: true,
            task_id,
            message: message.into(),
        }
    }

    fn unchanged(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            changed: false,
            task_id: None,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            changed: false,
            task_id: None,
            message: message.into(),
        }
    }
}

/// Template descriptor for the template picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskTemplateItem {
    pub id: String,
    pub name: String,
    pub steps: Vec<String>,
}

/// Loads the whole forest with derived progress and counts.
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_tree() -> TaskTreeResponse {
    match with_task_service(|service| {
        let counts = service.counts();
        let items = service
            .forest()
            .roots()
            .iter()
            .map(to_task_view)
            .collect::<Vec<_>>();
        (items, counts)
    }) {
        Ok((items, counts)) => TaskTreeResponse {
            items,
            total: counts.total as u32,
            completed: counts.completed as u32,
            message: String::new(),
        },
        Err(err) => TaskTreeResponse {
            items: Vec::new(),
            total: 0,
            completed: 0,
            message: format!("tasks_tree failed: {err}"),
        },
    }
}

/// Loads one task by id.
#[flutter_rust_bridge::frb(sync)]
pub fn task_get(task_id: String) -> Option<TaskView> {
    with_task_service(|service| service.find(task_id.as_str()).map(task_view))
        .ok()
        .flatten()
}

/// Projects root tasks into board columns, optionally filtered by title.
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_board(query: Option<String>) -> TaskBoardResponse {
    let query = query.unwrap_or_default();
    match with_task_service(|service| service.filtered_board(query.as_str())) {
        Ok(board) => to_board_response(board),
        Err(err) => TaskBoardResponse {
            todo: Vec::new(),
            in_progress: Vec::new(),
            done: Vec::new(),
            message: format!("tasks_board failed: {err}"),
        },
    }
}

/// Creates a task as root (`parent_id=None`) or under an existing task.
#[flutter_rust_bridge::frb(sync)]
pub fn task_add(
    parent_id: Option<String>,
    title: String,
    description: Option<String>,
) -> TaskActionResponse {
    let result = with_task_service(|service| {
        service.add_task(parent_id.as_deref(), title, description)
    });
    match result {
        Ok(Ok(Some(task_id))) => TaskActionResponse::changed("Task created.", Some(task_id)),
        Ok(Ok(None)) => TaskActionResponse::unchanged("Parent task not found."),
        Ok(Err(err)) => TaskActionResponse::failure(format!("task_add failed: {err}")),
        Err(err) => TaskActionResponse::failure(format!("task_add failed: {err}")),
    }
}

/// Deletes a task and its subtasks.
#[flutter_rust_bridge::frb(sync)]
pub fn task_delete(task_id: String) -> TaskActionResponse {
    let result = with_task_service(|service| service.delete_task(task_id.as_str()));
    to_action_response("task_delete", "Task deleted.", task_id, result)
}

/// Flips completion of a task.
#[flutter_rust_bridge::frb(sync)]
pub fn task_toggle(task_id: String) -> TaskActionResponse {
    let result = with_task_service(|service| service.toggle_task(task_id.as_str()));
    to_action_response("task_toggle", "Task toggled.", task_id, result)
}

/// Updates title and/or description of a task.
///
/// Input semantics:
/// - `title=None` keeps the current title.
/// - `description=None` keeps the description unless `clear_description`.
#[flutter_rust_bridge::frb(sync)]
pub fn task_update(
    task_id: String,
    title: Option<String>,
    description: Option<String>,
    clear_description: bool,
) -> TaskActionResponse {
    let mut patch = TaskPatch::new();
    patch.title = title;
    if clear_description {
        patch.description = Some(None);
    } else if let Some(description) = description {
        patch.description = Some(Some(description));
    }

    let result = with_task_service(|service| service.update_task(task_id.as_str(), patch));
    to_action_response("task_update", "Task updated.", task_id, result)
}

/// Lists built-in task templates.
#[flutter_rust_bridge::frb(sync)]
pub fn task_templates() -> Vec<TaskTemplateItem> {
    TEMPLATES
        .iter()
        .map(|template| TaskTemplateItem {
            id: template.id.to_string(),
            name: template.name.to_string(),
            steps: template.steps.iter().map(|step| step.to_string()).collect(),
        })
        .collect()
}

/// Creates a group task from a built-in template.
#[flutter_rust_bridge::frb(sync)]
pub fn task_apply_template(template_id: String, parent_id: Option<String>) -> TaskActionResponse {
    let result = with_task_service(|service| {
        service.apply_template(template_id.as_str(), parent_id.as_deref())
    });
    match result {
        Ok(Ok(Some(task_id))) => TaskActionResponse::changed("Template applied.", Some(task_id)),
        Ok(Ok(None)) => TaskActionResponse::unchanged("Parent task not found."),
        Ok(Err(err)) => {
            TaskActionResponse::failure(format!("task_apply_template failed: {err}"))
        }
        Err(err) => TaskActionResponse::failure(format!("task_apply_template failed: {err}")),
    }
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("DEVTASKS_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn with_task_service<T>(
    f: impl FnOnce(&mut TaskService<SqliteTaskStore<'_>>) -> T,
) -> Result<T, String> {
    let db_path = resolve_db_path();
    let conn = open_db(&db_path).map_err(|err| format!("task DB open failed: {err}"))?;
    let store =
        SqliteTaskStore::try_new(&conn).map_err(|err| format!("task store init failed: {err}"))?;
    let mut service = TaskService::open(store, TaskServiceConfig::default())
        .map_err(|err| format!("task load failed: {err}"))?;
    Ok(f(&mut service))
}

fn to_action_response<E: std::fmt::Display>(
    op: &str,
    success_message: &str,
    task_id: String,
    result: Result<Result<bool, E>, String>,
) -> TaskActionResponse {
    match result {
        Ok(Ok(true)) => TaskActionResponse::changed(success_message, Some(task_id)),
        Ok(Ok(false)) => TaskActionResponse::unchanged("Task not found."),
        Ok(Err(err)) => TaskActionResponse::failure(format!("{op} failed: {err}")),
        Err(err) => TaskActionResponse::failure(format!("{op} failed: {err}")),
    }
}

fn to_task_view(task: &Arc<Task>) -> TaskView {
    task_view(task)
}

fn task_view(task: &Task) -> TaskView {
    TaskView {
        id: task.id.clone(),
        title: task.title.clone(),
        description: task.description.clone(),
        completed: task.completed,
        parent_id: task.parent_id.clone(),
        progress: calculate_progress(task),
        children: task.children.iter().map(to_task_view).collect(),
    }
}

fn to_board_response(board: Board) -> TaskBoardResponse {
    let views = |tasks: Vec<Arc<Task>>| tasks.iter().map(to_task_view).collect::<Vec<_>>();
    TaskBoardResponse {
        todo: views(board.todo),
        in_progress: views(board.in_progress),
        done: views(board.done),
        message: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, init_logging, ping, task_add, task_apply_template, task_delete, task_get,
        task_templates, task_toggle, task_update, tasks_board, tasks_tree,
    };
    use std::sync::Mutex;
    use std::time::{SystemTime, UNIX_EPOCH};

    // Calls share one DB file and each call rewrites the whole document.
    static DB_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn task_add_nests_and_reports_progress() {
        let _guard = DB_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let root = task_add(None, unique_token("ffi-root"), None);
        assert!(root.ok && root.changed, "{}", root.message);
        let root_id = root.task_id.expect("root should return task_id");

        let child = task_add(Some(root_id.clone()), "child".to_string(), None);
        let child_id = child.task_id.expect("child should return task_id");
        let toggled = task_toggle(child_id.clone());
        assert!(toggled.changed, "{}", toggled.message);

        let view = task_get(root_id.clone()).expect("root should be found");
        assert_eq!(view.children.len(), 1);
        assert_eq!(view.children[0].parent_id.as_deref(), Some(root_id.as_str()));
        assert_eq!(view.progress, 100.0);

        let tree = tasks_tree();
        assert!(tree.items.iter().any(|item| item.id == root_id));
        assert!(tree.completed >= 1);

        assert!(task_delete(root_id.clone()).changed);
        assert!(task_get(child_id).is_none());
    }

    #[test]
    fn missing_targets_are_unchanged_not_failures() {
        let _guard = DB_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let ghost = unique_token("ghost");

        let toggled = task_toggle(ghost.clone());
        assert!(toggled.ok);
        assert!(!toggled.changed);

        let added = task_add(Some(ghost), "orphan".to_string(), None);
        assert!(added.ok);
        assert!(!added.changed);
        assert_eq!(added.task_id, None);
    }

    #[test]
    fn task_add_rejects_blank_title() {
        let _guard = DB_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let response = task_add(None, "   ".to_string(), None);
        assert!(!response.ok);
        assert!(response.message.contains("blank"));
    }

    #[test]
    fn task_update_can_set_and_clear_description() {
        let _guard = DB_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let created = task_add(None, unique_token("ffi-update"), Some("draft".to_string()));
        let task_id = created.task_id.expect("task should be created");

        let updated = task_update(task_id.clone(), Some("Renamed".to_string()), None, false);
        assert!(updated.changed, "{}", updated.message);
        let view = task_get(task_id.clone()).expect("task should exist");
        assert_eq!(view.title, "Renamed");
        assert_eq!(view.description.as_deref(), Some("draft"));

        task_update(task_id.clone(), None, None, true);
        let view = task_get(task_id.clone()).expect("task should exist");
        assert_eq!(view.description, None);

        task_delete(task_id);
    }

    #[test]
    fn board_filters_by_query_and_templates_apply() {
        let _guard = DB_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        assert_eq!(task_templates().len(), 5);

        let applied = task_apply_template("ui-component".to_string(), None);
        assert!(applied.changed, "{}", applied.message);
        let group_id = applied.task_id.expect("template should return group id");

        let token = unique_token("board");
        let created = task_add(None, token.clone(), None);
        let board = tasks_board(Some(token.to_uppercase()));
        assert_eq!(board.todo.len(), 1);
        assert_eq!(Some(board.todo[0].id.clone()), created.task_id);

        task_delete(group_id);
        if let Some(id) = created.task_id {
            task_delete(id);
        }
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
