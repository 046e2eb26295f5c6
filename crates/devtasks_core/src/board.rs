//! Kanban board projection and root title search.
//!
//! # Responsibility
//! - Classify root tasks into todo / in-progress / done columns.
//! - Filter root tasks by a case-insensitive title query.
//!
//! # Invariants
//! - Only root tasks are projected; subtasks surface through their root.
//! - Column order follows forest order.

use crate::model::task::{Forest, Task};
use crate::tree::progress::calculate_progress;
use serde::Serialize;
use std::sync::Arc;

/// Board column for one root task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardColumn {
    /// Not completed and no progress yet.
    Todo,
    /// Not completed, some leaves done.
    InProgress,
    /// Own completion flag is set.
    Done,
}

impl BoardColumn {
    /// Stable lowercase label for UI/FFI layers.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }
}

/// Root tasks grouped by column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Board {
    pub todo: Vec<Arc<Task>>,
    pub in_progress: Vec<Arc<Task>>,
    pub done: Vec<Arc<Task>>,
}

/// Returns the board column for `task`.
///
/// The task's own flag wins: a group marked completed is `Done` even when its
/// aggregated progress is below 100.
pub fn classify(task: &Task) -> BoardColumn {
    if task.completed {
        BoardColumn::Done
    } else if calculate_progress(task) > 0.0 {
        BoardColumn::InProgress
    } else {
        BoardColumn::Todo
    }
}

/// Projects root tasks into board columns.
pub fn board(forest: &Forest) -> Board {
    columns(forest.roots().iter())
}

/// Returns root tasks whose title contains `query`, ignoring case.
///
/// A blank query matches every root.
pub fn search_roots(forest: &Forest, query: &str) -> Vec<Arc<Task>> {
    let needle = query.trim().to_lowercase();
    forest
        .roots()
        .iter()
        .filter(|task| needle.is_empty() || task.title.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Projects only roots matching `query` into board columns.
pub fn filtered_board(forest: &Forest, query: &str) -> Board {
    columns(search_roots(forest, query).iter())
}

fn columns<'a>(roots: impl Iterator<Item = &'a Arc<Task>>) -> Board {
    let mut board = Board::default();
    for task in roots {
        let column = match classify(task) {
            BoardColumn::Todo => &mut board.todo,
            BoardColumn::InProgress => &mut board.in_progress,
            BoardColumn::Done => &mut board.done,
        };
        column.push(Arc::clone(task));
    }
    board
}

#[cfg(test)]
mod tests {
    use super::{board, classify, filtered_board, search_roots, BoardColumn};
    use crate::model::task::{Forest, Task};
    use crate::tree::mutate::{insert, toggle_completion};

    fn sample() -> Forest {
        let forest = Forest::from(vec![
            Task::with_id("api", "Build API"),
            Task::with_id("ui", "Polish UI"),
            Task::with_id("docs", "Write docs"),
        ]);
        let forest = insert(&forest, Some("api"), Task::with_id("api-1", "Routing"));
        let forest = insert(&forest, Some("api"), Task::with_id("api-2", "Auth"));
        let forest = toggle_completion(&forest, "api-1");
        toggle_completion(&forest, "docs")
    }

    #[test]
    fn board_splits_roots_by_flag_and_progress() {
        let board = board(&sample());
        let ids = |tasks: &[std::sync::Arc<Task>]| {
            tasks.iter().map(|t| t.id.clone()).collect::<Vec<_>>()
        };
        assert_eq!(ids(&board.todo), vec!["ui"]);
        assert_eq!(ids(&board.in_progress), vec!["api"]);
        assert_eq!(ids(&board.done), vec!["docs"]);
    }

    #[test]
    fn column_labels_are_stable() {
        let forest = sample();
        let labels = forest
            .roots()
            .iter()
            .map(|task| classify(task).as_str())
            .collect::<Vec<_>>();
        assert_eq!(labels, vec!["in_progress", "todo", "done"]);
    }

    #[test]
    fn completed_group_is_done_regardless_of_progress() {
        let forest = toggle_completion(&sample(), "api");
        let api = &forest.roots()[0];
        assert_eq!(classify(api), BoardColumn::Done);
    }

    #[test]
    fn search_is_case_insensitive_and_blank_matches_all() {
        let forest = sample();
        let hits = search_roots(&forest, "  WRITE ");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "docs");
        assert_eq!(search_roots(&forest, "").len(), 3);
        assert!(search_roots(&forest, "routing").is_empty());

        let filtered = filtered_board(&forest, "ui");
        assert_eq!(filtered.todo.len(), 1);
        assert!(filtered.in_progress.is_empty());
        assert!(filtered.done.is_empty());
    }
}
