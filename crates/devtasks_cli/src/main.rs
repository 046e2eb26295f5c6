//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `devtasks_core` linkage with a deterministic ping.
//! - Print a board summary for a task database when a path is given.

use devtasks_core::db::open_db;
use devtasks_core::{
    calculate_progress, classify, SqliteTaskStore, Task, TaskService, TaskServiceConfig,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("devtasks_core ping={}", devtasks_core::ping());
    println!("devtasks_core version={}", devtasks_core::core_version());

    let Some(db_path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };

    let conn = match open_db(&db_path) {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("failed to open `{db_path}`: {err}");
            return ExitCode::FAILURE;
        }
    };
    let store = match SqliteTaskStore::try_new(&conn) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("failed to open task store: {err}");
            return ExitCode::FAILURE;
        }
    };

    let service = match TaskService::open(store, TaskServiceConfig::default()) {
        Ok(service) => service,
        Err(err) => {
            eprintln!("failed to load tasks: {err}");
            return ExitCode::FAILURE;
        }
    };
    let counts = service.counts();
    println!("tasks total={} completed={}", counts.total, counts.completed);
    for root in service.forest().roots() {
        println!("{}:", classify(root).as_str());
        print_task(root, 1);
    }

    let board = service.board();
    println!(
        "board todo={} in_progress={} done={}",
        board.todo.len(),
        board.in_progress.len(),
        board.done.len()
    );
    ExitCode::SUCCESS
}

fn print_task(task: &Task, depth: usize) {
    let mark = if task.completed { "x" } else { " " };
    if task.is_group() {
        println!(
            "{:indent$}[{mark}] {} ({:.0}%)",
            "",
            task.title,
            calculate_progress(task),
            indent = depth * 2
        );
    } else {
        println!("{:indent$}[{mark}] {}", "", task.title, indent = depth * 2);
    }
    for child in &task.children {
        print_task(child, depth + 1);
    }
}
