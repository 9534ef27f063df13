use std::io;
use std::sync::Arc;

use chrono::NaiveDate;
use taskflow_core::controller::ViewController;
use taskflow_core::datastore::{Latency, MemoryListStore, MemoryTaskStore, Op, Seed};
use taskflow_core::render::Renderer;
use taskflow_core::shell::Shell;
use taskflow_core::task::Status;

fn lines(script: &[&str]) -> Vec<io::Result<String>> {
    script.iter().map(|line| Ok(format!("{line}\n"))).collect()
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 25).expect("date")
}

#[tokio::test]
async fn scripted_session_creates_completes_and_deletes() {
    let seed = Seed::builtin();
    let tasks = Arc::new(MemoryTaskStore::new(seed.tasks, Latency::none()));
    let lists = Arc::new(MemoryListStore::new(seed.lists, Latency::none()));
    let controller = ViewController::new(tasks.clone(), lists, Arc::new(|_: &str| true));
    let before = tasks.len();

    let script = lines(&[
        "new",
        "set title Pay rent",
        "set priority high",
        "set due 2025-03-24",
        "submit",
        "toggle 1",
        "search rent",
        "delete 1",
        "quit",
        "ls",
    ]);

    let mut out = Vec::new();
    Shell::new(&controller, Renderer::plain())
        .with_today(today())
        .run(script, &mut out)
        .await
        .expect("session runs");

    let text = String::from_utf8(out).expect("utf8");
    assert!(text.contains("Create New Task"));
    assert!(text.contains("Task created successfully!"));
    assert!(text.contains("Mar 24 (Overdue)"));
    assert!(text.contains("Task completed!"));
    assert!(text.contains("Task deleted successfully!"));
    assert!(text.contains("No tasks match your filters"));

    assert_eq!(tasks.len(), before);
    assert!(controller.tasks().iter().all(|t| t.title != "Pay rent"));
}

#[tokio::test]
async fn failed_load_offers_retry() {
    let tasks = Arc::new(MemoryTaskStore::new(vec![], Latency::none()));
    let lists = Arc::new(MemoryListStore::new(Seed::builtin().lists, Latency::none()));
    tasks.fail_next(Op::GetAll);
    let controller = ViewController::new(tasks, lists, Arc::new(|_: &str| false));

    let mut out = Vec::new();
    Shell::new(&controller, Renderer::plain())
        .with_today(today())
        .run(lines(&["retry", "lists"]), &mut out)
        .await
        .expect("session runs");

    let text = String::from_utf8(out).expect("utf8");
    assert!(text.contains("Something went wrong"));
    assert!(text.contains("Type `retry` to try again."));
    assert!(text.contains("No tasks yet"));
    assert!(text.contains("Work Projects"));
}

#[tokio::test]
async fn declined_delete_and_unknown_commands() {
    let seed = Seed::builtin();
    let first_status = seed.tasks[0].status;
    let tasks = Arc::new(MemoryTaskStore::new(seed.tasks, Latency::none()));
    let lists = Arc::new(MemoryListStore::new(seed.lists, Latency::none()));
    let controller = ViewController::new(tasks.clone(), lists, Arc::new(|_: &str| false));
    let before = tasks.len();

    let mut out = Vec::new();
    Shell::new(&controller, Renderer::plain())
        .with_today(today())
        .run(lines(&["delete 1", "frobnicate", "toggle"]), &mut out)
        .await
        .expect("session runs");

    let text = String::from_utf8(out).expect("utf8");
    assert!(text.contains("nothing to do"));
    assert!(text.contains("unknown command: frobnicate"));
    assert!(text.contains("usage: toggle <row|id>"));
    assert_eq!(tasks.len(), before);
    assert_eq!(controller.tasks()[0].status, first_status);
    assert_ne!(first_status, Status::Completed);
}
