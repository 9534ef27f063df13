use std::collections::HashSet;

use chrono::NaiveDate;

use crate::draft::FormDraft;
use crate::filter::{EmptyState, TaskFilter, due_label, find_list, is_overdue, visible_tasks};
use crate::task::{Task, TaskId, TaskList};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListBadge {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow {
    pub task: Task,
    /// Owning list, absent when `list_id` dangles.
    pub list: Option<ListBadge>,
    pub overdue: bool,
    pub due_label: Option<String>,
    /// A mutation for this task is still awaiting its response.
    pub busy: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub id: String,
    pub name: String,
    pub color: String,
    pub task_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormView {
    pub editing: Option<TaskId>,
    pub draft: FormDraft,
}

impl FormView {
    pub fn heading(&self) -> &'static str {
        if self.editing.is_some() {
            "Edit Task"
        } else {
            "Create New Task"
        }
    }

    pub fn submit_label(&self) -> &'static str {
        if self.editing.is_some() {
            "Update Task"
        } else {
            "Create Task"
        }
    }
}

/// Everything a presentation layer needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSnapshot {
    pub load: LoadState,
    pub rows: Vec<TaskRow>,
    pub total: usize,
    pub filter: TaskFilter,
    pub show_clear_filters: bool,
    pub empty: Option<EmptyState>,
    pub form: Option<FormView>,
    pub lists: Vec<ListEntry>,
}

pub(crate) struct SnapshotInput<'a> {
    pub load: &'a LoadState,
    pub tasks: &'a [Task],
    pub lists: &'a [TaskList],
    pub filter: &'a TaskFilter,
    pub form: Option<FormView>,
    pub in_flight: &'a HashSet<TaskId>,
    pub today: NaiveDate,
}

impl ViewSnapshot {
    pub(crate) fn build(input: SnapshotInput<'_>) -> Self {
        let rows: Vec<TaskRow> = visible_tasks(input.tasks, input.filter)
            .into_iter()
            .map(|task| TaskRow {
                list: find_list(input.lists, &task.list_id).map(|list| ListBadge {
                    name: list.name.clone(),
                    color: list.color.clone(),
                }),
                overdue: is_overdue(task.due_date, input.today),
                due_label: task.due_date.map(|due| due_label(due, input.today)),
                busy: input.in_flight.contains(&task.id),
                task: task.clone(),
            })
            .collect();

        let empty = rows
            .is_empty()
            .then(|| EmptyState::for_filter(input.filter));

        Self {
            load: input.load.clone(),
            total: input.tasks.len(),
            filter: input.filter.clone(),
            show_clear_filters: input.filter.is_active(),
            empty,
            form: input.form,
            lists: input
                .lists
                .iter()
                .map(|list| ListEntry {
                    id: list.id.clone(),
                    name: list.name.clone(),
                    color: list.color.clone(),
                    task_count: list.task_count,
                })
                .collect(),
            rows,
        }
    }
}
