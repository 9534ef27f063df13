use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::NaiveDate;
use tracing::trace;

use crate::task::{Priority, Status, Task, TaskList};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl StatusFilter {
    pub fn matches(self, status: Status) -> bool {
        match self {
            Self::All => true,
            Self::Active => status == Status::Pending,
            Self::Completed => status == Status::Completed,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
        })
    }
}

impl FromStr for StatusFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            other => Err(anyhow!("unknown status filter: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PriorityFilter {
    #[default]
    All,
    Only(Priority),
}

impl PriorityFilter {
    pub fn matches(self, priority: Priority) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == priority,
        }
    }
}

impl fmt::Display for PriorityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(priority) => write!(f, "{priority}"),
        }
    }
}

impl FromStr for PriorityFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse::<Priority>()
            .map(Self::Only)
            .map_err(|_| anyhow!("unknown priority filter: {}", s.trim()))
    }
}

/// Search and filter selections applied to the task collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub search: String,
    pub status: StatusFilter,
    pub priority: PriorityFilter,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        matches_search(task, &self.search)
            && self.status.matches(task.status)
            && self.priority.matches(task.priority)
    }

    /// True when any selection differs from the defaults.
    pub fn is_active(&self) -> bool {
        !self.search.is_empty()
            || self.status != StatusFilter::All
            || self.priority != PriorityFilter::All
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

fn matches_search(task: &Task, search: &str) -> bool {
    if search.is_empty() {
        return true;
    }

    let needle = search.to_lowercase();
    task.title.to_lowercase().contains(&needle)
        || task
            .description
            .as_deref()
            .is_some_and(|description| description.to_lowercase().contains(&needle))
}

/// Tasks passing `filter`, in collection order.
pub fn visible_tasks<'a>(tasks: &'a [Task], filter: &TaskFilter) -> Vec<&'a Task> {
    let visible: Vec<&Task> = tasks.iter().filter(|task| filter.matches(task)).collect();
    trace!(
        total = tasks.len(),
        visible = visible.len(),
        search = %filter.search,
        status = %filter.status,
        priority = %filter.priority,
        "computed visible tasks"
    );
    visible
}

pub fn find_list<'a>(lists: &'a [TaskList], id: &str) -> Option<&'a TaskList> {
    lists.iter().find(|list| list.id == id)
}

/// Only dates strictly before `today` are overdue; due today never is.
pub fn is_overdue(due: Option<NaiveDate>, today: NaiveDate) -> bool {
    due.is_some_and(|date| date < today)
}

/// `Today`, or a short month/day like `Mar 5`, suffixed when overdue.
pub fn due_label(due: NaiveDate, today: NaiveDate) -> String {
    let mut label = if due == today {
        "Today".to_string()
    } else {
        due.format("%b %-d").to_string()
    };
    if is_overdue(Some(due), today) {
        label.push_str(" (Overdue)");
    }
    label
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyState {
    NoTasks,
    NoMatches,
}

impl EmptyState {
    pub fn for_filter(filter: &TaskFilter) -> Self {
        if filter.is_active() {
            Self::NoMatches
        } else {
            Self::NoTasks
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::NoTasks => "No tasks yet",
            Self::NoMatches => "No tasks match your filters",
        }
    }

    pub fn hint(self) -> &'static str {
        match self {
            Self::NoTasks => "Create your first task to get started",
            Self::NoMatches => "Try adjusting your search or filters",
        }
    }

    /// Whether the empty view offers a shortcut to the creation form.
    pub fn offers_create(self) -> bool {
        self == Self::NoTasks
    }
}
