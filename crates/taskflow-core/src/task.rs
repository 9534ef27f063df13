use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub type TaskId = String;
pub type ListId = String;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Capitalized form used on task rows, e.g. `High`.
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" | "l" => Ok(Self::Low),
            "medium" | "m" => Ok(Self::Medium),
            "high" | "h" => Ok(Self::High),
            other => Err(anyhow!("unknown priority: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Pending,
    Completed,
}

impl Status {
    /// Completed reopens to pending; anything else completes.
    pub fn toggled(self) -> Self {
        match self {
            Self::Completed => Self::Pending,
            Self::Pending => Self::Completed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,

    pub list_id: ListId,

    #[serde(default)]
    pub status: Status,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn from_new(new: NewTask, id: TaskId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: new.title,
            description: new.description,
            priority: new.priority,
            due_date: new.due_date,
            list_id: new.list_id,
            status: new.status,
            created_at: Some(now),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == Status::Completed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskList {
    pub id: ListId,

    pub name: String,

    #[serde(default)]
    pub color: String,

    /// Set once at creation. Nothing recomputes it from task membership.
    #[serde(default)]
    pub task_count: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl TaskList {
    pub fn from_new(new: NewList, id: ListId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name,
            color: new.color,
            task_count: 0,
            created_at: Some(now),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub list_id: ListId,
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewList {
    pub name: String,
    pub color: String,
}

/// Field-by-field update for a stored task. `None` leaves a field alone;
/// for optional fields `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<NaiveDate>>,
    pub list_id: Option<ListId>,
    pub status: Option<Status>,
}

impl TaskPatch {
    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn apply(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(list_id) = self.list_id {
            task.list_id = list_id;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPatch {
    pub name: Option<String>,
    pub color: Option<String>,
}

impl ListPatch {
    pub fn apply(self, list: &mut TaskList) {
        if let Some(name) = self.name {
            list.name = name;
        }
        if let Some(color) = self.color {
            list.color = color;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Task {
        Task {
            id: "1".to_string(),
            title: "Buy milk".to_string(),
            description: Some("two litres".to_string()),
            priority: Priority::Low,
            due_date: NaiveDate::from_ymd_opt(2025, 3, 5),
            list_id: "A".to_string(),
            status: Status::Pending,
            created_at: None,
        }
    }

    #[test]
    fn toggling_twice_restores_status() {
        for status in [Status::Pending, Status::Completed] {
            assert_eq!(status.toggled().toggled(), status);
        }
        assert_eq!(Status::Pending.toggled(), Status::Completed);
    }

    #[test]
    fn status_patch_touches_only_status() {
        let mut task = sample();
        TaskPatch::status(Status::Completed).apply(&mut task);

        let mut expected = sample();
        expected.status = Status::Completed;
        assert_eq!(task, expected);
    }

    #[test]
    fn patch_can_clear_optional_fields() {
        let mut task = sample();
        TaskPatch {
            description: Some(None),
            due_date: Some(None),
            priority: Some(Priority::High),
            ..TaskPatch::default()
        }
        .apply(&mut task);

        assert_eq!(task.description, None);
        assert_eq!(task.due_date, None);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.title, "Buy milk");
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(TaskPatch::default().is_empty());
        assert!(!TaskPatch::status(Status::Pending).is_empty());
    }

    #[test]
    fn deserializes_mock_data_shape() {
        let raw = r#"{"id":"7","title":"Ship it","priority":"high","dueDate":"2025-01-31","listId":"work","status":"completed"}"#;
        let task: Task = serde_json::from_str(raw).expect("parse task");

        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.status, Status::Completed);
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2025, 1, 31));
        assert_eq!(task.description, None);
    }

    #[test]
    fn missing_priority_and_status_use_defaults() {
        let raw = r#"{"id":"8","title":"x","listId":"home"}"#;
        let task: Task = serde_json::from_str(raw).expect("parse task");
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.status, Status::Pending);
    }

    #[test]
    fn priority_parses_short_and_long_forms() {
        assert_eq!("HIGH".parse::<Priority>().expect("parse"), Priority::High);
        assert_eq!("l".parse::<Priority>().expect("parse"), Priority::Low);
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn new_list_starts_with_zero_count() {
        let now = Utc::now();
        let list = TaskList::from_new(
            NewList {
                name: "Home".to_string(),
                color: "#3B82F6".to_string(),
            },
            "A".to_string(),
            now,
        );
        assert_eq!(list.task_count, 0);
        assert_eq!(list.created_at, Some(now));
    }
}
