use std::str::FromStr;

use anyhow::anyhow;
use chrono::NaiveDate;
use thiserror::Error;

use crate::task::{NewTask, Priority, Status, Task, TaskPatch};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("title is required")]
    EmptyTitle,

    #[error("invalid due date: {0} (expected YYYY-MM-DD)")]
    InvalidDueDate(String),

    #[error("invalid priority: {0}")]
    InvalidPriority(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Title,
    Description,
    Priority,
    DueDate,
    List,
}

impl FromStr for DraftField {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "title" => Ok(Self::Title),
            "description" | "desc" => Ok(Self::Description),
            "priority" | "pri" => Ok(Self::Priority),
            "due" | "duedate" | "due_date" => Ok(Self::DueDate),
            "list" | "listid" | "list_id" => Ok(Self::List),
            other => Err(anyhow!("unknown form field: {other}")),
        }
    }
}

/// Editable copy of a task's fields behind the create/edit form.
///
/// Text fields hold exactly what the user typed; conversion into a
/// creation payload or patch happens on submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormDraft {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub due_date: String,
    pub list_id: String,
}

impl Default for FormDraft {
    fn default() -> Self {
        Self::blank(None)
    }
}

impl FormDraft {
    pub fn blank(first_list: Option<&str>) -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            priority: Priority::Medium,
            due_date: String::new(),
            list_id: first_list.unwrap_or_default().to_string(),
        }
    }

    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            priority: task.priority,
            due_date: task
                .due_date
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            list_id: task.list_id.clone(),
        }
    }

    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }

    pub fn set_field(&mut self, field: DraftField, value: &str) -> Result<(), DraftError> {
        match field {
            DraftField::Title => self.title = value.to_string(),
            DraftField::Description => self.description = value.to_string(),
            DraftField::Priority => {
                self.priority = value
                    .parse()
                    .map_err(|_| DraftError::InvalidPriority(value.trim().to_string()))?;
            }
            DraftField::DueDate => {
                parse_due_date(value)?;
                self.due_date = value.trim().to_string();
            }
            DraftField::List => self.list_id = value.trim().to_string(),
        }
        Ok(())
    }

    /// Creation payload; new tasks always start pending.
    pub fn to_new_task(&self) -> Result<NewTask, DraftError> {
        self.ensure_title()?;
        Ok(NewTask {
            title: self.title.clone(),
            description: non_empty(&self.description),
            priority: self.priority,
            due_date: parse_due_date(&self.due_date)?,
            list_id: self.list_id.clone(),
            status: Status::Pending,
        })
    }

    /// Patch carrying every draft field.
    pub fn to_patch(&self) -> Result<TaskPatch, DraftError> {
        self.ensure_title()?;
        Ok(TaskPatch {
            title: Some(self.title.clone()),
            description: Some(non_empty(&self.description)),
            priority: Some(self.priority),
            due_date: Some(parse_due_date(&self.due_date)?),
            list_id: Some(self.list_id.clone()),
            status: None,
        })
    }

    fn ensure_title(&self) -> Result<(), DraftError> {
        if self.has_title() {
            Ok(())
        } else {
            Err(DraftError::EmptyTitle)
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn parse_due_date(value: &str) -> Result<Option<NaiveDate>, DraftError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| DraftError::InvalidDueDate(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn buy_milk() -> Task {
        Task {
            id: "1".to_string(),
            title: "Buy milk".to_string(),
            description: None,
            priority: Priority::Low,
            due_date: None,
            list_id: "A".to_string(),
            status: Status::Pending,
            created_at: None,
        }
    }

    #[test]
    fn blank_draft_uses_defaults() {
        let draft = FormDraft::blank(Some("A"));
        assert_eq!(draft.priority, Priority::Medium);
        assert_eq!(draft.list_id, "A");
        assert!(draft.title.is_empty());
        assert_eq!(FormDraft::default().list_id, "");
    }

    #[test]
    fn from_task_falls_back_to_empty_strings() {
        let draft = FormDraft::from_task(&buy_milk());
        assert_eq!(
            draft,
            FormDraft {
                title: "Buy milk".to_string(),
                description: String::new(),
                priority: Priority::Low,
                due_date: String::new(),
                list_id: "A".to_string(),
            }
        );
    }

    #[test]
    fn from_task_formats_due_date() {
        let mut task = buy_milk();
        task.due_date = NaiveDate::from_ymd_opt(2025, 4, 2);
        assert_eq!(FormDraft::from_task(&task).due_date, "2025-04-02");
    }

    #[test]
    fn whitespace_title_is_rejected() {
        let mut draft = FormDraft::blank(Some("A"));
        draft.title = "   \t".to_string();
        assert!(!draft.has_title());
        assert_eq!(draft.to_new_task(), Err(DraftError::EmptyTitle));
        assert_eq!(draft.to_patch(), Err(DraftError::EmptyTitle));
    }

    #[test]
    fn new_task_is_pending_and_drops_empty_optionals() {
        let mut draft = FormDraft::blank(Some("A"));
        draft.title = "Water plants".to_string();

        let new = draft.to_new_task().expect("valid draft");
        assert_eq!(new.status, Status::Pending);
        assert_eq!(new.description, None);
        assert_eq!(new.due_date, None);
        assert_eq!(new.list_id, "A");
    }

    #[test]
    fn patch_carries_every_field() {
        let mut draft = FormDraft::from_task(&buy_milk());
        draft.set_field(DraftField::Description, "2 litres").expect("set");
        draft.set_field(DraftField::DueDate, "2025-05-01").expect("set");
        draft.set_field(DraftField::Priority, "high").expect("set");

        let patch = draft.to_patch().expect("valid draft");
        assert_eq!(patch.title.as_deref(), Some("Buy milk"));
        assert_eq!(patch.description, Some(Some("2 litres".to_string())));
        assert_eq!(patch.due_date, Some(NaiveDate::from_ymd_opt(2025, 5, 1)));
        assert_eq!(patch.priority, Some(Priority::High));
        assert_eq!(patch.status, None);
    }

    #[test]
    fn bad_field_values_leave_draft_untouched() {
        let mut draft = FormDraft::blank(Some("A"));
        assert_eq!(
            draft.set_field(DraftField::DueDate, "next friday"),
            Err(DraftError::InvalidDueDate("next friday".to_string()))
        );
        assert!(draft.set_field(DraftField::Priority, "urgent").is_err());
        assert_eq!(draft, FormDraft::blank(Some("A")));
    }

    #[test]
    fn field_names_parse() {
        assert_eq!("due".parse::<DraftField>().expect("parse"), DraftField::DueDate);
        assert_eq!("List".parse::<DraftField>().expect("parse"), DraftField::List);
        assert!("color".parse::<DraftField>().is_err());
    }
}
